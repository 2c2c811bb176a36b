use clap::{Parser, Subcommand};
use plugmeta::{
    commands::{generate, init, show},
    init_logging, logger, GlobalOpts,
};

#[derive(Parser)]
#[command(name = "plugmeta")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Plugin descriptor generator",
    long_about = "plugmeta generates Spigot plugin.yml and BungeeCord bungee.yml files from a plugmeta.toml project file, merging in descriptors that already exist in the resource directories."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate plugin.yml and bungee.yml
    Generate(generate::GenerateCommand),
    /// Print the descriptor of one format without writing it
    Show(show::ShowCommand),
    /// Create a starter plugmeta.toml
    Init(init::InitCommand),
}

fn main() {
    let cli = Cli::parse();
    let verbosity = cli.global.verbosity_level();

    if let Err(e) = logger::init_with_verbosity(verbosity) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_logging(verbosity);

    let result = match cli.command {
        Commands::Generate(cmd) => generate::handle_generate(cmd, &cli.global),
        Commands::Show(cmd) => show::handle_show(cmd, &cli.global),
        Commands::Init(cmd) => init::handle_init(cmd, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        if verbosity > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
