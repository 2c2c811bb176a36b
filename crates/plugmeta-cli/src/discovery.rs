//! Scanning resource directories for existing descriptor files

use plugmeta_descriptor::Format;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Find every existing descriptor of `format` below `roots`
///
/// Paths are absolute, sorted and unique; the order is the merge order.
/// Roots that do not exist are skipped.
pub fn discover(roots: &[PathBuf], format: Format) -> Vec<PathBuf> {
    let file_name = format.file_name();
    let mut found = Vec::new();

    for root in roots {
        let Ok(root) = root.canonicalize() else {
            debug!("Skipping missing resource directory {:?}", root);
            continue;
        };
        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        {
            found.push(entry.into_path());
        }
    }

    found.sort();
    found.dedup();
    debug!("Discovered {} existing {}", found.len(), file_name);
    found
}
