//! Configuration values and their resolution into typed descriptor fields
//!
//! Settings hold `ConfigValue`s rather than concrete types so a value can be
//! given as text, as an already-typed token, or as a `Deferred` computation
//! that reads ambient project state when the descriptor is built. Deferred
//! values are invoked on every resolution and never cached.

use crate::errors::DescriptorError;
use crate::types::{DependencyType, LoadStage, PermissionDefault};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Upper bound on nested deferred evaluations before resolution gives up
pub const MAX_DEFERRED_DEPTH: usize = 64;

type DeferredFn = dyn Fn() -> Option<ConfigValue> + Send + Sync;

/// Zero-argument computation producing a value (or nothing) on demand
#[derive(Clone)]
pub struct Deferred(Arc<DeferredFn>);

impl Deferred {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Option<ConfigValue> + Send + Sync + 'static,
    {
        Deferred(Arc::new(f))
    }

    pub fn call(&self) -> Option<ConfigValue> {
        (self.0)()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// Already-typed enum member handed to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumToken {
    LoadStage(LoadStage),
    DependencyType(DependencyType),
    PermissionDefault(PermissionDefault),
}

impl EnumToken {
    pub fn as_str(self) -> &'static str {
        match self {
            EnumToken::LoadStage(v) => v.as_str(),
            EnumToken::DependencyType(v) => v.as_str(),
            EnumToken::PermissionDefault(v) => v.as_str(),
        }
    }
}

/// Closed set of inputs accepted by descriptor settings
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Enum(EnumToken),
    List(Vec<ConfigValue>),
    Deferred(Deferred),
}

impl ConfigValue {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> Option<ConfigValue> + Send + Sync + 'static,
    {
        ConfigValue::Deferred(Deferred::new(f))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Str(_) => "string",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Int(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Enum(_) => "enum token",
            ConfigValue::List(_) => "list",
            ConfigValue::Deferred(_) => "deferred value",
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<Deferred> for ConfigValue {
    fn from(value: Deferred) -> Self {
        ConfigValue::Deferred(value)
    }
}

impl From<LoadStage> for ConfigValue {
    fn from(value: LoadStage) -> Self {
        ConfigValue::Enum(EnumToken::LoadStage(value))
    }
}

impl From<DependencyType> for ConfigValue {
    fn from(value: DependencyType) -> Self {
        ConfigValue::Enum(EnumToken::DependencyType(value))
    }
}

impl From<PermissionDefault> for ConfigValue {
    fn from(value: PermissionDefault) -> Self {
        ConfigValue::Enum(EnumToken::PermissionDefault(value))
    }
}

// =============================================================================
// TOKEN ENUMS
// =============================================================================

/// Enum that can be resolved from its exact member name or from a token
pub trait TokenEnum: Copy + Sized + 'static {
    /// Human readable enum name used in errors
    const KIND: &'static str;
    const MEMBERS: &'static [Self];

    fn member_name(self) -> &'static str;
    fn from_token(token: EnumToken) -> Option<Self>;

    /// Case-sensitive lookup by member name
    fn from_member_name(name: &str) -> Option<Self> {
        Self::MEMBERS
            .iter()
            .copied()
            .find(|member| member.member_name() == name)
    }
}

impl TokenEnum for LoadStage {
    const KIND: &'static str = "load stage";
    const MEMBERS: &'static [Self] = &LoadStage::ALL;

    fn member_name(self) -> &'static str {
        self.as_str()
    }

    fn from_token(token: EnumToken) -> Option<Self> {
        match token {
            EnumToken::LoadStage(v) => Some(v),
            _ => None,
        }
    }
}

impl TokenEnum for DependencyType {
    const KIND: &'static str = "dependency type";
    const MEMBERS: &'static [Self] = &DependencyType::ALL;

    fn member_name(self) -> &'static str {
        self.as_str()
    }

    fn from_token(token: EnumToken) -> Option<Self> {
        match token {
            EnumToken::DependencyType(v) => Some(v),
            _ => None,
        }
    }
}

impl TokenEnum for PermissionDefault {
    const KIND: &'static str = "permission default";
    const MEMBERS: &'static [Self] = &PermissionDefault::ALL;

    fn member_name(self) -> &'static str {
        self.as_str()
    }

    fn from_token(token: EnumToken) -> Option<Self> {
        match token {
            EnumToken::PermissionDefault(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Unwrap deferred layers until a literal (or nothing) remains
fn force(value: Option<&ConfigValue>) -> Result<Option<Cow<'_, ConfigValue>>, DescriptorError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let mut current = Cow::Borrowed(value);
    let mut depth = 0;

    loop {
        let next = match current.as_ref() {
            ConfigValue::Deferred(deferred) => deferred.call(),
            _ => break,
        };
        depth += 1;
        if depth > MAX_DEFERRED_DEPTH {
            return Err(DescriptorError::DeferredTooDeep(MAX_DEFERRED_DEPTH));
        }
        match next {
            Some(next) => current = Cow::Owned(next),
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

/// Textual form of a literal; list items are forced individually
fn stringify(value: &ConfigValue) -> Result<String, DescriptorError> {
    Ok(match value {
        ConfigValue::Str(s) => s.clone(),
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Int(i) => i.to_string(),
        // Debug keeps the fractional part, so 1.0 stays "1.0"
        ConfigValue::Float(f) => format!("{:?}", f),
        ConfigValue::Enum(token) => token.as_str().to_string(),
        ConfigValue::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(match force(Some(item))? {
                    Some(item) => stringify(&item)?,
                    None => "null".to_string(),
                });
            }
            format!("[{}]", parts.join(", "))
        }
        ConfigValue::Deferred(_) => match force(Some(value))? {
            Some(inner) => stringify(&inner)?,
            None => "null".to_string(),
        },
    })
}

/// Resolve to a string; non-string literals are stringified
pub fn resolve_string(value: Option<&ConfigValue>) -> Result<Option<String>, DescriptorError> {
    match force(value)? {
        Some(value) => Ok(Some(stringify(&value)?)),
        None => Ok(None),
    }
}

/// Resolve to a boolean; anything other than a case-insensitive `true` is false
pub fn resolve_bool(value: Option<&ConfigValue>) -> Result<Option<bool>, DescriptorError> {
    match force(value)? {
        Some(value) => match value.as_ref() {
            ConfigValue::Bool(b) => Ok(Some(*b)),
            other => Ok(Some(stringify(other)?.eq_ignore_ascii_case("true"))),
        },
        None => Ok(None),
    }
}

/// Resolve to an enum member by exact name or matching token
pub fn resolve_enum<E: TokenEnum>(
    value: Option<&ConfigValue>,
) -> Result<Option<E>, DescriptorError> {
    let Some(value) = force(value)? else {
        return Ok(None);
    };
    match value.as_ref() {
        ConfigValue::Str(name) => E::from_member_name(name)
            .map(Some)
            .ok_or_else(|| DescriptorError::InvalidEnumValue {
                kind: E::KIND,
                value: name.clone(),
            }),
        ConfigValue::Enum(token) => {
            E::from_token(*token)
                .map(Some)
                .ok_or_else(|| DescriptorError::UnexpectedValue {
                    expected: E::KIND,
                    found: format!("enum token {}", token.as_str()),
                })
        }
        other => Err(DescriptorError::UnexpectedValue {
            expected: E::KIND,
            found: other.kind_name().to_string(),
        }),
    }
}

/// Resolve to a list; anything that is not a list (absence included) is empty
pub fn resolve_list(value: Option<&ConfigValue>) -> Result<Vec<ConfigValue>, DescriptorError> {
    match force(value)? {
        Some(value) => match value.into_owned() {
            ConfigValue::List(items) => Ok(items),
            _ => Ok(Vec::new()),
        },
        None => Ok(Vec::new()),
    }
}

/// Resolve to a list of strings, dropping items that resolve to nothing
pub fn resolve_string_list(value: Option<&ConfigValue>) -> Result<Vec<String>, DescriptorError> {
    let mut out = Vec::new();
    for item in resolve_list(value)? {
        if let Some(s) = resolve_string(Some(&item))? {
            out.push(s);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_resolve_string_variants() {
        let cases = [
            (ConfigValue::from("abc"), "abc"),
            (ConfigValue::Bool(false), "false"),
            (ConfigValue::Int(42), "42"),
            (ConfigValue::Float(1.0), "1.0"),
            (ConfigValue::from(LoadStage::Postworld), "POSTWORLD"),
            (
                ConfigValue::List(vec!["a".into(), ConfigValue::Int(2)]),
                "[a, 2]",
            ),
        ];
        for (value, expected) in cases {
            let resolved = resolve_string(Some(&value));
            assert!(
                matches!(resolved, Ok(Some(ref s)) if s == expected),
                "{:?} resolved to {:?}",
                value,
                resolved
            );
        }
        assert!(matches!(resolve_string(None), Ok(None)));
    }

    #[test]
    fn test_resolve_bool_is_permissive() {
        assert!(matches!(resolve_bool(Some(&"TRUE".into())), Ok(Some(true))));
        assert!(matches!(resolve_bool(Some(&"yes".into())), Ok(Some(false))));
        assert!(matches!(resolve_bool(Some(&ConfigValue::Int(1))), Ok(Some(false))));
        assert!(matches!(resolve_bool(Some(&ConfigValue::Bool(true))), Ok(Some(true))));
        assert!(matches!(resolve_bool(None), Ok(None)));
    }

    #[test]
    fn test_resolve_enum_exact_names() {
        let ok = resolve_enum::<LoadStage>(Some(&"STARTUP".into()));
        assert!(matches!(ok, Ok(Some(LoadStage::Startup))));

        let err = resolve_enum::<LoadStage>(Some(&"startup".into()));
        assert!(matches!(
            err,
            Err(DescriptorError::InvalidEnumValue { kind: "load stage", ref value })
                if value == "startup"
        ));

        let token = resolve_enum::<DependencyType>(Some(&DependencyType::Softdepend.into()));
        assert!(matches!(token, Ok(Some(DependencyType::Softdepend))));
    }

    #[test]
    fn test_resolve_enum_rejects_foreign_values() {
        let wrong_token = resolve_enum::<DependencyType>(Some(&LoadStage::Startup.into()));
        assert!(matches!(wrong_token, Err(DescriptorError::UnexpectedValue { .. })));

        let wrong_type = resolve_enum::<PermissionDefault>(Some(&ConfigValue::Bool(true)));
        assert!(matches!(wrong_type, Err(DescriptorError::UnexpectedValue { .. })));
    }

    #[test]
    fn test_resolve_list_never_absent() {
        assert!(resolve_list(None).is_ok_and(|l| l.is_empty()));
        assert!(resolve_list(Some(&"single".into())).is_ok_and(|l| l.is_empty()));

        let list = ConfigValue::List(vec!["a".into(), "b".into()]);
        assert!(resolve_string_list(Some(&list)).is_ok_and(|l| l == vec!["a", "b"]));

        let deferred = ConfigValue::deferred(|| Some(ConfigValue::List(vec!["c".into()])));
        assert!(resolve_string_list(Some(&deferred)).is_ok_and(|l| l == vec!["c"]));
    }

    #[test]
    fn test_deferred_is_invoked_on_every_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value = ConfigValue::deferred(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Some(ConfigValue::Str(format!("v{}", n)))
        });

        assert!(matches!(resolve_string(Some(&value)), Ok(Some(ref s)) if s == "v0"));
        assert!(matches!(resolve_string(Some(&value)), Ok(Some(ref s)) if s == "v1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nested_deferred_and_absence() {
        let nested = ConfigValue::deferred(|| {
            Some(ConfigValue::deferred(|| Some(ConfigValue::Bool(true))))
        });
        assert!(matches!(resolve_bool(Some(&nested)), Ok(Some(true))));

        let absent = ConfigValue::deferred(|| None);
        assert!(matches!(resolve_string(Some(&absent)), Ok(None)));
        assert!(matches!(resolve_enum::<LoadStage>(Some(&absent)), Ok(None)));
    }

    #[test]
    fn test_self_referencing_deferred_is_bounded() {
        fn endless() -> ConfigValue {
            ConfigValue::deferred(|| Some(endless()))
        }
        let value = endless();
        assert!(matches!(
            resolve_string(Some(&value)),
            Err(DescriptorError::DeferredTooDeep(MAX_DEFERRED_DEPTH))
        ));
    }
}
