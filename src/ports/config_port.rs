//! Configuration access port trait.

/// Raw key lookup grouped by section.
///
/// Returns `None` for an absent key so callers can tell "missing" apart from
/// "defaulted". Typing and range checks happen in
/// [`crate::domain::config_validation`].
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
