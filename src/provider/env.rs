//! Environment lookups used by provider detection

use std::collections::HashMap;

/// Source of environment variables
///
/// Empty values are reported as absent, so `FOO=` never counts as a signal.
pub trait Environment {
    fn raw(&self, key: &str) -> Option<String>;

    fn var(&self, key: &str) -> Option<String> {
        self.raw(key).filter(|v| !v.is_empty())
    }

    /// First non-empty value among `keys`
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.var(key))
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn raw(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn raw(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Environment for HashMap<&str, &str> {
    fn raw(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_absent() {
        let env = HashMap::from([("A", ""), ("B", "value")]);
        assert_eq!(env.var("A"), None);
        assert_eq!(env.var("B"), Some("value".to_string()));
        assert_eq!(env.first_of(&["A", "B"]), Some("value".to_string()));
        assert_eq!(env.first_of(&["C"]), None);
    }
}
