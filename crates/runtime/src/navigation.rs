//! Navigation locator (URL fragment) handling.
//!
//! The locator is a flat `key=value` list separated by `&`, optionally prefixed with `#`.
//! Anything that does not parse is the neutral state; reading a locator never fails.

/// Fragment key carrying the selected region code.
pub const SELECTION_KEY: &str = "gmcode";
/// Fragment written when nothing is selected.
pub const HOME_MARKER: &str = "home";

/// Value of `key` in a `#k1=v1&k2=v2` fragment. Empty values count as absent.
pub fn hash_value<'a>(fragment: &'a str, key: &str) -> Option<&'a str> {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key && !v.is_empty() {
            Some(v)
        } else {
            None
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locator(String);

impl Locator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// `#<key>=<id>`.
    pub fn for_selection(key: &str, id: &str) -> Self {
        Self(format!("#{key}={id}"))
    }

    /// `#<marker>`.
    pub fn home(marker: &str) -> Self {
        Self(format!("#{marker}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn selection(&self, key: &str) -> Option<&str> {
        hash_value(&self.0, key)
    }

    pub fn is_home(&self, marker: &str) -> bool {
        self.0.strip_prefix('#').unwrap_or(&self.0) == marker
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{HOME_MARKER, Locator, SELECTION_KEY, hash_value};

    #[test]
    fn reads_selection_from_fragment() {
        assert_eq!(hash_value("#gmcode=GM0344", SELECTION_KEY), Some("GM0344"));
        assert_eq!(hash_value("gmcode=GM0344", SELECTION_KEY), Some("GM0344"));
    }

    #[test]
    fn reads_selection_among_other_pairs() {
        assert_eq!(
            hash_value("#zoom=4&gmcode=GM0363&x=1", SELECTION_KEY),
            Some("GM0363")
        );
    }

    #[test]
    fn missing_or_malformed_fragments_are_neutral() {
        for raw in ["", "#", "#home", "#gmcode", "#gmcode=", "#&&=", "#xgmcode=GM1"] {
            assert_eq!(hash_value(raw, SELECTION_KEY), None, "fragment {raw:?}");
        }
    }

    #[test]
    fn builds_locators() {
        let sel = Locator::for_selection(SELECTION_KEY, "GM0344");
        assert_eq!(sel.as_str(), "#gmcode=GM0344");
        assert_eq!(sel.selection(SELECTION_KEY), Some("GM0344"));

        let home = Locator::home(HOME_MARKER);
        assert_eq!(home.to_string(), "#home");
        assert!(home.is_home(HOME_MARKER));
        assert_eq!(home.selection(SELECTION_KEY), None);
    }
}
