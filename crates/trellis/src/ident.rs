//! Component registration names.

use std::fmt;

use convert_case::{Case, Casing};

/// The name a child is registered under within its parent. Names are snake
/// case ASCII; anything else is munged into that shape by
/// [`ComponentName::convert`], so display identities like `"ContactList"`
/// and registry keys like `"contact_list"` always line up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName(String);

impl ComponentName {
    /// Derive a registration name from arbitrary text: snake case it, then
    /// strip whatever falls outside lowercase ASCII, digits and underscores.
    /// Text with nothing usable in it becomes `"component"`.
    pub fn convert(text: &str) -> Self {
        let kept: String = text
            .to_case(Case::Snake)
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect();
        if kept.is_empty() {
            Self("component".into())
        } else {
            Self(kept)
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for ComponentName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
