//! Tool domains that can be switched on and off.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::Error;

/// A group of related tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Core,
    Work,
    WorkItems,
    Builds,
    Releases,
    Wiki,
    TestPlans,
}

impl Domain {
    pub const ALL: [Domain; 7] = [
        Domain::Core,
        Domain::Work,
        Domain::WorkItems,
        Domain::Builds,
        Domain::Releases,
        Domain::Wiki,
        Domain::TestPlans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Core => "core",
            Domain::Work => "work",
            Domain::WorkItems => "work-items",
            Domain::Builds => "builds",
            Domain::Releases => "releases",
            Domain::Wiki => "wiki",
            Domain::TestPlans => "test-plans",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == name)
            .ok_or_else(|| Error::Config(format!("Unknown domain: {}", s)))
    }
}

/// Resolve the set of enabled domains from user input.
///
/// Each entry may hold several names separated by commas or spaces.
/// `all` or no input enables everything; unknown names are ignored, and
/// when nothing valid remains every domain is enabled.
pub fn enabled_domains<S: AsRef<str>>(input: &[S]) -> BTreeSet<Domain> {
    let names: Vec<String> = input
        .iter()
        .flat_map(|entry| {
            entry
                .as_ref()
                .split([',', ' '])
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    if names.is_empty() || names.iter().any(|n| n == "all") {
        return Domain::ALL.into_iter().collect();
    }

    let mut enabled = BTreeSet::new();
    for name in &names {
        match name.parse::<Domain>() {
            Ok(domain) => {
                enabled.insert(domain);
            }
            Err(_) => {
                warn!(
                    domain = %name,
                    valid = ?Domain::ALL.map(|d| d.as_str()),
                    "Ignoring unknown domain"
                );
            }
        }
    }

    if enabled.is_empty() {
        warn!("No valid domains given, enabling all domains");
        return Domain::ALL.into_iter().collect();
    }

    enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_and_empty() {
        assert_eq!(enabled_domains::<&str>(&[]).len(), 7);
        assert_eq!(enabled_domains(&["all"]).len(), 7);
        assert_eq!(enabled_domains(&["builds", "ALL"]).len(), 7);
    }

    #[test]
    fn test_separators_and_case() {
        let domains = enabled_domains(&["Work-Items,builds", "wiki test-plans"]);
        assert_eq!(
            domains.into_iter().collect::<Vec<_>>(),
            vec![Domain::WorkItems, Domain::Builds, Domain::Wiki, Domain::TestPlans]
        );
    }

    #[test]
    fn test_invalid_names_ignored() {
        let domains = enabled_domains(&["repositories", "core"]);
        assert_eq!(domains.into_iter().collect::<Vec<_>>(), vec![Domain::Core]);
    }

    #[test]
    fn test_only_invalid_enables_all() {
        assert_eq!(enabled_domains(&["nope", "search"]).len(), 7);
    }

    #[test]
    fn test_display_roundtrip() {
        for domain in Domain::ALL {
            assert_eq!(domain.to_string().parse::<Domain>().unwrap(), domain);
        }
    }
}
