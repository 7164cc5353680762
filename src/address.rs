//! Leaderboard addressing.
//!
//! Each category maps to its own key in a shared namespace, so all three can
//! live on one Redis instance without cross-category coordination.

use std::fmt::{self, Display};

const CONTEST_SEGMENT: &str = "contest";
const OFFICIAL_SEGMENT: &str = "official";
const GLOBAL_SEGMENT: &str = "global";

/// A single leaderboard in the shared keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// One contest's own leaderboard, keyed by contest id.
    Contest(String),
    /// The official leaderboard for one calendar year.
    Yearly(u16),
    /// The all-time official leaderboard.
    Global,
}

impl Address {
    pub fn contest(contest_id: impl Into<String>) -> Self {
        Self::Contest(contest_id.into())
    }

    /// The backing-engine key for this leaderboard under the given namespace.
    pub fn key(&self, namespace: &str) -> String {
        match self {
            Self::Contest(contest_id) => {
                format!("{namespace}:{CONTEST_SEGMENT}:{contest_id}")
            }
            Self::Yearly(year) => format!("{namespace}:{OFFICIAL_SEGMENT}:{year}"),
            Self::Global => format!("{namespace}:{OFFICIAL_SEGMENT}:{GLOBAL_SEGMENT}"),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contest(contest_id) => write!(f, "contest leaderboard {contest_id}"),
            Self::Yearly(year) => write!(f, "official leaderboard {year}"),
            Self::Global => write!(f, "global official leaderboard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Address;

    #[test]
    fn test_key_shapes() {
        assert_eq!(
            Address::contest("7b1e").key("leaderboard"),
            "leaderboard:contest:7b1e"
        );
        assert_eq!(Address::Yearly(2026).key("leaderboard"), "leaderboard:official:2026");
        assert_eq!(Address::Global.key("leaderboard"), "leaderboard:official:global");
    }

    #[test]
    fn test_categories_never_collide() {
        let keys = [
            Address::contest("2026").key("lb"),
            Address::Yearly(2026).key("lb"),
            Address::Global.key("lb"),
        ];

        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn test_namespace_isolates_environments() {
        assert_ne!(
            Address::Global.key("leaderboard"),
            Address::Global.key("leaderboard-test")
        );
    }
}
