//! Tri-state permission actions and evaluation modes

use serde::{Deserialize, Serialize};

/// What a group or user override says about a permission node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAction {
    /// Grant the node
    Allow,
    /// Refuse the node
    Deny,
    /// No opinion; defer to other sources
    #[default]
    Neutral,
}

impl PermissionAction {
    /// Check if this action expresses an opinion
    pub fn is_neutral(self) -> bool {
        self == PermissionAction::Neutral
    }

    /// Merge `next` into `self` where any denial wins
    ///
    /// Neutral leaves the current action unchanged, Deny is absorbing and
    /// Allow only replaces a non-deny action.
    pub fn most_restrictive(self, next: PermissionAction) -> PermissionAction {
        match (self, next) {
            (current, PermissionAction::Neutral) => current,
            (PermissionAction::Deny, _) | (_, PermissionAction::Deny) => PermissionAction::Deny,
            (_, PermissionAction::Allow) => PermissionAction::Allow,
        }
    }

    /// Merge `next` into `self` where the later opinion wins
    ///
    /// Neutral leaves the current action unchanged; anything else replaces it.
    pub fn overridden_by(self, next: PermissionAction) -> PermissionAction {
        if next.is_neutral() {
            self
        } else {
            next
        }
    }
}

impl std::fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionAction::Allow => write!(f, "ALLOW"),
            PermissionAction::Deny => write!(f, "DENY"),
            PermissionAction::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Conflict resolution policy selected per guild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionMode {
    /// Highest-ranked group with an opinion wins; user overrides win over all groups
    #[default]
    Hierarchical,
    /// Any denial from the user or any group wins
    MostRestrictive,
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionMode::Hierarchical => write!(f, "HIERARCHICAL"),
            PermissionMode::MostRestrictive => write!(f, "MOST_RESTRICTIVE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PermissionAction::{Allow, Deny, Neutral};
    use super::*;

    #[test]
    fn test_neutral_is_identity() {
        for action in [Allow, Deny, Neutral] {
            assert_eq!(action.most_restrictive(Neutral), action);
            assert_eq!(action.overridden_by(Neutral), action);
            assert_eq!(Neutral.most_restrictive(action), action);
            assert_eq!(Neutral.overridden_by(action), action);
        }
    }

    #[test]
    fn test_most_restrictive_deny_absorbs() {
        assert_eq!(Deny.most_restrictive(Allow), Deny);
        assert_eq!(Allow.most_restrictive(Deny), Deny);
        assert_eq!(Allow.most_restrictive(Allow), Allow);
    }

    #[test]
    fn test_overridden_by_takes_latest_opinion() {
        assert_eq!(Deny.overridden_by(Allow), Allow);
        assert_eq!(Allow.overridden_by(Deny), Deny);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Allow).unwrap(), "\"ALLOW\"");
        let mode: PermissionMode = serde_json::from_str("\"MOST_RESTRICTIVE\"").unwrap();
        assert_eq!(mode, PermissionMode::MostRestrictive);
        assert_eq!(PermissionMode::default(), PermissionMode::Hierarchical);
    }
}
