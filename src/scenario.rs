//! Scenario files
//!
//! A scenario describes one guild's permission setup plus a list of access
//! checks in JSON. Groups are referred to by name because their ids are
//! generated when the scenario is built.
//!
//! ```json
//! {
//!   "config": { "mode": "HIERARCHICAL" },
//!   "nodes": [{ "id": "ban", "display_name": "Ban command" }],
//!   "groups": [{ "name": "Mods", "roles": [10], "actions": { "ban": "ALLOW" } }],
//!   "users": [{ "id": 1, "actions": { "ban": "DENY" } }],
//!   "members": [{ "id": 1, "roles": [10] }],
//!   "checks": [{ "member": 1, "node": "ban", "expect": false }]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{SecurityConfig, StaticSecurity, TenantConfig};
use crate::core::{PermissionError, PermissionResult};
use crate::permissions::{
    AccessDecision, ChannelId, NodeRegistry, PermissionAction, PermissionEvaluator,
    PermissionNode, PrincipalId, RoleId, StaticMember,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,

    #[serde(default)]
    pub roles: BTreeSet<RoleId>,

    /// Node id to action
    #[serde(default)]
    pub actions: BTreeMap<String, PermissionAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSpec {
    pub id: PrincipalId,

    /// Names of directly assigned groups
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub actions: BTreeMap<String, PermissionAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSpec {
    pub member: PrincipalId,
    pub node: String,

    #[serde(default)]
    pub channel: Option<ChannelId>,

    /// Expected result, if the scenario asserts one
    #[serde(default)]
    pub expect: Option<bool>,
}

/// A guild setup and the checks to run against it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: TenantConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub nodes: Vec<PermissionNode>,

    /// Highest rank first
    #[serde(default)]
    pub groups: Vec<GroupSpec>,

    #[serde(default)]
    pub users: Vec<UserSpec>,

    #[serde(default)]
    pub members: Vec<StaticMember>,

    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

/// Result of one scenario check
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub check: CheckSpec,
    pub decision: AccessDecision,
}

impl CheckOutcome {
    /// False only when the check has an expectation and the decision differs
    pub fn meets_expectation(&self) -> bool {
        self.check
            .expect
            .map_or(true, |expected| expected == self.decision.is_allowed())
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> PermissionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> PermissionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Build the node catalogue and a populated evaluator
    pub fn build(&self) -> PermissionResult<(NodeRegistry, PermissionEvaluator)> {
        self.security.validate()?;

        let mut nodes = NodeRegistry::new();
        for node in &self.nodes {
            nodes.register(node.clone())?;
        }

        // Users refer to groups by name, so names must be unambiguous
        let mut names = BTreeSet::new();
        for spec in &self.groups {
            if !names.insert(spec.name.as_str()) {
                return Err(PermissionError::invalid_config(format!(
                    "duplicate group name {}",
                    spec.name
                )));
            }
        }

        let security = Arc::new(StaticSecurity::new(self.security.clone()));
        let evaluator = PermissionEvaluator::from_config(&self.config, security);

        for spec in &self.groups {
            let group = evaluator.create_group(spec.name.clone())?;
            for role in &spec.roles {
                group.add_role(*role);
            }
            for (node_id, action) in &spec.actions {
                group.set_permission(nodes.require(node_id)?, *action);
            }
        }

        for spec in &self.users {
            let user = evaluator.user(spec.id);
            for name in &spec.groups {
                let group = evaluator
                    .group_by_name(name)
                    .ok_or_else(|| PermissionError::GroupNotFound(name.clone()))?;
                user.add_group(group.id());
            }
            for (node_id, action) in &spec.actions {
                user.set_permission(nodes.require(node_id)?, *action);
            }
        }

        Ok((nodes, evaluator))
    }

    /// Build the guild and run every check in order
    pub fn run(&self) -> PermissionResult<Vec<CheckOutcome>> {
        let (nodes, evaluator) = self.build()?;

        self.checks
            .iter()
            .map(|check| -> PermissionResult<CheckOutcome> {
                let member = self
                    .members
                    .iter()
                    .find(|m| m.id == check.member)
                    .ok_or_else(|| {
                        PermissionError::invalid_config(format!(
                            "check refers to unknown member {}",
                            check.member
                        ))
                    })?;
                let node = nodes.require(&check.node)?;
                let decision = evaluator.check(member, node, &self.config, check.channel);
                Ok(CheckOutcome {
                    check: check.clone(),
                    decision,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{DecisionSource, PermissionMode};

    const MODERATION: &str = r#"{
        "config": { "mode": "HIERARCHICAL" },
        "security": { "developers": [900] },
        "nodes": [
            { "id": "moderate", "display_name": "Moderate" },
            { "id": "pause", "display_name": "Pause command", "default_allow": true },
            { "id": "purge", "display_name": "Purge", "native_fallback": ["MANAGE_MESSAGES"] }
        ],
        "groups": [
            { "name": "G_admin", "actions": { "moderate": "ALLOW" } },
            { "name": "G_muted", "roles": [77], "actions": { "moderate": "DENY", "pause": "DENY" } }
        ],
        "users": [
            { "id": 1, "groups": ["G_admin", "G_muted"] },
            { "id": 2, "groups": ["G_admin", "G_muted"], "actions": { "moderate": "DENY" } }
        ],
        "members": [
            { "id": 1 },
            { "id": 2 },
            { "id": 3, "roles": [77], "channel_native": { "5": ["MANAGE_MESSAGES"] } },
            { "id": 900 }
        ],
        "checks": [
            { "member": 1, "node": "moderate", "expect": true },
            { "member": 2, "node": "moderate", "expect": false },
            { "member": 3, "node": "pause", "expect": false },
            { "member": 3, "node": "purge", "channel": 5, "expect": true },
            { "member": 3, "node": "purge" },
            { "member": 900, "node": "moderate", "expect": true }
        ]
    }"#;

    #[test]
    fn test_run_moderation_scenario() {
        let scenario = Scenario::from_json(MODERATION).unwrap();
        assert_eq!(scenario.config.mode, PermissionMode::Hierarchical);

        let outcomes = scenario.run().unwrap();
        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(CheckOutcome::meets_expectation));

        assert_eq!(outcomes[3].decision.source, DecisionSource::NativeFallback);
        assert!(!outcomes[4].decision.is_allowed());
        assert_eq!(outcomes[5].decision.source, DecisionSource::DeveloperBypass);
    }

    #[test]
    fn test_build_preserves_group_order() {
        let scenario = Scenario::from_json(MODERATION).unwrap();
        let (nodes, evaluator) = scenario.build().unwrap();

        assert_eq!(nodes.len(), 3);
        let names: Vec<_> = evaluator.list_groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["G_admin", "G_muted"]);
    }

    #[test]
    fn test_expectation_mismatch_reported() {
        let mut scenario = Scenario::from_json(MODERATION).unwrap();
        scenario.checks[0].expect = Some(false);

        let outcomes = scenario.run().unwrap();
        assert!(!outcomes[0].meets_expectation());
    }

    #[test]
    fn test_unknown_references() {
        let mut scenario = Scenario::from_json(MODERATION).unwrap();
        scenario.users[0].groups.push("Nobody".into());
        assert!(matches!(
            scenario.build(),
            Err(PermissionError::GroupNotFound(name)) if name == "Nobody"
        ));

        let mut scenario = Scenario::from_json(MODERATION).unwrap();
        scenario.checks[0].node = "missing".into();
        assert!(matches!(scenario.run(), Err(PermissionError::NodeNotFound(_))));

        let mut scenario = Scenario::from_json(MODERATION).unwrap();
        scenario.checks[0].member = 404;
        assert!(matches!(scenario.run(), Err(PermissionError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let mut scenario = Scenario::from_json(MODERATION).unwrap();
        let mut duplicate = scenario.groups[0].clone();
        duplicate.actions.insert("moderate".into(), PermissionAction::Deny);
        scenario.groups.insert(0, duplicate);

        assert!(matches!(
            scenario.build(),
            Err(PermissionError::InvalidConfig(msg)) if msg.contains("G_admin")
        ));
    }

    #[test]
    fn test_demo_scenario_meets_expectations() {
        let scenario =
            Scenario::load(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/moderation.json")).unwrap();

        let outcomes = scenario.run().unwrap();
        assert_eq!(outcomes.len(), scenario.checks.len());
        assert!(outcomes.iter().all(CheckOutcome::meets_expectation));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, MODERATION).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.checks.len(), 6);
    }
}
