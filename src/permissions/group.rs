//! Guild permission groups and per-user overrides

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use super::action::PermissionAction;
use super::member::{PrincipalId, RoleId};
use super::node::PermissionNode;

/// A named set of node actions inside one guild
///
/// Membership comes from direct assignment (see [`UserOverride::add_group`])
/// or from holding any of the bound platform roles. A group's rank is its
/// position in the guild's group list and is not stored here.
#[derive(Debug)]
pub struct Group {
    id: String,
    name: RwLock<String>,
    actions: RwLock<HashMap<String, PermissionAction>>,
    role_ids: RwLock<BTreeSet<RoleId>>,
}

impl Group {
    /// Only the evaluator creates groups, so ids stay unique per guild
    pub(crate) fn new(id: String, name: impl Into<String>) -> Self {
        Self {
            id,
            name: RwLock::new(name.into()),
            actions: RwLock::new(HashMap::new()),
            role_ids: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn rename(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// The group's action for a node, Neutral if unset
    pub fn permission_action(&self, node: &PermissionNode) -> PermissionAction {
        self.actions
            .read()
            .get(node.id())
            .copied()
            .unwrap_or_default()
    }

    /// Set the group's action for a node; Neutral clears it
    pub fn set_permission(&self, node: &PermissionNode, action: PermissionAction) {
        set_action(&self.actions, node, action);
    }

    /// Snapshot of all non-neutral actions, keyed by node id
    pub fn actions(&self) -> HashMap<String, PermissionAction> {
        self.actions.read().clone()
    }

    /// Bind a platform role; returns false if already bound
    pub fn add_role(&self, role: RoleId) -> bool {
        self.role_ids.write().insert(role)
    }

    /// Unbind a platform role; returns false if it was not bound
    pub fn remove_role(&self, role: RoleId) -> bool {
        self.role_ids.write().remove(&role)
    }

    pub fn role_ids(&self) -> BTreeSet<RoleId> {
        self.role_ids.read().clone()
    }

    /// Whether any of `roles` is bound to this group
    pub fn matches_any_role(&self, roles: &BTreeSet<RoleId>) -> bool {
        let bound = self.role_ids.read();
        !bound.is_disjoint(roles)
    }
}

/// Per-user actions and direct group assignments inside one guild
#[derive(Debug)]
pub struct UserOverride {
    principal: PrincipalId,
    actions: RwLock<HashMap<String, PermissionAction>>,
    group_ids: RwLock<BTreeSet<String>>,
}

impl UserOverride {
    pub(crate) fn new(principal: PrincipalId) -> Self {
        Self {
            principal,
            actions: RwLock::new(HashMap::new()),
            group_ids: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn principal(&self) -> PrincipalId {
        self.principal
    }

    /// The user's own action for a node, Neutral if unset
    pub fn permission_action(&self, node: &PermissionNode) -> PermissionAction {
        self.actions
            .read()
            .get(node.id())
            .copied()
            .unwrap_or_default()
    }

    /// Set the user's own action for a node; Neutral clears it
    pub fn set_permission(&self, node: &PermissionNode, action: PermissionAction) {
        set_action(&self.actions, node, action);
    }

    pub fn actions(&self) -> HashMap<String, PermissionAction> {
        self.actions.read().clone()
    }

    /// Assign the user directly to a group; returns false if already assigned
    pub fn add_group(&self, group_id: impl Into<String>) -> bool {
        self.group_ids.write().insert(group_id.into())
    }

    /// Returns false if the user was not assigned to the group
    pub fn remove_group(&self, group_id: &str) -> bool {
        self.group_ids.write().remove(group_id)
    }

    /// Direct group ids, possibly including groups deleted since assignment
    pub fn group_ids(&self) -> BTreeSet<String> {
        self.group_ids.read().clone()
    }

    pub fn is_in_group(&self, group_id: &str) -> bool {
        self.group_ids.read().contains(group_id)
    }
}

fn set_action(
    actions: &RwLock<HashMap<String, PermissionAction>>,
    node: &PermissionNode,
    action: PermissionAction,
) {
    let mut actions = actions.write();
    if action.is_neutral() {
        actions.remove(node.id());
    } else {
        actions.insert(node.id().to_string(), action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> PermissionNode {
        PermissionNode::new(id, id, false)
    }

    #[test]
    fn test_group_actions_default_neutral() {
        let group = Group::new("g1".into(), "Mods");
        assert_eq!(group.permission_action(&node("ban")), PermissionAction::Neutral);

        group.set_permission(&node("ban"), PermissionAction::Allow);
        assert_eq!(group.permission_action(&node("ban")), PermissionAction::Allow);

        group.set_permission(&node("ban"), PermissionAction::Neutral);
        assert!(group.actions().is_empty());
    }

    #[test]
    fn test_group_roles() {
        let group = Group::new("g1".into(), "Mods");
        assert!(group.add_role(10));
        assert!(!group.add_role(10));

        let held: BTreeSet<RoleId> = [3, 10].into_iter().collect();
        let other: BTreeSet<RoleId> = [3, 4].into_iter().collect();
        assert!(group.matches_any_role(&held));
        assert!(!group.matches_any_role(&other));

        group.add_role(11);
        assert_eq!(group.role_ids(), [10, 11].into_iter().collect::<BTreeSet<RoleId>>());

        assert!(group.remove_role(10));
        assert!(!group.matches_any_role(&held));
        assert_eq!(group.role_ids(), [11].into_iter().collect::<BTreeSet<RoleId>>());
    }

    #[test]
    fn test_group_rename() {
        let group = Group::new("g1".into(), "Mods");
        group.rename("Moderators");
        assert_eq!(group.name(), "Moderators");
        assert_eq!(group.id(), "g1");
    }

    #[test]
    fn test_user_override() {
        let user = UserOverride::new(99);
        assert_eq!(user.principal(), 99);
        assert_eq!(user.permission_action(&node("kick")), PermissionAction::Neutral);

        user.set_permission(&node("kick"), PermissionAction::Deny);
        assert_eq!(user.permission_action(&node("kick")), PermissionAction::Deny);
        user.set_permission(&node("ban"), PermissionAction::Allow);
        user.set_permission(&node("mute"), PermissionAction::Neutral);

        let actions = user.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions.get("kick"), Some(&PermissionAction::Deny));
        assert_eq!(actions.get("ban"), Some(&PermissionAction::Allow));
        assert!(!actions.contains_key("mute"));

        assert!(user.add_group("g1"));
        assert!(user.is_in_group("g1"));
        assert!(user.remove_group("g1"));
        assert!(!user.remove_group("g1"));
    }
}
