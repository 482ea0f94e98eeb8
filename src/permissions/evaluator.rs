//! Per-guild permission evaluator
//!
//! Holds a guild's ranked groups and user overrides and answers
//! "may this member use this node?".
//!
//! Resolution order:
//! 1. Bypasses: developer, contributor (development builds only), guild owner,
//!    platform administrator (if the guild lets admins have all permissions)
//! 2. Groups and the user override, merged according to the guild's mode
//! 3. The node's default
//! 4. The node's native fallback, only if nothing above had an opinion

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::config::TenantConfig;
use crate::core::{PermissionError, PermissionResult};

use super::action::{PermissionAction, PermissionMode};
use super::group::{Group, UserOverride};
use super::ids::{GroupIdSource, RandomGroupIds};
use super::member::{ChannelId, Member, PrincipalId, RoleId, SecurityContext, SecurityLevel};
use super::node::{NativePermission, PermissionNode};

/// Total id candidates tried before group creation gives up
pub const MAX_GROUP_ID_ATTEMPTS: usize = 7;

/// What settled an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    DeveloperBypass,
    ContributorBypass,
    OwnerBypass,
    AdministratorBypass,
    /// A group or the user override had an opinion
    Policy,
    /// Nobody had an opinion and the node is allowed by default
    NodeDefault,
    /// Nobody had an opinion and the member holds the node's native permissions
    NativeFallback,
    /// Nothing granted the node
    Unset,
}

/// Outcome of an access check with the reason behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub action: PermissionAction,
    pub source: DecisionSource,
}

impl AccessDecision {
    fn bypass(source: DecisionSource) -> Self {
        Self {
            action: PermissionAction::Allow,
            source,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.action == PermissionAction::Allow
    }
}

/// A guild's permission state and decision engine
///
/// Safe to share across threads. Checks take short-lived snapshots of the
/// group list, so a check racing an edit sees the list either before or
/// after that edit.
pub struct PermissionEvaluator {
    mode: RwLock<PermissionMode>,
    /// Rank order: index 0 is the most authoritative group
    groups: RwLock<Arc<Vec<Arc<Group>>>>,
    users: DashMap<PrincipalId, Arc<UserOverride>>,
    security: Arc<dyn SecurityContext>,
    ids: Box<dyn GroupIdSource>,
}

impl PermissionEvaluator {
    /// Create an empty evaluator in hierarchical mode
    pub fn new(security: Arc<dyn SecurityContext>) -> Self {
        Self {
            mode: RwLock::new(PermissionMode::default()),
            groups: RwLock::new(Arc::new(Vec::new())),
            users: DashMap::new(),
            security,
            ids: Box::new(RandomGroupIds),
        }
    }

    /// Create an empty evaluator using the guild's configured mode
    pub fn from_config(config: &TenantConfig, security: Arc<dyn SecurityContext>) -> Self {
        Self::new(security).with_mode(config.mode)
    }

    pub fn with_mode(mut self, mode: PermissionMode) -> Self {
        self.mode = RwLock::new(mode);
        self
    }

    /// Replace the group id generator
    pub fn with_id_source<S: GroupIdSource + 'static>(mut self, source: S) -> Self {
        self.ids = Box::new(source);
        self
    }

    pub fn mode(&self) -> PermissionMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: PermissionMode) {
        let previous = std::mem::replace(&mut *self.mode.write(), mode);
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "Permission mode changed");
        }
    }

    // === Access checks ===

    /// Check whether `member` may use `node`
    ///
    /// `channel` scopes the native permission fallback; `None` checks
    /// guild-wide permissions. Never fails.
    pub fn has_permission(
        &self,
        member: &dyn Member,
        node: &PermissionNode,
        config: &TenantConfig,
        channel: Option<ChannelId>,
    ) -> bool {
        self.check(member, node, config, channel).is_allowed()
    }

    /// Like [`has_permission`](Self::has_permission) but reports what settled the decision
    pub fn check(
        &self,
        member: &dyn Member,
        node: &PermissionNode,
        config: &TenantConfig,
        channel: Option<ChannelId>,
    ) -> AccessDecision {
        if let Some(source) = self.bypass(member, config) {
            tracing::debug!(member = member.id(), node = node.id(), ?source, "Permission bypass");
            return AccessDecision::bypass(source);
        }

        let user = self.user(member.id());
        let groups = self.resolve_groups(&user, &member.role_ids());

        let evaluated = match self.mode() {
            PermissionMode::MostRestrictive => evaluate_most_restrictive(&user, &groups, node),
            PermissionMode::Hierarchical => evaluate_hierarchical(&user, &groups, node),
        };

        if !evaluated.is_neutral() {
            return AccessDecision {
                action: evaluated,
                source: DecisionSource::Policy,
            };
        }

        // A default node never denies, it only allows
        if node.default_allow() {
            return AccessDecision {
                action: PermissionAction::Allow,
                source: DecisionSource::NodeDefault,
            };
        }

        // Native permissions only fill in when nothing above had an opinion
        let fallback = node.native_fallback();
        if !fallback.is_empty() && member.has_native(fallback, channel) {
            tracing::debug!(member = member.id(), node = node.id(), "Granted by native permissions");
            return AccessDecision {
                action: PermissionAction::Allow,
                source: DecisionSource::NativeFallback,
            };
        }

        AccessDecision {
            action: PermissionAction::Neutral,
            source: DecisionSource::Unset,
        }
    }

    fn bypass(&self, member: &dyn Member, config: &TenantConfig) -> Option<DecisionSource> {
        let id = member.id();
        if self.security.is_authorised(id, SecurityLevel::Developer) {
            return Some(DecisionSource::DeveloperBypass);
        }
        if self.security.is_authorised(id, SecurityLevel::Contributor)
            && self.security.is_development()
        {
            return Some(DecisionSource::ContributorBypass);
        }
        if member.is_owner() {
            return Some(DecisionSource::OwnerBypass);
        }
        if config.admins_have_all_perms && is_administrator(member) {
            return Some(DecisionSource::AdministratorBypass);
        }
        None
    }

    // === Membership ===

    /// Get or create the override entry for a user
    pub fn user(&self, principal: PrincipalId) -> Arc<UserOverride> {
        self.users
            .entry(principal)
            .or_insert_with(|| Arc::new(UserOverride::new(principal)))
            .clone()
    }

    /// Number of users with an override entry
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Groups that apply to a member
    ///
    /// Directly assigned groups come first in rank order, followed by every
    /// group bound to one of the member's roles, also in rank order. A group
    /// that is both assigned and role-bound appears twice.
    pub fn user_groups(&self, member: &dyn Member) -> Vec<Arc<Group>> {
        let user = self.user(member.id());
        self.resolve_groups(&user, &member.role_ids())
    }

    fn resolve_groups(&self, user: &UserOverride, roles: &BTreeSet<RoleId>) -> Vec<Arc<Group>> {
        let groups = self.snapshot();
        let direct = user.group_ids();

        let mut resolved: Vec<Arc<Group>> = groups
            .iter()
            .filter(|group| direct.contains(group.id()))
            .cloned()
            .collect();
        resolved.extend(
            groups
                .iter()
                .filter(|group| group.matches_any_role(roles))
                .cloned(),
        );
        resolved
    }

    // === Group lifecycle ===

    /// Create a group at the lowest rank
    ///
    /// Fails with `GroupIdExhausted` if every candidate id collided, which
    /// should never happen with random ids and means something is badly wrong.
    pub fn create_group(&self, name: impl Into<String>) -> PermissionResult<Arc<Group>> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PermissionError::MissingInput("group name"));
        }

        // Held for the whole loop so two creations can't race to the same id
        let mut groups = self.groups.write();

        let mut attempts = 0;
        let id = loop {
            if attempts == MAX_GROUP_ID_ATTEMPTS {
                tracing::error!(attempts, name = %name, "Could not generate a unique group id");
                return Err(PermissionError::GroupIdExhausted { attempts });
            }
            attempts += 1;

            let candidate = self.ids.next_id();
            if !groups.iter().any(|group| group.id() == candidate) {
                break candidate;
            }
            tracing::debug!(candidate = %candidate, attempts, "Group id collision");
        };

        let group = Arc::new(Group::new(id, name));
        Arc::make_mut(&mut *groups).push(Arc::clone(&group));
        let rank = groups.len() - 1;
        drop(groups);

        tracing::info!(group_id = %group.id(), name = %group.name(), rank, "Created group");
        Ok(group)
    }

    /// Delete a group by id; returns false if no such group exists
    ///
    /// Users keep the deleted id in their direct assignments, where it no
    /// longer matches anything.
    pub fn delete_group(&self, id: &str) -> bool {
        let mut groups = self.groups.write();
        let Some(index) = groups.iter().position(|group| group.id() == id) else {
            return false;
        };
        Arc::make_mut(&mut *groups).remove(index);
        drop(groups);

        tracing::info!(group_id = %id, "Deleted group");
        true
    }

    /// Move a group to a new rank, returning the rank it ended up at
    ///
    /// Ranks past the end place the group last.
    pub fn move_group(&self, id: &str, rank: usize) -> PermissionResult<usize> {
        let mut groups = self.groups.write();
        let index = groups
            .iter()
            .position(|group| group.id() == id)
            .ok_or_else(|| PermissionError::GroupNotFound(id.to_string()))?;

        let list = Arc::make_mut(&mut *groups);
        let group = list.remove(index);
        let rank = rank.min(list.len());
        list.insert(rank, group);
        drop(groups);

        tracing::info!(group_id = %id, from = index, to = rank, "Moved group");
        Ok(rank)
    }

    /// All groups in rank order
    pub fn list_groups(&self) -> Vec<Arc<Group>> {
        self.snapshot().to_vec()
    }

    pub fn group(&self, id: &str) -> Option<Arc<Group>> {
        self.snapshot()
            .iter()
            .find(|group| group.id() == id)
            .cloned()
    }

    /// First group with the given name (names need not be unique)
    pub fn group_by_name(&self, name: &str) -> Option<Arc<Group>> {
        self.snapshot()
            .iter()
            .find(|group| group.name() == name)
            .cloned()
    }

    /// Current rank of a group, 0 being the highest
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.snapshot().iter().position(|group| group.id() == id)
    }

    fn snapshot(&self) -> Arc<Vec<Arc<Group>>> {
        Arc::clone(&self.groups.read())
    }
}

impl std::fmt::Debug for PermissionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEvaluator")
            .field("mode", &self.mode())
            .field("groups", &self.snapshot().len())
            .field("users", &self.users.len())
            .finish()
    }
}

fn is_administrator(member: &dyn Member) -> bool {
    let admin: BTreeSet<NativePermission> = [NativePermission::Administrator].into_iter().collect();
    member.has_native(&admin, None)
}

/// Any denial wins; a personal denial ends evaluation before groups are read
fn evaluate_most_restrictive(
    user: &UserOverride,
    groups: &[Arc<Group>],
    node: &PermissionNode,
) -> PermissionAction {
    let mut action = user.permission_action(node);
    if action == PermissionAction::Deny {
        return action;
    }

    for group in groups {
        action = action.most_restrictive(group.permission_action(node));
        if action == PermissionAction::Deny {
            return action;
        }
    }
    action
}

/// Highest-ranked group with an opinion wins, then the user's own action wins over all
fn evaluate_hierarchical(
    user: &UserOverride,
    groups: &[Arc<Group>],
    node: &PermissionNode,
) -> PermissionAction {
    // Walk backwards so higher groups are applied last and override lower ones
    let action = groups
        .iter()
        .rev()
        .fold(PermissionAction::Neutral, |action, group| {
            action.overridden_by(group.permission_action(node))
        });

    action.overridden_by(user.permission_action(node))
}
