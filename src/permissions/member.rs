//! Host platform capabilities consumed by the evaluator
//!
//! The evaluator never talks to the chat platform directly. Callers hand it a
//! [`Member`] (who is asking) and the evaluator holds a [`SecurityContext`]
//! (instance-wide operator clearance).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::node::NativePermission;

/// Platform user id
pub type PrincipalId = u64;

/// Platform role id
pub type RoleId = u64;

/// Platform channel id
pub type ChannelId = u64;

/// A guild member as seen by the host platform
pub trait Member: Send + Sync {
    /// Stable user id
    fn id(&self) -> PrincipalId;

    /// Roles the member currently holds
    fn role_ids(&self) -> BTreeSet<RoleId>;

    /// Whether the member owns the guild
    fn is_owner(&self) -> bool;

    /// Whether the member holds every one of `perms`
    ///
    /// Scoped to `channel` when given (channel overwrites apply), otherwise
    /// guild-wide.
    fn has_native(&self, perms: &BTreeSet<NativePermission>, channel: Option<ChannelId>) -> bool;
}

/// Instance-wide operator clearance levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Developer,
    Contributor,
}

/// Operator clearance and deployment environment
pub trait SecurityContext: Send + Sync {
    /// Whether the user holds the given clearance level
    fn is_authorised(&self, principal: PrincipalId, level: SecurityLevel) -> bool;

    /// Whether this deployment is a development build
    fn is_development(&self) -> bool;
}

/// A member described entirely by data
///
/// Used by the scenario runner and handy for embedding applications that
/// already resolved platform state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticMember {
    pub id: PrincipalId,

    #[serde(default)]
    pub roles: BTreeSet<RoleId>,

    #[serde(default)]
    pub owner: bool,

    /// Guild-wide native permissions
    #[serde(default)]
    pub native: BTreeSet<NativePermission>,

    /// Effective native permissions per channel, replacing the guild-wide set there
    /// (guild-wide Administrator still applies)
    #[serde(default)]
    pub channel_native: HashMap<ChannelId, BTreeSet<NativePermission>>,
}

impl StaticMember {
    pub fn new(id: PrincipalId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn with_owner(mut self, owner: bool) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_native(mut self, perms: impl IntoIterator<Item = NativePermission>) -> Self {
        self.native.extend(perms);
        self
    }

    pub fn with_channel_native(
        mut self,
        channel: ChannelId,
        perms: impl IntoIterator<Item = NativePermission>,
    ) -> Self {
        self.channel_native
            .entry(channel)
            .or_default()
            .extend(perms);
        self
    }

    fn native_in(&self, channel: Option<ChannelId>) -> &BTreeSet<NativePermission> {
        channel
            .and_then(|c| self.channel_native.get(&c))
            .unwrap_or(&self.native)
    }
}

impl Member for StaticMember {
    fn id(&self) -> PrincipalId {
        self.id
    }

    fn role_ids(&self) -> BTreeSet<RoleId> {
        self.roles.clone()
    }

    fn is_owner(&self) -> bool {
        self.owner
    }

    fn has_native(&self, perms: &BTreeSet<NativePermission>, channel: Option<ChannelId>) -> bool {
        // Administrator implies every other bit everywhere, as on the platform itself
        if self.native.contains(&NativePermission::Administrator) {
            return true;
        }
        let held = self.native_in(channel);
        held.contains(&NativePermission::Administrator) || perms.is_subset(held)
    }
}
