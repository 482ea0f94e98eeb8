//! Guild permission system
//!
//! Each guild owns a [`PermissionEvaluator`] holding:
//! - **Groups**: ranked sets of node actions, joined directly or through platform roles
//! - **User overrides**: per-member node actions and direct group assignments
//! - **Mode**: how conflicting actions are merged
//!
//! ## Modes
//!
//! - `Hierarchical`: the highest-ranked group with an opinion wins, and the
//!   member's own override wins over every group
//! - `MostRestrictive`: any denial from the member or any group wins
//!
//! ## Example
//!
//! ```rust,ignore
//! use cascade_permissions::config::{StaticSecurity, TenantConfig};
//! use cascade_permissions::permissions::{
//!     PermissionAction, PermissionEvaluator, PermissionNode, StaticMember,
//! };
//! use std::sync::Arc;
//!
//! let config = TenantConfig::default();
//! let evaluator = PermissionEvaluator::from_config(&config, Arc::new(StaticSecurity::default()));
//!
//! let ban = PermissionNode::new("ban", "Ban command", false);
//! let mods = evaluator.create_group("Moderators")?;
//! mods.set_permission(&ban, PermissionAction::Allow);
//! mods.add_role(1234);
//!
//! let member = StaticMember::new(42).with_roles([1234]);
//! assert!(evaluator.has_permission(&member, &ban, &config, None));
//! ```

mod action;
mod evaluator;
mod group;
mod ids;
mod member;
mod node;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{PermissionAction, PermissionMode};
pub use evaluator::{AccessDecision, DecisionSource, PermissionEvaluator, MAX_GROUP_ID_ATTEMPTS};
pub use group::{Group, UserOverride};
pub use ids::{GroupIdSource, RandomGroupIds, GROUP_ID_LEN};
pub use member::{
    ChannelId, Member, PrincipalId, RoleId, SecurityContext, SecurityLevel, StaticMember,
};
pub use node::{NativePermission, NodeRegistry, PermissionNode};
