//! Permission nodes
//!
//! A node names one protected action (a command, a sub command, a module
//! feature). Nodes are declared once and never change afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::core::{PermissionError, PermissionResult};

/// Coarse permission bits granted by the chat platform itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NativePermission {
    Administrator,
    ManageServer,
    ManageRoles,
    ManageChannels,
    KickMembers,
    BanMembers,
    ManageMessages,
    MentionEveryone,
    ViewChannel,
    SendMessages,
    VoiceConnect,
    VoiceSpeak,
    VoiceMuteOthers,
    VoiceMoveOthers,
}

/// An immutable protected-action descriptor
///
/// Two nodes are the same node iff their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionNode {
    id: String,
    display_name: String,
    #[serde(default)]
    default_allow: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    native_fallback: BTreeSet<NativePermission>,
}

impl PermissionNode {
    /// Declare a node
    ///
    /// `default_allow` nodes are granted to everyone nobody has an opinion about.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, default_allow: bool) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            default_allow,
            native_fallback: BTreeSet::new(),
        }
    }

    /// Add native permissions that grant this node when no group or override has an opinion
    pub fn with_native(mut self, perms: impl IntoIterator<Item = NativePermission>) -> Self {
        self.native_fallback.extend(perms);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn default_allow(&self) -> bool {
        self.default_allow
    }

    pub fn native_fallback(&self) -> &BTreeSet<NativePermission> {
        &self.native_fallback
    }
}

impl PartialEq for PermissionNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PermissionNode {}

impl Hash for PermissionNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for PermissionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

/// Catalogue of every node the application declares, keyed by id
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, PermissionNode>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node
    ///
    /// Fails if the id is empty or already taken.
    pub fn register(&mut self, node: PermissionNode) -> PermissionResult<()> {
        if node.id.trim().is_empty() {
            return Err(PermissionError::MissingInput("node id"));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(PermissionError::DuplicateNode(node.id));
        }
        tracing::debug!(node = %node.id, "Registering permission node");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PermissionNode> {
        self.nodes.get(id)
    }

    /// Look up a node, failing with `NodeNotFound`
    pub fn require(&self, id: &str) -> PermissionResult<&PermissionNode> {
        self.get(id)
            .ok_or_else(|| PermissionError::NodeNotFound(id.to_string()))
    }

    /// Iterate nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &PermissionNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
