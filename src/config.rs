//! Guild and instance configuration
//!
//! - `TenantConfig` - per-guild settings read by access checks
//! - `SecurityConfig` - instance-wide operators and deployment environment

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{PermissionError, PermissionResult};
use crate::permissions::{PermissionMode, PrincipalId, SecurityContext, SecurityLevel};

/// Per-guild permission settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Members with the platform Administrator permission bypass all checks
    #[serde(default = "default_admins_have_all_perms")]
    pub admins_have_all_perms: bool,

    /// How group and user actions are merged
    #[serde(default)]
    pub mode: PermissionMode,
}

fn default_admins_have_all_perms() -> bool {
    true
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            admins_have_all_perms: true,
            mode: PermissionMode::default(),
        }
    }
}

impl TenantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admins_have_all_perms(mut self, enabled: bool) -> Self {
        self.admins_have_all_perms = enabled;
        self
    }

    pub fn with_mode(mut self, mode: PermissionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> PermissionResult<Self> {
        load_json(path.as_ref())
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Instance-wide operator clearance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Users with developer clearance; implies contributor clearance
    #[serde(default)]
    pub developers: BTreeSet<PrincipalId>,

    /// Users with contributor clearance
    #[serde(default)]
    pub contributors: BTreeSet<PrincipalId>,

    #[serde(default)]
    pub environment: Environment,
}

impl SecurityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_developer(mut self, id: PrincipalId) -> Self {
        self.developers.insert(id);
        self
    }

    pub fn with_contributor(mut self, id: PrincipalId) -> Self {
        self.contributors.insert(id);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Load from a JSON file, rejecting ids listed as both developer and contributor
    pub fn load(path: impl AsRef<Path>) -> PermissionResult<Self> {
        let config: Self = load_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PermissionResult<()> {
        if let Some(id) = self.developers.intersection(&self.contributors).next() {
            return Err(PermissionError::invalid_config(format!(
                "user {} is listed as both developer and contributor",
                id
            )));
        }
        Ok(())
    }
}

/// `SecurityContext` backed by a fixed `SecurityConfig`
#[derive(Debug, Clone, Default)]
pub struct StaticSecurity {
    config: SecurityConfig,
}

impl StaticSecurity {
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }
}

impl SecurityContext for StaticSecurity {
    fn is_authorised(&self, principal: PrincipalId, level: SecurityLevel) -> bool {
        let developer = self.config.developers.contains(&principal);
        match level {
            SecurityLevel::Developer => developer,
            SecurityLevel::Contributor => developer || self.config.contributors.contains(&principal),
        }
    }

    fn is_development(&self) -> bool {
        self.config.environment == Environment::Development
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> PermissionResult<T> {
    let contents = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(value)
}
