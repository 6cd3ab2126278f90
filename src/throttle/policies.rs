//! Named throttle policies and their configuration.
//!
//! Endpoint classes map to a limit and a window. The classes the reference
//! deployment fixes (`financial`, `auth`, `general`) ship as built-in
//! defaults; anything else (`messages`, `tips`, `uploads`, ...) is
//! deployment-specific and comes from a YAML or JSON policy file.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};

/// How many requests an identifier may make within a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Maximum requests allowed in the window
    pub limit: u32,
    /// Window duration in seconds
    pub window_secs: u64,
}

impl Policy {
    /// Create a policy, rejecting zero limits and zero windows.
    pub fn new(limit: u32, window_secs: u64) -> Result<Self> {
        let policy = Self { limit, window_secs };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that the policy is enforceable.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(FloodgateError::Policy(
                "limit must be a positive integer".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(FloodgateError::Policy(
                "window must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    /// Window duration in milliseconds.
    pub fn window_ms(&self) -> i64 {
        self.window_secs as i64 * 1000
    }
}

/// A named policy table mapping endpoint classes to policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    policies: HashMap<String, Policy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            "financial".to_string(),
            Policy {
                limit: 10,
                window_secs: 60,
            },
        );
        policies.insert(
            "auth".to_string(),
            Policy {
                limit: 10,
                window_secs: 60,
            },
        );
        policies.insert(
            "general".to_string(),
            Policy {
                limit: 200,
                window_secs: 60,
            },
        );
        Self { policies }
    }
}

impl PolicyTable {
    /// Create a table with the built-in default classes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with no classes at all.
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Load a policy table from a YAML or JSON file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading throttle policy table");

        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Load a policy table from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: PolicyTable = serde_yaml::from_str(yaml).map_err(|e| {
            FloodgateError::Config(format!("Failed to parse policy table: {}", e))
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Load a policy table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: PolicyTable = serde_json::from_str(json).map_err(|e| {
            FloodgateError::Config(format!("Failed to parse policy table: {}", e))
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Overlay `other` on top of this table, replacing colliding classes.
    pub fn with_overrides(mut self, other: PolicyTable) -> Self {
        self.policies.extend(other.policies);
        self
    }

    /// Get the policy for an endpoint class.
    pub fn get(&self, class: &str) -> Option<&Policy> {
        self.policies.get(class)
    }

    /// Set or replace the policy for an endpoint class.
    pub fn insert(&mut self, class: impl Into<String>, policy: Policy) {
        self.policies.insert(class.into(), policy);
    }

    /// Check every configured policy, naming the offending class on failure.
    pub fn validate(&self) -> Result<()> {
        for (class, policy) in &self.policies {
            policy
                .validate()
                .map_err(|e| FloodgateError::Config(format!("policy '{}': {}", class, e)))?;
        }
        Ok(())
    }

    /// Number of configured classes.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the table has no classes.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// A shared, swappable policy table.
///
/// Deployments that reload their policy file without restarting replace
/// the whole table at once; readers copy policies out and never observe a
/// partially updated table.
pub struct PolicyStore {
    table: RwLock<PolicyTable>,
}

impl PolicyStore {
    /// Create a store holding the given table.
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Get the policy for an endpoint class.
    pub fn get(&self, class: &str) -> Option<Policy> {
        self.table.read().get(class).copied()
    }

    /// Replace the entire table.
    pub fn replace(&self, table: PolicyTable) {
        let mut current = self.table.write();
        *current = table;
    }

    /// Get a copy of the current table.
    pub fn table(&self) -> PolicyTable {
        self.table.read().clone()
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(PolicyTable::default())
    }
}
