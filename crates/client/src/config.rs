//! Client configuration via `grove.toml`
//!
//! Every field except `project_id` has a default, so the smallest useful
//! file is a single line:
//!
//! ```toml
//! project_id = "my-project"
//! ```

use grove_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "grove.toml";

/// Default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://datastore.googleapis.com";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_lookup_rounds() -> u32 {
    3
}

/// Client configuration loaded from `grove.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Project every request is addressed to
    pub project_id: String,
    /// Named database; the default database when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    /// Namespace applied to keys and queries that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Service root, without a trailing slash
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Lookup attempts while the store keeps deferring keys (default: 3)
    #[serde(default = "default_lookup_rounds")]
    pub lookup_rounds: u32,
}

impl ClientConfig {
    /// Configuration for `project_id` with every other field defaulted.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: None,
            namespace: None,
            endpoint: default_endpoint(),
            lookup_rounds: default_lookup_rounds(),
        }
    }

    /// Set the default namespace (empty string clears it)
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Set the database id (empty string selects the default database)
    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        let database_id = database_id.into();
        self.database_id = (!database_id.is_empty()).then_some(database_id);
        self
    }

    /// Set the service endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty project id, an empty endpoint,
    /// an endpoint with a trailing slash, or zero lookup rounds.
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::config("project_id must not be empty"));
        }
        if self.endpoint.is_empty() {
            return Err(Error::config("endpoint must not be empty"));
        }
        if self.endpoint.ends_with('/') {
            return Err(Error::config(format!(
                "endpoint '{}' must not end with '/'",
                self.endpoint
            )));
        }
        if self.lookup_rounds == 0 {
            return Err(Error::config("lookup_rounds must be at least 1"));
        }
        Ok(())
    }

    /// URL of an RPC method, e.g. `lookup` or `runQuery`.
    pub fn url(&self, method: &str) -> String {
        format!("{}/v1/projects/{}:{}", self.endpoint, self.project_id, method)
    }

    /// Parse and validate config text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this shape or
    /// fails [`validate`](Self::validate).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config { reason } => {
                Error::config(format!("{} (in '{}')", reason, path.display()))
            }
            other => other,
        })
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
