//! # Pool Configuration
//!
//! Pool settings are external data, loaded once at startup from TOML.
//!
//! ```toml
//! [pools.decals]
//! prewarm = 32
//! capacity_hint = 128
//!
//! [pools.tiles]
//! capacity_hint = 64
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Upper bound on items created up front by a single pool.
pub const MAX_PREWARM: usize = 65_536;

/// Settings for one pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool name, used in logs and errors.
    pub name: String,
    /// Items created into the available set when the pool is built.
    pub prewarm: usize,
    /// Expected peak number of live items (storage is reserved for it).
    pub capacity_hint: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            prewarm: 0,
            capacity_hint: 16,
        }
    }
}

impl PoolConfig {
    /// Creates a default configuration with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the prewarm count.
    #[must_use]
    pub const fn with_prewarm(mut self, prewarm: usize) -> Self {
        self.prewarm = prewarm;
        self
    }

    /// Sets the capacity hint.
    #[must_use]
    pub const fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    /// Checks the configuration for values the pool cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] for an empty name or a prewarm
    /// count above [`MAX_PREWARM`].
    pub fn validate(&self) -> PoolResult<()> {
        if self.name.trim().is_empty() {
            return Err(PoolError::InvalidConfig(
                "pool name must not be empty".to_string(),
            ));
        }
        if self.prewarm > MAX_PREWARM {
            return Err(PoolError::InvalidConfig(format!(
                "pool `{}` prewarm {} exceeds limit {}",
                self.name, self.prewarm, MAX_PREWARM
            )));
        }
        Ok(())
    }
}

/// A set of named pool configurations, as loaded from one TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfigSet {
    /// Configurations by pool name.
    #[serde(default)]
    pub pools: BTreeMap<String, PoolConfig>,
}

impl PoolConfigSet {
    /// Parses a configuration set from TOML text.
    ///
    /// A table without an explicit `name` takes its table key as name.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the text is not valid TOML for
    /// this schema or if any entry fails validation.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        let mut set: Self =
            toml::from_str(text).map_err(|err| PoolError::InvalidConfig(err.to_string()))?;

        for (key, config) in &mut set.pools {
            if config.name.is_empty() || config.name == PoolConfig::default().name {
                config.name.clone_from(key);
            }
            config.validate()?;
        }

        Ok(set)
    }

    /// Loads a configuration set from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            PoolError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns the configuration for `name`, or defaults under that name.
    #[must_use]
    pub fn get(&self, name: &str) -> PoolConfig {
        self.pools
            .get(name)
            .cloned()
            .unwrap_or_else(|| PoolConfig::named(name))
    }
}
