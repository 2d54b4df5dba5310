//! Layered rule configuration
//!
//! A reactor's effective configuration is an ordered list of partial
//! layers, most general first. Lookup walks the layers from the end: the
//! last layer defining a non-null value for a key wins, and a later layer
//! that omits a key (or maps it to null) never masks an earlier value.
//!
//! Layers are YAML files; resolution is keyed by group id and memoized
//! for the whole run.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A single configuration value
pub type ConfigValue = serde_yaml::Value;

/// One configuration layer: a partial option map in declaration order
pub type ConfigLayer = IndexMap<String, ConfigValue>;

/// The effective rule configuration for one group id
#[derive(Debug, Clone, Default)]
pub struct Rules {
    layers: Vec<ConfigLayer>,
}

impl Rules {
    /// Create an empty configuration (every lookup absent)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from layers, most general first
    pub fn from_layers(layers: Vec<ConfigLayer>) -> Self {
        Self { layers }
    }

    /// Append a layer that overrides all earlier ones
    pub fn push_layer(&mut self, layer: ConfigLayer) {
        self.layers.push(layer);
    }

    /// Value for `key` from the last layer defining it non-null
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.layers
            .iter()
            .rev()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.is_null())
    }

    /// String value for `key`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Boolean value for `key`
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// String-sequence value for `key`
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(|v| v.as_sequence())
            .map(|seq| {
                seq.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Load one YAML configuration layer
pub fn load_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(ConfigLayer::new());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

type LayerLoader = Box<dyn Fn(&str) -> Result<Rules, ConfigError>>;

/// Per-group-id configuration cache
///
/// Resolution runs lazily on the first request for a group id and is
/// reused for the rest of the run; rules query it repeatedly within one
/// execution. Single-threaded by design, matching the engine's
/// scheduling model.
pub struct RulesCache {
    loader: LayerLoader,
    resolved: RefCell<HashMap<String, Rc<Rules>>>,
}

impl RulesCache {
    /// Create a cache around a loader
    pub fn new(loader: LayerLoader) -> Self {
        Self {
            loader,
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// File-based layering: an optional shared directory holding one
    /// `<group_id>.yaml` per group, overridden by an optional
    /// project-local file. Missing files simply contribute no layer.
    pub fn layered(shared_dir: Option<PathBuf>, project_file: Option<PathBuf>) -> Self {
        Self::new(Box::new(move |group_id| {
            let mut rules = Rules::new();
            if let Some(dir) = &shared_dir {
                let path = dir.join(format!("{}.yaml", group_id));
                if path.exists() {
                    rules.push_layer(load_layer(&path)?);
                }
            }
            if let Some(file) = &project_file {
                if file.exists() {
                    rules.push_layer(load_layer(file)?);
                }
            }
            Ok(rules)
        }))
    }

    /// Effective configuration for a group id, resolved at most once
    pub fn rules_for(&self, group_id: &str) -> Result<Rc<Rules>, ConfigError> {
        if let Some(rules) = self.resolved.borrow().get(group_id) {
            return Ok(Rc::clone(rules));
        }

        let rules = Rc::new((self.loader)(group_id)?);
        self.resolved
            .borrow_mut()
            .insert(group_id.to_string(), Rc::clone(&rules));
        log::debug!("resolved configuration for group id {}", group_id);
        Ok(rules)
    }
}
