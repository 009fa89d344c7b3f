//! Agent kind registry.
//!
//! Maps a kind identifier from a night script to the constructor for its
//! [`Behavior`]. Kinds are registered explicitly at startup; custom nights
//! can add their own next to the built-ins.
//!
//! ```
//! use nightwatch_logic::registry::AgentRegistry;
//!
//! let registry = AgentRegistry::builtin();
//! assert!(registry.contains("stalker"));
//! assert_eq!(registry.kinds().collect::<Vec<_>>(), ["ambusher", "rusher", "stalker"]);
//! ```

use std::collections::BTreeMap;

use crate::animatronic::Behavior;
use crate::behaviors::{Ambusher, Forbidden, Rusher, Stalker};
use crate::error::ConfigError;
use crate::script::AgentSpec;

/// Builds the behavior for one agent from its script entry.
pub type BehaviorFactory = fn(&AgentSpec) -> Result<Box<dyn Behavior>, ConfigError>;

#[derive(Clone, Default)]
pub struct AgentRegistry {
    factories: BTreeMap<String, BehaviorFactory>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl AgentRegistry {
    /// Registry with no kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("stalker", build_stalker);
        registry.register("ambusher", build_ambusher);
        registry.register("rusher", build_rusher);
        registry
    }

    /// Add or replace a kind. Returns the factory it replaced.
    pub fn register(&mut self, kind: &str, factory: BehaviorFactory) -> Option<BehaviorFactory> {
        self.factories.insert(kind.to_string(), factory)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, spec: &AgentSpec) -> Result<Box<dyn Behavior>, ConfigError> {
        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| ConfigError::UnknownAgentKind(spec.kind.clone()))?;
        factory(spec)
    }
}

fn patience(spec: &AgentSpec) -> Result<f32, ConfigError> {
    match spec.patience_seconds {
        Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
        Some(p) => Err(ConfigError::InvalidAgent {
            agent: spec.name.clone(),
            reason: format!("patience_seconds {p} must be a non-negative number"),
        }),
        None => Err(ConfigError::InvalidAgent {
            agent: spec.name.clone(),
            reason: format!("kind `{}` requires patience_seconds", spec.kind),
        }),
    }
}

fn build_stalker(spec: &AgentSpec) -> Result<Box<dyn Behavior>, ConfigError> {
    Ok(Box::new(Stalker::new(
        patience(spec)?,
        Forbidden::new(spec.forbidden.iter().cloned()),
    )))
}

fn build_ambusher(spec: &AgentSpec) -> Result<Box<dyn Behavior>, ConfigError> {
    Ok(Box::new(Ambusher::new(
        patience(spec)?,
        Forbidden::new(spec.forbidden.iter().cloned()),
    )))
}

fn build_rusher(spec: &AgentSpec) -> Result<Box<dyn Behavior>, ConfigError> {
    Ok(Box::new(Rusher::new(Forbidden::new(
        spec.forbidden.iter().cloned(),
    ))))
}
