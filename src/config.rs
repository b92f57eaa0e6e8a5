//! Analysis configuration and result storage.
//!
//! Analyses are addressed by string ids (`livevar`, `constprop`, `deadcode`,
//! `cha`, `inter-constprop`, `pta`). [`AnalysisConfig`] couples an id with
//! its options; options are JSON values with typed getters, matching the
//! declarative documents the engine is configured from. All validation
//! happens here, before any solver runs: unknown ids, selector names or
//! heap models are configuration errors, never solver failures.
//!
//! [`ResultsStore`] is where a driver stashes each analysis' result keyed by
//! its id, so downstream analyses (dead code wants constants and liveness,
//! the refined interprocedural propagation wants points-to) find their
//! inputs without global state.

use std::any::Any;

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use crate::{Error, Result};

/// The analysis ids known to the engine.
pub const KNOWN_ANALYSES: &[&str] = &[
    crate::dataflow::livevar::ID,
    crate::dataflow::constprop::ID,
    crate::dataflow::deadcode::ID,
    crate::callgraph::ID,
    crate::dataflow::inter::ID,
    crate::pta::ID,
];

/// The heap-model names known to the engine.
pub const KNOWN_HEAP_MODELS: &[&str] = &["alloc-site"];

/// String-keyed options of one analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    options: FxHashMap<String, JsonValue>,
}

impl AnalysisOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.options.insert(key.to_string(), value.into());
    }

    /// The raw value of an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    /// A string option.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the option exists with a non-string
    /// shape.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(Error::Config(format!(
                "option '{key}' must be a string, got {other}"
            ))),
        }
    }

    /// A boolean option.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the option exists with a non-boolean
    /// shape.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(JsonValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Error::Config(format!(
                "option '{key}' must be a boolean, got {other}"
            ))),
        }
    }
}

/// The configuration of one analysis run: its id plus options.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    id: String,
    options: AnalysisOptions,
}

impl AnalysisConfig {
    /// Creates a configuration, validating the analysis id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAnalysis`] for ids outside
    /// [`KNOWN_ANALYSES`].
    pub fn new(id: &str) -> Result<Self> {
        if !KNOWN_ANALYSES.contains(&id) {
            return Err(Error::UnknownAnalysis(id.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            options: AnalysisOptions::new(),
        })
    }

    /// Adds an option (builder style).
    #[must_use]
    pub fn with_option(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.options.set(key, value);
        self
    }

    /// The analysis id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The options.
    #[must_use]
    pub const fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// The configured context selector for a pointer analysis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown selector names or malformed
    /// options.
    pub fn context_selector(&self) -> Result<Box<dyn crate::pta::ContextSelector>> {
        let name = self.options.get_str("cs")?.unwrap_or("ci");
        crate::pta::selector_by_name(name)
    }

    /// Validates the configured heap-model name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown heap models or malformed
    /// options.
    pub fn heap_model(&self) -> Result<&str> {
        let name = self.options.get_str("heap")?.unwrap_or("alloc-site");
        if !KNOWN_HEAP_MODELS.contains(&name) {
            return Err(Error::Config(format!("unknown heap model: {name}")));
        }
        Ok(name)
    }

    /// The configured taint-config path, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the option is present but not a
    /// string.
    pub fn taint_config_path(&self) -> Result<Option<&str>> {
        self.options.get_str("taint-config")
    }
}

/// Type-erased storage of analysis results keyed by analysis id.
#[derive(Default)]
pub struct ResultsStore {
    results: FxHashMap<String, Box<dyn Any>>,
}

impl std::fmt::Debug for ResultsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsStore")
            .field("ids", &self.results.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResultsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a result under an analysis id, replacing any previous one.
    pub fn store<T: 'static>(&mut self, id: &str, result: T) {
        self.results.insert(id.to_string(), Box::new(result));
    }

    /// Fetches a result by analysis id and type.
    #[must_use]
    pub fn get<T: 'static>(&self, id: &str) -> Option<&T> {
        self.results.get(id).and_then(|r| r.downcast_ref())
    }

    /// Returns `true` if a result is stored under the id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.results.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_analysis_id_is_rejected() {
        assert!(AnalysisConfig::new("constprop").is_ok());
        assert!(AnalysisConfig::new("pta").is_ok());
        assert!(matches!(
            AnalysisConfig::new("frobnicate"),
            Err(Error::UnknownAnalysis(_))
        ));
    }

    #[test]
    fn test_selector_and_heap_options() {
        let config = AnalysisConfig::new("pta")
            .unwrap()
            .with_option("cs", "2-obj")
            .with_option("heap", "alloc-site");
        assert!(config.context_selector().is_ok());
        assert_eq!(config.heap_model().unwrap(), "alloc-site");

        let bad = AnalysisConfig::new("pta").unwrap().with_option("cs", "9-obj");
        assert!(bad.context_selector().is_err());

        let bad_heap = AnalysisConfig::new("pta").unwrap().with_option("heap", "merged");
        assert!(bad_heap.heap_model().is_err());

        let bad_shape = AnalysisConfig::new("pta").unwrap().with_option("cs", 2);
        assert!(bad_shape.context_selector().is_err());
    }

    #[test]
    fn test_results_store_roundtrip() {
        let mut store = ResultsStore::new();
        store.store("constprop", vec![1u32, 2, 3]);
        assert!(store.contains("constprop"));
        assert_eq!(store.get::<Vec<u32>>("constprop").unwrap().len(), 3);
        // wrong type reads as absent
        assert!(store.get::<String>("constprop").is_none());
        assert!(!store.contains("livevar"));
    }
}
