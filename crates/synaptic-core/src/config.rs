//! Engine configuration.
//!
//! One document configures every component; any section or field left out
//! takes its default:
//!
//! ```json
//! { "graph": { "dim": 128, "max_concepts": 5000 },
//!   "propagation": { "noise_scale": 0.05 },
//!   "decisions": { "top_k": 20 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::{DecisionBridge, DecisionConfig};
use crate::error::{CoreError, Result};
use crate::graph::{ConceptGraph, GraphConfig};
use crate::propagation::{PropagationConfig, PropagationEngine};

/// Configuration for the graph, propagation and decision layers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Concept graph
	pub graph: GraphConfig,
	/// Activation propagation
	pub propagation: PropagationConfig,
	/// Decision bridge
	pub decisions: DecisionConfig,
}

impl EngineConfig {
	/// Parse and validate a JSON document.
	///
	/// # Errors
	///
	/// Returns [`CoreError::Serialization`] for invalid JSON and
	/// [`CoreError::InvalidArgument`] for out-of-range values.
	pub fn from_json_str(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Read, parse and validate a JSON file.
	///
	/// # Errors
	///
	/// Returns [`CoreError::Io`] if the file cannot be read, otherwise as
	/// [`from_json_str`](Self::from_json_str).
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		Self::from_json_str(&std::fs::read_to_string(path)?)
	}

	/// Check every section.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] naming the first bad parameter.
	pub fn validate(&self) -> Result<()> {
		self.graph.validate()?;

		let p = &self.propagation;
		if !(p.noise_scale.is_finite() && p.noise_scale >= 0.0) {
			return Err(CoreError::invalid(
				"propagation.noise_scale must be finite and non-negative",
			));
		}
		if !(0.0..=1.0).contains(&p.persistence) {
			return Err(CoreError::invalid(format!(
				"propagation.persistence must be in [0, 1], got {}",
				p.persistence
			)));
		}
		for (name, value) in [("touch_scale", p.touch_scale), ("seed_boost", p.seed_boost)] {
			if !(value.is_finite() && value >= 0.0) {
				return Err(CoreError::invalid(format!(
					"propagation.{name} must be finite and non-negative"
				)));
			}
		}

		let d = &self.decisions;
		if d.top_k == 0 {
			return Err(CoreError::invalid("decisions.top_k must be positive"));
		}
		if !(d.novelty_half_life_hours.is_finite() && d.novelty_half_life_hours > 0.0) {
			return Err(CoreError::invalid("decisions.novelty_half_life_hours must be positive"));
		}
		Ok(())
	}

	/// Empty graph with an entropy-seeded RNG and the system clock.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] for an invalid graph section.
	pub fn build_graph(&self) -> Result<ConceptGraph> {
		ConceptGraph::new(self.graph.clone())
	}

	/// Propagation engine for this configuration.
	#[must_use]
	pub fn build_propagation(&self) -> PropagationEngine {
		PropagationEngine::new(self.propagation.clone())
	}

	/// Decision bridge over the standard rule base.
	///
	/// # Errors
	///
	/// Propagates a failure to build the standard engine.
	pub fn build_bridge(&self) -> Result<DecisionBridge> {
		DecisionBridge::standard(self.decisions.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		EngineConfig::default().validate().unwrap();
	}

	#[test]
	fn test_partial_document() {
		let config = EngineConfig::from_json_str(
			r#"{ "graph": { "dim": 16, "max_concepts": 100 }, "decisions": { "top_k": 3 } }"#,
		)
		.unwrap();
		assert_eq!(config.graph.dim, 16);
		assert_eq!(config.graph.max_concepts, Some(100));
		assert!((config.graph.oblivion_threshold - 0.03).abs() < f64::EPSILON);
		assert_eq!(config.decisions.top_k, 3);
		assert!((config.propagation.persistence - 0.5).abs() < f64::EPSILON);
	}

	#[test]
	fn test_empty_document() {
		let config = EngineConfig::from_json_str("{}").unwrap();
		assert_eq!(config.graph.dim, 64);
		assert_eq!(config.propagation.top_n, 5);
	}

	#[test]
	fn test_rejects_out_of_range() {
		assert!(EngineConfig::from_json_str(r#"{ "graph": { "dim": 0 } }"#).is_err());
		assert!(
			EngineConfig::from_json_str(r#"{ "propagation": { "persistence": 2.0 } }"#).is_err()
		);
		assert!(EngineConfig::from_json_str(r#"{ "decisions": { "top_k": 0 } }"#).is_err());
		assert!(matches!(
			EngineConfig::from_json_str("not json"),
			Err(CoreError::Serialization(_))
		));
	}

	#[test]
	fn test_builders() {
		let config = EngineConfig::from_json_str(r#"{ "graph": { "dim": 8 } }"#).unwrap();
		assert_eq!(config.build_graph().unwrap().dim(), 8);
		assert_eq!(config.build_propagation().config().top_n, 5);
		assert_eq!(config.build_bridge().unwrap().config().top_k, 10);
	}

	#[test]
	fn test_from_missing_path() {
		let err = EngineConfig::from_path("/definitely/not/here.json").unwrap_err();
		assert!(matches!(err, CoreError::Io(_)));
	}
}
