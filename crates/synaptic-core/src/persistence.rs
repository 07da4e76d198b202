//! Graph Persistence
//!
//! The whole graph round-trips through one JSON document:
//!
//! ```text
//! { "dim_vector": 64,
//!   "concepts": { "A": { "vector": [...], "strength": 0.5, "activations": 3,
//!                        "last_touched": 1.7e9, "category": "x",
//!                        "lineage": null, "created_at": 1.7e9, "curiosity": 0.5 } },
//!   "edges": [ { "from": "A", "to": "B", "weight": 0.8 } ],
//!   "metrics": { "concepts_created": 2, "edges_formed": 1, "genesis_count": 0 } }
//! ```
//!
//! Concepts and edges are written in name order so identical graphs produce
//! identical documents. Activation history, the RNG and the clock are not
//! persisted.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::graph::{ConceptGraph, ConceptRecord, GraphConfig, GraphMetrics, Lineage};

/// Serialized form of a [`ConceptGraph`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
	/// Vector dimension
	pub dim_vector: usize,
	/// Concepts by name
	pub concepts: BTreeMap<String, ConceptState>,
	/// Non-zero directed edges
	#[serde(default)]
	pub edges: Vec<EdgeState>,
	/// Lifetime counters
	#[serde(default)]
	pub metrics: GraphMetrics,
}

/// Serialized form of one concept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptState {
	/// Semantic vector (normalized again on load)
	pub vector: Vec<f64>,
	/// Strength in `[0, 1]`
	pub strength: f64,
	/// Activation count
	pub activations: u64,
	/// Last touch (seconds)
	pub last_touched: f64,
	/// Category tag
	pub category: String,
	/// Genesis ancestry
	#[serde(default)]
	pub lineage: Option<Lineage>,
	/// Creation time; `last_touched` when absent
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<f64>,
	/// Curiosity; the configured initial curiosity when absent
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub curiosity: Option<f64>,
}

/// Serialized form of one directed edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeState {
	/// Source concept
	pub from: String,
	/// Target concept
	pub to: String,
	/// Weight in `(0, 1]`
	pub weight: f64,
}

impl ConceptGraph {
	/// Snapshot of the persistent state.
	#[must_use]
	pub fn to_state(&self) -> GraphState {
		let names: Vec<&str> = self.names().collect();

		let concepts = names
			.iter()
			.enumerate()
			.map(|(index, &name)| {
				let record = self.record(index);
				let state = ConceptState {
					vector: self.vector(name).map(|v| v.to_vec()).unwrap_or_default(),
					strength: record.strength,
					activations: record.activation_count,
					last_touched: record.last_touched,
					category: record.category.clone(),
					lineage: record.lineage.clone(),
					created_at: Some(record.created_at),
					curiosity: Some(record.curiosity),
				};
				(name.to_string(), state)
			})
			.collect();

		let live = self.adjacency();
		let mut edges: Vec<EdgeState> = live
			.indexed_iter()
			.filter(|(_, &w)| w > 0.0)
			.map(|((i, j), &w)| EdgeState {
				from: names[i].to_string(),
				to: names[j].to_string(),
				weight: w,
			})
			.collect();
		edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));

		GraphState {
			dim_vector: self.dim(),
			concepts,
			edges,
			metrics: *self.metrics(),
		}
	}

	/// Rebuild a graph from persisted state with an entropy-seeded RNG and the
	/// system clock. The state's dimension overrides `config.dim`.
	///
	/// # Errors
	///
	/// Returns [`CoreError::MalformedState`] for inconsistent state and
	/// [`CoreError::InvalidArgument`] for an invalid configuration.
	pub fn from_state(state: GraphState, config: GraphConfig) -> Result<Self> {
		Self::from_state_with_parts(state, config, StdRng::from_entropy(), Arc::new(SystemClock))
	}

	/// Rebuild a graph from persisted state with explicit collaborators.
	///
	/// # Errors
	///
	/// Returns [`CoreError::MalformedState`] for a zero dimension, vectors of
	/// the wrong dimension, non-finite or out-of-range scalars, and edges with
	/// unknown endpoints or bad weights. [`CoreError::InvalidArgument`] for an
	/// invalid configuration.
	pub fn from_state_with_parts(
		state: GraphState,
		mut config: GraphConfig,
		rng: StdRng,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		if state.dim_vector == 0 {
			return Err(CoreError::MalformedState("dim_vector must be positive".into()));
		}
		if config.dim != state.dim_vector {
			debug!(configured = config.dim, stored = state.dim_vector, "using stored dimension");
			config.dim = state.dim_vector;
		}
		config.initial_capacity = config.initial_capacity.max(state.concepts.len());
		let initial_curiosity = config.initial_curiosity;
		let mut graph = Self::with_parts(config, rng, clock)?;

		for (name, concept) in state.concepts {
			let (vector, record) = concept.into_parts(&name, initial_curiosity)?;
			let _ = graph.restore(&name, &vector, record)?;
		}

		for edge in &state.edges {
			let (Ok(from), Ok(to)) = (graph.require(&edge.from), graph.require(&edge.to)) else {
				return Err(CoreError::MalformedState(format!(
					"edge {} -> {} references an unknown concept",
					edge.from, edge.to
				)));
			};
			if from == to {
				return Err(CoreError::MalformedState(format!("self-edge on {}", edge.from)));
			}
			if !(edge.weight.is_finite() && (0.0..=1.0).contains(&edge.weight)) {
				return Err(CoreError::MalformedState(format!(
					"edge {} -> {} has weight {} outside [0, 1]",
					edge.from, edge.to, edge.weight
				)));
			}
			graph.restore_edge(from, to, edge.weight);
		}

		*graph.metrics_mut() = state.metrics;
		Ok(graph)
	}

	/// Compact JSON document.
	///
	/// # Errors
	///
	/// Returns [`CoreError::Serialization`] if encoding fails.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.to_state())?)
	}

	/// Indented JSON document.
	///
	/// # Errors
	///
	/// Returns [`CoreError::Serialization`] if encoding fails.
	pub fn to_json_pretty(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(&self.to_state())?)
	}

	/// Parse a JSON document produced by [`to_json`](Self::to_json).
	///
	/// # Errors
	///
	/// Returns [`CoreError::Serialization`] for invalid JSON and
	/// [`CoreError::MalformedState`] for inconsistent content.
	pub fn from_json(json: &str, config: GraphConfig) -> Result<Self> {
		let state: GraphState = serde_json::from_str(json)?;
		Self::from_state(state, config)
	}

	/// Write the graph to `path` as indented JSON, creating parent directories.
	///
	/// # Errors
	///
	/// Returns [`CoreError::Io`] or [`CoreError::Serialization`].
	#[instrument(skip(self, path), fields(path = %path.as_ref().display(), concepts = self.len()))]
	pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, self.to_json_pretty()?)?;
		info!("Saved graph");
		Ok(())
	}

	/// Read a graph written by [`save_to_path`](Self::save_to_path).
	///
	/// # Errors
	///
	/// Returns [`CoreError::Io`], [`CoreError::Serialization`] or
	/// [`CoreError::MalformedState`].
	#[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
	pub fn load_from_path(path: impl AsRef<Path>, config: GraphConfig) -> Result<Self> {
		let json = std::fs::read_to_string(path.as_ref())?;
		let graph = Self::from_json(&json, config)?;
		info!(concepts = graph.len(), edges = graph.edge_count(), "Loaded graph");
		Ok(graph)
	}
}

impl ConceptState {
	fn into_parts(self, name: &str, initial_curiosity: f64) -> Result<(Vec<f64>, ConceptRecord)> {
		let malformed = |what: &str| CoreError::MalformedState(format!("concept {name}: {what}"));

		if !(self.strength.is_finite() && (0.0..=1.0).contains(&self.strength)) {
			return Err(malformed("strength outside [0, 1]"));
		}
		if !self.last_touched.is_finite() {
			return Err(malformed("non-finite last_touched"));
		}
		let created_at = self.created_at.unwrap_or(self.last_touched);
		if !created_at.is_finite() {
			return Err(malformed("non-finite created_at"));
		}
		let curiosity = self.curiosity.unwrap_or(initial_curiosity);
		if !(curiosity.is_finite() && (0.0..=1.0).contains(&curiosity)) {
			return Err(malformed("curiosity outside [0, 1]"));
		}

		let record = ConceptRecord {
			strength: self.strength,
			activation_count: self.activations,
			last_touched: self.last_touched,
			created_at,
			curiosity,
			category: self.category,
			lineage: self.lineage,
		};
		Ok((self.vector, record))
	}
}
