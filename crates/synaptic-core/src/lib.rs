//! # Synaptic Core
//!
//! A fuzzy concept-activation graph engine: a graph of concepts that thinks
//! by spreading activation, grows by fusing concepts that keep firing
//! together, forgets what goes unused, and decides what to do next through
//! Mamdani fuzzy inference over its own statistics.
//!
//! ## Core Concepts
//!
//! ### Concepts
//!
//! Every concept is a unit-norm vector with scalar state (strength, curiosity,
//! activation count, timestamps) connected to others by directed weighted
//! edges. Unused concepts weaken logarithmically:
//!
//! ```text
//! strength -= rate × ln(1 + hours_since_touch)
//! ```
//!
//! and are pruned at the oblivion threshold.
//!
//! ### Propagation
//!
//! Thinking about a seed concept activates its neighbours step by step:
//!
//! ```text
//! a_j = max(a_j × persistence, max_i a_i × w_ij × (1 + ε))
//! ```
//!
//! Concepts that co-activate can be wired together (`auto_modify`) or fused
//! into a new emergent concept (`genesis`).
//!
//! ### Decisions
//!
//! The [`DecisionBridge`] turns graph statistics (activation, novelty,
//! strength, curiosity, local density) into crisp inputs, and a
//! [`FuzzyEngine`] maps them to five drives: explore, generate_idea, forget,
//! dream and connect.
//!
//! ## Example
//!
//! ```rust
//! use synaptic_core::{
//!     ConceptGraph, DecisionBridge, DecisionConfig, GraphConfig, PropagationEngine,
//! };
//!
//! let mut graph = ConceptGraph::seeded(GraphConfig { dim: 8, ..GraphConfig::default() }, 7)?;
//! graph.create("rain", None, "weather")?;
//! graph.create("umbrella", None, "object")?;
//! graph.relate("rain", "umbrella", Some(0.8), true)?;
//!
//! let engine = PropagationEngine::default();
//! let run = engine.activate(&mut graph, "rain", 3, 0.0);
//! assert!(run[1].get("umbrella") > 0.0);
//!
//! let bridge = DecisionBridge::standard(DecisionConfig::default())?;
//! let decisions = bridge.decide_for_cycle(&graph);
//! assert!((0.0..=1.0).contains(&decisions.explore));
//! # Ok::<(), synaptic_core::CoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod graph;
pub mod persistence;
pub mod propagation;
pub mod rulebase;
pub mod store;

pub use bridge::{DecisionBridge, DecisionConfig, Decisions, FuzzyInputs};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use fuzzy::{
	Clause, CrispValues, FuzzyEngine, FuzzySet, FuzzyVariable, InferenceTrace, Membership, Rule,
};
pub use graph::{
	normalized, Concept, ConceptGraph, GenesisCandidate, GraphConfig, GraphMetrics, GraphStats,
	Lineage, DEFAULT_CATEGORY, EMERGENT_CATEGORY,
};
pub use persistence::{ConceptState, EdgeState, GraphState};
pub use propagation::{ActivationSnapshot, PropagationConfig, PropagationEngine};
pub use store::{cosine_similarity, VectorStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
