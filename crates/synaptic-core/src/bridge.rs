//! Decision Bridge
//!
//! Reads graph statistics, feeds them through a [`FuzzyEngine`] and returns
//! behavioral decisions. Per concept:
//!
//! | input | formula |
//! |---|---|
//! | activation | `1 - exp(-count / (1 + age_hours))` |
//! | novelty | `1 / (1 + age_hours / half_life_hours)` |
//! | edge_strength | `strength` |
//! | curiosity | `curiosity` |
//! | network_density | `distinct_neighbors / (2 × (n - 1))` |
//!
//! Per cycle, the `top_k` most interesting concepts are evaluated and their
//! decisions averaged, where `interest = strength × curiosity / (1 + hours_since_touch)`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::hours_between;
use crate::error::Result;
use crate::fuzzy::{CrispValues, FuzzyEngine};
use crate::graph::ConceptGraph;
use crate::rulebase::{
	ACTIVATION, CONNECT, CURIOSITY, DREAM, EDGE_STRENGTH, EXPLORE, FORGET, GENERATE_IDEA,
	NETWORK_DENSITY, NOVELTY,
};

/// Output used when the engine leaves a decision undefined.
const NEUTRAL: f64 = 0.5;

/// Configuration for [`DecisionBridge`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
	/// Concepts evaluated per cycle
	pub top_k: usize,
	/// Age in hours at which novelty has halved
	pub novelty_half_life_hours: f64,
}

impl Default for DecisionConfig {
	fn default() -> Self {
		Self {
			top_k: 10,
			novelty_half_life_hours: 24.0,
		}
	}
}

/// Fuzzy inputs derived from one concept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzyInputs {
	/// How strongly the concept has been firing
	pub activation: f64,
	/// How recently the concept was created
	pub novelty: f64,
	/// Concept strength
	pub edge_strength: f64,
	/// Concept curiosity
	pub curiosity: f64,
	/// Share of the graph connected to the concept
	pub network_density: f64,
}

impl FuzzyInputs {
	/// Named crisp values for [`FuzzyEngine::infer`].
	#[must_use]
	pub fn to_crisp(&self) -> CrispValues {
		[
			(ACTIVATION, self.activation),
			(NOVELTY, self.novelty),
			(EDGE_STRENGTH, self.edge_strength),
			(CURIOSITY, self.curiosity),
			(NETWORK_DENSITY, self.network_density),
		]
		.into_iter()
		.map(|(k, v)| (k.to_string(), v))
		.collect()
	}
}

/// Behavioral decisions, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decisions {
	/// Drive to wander to unfamiliar regions
	pub explore: f64,
	/// Drive to synthesize a new concept
	pub generate_idea: f64,
	/// Drive to let weak material decay
	pub forget: f64,
	/// Drive to recombine loosely related material
	pub dream: f64,
	/// Drive to form new edges
	pub connect: f64,
}

impl Decisions {
	/// Decisions for a graph with nothing in it: mostly go explore.
	#[must_use]
	pub const fn exploratory() -> Self {
		Self {
			explore: 0.8,
			generate_idea: 0.5,
			forget: 0.2,
			dream: 0.5,
			connect: 0.5,
		}
	}

	/// Pick the five standard outputs out of an inference result (0.5 if absent).
	#[must_use]
	pub fn from_crisp(values: &CrispValues) -> Self {
		let get = |name: &str| values.get(name).copied().unwrap_or(NEUTRAL);
		Self {
			explore: get(EXPLORE),
			generate_idea: get(GENERATE_IDEA),
			forget: get(FORGET),
			dream: get(DREAM),
			connect: get(CONNECT),
		}
	}

	/// Named crisp values.
	#[must_use]
	pub fn to_crisp(&self) -> CrispValues {
		[
			(EXPLORE, self.explore),
			(GENERATE_IDEA, self.generate_idea),
			(FORGET, self.forget),
			(DREAM, self.dream),
			(CONNECT, self.connect),
		]
		.into_iter()
		.map(|(k, v)| (k.to_string(), v))
		.collect()
	}

	fn mean(all: &[Self]) -> Self {
		#[allow(clippy::cast_precision_loss)]
		let n = all.len().max(1) as f64;
		let avg = |f: fn(&Self) -> f64| all.iter().map(f).sum::<f64>() / n;
		Self {
			explore: avg(|d| d.explore),
			generate_idea: avg(|d| d.generate_idea),
			forget: avg(|d| d.forget),
			dream: avg(|d| d.dream),
			connect: avg(|d| d.connect),
		}
	}
}

/// Turns graph state into decisions through a fuzzy engine.
#[derive(Clone, Debug)]
pub struct DecisionBridge {
	engine: FuzzyEngine,
	config: DecisionConfig,
}

impl DecisionBridge {
	/// Bridge over any engine whose outputs use the standard names.
	#[must_use]
	pub const fn new(engine: FuzzyEngine, config: DecisionConfig) -> Self {
		Self { engine, config }
	}

	/// Bridge over [`FuzzyEngine::standard`].
	///
	/// # Errors
	///
	/// Propagates a failure to build the standard engine.
	pub fn standard(config: DecisionConfig) -> Result<Self> {
		Ok(Self::new(FuzzyEngine::standard()?, config))
	}

	/// Underlying engine.
	#[must_use]
	pub const fn engine(&self) -> &FuzzyEngine {
		&self.engine
	}

	/// Configuration.
	#[must_use]
	pub const fn config(&self) -> &DecisionConfig {
		&self.config
	}

	/// Fuzzy inputs derived from one concept.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`](crate::CoreError::NotFound) if the name is unknown.
	pub fn inputs_for(&self, name: &str, graph: &ConceptGraph) -> Result<FuzzyInputs> {
		let index = graph.require(name)?;
		let record = graph.record(index);
		let age_hours = hours_between(record.created_at, graph.now());

		#[allow(clippy::cast_precision_loss)]
		let count = record.activation_count as f64;
		let half_life = self.config.novelty_half_life_hours.max(f64::MIN_POSITIVE);

		let n = graph.len();
		#[allow(clippy::cast_precision_loss)]
		let network_density = if n <= 1 {
			0.0
		} else {
			graph.local_degree(name)? as f64 / (2.0 * (n - 1) as f64)
		};

		Ok(FuzzyInputs {
			activation: 1.0 - (-count / (1.0 + age_hours)).exp(),
			novelty: 1.0 / (1.0 + age_hours / half_life),
			edge_strength: record.strength,
			curiosity: record.curiosity,
			network_density,
		})
	}

	/// Decisions for one concept, with the inputs that produced them.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`](crate::CoreError::NotFound) if the name is unknown.
	pub fn decide_for_concept(
		&self,
		name: &str,
		graph: &ConceptGraph,
	) -> Result<(Decisions, FuzzyInputs)> {
		let inputs = self.inputs_for(name, graph)?;
		let decisions = Decisions::from_crisp(&self.engine.infer(&inputs.to_crisp()));
		Ok((decisions, inputs))
	}

	/// Decisions averaged over the `top_k` most interesting concepts.
	#[must_use]
	pub fn decide_for_cycle(&self, graph: &ConceptGraph) -> Decisions {
		let focus = self.focus(graph);
		if focus.is_empty() {
			return Decisions::exploratory();
		}

		let decisions: Vec<Decisions> = focus
			.iter()
			.filter_map(|name| self.decide_for_concept(name, graph).ok())
			.map(|(d, _)| d)
			.collect();
		let mean = Decisions::mean(&decisions);
		debug!(
			focus = decisions.len(),
			explore = mean.explore,
			generate_idea = mean.generate_idea,
			"Cycle decisions"
		);
		mean
	}

	/// Names of the `top_k` concepts by interest, most interesting first.
	#[must_use]
	pub fn focus(&self, graph: &ConceptGraph) -> Vec<String> {
		let now = graph.now();
		let mut scored: Vec<(&str, f64)> = graph
			.names()
			.filter_map(|name| {
				let record = graph.record(graph.require(name).ok()?);
				let recency = 1.0 / (1.0 + hours_between(record.last_touched, now));
				Some((name, record.strength * record.curiosity * recency))
			})
			.collect();
		scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		scored
			.into_iter()
			.take(self.config.top_k)
			.map(|(name, _)| name.to_string())
			.collect()
	}
}
