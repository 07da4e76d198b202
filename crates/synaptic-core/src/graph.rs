//! Concept Graph
//!
//! Concepts are unit-norm vectors with scalar state, connected by directed
//! weighted edges in a dense adjacency matrix.
//!
//! ```text
//! Created → Active (touch / decay, any number of times) → Pruned
//! ```
//!
//! - **Touch** reinforces: `strength = min(1, strength + boost)`
//! - **Decay** weakens with disuse: `strength -= rate × ln(1 + hours_since_touch)`
//! - **Pruning** removes concepts whose strength falls to the oblivion threshold
//! - **Genesis** fuses two or more parents into a new `"emergent"` concept
//!
//! Concepts are addressed by name. Internally each live concept owns a dense
//! index into the vector store, the scalar records and the adjacency matrix;
//! removing a concept moves the last live concept into the freed index.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use ndarray::{s, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::clock::{hours_between, Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::propagation::ActivationSnapshot;
use crate::store::{cosine_similarity, Removed, VectorStore, NORM_EPSILON};

/// Category given to concepts created without one.
pub const DEFAULT_CATEGORY: &str = "default";

/// Category of every concept born from genesis.
pub const EMERGENT_CATEGORY: &str = "emergent";

/// Floor for parent weights during genesis fusion.
const MIN_PARENT_WEIGHT: f64 = 1e-3;

/// Restored vectors this close to unit norm are kept bit-for-bit.
const UNIT_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a [`ConceptGraph`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Vector dimension `D`
	pub dim: usize,
	/// Initial row capacity (doubles when full)
	pub initial_capacity: usize,
	/// Strength of a newly created concept
	pub initial_strength: f64,
	/// Curiosity of a newly created (non-emergent) concept
	pub initial_curiosity: f64,
	/// Curiosity multiplier applied on every touch
	pub curiosity_satiation: f64,
	/// Boost applied when `create` hits an existing name
	pub reinforce_boost: f64,
	/// Concepts at or below this strength are pruned
	pub oblivion_threshold: f64,
	/// Floor for similarity-derived edge weights
	pub min_relate_weight: f64,
	/// Joint activation `a_i × a_j` above which `auto_modify` acts on a pair
	pub coactivation_threshold: f64,
	/// Fraction of the gap to 1.0 closed when `auto_modify` strengthens an edge (at force 1)
	pub learning_rate: f64,
	/// Probability of a new edge per eligible unconnected pair (at force 1)
	pub creation_rate: f64,
	/// Standard deviation of the Gaussian noise added to genesis vectors
	pub genesis_uncertainty: f64,
	/// Weight of the parent ↔ child edges created by genesis
	pub genesis_edge_weight: f64,
	/// Number of recent propagation runs scanned for genesis candidates
	pub genesis_window: usize,
	/// Candidates must co-activate in more than this many runs
	pub genesis_min_frequency: usize,
	/// Maximum number of propagation runs kept in history
	pub history_capacity: usize,
	/// Evict the weakest concepts once this count is exceeded
	pub max_concepts: Option<usize>,
	/// Minimum fraction of concepts evicted per eviction pass
	pub eviction_fraction: f64,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			dim: 64,
			initial_capacity: 64,
			initial_strength: 0.5,
			initial_curiosity: 0.5,
			curiosity_satiation: 0.95,
			reinforce_boost: 0.1,
			oblivion_threshold: 0.03,
			min_relate_weight: 0.1,
			coactivation_threshold: 0.25,
			learning_rate: 0.1,
			creation_rate: 0.5,
			genesis_uncertainty: 0.05,
			genesis_edge_weight: 0.7,
			genesis_window: 5,
			genesis_min_frequency: 1,
			history_capacity: 50,
			max_concepts: None,
			eviction_fraction: 0.1,
		}
	}
}

impl GraphConfig {
	/// Check that every parameter is in range.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] naming the first bad parameter.
	pub fn validate(&self) -> Result<()> {
		if self.dim == 0 {
			return Err(CoreError::invalid("dim must be positive"));
		}
		let unit = [
			("initial_strength", self.initial_strength),
			("initial_curiosity", self.initial_curiosity),
			("curiosity_satiation", self.curiosity_satiation),
			("oblivion_threshold", self.oblivion_threshold),
			("min_relate_weight", self.min_relate_weight),
			("coactivation_threshold", self.coactivation_threshold),
			("learning_rate", self.learning_rate),
			("creation_rate", self.creation_rate),
			("genesis_edge_weight", self.genesis_edge_weight),
			("eviction_fraction", self.eviction_fraction),
		];
		for (name, value) in unit {
			if !(0.0..=1.0).contains(&value) {
				return Err(CoreError::invalid(format!("{name} must be in [0, 1], got {value}")));
			}
		}
		if !(self.reinforce_boost.is_finite() && self.reinforce_boost >= 0.0) {
			return Err(CoreError::invalid("reinforce_boost must be finite and non-negative"));
		}
		if !(self.genesis_uncertainty.is_finite() && self.genesis_uncertainty >= 0.0) {
			return Err(CoreError::invalid("genesis_uncertainty must be finite and non-negative"));
		}
		if self.max_concepts == Some(0) {
			return Err(CoreError::invalid("max_concepts must be positive"));
		}
		Ok(())
	}
}

// ============================================================================
// Types
// ============================================================================

/// Ancestry of a concept created by genesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
	/// Parent names in the order they were fused
	pub parents: Vec<String>,
	/// Creation time (seconds)
	pub ts: f64,
}

/// Owned view of one concept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Concept {
	/// Unique name
	pub name: String,
	/// Current dense index (changes when another concept is removed)
	pub index: usize,
	/// Unit-norm semantic vector
	pub vector: Vec<f64>,
	/// Robustness against forgetting, in [0, 1]
	pub strength: f64,
	/// Number of touches
	pub activation_count: u64,
	/// Last touch (seconds)
	pub last_touched: f64,
	/// Creation time (seconds)
	pub created_at: f64,
	/// Concept-local curiosity, in [0, 1]
	pub curiosity: f64,
	/// Free-form category tag
	pub category: String,
	/// Present only for genesis-created concepts
	pub lineage: Option<Lineage>,
}

/// Counters carried across save/load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetrics {
	/// Concepts ever created (explicitly or by genesis)
	pub concepts_created: u64,
	/// Directed edges ever formed
	pub edges_formed: u64,
	/// Successful genesis operations
	pub genesis_count: u64,
}

/// Point-in-time summary of the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
	/// Live concepts
	pub concepts: usize,
	/// Non-zero directed edges
	pub edges: usize,
	/// Concepts in the emergent category
	pub emergent: usize,
	/// Mean strength (0 when empty)
	pub mean_strength: f64,
	/// Mean curiosity (0 when empty)
	pub mean_curiosity: f64,
	/// `edges / (n × (n - 1))`
	pub density: f64,
}

/// A pair of differently-categorized concepts that keep firing together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisCandidate {
	/// First concept (lexicographically smaller name)
	pub a: String,
	/// Second concept
	pub b: String,
	/// Number of recent runs in which the pair co-activated
	pub frequency: usize,
}

/// Scalar state of one concept, indexed like the vector store.
#[derive(Clone, Debug)]
pub(crate) struct ConceptRecord {
	pub(crate) strength: f64,
	pub(crate) activation_count: u64,
	pub(crate) last_touched: f64,
	pub(crate) created_at: f64,
	pub(crate) curiosity: f64,
	pub(crate) category: String,
	pub(crate) lineage: Option<Lineage>,
}

// ============================================================================
// Graph
// ============================================================================

/// Weighted, vectorized concept graph.
#[derive(Debug)]
pub struct ConceptGraph {
	config: GraphConfig,
	store: VectorStore,
	records: Vec<ConceptRecord>,
	/// `capacity × capacity`, `adjacency[(from, to)]`
	adjacency: Array2<f64>,
	metrics: GraphMetrics,
	history: VecDeque<Vec<ActivationSnapshot>>,
	rng: StdRng,
	clock: Arc<dyn Clock>,
}

impl ConceptGraph {
	/// Create an empty graph with an entropy-seeded RNG and the system clock.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] if the configuration is invalid.
	pub fn new(config: GraphConfig) -> Result<Self> {
		Self::with_parts(config, StdRng::from_entropy(), Arc::new(SystemClock))
	}

	/// Create an empty graph with a deterministic RNG and the system clock.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] if the configuration is invalid.
	pub fn seeded(config: GraphConfig, seed: u64) -> Result<Self> {
		Self::with_parts(config, StdRng::seed_from_u64(seed), Arc::new(SystemClock))
	}

	/// Create an empty graph from explicit collaborators.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] if the configuration is invalid.
	pub fn with_parts(config: GraphConfig, rng: StdRng, clock: Arc<dyn Clock>) -> Result<Self> {
		config.validate()?;
		let store = VectorStore::new(config.dim, config.initial_capacity)?;
		let capacity = store.capacity();
		Ok(Self {
			config,
			store,
			records: Vec::with_capacity(capacity),
			adjacency: Array2::zeros((capacity, capacity)),
			metrics: GraphMetrics::default(),
			history: VecDeque::new(),
			rng,
			clock,
		})
	}

	// ------------------------------------------------------------------------
	// Accessors
	// ------------------------------------------------------------------------

	/// Active configuration.
	#[must_use]
	pub const fn config(&self) -> &GraphConfig {
		&self.config
	}

	/// Vector dimension.
	#[must_use]
	pub const fn dim(&self) -> usize {
		self.store.dim()
	}

	/// Number of live concepts.
	#[must_use]
	pub const fn len(&self) -> usize {
		self.store.len()
	}

	/// Whether the graph has no concepts.
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	/// Whether `name` is a live concept.
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.store.contains(name)
	}

	/// Current time from the graph's clock (seconds).
	#[must_use]
	pub fn now(&self) -> f64 {
		self.clock.now()
	}

	/// Lifetime counters.
	#[must_use]
	pub const fn metrics(&self) -> &GraphMetrics {
		&self.metrics
	}

	/// Names of live concepts in index order.
	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.store.names()
	}

	/// Owned view of one concept.
	#[must_use]
	pub fn concept(&self, name: &str) -> Option<Concept> {
		self.store.index_of(name).map(|index| self.snapshot(index))
	}

	/// Owned views of every concept in index order.
	#[must_use]
	pub fn concepts(&self) -> Vec<Concept> {
		(0..self.len()).map(|index| self.snapshot(index)).collect()
	}

	/// Vector of `name`.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn vector(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
		self.store.get(name)
	}

	/// Live `n × n` block of the adjacency matrix.
	#[must_use]
	pub fn adjacency(&self) -> ArrayView2<'_, f64> {
		let n = self.len();
		self.adjacency.slice(s![..n, ..n])
	}

	/// Weight of the directed edge `from → to`; `Some(0.0)` when unconnected,
	/// `None` when either concept is unknown.
	#[must_use]
	pub fn weight(&self, from: &str, to: &str) -> Option<f64> {
		let i = self.store.index_of(from)?;
		let j = self.store.index_of(to)?;
		Some(self.adjacency[(i, j)])
	}

	/// Outgoing edges of `name`, strongest first.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn neighbors(&self, name: &str) -> Result<Vec<(String, f64)>> {
		let i = self.require(name)?;
		let mut out: Vec<(String, f64)> = self
			.adjacency()
			.row(i)
			.iter()
			.enumerate()
			.filter(|(_, &w)| w > 0.0)
			.filter_map(|(j, &w)| self.store.name_of(j).map(|n| (n.to_string(), w)))
			.collect();
		out.sort_by(|a, b| b.1.total_cmp(&a.1));
		Ok(out)
	}

	/// Number of distinct concepts connected to `name` in either direction.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn local_degree(&self, name: &str) -> Result<usize> {
		let i = self.require(name)?;
		let live = self.adjacency();
		Ok((0..self.len())
			.filter(|&k| k != i && (live[(i, k)] > 0.0 || live[(k, i)] > 0.0))
			.count())
	}

	/// Number of non-zero directed edges.
	#[must_use]
	pub fn edge_count(&self) -> usize {
		self.adjacency().iter().filter(|&&w| w > 0.0).count()
	}

	/// Summary statistics.
	#[must_use]
	pub fn stats(&self) -> GraphStats {
		let n = self.len();
		let edges = self.edge_count();
		#[allow(clippy::cast_precision_loss)]
		let (mean_strength, mean_curiosity, density) = if n == 0 {
			(0.0, 0.0, 0.0)
		} else {
			let nf = n as f64;
			let pairs = nf * (nf - 1.0);
			(
				self.records.iter().map(|r| r.strength).sum::<f64>() / nf,
				self.records.iter().map(|r| r.curiosity).sum::<f64>() / nf,
				if pairs > 0.0 { edges as f64 / pairs } else { 0.0 },
			)
		};
		GraphStats {
			concepts: n,
			edges,
			emergent: self
				.records
				.iter()
				.filter(|r| r.category == EMERGENT_CATEGORY)
				.count(),
			mean_strength,
			mean_curiosity,
			density,
		}
	}

	/// Recorded propagation runs, oldest first.
	#[must_use]
	pub const fn history(&self) -> &VecDeque<Vec<ActivationSnapshot>> {
		&self.history
	}

	/// Final snapshot of the most recent propagation run.
	#[must_use]
	pub fn latest_snapshot(&self) -> Option<&ActivationSnapshot> {
		self.history.back().and_then(|run| run.last())
	}

	/// Drop all recorded propagation runs.
	pub fn clear_history(&mut self) {
		self.history.clear();
	}

	// ------------------------------------------------------------------------
	// Mutation
	// ------------------------------------------------------------------------

	/// Create a concept, or reinforce it if the name already exists.
	///
	/// Without a vector, one is drawn uniformly from `[-1, 1]^D` and normalized.
	/// Provided vectors are normalized too.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] for an empty name, a wrong
	/// dimension, or a non-finite or zero vector.
	pub fn create(
		&mut self,
		name: &str,
		vector: Option<&[f64]>,
		category: &str,
	) -> Result<Concept> {
		if name.is_empty() {
			return Err(CoreError::invalid("concept name must not be empty"));
		}
		if let Some(v) = vector {
			if v.len() != self.dim() {
				return Err(CoreError::invalid(format!(
					"expected vector of dimension {}, got {}",
					self.dim(),
					v.len()
				)));
			}
		}
		if let Some(index) = self.store.index_of(name) {
			self.touch(name, self.config.reinforce_boost)?;
			return Ok(self.snapshot(index));
		}

		let vector = match vector {
			Some(v) => normalized(v)?,
			None => self.random_unit_vector(),
		};

		let now = self.now();
		let record = ConceptRecord {
			strength: self.config.initial_strength,
			activation_count: 0,
			last_touched: now,
			created_at: now,
			curiosity: self.config.initial_curiosity,
			category: category.to_string(),
			lineage: None,
		};
		let _ = self.insert(name, &vector, record)?;
		self.metrics.concepts_created += 1;
		debug!(concept = name, category, "created concept");

		let _ = self.enforce_capacity(&[name]);
		self.concept(name)
			.ok_or_else(|| CoreError::NotFound(name.to_string()))
	}

	/// Connect `a → b` (and `b → a` when `bidirectional`).
	///
	/// Without an explicit weight the cosine similarity of the two vectors is
	/// used, floored at `min_relate_weight` so edges never vanish. Explicit
	/// weights are clamped to `[0, 1]`. Returns the weight written.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] for unknown endpoints and
	/// [`CoreError::InvalidArgument`] for self-edges or non-finite weights.
	pub fn relate(
		&mut self,
		a: &str,
		b: &str,
		weight: Option<f64>,
		bidirectional: bool,
	) -> Result<f64> {
		let i = self.require(a)?;
		let j = self.require(b)?;
		if i == j {
			return Err(CoreError::invalid(format!("cannot relate {a} to itself")));
		}

		let weight = match weight {
			Some(w) if w.is_finite() => w.clamp(0.0, 1.0),
			Some(w) => {
				return Err(CoreError::invalid(format!("edge weight must be finite, got {w}")));
			}
			None => {
				let similarity = cosine_similarity(self.store.get(a)?, self.store.get(b)?);
				similarity.clamp(self.config.min_relate_weight, 1.0)
			}
		};

		self.write_edge(i, j, weight);
		if bidirectional {
			self.write_edge(j, i, weight);
		}
		Ok(weight)
	}

	/// Reinforce a concept: count an activation, refresh its timestamp and add
	/// `boost` to its strength (capped at 1). Negative or non-finite boosts add nothing.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn touch(&mut self, name: &str, boost: f64) -> Result<()> {
		let index = self.require(name)?;
		let now = self.now();
		let boost = if boost.is_finite() { boost.max(0.0) } else { 0.0 };
		let satiation = self.config.curiosity_satiation;

		let record = &mut self.records[index];
		record.activation_count += 1;
		record.last_touched = now;
		record.strength = (record.strength + boost).min(1.0);
		record.curiosity = (record.curiosity * satiation).clamp(0.0, 1.0);
		Ok(())
	}

	/// Override the curiosity of one concept (clamped to `[0, 1]`).
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] for unknown names and
	/// [`CoreError::InvalidArgument`] for non-finite values.
	pub fn set_curiosity(&mut self, name: &str, curiosity: f64) -> Result<()> {
		let index = self.require(name)?;
		if !curiosity.is_finite() {
			return Err(CoreError::invalid("curiosity must be finite"));
		}
		self.records[index].curiosity = curiosity.clamp(0.0, 1.0);
		Ok(())
	}

	/// Weaken every concept by `rate × ln(1 + hours_since_touch)` and prune
	/// those left at or below the oblivion threshold. Returns the pruned names.
	#[instrument(skip(self), level = "debug")]
	pub fn decay_all(&mut self, rate: f64) -> Vec<String> {
		let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
		let now = self.now();
		let threshold = self.config.oblivion_threshold;

		let mut doomed = Vec::new();
		for (index, record) in self.records.iter_mut().enumerate() {
			let hours = hours_between(record.last_touched, now);
			record.strength = rate.mul_add(-hours.ln_1p(), record.strength).max(0.0);
			if record.strength <= threshold {
				if let Some(name) = self.store.name_of(index) {
					doomed.push(name.to_string());
				}
			}
		}

		doomed.retain(|name| self.remove(name).is_ok());
		if !doomed.is_empty() {
			debug!(pruned = doomed.len(), "decay pruned concepts");
		}
		doomed
	}

	/// Remove a concept and every edge touching it.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn forget(&mut self, name: &str) -> Result<()> {
		self.remove(name)?;
		debug!(concept = name, "forgot concept");
		Ok(())
	}

	/// Remove the weakest `fraction` of concepts (at least one when non-empty).
	/// Returns the evicted names.
	pub fn evict_weakest(&mut self, fraction: f64) -> Vec<String> {
		let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
		#[allow(
			clippy::cast_possible_truncation,
			clippy::cast_sign_loss,
			clippy::cast_precision_loss
		)]
		let count = ((self.len() as f64) * fraction).ceil() as usize;
		self.evict(count.max(usize::from(!self.is_empty())), &[])
	}

	/// Rewire edges among the concepts co-activated by the latest propagation.
	///
	/// For every pair whose joint activation `a_i × a_j` exceeds
	/// `coactivation_threshold`, existing edges move toward 1.0 by
	/// `learning_rate × force` of the remaining gap; unconnected pairs gain a
	/// bidirectional edge with probability `creation_rate × force`. Returns the
	/// number of directed edge entries changed.
	///
	/// A non-positive `force` never touches the matrix.
	pub fn auto_modify(&mut self, force: f64) -> usize {
		if !(force.is_finite() && force > 0.0) {
			return 0;
		}
		let Some(snapshot) = self.latest_snapshot() else {
			return 0;
		};

		let active: Vec<(usize, f64)> = snapshot
			.iter()
			.filter(|&(_, level)| level > 0.0)
			.filter_map(|(name, level)| self.store.index_of(name).map(|i| (i, level)))
			.collect();

		let threshold = self.config.coactivation_threshold;
		let step = (self.config.learning_rate * force).clamp(0.0, 1.0);
		let creation = (self.config.creation_rate * force).clamp(0.0, 1.0);
		let floor = self.config.min_relate_weight;

		let mut changed = 0;
		for (x, &(i, ai)) in active.iter().enumerate() {
			for &(j, aj) in &active[x + 1..] {
				let joint = ai * aj;
				if joint <= threshold {
					continue;
				}

				let forward = self.adjacency[(i, j)];
				let backward = self.adjacency[(j, i)];
				if forward > 0.0 || backward > 0.0 {
					for (from, to, w) in [(i, j, forward), (j, i, backward)] {
						if w <= 0.0 {
							continue;
						}
						let next = (1.0 - w).mul_add(step, w).min(1.0);
						if (next - w).abs() > f64::EPSILON {
							self.adjacency[(from, to)] = next;
							changed += 1;
						}
					}
				} else if self.rng.gen::<f64>() < creation {
					let weight = joint.clamp(floor, 1.0);
					self.write_edge(i, j, weight);
					self.write_edge(j, i, weight);
					changed += 2;
				}
			}
		}

		debug!(changed, force, "auto-modified edges");
		changed
	}

	/// Fuse two or more parents into a new `"emergent"` concept.
	///
	/// The child vector is the activation-weighted mean of the parent vectors
	/// (parent strength stands in when the latest snapshot has no activation
	/// for it), perturbed by `N(0, genesis_uncertainty)` noise and normalized.
	/// The child is linked to each parent in both directions at
	/// `genesis_edge_weight`. Returns the child's name, which defaults to
	/// `EMG_<parent1>_<parent2>_<unix millis>`. Capacity eviction afterwards
	/// spares the child and its parents.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] for fewer than two or repeated
	/// parents, [`CoreError::NotFound`] for unknown parents and
	/// [`CoreError::DuplicateName`] if `explicit_name` is taken. The graph is
	/// unchanged on error.
	#[instrument(skip(self), level = "debug")]
	pub fn genesis(&mut self, parents: &[&str], explicit_name: Option<&str>) -> Result<String> {
		if parents.len() < 2 {
			return Err(CoreError::invalid(format!(
				"genesis needs at least two parents, got {}",
				parents.len()
			)));
		}
		for (x, parent) in parents.iter().enumerate() {
			if parents[..x].contains(parent) {
				return Err(CoreError::invalid(format!("parent {parent} listed twice")));
			}
		}
		let indices = parents
			.iter()
			.map(|p| self.require(p))
			.collect::<Result<Vec<usize>>>()?;
		if let Some(name) = explicit_name {
			if name.is_empty() {
				return Err(CoreError::invalid("concept name must not be empty"));
			}
			if self.contains(name) {
				return Err(CoreError::DuplicateName(name.to_string()));
			}
		}

		let latest = self.latest_snapshot();
		let weights: Vec<f64> = parents
			.iter()
			.zip(&indices)
			.map(|(name, &i)| {
				let level = latest.map_or(0.0, |snapshot| snapshot.get(name));
				let w = if level > 0.0 { level } else { self.records[i].strength };
				w.max(MIN_PARENT_WEIGHT)
			})
			.collect();
		let total: f64 = weights.iter().sum();

		let mut fused = vec![0.0; self.dim()];
		for (&i, &w) in indices.iter().zip(&weights) {
			if let Some(row) = self.store.row(i) {
				for (f, &x) in fused.iter_mut().zip(row.iter()) {
					*f = (w / total).mul_add(x, *f);
				}
			}
		}
		let sigma = self.config.genesis_uncertainty;
		for f in &mut fused {
			let z: f64 = StandardNormal.sample(&mut self.rng);
			*f = sigma.mul_add(z, *f);
		}
		let vector = match normalized(&fused) {
			Ok(v) => v,
			// Antipodal parents can cancel out entirely
			Err(_) => self.store.row(indices[0]).map(|r| r.to_vec()).unwrap_or(fused),
		};

		let now = self.now();
		let name = match explicit_name {
			Some(name) => name.to_string(),
			None => self.emergent_name(parents[0], parents[1], now),
		};
		let record = ConceptRecord {
			strength: self.config.initial_strength,
			activation_count: 0,
			last_touched: now,
			created_at: now,
			curiosity: 1.0,
			category: EMERGENT_CATEGORY.to_string(),
			lineage: Some(Lineage {
				parents: parents.iter().map(ToString::to_string).collect(),
				ts: now,
			}),
		};
		let child = self.insert(&name, &vector, record)?;

		let edge = self.config.genesis_edge_weight;
		for &parent in &indices {
			self.write_edge(parent, child, edge);
			self.write_edge(child, parent, edge);
		}
		self.metrics.concepts_created += 1;
		self.metrics.genesis_count += 1;
		info!(concept = %name, parents = parents.len(), "genesis created emergent concept");

		let mut keep = parents.to_vec();
		keep.push(name.as_str());
		let _ = self.enforce_capacity(&keep);
		Ok(name)
	}

	/// Pairs of concepts from different categories that co-activated above
	/// `coactivation_threshold` in more than `genesis_min_frequency` of the
	/// last `genesis_window` runs, most frequent first.
	#[must_use]
	pub fn detect_genesis_candidates(&self, coactivation_threshold: f64) -> Vec<GenesisCandidate> {
		let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();

		let recent = self
			.history
			.iter()
			.rev()
			.take(self.config.genesis_window)
			.filter_map(|run| run.last());
		for snapshot in recent {
			let active: Vec<(&str, f64, &str)> = snapshot
				.iter()
				.filter(|&(_, level)| level > 0.0)
				.filter_map(|(name, level)| {
					let i = self.store.index_of(name)?;
					Some((name, level, self.records[i].category.as_str()))
				})
				.collect();

			for (x, &(a, la, ca)) in active.iter().enumerate() {
				for &(b, lb, cb) in &active[x + 1..] {
					if ca != cb && la * lb > coactivation_threshold {
						*counts.entry((a, b)).or_insert(0) += 1;
					}
				}
			}
		}

		let mut candidates: Vec<GenesisCandidate> = counts
			.into_iter()
			.filter(|&(_, frequency)| frequency > self.config.genesis_min_frequency)
			.map(|((a, b), frequency)| GenesisCandidate {
				a: a.to_string(),
				b: b.to_string(),
				frequency,
			})
			.collect();
		candidates.sort_by(|x, y| {
			y.frequency
				.cmp(&x.frequency)
				.then_with(|| x.a.cmp(&y.a))
				.then_with(|| x.b.cmp(&y.b))
		});
		candidates
	}

	/// The `top_k` concepts whose vectors are closest to `name`'s, excluding itself.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn similar(&self, name: &str, top_k: usize) -> Result<Vec<(String, f64)>> {
		let query = self.store.get(name)?.to_vec();
		Ok(self.store.nearest(&query, top_k, Some(name)))
	}

	// ------------------------------------------------------------------------
	// Crate internals
	// ------------------------------------------------------------------------

	pub(crate) fn require(&self, name: &str) -> Result<usize> {
		self.store
			.index_of(name)
			.ok_or_else(|| CoreError::NotFound(name.to_string()))
	}

	pub(crate) fn record(&self, index: usize) -> &ConceptRecord {
		&self.records[index]
	}

	/// Adjacency and RNG borrowed together for diffusion.
	pub(crate) fn diffusion_parts(&mut self) -> (ArrayView2<'_, f64>, &mut StdRng) {
		let n = self.store.len();
		(self.adjacency.slice(s![..n, ..n]), &mut self.rng)
	}

	/// Append a propagation run to the bounded history.
	pub(crate) fn record_run(&mut self, run: Vec<ActivationSnapshot>) {
		if run.is_empty() {
			return;
		}
		self.history.push_back(run);
		while self.history.len() > self.config.history_capacity.max(1) {
			let _ = self.history.pop_front();
		}
	}

	pub(crate) fn metrics_mut(&mut self) -> &mut GraphMetrics {
		&mut self.metrics
	}

	/// Insert a concept with fully specified state, normalizing its vector.
	pub(crate) fn restore(
		&mut self,
		name: &str,
		vector: &[f64],
		record: ConceptRecord,
	) -> Result<usize> {
		if vector.len() != self.dim() {
			return Err(CoreError::MalformedState(format!(
				"concept {name} has dimension {}, expected {}",
				vector.len(),
				self.dim()
			)));
		}
		let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
		if (norm - 1.0).abs() < UNIT_TOLERANCE {
			return self.insert(name, vector, record);
		}
		let vector = normalized(vector)
			.map_err(|e| CoreError::MalformedState(format!("concept {name}: {e}")))?;
		self.insert(name, &vector, record)
	}

	/// Write an edge without touching lifetime metrics.
	pub(crate) fn restore_edge(&mut self, from: usize, to: usize, weight: f64) {
		self.adjacency[(from, to)] = weight;
	}

	// ------------------------------------------------------------------------
	// Private helpers
	// ------------------------------------------------------------------------

	fn snapshot(&self, index: usize) -> Concept {
		let record = &self.records[index];
		Concept {
			name: self.store.name_of(index).unwrap_or_default().to_string(),
			index,
			vector: self.store.row(index).map(|r| r.to_vec()).unwrap_or_default(),
			strength: record.strength,
			activation_count: record.activation_count,
			last_touched: record.last_touched,
			created_at: record.created_at,
			curiosity: record.curiosity,
			category: record.category.clone(),
			lineage: record.lineage.clone(),
		}
	}

	fn insert(&mut self, name: &str, vector: &[f64], record: ConceptRecord) -> Result<usize> {
		let index = self.store.add(name, vector)?;
		self.records.push(record);
		self.sync_capacity();
		Ok(index)
	}

	/// Grow the adjacency matrix to the store's capacity, keeping every weight.
	fn sync_capacity(&mut self) {
		let capacity = self.store.capacity();
		let old = self.adjacency.nrows();
		if capacity <= old {
			return;
		}
		let mut grown = Array2::zeros((capacity, capacity));
		grown.slice_mut(s![..old, ..old]).assign(&self.adjacency);
		self.adjacency = grown;
	}

	fn write_edge(&mut self, from: usize, to: usize, weight: f64) {
		if self.adjacency[(from, to)] <= 0.0 && weight > 0.0 {
			self.metrics.edges_formed += 1;
		}
		self.adjacency[(from, to)] = weight;
	}

	fn remove(&mut self, name: &str) -> Result<()> {
		let Removed { index, moved } = self.store.remove(name)?;
		let _ = self.records.swap_remove(index);

		if let Some(last) = moved {
			let row = self.adjacency.row(last).to_owned();
			self.adjacency.row_mut(index).assign(&row);
			let column = self.adjacency.column(last).to_owned();
			self.adjacency.column_mut(index).assign(&column);
		}
		let vacated = self.store.len();
		self.adjacency.row_mut(vacated).fill(0.0);
		self.adjacency.column_mut(vacated).fill(0.0);
		Ok(())
	}

	/// Evict when `max_concepts` is exceeded. Names in `exempt` are never
	/// evicted, so the graph may stay over capacity when too few others remain.
	fn enforce_capacity(&mut self, exempt: &[&str]) -> Vec<String> {
		let Some(max) = self.config.max_concepts else {
			return Vec::new();
		};
		let n = self.len();
		if n <= max {
			return Vec::new();
		}
		#[allow(
			clippy::cast_possible_truncation,
			clippy::cast_sign_loss,
			clippy::cast_precision_loss
		)]
		let fraction = ((n as f64) * self.config.eviction_fraction).ceil() as usize;
		let evicted = self.evict((n - max).max(fraction), exempt);
		info!(evicted = evicted.len(), max, "capacity eviction");
		evicted
	}

	/// Remove the `count` weakest concepts (oldest touch first among equals).
	fn evict(&mut self, count: usize, exempt: &[&str]) -> Vec<String> {
		let mut order: Vec<usize> = (0..self.len())
			.filter(|&i| self.store.name_of(i).is_some_and(|name| !exempt.contains(&name)))
			.collect();
		order.sort_by(|&x, &y| {
			let (rx, ry) = (&self.records[x], &self.records[y]);
			rx.strength
				.total_cmp(&ry.strength)
				.then_with(|| rx.last_touched.total_cmp(&ry.last_touched))
		});

		let mut victims: Vec<String> = order
			.into_iter()
			.take(count)
			.filter_map(|i| self.store.name_of(i).map(ToString::to_string))
			.collect();
		victims.retain(|name| self.remove(name).is_ok());
		victims
	}

	fn random_unit_vector(&mut self) -> Vec<f64> {
		loop {
			let v: Vec<f64> = (0..self.dim())
				.map(|_| self.rng.gen_range(-1.0..1.0))
				.collect();
			if let Ok(unit) = normalized(&v) {
				return unit;
			}
		}
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn emergent_name(&self, first: &str, second: &str, now: f64) -> String {
		let mut stamp = (now * 1000.0).max(0.0) as u64;
		loop {
			let name = format!("EMG_{first}_{second}_{stamp}");
			if !self.contains(&name) {
				return name;
			}
			stamp += 1;
		}
	}
}

/// L2-normalize a vector.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] for non-finite values or a (near) zero norm.
pub fn normalized(vector: &[f64]) -> Result<Vec<f64>> {
	if vector.iter().any(|x| !x.is_finite()) {
		return Err(CoreError::invalid("vector contains non-finite values"));
	}
	let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
	if norm < NORM_EPSILON {
		return Err(CoreError::invalid("vector has zero length"));
	}
	Ok(vector.iter().map(|x| x / norm).collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;

	fn unit(dim: usize, axis: usize) -> Vec<f64> {
		let mut v = vec![0.0; dim];
		v[axis] = 1.0;
		v
	}

	fn graph_with_clock(config: GraphConfig) -> (ConceptGraph, ManualClock) {
		let clock = ManualClock::new(1_000_000.0);
		let graph = ConceptGraph::with_parts(
			config,
			StdRng::seed_from_u64(7),
			Arc::new(clock.clone()),
		)
		.unwrap();
		(graph, clock)
	}

	fn small_config() -> GraphConfig {
		GraphConfig {
			dim: 4,
			initial_capacity: 2,
			..Default::default()
		}
	}

	fn snapshot(levels: &[(&str, f64)]) -> ActivationSnapshot {
		ActivationSnapshot::from_levels(0, levels.iter().map(|&(n, l)| (n.to_string(), l)))
	}

	fn assert_unit(v: &[f64]) {
		let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
		assert!((norm - 1.0).abs() < 0.01, "norm was {norm}");
	}

	#[test]
	fn test_create_normalizes_vectors() {
		let (mut g, _) = graph_with_clock(small_config());
		let random = g.create("r", None, DEFAULT_CATEGORY).unwrap();
		let given = g.create("g", Some(&[3.0, 4.0, 0.0, 0.0]), "fact").unwrap();
		assert_unit(&random.vector);
		assert_unit(&given.vector);
		assert!((given.vector[0] - 0.6).abs() < 1e-12);
		assert_eq!(given.category, "fact");
		assert!(given.lineage.is_none());
		assert_eq!(g.metrics().concepts_created, 2);
	}

	#[test]
	fn test_create_existing_reinforces() {
		let (mut g, _) = graph_with_clock(small_config());
		let first = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		let again = g.create("a", None, "other").unwrap();
		assert_eq!(g.len(), 1);
		assert_eq!(again.vector, first.vector);
		assert_eq!(again.category, DEFAULT_CATEGORY);
		assert_eq!(again.activation_count, 1);
		assert!(again.strength > first.strength);
		assert_eq!(g.metrics().concepts_created, 1);
	}

	#[test]
	fn test_create_rejects_bad_vectors() {
		let (mut g, _) = graph_with_clock(small_config());
		assert!(g.create("a", Some(&[1.0, 0.0]), DEFAULT_CATEGORY).is_err());
		assert!(g.create("b", Some(&[0.0; 4]), DEFAULT_CATEGORY).is_err());
		assert!(g.create("c", Some(&[f64::INFINITY, 0.0, 0.0, 0.0]), DEFAULT_CATEGORY).is_err());
		assert!(g.create("", None, DEFAULT_CATEGORY).is_err());
		assert!(g.is_empty());
	}

	#[test]
	fn test_create_existing_checks_dimension() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		assert!(g.create("a", Some(&[1.0, 0.0]), DEFAULT_CATEGORY).is_err());
		assert_eq!(g.concept("a").unwrap().activation_count, 0);

		let again = g.create("a", Some(&[0.0, 0.0, 0.0, 1.0]), DEFAULT_CATEGORY).unwrap();
		assert_eq!(again.activation_count, 1);
	}

	#[test]
	fn test_relate_weights() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", Some(&unit(4, 0)), DEFAULT_CATEGORY).unwrap();
		let _ = g.create("b", Some(&unit(4, 1)), DEFAULT_CATEGORY).unwrap();
		let _ = g.create("c", Some(&[1.0, 1.0, 0.0, 0.0]), DEFAULT_CATEGORY).unwrap();

		// Orthogonal vectors still get the floor
		let w = g.relate("a", "b", None, true).unwrap();
		assert!((w - 0.1).abs() < 1e-12);
		assert_eq!(g.weight("b", "a"), Some(w));

		let w = g.relate("a", "c", None, false).unwrap();
		assert!((w - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
		assert_eq!(g.weight("c", "a"), Some(0.0));

		assert!((g.relate("b", "c", Some(1.7), true).unwrap() - 1.0).abs() < f64::EPSILON);
		assert_eq!(g.edge_count(), 5);
		assert_eq!(g.metrics().edges_formed, 5);
	}

	#[test]
	fn test_relate_failures_leave_graph_unchanged() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		assert!(g.relate("a", "ghost", None, true).unwrap_err().is_not_found());
		assert!(g.relate("a", "a", Some(0.5), true).is_err());
		let _ = g.create("b", None, DEFAULT_CATEGORY).unwrap();
		assert!(g.relate("a", "b", Some(f64::NAN), true).is_err());
		assert_eq!(g.edge_count(), 0);
	}

	#[test]
	fn test_touch_clamps_strength() {
		let (mut g, clock) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		clock.advance(60.0);
		g.touch("a", 0.3).unwrap();
		g.touch("a", 0.9).unwrap();
		g.touch("a", -5.0).unwrap();
		let a = g.concept("a").unwrap();
		assert!((a.strength - 1.0).abs() < f64::EPSILON);
		assert_eq!(a.activation_count, 3);
		assert!((a.last_touched - 1_000_060.0).abs() < f64::EPSILON);
		assert!(a.curiosity < 0.5);
		assert!(g.touch("ghost", 0.1).is_err());
	}

	#[test]
	fn test_decay_monotonic_until_pruned() {
		let (mut g, clock) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();

		let mut previous = g.concept("a").unwrap().strength;
		let mut pruned = false;
		for _ in 0..100 {
			clock.advance_hours(1.0);
			let removed = g.decay_all(0.02);
			match g.concept("a") {
				Some(a) => {
					assert!(a.strength < previous);
					previous = a.strength;
				}
				None => {
					assert_eq!(removed, vec!["a".to_string()]);
					pruned = true;
					break;
				}
			}
		}
		assert!(pruned);
		assert!(g.is_empty());
	}

	#[test]
	fn test_decay_without_elapsed_time_is_noop() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		assert!(g.decay_all(1.0).is_empty());
		assert!((g.concept("a").unwrap().strength - 0.5).abs() < f64::EPSILON);
	}

	#[test]
	fn test_removal_rewires_edges() {
		let (mut g, _) = graph_with_clock(small_config());
		for name in ["a", "b", "c", "d"] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
		}
		let _ = g.relate("d", "b", Some(0.4), false).unwrap();
		let _ = g.relate("c", "d", Some(0.6), false).unwrap();
		let _ = g.relate("a", "d", Some(0.9), true).unwrap();

		g.forget("a").unwrap();
		assert_eq!(g.concept("d").unwrap().index, 0);
		assert_eq!(g.weight("d", "b"), Some(0.4));
		assert_eq!(g.weight("c", "d"), Some(0.6));
		assert_eq!(g.weight("d", "d"), Some(0.0));
		assert_eq!(g.edge_count(), 2);
		assert!(g.forget("a").is_err());
	}

	#[test]
	fn test_auto_modify_zero_force_is_identity() {
		let (mut g, _) = graph_with_clock(small_config());
		for name in ["a", "b", "c"] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
		}
		let _ = g.relate("a", "b", Some(0.5), true).unwrap();
		g.record_run(vec![snapshot(&[("a", 1.0), ("b", 0.9), ("c", 0.9)])]);

		let before = g.adjacency.clone();
		assert_eq!(g.auto_modify(0.0), 0);
		assert_eq!(g.auto_modify(-1.0), 0);
		assert_eq!(g.auto_modify(f64::NAN), 0);
		assert_eq!(g.adjacency, before);
	}

	#[test]
	fn test_auto_modify_strengthens_and_creates() {
		let (mut g, _) = graph_with_clock(small_config());
		for name in ["a", "b", "c"] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
		}
		let _ = g.relate("a", "b", Some(0.5), true).unwrap();
		g.record_run(vec![snapshot(&[("a", 1.0), ("b", 0.9), ("c", 0.9)])]);

		// creation_rate × force = 1 makes creation certain
		g.config.creation_rate = 1.0;
		let changed = g.auto_modify(1.0);
		assert_eq!(changed, 6);
		assert!((g.weight("a", "b").unwrap() - 0.55).abs() < 1e-12);
		assert!((g.weight("b", "c").unwrap() - 0.81).abs() < 1e-12);
		assert!((g.weight("c", "a").unwrap() - 0.9).abs() < 1e-12);
	}

	#[test]
	fn test_auto_modify_creation_tracks_force() {
		let names: Vec<String> = (0..40).map(|i| format!("n{i}")).collect();
		let pairs = names.len() * (names.len() - 1) / 2;

		for (force, expected) in [(0.5, 0.25), (1.0, 0.5), (2.0, 1.0)] {
			let (mut g, _) = graph_with_clock(small_config());
			for name in &names {
				let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
			}
			let levels: Vec<(&str, f64)> = names.iter().map(|n| (n.as_str(), 1.0)).collect();
			g.record_run(vec![snapshot(&levels)]);

			let created = g.auto_modify(force) / 2;
			assert_eq!(g.edge_count(), created * 2);
			#[allow(clippy::cast_precision_loss)]
			let rate = created as f64 / pairs as f64;
			assert!((rate - expected).abs() < 0.07, "force {force}: rate {rate}");
		}
	}

	#[test]
	fn test_auto_modify_needs_history() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		assert_eq!(g.auto_modify(1.0), 0);
	}

	#[test]
	fn test_genesis_scenario() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("A", Some(&unit(4, 0)), "animal").unwrap();
		let _ = g.create("B", Some(&unit(4, 1)), "machine").unwrap();

		let name = g.genesis(&["A", "B"], None).unwrap();
		let suffix = name.strip_prefix("EMG_A_B_").unwrap();
		assert!(!suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));

		let child = g.concept(&name).unwrap();
		assert_eq!(child.category, EMERGENT_CATEGORY);
		assert_unit(&child.vector);
		let lineage = child.lineage.unwrap();
		assert_eq!(lineage.parents, vec!["A", "B"]);
		for parent in ["A", "B"] {
			assert!((g.weight(parent, &name).unwrap() - 0.7).abs() < 1e-12);
			assert!((g.weight(&name, parent).unwrap() - 0.7).abs() < 1e-12);
		}
		assert_eq!(g.metrics().genesis_count, 1);
		assert_eq!(g.metrics().concepts_created, 3);

		// Same millisecond still yields a unique name
		let second = g.genesis(&["A", "B"], None).unwrap();
		assert_ne!(second, name);
	}

	#[test]
	fn test_genesis_vector_near_weighted_mean() {
		let (mut g, _) = graph_with_clock(GraphConfig {
			dim: 8,
			genesis_uncertainty: 0.01,
			..Default::default()
		});
		let _ = g.create("A", Some(&unit(8, 0)), "x").unwrap();
		let _ = g.create("B", Some(&unit(8, 1)), "y").unwrap();
		g.record_run(vec![snapshot(&[("A", 0.9), ("B", 0.3)])]);

		let name = g.genesis(&["A", "B"], Some("AB")).unwrap();
		assert_eq!(name, "AB");
		let mean = normalized(&[0.75, 0.25, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
		let child = g.concept("AB").unwrap().vector;
		let distance = child
			.iter()
			.zip(&mean)
			.map(|(a, b)| (a - b).powi(2))
			.sum::<f64>()
			.sqrt();
		assert!(distance < 0.1, "distance was {distance}");
	}

	#[test]
	fn test_genesis_errors_leave_graph_unchanged() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("A", None, DEFAULT_CATEGORY).unwrap();
		let _ = g.create("B", None, DEFAULT_CATEGORY).unwrap();

		assert!(matches!(g.genesis(&["A"], None), Err(CoreError::InvalidArgument(_))));
		assert!(matches!(g.genesis(&["A", "A"], None), Err(CoreError::InvalidArgument(_))));
		assert!(g.genesis(&["A", "ghost"], None).unwrap_err().is_not_found());
		assert!(matches!(
			g.genesis(&["A", "B"], Some("A")),
			Err(CoreError::DuplicateName(_))
		));
		assert_eq!(g.len(), 2);
		assert_eq!(g.edge_count(), 0);
		assert_eq!(g.metrics().genesis_count, 0);
	}

	#[test]
	fn test_detect_genesis_candidates() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("cat", None, "animal").unwrap();
		let _ = g.create("dog", None, "animal").unwrap();
		let _ = g.create("gear", None, "machine").unwrap();

		for _ in 0..3 {
			g.record_run(vec![snapshot(&[("cat", 0.9), ("dog", 0.9), ("gear", 0.8)])]);
		}
		g.record_run(vec![snapshot(&[("cat", 0.9), ("dog", 0.9)])]);

		let candidates = g.detect_genesis_candidates(0.5);
		assert_eq!(
			candidates,
			vec![
				GenesisCandidate { a: "cat".into(), b: "gear".into(), frequency: 3 },
				GenesisCandidate { a: "dog".into(), b: "gear".into(), frequency: 3 },
			]
		);
		// Same-category pairs never qualify
		assert!(candidates.iter().all(|c| !(c.a == "cat" && c.b == "dog")));
		assert!(g.detect_genesis_candidates(0.95).is_empty());
	}

	#[test]
	fn test_genesis_window_is_bounded() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, "x").unwrap();
		let _ = g.create("b", None, "y").unwrap();
		for _ in 0..3 {
			g.record_run(vec![snapshot(&[("a", 1.0), ("b", 1.0)])]);
		}
		for _ in 0..5 {
			g.record_run(vec![snapshot(&[("a", 1.0)])]);
		}
		assert!(g.detect_genesis_candidates(0.1).is_empty());
	}

	#[test]
	fn test_similar_excludes_self() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", Some(&[1.0, 0.0, 0.0, 0.0]), DEFAULT_CATEGORY).unwrap();
		let _ = g.create("b", Some(&[1.0, 0.2, 0.0, 0.0]), DEFAULT_CATEGORY).unwrap();
		let _ = g.create("c", Some(&[0.0, 0.0, 1.0, 0.0]), DEFAULT_CATEGORY).unwrap();
		let hits = g.similar("a", 5).unwrap();
		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].0, "b");
		assert!(g.similar("ghost", 3).is_err());
	}

	#[test]
	fn test_capacity_eviction_spares_newcomer() {
		let (mut g, _) = graph_with_clock(GraphConfig {
			max_concepts: Some(3),
			eviction_fraction: 0.0,
			..small_config()
		});
		for name in ["a", "b", "c"] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
		}
		g.touch("a", 0.3).unwrap();
		g.touch("c", 0.3).unwrap();
		let _ = g.create("d", None, DEFAULT_CATEGORY).unwrap();
		assert_eq!(g.len(), 3);
		assert!(!g.contains("b"));
		assert!(g.contains("d"));
	}

	#[test]
	fn test_capacity_eviction_spares_genesis_parents() {
		let (mut g, _) = graph_with_clock(GraphConfig {
			max_concepts: Some(3),
			eviction_fraction: 0.0,
			..small_config()
		});
		for name in ["a", "b", "c"] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
		}
		g.touch("c", 0.4).unwrap();

		let child = g.genesis(&["a", "b"], Some("ab")).unwrap();
		assert_eq!(g.len(), 3);
		assert!(!g.contains("c"));
		for parent in ["a", "b"] {
			assert!(g.contains(parent));
			assert!((g.weight(parent, &child).unwrap() - 0.7).abs() < 1e-9);
		}
		assert_eq!(g.concept(&child).unwrap().lineage.unwrap().parents, vec!["a", "b"]);
	}

	#[test]
	fn test_evict_weakest_fraction() {
		let (mut g, _) = graph_with_clock(small_config());
		for (name, boost) in [("a", 0.4), ("b", 0.0), ("c", 0.2), ("d", 0.1)] {
			let _ = g.create(name, None, DEFAULT_CATEGORY).unwrap();
			g.touch(name, boost).unwrap();
		}
		let evicted = g.evict_weakest(0.5);
		assert_eq!(evicted, vec!["b".to_string(), "d".to_string()]);
		assert_eq!(g.len(), 2);
	}

	#[test]
	fn test_growth_keeps_edges() {
		let (mut g, _) = graph_with_clock(small_config());
		let _ = g.create("a", None, DEFAULT_CATEGORY).unwrap();
		let _ = g.create("b", None, DEFAULT_CATEGORY).unwrap();
		let _ = g.relate("a", "b", Some(0.8), false).unwrap();
		for i in 0..10 {
			let _ = g.create(&format!("n{i}"), None, DEFAULT_CATEGORY).unwrap();
		}
		assert_eq!(g.weight("a", "b"), Some(0.8));
		assert_eq!(g.adjacency().dim(), (12, 12));
		for concept in g.concepts() {
			assert_unit(&concept.vector);
		}
	}

	#[test]
	fn test_stats() {
		let (mut g, _) = graph_with_clock(small_config());
		assert_eq!(g.stats().concepts, 0);
		let _ = g.create("a", None, "x").unwrap();
		let _ = g.create("b", None, "y").unwrap();
		let _ = g.relate("a", "b", Some(0.5), true).unwrap();
		let _ = g.genesis(&["a", "b"], Some("ab")).unwrap();
		let stats = g.stats();
		assert_eq!(stats.concepts, 3);
		assert_eq!(stats.edges, 6);
		assert_eq!(stats.emergent, 1);
		assert!((stats.density - 1.0).abs() < 1e-12);
		assert_eq!(g.local_degree("ab").unwrap(), 2);
		assert_eq!(g.neighbors("ab").unwrap().len(), 2);
	}

	#[test]
	fn test_config_validation() {
		assert!(GraphConfig::default().validate().is_ok());
		assert!(GraphConfig { dim: 0, ..Default::default() }.validate().is_err());
		assert!(GraphConfig { oblivion_threshold: 1.5, ..Default::default() }.validate().is_err());
		assert!(GraphConfig { max_concepts: Some(0), ..Default::default() }.validate().is_err());
	}
}
