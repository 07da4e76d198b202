//! Activation Propagation
//!
//! Thinking about one concept activates its neighbours, then theirs.
//! Each step every concept receives the strongest incoming signal:
//!
//! `new_j = max_i a_i × w_ij × (1 + ε)`, with `ε ~ N(0, temperature × noise_scale)`
//!
//! and keeps a fading echo of its previous level:
//!
//! `a_j = max(a_j × persistence, new_j)`
//!
//! Before blending, a step with any positive signal is rescaled so its peak
//! is exactly 1, and every level is clamped to `[0, 1]`, so runs stay
//! bounded on cyclic and fully connected graphs at any temperature.

use std::collections::BTreeMap;

use ndarray::ArrayView2;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::graph::ConceptGraph;

const MAX_PREALLOCATED_STEPS: usize = 1024;

/// Configuration for activation propagation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
	/// Noise standard deviation per unit of temperature
	pub noise_scale: f64,
	/// Fraction of the previous level kept each step (0-1)
	pub persistence: f64,
	/// Number of most activated non-seed concepts touched after a run
	pub top_n: usize,
	/// Touch boost per unit of final activation
	pub touch_scale: f64,
	/// Boost given to the seed after a run
	pub seed_boost: f64,
}

impl Default for PropagationConfig {
	fn default() -> Self {
		Self {
			noise_scale: 0.1,
			persistence: 0.5,
			top_n: 5,
			touch_scale: 0.1,
			seed_boost: 0.05,
		}
	}
}

/// Activation level of every concept at one propagation step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationSnapshot {
	/// Step number; step 0 is the seed alone
	pub step: usize,
	levels: BTreeMap<String, f64>,
}

impl ActivationSnapshot {
	/// Build a snapshot from `(name, level)` pairs.
	pub fn from_levels(step: usize, levels: impl IntoIterator<Item = (String, f64)>) -> Self {
		Self {
			step,
			levels: levels.into_iter().collect(),
		}
	}

	fn from_dense(step: usize, names: &[String], levels: &[f64]) -> Self {
		Self::from_levels(step, names.iter().cloned().zip(levels.iter().copied()))
	}

	/// Activation of `name`; 0 for concepts absent from the snapshot.
	#[must_use]
	pub fn get(&self, name: &str) -> f64 {
		self.levels.get(name).copied().unwrap_or(0.0)
	}

	/// `(name, level)` pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
		self.levels.iter().map(|(name, &level)| (name.as_str(), level))
	}

	/// Number of concepts recorded.
	#[must_use]
	pub fn len(&self) -> usize {
		self.levels.len()
	}

	/// Whether no concept is recorded.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// Highest level in the snapshot (0 when empty).
	#[must_use]
	pub fn peak(&self) -> f64 {
		self.levels.values().copied().fold(0.0, f64::max)
	}

	/// Up to `top_k` activated concepts, strongest first.
	#[must_use]
	pub fn top(&self, top_k: usize) -> Vec<(String, f64)> {
		let mut active: Vec<(String, f64)> = self
			.iter()
			.filter(|&(_, level)| level > 0.0)
			.map(|(name, level)| (name.to_string(), level))
			.collect();
		active.sort_by(|a, b| b.1.total_cmp(&a.1));
		active.truncate(top_k);
		active
	}
}

/// Multi-step activation diffusion over a [`ConceptGraph`].
#[derive(Clone, Debug, Default)]
pub struct PropagationEngine {
	config: PropagationConfig,
}

impl PropagationEngine {
	/// Create an engine with the given configuration.
	#[must_use]
	pub const fn new(config: PropagationConfig) -> Self {
		Self { config }
	}

	/// Active configuration.
	#[must_use]
	pub const fn config(&self) -> &PropagationConfig {
		&self.config
	}

	/// Spread activation from `seed` for `steps` steps.
	///
	/// Returns `steps + 1` snapshots (step 0 is the seed alone at 1.0), or an
	/// empty list if `seed` is unknown. Afterwards the `top_n` most activated
	/// concepts other than the seed are touched in proportion to their final
	/// level, the seed is touched, and the run is appended to the graph's
	/// history.
	#[instrument(skip(self, graph), fields(concepts = graph.len()))]
	pub fn activate(
		&self,
		graph: &mut ConceptGraph,
		seed: &str,
		steps: usize,
		temperature: f64,
	) -> Vec<ActivationSnapshot> {
		let Ok(seed_index) = graph.require(seed) else {
			debug!("unknown seed, nothing to propagate");
			return Vec::new();
		};

		let names: Vec<String> = graph.names().map(ToString::to_string).collect();
		let mut levels = vec![0.0; names.len()];
		levels[seed_index] = 1.0;

		let mut run = Vec::with_capacity(run_capacity(steps));
		run.push(ActivationSnapshot::from_dense(0, &names, &levels));

		let sigma = if temperature.is_finite() && temperature > 0.0 {
			temperature * self.config.noise_scale
		} else {
			0.0
		};
		let persistence = self.config.persistence;

		{
			let (adjacency, rng) = graph.diffusion_parts();
			for step in 1..=steps {
				let incoming = diffuse(adjacency, &levels, sigma, rng);
				for (level, new) in levels.iter_mut().zip(incoming) {
					*level = (*level * persistence).max(new).clamp(0.0, 1.0);
				}
				run.push(ActivationSnapshot::from_dense(step, &names, &levels));
			}
		}

		let reached = top_activated(&levels, self.config.top_n, Some(seed_index));
		for &index in &reached {
			let _ = graph.touch(&names[index], levels[index] * self.config.touch_scale);
		}
		let _ = graph.touch(seed, self.config.seed_boost);
		debug!(steps, reached = reached.len(), "propagation finished");

		graph.record_run(run.clone());
		run
	}
}

/// Snapshots preallocated for a run of `steps` steps.
const fn run_capacity(steps: usize) -> usize {
	let wanted = steps.saturating_add(1);
	if wanted < MAX_PREALLOCATED_STEPS {
		wanted
	} else {
		MAX_PREALLOCATED_STEPS
	}
}

/// One diffusion step: strongest incoming signal per concept, rescaled to a
/// peak of 1 and bounded to `[0, 1]`.
fn diffuse<R: Rng + ?Sized>(
	adjacency: ArrayView2<'_, f64>,
	previous: &[f64],
	sigma: f64,
	rng: &mut R,
) -> Vec<f64> {
	let mut next = vec![0.0; previous.len()];

	for (i, &source) in previous.iter().enumerate() {
		if source <= 0.0 {
			continue;
		}
		for (j, &weight) in adjacency.row(i).iter().enumerate() {
			if weight <= 0.0 || i == j {
				continue;
			}
			let jitter = if sigma > 0.0 {
				let z: f64 = StandardNormal.sample(rng);
				sigma * z
			} else {
				0.0
			};
			let signal = source * weight * (1.0 + jitter);
			if signal > next[j] {
				next[j] = signal;
			}
		}
	}

	for level in &mut next {
		if !level.is_finite() {
			*level = 0.0;
		}
	}
	let peak = next.iter().copied().fold(0.0, f64::max);
	if peak > 0.0 {
		for level in &mut next {
			*level = (*level / peak).clamp(0.0, 1.0);
		}
	}
	next
}

/// Indices of the `top_k` positive levels, strongest first. Ties keep index
/// order; `exclude` is never returned.
#[must_use]
pub fn top_activated(levels: &[f64], top_k: usize, exclude: Option<usize>) -> Vec<usize> {
	let mut ranked: Vec<usize> = (0..levels.len())
		.filter(|&i| levels[i] > 0.0 && Some(i) != exclude)
		.collect();
	ranked.sort_by(|&a, &b| levels[b].total_cmp(&levels[a]));
	ranked.truncate(top_k);
	ranked
}
