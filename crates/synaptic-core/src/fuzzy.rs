//! Fuzzy Inference
//!
//! A general Mamdani engine: crisp inputs in, crisp outputs out.
//!
//! 1. **Fuzzify** - each input gets a degree in `[0, 1]` per label of its variable
//! 2. **Fire** - rule strength = `min(antecedent degrees) × weight`
//! 3. **Aggregate** - per output label, `max` over the rules targeting it
//! 4. **Defuzzify** - centroid `Σ x·μ(x) / Σ μ(x)` over a discretized domain, where
//!    `μ(x) = max_label min(membership(x), aggregated[label])`
//!
//! When nothing fires for an output its centroid is undefined and the domain
//! midpoint is returned instead. Labels need not sum to 1.
//!
//! The engine holds no knowledge of the graph or of any particular
//! vocabulary; see [`crate::rulebase`] for the standard one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::error::{CoreError, Result};

/// Named crisp values (inputs or outputs).
pub type CrispValues = BTreeMap<String, f64>;

/// Default number of points used to discretize an output domain.
pub const DEFAULT_RESOLUTION: usize = 101;

// ============================================================================
// Membership Functions
// ============================================================================

/// Shape of a fuzzy set.
///
/// Shoulders are expressed with repeated breakpoints, e.g.
/// `trapezoidal(0.0, 0.0, 0.2, 0.45)` is fully true from 0 to 0.2.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Membership {
	/// Rises from `a` to a peak at `b`, falls to zero at `c`
	Triangular {
		/// Left foot
		a: f64,
		/// Peak
		b: f64,
		/// Right foot
		c: f64,
	},
	/// Rises from `a` to `b`, flat until `c`, falls to zero at `d`
	Trapezoidal {
		/// Left foot
		a: f64,
		/// Left shoulder
		b: f64,
		/// Right shoulder
		c: f64,
		/// Right foot
		d: f64,
	},
}

impl Membership {
	/// Triangular set `(a, b, c)`.
	#[must_use]
	pub const fn triangular(a: f64, b: f64, c: f64) -> Self {
		Self::Triangular { a, b, c }
	}

	/// Trapezoidal set `(a, b, c, d)`.
	#[must_use]
	pub const fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Self {
		Self::Trapezoidal { a, b, c, d }
	}

	/// Degree of membership of `x`, in `[0, 1]`.
	#[must_use]
	pub fn degree(&self, x: f64) -> f64 {
		match *self {
			Self::Triangular { a, b, c } => trapezoid(x, a, b, b, c),
			Self::Trapezoidal { a, b, c, d } => trapezoid(x, a, b, c, d),
		}
	}

	fn breakpoints(&self) -> SmallVec<[f64; 4]> {
		match *self {
			Self::Triangular { a, b, c } => SmallVec::from_slice(&[a, b, c]),
			Self::Trapezoidal { a, b, c, d } => SmallVec::from_slice(&[a, b, c, d]),
		}
	}

	fn is_well_formed(&self) -> bool {
		let points = self.breakpoints();
		points.iter().all(|p| p.is_finite()) && points.windows(2).all(|w| w[0] <= w[1])
	}
}

#[inline]
fn trapezoid(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
	if !(a..=d).contains(&x) {
		0.0
	} else if (b..=c).contains(&x) {
		1.0
	} else if x < b {
		(x - a) / (b - a)
	} else {
		(d - x) / (d - c)
	}
}

// ============================================================================
// Variables
// ============================================================================

/// A labeled fuzzy set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzySet {
	/// Linguistic label ("low", "high", ...)
	pub label: String,
	/// Shape
	pub membership: Membership,
}

/// A linguistic variable: a bounded domain covered by labeled fuzzy sets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzyVariable {
	/// Variable name
	pub name: String,
	/// Lower bound of the domain
	pub min: f64,
	/// Upper bound of the domain
	pub max: f64,
	/// Labeled sets
	pub sets: Vec<FuzzySet>,
}

impl FuzzyVariable {
	/// Variable over `[min, max]` with no sets yet.
	pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
		Self {
			name: name.into(),
			min,
			max,
			sets: Vec::new(),
		}
	}

	/// Variable over `[0, 1]` with no sets yet.
	pub fn unit(name: impl Into<String>) -> Self {
		Self::new(name, 0.0, 1.0)
	}

	/// Add a labeled set.
	#[must_use]
	pub fn with_set(mut self, label: impl Into<String>, membership: Membership) -> Self {
		self.sets.push(FuzzySet {
			label: label.into(),
			membership,
		});
		self
	}

	/// Midpoint of the domain.
	#[must_use]
	pub fn midpoint(&self) -> f64 {
		(self.min + self.max) / 2.0
	}

	/// Position of `label` among the sets.
	#[must_use]
	pub fn label_index(&self, label: &str) -> Option<usize> {
		self.sets.iter().position(|s| s.label == label)
	}

	/// Degree of every label for `x` (clamped into the domain).
	#[must_use]
	pub fn fuzzify(&self, x: f64) -> Vec<(&str, f64)> {
		let x = x.clamp(self.min, self.max);
		self.sets
			.iter()
			.map(|s| (s.label.as_str(), s.membership.degree(x)))
			.collect()
	}

	fn validate(&self) -> Result<()> {
		if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
			return Err(CoreError::invalid(format!(
				"variable {} has an empty or non-finite domain",
				self.name
			)));
		}
		if self.sets.is_empty() {
			return Err(CoreError::invalid(format!("variable {} has no sets", self.name)));
		}
		for (i, set) in self.sets.iter().enumerate() {
			if !set.membership.is_well_formed() {
				return Err(CoreError::invalid(format!(
					"set {}.{} has unordered or non-finite breakpoints",
					self.name, set.label
				)));
			}
			if self.sets[..i].iter().any(|s| s.label == set.label) {
				return Err(CoreError::invalid(format!(
					"variable {} repeats label {}",
					self.name, set.label
				)));
			}
		}
		Ok(())
	}
}

// ============================================================================
// Rules
// ============================================================================

/// `variable IS label`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
	/// Variable name
	pub variable: String,
	/// Label of one of the variable's sets
	pub label: String,
}

impl Clause {
	/// `variable IS label`.
	pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			variable: variable.into(),
			label: label.into(),
		}
	}
}

/// `IF a AND b AND ... THEN c`, scaled by `weight`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
	/// Input clauses, combined with `min`
	pub antecedents: SmallVec<[Clause; 4]>,
	/// Output clause
	pub consequent: Clause,
	/// Multiplier on firing strength, in `[0, 1]`
	pub weight: f64,
	/// What the rule is for
	pub intent: String,
}

impl Rule {
	/// Build a rule from `(variable, label)` pairs.
	pub fn new(
		antecedents: &[(&str, &str)],
		consequent: (&str, &str),
		weight: f64,
		intent: impl Into<String>,
	) -> Self {
		Self {
			antecedents: antecedents.iter().map(|&(v, l)| Clause::new(v, l)).collect(),
			consequent: Clause::new(consequent.0, consequent.1),
			weight,
			intent: intent.into(),
		}
	}
}

/// A rule resolved to variable and label positions.
#[derive(Clone, Debug)]
struct CompiledRule {
	antecedents: SmallVec<[(usize, usize); 4]>,
	output: usize,
	label: usize,
	weight: f64,
}

// ============================================================================
// Engine
// ============================================================================

/// Result of [`FuzzyEngine::infer_with_trace`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferenceTrace {
	/// Crisp output per output variable
	pub outputs: CrispValues,
	/// Firing strength per rule, in rule order
	pub firing: Vec<f64>,
	/// Crisp input actually used per input variable (after defaults and clamping)
	pub inputs: CrispValues,
}

/// Mamdani inference over a fixed set of input and output variables.
#[derive(Clone, Debug)]
pub struct FuzzyEngine {
	inputs: Vec<FuzzyVariable>,
	outputs: Vec<FuzzyVariable>,
	rules: Vec<Rule>,
	compiled: Vec<CompiledRule>,
	resolution: usize,
}

impl FuzzyEngine {
	/// Build an engine, checking every rule against the vocabulary.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] for malformed variables, duplicate
	/// variable names, or rules naming unknown variables or labels.
	pub fn new(
		inputs: Vec<FuzzyVariable>,
		outputs: Vec<FuzzyVariable>,
		rules: Vec<Rule>,
	) -> Result<Self> {
		for (i, var) in inputs.iter().chain(&outputs).enumerate() {
			var.validate()?;
			if inputs.iter().chain(&outputs).take(i).any(|v| v.name == var.name) {
				return Err(CoreError::invalid(format!("variable {} declared twice", var.name)));
			}
		}

		let mut engine = Self {
			inputs,
			outputs,
			rules: Vec::with_capacity(rules.len()),
			compiled: Vec::with_capacity(rules.len()),
			resolution: DEFAULT_RESOLUTION,
		};
		for rule in rules {
			engine.add_rule(rule)?;
		}
		Ok(engine)
	}

	/// Use `resolution` points (at least 2) when defuzzifying.
	#[must_use]
	pub fn with_resolution(mut self, resolution: usize) -> Self {
		self.resolution = resolution.max(2);
		self
	}

	/// Append a rule.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] if the rule has no antecedents,
	/// a weight outside `[0, 1]`, or names an unknown variable or label.
	pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
		if rule.antecedents.is_empty() {
			return Err(CoreError::invalid("rule needs at least one antecedent"));
		}
		if !(0.0..=1.0).contains(&rule.weight) {
			return Err(CoreError::invalid(format!("rule weight {} not in [0, 1]", rule.weight)));
		}

		let antecedents = rule
			.antecedents
			.iter()
			.map(|clause| resolve(&self.inputs, clause))
			.collect::<Result<SmallVec<[(usize, usize); 4]>>>()?;
		let (output, label) = resolve(&self.outputs, &rule.consequent)?;

		self.compiled.push(CompiledRule {
			antecedents,
			output,
			label,
			weight: rule.weight,
		});
		self.rules.push(rule);
		Ok(())
	}

	/// Input variables.
	#[must_use]
	pub fn inputs(&self) -> &[FuzzyVariable] {
		&self.inputs
	}

	/// Output variables.
	#[must_use]
	pub fn outputs(&self) -> &[FuzzyVariable] {
		&self.outputs
	}

	/// Rules in evaluation order.
	#[must_use]
	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Crisp value for every output variable.
	///
	/// Missing or non-finite inputs fall back to their domain midpoint; inputs
	/// outside the domain are clamped into it. Never fails.
	#[must_use]
	pub fn infer(&self, inputs: &CrispValues) -> CrispValues {
		self.infer_with_trace(inputs).outputs
	}

	/// Like [`infer`](Self::infer), also reporting each rule's firing strength.
	#[must_use]
	pub fn infer_with_trace(&self, inputs: &CrispValues) -> InferenceTrace {
		let crisp: Vec<f64> = self
			.inputs
			.iter()
			.map(|var| match inputs.get(&var.name) {
				Some(&x) if x.is_finite() => x.clamp(var.min, var.max),
				Some(&x) => {
					warn!(
						variable = %var.name,
						value = x,
						"non-finite fuzzy input replaced by midpoint"
					);
					var.midpoint()
				}
				None => var.midpoint(),
			})
			.collect();

		let degrees: Vec<SmallVec<[f64; 4]>> = self
			.inputs
			.iter()
			.zip(&crisp)
			.map(|(var, &x)| var.sets.iter().map(|s| s.membership.degree(x)).collect())
			.collect();

		let mut aggregated: Vec<SmallVec<[f64; 4]>> = self
			.outputs
			.iter()
			.map(|var| SmallVec::from_elem(0.0, var.sets.len()))
			.collect();

		let firing: Vec<f64> = self
			.compiled
			.iter()
			.map(|rule| {
				let strength = rule
					.antecedents
					.iter()
					.map(|&(v, l)| degrees[v][l])
					.fold(1.0, f64::min)
					* rule.weight;
				let slot = &mut aggregated[rule.output][rule.label];
				*slot = slot.max(strength);
				strength
			})
			.collect();

		let outputs = self
			.outputs
			.iter()
			.zip(&aggregated)
			.map(|(var, clip)| (var.name.clone(), centroid(var, clip, self.resolution)))
			.collect();

		InferenceTrace {
			outputs,
			firing,
			inputs: self
				.inputs
				.iter()
				.zip(crisp)
				.map(|(var, x)| (var.name.clone(), x))
				.collect(),
		}
	}
}

fn resolve(variables: &[FuzzyVariable], clause: &Clause) -> Result<(usize, usize)> {
	let v = variables
		.iter()
		.position(|var| var.name == clause.variable)
		.ok_or_else(|| CoreError::invalid(format!("unknown variable {}", clause.variable)))?;
	let l = variables[v].label_index(&clause.label).ok_or_else(|| {
		CoreError::invalid(format!("variable {} has no label {}", clause.variable, clause.label))
	})?;
	Ok((v, l))
}

/// Centroid of the clipped output sets; the domain midpoint when nothing fired.
fn centroid(var: &FuzzyVariable, clip: &[f64], resolution: usize) -> f64 {
	if clip.iter().all(|&c| c <= 0.0) {
		return var.midpoint();
	}

	#[allow(clippy::cast_precision_loss)]
	let step = (var.max - var.min) / (resolution - 1) as f64;
	let (mut numerator, mut denominator) = (0.0, 0.0);
	for k in 0..resolution {
		#[allow(clippy::cast_precision_loss)]
		let x = step.mul_add(k as f64, var.min);
		let mu = var
			.sets
			.iter()
			.zip(clip)
			.map(|(set, &c)| set.membership.degree(x).min(c))
			.fold(0.0, f64::max);
		numerator = x.mul_add(mu, numerator);
		denominator += mu;
	}

	if denominator <= f64::EPSILON {
		var.midpoint()
	} else {
		(numerator / denominator).clamp(var.min, var.max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn level(name: &str) -> FuzzyVariable {
		FuzzyVariable::unit(name)
			.with_set("low", Membership::trapezoidal(0.0, 0.0, 0.2, 0.45))
			.with_set("medium", Membership::triangular(0.25, 0.5, 0.75))
			.with_set("high", Membership::trapezoidal(0.55, 0.8, 1.0, 1.0))
	}

	fn inputs(pairs: &[(&str, f64)]) -> CrispValues {
		pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
	}

	fn heat_engine() -> FuzzyEngine {
		FuzzyEngine::new(
			vec![level("temperature")],
			vec![level("fan")],
			vec![
				Rule::new(&[("temperature", "high")], ("fan", "high"), 1.0, "cool down"),
				Rule::new(&[("temperature", "low")], ("fan", "low"), 1.0, "save power"),
			],
		)
		.unwrap()
	}

	#[test]
	fn test_triangular_membership() {
		let m = Membership::triangular(0.25, 0.5, 0.75);
		assert!(m.degree(0.1).abs() < f64::EPSILON);
		assert!((m.degree(0.5) - 1.0).abs() < f64::EPSILON);
		assert!((m.degree(0.375) - 0.5).abs() < 1e-12);
		assert!((m.degree(0.625) - 0.5).abs() < 1e-12);
		assert!(m.degree(0.75).abs() < f64::EPSILON);
	}

	#[test]
	fn test_trapezoidal_shoulders() {
		let left = Membership::trapezoidal(0.0, 0.0, 0.2, 0.45);
		assert!((left.degree(0.0) - 1.0).abs() < f64::EPSILON);
		assert!((left.degree(0.2) - 1.0).abs() < f64::EPSILON);
		assert!(left.degree(0.45).abs() < f64::EPSILON);

		let right = Membership::trapezoidal(0.55, 0.8, 1.0, 1.0);
		assert!((right.degree(1.0) - 1.0).abs() < f64::EPSILON);
		assert!((right.degree(0.675) - 0.5).abs() < 1e-12);
		assert!(right.degree(0.5).abs() < f64::EPSILON);
	}

	#[test]
	fn test_fuzzify_clamps_into_domain() {
		let var = level("x");
		let degrees = var.fuzzify(7.0);
		assert_eq!(degrees[2], ("high", 1.0));
		assert!(degrees[0].1.abs() < f64::EPSILON);
	}

	#[test]
	fn test_high_input_gives_high_output() {
		let engine = heat_engine();
		let hot = engine.infer(&inputs(&[("temperature", 0.95)]));
		let cold = engine.infer(&inputs(&[("temperature", 0.05)]));
		assert!(hot["fan"] > 0.75);
		assert!(cold["fan"] < 0.25);
	}

	#[test]
	fn test_nothing_fires_gives_midpoint() {
		let engine = FuzzyEngine::new(
			vec![level("temperature")],
			vec![level("fan")],
			vec![Rule::new(&[("temperature", "high")], ("fan", "high"), 1.0, "cool down")],
		)
		.unwrap();
		let out = engine.infer(&inputs(&[("temperature", 0.1)]));
		assert!((out["fan"] - 0.5).abs() < f64::EPSILON);

		let trace = engine.infer_with_trace(&inputs(&[("temperature", 0.1)]));
		assert_eq!(trace.firing, vec![0.0]);
	}

	#[test]
	fn test_missing_and_non_finite_inputs_use_midpoint() {
		let engine = heat_engine();
		let trace = engine.infer_with_trace(&CrispValues::new());
		assert!((trace.inputs["temperature"] - 0.5).abs() < f64::EPSILON);

		let trace = engine.infer_with_trace(&inputs(&[("temperature", f64::NAN)]));
		assert!((trace.inputs["temperature"] - 0.5).abs() < f64::EPSILON);
		assert!(trace.outputs["fan"].is_finite());
	}

	#[test]
	fn test_weight_scales_firing() {
		let engine = FuzzyEngine::new(
			vec![level("temperature")],
			vec![level("fan")],
			vec![Rule::new(&[("temperature", "high")], ("fan", "high"), 0.4, "gentle")],
		)
		.unwrap();
		let trace = engine.infer_with_trace(&inputs(&[("temperature", 0.9)]));
		assert!((trace.firing[0] - 0.4).abs() < 1e-12);
	}

	#[test]
	fn test_and_takes_minimum_and_or_takes_maximum() {
		let engine = FuzzyEngine::new(
			vec![level("a"), level("b")],
			vec![level("out")],
			vec![
				Rule::new(&[("a", "high"), ("b", "high")], ("out", "high"), 1.0, "both"),
				Rule::new(&[("a", "high")], ("out", "high"), 0.3, "a alone"),
			],
		)
		.unwrap();
		let trace = engine.infer_with_trace(&inputs(&[("a", 1.0), ("b", 0.675)]));
		assert!((trace.firing[0] - 0.5).abs() < 1e-12);
		assert!((trace.firing[1] - 0.3).abs() < 1e-12);
	}

	#[test]
	fn test_rejects_unknown_references() {
		let unknown_var = FuzzyEngine::new(
			vec![level("a")],
			vec![level("out")],
			vec![Rule::new(&[("nope", "high")], ("out", "high"), 1.0, "")],
		);
		assert!(unknown_var.is_err());

		let mut engine = FuzzyEngine::new(vec![level("a")], vec![level("out")], vec![]).unwrap();
		assert!(engine
			.add_rule(Rule::new(&[("a", "scorching")], ("out", "high"), 1.0, ""))
			.is_err());
		assert!(engine.add_rule(Rule::new(&[], ("out", "high"), 1.0, "")).is_err());
		assert!(engine
			.add_rule(Rule::new(&[("a", "high")], ("out", "high"), 1.5, ""))
			.is_err());
		assert!(engine.rules().is_empty());
	}

	#[test]
	fn test_rejects_malformed_variables() {
		let backwards =
			FuzzyVariable::unit("x").with_set("bad", Membership::triangular(0.8, 0.5, 0.2));
		assert!(FuzzyEngine::new(vec![backwards], vec![level("out")], vec![]).is_err());
		assert!(FuzzyEngine::new(vec![level("x")], vec![level("x")], vec![]).is_err());
		assert!(FuzzyEngine::new(vec![FuzzyVariable::unit("empty")], vec![], vec![]).is_err());
	}

	#[test]
	fn test_outputs_stay_in_domain() {
		let engine = heat_engine().with_resolution(11);
		for i in 0..=20 {
			let x = f64::from(i) / 10.0 - 0.5;
			let out = engine.infer(&inputs(&[("temperature", x)]));
			assert!((0.0..=1.0).contains(&out["fan"]));
		}
	}
}
