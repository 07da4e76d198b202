//! Standard Vocabulary and Rule Table
//!
//! Five inputs and five outputs, all over `[0, 1]`, each with the same three
//! overlapping labels:
//!
//! ```text
//! low    = trap(0, 0, 0.2, 0.45)
//! medium = tri(0.25, 0.5, 0.75)
//! high   = trap(0.55, 0.8, 1, 1)
//! ```
//!
//! The rule table below is data. Extending behavior means appending a row
//! (or calling [`FuzzyEngine::add_rule`]), never touching the engine.

use crate::error::Result;
use crate::fuzzy::{FuzzyEngine, FuzzyVariable, Membership, Rule};

/// Input: how strongly the concept has been firing.
pub const ACTIVATION: &str = "activation";
/// Input: how recently the concept appeared.
pub const NOVELTY: &str = "novelty";
/// Input: how robust the concept is.
pub const EDGE_STRENGTH: &str = "edge_strength";
/// Input: the concept's curiosity.
pub const CURIOSITY: &str = "curiosity";
/// Input: how connected the neighborhood is.
pub const NETWORK_DENSITY: &str = "network_density";

/// Output: drive to wander to unfamiliar regions.
pub const EXPLORE: &str = "explore";
/// Output: drive to synthesize a new concept.
pub const GENERATE_IDEA: &str = "generate_idea";
/// Output: drive to let weak material decay.
pub const FORGET: &str = "forget";
/// Output: drive to recombine loosely related material.
pub const DREAM: &str = "dream";
/// Output: drive to form new edges.
pub const CONNECT: &str = "connect";

/// Label for the lower third.
pub const LOW: &str = "low";
/// Label for the middle.
pub const MEDIUM: &str = "medium";
/// Label for the upper third.
pub const HIGH: &str = "high";

/// Input variable names, in declaration order.
pub const INPUT_NAMES: [&str; 5] = [ACTIVATION, NOVELTY, EDGE_STRENGTH, CURIOSITY, NETWORK_DENSITY];

/// Output variable names, in declaration order.
pub const OUTPUT_NAMES: [&str; 5] = [EXPLORE, GENERATE_IDEA, FORGET, DREAM, CONNECT];

/// One row of the rule table.
#[derive(Clone, Copy, Debug)]
pub struct RuleSpec {
	/// Stable identifier
	pub id: &'static str,
	/// `(input, label)` clauses, ANDed
	pub when: &'static [(&'static str, &'static str)],
	/// `(output, label)`
	pub then: (&'static str, &'static str),
	/// Firing multiplier
	pub weight: f64,
	/// What the rule expresses
	pub intent: &'static str,
}

impl RuleSpec {
	/// Owned [`Rule`] for this row.
	#[must_use]
	pub fn to_rule(&self) -> Rule {
		Rule::new(self.when, self.then, self.weight, format!("{}: {}", self.id, self.intent))
	}
}

/// The standard rule table.
pub const STANDARD_RULES: &[RuleSpec] = &[
	// explore
	RuleSpec {
		id: "R1",
		when: &[(CURIOSITY, HIGH), (NOVELTY, HIGH)],
		then: (EXPLORE, HIGH),
		weight: 1.0,
		intent: "curious about something new: go look around it",
	},
	RuleSpec {
		id: "R2",
		when: &[(ACTIVATION, LOW), (CURIOSITY, HIGH)],
		then: (EXPLORE, HIGH),
		weight: 0.9,
		intent: "curious but idle: go find something to think about",
	},
	RuleSpec {
		id: "R3",
		when: &[(NETWORK_DENSITY, LOW)],
		then: (EXPLORE, HIGH),
		weight: 0.8,
		intent: "sparse neighborhood: widen it",
	},
	RuleSpec {
		id: "R4",
		when: &[(ACTIVATION, HIGH), (NETWORK_DENSITY, HIGH)],
		then: (EXPLORE, LOW),
		weight: 0.8,
		intent: "busy and well connected: stay put",
	},
	RuleSpec {
		id: "R5",
		when: &[(CURIOSITY, LOW)],
		then: (EXPLORE, LOW),
		weight: 1.0,
		intent: "satiated: no reason to wander",
	},
	RuleSpec {
		id: "R6",
		when: &[(CURIOSITY, MEDIUM)],
		then: (EXPLORE, MEDIUM),
		weight: 0.8,
		intent: "moderate curiosity: moderate exploration",
	},
	// generate_idea
	RuleSpec {
		id: "R7",
		when: &[(ACTIVATION, HIGH), (NOVELTY, HIGH)],
		then: (GENERATE_IDEA, HIGH),
		weight: 1.0,
		intent: "something new is firing hard: build on it",
	},
	RuleSpec {
		id: "R8",
		when: &[(EDGE_STRENGTH, HIGH), (CURIOSITY, HIGH)],
		then: (GENERATE_IDEA, HIGH),
		weight: 0.8,
		intent: "solid footing plus curiosity: synthesize",
	},
	RuleSpec {
		id: "R9",
		when: &[(ACTIVATION, LOW)],
		then: (GENERATE_IDEA, LOW),
		weight: 0.9,
		intent: "nothing is firing: nothing to build on",
	},
	RuleSpec {
		id: "R10",
		when: &[(NOVELTY, MEDIUM), (ACTIVATION, MEDIUM)],
		then: (GENERATE_IDEA, MEDIUM),
		weight: 0.7,
		intent: "familiar and warm: occasional ideas",
	},
	RuleSpec {
		id: "R11",
		when: &[(NOVELTY, LOW), (CURIOSITY, LOW)],
		then: (GENERATE_IDEA, LOW),
		weight: 1.0,
		intent: "stale and uninteresting: do not bother",
	},
	// forget
	RuleSpec {
		id: "R12",
		when: &[(ACTIVATION, LOW), (EDGE_STRENGTH, LOW)],
		then: (FORGET, HIGH),
		weight: 1.0,
		intent: "weak and unused: let it go",
	},
	RuleSpec {
		id: "R13",
		when: &[(NOVELTY, LOW), (ACTIVATION, LOW)],
		then: (FORGET, HIGH),
		weight: 0.8,
		intent: "old and quiet: let it fade",
	},
	RuleSpec {
		id: "R14",
		when: &[(ACTIVATION, HIGH)],
		then: (FORGET, LOW),
		weight: 1.0,
		intent: "in active use: keep it",
	},
	RuleSpec {
		id: "R15",
		when: &[(EDGE_STRENGTH, HIGH)],
		then: (FORGET, LOW),
		weight: 0.9,
		intent: "well reinforced: keep it",
	},
	RuleSpec {
		id: "R16",
		when: &[(EDGE_STRENGTH, MEDIUM), (ACTIVATION, MEDIUM)],
		then: (FORGET, MEDIUM),
		weight: 0.7,
		intent: "middling on both: normal decay",
	},
	// dream
	RuleSpec {
		id: "R17",
		when: &[(CURIOSITY, HIGH), (ACTIVATION, LOW)],
		then: (DREAM, HIGH),
		weight: 0.9,
		intent: "curious while idle: recombine freely",
	},
	RuleSpec {
		id: "R18",
		when: &[(NOVELTY, LOW), (NETWORK_DENSITY, HIGH)],
		then: (DREAM, HIGH),
		weight: 0.7,
		intent: "old dense material: shake it up",
	},
	RuleSpec {
		id: "R19",
		when: &[(ACTIVATION, HIGH), (NOVELTY, HIGH)],
		then: (DREAM, LOW),
		weight: 0.8,
		intent: "awake on something new: stay focused",
	},
	RuleSpec {
		id: "R20",
		when: &[(CURIOSITY, MEDIUM)],
		then: (DREAM, MEDIUM),
		weight: 0.6,
		intent: "moderate curiosity: some drifting",
	},
	// connect
	RuleSpec {
		id: "R21",
		when: &[(NETWORK_DENSITY, LOW), (ACTIVATION, HIGH)],
		then: (CONNECT, HIGH),
		weight: 1.0,
		intent: "active but isolated: wire it in",
	},
	RuleSpec {
		id: "R22",
		when: &[(EDGE_STRENGTH, MEDIUM), (CURIOSITY, HIGH)],
		then: (CONNECT, HIGH),
		weight: 0.8,
		intent: "curious about a settling concept: link it",
	},
	RuleSpec {
		id: "R23",
		when: &[(NETWORK_DENSITY, HIGH)],
		then: (CONNECT, LOW),
		weight: 0.9,
		intent: "already saturated: no more edges",
	},
	RuleSpec {
		id: "R24",
		when: &[(EDGE_STRENGTH, LOW), (CURIOSITY, LOW)],
		then: (CONNECT, LOW),
		weight: 0.8,
		intent: "weak and dull: not worth linking",
	},
	RuleSpec {
		id: "R25",
		when: &[(NETWORK_DENSITY, MEDIUM)],
		then: (CONNECT, MEDIUM),
		weight: 0.7,
		intent: "average neighborhood: average linking",
	},
];

/// A `[0, 1]` variable carrying the three standard labels.
#[must_use]
pub fn standard_variable(name: &str) -> FuzzyVariable {
	FuzzyVariable::unit(name)
		.with_set(LOW, Membership::trapezoidal(0.0, 0.0, 0.2, 0.45))
		.with_set(MEDIUM, Membership::triangular(0.25, 0.5, 0.75))
		.with_set(HIGH, Membership::trapezoidal(0.55, 0.8, 1.0, 1.0))
}

/// The five standard input variables.
#[must_use]
pub fn standard_inputs() -> Vec<FuzzyVariable> {
	INPUT_NAMES.iter().map(|name| standard_variable(name)).collect()
}

/// The five standard output variables.
#[must_use]
pub fn standard_outputs() -> Vec<FuzzyVariable> {
	OUTPUT_NAMES.iter().map(|name| standard_variable(name)).collect()
}

/// The standard rule table as owned rules.
#[must_use]
pub fn standard_rules() -> Vec<Rule> {
	STANDARD_RULES.iter().map(RuleSpec::to_rule).collect()
}

impl FuzzyEngine {
	/// Engine over the standard vocabulary and rule table.
	///
	/// # Errors
	///
	/// Only fails if the built-in table references an undeclared variable or
	/// label, which the tests rule out.
	pub fn standard() -> Result<Self> {
		Self::new(standard_inputs(), standard_outputs(), standard_rules())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fuzzy::CrispValues;

	fn inputs(pairs: &[(&str, f64)]) -> CrispValues {
		pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
	}

	#[test]
	fn test_standard_engine_builds() {
		let engine = FuzzyEngine::standard().unwrap();
		assert_eq!(engine.inputs().len(), 5);
		assert_eq!(engine.outputs().len(), 5);
		assert_eq!(engine.rules().len(), STANDARD_RULES.len());
	}

	#[test]
	fn test_rule_ids_are_unique() {
		for (i, rule) in STANDARD_RULES.iter().enumerate() {
			assert!(STANDARD_RULES[..i].iter().all(|r| r.id != rule.id), "{}", rule.id);
			assert!((0.0..=1.0).contains(&rule.weight));
		}
	}

	#[test]
	fn test_every_output_has_rules() {
		for output in OUTPUT_NAMES {
			assert!(STANDARD_RULES.iter().any(|r| r.then.0 == output), "{output}");
		}
	}

	#[test]
	fn test_high_activation_high_novelty_favors_explore_and_ideas() {
		let engine = FuzzyEngine::standard().unwrap();
		let out = engine.infer(&inputs(&[
			(ACTIVATION, 0.9),
			(NOVELTY, 0.9),
			(EDGE_STRENGTH, 0.5),
			(CURIOSITY, 0.9),
			(NETWORK_DENSITY, 0.2),
		]));
		assert!(out[EXPLORE] > 0.6, "explore = {}", out[EXPLORE]);
		assert!(out[GENERATE_IDEA] > 0.6, "generate_idea = {}", out[GENERATE_IDEA]);
		assert!(out[FORGET] < 0.4, "forget = {}", out[FORGET]);
	}

	#[test]
	fn test_idle_weak_concept_favors_forgetting() {
		let engine = FuzzyEngine::standard().unwrap();
		let out = engine.infer(&inputs(&[
			(ACTIVATION, 0.05),
			(NOVELTY, 0.1),
			(EDGE_STRENGTH, 0.1),
			(CURIOSITY, 0.1),
			(NETWORK_DENSITY, 0.5),
		]));
		assert!(out[FORGET] > 0.6, "forget = {}", out[FORGET]);
		assert!(out[GENERATE_IDEA] < 0.4, "generate_idea = {}", out[GENERATE_IDEA]);
	}

	#[test]
	fn test_all_outputs_in_unit_interval() {
		let engine = FuzzyEngine::standard().unwrap().with_resolution(21);
		let grid = [0.0, 0.3, 0.5, 0.7, 1.0];
		for &a in &grid {
			for &c in &grid {
				let out = engine.infer(&inputs(&[
					(ACTIVATION, a),
					(NOVELTY, 1.0 - a),
					(EDGE_STRENGTH, c),
					(CURIOSITY, c),
					(NETWORK_DENSITY, a),
				]));
				assert_eq!(out.len(), OUTPUT_NAMES.len());
				assert!(out.values().all(|v| (0.0..=1.0).contains(v)));
			}
		}
	}

	#[test]
	fn test_missing_inputs_still_produce_every_output() {
		let engine = FuzzyEngine::standard().unwrap();
		let maps = [
			CrispValues::new(),
			inputs(&[(ACTIVATION, 0.9)]),
			inputs(&[(NOVELTY, 0.1), (CURIOSITY, 1.0)]),
			inputs(&[(EDGE_STRENGTH, f64::NAN), ("unrelated", 3.0)]),
		];
		for map in &maps {
			let out = engine.infer(map);
			for output in OUTPUT_NAMES {
				let value = out[output];
				assert!(value.is_finite() && (0.0..=1.0).contains(&value), "{output} = {value}");
			}
			assert_eq!(out.len(), OUTPUT_NAMES.len());
		}
	}
}
