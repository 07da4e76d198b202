//! Think Cycle Example
//!
//! Drives the engine the way an autonomous agent would: once per tick, ask
//! the decision bridge what to do, think about the most interesting concept,
//! rewire, maybe invent something, and let the rest fade.
//!
//! Run with: `RUST_LOG=synaptic_core=debug cargo run --example think_cycle`

use synaptic_core::{
	ConceptGraph, CoreError, DecisionBridge, DecisionConfig, GraphConfig, PropagationEngine,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CoreError> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	println!("=== Think Cycle ===\n");

	let config = GraphConfig {
		dim: 16,
		..GraphConfig::default()
	};
	let mut graph = ConceptGraph::seeded(config, 2024)?;

	// A small world:
	//
	//   coffee ←→ morning ←→ sunrise
	//     ↓                     ↓
	//   paris  ←→  travel  ←→ ocean
	for (name, category) in [
		("coffee", "food"),
		("morning", "time"),
		("sunrise", "nature"),
		("paris", "place"),
		("travel", "activity"),
		("ocean", "nature"),
	] {
		let _ = graph.create(name, None, category)?;
	}
	for (a, b, w) in [
		("coffee", "morning", 0.9),
		("morning", "sunrise", 0.7),
		("coffee", "paris", 0.6),
		("paris", "travel", 0.8),
		("travel", "ocean", 0.6),
		("sunrise", "ocean", 0.5),
	] {
		let _ = graph.relate(a, b, Some(w), true)?;
	}

	let engine = PropagationEngine::default();
	let bridge = DecisionBridge::standard(DecisionConfig::default())?;

	for tick in 1..=8 {
		let decisions = bridge.decide_for_cycle(&graph);
		let Some(seed) = bridge.focus(&graph).into_iter().next() else {
			println!("tick {tick}: nothing left to think about");
			break;
		};

		let run = engine.activate(&mut graph, &seed, 3, decisions.explore);
		let reached = run.last().map(|s| s.top(3)).unwrap_or_default();
		let rewired = graph.auto_modify(decisions.connect);

		let mut invented = None;
		if decisions.generate_idea > 0.5 {
			if let Some(candidate) = graph.detect_genesis_candidates(0.2).into_iter().next() {
				let parents = [candidate.a.as_str(), candidate.b.as_str()];
				invented = Some(graph.genesis(&parents, None)?);
			}
		}
		let pruned = graph.decay_all(decisions.forget * 0.02);

		println!(
			"tick {tick}: seed={seed:<8} explore={:.2} idea={:.2} forget={:.2} connect={:.2}",
			decisions.explore, decisions.generate_idea, decisions.forget, decisions.connect
		);
		for (name, level) in &reached {
			println!("    reached {name:<24} {level:.3}");
		}
		if rewired > 0 {
			println!("    rewired {rewired} edges");
		}
		if let Some(name) = invented {
			println!("    invented {name}");
		}
		if !pruned.is_empty() {
			println!("    forgot {pruned:?}");
		}
	}

	let stats = graph.stats();
	println!(
		"\n{} concepts ({} emergent), {} edges, density {:.3}",
		stats.concepts, stats.emergent, stats.edges, stats.density
	);

	let path = std::env::temp_dir().join("synaptic-think-cycle.json");
	graph.save_to_path(&path)?;
	println!("saved to {}", path.display());

	Ok(())
}
