use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The garbage collector the sizing is computed for
#[derive(ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum GcStrategy {
	/// Region-based collector (G1)
	#[default]
	#[value(name = "g1", alias = "region-based")]
	#[serde(rename = "G1")]
	RegionBased,
	/// Low-latency collector (ZGC)
	#[value(name = "zgc", alias = "low-latency")]
	#[serde(rename = "ZGC")]
	LowLatency,
}

impl GcStrategy {
	/// The short label used by the JVM documentation
	pub(crate) fn label(&self) -> &'static str {
		match self {
			Self::RegionBased => "G1",
			Self::LowLatency => "ZGC",
		}
	}
}

impl Display for GcStrategy {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.label())
	}
}

/// The raw sizing inputs of a single computation.
///
/// Values are taken as given: range checks belong to whoever builds the
/// input (the command line parser does its own), so zero or unusually
/// large values simply flow through the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct SizingInput {
	/// Desired maximum heap, in MB
	pub(crate) heap_size_mb: u64,
	/// Number of live threads
	pub(crate) thread_count: u64,
	/// Number of loaded classes
	pub(crate) loaded_class_count: u64,
	/// Stack size of each thread, in MB
	pub(crate) stack_size_per_thread_mb: f64,
	/// Reserved code cache, in MB
	pub(crate) code_cache_mb: u64,
	/// Maximum direct (NIO) memory, in MB
	pub(crate) direct_memory_mb: u64,
	/// The collector the application runs with
	pub(crate) gc_strategy: GcStrategy,
	/// Share of the container limit the JVM is allowed to occupy
	pub(crate) target_utilization_percent: Option<u32>,
}

impl Default for SizingInput {
	fn default() -> Self {
		Self {
			heap_size_mb: 384,
			thread_count: 85,
			loaded_class_count: 30000,
			stack_size_per_thread_mb: 1.0,
			code_cache_mb: 64,
			direct_memory_mb: 10,
			gc_strategy: GcStrategy::RegionBased,
			target_utilization_percent: None,
		}
	}
}

impl SizingInput {
	/// Returns a copy of this input running with another collector
	pub(crate) fn with_gc_strategy(self, gc_strategy: GcStrategy) -> Self {
		Self {
			gc_strategy,
			..self
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn gc_strategy_labels() {
		assert_eq!(GcStrategy::RegionBased.to_string(), "G1");
		assert_eq!(GcStrategy::LowLatency.to_string(), "ZGC");
	}

	#[test]
	fn gc_strategy_parses_cli_names_and_aliases() {
		assert_eq!(GcStrategy::from_str("g1", true), Ok(GcStrategy::RegionBased));
		assert_eq!(GcStrategy::from_str("region-based", true), Ok(GcStrategy::RegionBased));
		assert_eq!(GcStrategy::from_str("ZGC", true), Ok(GcStrategy::LowLatency));
		assert!(GcStrategy::from_str("parallel", true).is_err());
	}

	#[test]
	fn gc_strategy_serializes_with_collector_labels() {
		let json = serde_json::to_string(&GcStrategy::LowLatency).unwrap();
		assert_eq!(json, r#""ZGC""#);
		let back: GcStrategy = serde_json::from_str(r#""G1""#).unwrap();
		assert_eq!(back, GcStrategy::RegionBased);
	}

	#[test]
	fn default_input_matches_reference_form() {
		let input = SizingInput::default();
		assert_eq!(input.heap_size_mb, 384);
		assert_eq!(input.thread_count, 85);
		assert_eq!(input.loaded_class_count, 30000);
		assert_eq!(input.gc_strategy, GcStrategy::RegionBased);
		let zgc = input.with_gc_strategy(GcStrategy::LowLatency);
		assert_eq!(zgc.gc_strategy, GcStrategy::LowLatency);
		assert_eq!(zgc.heap_size_mb, input.heap_size_mb);
	}
}
