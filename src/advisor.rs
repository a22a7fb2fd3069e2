use crate::gc;
use crate::input::SizingInput;
use crate::memory::MemoryBreakdown;
use crate::profile::SizingProfile;
use serde::Serialize;

/// How a flag and its value are glued together on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TokenShape {
	/// A boolean switch such as `-XX:+UseG1GC`
	Switch,
	/// A value appended directly, such as `-Xmx384m`
	Attached,
	/// A `-XX:Name=value` assignment
	Assigned,
}

/// A single suggested JVM option with the reason behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ParameterRecommendation {
	pub(crate) flag: String,
	pub(crate) value: String,
	pub(crate) rationale: String,
	pub(crate) shape: TokenShape,
}

impl ParameterRecommendation {
	pub(crate) fn switch(flag: &str, rationale: &str) -> Self {
		Self {
			flag: flag.to_string(),
			value: String::new(),
			rationale: rationale.to_string(),
			shape: TokenShape::Switch,
		}
	}

	pub(crate) fn attached<V: ToString>(flag: &str, value: V, rationale: &str) -> Self {
		Self {
			flag: flag.to_string(),
			value: value.to_string(),
			rationale: rationale.to_string(),
			shape: TokenShape::Attached,
		}
	}

	pub(crate) fn assigned<V: ToString>(flag: &str, value: V, rationale: &str) -> Self {
		Self {
			flag: flag.to_string(),
			value: value.to_string(),
			rationale: rationale.to_string(),
			shape: TokenShape::Assigned,
		}
	}

	/// Render this recommendation as a single command line token
	pub(crate) fn token(&self) -> String {
		match self.shape {
			TokenShape::Switch => self.flag.clone(),
			TokenShape::Attached => format!("{}{}", self.flag, self.value),
			TokenShape::Assigned => format!("{}={}", self.flag, self.value),
		}
	}
}

/// Optional recommendation sets layered on top of the baseline
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct AdvisorOptions {
	/// Add the G1 young-size and region-size hints
	pub(crate) verbose_g1: bool,
	/// Add explicit metaspace and compressed class space limits
	pub(crate) metaspace_hints: bool,
}

const XMS: &str = "Sets the initial heap size. Starting below the maximum lets the heap grow on demand without committing memory the application may never use, while avoiding reallocations during startup.";
const XMX: &str = "Sets the maximum heap size. The young and old generations are carved out of this space.";
const XSS: &str = "Sets the stack size for each thread. The default value is usually sufficient. Increase it if you encounter StackOverflowError exceptions or deep recursion.";
const CODE_CACHE: &str = "Space reserved for JIT-compiled code. Important for applications that use a lot of dynamic code or have many classes. Increase it if you see messages about a full code cache. You can check the current value with -XX:+PrintFlagsFinal.";
const DIRECT_MEMORY: &str = "Maximum limit for direct memory (NIO). Important for applications that use a lot of NIO or Netty. A value that is too high can cause native OOM issues.";
const METASPACE_SIZE: &str = "Initial metaspace size. Matching the estimated class metadata avoids full collections triggered by metaspace growth during startup.";
const MAX_METASPACE_SIZE: &str = "Upper bound for class metadata. Without it metaspace can grow until the process runs out of native memory.";
const COMPRESSED_CLASS_SPACE: &str = "Reserved space for compressed class pointers, sized from the number of loaded classes.";
const EXIT_ON_OOM: &str = "Exit the JVM when an OutOfMemoryError is encountered. This avoids a JVM that keeps running and consuming memory without being able to recover.";
const UNLOCK_DIAGNOSTIC: &str = "Unlocks additional diagnostic options for the JVM, enabling more advanced configuration and debugging options.";
const NMT_SUMMARY: &str = "Enables Native Memory Tracking (NMT) and provides a summary of native memory usage. Useful for diagnosing memory issues related to native memory allocations.";
const NMT_STATISTICS: &str = "Prints statistics about native memory usage on exit. Helps in debugging and understanding the memory consumption of native code.";

/// Derive the ordered list of JVM options for the given input.
///
/// The order is fixed: heap sizing, the collector block, thread stacks,
/// code cache, direct memory, the optional metaspace limits and finally the
/// diagnostic flags. Only the collector block depends on the strategy.
pub(crate) fn recommend_parameters(
	input: &SizingInput,
	breakdown: &MemoryBreakdown,
	profile: &SizingProfile,
	options: &AdvisorOptions,
) -> Vec<ParameterRecommendation> {
	let mut out = Vec::with_capacity(16);
	// Heap sizing
	let initial_heap_mb = profile.initial_heap_ratio.floor_of(input.heap_size_mb);
	out.push(ParameterRecommendation::attached("-Xms", format!("{initial_heap_mb}m"), XMS));
	out.push(ParameterRecommendation::attached("-Xmx", format!("{}m", input.heap_size_mb), XMX));
	// Collector specific options
	out.extend(gc::recommendations(input.gc_strategy, input, breakdown, options));
	// Thread stacks
	out.push(ParameterRecommendation::attached(
		"-Xss",
		stack_size(input.stack_size_per_thread_mb),
		XSS,
	));
	// Off-heap areas
	out.push(ParameterRecommendation::assigned(
		"-XX:ReservedCodeCacheSize",
		format!("{}m", input.code_cache_mb),
		CODE_CACHE,
	));
	out.push(ParameterRecommendation::assigned(
		"-XX:MaxDirectMemorySize",
		format!("{}m", breakdown.direct_memory_mb),
		DIRECT_MEMORY,
	));
	if options.metaspace_hints || profile.metaspace_hints {
		out.extend(metaspace_hints(breakdown));
	}
	// Diagnostics
	out.extend(diagnostics());
	out
}

fn metaspace_hints(breakdown: &MemoryBreakdown) -> [ParameterRecommendation; 3] {
	[
		ParameterRecommendation::assigned(
			"-XX:MetaspaceSize",
			format!("{}m", breakdown.metaspace_mb),
			METASPACE_SIZE,
		),
		ParameterRecommendation::assigned(
			"-XX:MaxMetaspaceSize",
			format!("{}m", breakdown.metaspace_mb),
			MAX_METASPACE_SIZE,
		),
		ParameterRecommendation::assigned(
			"-XX:CompressedClassSpaceSize",
			format!("{}m", breakdown.compressed_class_space_mb),
			COMPRESSED_CLASS_SPACE,
		),
	]
}

fn diagnostics() -> [ParameterRecommendation; 4] {
	[
		ParameterRecommendation::switch("-XX:+ExitOnOutOfMemoryError", EXIT_ON_OOM),
		ParameterRecommendation::switch("-XX:+UnlockDiagnosticVMOptions", UNLOCK_DIAGNOSTIC),
		ParameterRecommendation::assigned("-XX:NativeMemoryTracking", "summary", NMT_SUMMARY),
		ParameterRecommendation::switch("-XX:+PrintNMTStatistics", NMT_STATISTICS),
	]
}

// `-Xss` only accepts whole numbers, so fractional MB sizes are given in KB
fn stack_size(stack_size_mb: f64) -> String {
	if stack_size_mb.fract() == 0.0 {
		format!("{}M", stack_size_mb as u64)
	} else {
		format!("{}k", (stack_size_mb * 1024.0).ceil() as u64)
	}
}

/// Join the recommendations into a single command line, in list order
pub(crate) fn command_line(recommendations: &[ParameterRecommendation]) -> String {
	recommendations.iter().map(ParameterRecommendation::token).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::input::GcStrategy;
	use crate::memory::compute_breakdown;
	use crate::profile::ProfileName;

	fn advise(input: &SizingInput, options: AdvisorOptions) -> Vec<ParameterRecommendation> {
		let profile = SizingProfile::JAVA21;
		let breakdown = compute_breakdown(input, &profile);
		recommend_parameters(input, &breakdown, &profile, &options)
	}

	fn tokens(recommendations: &[ParameterRecommendation]) -> Vec<String> {
		recommendations.iter().map(ParameterRecommendation::token).collect()
	}

	#[test]
	fn baseline_order_region_based() {
		let recs = advise(&SizingInput::default(), AdvisorOptions::default());
		assert_eq!(
			tokens(&recs),
			vec![
				"-Xms268m",
				"-Xmx384m",
				"-XX:+UseG1GC",
				"-XX:MaxGCPauseMillis=200",
				"-Xss1M",
				"-XX:ReservedCodeCacheSize=64m",
				"-XX:MaxDirectMemorySize=10m",
				"-XX:+ExitOnOutOfMemoryError",
				"-XX:+UnlockDiagnosticVMOptions",
				"-XX:NativeMemoryTracking=summary",
				"-XX:+PrintNMTStatistics",
			]
		);
	}

	#[test]
	fn scenario_b_low_latency_block() {
		let input = SizingInput::default().with_gc_strategy(GcStrategy::LowLatency);
		let line = command_line(&advise(&input, AdvisorOptions::default()));
		assert!(line.contains("-XX:+UseZGC"));
		assert!(line.contains("-XX:ZAllocationSpikeTolerance=2"));
		assert!(!line.contains("MaxGCPauseMillis"));
		assert!(!line.contains("UseG1GC"));
	}

	#[test]
	fn switching_collector_only_changes_gc_block() {
		let input = SizingInput::default();
		let g1 = advise(&input, AdvisorOptions::default());
		let zgc = advise(&input.with_gc_strategy(GcStrategy::LowLatency), AdvisorOptions::default());
		// Both blocks have two entries, so everything outside positions 2..4 lines up
		assert_eq!(g1.len(), zgc.len());
		assert_eq!(g1[..2], zgc[..2]);
		assert_eq!(g1[4..], zgc[4..]);
		assert_ne!(g1[2..4], zgc[2..4]);
	}

	#[test]
	fn scenario_a_command_line() {
		let line = command_line(&advise(&SizingInput::default(), AdvisorOptions::default()));
		assert!(line.contains("-Xmx384m"));
		assert_eq!(line.matches("-XX:+UseG1GC").count(), 1);
		assert_eq!(line, line.trim());
		assert!(!line.contains("  "));
	}

	#[test]
	fn verbose_g1_hints() {
		let options = AdvisorOptions {
			verbose_g1: true,
			..Default::default()
		};
		let input = SizingInput {
			heap_size_mb: 8192,
			..Default::default()
		};
		let recs = advise(&input, options);
		assert_eq!(
			tokens(&recs[2..6]),
			vec![
				"-XX:+UseG1GC",
				"-XX:G1NewSizePercent=40",
				"-XX:MaxGCPauseMillis=200",
				"-XX:G1HeapRegionSize=4m",
			]
		);
		// Small heaps still get a 1 MB region hint
		let small = advise(&SizingInput::default(), options);
		assert!(command_line(&small).contains("-XX:G1HeapRegionSize=1m"));
		// The richer hints never apply to ZGC
		let zgc = advise(&input.with_gc_strategy(GcStrategy::LowLatency), options);
		assert!(!command_line(&zgc).contains("G1"));
	}

	#[test]
	fn metaspace_hints_follow_direct_memory() {
		let options = AdvisorOptions {
			metaspace_hints: true,
			..Default::default()
		};
		let recs = advise(&SizingInput::default(), options);
		let tokens = tokens(&recs);
		let direct = tokens.iter().position(|t| t.starts_with("-XX:MaxDirectMemorySize")).unwrap();
		assert_eq!(tokens[direct + 1], "-XX:MetaspaceSize=150m");
		assert_eq!(tokens[direct + 2], "-XX:MaxMetaspaceSize=150m");
		assert_eq!(tokens[direct + 3], "-XX:CompressedClassSpaceSize=45m");
		assert_eq!(tokens[direct + 4], "-XX:+ExitOnOutOfMemoryError");
	}

	#[test]
	fn classic_profile_initial_heap() {
		let profile = SizingProfile::new(ProfileName::Classic);
		let input = SizingInput {
			heap_size_mb: 512,
			..Default::default()
		};
		let breakdown = compute_breakdown(&input, &profile);
		let recs = recommend_parameters(&input, &breakdown, &profile, &AdvisorOptions::default());
		assert_eq!(recs[0].token(), "-Xms256m");
	}

	#[test]
	fn classic_profile_always_limits_metaspace() {
		let profile = SizingProfile::new(ProfileName::Classic);
		let input = SizingInput::default();
		let breakdown = compute_breakdown(&input, &profile);
		let line = command_line(&recommend_parameters(
			&input,
			&breakdown,
			&profile,
			&AdvisorOptions::default(),
		));
		assert!(line.contains("-XX:MaxDirectMemorySize=39m"));
		assert!(line.contains("-XX:MetaspaceSize=210m"));
		assert!(line.contains("-XX:MaxMetaspaceSize=210m"));
		assert!(line.contains("-XX:CompressedClassSpaceSize=60m"));
	}

	#[test]
	fn fractional_stack_size_in_kilobytes() {
		assert_eq!(stack_size(1.0), "1M");
		assert_eq!(stack_size(0.5), "512k");
		assert_eq!(stack_size(1.25), "1280k");
	}

	#[test]
	fn rationale_is_static_per_flag() {
		let small = advise(&SizingInput::default(), AdvisorOptions::default());
		let large = advise(
			&SizingInput {
				heap_size_mb: 4096,
				..Default::default()
			},
			AdvisorOptions::default(),
		);
		for (a, b) in small.iter().zip(large.iter()) {
			assert_eq!(a.flag, b.flag);
			assert_eq!(a.rationale, b.rationale);
			assert!(!a.rationale.is_empty());
		}
	}

	#[test]
	fn advice_is_idempotent() {
		let input = SizingInput::default();
		assert_eq!(advise(&input, AdvisorOptions::default()), advise(&input, AdvisorOptions::default()));
	}
}
