use crate::advisor::{AdvisorOptions, ParameterRecommendation};
use crate::input::{GcStrategy, SizingInput};
use crate::memory::MemoryBreakdown;

/// Pause time goal handed to G1, in milliseconds
const MAX_PAUSE_MILLIS: u64 = 200;
/// Headroom ZGC keeps for allocation bursts
const ALLOCATION_SPIKE_TOLERANCE: u64 = 2;
/// Heap size covered by each MB of suggested G1 region size
const HEAP_MB_PER_REGION_MB: u64 = 2048;

/// The collector block of the recommendations
pub(crate) fn recommendations(
	strategy: GcStrategy,
	input: &SizingInput,
	breakdown: &MemoryBreakdown,
	options: &AdvisorOptions,
) -> Vec<ParameterRecommendation> {
	match strategy {
		GcStrategy::RegionBased => region_based(input, breakdown, options),
		GcStrategy::LowLatency => low_latency(),
	}
}

fn region_based(
	input: &SizingInput,
	breakdown: &MemoryBreakdown,
	options: &AdvisorOptions,
) -> Vec<ParameterRecommendation> {
	let mut out = vec![ParameterRecommendation::switch(
		"-XX:+UseG1GC",
		"G1 is the default garbage collector in Java 21. It divides the heap into regions, which suits heaps larger than 4GB and applications requiring predictable pause times.",
	)];
	if options.verbose_g1 {
		out.push(ParameterRecommendation::assigned(
			"-XX:G1NewSizePercent",
			young_percent(breakdown.young_gen_mb, input.heap_size_mb),
			"Minimum share of the heap used for the young generation, matching the estimated young generation. This is an experimental option and needs -XX:+UnlockExperimentalVMOptions.",
		));
	}
	out.push(ParameterRecommendation::assigned(
		"-XX:MaxGCPauseMillis",
		MAX_PAUSE_MILLIS,
		"Sets the maximum pause time goal for G1 collections in milliseconds. G1 will attempt to adjust its behavior to keep pauses below this value. A lower value results in shorter pauses but may reduce throughput.",
	));
	if options.verbose_g1 {
		out.push(ParameterRecommendation::assigned(
			"-XX:G1HeapRegionSize",
			format!("{}m", region_size_mb(input.heap_size_mb)),
			"Size of each G1 region. Larger heaps benefit from larger regions, which keeps the number of regions manageable and reduces humongous allocations.",
		));
	}
	out
}

fn low_latency() -> Vec<ParameterRecommendation> {
	vec![
		ParameterRecommendation::switch(
			"-XX:+UseZGC",
			"ZGC is a scalable, low-latency garbage collector that keeps pauses below 1ms regardless of heap size. It is ideal for applications that need consistent response times and can spare more CPU and memory.",
		),
		ParameterRecommendation::assigned(
			"-XX:ZAllocationSpikeTolerance",
			ALLOCATION_SPIKE_TOLERANCE,
			"Controls how much extra space ZGC reserves for allocation spikes. A higher value increases tolerance for spikes but uses more memory. A value of 2 is a good balance for most applications.",
		),
	]
}

fn young_percent(young_gen_mb: u64, heap_size_mb: u64) -> u64 {
	match heap_size_mb {
		0 => 0,
		heap => (young_gen_mb as u128 * 100 / heap as u128) as u64,
	}
}

fn region_size_mb(heap_size_mb: u64) -> u64 {
	(heap_size_mb / HEAP_MB_PER_REGION_MB).max(1)
}
