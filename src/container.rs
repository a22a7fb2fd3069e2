use crate::input::SizingInput;
use crate::memory::MemoryBreakdown;
use crate::profile::Ratio;
use serde::Serialize;

const MEMORY_REQUEST_RATIO: Ratio = Ratio::percent(75);
const CPU_REQUEST_PER_THREAD: Ratio = Ratio::percent(10);
const CPU_LIMIT_PER_THREAD: Ratio = Ratio::percent(20);

/// Requests and limits for the container running the JVM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ContainerRecommendation {
	pub(crate) memory_request_mi: u64,
	pub(crate) memory_limit_mi: u64,
	pub(crate) cpu_request_cores: u64,
	pub(crate) cpu_limit_cores: u64,
	/// The utilisation the limit was sized for, after clamping
	pub(crate) target_utilization_percent: u32,
}

/// Size the container around the estimated JVM footprint.
///
/// The memory limit is chosen so that the recommended total fills at most
/// the target utilisation of it; without a target the limit equals the
/// total. Targets outside `1..=100` are clamped into that range.
pub(crate) fn recommend_container(
	input: &SizingInput,
	breakdown: &MemoryBreakdown,
) -> ContainerRecommendation {
	let target = input.target_utilization_percent.unwrap_or(100).clamp(1, 100);
	let total = breakdown.total_mb;
	ContainerRecommendation {
		memory_request_mi: MEMORY_REQUEST_RATIO.ceil_of(total),
		memory_limit_mi: memory_limit_mi(total, target),
		cpu_request_cores: CPU_REQUEST_PER_THREAD.ceil_of(input.thread_count),
		cpu_limit_cores: CPU_LIMIT_PER_THREAD.ceil_of(input.thread_count),
		target_utilization_percent: target,
	}
}

fn memory_limit_mi(total_mb: u64, target_percent: u32) -> u64 {
	let limit = (total_mb as u128 * 100).div_ceil(target_percent as u128);
	u64::try_from(limit).unwrap_or(u64::MAX)
}
