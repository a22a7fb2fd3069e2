use crate::input::SizingInput;
use crate::profile::SizingProfile;
use serde::Serialize;

/// The estimated memory footprint of a JVM, in MB.
///
/// A breakdown is always derived in one go from a [`SizingInput`] and is
/// never updated in place: a new input means a new breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct MemoryBreakdown {
	pub(crate) heap_size_mb: u64,
	pub(crate) young_gen_mb: u64,
	pub(crate) old_gen_mb: u64,
	pub(crate) metaspace_mb: u64,
	pub(crate) code_cache_mb: u64,
	pub(crate) thread_stacks_mb: u64,
	pub(crate) compressed_class_space_mb: u64,
	pub(crate) total_non_heap_mb: u64,
	pub(crate) direct_memory_mb: u64,
	pub(crate) native_memory_mb: u64,
	pub(crate) jvm_overhead_mb: u64,
	pub(crate) total_other_mb: u64,
	pub(crate) subtotal_mb: u64,
	pub(crate) safety_margin_mb: u64,
	/// Margin relative to the subtotal, rounded to two decimals
	pub(crate) safety_margin_percent: f64,
	pub(crate) total_mb: u64,
}

/// Estimates the memory footprint for the given input
pub(crate) fn compute_breakdown(input: &SizingInput, profile: &SizingProfile) -> MemoryBreakdown {
	let heap = input.heap_size_mb;
	// Heap
	let young_gen_mb = profile.young_ratio(input.gc_strategy).ceil_of(heap);
	let old_gen_mb = heap.saturating_sub(young_gen_mb);
	// Non-heap
	let metaspace_mb = profile.metaspace_ratio.ceil_of(input.loaded_class_count);
	let code_cache_mb = input.code_cache_mb;
	let thread_stacks_mb = thread_stacks_mb(input.thread_count, input.stack_size_per_thread_mb);
	let compressed_class_space_mb = profile.compressed_class_ratio.ceil_of(input.loaded_class_count);
	let total_non_heap_mb =
		sum(&[metaspace_mb, code_cache_mb, thread_stacks_mb, compressed_class_space_mb]);
	// Other
	let direct_memory_mb = profile.direct_memory_mb(heap, input.direct_memory_mb);
	let native_memory_mb = profile.native_ratio.ceil_of(heap.saturating_add(total_non_heap_mb));
	let jvm_overhead_mb = profile.overhead_ratio.ceil_of(heap);
	let total_other_mb = sum(&[direct_memory_mb, native_memory_mb, jvm_overhead_mb]);
	// Total
	let subtotal_mb = sum(&[heap, total_non_heap_mb, total_other_mb]);
	let total_mb = profile.margin_policy.apply(subtotal_mb);
	let safety_margin_mb = total_mb - subtotal_mb;

	MemoryBreakdown {
		heap_size_mb: heap,
		young_gen_mb,
		old_gen_mb,
		metaspace_mb,
		code_cache_mb,
		thread_stacks_mb,
		compressed_class_space_mb,
		total_non_heap_mb,
		direct_memory_mb,
		native_memory_mb,
		jvm_overhead_mb,
		total_other_mb,
		subtotal_mb,
		safety_margin_mb,
		safety_margin_percent: margin_percent(safety_margin_mb, subtotal_mb),
		total_mb,
	}
}

// Out of range inputs pin the figures at `u64::MAX` rather than wrapping
fn sum(values: &[u64]) -> u64 {
	values.iter().fold(0, |acc, v| acc.saturating_add(*v))
}

// Whole MB stack sizes multiply exactly; fractional ones are rounded up.
fn thread_stacks_mb(threads: u64, stack_size_mb: f64) -> u64 {
	let stacks = threads as f64 * stack_size_mb;
	if stacks.is_finite() && stacks > 0.0 {
		stacks.ceil() as u64
	} else {
		0
	}
}

fn margin_percent(margin_mb: u64, subtotal_mb: u64) -> f64 {
	if subtotal_mb == 0 {
		return 0.0;
	}
	let percent = margin_mb as f64 / subtotal_mb as f64 * 100.0;
	(percent * 100.0).round() / 100.0
}

impl MemoryBreakdown {
	/// The four slices shown in the memory distribution chart
	pub(crate) fn slices(&self) -> [(&'static str, u64); 4] {
		[
			("Heap", self.heap_size_mb),
			("Non-Heap", self.total_non_heap_mb),
			("Other", self.total_other_mb),
			("Safety Margin", self.safety_margin_mb),
		]
	}

	/// Every individual region, grouped by area, in display order
	pub(crate) fn regions(&self) -> [(&'static str, &'static str, u64); 9] {
		[
			("Heap", "Young Generation", self.young_gen_mb),
			("Heap", "Old Generation", self.old_gen_mb),
			("Non-Heap", "Metaspace", self.metaspace_mb),
			("Non-Heap", "Code Cache", self.code_cache_mb),
			("Non-Heap", "Thread Stacks", self.thread_stacks_mb),
			("Non-Heap", "Compressed Class", self.compressed_class_space_mb),
			("Other", "Direct Buffers", self.direct_memory_mb),
			("Other", "Native Memory", self.native_memory_mb),
			("Other", "JVM Overhead", self.jvm_overhead_mb),
		]
	}
}
