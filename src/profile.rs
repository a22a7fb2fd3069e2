use crate::input::GcStrategy;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const BASIS_POINTS: u128 = 10_000;

/// An exact decimal fraction, stored in basis points.
///
/// Every sizing ratio is a whole number of basis points, so keeping them as
/// integers makes the ceiling and floor operations exact and avoids the
/// off-by-one results binary floating point produces on values such as
/// `0.7 * 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "f64")]
pub(crate) struct Ratio(u64);

impl Ratio {
	pub(crate) const fn basis_points(bp: u64) -> Self {
		Self(bp)
	}

	pub(crate) const fn percent(pct: u64) -> Self {
		Self(pct * 100)
	}

	/// `ceil(value * ratio)`, saturating at `u64::MAX`
	pub(crate) fn ceil_of(&self, value: u64) -> u64 {
		saturate((value as u128 * self.0 as u128).div_ceil(BASIS_POINTS))
	}

	/// `floor(value * ratio)`, saturating at `u64::MAX`
	pub(crate) fn floor_of(&self, value: u64) -> u64 {
		saturate(value as u128 * self.0 as u128 / BASIS_POINTS)
	}
}

fn saturate(value: u128) -> u64 {
	u64::try_from(value).unwrap_or(u64::MAX)
}

impl From<Ratio> for f64 {
	fn from(ratio: Ratio) -> Self {
		ratio.0 as f64 / BASIS_POINTS as f64
	}
}

impl Display for Ratio {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}%", self.0 as f64 / 100.0)
	}
}

/// How the safety margin on top of the subtotal is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub(crate) enum MarginPolicy {
	/// Round the subtotal up to the next multiple of `boundary_mb`
	Alignment {
		boundary_mb: u64,
	},
	/// Add a flat share of the subtotal, rounded up
	FixedPercentage {
		ratio: Ratio,
	},
}

impl MarginPolicy {
	/// Returns the total memory once the margin is applied to `subtotal_mb`
	pub(crate) fn apply(&self, subtotal_mb: u64) -> u64 {
		match self {
			Self::Alignment {
				boundary_mb: 0,
			} => subtotal_mb,
			Self::Alignment {
				boundary_mb,
			} => subtotal_mb.div_ceil(*boundary_mb).saturating_mul(*boundary_mb),
			Self::FixedPercentage {
				ratio,
			} => subtotal_mb.saturating_add(ratio.ceil_of(subtotal_mb)),
		}
	}
}

impl Display for MarginPolicy {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Alignment {
				boundary_mb,
			} => write!(f, "aligned to {boundary_mb} MB"),
			Self::FixedPercentage {
				ratio,
			} => write!(f, "{ratio} of subtotal"),
		}
	}
}

/// The margin policy selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarginKind {
	/// Round the subtotal up to a multiple of 8 MB
	Align,
	/// Add 10% of the subtotal
	Percent,
}

impl From<MarginKind> for MarginPolicy {
	fn from(kind: MarginKind) -> Self {
		match kind {
			MarginKind::Align => Self::Alignment {
				boundary_mb: 8,
			},
			MarginKind::Percent => Self::FixedPercentage {
				ratio: Ratio::percent(10),
			},
		}
	}
}

/// The named ratio sets the estimator can run with
#[derive(ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ProfileName {
	/// Ratios tuned for Java 21 with G1 or ZGC, 8 MB aligned total
	#[default]
	Java21,
	/// The earlier, more conservative ratios with a flat 10% margin
	Classic,
}

impl ProfileName {
	pub(crate) fn name(&self) -> &'static str {
		match self {
			Self::Java21 => "java21",
			Self::Classic => "classic",
		}
	}
}

/// A versioned set of sizing constants, chosen once when the estimator is set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct SizingProfile {
	pub(crate) name: ProfileName,
	pub(crate) young_ratio_region_based: Ratio,
	pub(crate) young_ratio_low_latency: Ratio,
	pub(crate) metaspace_ratio: Ratio,
	pub(crate) compressed_class_ratio: Ratio,
	pub(crate) native_ratio: Ratio,
	pub(crate) overhead_ratio: Ratio,
	/// Share of the heap reserved for direct buffers, used when it exceeds
	/// the requested direct memory
	pub(crate) direct_memory_ratio: Option<Ratio>,
	/// Share of the maximum heap suggested as the initial heap
	pub(crate) initial_heap_ratio: Ratio,
	pub(crate) margin_policy: MarginPolicy,
	/// Always emit the metaspace and compressed class space limits
	pub(crate) metaspace_hints: bool,
}

impl SizingProfile {
	pub(crate) const JAVA21: Self = Self {
		name: ProfileName::Java21,
		young_ratio_region_based: Ratio::percent(40),
		young_ratio_low_latency: Ratio::percent(25),
		metaspace_ratio: Ratio::basis_points(50),
		compressed_class_ratio: Ratio::basis_points(15),
		native_ratio: Ratio::percent(3),
		overhead_ratio: Ratio::percent(3),
		direct_memory_ratio: None,
		initial_heap_ratio: Ratio::percent(70),
		margin_policy: MarginPolicy::Alignment {
			boundary_mb: 8,
		},
		metaspace_hints: false,
	};

	pub(crate) const CLASSIC: Self = Self {
		name: ProfileName::Classic,
		young_ratio_region_based: Ratio::percent(33),
		young_ratio_low_latency: Ratio::percent(33),
		metaspace_ratio: Ratio::basis_points(70),
		compressed_class_ratio: Ratio::basis_points(20),
		native_ratio: Ratio::percent(5),
		overhead_ratio: Ratio::percent(5),
		direct_memory_ratio: Some(Ratio::percent(10)),
		initial_heap_ratio: Ratio::percent(50),
		margin_policy: MarginPolicy::FixedPercentage {
			ratio: Ratio::percent(10),
		},
		metaspace_hints: true,
	};

	pub(crate) fn new(name: ProfileName) -> Self {
		match name {
			ProfileName::Java21 => Self::JAVA21,
			ProfileName::Classic => Self::CLASSIC,
		}
	}

	/// Replaces the profile's own margin policy
	pub(crate) fn with_margin_policy(self, margin_policy: MarginPolicy) -> Self {
		Self {
			margin_policy,
			..self
		}
	}

	/// The young generation share of the heap for the given collector
	pub(crate) fn young_ratio(&self, gc: GcStrategy) -> Ratio {
		match gc {
			GcStrategy::RegionBased => self.young_ratio_region_based,
			GcStrategy::LowLatency => self.young_ratio_low_latency,
		}
	}

	/// The direct memory to plan for: the requested amount, raised to the
	/// profile's share of the heap when it has one
	pub(crate) fn direct_memory_mb(&self, heap_size_mb: u64, requested_mb: u64) -> u64 {
		match self.direct_memory_ratio {
			Some(ratio) => requested_mb.max(ratio.ceil_of(heap_size_mb)),
			None => requested_mb,
		}
	}
}

impl Default for SizingProfile {
	fn default() -> Self {
		Self::JAVA21
	}
}
