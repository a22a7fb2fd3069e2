use crate::advisor::AdvisorOptions;
use crate::clipboard::{Clipboard, CopyOutcome, SystemClipboard};
use crate::input::{GcStrategy, SizingInput};
use crate::profile::{MarginKind, ProfileName, SizingProfile};
use crate::result::Report;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs::File;
use std::io::{IsTerminal, Write};

// Estimation modules
mod advisor;
mod container;
mod gc;
mod input;
mod memory;
mod profile;

// Output modules
mod chart;
mod clipboard;
mod result;
mod system;

/// Largest heap or direct memory accepted, in MB (16 TB)
const MAX_HEAP_MB: u64 = 16 * 1024 * 1024;
/// Largest number of application threads accepted
const MAX_THREADS: u64 = 1_000_000;
/// Largest number of loaded classes accepted
const MAX_CLASSES: u64 = 100_000_000;
/// The JVM caps the reserved code cache at 2 GB
const MAX_CODE_CACHE_MB: u64 = 2048;
/// Largest thread stack accepted in MB
const MAX_STACK_MB: f64 = 1024.0;

/// Estimate the memory footprint of a JVM and the options to run it with
#[derive(Parser, Debug)]
#[command(term_width = 0)]
pub(crate) struct Args {
	/// An optional name, used as a suffix for the output file names
	#[arg(short, long)]
	pub(crate) name: Option<String>,

	/// Desired maximum heap size in MB
	#[arg(long, env = "JVM_MEMCALC_HEAP", default_value = "384", value_parser=clap::value_parser!(u64).range(1..=MAX_HEAP_MB))]
	pub(crate) heap: u64,

	/// Number of threads the application runs
	#[arg(short, long, env = "JVM_MEMCALC_THREADS", default_value = "85", value_parser=clap::value_parser!(u64).range(1..=MAX_THREADS))]
	pub(crate) threads: u64,

	/// Number of loaded classes
	#[arg(short, long, env = "JVM_MEMCALC_CLASSES", default_value = "30000", value_parser=clap::value_parser!(u64).range(0..=MAX_CLASSES))]
	pub(crate) classes: u64,

	/// Stack size per thread in MB
	#[arg(short, long, env = "JVM_MEMCALC_STACK", default_value = "1", value_parser=parse_stack_size)]
	pub(crate) stack: f64,

	/// Reserved code cache in MB
	#[arg(long, env = "JVM_MEMCALC_CODE_CACHE", default_value = "64", value_parser=clap::value_parser!(u64).range(1..=MAX_CODE_CACHE_MB))]
	pub(crate) code_cache: u64,

	/// Maximum direct memory in MB
	#[arg(short, long, env = "JVM_MEMCALC_DIRECT_MEMORY", default_value = "10", value_parser=clap::value_parser!(u64).range(0..=MAX_HEAP_MB))]
	pub(crate) direct_memory: u64,

	/// The garbage collector to size for
	#[arg(short, long, env = "JVM_MEMCALC_GC", default_value_t = GcStrategy::RegionBased, value_enum)]
	pub(crate) gc: GcStrategy,

	/// Share of the container memory limit the JVM should occupy, in percent
	#[arg(long, env = "JVM_MEMCALC_TARGET_UTILIZATION", value_parser=clap::value_parser!(u32).range(1..=100))]
	pub(crate) target_utilization: Option<u32>,

	/// The set of sizing ratios to use
	#[arg(short, long, env = "JVM_MEMCALC_PROFILE", default_value_t = ProfileName::Java21, value_enum)]
	pub(crate) profile: ProfileName,

	/// Override the safety margin policy of the selected profile
	#[arg(short, long, env = "JVM_MEMCALC_MARGIN", value_enum)]
	pub(crate) margin: Option<MarginKind>,

	/// Include the G1 young-size and region-size hints
	#[arg(long)]
	pub(crate) verbose_g1: bool,

	/// Include explicit metaspace and compressed class space limits
	#[arg(long)]
	pub(crate) metaspace_hints: bool,

	/// Copy the JVM command line to the clipboard
	#[arg(long)]
	pub(crate) copy: bool,

	/// Do not compare the estimate with the memory of this host
	#[arg(long)]
	pub(crate) no_host_check: bool,

	/// Do not write the JSON, CSV and HTML result files
	#[arg(long)]
	pub(crate) no_files: bool,
}

fn parse_stack_size(value: &str) -> Result<f64, String> {
	let size: f64 = value.parse().map_err(|e| format!("{e}"))?;
	match size.is_finite() && size > 0.0 && size <= MAX_STACK_MB {
		true => Ok(size),
		false => Err(format!("stack size must be between 0 and {MAX_STACK_MB} MB, got {value}")),
	}
}

impl Args {
	/// The sizing input described by these arguments
	pub(crate) fn input(&self) -> SizingInput {
		SizingInput {
			heap_size_mb: self.heap,
			thread_count: self.threads,
			loaded_class_count: self.classes,
			stack_size_per_thread_mb: self.stack,
			code_cache_mb: self.code_cache,
			direct_memory_mb: self.direct_memory,
			gc_strategy: self.gc,
			target_utilization_percent: self.target_utilization,
		}
	}

	/// The sizing profile, with any margin override applied
	pub(crate) fn profile(&self) -> SizingProfile {
		let profile = SizingProfile::new(self.profile);
		match self.margin {
			Some(margin) => profile.with_margin_policy(margin.into()),
			None => profile,
		}
	}

	pub(crate) fn options(&self) -> AdvisorOptions {
		AdvisorOptions {
			verbose_g1: self.verbose_g1,
			metaspace_hints: self.metaspace_hints,
		}
	}

	fn output_name(&self, kind: &str, ext: &str) -> String {
		self.name
			.as_ref()
			.map(|s| format!("{kind}-{s}.{ext}"))
			.unwrap_or_else(|| format!("{kind}.{ext}"))
	}
}

fn main() -> Result<()> {
	// Initialise the logger
	env_logger::init();
	// Parse the command line arguments
	let args = Args::parse();
	// Run the estimation
	run(args, &mut SystemClipboard::default()).map(|_| ())
}

fn run<C: Clipboard + ?Sized>(args: Args, clipboard: &mut C) -> Result<Report> {
	// Prepare the estimation
	let input = args.input();
	let profile = args.profile();
	debug!("Estimating with {input:?}");
	info!(
		"Using the {} profile with a margin {}",
		profile.name.name(),
		profile.margin_policy
	);
	// Compute the breakdown and the recommendations
	let mut report = Report::new(input, profile, args.options());
	// Compare the estimate with this host
	if !args.no_host_check {
		report = report.with_host(system::collect());
	}
	// Display formatting
	let terminal = std::io::stdout().is_terminal();
	if terminal {
		println!("--------------------------------------------------");
	}
	println!("{report}");
	if terminal {
		println!("--------------------------------------------------");
	}
	// Copy the command line if requested
	if args.copy {
		let outcome = crate::clipboard::copy_command_line(clipboard, &report.command_line);
		match &outcome {
			CopyOutcome::Copied {
				..
			} => println!("📋 {outcome}"),
			CopyOutcome::Failed {
				..
			} => eprintln!("⚠️ {outcome}"),
		}
		report.clipboard = Some(outcome);
	}
	// Write the result files
	if !args.no_files {
		write_files(&args, &report)?;
	}
	Ok(report)
}

fn write_files(args: &Args, report: &Report) -> Result<()> {
	// Serialize the report to a JSON string
	let json_string = serde_json::to_string_pretty(report)?;
	// Write the JSON string to a file
	let result_name = args.output_name("report", "json");
	let mut file = File::create(&result_name).with_context(|| format!("creating {result_name}"))?;
	file.write_all(json_string.as_bytes())?;
	// Write the CSV file
	let result_csv_name = args.output_name("report", "csv");
	report.to_csv(&result_csv_name).with_context(|| format!("writing {result_csv_name}"))?;
	// Write the HTML chart file
	let result_html_name = args.output_name("report", "html");
	let mut file =
		File::create(&result_html_name).with_context(|| format!("creating {result_html_name}"))?;
	file.write_all(chart::generate_html(report).as_bytes())?;
	println!("📊 Memory chart saved to: {result_html_name}");
	Ok(())
}

#[cfg(test)]
mod test {
	use crate::clipboard::{Clipboard, CopyOutcome};
	use crate::profile::MarginPolicy;
	use crate::{Args, GcStrategy, MAX_HEAP_MB, MarginKind, ProfileName};
	use anyhow::{Result, bail};
	use clap::Parser;
	use serial_test::serial;

	/// A clipboard that keeps what it receives
	#[derive(Default)]
	struct Recording(Vec<String>);

	impl Clipboard for Recording {
		fn write_text(&mut self, text: &str) -> Result<String> {
			self.0.push(text.to_string());
			Ok("memory".to_string())
		}
	}

	struct Locked;

	impl Clipboard for Locked {
		fn write_text(&mut self, _: &str) -> Result<String> {
			bail!("clipboard is locked")
		}
	}

	fn args(extra: &[&str]) -> Args {
		let mut argv = vec!["jvm-memcalc", "--no-files", "--no-host-check"];
		argv.extend_from_slice(extra);
		Args::try_parse_from(argv).unwrap()
	}

	fn run(args: Args) -> Result<crate::Report> {
		crate::run(args, &mut Recording::default())
	}

	#[test]
	fn defaults_match_reference_form() {
		let args = args(&[]);
		let input = args.input();
		assert_eq!(input.heap_size_mb, 384);
		assert_eq!(input.thread_count, 85);
		assert_eq!(input.loaded_class_count, 30000);
		assert_eq!(input.stack_size_per_thread_mb, 1.0);
		assert_eq!(input.code_cache_mb, 64);
		assert_eq!(input.direct_memory_mb, 10);
		assert_eq!(input.gc_strategy, GcStrategy::RegionBased);
		assert_eq!(input.target_utilization_percent, None);
		assert_eq!(args.profile, ProfileName::Java21);
		assert!(args.margin.is_none());
	}

	#[test]
	fn invalid_values_are_rejected() {
		for bad in [
			vec!["jvm-memcalc", "--heap", "0"],
			vec!["jvm-memcalc", "--stack", "-1"],
			vec!["jvm-memcalc", "--stack", "NaN"],
			vec!["jvm-memcalc", "--target-utilization", "150"],
			vec!["jvm-memcalc", "--gc", "serial"],
			vec!["jvm-memcalc", "--heap", "18446744073709551615"],
			vec!["jvm-memcalc", "--heap", "16777217"],
			vec!["jvm-memcalc", "--threads", "1000001"],
			vec!["jvm-memcalc", "--classes", "100000001"],
			vec!["jvm-memcalc", "--code-cache", "2049"],
			vec!["jvm-memcalc", "--direct-memory", "18446744073709551615"],
			vec!["jvm-memcalc", "--stack", "1e300"],
		] {
			assert!(Args::try_parse_from(bad.clone()).is_err(), "accepted {bad:?}");
		}
	}

	#[test]
	fn largest_accepted_values_run() -> Result<()> {
		let heap = MAX_HEAP_MB.to_string();
		let report = run(args(&[
			"--heap",
			&heap,
			"--direct-memory",
			&heap,
			"--threads",
			"1000000",
			"--classes",
			"100000000",
			"--code-cache",
			"2048",
			"--stack",
			"1024",
			"--target-utilization",
			"1",
		]))?;
		let b = &report.breakdown;
		assert_eq!(b.young_gen_mb + b.old_gen_mb, MAX_HEAP_MB);
		assert_eq!(b.total_mb % 8, 0);
		assert!(b.total_mb >= b.subtotal_mb);
		assert!(report.container.memory_limit_mi >= b.total_mb);
		Ok(())
	}

	#[test]
	fn copy_hands_the_command_line_to_the_clipboard() -> Result<()> {
		let mut clipboard = Recording::default();
		let report = crate::run(args(&["--copy"]), &mut clipboard)?;
		assert_eq!(clipboard.0, vec![report.command_line.clone()]);
		assert_eq!(
			report.clipboard,
			Some(CopyOutcome::Copied {
				tool: "memory".to_string()
			})
		);
		Ok(())
	}

	#[test]
	fn copy_failure_does_not_fail_the_run() -> Result<()> {
		let report = crate::run(args(&["--copy"]), &mut Locked)?;
		assert_eq!(
			report.clipboard,
			Some(CopyOutcome::Failed {
				reason: "clipboard is locked".to_string()
			})
		);
		assert_eq!(report.breakdown.total_mb, 776);
		// Without --copy the clipboard is left alone
		let mut clipboard = Recording::default();
		let report = crate::run(args(&[]), &mut clipboard)?;
		assert!(clipboard.0.is_empty());
		assert!(report.clipboard.is_none());
		Ok(())
	}

	#[test]
	fn margin_override_is_applied() {
		let args = args(&["--margin", "percent"]);
		assert_eq!(args.margin, Some(MarginKind::Percent));
		assert_eq!(args.profile().margin_policy, MarginPolicy::from(MarginKind::Percent));
	}

	#[test]
	fn run_region_based() -> Result<()> {
		let report = run(args(&[]))?;
		assert_eq!(report.breakdown.young_gen_mb, 154);
		assert_eq!(report.breakdown.total_mb, 776);
		assert!(report.command_line.contains("-Xmx384m"));
		assert!(report.host.is_none());
		Ok(())
	}

	#[test]
	fn run_low_latency_classic() -> Result<()> {
		let report = run(args(&[
			"--gc",
			"zgc",
			"--profile",
			"classic",
			"--heap",
			"512",
			"--classes",
			"10000",
			"--target-utilization",
			"80",
		]))?;
		assert_eq!(report.breakdown.young_gen_mb, 169);
		assert_eq!(report.breakdown.metaspace_mb, 70);
		assert!(report.command_line.contains("-XX:+UseZGC"));
		assert!(report.command_line.starts_with("-Xms256m -Xmx512m"));
		assert!(report.command_line.contains("-XX:MaxDirectMemorySize=52m"));
		assert!(report.command_line.contains("-XX:MetaspaceSize=70m"));
		assert_eq!(report.container.target_utilization_percent, 80);
		Ok(())
	}

	#[test]
	#[serial]
	fn run_writes_result_files() -> Result<()> {
		let args = Args::try_parse_from([
			"jvm-memcalc",
			"--name",
			"unit-test",
			"--verbose-g1",
			"--metaspace-hints",
		])?;
		let report = run(args)?;
		assert!(report.host.is_some());
		for file in ["report-unit-test.json", "report-unit-test.csv", "report-unit-test.html"] {
			let content = std::fs::read_to_string(file)?;
			std::fs::remove_file(file)?;
			assert!(!content.is_empty(), "{file} is empty");
			if file.ends_with(".json") {
				let json: serde_json::Value = serde_json::from_str(&content)?;
				assert_eq!(json["breakdown"]["total_mb"], 776);
				assert_eq!(json["options"]["verbose_g1"], true);
			}
		}
		assert!(report.command_line.contains("-XX:G1HeapRegionSize=1m"));
		assert!(report.command_line.contains("-XX:MetaspaceSize=150m"));
		Ok(())
	}
}
