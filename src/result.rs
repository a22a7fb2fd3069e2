use crate::advisor::{self, AdvisorOptions, ParameterRecommendation};
use crate::clipboard::CopyOutcome;
use crate::container::{self, ContainerRecommendation};
use crate::input::SizingInput;
use crate::memory::{self, MemoryBreakdown};
use crate::profile::SizingProfile;
use crate::system::{HostFit, SystemInfo};
use bytesize::ByteSize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use csv::Writer;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const MB: u64 = 1024 * 1024;

const MEMORY_HEADERS: [&str; 4] = ["Area", "Region", "Memory", "Size"];

const PARAMETER_HEADERS: [&str; 2] = ["Parameter", "Rationale"];

const CONTAINER_HEADERS: [&str; 3] = ["Resource", "Request", "Limit"];

const CSV_HEADERS: [&str; 4] = ["Section", "Name", "Value", "Detail"];

/// Everything computed for one set of sizing inputs
#[derive(Debug, Serialize)]
pub(crate) struct Report {
	pub(crate) profile: SizingProfile,
	pub(crate) options: AdvisorOptions,
	pub(crate) input: SizingInput,
	pub(crate) breakdown: MemoryBreakdown,
	pub(crate) parameters: Vec<ParameterRecommendation>,
	pub(crate) command_line: String,
	pub(crate) container: ContainerRecommendation,
	pub(crate) host: Option<SystemInfo>,
	pub(crate) host_fit: Option<HostFit>,
	/// Set when the command line was copied, or the copy was attempted
	pub(crate) clipboard: Option<CopyOutcome>,
}

impl Report {
	/// Run the estimator and the advisors for the given input
	pub(crate) fn new(input: SizingInput, profile: SizingProfile, options: AdvisorOptions) -> Self {
		let breakdown = memory::compute_breakdown(&input, &profile);
		let parameters = advisor::recommend_parameters(&input, &breakdown, &profile, &options);
		let command_line = advisor::command_line(&parameters);
		let container = container::recommend_container(&input, &breakdown);
		Self {
			profile,
			options,
			input,
			breakdown,
			parameters,
			command_line,
			container,
			host: None,
			host_fit: None,
			clipboard: None,
		}
	}

	/// Attach the host the report was produced on
	pub(crate) fn with_host(mut self, host: SystemInfo) -> Self {
		self.host_fit = Some(crate::system::check_fit(self.breakdown.total_mb, &host));
		self.host = Some(host);
		self
	}

	fn memory_table(&self) -> Table {
		let mut table = new_table(&MEMORY_HEADERS);
		let b = &self.breakdown;
		let mut area_row = |area: &str, total: u64| {
			let cells = vec![
				Cell::new(area).add_attribute(Attribute::Bold),
				Cell::new("Total").add_attribute(Attribute::Bold),
				Cell::new(format!("{total} MB")).add_attribute(Attribute::Bold),
				Cell::new(human_size(total)),
			];
			table.add_row(cells);
		};
		area_row("Heap", b.heap_size_mb);
		area_row("Non-Heap", b.total_non_heap_mb);
		area_row("Other", b.total_other_mb);
		for (area, region, mb) in b.regions() {
			table.add_row(vec![
				area.to_string(),
				region.to_string(),
				format!("{mb} MB"),
				human_size(mb),
			]);
		}
		table.add_row(vec![
			"Total".to_string(),
			"Subtotal".to_string(),
			format!("{} MB", b.subtotal_mb),
			human_size(b.subtotal_mb),
		]);
		table.add_row(vec![
			"Total".to_string(),
			format!("Safety margin ({:.2}%, {})", b.safety_margin_percent, self.profile.margin_policy),
			format!("{} MB", b.safety_margin_mb),
			human_size(b.safety_margin_mb),
		]);
		table.add_row(vec![
			Cell::new("Total").add_attribute(Attribute::Bold),
			Cell::new("Recommended").add_attribute(Attribute::Bold),
			Cell::new(format!("{} MB", b.total_mb)).add_attribute(Attribute::Bold).fg(Color::Green),
			Cell::new(human_size(b.total_mb)),
		]);
		// Right align the `Memory` and `Size` columns
		for idx in [2, 3] {
			if let Some(column) = table.column_mut(idx) {
				column.set_cell_alignment(CellAlignment::Right);
			}
		}
		table
	}

	fn parameter_table(&self) -> Table {
		let mut table = new_table(&PARAMETER_HEADERS);
		for p in &self.parameters {
			table.add_row(vec![Cell::new(p.token()).add_attribute(Attribute::Bold), Cell::new(&p.rationale)]);
		}
		table
	}

	fn container_table(&self) -> Table {
		let mut table = new_table(&CONTAINER_HEADERS);
		let c = &self.container;
		table.add_row(vec![
			format!("Memory ({}% target)", c.target_utilization_percent),
			format!("{}Mi", c.memory_request_mi),
			format!("{}Mi", c.memory_limit_mi),
		]);
		table.add_row(vec![
			"CPU".to_string(),
			format!("{} cores", c.cpu_request_cores),
			format!("{} cores", c.cpu_limit_cores),
		]);
		table
	}

	pub(crate) fn to_csv(&self, path: &str) -> Result<(), csv::Error> {
		let mut w = Writer::from_path(path)?;
		// Write headers
		w.write_record(CSV_HEADERS)?;
		// Add the memory regions to the output
		for (area, region, mb) in self.breakdown.regions() {
			w.write_record(csv_row("memory", region, mb, area))?;
		}
		let b = &self.breakdown;
		let margin = format!("{:.2}%", b.safety_margin_percent);
		w.write_record(csv_row("memory", "Subtotal", b.subtotal_mb, "Total"))?;
		w.write_record(csv_row("memory", "Safety Margin", b.safety_margin_mb, &margin))?;
		w.write_record(csv_row("memory", "Total", b.total_mb, "Total"))?;
		// Add the JVM parameters to the output
		for p in &self.parameters {
			w.write_record(csv_row("parameter", &p.flag, &p.value, &p.token()))?;
		}
		// Add the container sizing to the output
		let c = &self.container;
		w.write_record(csv_row("container", "Memory request", c.memory_request_mi, "Mi"))?;
		w.write_record(csv_row("container", "Memory limit", c.memory_limit_mi, "Mi"))?;
		w.write_record(csv_row("container", "CPU request", c.cpu_request_cores, "cores"))?;
		w.write_record(csv_row("container", "CPU limit", c.cpu_limit_cores, "cores"))?;
		// Ensure all data is flushed to the file
		w.flush()?;
		Ok(())
	}
}

fn human_size(mb: u64) -> String {
	ByteSize(mb.saturating_mul(MB)).to_string()
}

fn csv_row<V: ToString>(section: &str, name: &str, value: V, detail: &str) -> [String; 4] {
	[section.to_string(), name.to_string(), value.to_string(), detail.to_string()]
}

fn new_table(headers: &[&str]) -> Table {
	let mut table = Table::new();
	table
		.load_preset(UTF8_FULL)
		.apply_modifier(UTF8_ROUND_CORNERS)
		.set_content_arrangement(ContentArrangement::Dynamic);
	let headers: Vec<Cell> =
		headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Blue)).collect();
	table.set_header(headers);
	table
}

impl Display for Report {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		writeln!(
			f,
			"Memory estimate for {} ({} profile, {})",
			self.input.gc_strategy,
			self.profile.name.name(),
			self.profile.margin_policy
		)?;
		writeln!(f, "{}", self.memory_table())?;
		writeln!(f, "Recommended JVM parameters")?;
		writeln!(f, "{}", self.parameter_table())?;
		writeln!(f, "Container requests and limits")?;
		writeln!(f, "{}", self.container_table())?;
		write!(f, "Command line: {}", self.command_line)
	}
}
