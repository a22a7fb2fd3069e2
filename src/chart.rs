use crate::result::Report;

const SLICE_COLOURS: [&str; 4] = ["#36A2EB", "#FF6384", "#4BC0C0", "#FFCE56"];

/// Generate an HTML page with the memory distribution chart for a report
pub(crate) fn generate_html(report: &Report) -> String {
	format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>JVM Memory Estimate - {title}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js"></script>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #f5f5f5;
            padding: 20px;
        }}
        .container {{
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            padding: 30px;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            margin-bottom: 10px;
            font-size: 2em;
        }}
        h2 {{
            color: #444;
            margin: 30px 0 15px;
            font-size: 1.3em;
        }}
        .subtitle {{
            color: #666;
            margin-bottom: 30px;
            font-size: 1.1em;
        }}
        .stats-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 15px;
            margin-bottom: 30px;
        }}
        .stat-card {{
            color: white;
            padding: 20px;
            border-radius: 8px;
            text-align: center;
        }}
        .stat-card.heap {{ background: #36A2EB; }}
        .stat-card.non-heap {{ background: #FF6384; }}
        .stat-card.other {{ background: #4BC0C0; }}
        .stat-card.margin {{ background: #FFCE56; color: #333; }}
        .stat-card.total {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); }}
        .stat-label {{
            font-size: 0.9em;
            opacity: 0.9;
            margin-bottom: 5px;
        }}
        .stat-value {{
            font-size: 2em;
            font-weight: bold;
        }}
        .stat-unit {{
            font-size: 0.7em;
            opacity: 0.8;
        }}
        .stat-detail {{
            font-size: 0.85em;
            margin-top: 8px;
            opacity: 0.9;
        }}
        .chart-container {{
            max-width: 520px;
            margin: 0 auto;
        }}
        ul.parameters {{ list-style: none; }}
        ul.parameters li {{ margin: 8px 0; }}
        ul.parameters code {{ font-weight: bold; }}
        ul.parameters span {{ color: #666; font-size: 0.9em; display: block; }}
        pre {{
            background: #f0f4ff;
            padding: 15px;
            border-radius: 8px;
            white-space: pre-wrap;
            word-break: break-all;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>JVM Memory Estimate</h1>
        <div class="subtitle">{title}</div>

        <div class="stats-grid">
            {stats_cards}
        </div>

        <h2>Memory Distribution</h2>
        <div class="chart-container">
            <canvas id="memoryChart"></canvas>
        </div>

        <h2>Recommended JVM Parameters</h2>
        <ul class="parameters">
            {parameters}
        </ul>
        <pre>{command_line}</pre>
    </div>

    <script>
        Chart.defaults.font.family = '-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif';
        Chart.defaults.color = '#666';

        {chart_script}
    </script>
</body>
</html>"#,
		title = generate_title(report),
		stats_cards = generate_stat_cards(report),
		parameters = generate_parameters(report),
		command_line = escape(&report.command_line),
		chart_script = generate_chart_script(report),
	)
}

fn generate_title(report: &Report) -> String {
	format!(
		"{} heap with {} ({} profile)",
		format_mb(report.input.heap_size_mb),
		report.input.gc_strategy,
		report.profile.name.name()
	)
}

fn format_mb(mb: u64) -> String {
	format!("{mb} MB")
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn stat_card(class: &str, label: &str, mb: u64, details: &[(&str, u64)]) -> String {
	let details: String = details
		.iter()
		.map(|(name, mb)| format!(r#"<div class="stat-detail">{name}: {mb} MB</div>"#))
		.collect();
	format!(
		r#"<div class="stat-card {class}">
                    <div class="stat-label">{label}</div>
                    <div class="stat-value">{mb}<span class="stat-unit"> MB</span></div>
                    {details}
                </div>"#
	)
}

fn generate_stat_cards(report: &Report) -> String {
	let b = &report.breakdown;
	let mut cards = String::new();
	cards.push_str(&stat_card(
		"heap",
		"Heap Memory",
		b.heap_size_mb,
		&[("Young Generation", b.young_gen_mb), ("Old Generation", b.old_gen_mb)],
	));
	cards.push_str(&stat_card(
		"non-heap",
		"Non-Heap Memory",
		b.total_non_heap_mb,
		&[
			("Metaspace", b.metaspace_mb),
			("Code Cache", b.code_cache_mb),
			("Thread Stacks", b.thread_stacks_mb),
			("Compressed Class", b.compressed_class_space_mb),
		],
	));
	cards.push_str(&stat_card(
		"other",
		"Other Memory",
		b.total_other_mb,
		&[
			("Direct Buffers", b.direct_memory_mb),
			("Native Memory", b.native_memory_mb),
			("JVM Overhead", b.jvm_overhead_mb),
		],
	));
	cards.push_str(&stat_card(
		"margin",
		&format!("Safety Margin ({:.2}%)", b.safety_margin_percent),
		b.safety_margin_mb,
		&[],
	));
	cards.push_str(&stat_card("total", "Recommended Total Memory", b.total_mb, &[]));
	cards
}

fn generate_parameters(report: &Report) -> String {
	report
		.parameters
		.iter()
		.map(|p| {
			format!(
				r#"<li><code>{}</code><span>{}</span></li>"#,
				escape(&p.token()),
				escape(&p.rationale)
			)
		})
		.collect::<Vec<_>>()
		.join("\n            ")
}

fn generate_chart_script(report: &Report) -> String {
	let slices = report.breakdown.slices();
	let labels: Vec<&str> = slices.iter().map(|(label, _)| *label).collect();
	let data: Vec<u64> = slices.iter().map(|(_, mb)| *mb).collect();
	format!(
		r#"
// Memory Distribution Chart
new Chart(document.getElementById('memoryChart'), {{
    type: 'pie',
    data: {{
        labels: {labels},
        datasets: [{{
            data: {data},
            backgroundColor: {colours},
            hoverBackgroundColor: {colours}
        }}]
    }},
    options: {{
        responsive: true,
        maintainAspectRatio: true,
        plugins: {{
            legend: {{ display: true, position: 'top' }},
            tooltip: {{
                callbacks: {{
                    label: function(context) {{
                        return context.label + ': ' + context.parsed + ' MB';
                    }}
                }}
            }}
        }}
    }}
}});
"#,
		labels = serde_json::to_string(&labels).unwrap_or_default(),
		data = serde_json::to_string(&data).unwrap_or_default(),
		colours = serde_json::to_string(&SLICE_COLOURS).unwrap_or_default(),
	)
}
