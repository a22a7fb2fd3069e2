use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

/// A destination for the copied command line
pub(crate) trait Clipboard {
	/// Store `text`, returning the name of whatever received it
	fn write_text(&mut self, text: &str) -> Result<String>;
}

/// The result of a copy request, handed back to the caller as a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub(crate) enum CopyOutcome {
	Copied {
		tool: String,
	},
	Failed {
		reason: String,
	},
}

impl fmt::Display for CopyOutcome {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Copied {
				tool,
			} => write!(f, "JVM parameters copied to clipboard ({tool})"),
			Self::Failed {
				reason,
			} => write!(f, "Failed to copy JVM parameters: {reason}"),
		}
	}
}

/// Copy the command line, turning any failure into [`CopyOutcome::Failed`]
pub(crate) fn copy_command_line<C: Clipboard + ?Sized>(clipboard: &mut C, text: &str) -> CopyOutcome {
	match clipboard.write_text(text) {
		Ok(tool) => {
			info!("Copied {} bytes to the clipboard via {tool}", text.len());
			CopyOutcome::Copied {
				tool,
			}
		}
		Err(e) => {
			warn!("Failed to copy JVM parameters: {e:#}");
			CopyOutcome::Failed {
				reason: format!("{e:#}"),
			}
		}
	}
}

/// An external program that reads clipboard contents from its stdin
#[derive(Clone)]
pub(crate) struct ClipboardTool {
	program: String,
	args: Vec<String>,
}

impl fmt::Display for ClipboardTool {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.args.is_empty() {
			true => write!(f, "{}", self.program),
			false => write!(f, "{} {}", self.program, self.args.join(" ")),
		}
	}
}

impl ClipboardTool {
	pub(crate) fn new<I, S>(program: &str, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			program: program.to_string(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	fn pipe(&self, text: &str) -> Result<()> {
		// Output debug information to the logs
		debug!("Running command `{self}`");
		// Spawn the process with a piped stdin
		let mut child = Command::new(&self.program)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.with_context(|| format!("unable to run `{self}`"))?;
		// Write the text and close stdin so the tool sees the end of input
		{
			let mut stdin = child.stdin.take().context("stdin of the clipboard tool is closed")?;
			stdin.write_all(text.as_bytes())?;
		}
		// Wait for the tool itself only, as xclip leaves a child serving the selection
		let status = child.wait()?;
		if !status.success() {
			bail!("`{self}` exited with {status}");
		}
		Ok(())
	}
}

/// The clipboard of the desktop session, reached through the platform's
/// command line utilities
pub(crate) struct SystemClipboard {
	tools: Vec<ClipboardTool>,
}

impl Default for SystemClipboard {
	fn default() -> Self {
		let tools = if cfg!(target_os = "macos") {
			vec![ClipboardTool::new("pbcopy", Vec::<String>::new())]
		} else if cfg!(target_os = "windows") {
			vec![ClipboardTool::new("clip", Vec::<String>::new())]
		} else {
			vec![
				ClipboardTool::new("wl-copy", Vec::<String>::new()),
				ClipboardTool::new("xclip", ["-selection", "clipboard"]),
				ClipboardTool::new("xsel", ["--clipboard", "--input"]),
			]
		};
		Self::with_tools(tools)
	}
}

impl SystemClipboard {
	pub(crate) fn with_tools(tools: Vec<ClipboardTool>) -> Self {
		Self {
			tools,
		}
	}
}

impl Clipboard for SystemClipboard {
	fn write_text(&mut self, text: &str) -> Result<String> {
		let mut errors = Vec::new();
		for tool in &self.tools {
			match tool.pipe(text) {
				Ok(()) => return Ok(tool.program.clone()),
				Err(e) => {
					debug!("Clipboard tool failure: {e:#}");
					errors.push(format!("{e:#}"));
				}
			}
		}
		match errors.is_empty() {
			true => bail!("no clipboard utility is configured"),
			false => bail!("no clipboard utility succeeded ({})", errors.join("; ")),
		}
	}
}
