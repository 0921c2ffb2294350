//! Removal of source-control bindings from `.sln` files.
//!
//! A solution binds itself to a provider through a `GlobalSection` block
//! (`SourceCodeControl`, `TeamFoundationVersionControl`, ...) and through
//! stray `Scc*` lines. Both are dropped; every other line is written back
//! verbatim, in order, with the original encoding and line endings.

use crate::encoding::{self, LineEnding};
use crate::error::Error;
use crate::platform::WritableGuard;
use std::fs;
use std::path::Path;
use tracing::debug;

const SOURCE_CODE_CONTROL: &str = "GlobalSection(SourceCodeControl)";
const TEAM_FOUNDATION_CONTROL: &str = "GlobalSection(TeamFoundationVersionControl)";
const END_GLOBAL_SECTION: &str = "EndGlobalSection";
const SCC_PREFIX: &str = "Scc";

/// Line filter tracking whether we are inside a source-control section.
#[derive(Debug, Default)]
pub struct SolutionFilter {
    in_source_control_section: bool,
}

impl SolutionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_source_control_section(&self) -> bool {
        self.in_source_control_section
    }

    /// Feeds one line and returns whether it belongs in the output.
    pub fn keep(&mut self, line: &str) -> bool {
        let trimmed = line.trim();

        if starts_source_control_section(trimmed) {
            self.in_source_control_section = true;
            false
        } else if self.in_source_control_section && trimmed.starts_with(END_GLOBAL_SECTION) {
            self.in_source_control_section = false;
            false
        } else if trimmed.starts_with(SCC_PREFIX) {
            false
        } else {
            !self.in_source_control_section
        }
    }
}

fn starts_source_control_section(trimmed: &str) -> bool {
    trimmed.starts_with(SOURCE_CODE_CONTROL)
        || trimmed.starts_with(TEAM_FOUNDATION_CONTROL)
        || mentions_version_control_section(trimmed)
}

/// Case-insensitive `GlobalSection(` .. `Version` .. `Control`, anywhere in the line.
fn mentions_version_control_section(line: &str) -> bool {
    let lowered = line.to_lowercase();
    let mut rest = lowered.as_str();
    for needle in ["globalsection(", "version", "control"] {
        match rest.find(needle) {
            Some(index) => rest = &rest[index + needle.len()..],
            None => return false,
        }
    }
    true
}

/// Splits on `\r\n`, `\n` or a bare `\r`. A trailing break yields no empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(index) => {
                lines.push(&rest[..index]);
                let width = if rest[index..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[index + width..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Returns the lines of `text` that survive filtering, untouched.
pub fn filter_lines(text: &str) -> Vec<&str> {
    let mut filter = SolutionFilter::new();
    split_lines(text)
        .into_iter()
        .filter(|line| filter.keep(line))
        .collect()
}

/// Filters `text` and joins the kept lines, each followed by `line_ending`.
pub fn filter_solution_text(text: &str, line_ending: LineEnding) -> String {
    let mut output = String::with_capacity(text.len());
    for line in filter_lines(text) {
        output.push_str(line);
        output.push_str(line_ending.as_str());
    }
    output
}

/// Rewrites a solution file in place without its source-control bindings.
pub fn modify_solution_file(path: &Path) -> Result<(), Error> {
    if !path.to_string_lossy().to_lowercase().ends_with(".sln") {
        return Err(Error::NotASolution(path.to_path_buf()));
    }

    let _guard = WritableGuard::acquire(path)?;

    let bytes = fs::read(path)?;
    let (text, text_encoding) = encoding::decode_text(&bytes)?;
    let line_ending = LineEnding::detect(&text);
    let output = filter_solution_text(&text, line_ending);

    debug!(
        "Writing {} ({}, {:?}): {} -> {} bytes of text",
        path.display(),
        text_encoding.name(),
        line_ending,
        text.len(),
        output.len()
    );

    fs::write(path, text_encoding.encode(&output))?;
    Ok(())
}
