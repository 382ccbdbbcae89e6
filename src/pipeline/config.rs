use std::io;
use terminal_size::{terminal_size_of, Width};

use crate::lines::contains;

pub const DEFAULT_WIDTH: usize = 80;
pub const DEFAULT_INDENT: usize = 4;
pub const DEFAULT_PIPE_CAPACITY: usize = 16;

/// Markers and naming used by the error-block extractor
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Name printed in block headers (file path or `(stdin)`)
    pub source_name: String,
    /// Substring that opens a job output section
    pub start_marker: String,
    /// Prefix that closes a job output section
    pub end_marker: String,
    /// Prefix of a compiler/make error line
    pub error_prefix: String,
    /// Error lines containing this are not counted
    pub ignore_marker: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            source_name: "(stdin)".to_string(),
            start_marker: " --> Job output".to_string(),
            end_marker: "==== Ended".to_string(),
            error_prefix: "*** Error".to_string(),
            ignore_marker: "ignored".to_string(),
        }
    }
}

impl FilterConfig {
    pub fn is_start(&self, line: &[u8]) -> bool {
        contains(line, self.start_marker.as_bytes())
    }

    pub fn is_end(&self, line: &[u8]) -> bool {
        line.starts_with(self.end_marker.as_bytes())
    }

    pub fn is_qualifying_error(&self, line: &[u8]) -> bool {
        line.starts_with(self.error_prefix.as_bytes())
            && !contains(line, self.ignore_marker.as_bytes())
    }
}

/// Geometry used by the command-line reformatter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    pub width: usize,
    pub indent: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            width: DEFAULT_WIDTH,
            indent: DEFAULT_INDENT,
        }
    }
}

/// Configuration for a whole run
#[derive(Debug, Clone)]
pub struct SiftConfig {
    pub filter: FilterConfig,
    pub format: FormatConfig,
    /// Chunks in flight between the two stages before the extractor blocks
    pub pipe_capacity: usize,
    /// Run the error-block extractor (otherwise every line is forwarded)
    pub extract: bool,
    /// Run the reformatter (otherwise lines are written verbatim)
    pub reformat: bool,
}

impl Default for SiftConfig {
    fn default() -> Self {
        SiftConfig {
            filter: FilterConfig::default(),
            format: FormatConfig::default(),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            extract: true,
            reformat: true,
        }
    }
}

/// Where the output width came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthSource {
    Env,
    Terminal,
    Fallback,
}

/// Parse a `COLUMNS` value; anything but an unsigned integer is ignored.
pub fn parse_columns(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

/// Pick the output width: `COLUMNS`, then the terminal attached to
/// stdin, stdout or stderr (first that answers), then 80.
pub fn detect_width(columns_env: Option<&str>) -> (usize, WidthSource) {
    if let Some(width) = columns_env.and_then(parse_columns) {
        return (width, WidthSource::Env);
    }

    // Might be in the middle of a pipeline, so try each stream
    let probes = [
        terminal_size_of(io::stdin()),
        terminal_size_of(io::stdout()),
        terminal_size_of(io::stderr()),
    ];
    if let Some((Width(w), _)) = probes.into_iter().flatten().next() {
        return (w as usize, WidthSource::Terminal);
    }

    (DEFAULT_WIDTH, WidthSource::Fallback)
}
