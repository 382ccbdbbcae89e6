//! Error-block extractor.
//!
//! Build logs interleave the output of many jobs. Only job sections that
//! contain an unignored `*** Error` line are kept; one section is buffered
//! at a time.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::SiftError;
use crate::lines::RawLines;
use crate::pipeline::config::FilterConfig;

/// Lines captured for one job section
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Block {
    /// 1-based ordinal of the start-marker line
    pub start_line: usize,
    /// Raw line bytes, without the trailing newline
    pub lines: Vec<Vec<u8>>,
    pub has_error: bool,
}

impl Block {
    fn new(start_line: usize, first: Vec<u8>) -> Self {
        Block {
            start_line,
            lines: vec![first],
            has_error: false,
        }
    }

    /// Header, the captured lines verbatim, then a blank line.
    pub fn write_to<W: Write>(&self, output: &mut W, source_name: &str) -> std::io::Result<()> {
        writeln!(output, "#### {}:{}", source_name, self.start_line)?;
        for line in &self.lines {
            output.write_all(line)?;
            output.write_all(b"\n")?;
        }
        writeln!(output)?;
        output.flush()
    }
}

#[derive(Debug)]
enum State {
    Scanning,
    Capturing(Block),
}

/// Stateful scanner; feed it lines and collect the blocks worth keeping.
pub struct ErrorFilter {
    config: FilterConfig,
    state: State,
    line_number: usize,
    blocks_seen: usize,
}

impl ErrorFilter {
    pub fn new(config: FilterConfig) -> Self {
        ErrorFilter {
            config,
            state: State::Scanning,
            line_number: 0,
            blocks_seen: 0,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn blocks_seen(&self) -> usize {
        self.blocks_seen
    }

    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Consume one line. Returns a block when this line closed a section
    /// that contained a qualifying error.
    pub fn add_line(&mut self, line: Vec<u8>) -> Option<Block> {
        self.line_number += 1;

        let starts = self.config.is_start(&line);
        if matches!(self.state, State::Scanning) {
            if starts {
                self.open(line);
            }
            return None;
        }

        let closes = starts || self.config.is_end(&line);
        let is_error = self.config.is_qualifying_error(&line);
        if let State::Capturing(block) = &mut self.state {
            if is_error {
                block.has_error = true;
            }
            if !closes {
                block.lines.push(line);
                return None;
            }
        }

        let closed = match std::mem::replace(&mut self.state, State::Scanning) {
            State::Capturing(block) => block,
            State::Scanning => return None,
        };
        if starts {
            self.open(line);
        }
        Self::keep(closed)
    }

    /// End of input: hand back the open section if it qualifies.
    pub fn finish(&mut self) -> Option<Block> {
        match std::mem::replace(&mut self.state, State::Scanning) {
            State::Capturing(block) => Self::keep(block),
            State::Scanning => None,
        }
    }

    fn open(&mut self, line: Vec<u8>) {
        self.blocks_seen += 1;
        self.state = State::Capturing(Block::new(self.line_number, line));
    }

    fn keep(block: Block) -> Option<Block> {
        if block.has_error {
            debug!(
                start_line = block.start_line,
                lines = block.lines.len(),
                "emitting failed job block"
            );
            Some(block)
        } else {
            debug!(start_line = block.start_line, "discarding clean job block");
            None
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub lines_read: usize,
    pub blocks_seen: usize,
    pub blocks_emitted: usize,
}

/// Run the extractor over a whole stream.
pub fn extract_errors<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: FilterConfig,
) -> Result<FilterStats, SiftError> {
    let mut filter = ErrorFilter::new(config);
    let mut stats = FilterStats::default();

    for line in RawLines::new(input) {
        let line = line.map_err(|e| SiftError::read(&filter.config().source_name, e))?;
        if let Some(block) = filter.add_line(line) {
            block.write_to(output, &filter.config().source_name)?;
            stats.blocks_emitted += 1;
        }
    }

    if let Some(block) = filter.finish() {
        block.write_to(output, &filter.config().source_name)?;
        stats.blocks_emitted += 1;
    }

    stats.lines_read = filter.lines_read();
    stats.blocks_seen = filter.blocks_seen();
    Ok(stats)
}
