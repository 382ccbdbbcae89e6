//! Wires the extractor and reformatter together.
//!
//! With both stages enabled each runs on its own thread and they talk only
//! through a bounded [`pipe`](pipe::pipe); the call returns once both
//! threads have finished.

pub mod config;
pub mod pipe;

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::thread;

use tracing::debug;

use crate::error::SiftError;
use crate::filter::{extract_errors, FilterStats};
use crate::formatters::{format_stream, FormatStats};
use crate::lines::RawLines;
use config::SiftConfig;

/// Name used for read errors on the internal pipe
const PIPE_NAME: &str = "(pipe)";

/// Statistics for the stages that ran
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub filter: Option<FilterStats>,
    pub format: Option<FormatStats>,
}

/// Process `input` into `output` according to `config`.
pub fn run<R, W>(config: SiftConfig, input: R, mut output: W) -> Result<RunStats, SiftError>
where
    R: BufRead + Send,
    W: Write + Send,
{
    let SiftConfig {
        filter,
        format,
        pipe_capacity,
        extract,
        reformat,
    } = config;

    let stats = match (extract, reformat) {
        (true, true) => {
            let (writer, reader) = pipe::pipe(pipe_capacity);
            let sink = &mut output;

            let (filtered, formatted) = thread::scope(|scope| {
                let extractor = scope.spawn(move || {
                    // Dropping pipe_out closes the pipe, which ends the reformatter
                    let mut pipe_out = BufWriter::new(writer);
                    let stats = extract_errors(input, &mut pipe_out, filter)?;
                    pipe_out.flush()?;
                    Ok::<_, SiftError>(stats)
                });
                let reformatter = scope.spawn(move || {
                    format_stream(BufReader::new(reader), sink, format, PIPE_NAME)
                });

                (
                    extractor
                        .join()
                        .unwrap_or(Err(SiftError::StagePanicked("extractor"))),
                    reformatter
                        .join()
                        .unwrap_or(Err(SiftError::StagePanicked("reformatter"))),
                )
            });

            match (filtered, formatted) {
                (Ok(f), Ok(g)) => RunStats {
                    filter: Some(f),
                    format: Some(g),
                },
                // The extractor only saw the reformatter going away
                (Err(e), Err(g)) if e.is_broken_pipe() => return Err(g),
                (Err(e), _) => return Err(e),
                (Ok(_), Err(g)) => return Err(g),
            }
        }
        (true, false) => {
            let stats = extract_errors(input, &mut output, filter)?;
            RunStats {
                filter: Some(stats),
                format: None,
            }
        }
        (false, true) => {
            let stats = format_stream(input, &mut output, format, &filter.source_name)?;
            RunStats {
                filter: None,
                format: Some(stats),
            }
        }
        (false, false) => {
            copy_lines(input, &mut output, &filter.source_name)?;
            RunStats::default()
        }
    };

    output.flush()?;
    if let Some(f) = &stats.filter {
        debug!(
            lines = f.lines_read,
            blocks = f.blocks_seen,
            emitted = f.blocks_emitted,
            "extractor finished"
        );
    }
    if let Some(g) = &stats.format {
        debug!(
            lines = g.lines_read,
            wrapped = g.lines_wrapped,
            passed = g.lines_passed,
            "reformatter finished"
        );
    }
    Ok(stats)
}

fn copy_lines<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    source_name: &str,
) -> Result<(), SiftError> {
    for line in RawLines::new(input) {
        let line = line.map_err(|e| SiftError::read(source_name, e))?;
        output.write_all(&line)?;
        output.write_all(b"\n")?;
    }
    Ok(())
}
