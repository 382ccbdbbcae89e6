//! Command-line reformatter: picks a wrapping policy from the first words
//! of each line and lays the line out for the configured width.

use std::io::{BufRead, Write};

use tracing::trace;

use crate::error::SiftError;
use crate::lines::RawLines;
use crate::pipeline::config::FormatConfig;
use crate::tokenize::tokenize_bytes;

pub mod wrap;

pub use wrap::{wrap, Policy};

const COMPILER_WRAPPER_SUFFIX: &[u8] = b"/cw";
const C_COMPILER_SUFFIXES: [&[u8]; 2] = [b"/gcc", b"/cc"];
const LINT_SUFFIX: &[u8] = b"/lint";
const ECHO_PREFIX: &[u8] = b"+";

/// How a single input line is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Passthrough,
    /// Wrap the tokens after `skip` verbatim leading tokens
    Wrapped { policy: Policy, skip: usize },
}

pub fn classify<T: AsRef<[u8]>>(tokens: &[T]) -> LineKind {
    let first: &[u8] = match tokens.first() {
        Some(token) => token.as_ref(),
        None => return LineKind::Blank,
    };

    if first.ends_with(COMPILER_WRAPPER_SUFFIX) {
        return LineKind::Wrapped {
            policy: Policy::Compiler,
            skip: 0,
        };
    }
    if first == ECHO_PREFIX {
        if let Some(second) = tokens.get(1) {
            let second: &[u8] = second.as_ref();
            if C_COMPILER_SUFFIXES.iter().any(|s| second.ends_with(s)) {
                return LineKind::Wrapped {
                    policy: Policy::Compiler,
                    skip: 1,
                };
            }
        }
    }
    if first.ends_with(LINT_SUFFIX) {
        return LineKind::Wrapped {
            policy: Policy::Lint,
            skip: 0,
        };
    }
    if first.starts_with(b"/") {
        return LineKind::Wrapped {
            policy: Policy::Command,
            skip: 0,
        };
    }
    LineKind::Passthrough
}

/// Reformats lines one at a time; holds no state between lines.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    config: FormatConfig,
}

impl CommandFormatter {
    pub fn new(config: FormatConfig) -> Self {
        CommandFormatter { config }
    }

    /// Render one line, including its trailing newline.
    pub fn format_line(&self, line: &[u8]) -> (LineKind, Vec<u8>) {
        let tokens = tokenize_bytes(line);
        let kind = classify(&tokens);
        let text = match kind {
            LineKind::Blank => b"\n".to_vec(),
            LineKind::Passthrough => {
                let mut text = line.to_vec();
                text.push(b'\n');
                text
            }
            LineKind::Wrapped { policy, skip } => {
                let mut text = Vec::new();
                for token in &tokens[..skip] {
                    text.extend_from_slice(token);
                    text.push(b' ');
                }
                text.extend(wrap(policy, &tokens[skip..], &self.config));
                text
            }
        };
        (kind, text)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormatStats {
    pub lines_read: usize,
    pub lines_wrapped: usize,
    pub lines_passed: usize,
}

/// Run the reformatter over a whole stream.
pub fn format_stream<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: FormatConfig,
    source_name: &str,
) -> Result<FormatStats, SiftError> {
    let formatter = CommandFormatter::new(config);
    let mut stats = FormatStats::default();

    for line in RawLines::new(input) {
        let line = line.map_err(|e| SiftError::read(source_name, e))?;
        stats.lines_read += 1;

        let (kind, text) = formatter.format_line(&line);
        match kind {
            LineKind::Wrapped { policy, .. } => {
                trace!(line = stats.lines_read, ?policy, "wrapping command line");
                stats.lines_wrapped += 1;
            }
            LineKind::Blank | LineKind::Passthrough => stats.lines_passed += 1,
        }
        output.write_all(&text)?;
    }

    output.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn formatter(width: usize) -> CommandFormatter {
        CommandFormatter::new(FormatConfig { width, indent: 4 })
    }

    fn format_text(width: usize, line: &str) -> (LineKind, String) {
        let (kind, text) = formatter(width).format_line(line.as_bytes());
        (kind, String::from_utf8(text).unwrap())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify::<&str>(&[]), LineKind::Blank);
        assert_eq!(
            classify(&["/opt/onbld/bin/i386/cw", "-c"]),
            LineKind::Wrapped { policy: Policy::Compiler, skip: 0 }
        );
        assert_eq!(
            classify(&["+", "/usr/bin/gcc", "-c"]),
            LineKind::Wrapped { policy: Policy::Compiler, skip: 1 }
        );
        assert_eq!(
            classify(&["+", "/usr/ccs/bin/cc"]),
            LineKind::Wrapped { policy: Policy::Compiler, skip: 1 }
        );
        assert_eq!(
            classify(&["/opt/SUNWspro/bin/lint", "-x"]),
            LineKind::Wrapped { policy: Policy::Lint, skip: 0 }
        );
        assert_eq!(
            classify(&["/usr/bin/rm", "-f"]),
            LineKind::Wrapped { policy: Policy::Command, skip: 0 }
        );
    }

    #[test]
    fn test_plus_without_compiler() {
        // `+ /bin/sh` is not a compiler line and `+` is not a path
        assert_eq!(classify(&["+", "/bin/sh"]), LineKind::Passthrough);
        assert_eq!(classify(&["+"]), LineKind::Passthrough);
    }

    #[test]
    fn test_passthrough_keeps_original_spacing() {
        let (kind, text) = format_text(10, "*** Error   code 1   ");
        assert_eq!(kind, LineKind::Passthrough);
        assert_eq!(text, "*** Error   code 1   \n");
    }

    #[test]
    fn test_blank_line() {
        let (kind, text) = format_text(10, " \t ");
        assert_eq!(kind, LineKind::Blank);
        assert_eq!(text, "\n");
    }

    #[test]
    fn test_echoed_gcc_line() {
        let (_, text) = format_text(80, "+ /usr/bin/gcc -DX -c a.c");
        assert_eq!(text, "+ /usr/bin/gcc \\\n    -DX \\\n    -c a.c\n");
    }

    #[test]
    fn test_wrapped_line_collapses_whitespace() {
        let (_, text) = format_text(80, "/usr/bin/rm   -f\tfoo");
        assert_eq!(text, "/usr/bin/rm -f foo\n");
    }

    #[test]
    fn test_non_utf8_lines_keep_their_bytes() {
        let (kind, text) = formatter(10).format_line(b"note: caf\xe9   \xff\r");
        assert_eq!(kind, LineKind::Passthrough);
        assert_eq!(text, b"note: caf\xe9   \xff\r\n".to_vec());

        let (_, text) = formatter(80).format_line(b"/bin/cp caf\xe9.c  /tmp");
        assert_eq!(text, b"/bin/cp caf\xe9.c /tmp\n".to_vec());
    }

    #[test]
    fn test_format_stream_counts() {
        let input = "\
#### nightly.log:3
/opt/cw -c -DDEBUG foo.c

*** Error code 1
";
        let mut output = Vec::new();
        let stats = format_stream(
            Cursor::new(input),
            &mut output,
            FormatConfig { width: 80, indent: 4 },
            "(pipe)",
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "#### nightly.log:3\n/opt/cw -c \\\n    -DDEBUG \\\n    foo.c\n\n*** Error code 1\n"
        );
        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.lines_wrapped, 1);
        assert_eq!(stats.lines_passed, 3);
    }
}
