use std::ops::Range;

/// Split a command line into words with shell-like quoting.
///
/// Quotes and backslashes only stop whitespace from separating words; they
/// are kept in the returned text. Unbalanced quotes run to end of line.
pub fn tokenize(line: &str) -> Vec<&str> {
    // Spans end on ASCII separators or end of line, so they are char boundaries
    token_spans(line.as_bytes())
        .into_iter()
        .map(|span| &line[span])
        .collect()
}

/// [`tokenize`] for lines that need not be valid UTF-8.
pub fn tokenize_bytes(line: &[u8]) -> Vec<&[u8]> {
    token_spans(line).into_iter().map(|span| &line[span]).collect()
}

fn token_spans(line: &[u8]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut single = false;
    let mut double = false;
    let mut escaped = false;

    for (i, &b) in line.iter().enumerate() {
        if start.is_none() {
            if is_separator(b) {
                continue;
            }
            start = Some(i);
        }

        if single {
            single = b != b'\'';
            continue;
        }
        if escaped {
            escaped = false;
            continue;
        }
        if double {
            double = b != b'"';
            continue;
        }

        match b {
            b'\'' => single = true,
            b'"' => double = true,
            b'\\' => escaped = true,
            b if is_separator(b) => {
                if let Some(s) = start.take() {
                    spans.push(s..i);
                }
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        spans.push(s..line.len());
    }
    spans
}

fn is_separator(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
