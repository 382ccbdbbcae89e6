use unicode_width::UnicodeWidthStr;

use crate::pipeline::config::FormatConfig;

const CONTINUATION: &[u8] = b" \\\n";

/// Line-wrapping rules for one family of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Compiler drivers: defines, include and library paths alone on a
    /// line, `-f` and `-W` options grouped
    Compiler,
    /// Lint: defines and include paths alone on a line
    Lint,
    /// Anything else run by absolute path: width only
    Command,
}

/// Runs of options kept together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagGroup {
    F,
    W,
}

impl FlagGroup {
    fn of(token: &[u8]) -> Option<FlagGroup> {
        if token.starts_with(b"-f") {
            Some(FlagGroup::F)
        } else if token.starts_with(b"-W") {
            Some(FlagGroup::W)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Inline,
    /// Start a new line before the token
    NewLine,
    /// Break before and after the token
    OwnLine,
}

/// Per-line state threaded through the emission loop
#[derive(Debug, Default)]
struct WrapState {
    column: usize,
    group: Option<FlagGroup>,
}

impl WrapState {
    fn break_line(&mut self, out: &mut Vec<u8>) {
        if self.column > 0 {
            out.extend_from_slice(CONTINUATION);
            self.column = 0;
        }
    }
}

impl Policy {
    /// Tokens too wide to ever fit are left to overflow instead of
    /// forcing a useless break.
    fn may_overflow(self, token_width: usize, config: &FormatConfig) -> bool {
        match self {
            Policy::Command => token_width + config.indent >= config.width,
            Policy::Compiler | Policy::Lint => false,
        }
    }

    fn placement(self, token: &[u8], state: &mut WrapState) -> Placement {
        match self {
            Policy::Compiler => {
                let group = FlagGroup::of(token);
                let starts_group = group.is_some() && group != state.group;
                state.group = group;

                if token.contains(&b'=')
                    || token.starts_with(b"-I")
                    || token.starts_with(b"-L")
                    || token.starts_with(b"-D")
                {
                    Placement::OwnLine
                } else if starts_group {
                    Placement::NewLine
                } else {
                    Placement::Inline
                }
            }
            Policy::Lint => {
                if token.starts_with(b"-I") || token.starts_with(b"-D") {
                    Placement::OwnLine
                } else {
                    Placement::Inline
                }
            }
            Policy::Command => Placement::Inline,
        }
    }
}

/// Columns taken by a token; bytes that are not UTF-8 count one each.
fn display_width(token: &[u8]) -> usize {
    match std::str::from_utf8(token) {
        Ok(s) => UnicodeWidthStr::width(s),
        Err(_) => token.len(),
    }
}

/// Lay out `tokens` under `policy`. The result always ends in a newline;
/// intermediate lines end in ` \`.
pub fn wrap<T: AsRef<[u8]>>(policy: Policy, tokens: &[T], config: &FormatConfig) -> Vec<u8> {
    let mut out = Vec::new();
    let Some((first, rest)) = tokens.split_first() else {
        out.push(b'\n');
        return out;
    };

    let first = first.as_ref();
    out.extend_from_slice(first);
    let mut state = WrapState {
        column: display_width(first),
        group: None,
    };

    for token in rest {
        let token = token.as_ref();
        let width = display_width(token);

        if state.column + width + 2 > config.width && !policy.may_overflow(width, config) {
            state.break_line(&mut out);
        }

        let placement = policy.placement(token, &mut state);
        if placement != Placement::Inline {
            state.break_line(&mut out);
        }

        if state.column == 0 {
            out.extend(std::iter::repeat(b' ').take(config.indent));
            state.column += config.indent;
        } else {
            out.push(b' ');
            state.column += 1;
        }

        out.extend_from_slice(token);
        state.column += width;

        if placement == Placement::OwnLine {
            state.break_line(&mut out);
        }
    }

    out.push(b'\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: usize) -> FormatConfig {
        FormatConfig { width, indent: 4 }
    }

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    fn wrap_text(policy: Policy, tokens: &[&str], config: &FormatConfig) -> String {
        String::from_utf8(wrap(policy, tokens, config)).unwrap()
    }

    /// Undo the layout: drop continuation markers and padding.
    fn rejoin(formatted: &str) -> Vec<String> {
        formatted
            .replace(" \\\n", " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_short_line_unchanged() {
        let out = wrap_text(Policy::Command, &words("/bin/rm -f foo"), &config(80));
        assert_eq!(out, "/bin/rm -f foo\n");
    }

    #[test]
    fn test_command_wraps_at_width() {
        let out = wrap_text(
            Policy::Command,
            &words("/usr/bin/cp alpha beta gamma delta"),
            &config(20),
        );
        assert_eq!(out, "/usr/bin/cp alpha \\\n    beta gamma \\\n    delta\n");
        for line in out.lines() {
            assert!(line.len() <= 20, "{:?} too long", line);
        }
    }

    #[test]
    fn test_command_leaves_unwrappable_token() {
        let long = "/a/very/long/path/that/cannot/fit";
        let tokens = vec!["/bin/ls", long, "x"];
        let out = wrap_text(Policy::Command, &tokens, &config(20));
        assert_eq!(out, format!("/bin/ls {} \\\n    x\n", long));
    }

    #[test]
    fn test_compiler_layout() {
        let tokens = words("cc -Dfoo -Ibar -fsomeflag -fother out.c");
        // The width check runs before grouping, so -fother still wraps at 20
        let out = wrap_text(Policy::Compiler, &tokens, &config(20));
        assert_eq!(
            out,
            "cc \\\n    -Dfoo \\\n    -Ibar \\\n    -fsomeflag \\\n    -fother out.c\n"
        );
    }

    #[test]
    fn test_compiler_flag_group_stays_together() {
        let tokens = words("cc -c -fsomeflag -fother -Wall -Wextra out.c");
        let out = wrap_text(Policy::Compiler, &tokens, &config(80));
        assert_eq!(
            out,
            "cc -c \\\n    -fsomeflag -fother \\\n    -Wall -Wextra out.c\n"
        );
    }

    #[test]
    fn test_compiler_group_restarts_after_other_token() {
        let tokens = words("cc -fpic -O2 -fno-common");
        let out = wrap_text(Policy::Compiler, &tokens, &config(80));
        assert_eq!(out, "cc \\\n    -fpic -O2 \\\n    -fno-common\n");
    }

    #[test]
    fn test_compiler_assignment_on_own_line() {
        let tokens = words("cc -std=c99 -c foo.c -Lobj -lc");
        let out = wrap_text(Policy::Compiler, &tokens, &config(80));
        assert_eq!(
            out,
            "cc \\\n    -std=c99 \\\n    -c foo.c \\\n    -Lobj \\\n    -lc\n"
        );
    }

    #[test]
    fn test_compiler_own_line_flag_opens_group() {
        let tokens = words("cc -fvisibility=hidden -fpic x.c");
        let out = wrap_text(Policy::Compiler, &tokens, &config(80));
        assert_eq!(
            out,
            "cc \\\n    -fvisibility=hidden \\\n    -fpic x.c\n"
        );
    }

    #[test]
    fn test_compiler_trailing_own_line_token() {
        // The break after an own-line token happens even at end of line
        let out = wrap_text(Policy::Compiler, &words("cc -Dlast"), &config(80));
        assert_eq!(out, "cc \\\n    -Dlast \\\n\n");
    }

    #[test]
    fn test_lint_own_line_rules() {
        let tokens = words("/opt/lint -Dfoo -Iinc -fnothing -L/lib a.c");
        let out = wrap_text(Policy::Lint, &tokens, &config(80));
        assert_eq!(
            out,
            "/opt/lint \\\n    -Dfoo \\\n    -Iinc \\\n    -fnothing -L/lib a.c\n"
        );
    }

    #[test]
    fn test_tokens_survive_layout() {
        let line = "/opt/cw -_gcc=/usr/bin/gcc -O2 -fno-strict-aliasing -fPIC -Wall \
                    -Wno-unused -DDEBUG -I../inc -L../lib -c very_long_source_file_name.c -o out.o";
        let tokens = words(line);
        for policy in [Policy::Compiler, Policy::Lint, Policy::Command] {
            for width in [1, 10, 20, 40, 80, 200] {
                let out = wrap_text(policy, &tokens, &config(width));
                assert_eq!(rejoin(&out), tokens, "{:?} at width {}", policy, width);
                assert!(out.ends_with('\n'));
            }
        }
    }

    #[test]
    fn test_width_counts_display_columns() {
        assert_eq!(display_width(b"abc"), 3);
        assert_eq!(display_width("日本".as_bytes()), 4);
        assert_eq!(display_width(b"caf\xe9"), 4);
    }

    #[test]
    fn test_non_utf8_token_copied_through() {
        let tokens: [&[u8]; 3] = [b"/bin/cp", b"caf\xe9.c", b"/tmp"];
        let out = wrap(Policy::Command, &tokens, &config(80));
        assert_eq!(out, b"/bin/cp caf\xe9.c /tmp\n".to_vec());
    }
}
