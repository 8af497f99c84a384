//! Target identifier quoting
//!
//! Graphite targets carry bare metric paths (`servers.web1.cpu`), which
//! are not valid tokens in the series DSL: they contain dots and segments
//! may start with a digit. Each dotted path is wrapped in double quotes so
//! it parses as a string literal, while bare function names stay as they
//! are. Commas inside a `{a,b}` value set belong to the path, not to the
//! surrounding argument list.

use regex::Regex;
use std::sync::OnceLock;

/// An identifier-like run, optionally with one `{...}` value set, or an
/// already-quoted run (matched with its quotes so it can be skipped)
const TOKEN_PATTERN: &str = concat!(
    r#""?[0-9A-Za-z_*]"#,
    r#"(?:[0-9A-Za-z_\-.*]*\{[0-9A-Za-z_\-.*,]*\}(?:[0-9A-Za-z_\-.*]*[0-9A-Za-z_*])?"#,
    r#"|[0-9A-Za-z_\-.*]*[0-9A-Za-z_*])"?"#,
);

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Quote every dotted identifier in a target expression
///
/// One token is rewritten per scan and the scan restarts from the top,
/// since the substitution shifts every later offset. Quoted tokens and
/// anything inside an existing string literal are left alone, which makes
/// the transform idempotent.
pub fn quote_identifiers(target: &str) -> String {
    let mut result = target.to_string();

    loop {
        let literals = literal_spans(&result);
        let next = token_regex()
            .find_iter(&result)
            .find(|m| {
                let token = m.as_str();
                token.contains('.')
                    && !token.starts_with('"')
                    && !inside_literal(&literals, m.start())
            })
            .map(|m| m.range());

        let Some(range) = next else {
            return result;
        };

        let quoted = format!("\"{}\"", &result[range.clone()]);
        result.replace_range(range, &quoted);
    }
}

/// Byte spans `[open, close]` of quoted literals; unterminated runs to the end
fn literal_spans(expr: &str) -> Vec<(usize, usize)> {
    let bytes = expr.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let quote = bytes[i];
        if quote != b'"' && quote != b'\'' {
            i += 1;
            continue;
        }

        let open = i;
        i += 1;
        while i < bytes.len() && bytes[i] != quote {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        spans.push((open, i.min(bytes.len())));
        i += 1;
    }
    spans
}

fn inside_literal(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(open, close)| open < pos && pos <= close)
}
