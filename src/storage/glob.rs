//! Graphite path globbing
//!
//! A pattern is matched one dot-separated segment at a time. Within a
//! segment `*` matches any run of characters, `?` a single character,
//! `[...]` a character class and `{a,b}` any of the listed alternatives.
//! None of them ever match across a `.`.

use regex::Regex;

/// A compiled multi-segment glob
#[derive(Debug, Clone)]
pub struct GlobPattern {
    segments: Vec<Regex>,
}

impl GlobPattern {
    /// Compile a dotted glob pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let segments = split_segments(pattern)
            .into_iter()
            .map(|seg| Regex::new(&segment_regex(seg)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Number of dot-separated segments in the pattern
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True if the first `depth()` segments of `parts` match
    pub fn matches_prefix(&self, parts: &[&str]) -> bool {
        parts.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(re, part)| re.is_match(part))
    }

    /// True if `name` has exactly `depth()` segments and all match
    pub fn matches(&self, name: &str) -> bool {
        let parts: Vec<&str> = name.split('.').collect();
        parts.len() == self.segments.len() && self.matches_prefix(&parts)
    }
}

/// Split on dots that are not inside a `{...}` group
fn split_segments(pattern: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in pattern.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&pattern[start..]);
    segments
}

/// Translate one glob segment into an anchored regex
fn segment_regex(segment: &str) -> String {
    let mut re = String::from("^");
    let mut chars = segment.chars().peekable();
    let mut braces = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str("[^.]*"),
            '?' => re.push_str("[^.]"),
            '{' => {
                braces += 1;
                re.push_str("(?:");
            }
            '}' if braces > 0 => {
                braces -= 1;
                re.push(')');
            }
            ',' if braces > 0 => re.push('|'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }
                if closed && !class.is_empty() {
                    re.push('[');
                    for (i, c) in class.chars().enumerate() {
                        // keep ranges and leading negation, escape everything else
                        if i == 0 && c == '!' {
                            re.push('^');
                        } else if c == '-' || c.is_alphanumeric() {
                            re.push(c);
                        } else {
                            re.push_str(&regex::escape(&c.to_string()));
                        }
                    }
                    re.push(']');
                } else {
                    re.push_str(&regex::escape(&format!("[{}", class)));
                    if closed {
                        re.push_str(&regex::escape("]"));
                    }
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }

    for _ in 0..braces {
        re.push(')');
    }
    re.push('$');
    re
}
