//! Host pattern matching and service-set encoding.
//!
//! No I/O here. The registry service feeds these with entries read from the
//! KV store.

use std::collections::{BTreeSet, HashSet};
use std::iter::Peekable;
use std::str::Chars;

use daybook_common::{DaybookError, Result};
use glob::{MatchOptions, Pattern};
use serde::Serialize;

/// `*` and `?` never cross a `/`, the same as shell path matching.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled host pattern, e.g. `web-prod-*` or `db-[0-9]`.
#[derive(Debug, Clone)]
pub struct HostPattern {
    source: String,
    compiled: Pattern,
}

impl HostPattern {
    /// Compile a shell-style pattern. Both `[^...]` and `[!...]` negate a class,
    /// and a backslash makes the next character literal, inside a class or out.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPattern` for unterminated classes, a trailing
    /// backslash and other invalid syntax.
    pub fn parse(pattern: &str) -> Result<Self> {
        let malformed = |reason: String| DaybookError::MalformedPattern {
            pattern: pattern.to_string(),
            reason,
        };
        if pattern.is_empty() {
            return Err(malformed("pattern is empty".to_string()));
        }
        let translated = normalize(pattern).map_err(|reason| malformed(reason.to_string()))?;
        let compiled = Pattern::new(&translated).map_err(|e| malformed(e.msg.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            compiled,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        self.compiled.matches_with(host, MATCH_OPTIONS)
    }

    /// Longer patterns are treated as more specific.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.source.len()
    }
}

/// Rewrite shell syntax into what the `glob` crate accepts: `[^` becomes
/// `[!`, escapes become bracketed literals, and runs of `*` collapse to one
/// (hostnames have no separators, so `**` means the same as `*`).
fn normalize(pattern: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('*' | '?' | '[')) => {
                    out.push('[');
                    out.push(escaped);
                    out.push(']');
                }
                Some(escaped) => out.push(escaped),
                None => return Err("trailing backslash"),
            },
            '*' => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            '[' => push_class(&mut chars, &mut out)?,
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Translate one bracket expression whose `[` was already consumed.
///
/// `glob` has no escapes, so escaped members are placed where they read
/// literally: `]` first, `-` last, `!` anywhere but first.
fn push_class(
    chars: &mut Peekable<Chars<'_>>,
    out: &mut String,
) -> std::result::Result<(), &'static str> {
    let negated = matches!(chars.peek(), Some('^' | '!'));
    if negated {
        chars.next();
    }
    let mut raw = String::new();
    let mut escaped: Vec<char> = Vec::new();
    // A `]` right after the opening bracket is a literal member.
    if chars.peek() == Some(&']') {
        chars.next();
        escaped.push(']');
    }
    loop {
        match chars.next() {
            None => return Err("unterminated character class"),
            Some(']') => break,
            Some('\\') => {
                let member = chars.next().ok_or("trailing backslash")?;
                if !escaped.contains(&member) {
                    escaped.push(member);
                }
            }
            Some(member) => raw.push(member),
        }
    }

    let mut members = String::new();
    if escaped.contains(&']') {
        members.push(']');
    }
    members.push_str(&raw);
    members.extend(escaped.iter().filter(|c| !matches!(c, ']' | '-' | '!')));
    let dash = escaped.contains(&'-');
    if escaped.contains(&'!') {
        if members.is_empty() && !negated {
            // `[!` would read as a negation.
            out.push_str(if dash { "[-!]" } else { "!" });
            return Ok(());
        }
        members.push('!');
    }
    if dash {
        members.push('-');
    }

    out.push('[');
    if negated {
        out.push('!');
    }
    out.push_str(&members);
    out.push(']');
    Ok(())
}

/// Pick the single winning pattern among those matching a host.
///
/// The longest pattern wins; equal lengths fall back to the lexicographically
/// smallest pattern so resolution never depends on listing order.
pub fn select_most_specific<V>(matches: Vec<(HostPattern, V)>) -> Option<(HostPattern, V)> {
    matches.into_iter().min_by(|(a, _), (b, _)| {
        b.specificity()
            .cmp(&a.specificity())
            .then_with(|| a.as_str().cmp(b.as_str()))
    })
}

/// Decode a stored entry value into service names.
///
/// Splits on `,`, trims, drops empty elements and keeps the first occurrence
/// of duplicates.
#[must_use]
pub fn decode_service_names(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    let mut seen = HashSet::new();
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Encode a service set for persistence, sorted so the stored value is stable.
#[must_use]
pub fn encode_service_names(names: &BTreeSet<String>) -> Vec<u8> {
    names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
        .into_bytes()
}

/// One registry entry as shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternEntry {
    pub pattern: String,
    pub services: Vec<String>,
}
