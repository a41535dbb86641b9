//! Task Templates
//!
//! A task template is the source of a benchmark script with a handful of named
//! slots. Rendering is plain substitution over a pre-parsed segment list; the
//! template text is never evaluated.
//!
//! ## Syntax
//!
//! - `{name}`   - benchmark name, string-literal slot
//! - `{target}` - path of the target file, string-literal slot
//! - `{mode}`   - formatter mode arguments, code slot (inserted verbatim)
//! - `{{` / `}}` - literal braces
//!
//! String-literal slots are escaped so the value can sit between the double
//! quotes of a Python string literal, e.g. `Path("{target}")`.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors detected while parsing or validating a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced '{brace}' at byte {offset}")]
    UnbalancedBrace { brace: char, offset: usize },

    #[error("unknown placeholder '{{{placeholder}}}' at byte {offset}")]
    UnknownPlaceholder { placeholder: String, offset: usize },

    #[error("missing required placeholder {0}")]
    MissingPlaceholder(Slot),

    #[error("placeholder {0} is not allowed here")]
    ForbiddenPlaceholder(Slot),
}

/// A named slot in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Generated benchmark name
    Name,
    /// Target file path
    Target,
    /// Formatter mode arguments
    Mode,
}

impl Slot {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Slot::Name),
            "target" => Some(Slot::Target),
            "mode" => Some(Slot::Mode),
            _ => None,
        }
    }

    /// Whether the value lands inside a string literal and must be escaped
    pub fn is_string_literal(self) -> bool {
        matches!(self, Slot::Name | Slot::Target)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Slot::Name => "name",
            Slot::Target => "target",
            Slot::Mode => "mode",
        };
        write!(f, "{{{}}}", key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// Values bound to the slots of a template
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    /// Value for `{name}`
    pub name: &'a str,
    /// Value for `{target}`
    pub target: &'a str,
    /// Value for `{mode}`
    pub mode: &'a str,
}

/// A parsed task template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text, rejecting unknown placeholders and stray braces.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self { source, segments })
    }

    /// Raw template text, exactly as loaded
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Set of slots used by this template
    pub fn slots(&self) -> BTreeSet<Slot> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(slot) => Some(*slot),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Check that every slot in `required` is used and none in `forbidden` is.
    pub fn validate(&self, required: &[Slot], forbidden: &[Slot]) -> Result<(), TemplateError> {
        let slots = self.slots();
        if let Some(missing) = required.iter().find(|s| !slots.contains(s)) {
            return Err(TemplateError::MissingPlaceholder(*missing));
        }
        if let Some(extra) = forbidden.iter().find(|s| slots.contains(s)) {
            return Err(TemplateError::ForbiddenPlaceholder(*extra));
        }
        Ok(())
    }

    /// Substitute `bindings` into the template.
    pub fn render(&self, bindings: &Bindings<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 256);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    let value = match slot {
                        Slot::Name => bindings.name,
                        Slot::Target => bindings.target,
                        Slot::Mode => bindings.mode,
                    };
                    if slot.is_string_literal() {
                        escape_string_literal(value, &mut out);
                    } else {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

fn parse_segments(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                let rest = &source[offset + 1..];
                let Some(end) = rest.find('}') else {
                    return Err(TemplateError::UnbalancedBrace { brace: '{', offset });
                };
                let key = &rest[..end];
                let Some(slot) = Slot::from_key(key) else {
                    return Err(TemplateError::UnknownPlaceholder {
                        placeholder: key.to_string(),
                        offset,
                    });
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(slot));
                // Skip the key and the closing brace
                for _ in 0..key.chars().count() + 1 {
                    chars.next();
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBrace { brace: '}', offset });
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Escape `value` for use between the double quotes of a Python string literal.
pub fn escape_string_literal(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
}
