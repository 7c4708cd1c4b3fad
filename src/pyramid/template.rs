//! Store path templates.
//!
//! A template maps `(zoom, x, y)` to a relative path such as `3/1/2`. The
//! placeholders `{z}`, `{x}` and `{y}` are replaced by the decimal values;
//! everything else is copied verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// Default layout: `<zoom>/<x>/<y>`.
pub const DEFAULT_TEMPLATE: &str = "{z}/{x}/{y}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Zoom,
    X,
    Y,
}

/// Parsed store path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Render the relative path for one tile, without extension.
    pub fn render(&self, zoom: u32, x: u32, y: u32) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Zoom => out.push_str(&zoom.to_string()),
                Segment::X => out.push_str(&x.to_string()),
                Segment::Y => out.push_str(&y.to_string()),
            }
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![
                Segment::Zoom,
                Segment::Literal("/".to_string()),
                Segment::X,
                Segment::Literal("/".to_string()),
                Segment::Y,
            ],
        }
    }
}

impl FromStr for PathTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: s.to_string(),
            reason: reason.to_string(),
        };

        if s.starts_with('/') || s.starts_with('\\') {
            return Err(invalid("template must be relative"));
        }
        if s.split(['/', '\\']).any(|part| part == "..") {
            return Err(invalid("template must not contain '..'"));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = s;

        while let Some(start) = rest.find('{') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| invalid("unterminated placeholder"))?;

            let segment = match &after[..end] {
                "z" => Segment::Zoom,
                "x" => Segment::X,
                "y" => Segment::Y,
                other => return Err(invalid(&format!("unknown placeholder {{{other}}}"))),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[end + 1..];
        }

        if rest.contains('}') {
            return Err(invalid("unmatched '}'"));
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let required = [
            (Segment::Zoom, "{z}"),
            (Segment::X, "{x}"),
            (Segment::Y, "{y}"),
        ];
        for (placeholder, name) in required {
            if !segments.contains(&placeholder) {
                return Err(invalid(&format!("missing {name}")));
            }
        }

        Ok(Self {
            source: s.to_string(),
            segments,
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}
