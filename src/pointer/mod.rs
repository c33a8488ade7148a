//! Pointers
//!
//! A pointer addresses a character position independently of the token
//! table's layout: an element path plus an offset into that element's
//! text, persisted as `<path>::<offset>`.
//!
//! The path language is a small XPath subset (child and descendant steps,
//! ordinal and attribute predicates), compiled once and cached.

pub mod cache;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use cache::PathCache;
pub use eval::{path_to, select_all, select_first};
pub use parser::{parse_path, Axis, NodeTest, PathExpr, Predicate, Step};

/// Separator between path and offset
pub const OFFSET_SEPARATOR: &str = "::";

/// Element path plus character offset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub path: String,
    pub offset: usize,
}

impl Pointer {
    pub fn new(path: impl Into<String>, offset: usize) -> Self {
        Pointer {
            path: path.into(),
            offset,
        }
    }

    /// Parse a `target` attribute value: two pointers separated by whitespace
    pub fn parse_range(target: &str) -> Result<(Pointer, Pointer)> {
        let mut parts = target.split_ascii_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => Ok((start.parse()?, end.parse()?)),
            _ => Err(Error::InvalidPointerFormat(format!(
                "expected two pointers in target '{target}'"
            ))),
        }
    }
}

impl FromStr for Pointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPointerFormat(s.to_string());
        let split = memmem::find(s.as_bytes(), OFFSET_SEPARATOR.as_bytes()).ok_or_else(invalid)?;
        let (path, offset) = (&s[..split], &s[split + OFFSET_SEPARATOR.len()..]);
        if path.is_empty() || offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let offset = offset.parse().map_err(|_| invalid())?;
        Ok(Pointer::new(path, offset))
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{OFFSET_SEPARATOR}{}", self.path, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_and_display() {
        let pointer: Pointer = "/root[1]/child[1]::3".parse().unwrap();
        assert_eq!(pointer, Pointer::new("/root[1]/child[1]", 3));
        assert_eq!(pointer.to_string(), "/root[1]/child[1]::3");
    }

    #[rstest]
    #[case("/root[1]")]
    #[case("::4")]
    #[case("//p[1]::")]
    #[case("//p[1]::-2")]
    #[case("//p[1]::2::3")]
    #[case("//p[1]::99999999999999999999999")]
    fn test_rejects(#[case] input: &str) {
        assert!(matches!(input.parse::<Pointer>(), Err(Error::InvalidPointerFormat(_))));
    }

    #[test]
    fn test_parse_range() {
        let (start, end) = Pointer::parse_range("//p[1]::2 //p[1]::4").unwrap();
        assert_eq!(start, Pointer::new("//p[1]", 2));
        assert_eq!(end, Pointer::new("//p[1]", 4));
        assert!(Pointer::parse_range("//p[1]::2").is_err());
        assert!(Pointer::parse_range("a::1 b::2 c::3").is_err());
    }
}
