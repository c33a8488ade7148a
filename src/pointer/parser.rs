//! Path Parser
//!
//! Recursive descent over the pointer path grammar:
//!
//! ```text
//! path      := ( '/' | '//' ) step ( ( '/' | '//' ) step )*
//! step      := ( name | '*' ) predicate*
//! predicate := '[' number ']' | '[' '@' name '=' string ']'
//! ```

use std::fmt;

use super::lexer::{Lexer, Token};
use crate::error::{Error, Result};

/// Compiled path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub steps: Vec<Step>,
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Predicate>,
}

/// How a step reaches its candidates from the context element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/` - children of the context
    Child,
    /// `//` - children of the context or of any of its descendants
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position among the candidates sharing a parent
    Position(usize),
    AttributeEquals { name: String, value: String },
}

/// Compile `input` into a [`PathExpr`]
pub fn parse_path(input: &str) -> Result<PathExpr> {
    Parser::new(input)
        .parse()
        .map_err(|message| Error::InvalidPointerFormat(format!("{input}: {message}")))
}

/// Path parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser { lexer, current }
    }

    pub fn parse(&mut self) -> std::result::Result<PathExpr, String> {
        let mut steps = Vec::new();
        loop {
            let axis = match self.current {
                Token::Slash => Axis::Child,
                Token::DoubleSlash => Axis::Descendant,
                Token::Eof if !steps.is_empty() => break,
                _ => return Err(format!("expected '/' or '//', found {:?}", self.current)),
            };
            self.advance();
            steps.push(self.parse_step(axis)?);
        }
        Ok(PathExpr { steps })
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> std::result::Result<(), String> {
        if self.current == expected {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {:?}", self.current))
        }
    }

    fn parse_step(&mut self, axis: Axis) -> std::result::Result<Step, String> {
        let node_test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name.clone()),
            other => return Err(format!("expected element name, found {other:?}")),
        };
        self.advance();

        let mut predicates = Vec::new();
        while self.current == Token::LeftBracket {
            self.advance();
            predicates.push(self.parse_predicate()?);
            self.expect(Token::RightBracket)?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> std::result::Result<Predicate, String> {
        match self.current.clone() {
            Token::Number(0) => Err("positions start at 1".to_string()),
            Token::Number(n) => {
                self.advance();
                Ok(Predicate::Position(n))
            }
            Token::At => {
                self.advance();
                let Token::Name(name) = self.current.clone() else {
                    return Err(format!("expected attribute name, found {:?}", self.current));
                };
                self.advance();
                self.expect(Token::Eq)?;
                let Token::String(value) = self.current.clone() else {
                    return Err(format!("expected quoted value, found {:?}", self.current));
                };
                self.advance();
                Ok(Predicate::AttributeEquals { name, value })
            }
            other => Err(format!("unsupported predicate starting with {other:?}")),
        }
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            f.write_str(match step.axis {
                Axis::Child => "/",
                Axis::Descendant => "//",
            })?;
            match &step.node_test {
                NodeTest::Any => f.write_str("*")?,
                NodeTest::Name(name) => f.write_str(name)?,
            }
            for predicate in &step.predicates {
                match predicate {
                    Predicate::Position(n) => write!(f, "[{n}]")?,
                    Predicate::AttributeEquals { name, value } if value.contains('\'') => {
                        write!(f, "[@{name}=\"{value}\"]")?
                    }
                    Predicate::AttributeEquals { name, value } => write!(f, "[@{name}='{value}']")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_positional() {
        let path = parse_path("/TEI[1]/text[1]/body[1]").unwrap();
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[0].axis, Axis::Child);
        assert_eq!(path.steps[2].node_test, NodeTest::Name("body".into()));
        assert_eq!(path.steps[2].predicates, vec![Predicate::Position(1)]);
    }

    #[test]
    fn test_parse_id_anchor() {
        let path = parse_path("//div[@xml:id='d1']/p[2]").unwrap();
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(
            path.steps[0].predicates,
            vec![Predicate::AttributeEquals {
                name: "xml:id".into(),
                value: "d1".into()
            }]
        );
        assert_eq!(path.steps[1].axis, Axis::Child);
    }

    #[rstest]
    #[case("/root[1]/child[1]")]
    #[case("//p[1]")]
    #[case("//text[@xml:id='t1']/body[1]/*[3]")]
    #[case("/a//b[@n=\"it's\"][2]")]
    fn test_display_roundtrip(#[case] input: &str) {
        assert_eq!(parse_path(input).unwrap().to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("root[1]")]
    #[case("/")]
    #[case("/p[0]")]
    #[case("/p[1")]
    #[case("/p[@n=1]")]
    #[case("/p[last()]")]
    #[case("/p/")]
    fn test_rejects(#[case] input: &str) {
        assert!(matches!(parse_path(input), Err(Error::InvalidPointerFormat(_))));
    }
}
