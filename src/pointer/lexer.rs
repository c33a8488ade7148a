//! Path Lexer
//!
//! Tokenizes the path part of a pointer: slashes, names, predicates with
//! ordinals or attribute comparisons.

/// Path token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Slash,        // /
    DoubleSlash,  // //
    At,           // @
    Star,         // *
    Eq,           // =
    LeftBracket,  // [
    RightBracket, // ]

    Number(usize),
    String(String),
    /// Element or attribute name, possibly prefixed (`xml:id`)
    Name(String),

    /// Character that starts no token, or an unterminated literal
    Invalid(String),

    Eof,
}

/// Path lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Advance by n bytes
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::Eof,
        };

        match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '@' => {
                self.advance(1);
                Token::At
            }
            '*' => {
                self.advance(1);
                Token::Star
            }
            '=' => {
                self.advance(1);
                Token::Eq
            }
            '[' => {
                self.advance(1);
                Token::LeftBracket
            }
            ']' => {
                self.advance(1);
                Token::RightBracket
            }
            '"' | '\'' => self.read_string(c),
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name(),
            _ => {
                self.advance(c.len_utf8());
                Token::Invalid(c.to_string())
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        let digits = &self.input[start..self.pos];
        match digits.parse() {
            Ok(value) => Token::Number(value),
            Err(_) => Token::Invalid(digits.to_string()),
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        self.advance(1);
        let start = self.pos;
        match self.remaining().find(quote) {
            Some(len) => {
                self.advance(len);
                let value = self.input[start..self.pos].to_string();
                self.advance(1);
                Token::String(value)
            }
            None => {
                self.pos = self.input.len();
                Token::Invalid(format!("{quote}{}", &self.input[start..]))
            }
        }
    }

    /// Read a name; one `prefix:` is folded into it
    fn read_name(&mut self) -> Token {
        let start = self.pos;
        self.read_name_chars();
        if self.peek() == Some(':') && self.peek_at(1).is_some_and(is_name_start_char) {
            self.advance(1);
            self.read_name_chars();
        }
        Token::Name(self.input[start..self.pos].to_string())
    }

    fn read_name_chars(&mut self) {
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            match lexer.next_token() {
                Token::Eof => break,
                token => out.push(token),
            }
        }
        out
    }

    #[test]
    fn test_positional_path() {
        assert_eq!(
            tokens("/TEI[1]/text[1]"),
            vec![
                Token::Slash,
                Token::Name("TEI".into()),
                Token::LeftBracket,
                Token::Number(1),
                Token::RightBracket,
                Token::Slash,
                Token::Name("text".into()),
                Token::LeftBracket,
                Token::Number(1),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_id_predicate() {
        assert_eq!(
            tokens("//div[@xml:id='ch-1']"),
            vec![
                Token::DoubleSlash,
                Token::Name("div".into()),
                Token::LeftBracket,
                Token::At,
                Token::Name("xml:id".into()),
                Token::Eq,
                Token::String("ch-1".into()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(tokens("p[!]")[2], Token::Invalid("!".into()));
        assert_eq!(tokens("p[@n='x")[4], Token::Invalid("'x".into()));
        assert_eq!(tokens("*"), vec![Token::Star]);
    }
}
