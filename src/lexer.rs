//! Lexer for PostScript-family source text.
//!
//! Converts source text into a flat token stream with line/column
//! tracking for each token's first character.

use crate::error::LexerError;

const DELIMITERS: &str = " \t\n\r(){}[]<>/%";

/// A lexical token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Real(f64),
    String(String),
    Name(String),
    LiteralName(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eof,
}

/// Tokenizes PostScript-family source text.
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer { input: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    /// Tokenizes the entire input, terminated by a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (line, column) = (self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, line, column });
                break;
            };

            let kind = match c {
                '{' => {
                    self.advance();
                    TokenKind::LBrace
                }
                '}' => {
                    self.advance();
                    TokenKind::RBrace
                }
                '[' => {
                    self.advance();
                    TokenKind::LBracket
                }
                ']' => {
                    self.advance();
                    TokenKind::RBracket
                }
                '(' => self.read_string(line, column)?,
                '/' => {
                    self.advance();
                    TokenKind::LiteralName(self.read_name_chars())
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                    self.read_number_or_name()
                }
                _ => TokenKind::Name(self.read_name_chars()),
            };
            tokens.push(Token { kind, line, column });
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\n') | Some('\r') => {
                    self.advance();
                }
                Some('%') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string(&mut self, start_line: usize, start_column: usize) -> Result<TokenKind, LexerError> {
        self.advance(); // consume '('
        let mut depth = 1;
        let mut result = String::new();
        while depth > 0 {
            let Some(c) = self.peek() else {
                return Err(LexerError::UnterminatedString { line: start_line, column: start_column });
            };
            match c {
                '(' => {
                    depth += 1;
                    result.push(c);
                    self.advance();
                }
                ')' => {
                    depth -= 1;
                    self.advance();
                    if depth > 0 {
                        result.push(c);
                    }
                }
                '\\' => {
                    self.advance();
                    let Some(escaped) = self.advance() else {
                        return Err(LexerError::UnterminatedString { line: start_line, column: start_column });
                    };
                    result.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                }
                _ => {
                    result.push(c);
                    self.advance();
                }
            }
        }
        Ok(TokenKind::String(result))
    }

    fn read_name_chars(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if DELIMITERS.contains(c) {
                break;
            }
            s.push(c);
            self.advance();
        }
        s
    }

    /// Reads a number, falling back to a name if the leading sign/dot run
    /// doesn't end up delimiter-terminated with at least one digit (so
    /// `--foo` lexes as a name, not a number).
    fn read_number_or_name(&mut self) -> TokenKind {
        let start = self.pos;
        let (start_line, start_col) = (self.line, self.column);

        if matches!(self.peek(), Some('+') | Some('-')) {
            self.advance();
        }
        let mut has_digit = false;
        let mut has_dot = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    has_digit = true;
                    self.advance();
                }
                Some('.') if !has_dot => {
                    has_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let next_is_delimiter = match self.peek() {
            None => true,
            Some(c) => DELIMITERS.contains(c),
        };

        if has_digit && next_is_delimiter {
            let text: String = self.input[start..self.pos].iter().collect();
            if has_dot {
                if let Ok(f) = text.parse::<f64>() {
                    return TokenKind::Real(f);
                }
            } else if let Ok(i) = text.parse::<i64>() {
                return TokenKind::Int(i);
            }
        }

        // Not a valid number: rewind and lex the same characters as a name.
        self.pos = start;
        self.line = start_line;
        self.column = start_col;
        TokenKind::Name(self.read_name_chars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 3.14 -10 +5"),
            vec![
                TokenKind::Int(42),
                TokenKind::Real(3.14),
                TokenKind::Int(-10),
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn sign_only_is_a_name() {
        assert_eq!(kinds("--foo"), vec![TokenKind::Name("--foo".into()), TokenKind::Eof]);
    }

    #[test]
    fn names_and_literal_names() {
        assert_eq!(
            kinds("add /x"),
            vec![TokenKind::Name("add".into()), TokenKind::LiteralName("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn nested_parens_in_string() {
        assert_eq!(
            kinds("(nested (parens))"),
            vec![TokenKind::String("nested (parens)".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r"(a\nb\)c)"), vec![TokenKind::String("a\nb)c".into()), TokenKind::Eof]);
    }

    #[test]
    fn unrecognized_escape_yields_the_literal_character() {
        assert_eq!(kinds(r"(a\bc)"), vec![TokenKind::String("abc".into()), TokenKind::Eof]);
    }

    #[test]
    fn comment_is_skipped() {
        assert_eq!(
            kinds("1 % comment\n2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_errors() {
        let err = Lexer::new("(unterminated").tokenize().unwrap_err();
        assert!(matches!(err, LexerError::UnterminatedString { .. }));
    }

    #[test]
    fn brackets_and_braces() {
        assert_eq!(
            kinds("{ } [ ]"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }
}
