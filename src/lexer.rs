use thiserror::Error;

use crate::token::{Keyword, Span, Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Expected '=' after '!' at line {line}, column {column}")]
    TruncatedOperator { line: usize, column: usize },
    #[error("Invalid number literal '{literal}' at line {line}, column {column}")]
    InvalidNumberLiteral {
        literal: String,
        line: usize,
        column: usize,
    },
}

pub type LexResult<T> = Result<T, LexError>;

/// Turns source text into a token sequence terminated by `Eof`.
///
/// Newlines are significant (they terminate statements) and are emitted as
/// `Newline` tokens; other whitespace is skipped. A comma consumes any
/// following inline whitespace.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            let span = self.span();

            if ch == '\n' {
                self.consume_char();
                tokens.push(Token::new(TokenKind::Newline, span));
                continue;
            }
            if ch.is_whitespace() {
                self.consume_char();
                continue;
            }
            if ch == '/' && self.peek_next_char() == Some('/') {
                self.consume_while(|c| c != '\n');
                continue;
            }

            let token = if ch.is_ascii_alphabetic() || ch == '_' {
                self.read_identifier_or_keyword(span)
            } else if ch.is_ascii_digit() {
                self.read_number(span)?
            } else if ch == '"' {
                self.read_string(span)
            } else {
                self.read_symbol(ch, span)?
            };
            tokens.push(token);
        }

        tokens.push(Token::new(TokenKind::Eof, self.span()));
        Ok(tokens)
    }

    fn read_identifier_or_keyword(&mut self, span: Span) -> Token {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let word = &self.source[start..self.pos];

        let kind = match Keyword::from_str(word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word.to_string()),
        };
        Token::new(kind, span)
    }

    fn read_number(&mut self, span: Span) -> LexResult<Token> {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') {
            self.consume_char();
            self.consume_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.consume_char();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.consume_char();
            }
            self.consume_while(|c| c.is_ascii_digit());
        }

        let literal = &self.source[start..self.pos];
        let value = literal
            .parse::<f64>()
            .map_err(|_| LexError::InvalidNumberLiteral {
                literal: literal.to_string(),
                line: span.line,
                column: span.column,
            })?;
        Ok(Token::new(TokenKind::Number(value), span))
    }

    // A string that reaches end of input without a closing quote is accepted
    // with the content read so far.
    fn read_string(&mut self, span: Span) -> Token {
        self.consume_char(); // opening quote
        let mut value = String::new();

        while let Some(ch) = self.peek_char() {
            if ch == '"' {
                break;
            }
            self.consume_char();
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            match self.peek_char() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some(other) => value.push(other),
                None => break,
            }
            self.consume_char();
        }
        if self.peek_char() == Some('"') {
            self.consume_char(); // closing quote
        }
        Token::new(TokenKind::Str(value), span)
    }

    fn read_symbol(&mut self, ch: char, span: Span) -> LexResult<Token> {
        self.consume_char();
        let followed_by_equal = self.peek_char() == Some('=');

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => {
                // Consume inline whitespace so list literals and argument
                // lists can continue on the same or the next line.
                self.consume_while(|c| c.is_whitespace() && c != '\n');
                TokenKind::Comma
            }
            '=' if followed_by_equal => self.two_char(TokenKind::EqualEqual),
            '=' => TokenKind::Equal,
            '+' if followed_by_equal => self.two_char(TokenKind::PlusEqual),
            '+' => TokenKind::Plus,
            '-' if followed_by_equal => self.two_char(TokenKind::MinusEqual),
            '-' => TokenKind::Minus,
            '*' if followed_by_equal => self.two_char(TokenKind::StarEqual),
            '*' => TokenKind::Star,
            '/' if followed_by_equal => self.two_char(TokenKind::SlashEqual),
            '/' => TokenKind::Slash,
            '%' if followed_by_equal => self.two_char(TokenKind::PercentEqual),
            '%' => TokenKind::Percent,
            '^' if followed_by_equal => self.two_char(TokenKind::CaretEqual),
            '^' => TokenKind::Caret,
            '<' if followed_by_equal => self.two_char(TokenKind::LessEqual),
            '<' => TokenKind::Less,
            '>' if followed_by_equal => self.two_char(TokenKind::GreaterEqual),
            '>' => TokenKind::Greater,
            '!' if followed_by_equal => self.two_char(TokenKind::BangEqual),
            '!' => {
                return Err(LexError::TruncatedOperator {
                    line: span.line,
                    column: span.column,
                });
            }
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    line: span.line,
                    column: span.column,
                });
            }
        };
        Ok(Token::new(kind, span))
    }

    fn two_char(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char(); // the '='
        kind
    }

    fn consume_while<P>(&mut self, keep: P)
    where
        P: Fn(char) -> bool,
    {
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            self.consume_char();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += c.len_utf8();
        Some(c)
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }
}

pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_assignment_and_call() {
        let input = indoc! {"
            x = 1 + 2
            print(x)
        "};
        let expected = vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Equal,
            TokenKind::Number(1.0),
            TokenKind::Plus,
            TokenKind::Number(2.0),
            TokenKind::Newline,
            TokenKind::Identifier("print".to_string()),
            TokenKind::LParen,
            TokenKind::Identifier("x".to_string()),
            TokenKind::RParen,
            TokenKind::Newline,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn recognizes_keywords_and_identifiers() {
        let input = "while condition and not done_";
        let expected = vec![
            TokenKind::Keyword(Keyword::While),
            TokenKind::Identifier("condition".to_string()),
            TokenKind::Keyword(Keyword::And),
            TokenKind::Keyword(Keyword::Not),
            TokenKind::Identifier("done_".to_string()),
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn identifier_may_start_with_underscore() {
        assert_eq!(
            kinds("_tmp3"),
            vec![TokenKind::Identifier("_tmp3".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn tokenizes_numbers_with_fraction_and_exponent() {
        assert_eq!(
            kinds("3.14 1e3 2.5e-2 7"),
            vec![
                TokenKind::Number(3.14),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.025),
                TokenKind::Number(7.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"\\q""#),
            vec![TokenKind::Str("a\nb\t\"\\q".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_escape_is_copied_verbatim() {
        assert_eq!(
            kinds(r#""a\qb""#),
            vec![TokenKind::Str("aqb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn tokenizes_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= += -= *= /= %= ^="),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::StarEqual,
                TokenKind::SlashEqual,
                TokenKind::PercentEqual,
                TokenKind::CaretEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments_but_keeps_the_newline() {
        let input = "x = 1 // trailing note\ny = 2";
        let expected = vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Equal,
            TokenKind::Number(1.0),
            TokenKind::Newline,
            TokenKind::Identifier("y".to_string()),
            TokenKind::Equal,
            TokenKind::Number(2.0),
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn comma_consumes_inline_whitespace_only() {
        assert_eq!(
            kinds("[1,   2,\n3]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Number(1.0),
                TokenKind::Comma,
                TokenKind::Number(2.0),
                TokenKind::Comma,
                TokenKind::Newline,
                TokenKind::Number(3.0),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn errors_on_unexpected_character() {
        let err = tokenize("x = @").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                line: 1,
                column: 5
            }
        );
    }

    #[test]
    fn errors_on_bang_without_equal() {
        let err = tokenize("!x").expect_err("expected truncated operator");
        assert_eq!(err, LexError::TruncatedOperator { line: 1, column: 1 });
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = tokenize("a\nb\nc").expect("tokenize should succeed");
        let lines: Vec<usize> = tokens.iter().map(|token| token.span.line).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 3, 3]);
    }
}
