use crate::error::LexError;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'source> {
    source: &'source str,
    rest: &'source str,
    position: usize,
    finished: bool,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            finished: false,
        }
    }
}

/// Lexes the whole source. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
    log::trace!("lexed {} tokens from {source:?}", tokens.len());

    Ok(tokens)
}

macro_rules! token {
    ($kind:ident, $start:ident, $self:ident) => {
        return Some(Ok(Token {
            kind: TokenKind::$kind,
            span: Span {
                start: $start,
                end: $self.position,
            },
        }))
    };
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<Token<'source>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.eat_whitespace();

        let mut chars = self.rest.chars();
        let Some(c) = chars.next() else {
            self.finished = true;
            let end = self.source.len();
            return Some(Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
            }));
        };
        let c_start = self.position;

        // Numbers and identifiers are scanned from their first character
        match c {
            '0'..='9' => return Some(self.parse_number(c_start)),
            '.' if matches!(chars.clone().next(), Some('0'..='9')) => {
                return Some(self.parse_number(c_start))
            }
            'a'..='z' | 'A'..='Z' => return Some(Ok(self.parse_ident(c_start))),
            _ => {}
        }

        self.rest = chars.as_str();
        self.position += c.len_utf8();

        match c {
            '+' => token!(Plus, c_start, self),
            '-' => token!(Minus, c_start, self),
            '*' => token!(Star, c_start, self),
            '/' => token!(Slash, c_start, self),
            '^' => token!(Caret, c_start, self),
            '(' => token!(OpenParen, c_start, self),
            ')' => token!(CloseParen, c_start, self),
            ',' => token!(Comma, c_start, self),

            found => {
                // Stop after the first error; the rest of the input is not meaningful
                self.finished = true;
                Some(Err(LexError::UnexpectedChar {
                    found,
                    span: Span::new(c_start, self.position).into(),
                }))
            }
        }
    }
}

impl<'source> Lexer<'source> {
    fn eat_whitespace(&mut self) {
        let trimmed = self.rest.trim_start();
        self.position += self.rest.len() - trimmed.len();
        self.rest = trimmed;
    }

    fn advance(&mut self, width: usize) {
        self.position += width;
        self.rest = &self.rest[width..];
    }

    fn parse_ident(&mut self, start: usize) -> Token<'source> {
        let len = self
            .rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(self.rest.len());

        let rest = self.rest;
        let ident = &rest[..len];
        self.advance(len);

        Token {
            kind: TokenKind::Identifier(ident),
            span: Span {
                start,
                end: self.position,
            },
        }
    }

    fn parse_number(&mut self, start: usize) -> Result<Token<'source>, LexError> {
        let bytes = self.rest.as_bytes();
        let mut len = 0;
        let mut has_fraction = false;

        while let Some(&c) = bytes.get(len) {
            match c {
                b'0'..=b'9' => len += 1,
                b'.' => {
                    let followed_by_digit = matches!(bytes.get(len + 1), Some(b'0'..=b'9'));
                    if has_fraction || !followed_by_digit {
                        // Swallow the rest of the literal so the label covers all of it
                        let end = bytes[len + 1..]
                            .iter()
                            .position(|c| !matches!(c, b'0'..=b'9' | b'.'))
                            .map_or(bytes.len(), |p| len + 1 + p);
                        self.finished = true;
                        return Err(LexError::MalformedNumber {
                            span: Span::new(start, start + end).into(),
                        });
                    }
                    has_fraction = true;
                    len += 1;
                }
                _ => break,
            }
        }

        let literal = &self.rest[..len];
        // Literals too large for an f64 would otherwise read as infinity
        let Some(value) = literal.parse::<f64>().ok().filter(|v| v.is_finite()) else {
            self.finished = true;
            return Err(LexError::MalformedNumber {
                span: Span::new(start, start + len).into(),
            });
        };
        self.advance(len);

        Ok(Token {
            kind: TokenKind::Number(value),
            span: Span {
                start,
                end: self.position,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind<'_>> {
        tokenize(source)
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_parse_numbers() {
        for (input, expected) in [
            ("3", 3.0),
            ("345", 345.0),
            #[allow(clippy::approx_constant)]
            ("3.14", 3.14),
            ("0.5", 0.5),
            (".5", 0.5),
            ("007", 7.0),
        ] {
            let mut lexer = Lexer::new(input);
            let token = lexer.next().unwrap().unwrap();
            assert_eq!(token.kind, TokenKind::Number(expected), "when lexing '{input}'");
            assert_eq!(token.span, Span::new(0, input.len()));
        }

        // Invalid numbers
        for (input, span_end) in [("1.2.3", 5), ("3.", 2), ("3.x", 2), ("4..5", 4)] {
            let mut lexer = Lexer::new(input);
            let token = lexer.next().unwrap();
            assert_eq!(
                token,
                Err(LexError::MalformedNumber {
                    span: Span::new(0, span_end).into()
                }),
                "when lexing '{input}'"
            );
        }
    }

    #[test]
    fn huge_literals_are_malformed() {
        let huge = "9".repeat(400);
        assert_eq!(
            tokenize(&format!("x + {huge}")),
            Err(LexError::MalformedNumber {
                span: Span::new(4, 404).into()
            })
        );
    }

    #[test]
    fn identifiers() {
        assert_eq!(
            kinds("sin(x)"),
            vec![
                TokenKind::Identifier("sin"),
                TokenKind::OpenParen,
                TokenKind::Identifier("x"),
                TokenKind::CloseParen,
                TokenKind::Eof,
            ]
        );

        // Digits continue a name but never start one
        assert_eq!(
            kinds("log10(2x)"),
            vec![
                TokenKind::Identifier("log10"),
                TokenKind::OpenParen,
                TokenKind::Number(2.0),
                TokenKind::Identifier("x"),
                TokenKind::CloseParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn operators_and_whitespace() {
        assert_eq!(
            kinds("  1 +2*  3 -4/5^6 , ( ) "),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Star,
                TokenKind::Number(3.0),
                TokenKind::Minus,
                TokenKind::Number(4.0),
                TokenKind::Slash,
                TokenKind::Number(5.0),
                TokenKind::Caret,
                TokenKind::Number(6.0),
                TokenKind::Comma,
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans() {
        let tokens = tokenize(" x + 12.5").unwrap();
        let spans: Vec<_> = tokens.iter().map(|t| (t.span.start, t.span.end)).collect();
        assert_eq!(spans, vec![(1, 2), (3, 4), (5, 9), (9, 9)]);
    }

    #[test]
    fn eof_is_always_last() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);

        let mut lexer = Lexer::new("x");
        assert!(lexer.next().is_some());
        assert!(lexer.next().is_some());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn unexpected_characters() {
        for (input, found, position) in [
            ("x % 2", '%', 2),
            ("2 = x", '=', 2),
            (". 5", '.', 0),
            ("x²", '²', 1),
        ] {
            let error = tokenize(input).unwrap_err();
            assert_eq!(
                error,
                LexError::UnexpectedChar {
                    found,
                    span: Span::new(position, position + found.len_utf8()).into()
                },
                "when lexing '{input}'"
            );
            assert_eq!(error.position(), position);
        }
    }
}
