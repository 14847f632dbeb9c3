use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::ParseError;
use crate::functions;
use crate::grammar::{infix_precedence, IMPLICIT_MULTIPLICATION, PREFIX_BINDING_POWER};
use crate::lexer::tokenize;
use crate::token::{Span, Token, TokenKind};

/// How deeply parentheses, calls and prefix operators may nest, and how tall the resulting tree
/// may grow. Long operator chains such as `x+x+...+x` count towards the height too.
pub const MAX_DEPTH: usize = 256;

/// Lexes and parses `source` in one go.
pub fn parse(source: &str) -> Result<Expression, ParseError> {
    Parser::new(tokenize(source)?).parse()
}

pub struct Parser<'source> {
    tokens: Vec<Token<'source>>,
    position: usize,
    depth: usize,
}

// A parsed subtree and its height.
type Parsed = (Expression, usize);

impl<'source> Parser<'source> {
    pub fn new(mut tokens: Vec<Token<'source>>) -> Self {
        // The cursor relies on an Eof sentinel at the end
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
            });
        }

        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        let (expression, _) = self.parse_expression_within(0)?;

        // Ensure we've consumed all tokens
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            return Err(ParseError::TrailingInput {
                span: token.span.into(),
            });
        }

        log::debug!("parsed expression: {expression}");
        Ok(expression)
    }

    fn peek(&self) -> &Token<'source> {
        &self.tokens[self.position]
    }

    fn next(&mut self) -> Token<'source> {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn parse_expression_within(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeeplyNested {
                span: self.peek().span.into(),
            });
        }

        let result = self.parse_operators(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_operators(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        let (mut lhs, mut height) = self.parse_prefix()?;

        loop {
            let token = self.peek();
            let span = token.span;
            let kind = &token.kind;
            let (precedence, op, explicit) = if let Some(precedence) = infix_precedence(kind) {
                (precedence, BinaryOperator::from(kind), true)
            } else if kind.starts_implicit_operand() {
                // `2x`, `3(x + 1)`, `2sin(x)`: a term directly followed by another term is a
                // product. No token is consumed for the missing operator.
                (IMPLICIT_MULTIPLICATION, BinaryOperator::Mul, false)
            } else {
                break;
            };

            if precedence.binding_power < min_bp {
                break;
            }

            if explicit {
                self.next();
            }

            let (rhs, rhs_height) = self.parse_expression_within(precedence.rhs_binding_power())?;
            height = grow(height.max(rhs_height), span)?;
            lhs = Expression::binary(op, lhs, rhs);
        }

        Ok((lhs, height))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::Number(n) => Ok((Expression::Number(n), 1)),
            TokenKind::Identifier(name) if name.len() == 1 => Ok((Expression::variable(name), 1)),
            TokenKind::Identifier(name) => self.parse_named(name, token.span),
            TokenKind::OpenParen => {
                let inner = self.parse_expression_within(0)?;
                self.expect_close_paren(token.span)?;
                Ok(inner)
            }
            TokenKind::Minus | TokenKind::Plus => {
                let (operand, height) = self.parse_expression_within(PREFIX_BINDING_POWER)?;
                let op = UnaryOperator::from(&token.kind);
                match (op, operand) {
                    // `-2` is a literal, so printing a negative number reparses to the same tree
                    (UnaryOperator::Neg, Expression::Number(n)) if n.is_sign_positive() => {
                        Ok((Expression::Number(-n), 1))
                    }
                    (op, operand) => {
                        Ok((Expression::unary(op, operand), grow(height, token.span)?))
                    }
                }
            }
            kind => Err(ParseError::UnexpectedToken {
                found: kind.to_string(),
                expected: "an expression",
                span: token.span.into(),
            }),
        }
    }

    // A name longer than one letter: a constant, or a call of a known function.
    fn parse_named(&mut self, name: &str, span: Span) -> Result<Parsed, ParseError> {
        if let Some(value) = functions::constant(name) {
            return Ok((Expression::Number(value), 1));
        }

        let Some(definition) = functions::lookup(name) else {
            return Err(ParseError::UnknownFunction {
                name: name.to_string(),
                span: span.into(),
            });
        };

        if self.peek().kind != TokenKind::OpenParen {
            return Err(ParseError::ExpectedOpenParen {
                name: name.to_string(),
                span: span.into(),
            });
        }

        let open = self.next().span;
        let (args, args_height, close) = self.parse_args(open)?;

        if !definition.arity.accepts(args.len()) {
            return Err(ParseError::ArityMismatch {
                name: name.to_string(),
                expected: definition.arity,
                got: args.len(),
                span: span.to(close).into(),
            });
        }

        Ok((Expression::call(name, args), grow(args_height, span)?))
    }

    // Returns the arguments, the height of the tallest one and the span of the closing `)`.
    fn parse_args(&mut self, open: Span) -> Result<(Vec<Expression>, usize, Span), ParseError> {
        let mut args = Vec::new();
        let mut height = 0;
        if self.peek().kind == TokenKind::CloseParen {
            return Ok((args, height, self.next().span));
        }

        loop {
            let (arg, arg_height) = self.parse_expression_within(0)?;
            args.push(arg);
            height = height.max(arg_height);

            let token = self.next();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::CloseParen => return Ok((args, height, token.span)),
                TokenKind::Eof => {
                    return Err(ParseError::UnclosedParen {
                        open: open.into(),
                        span: token.span.into(),
                    })
                }
                kind => {
                    return Err(ParseError::UnexpectedToken {
                        found: kind.to_string(),
                        expected: "',' or ')'",
                        span: token.span.into(),
                    })
                }
            }
        }
    }

    fn expect_close_paren(&mut self, open: Span) -> Result<Span, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::CloseParen => Ok(token.span),
            TokenKind::Eof => Err(ParseError::UnclosedParen {
                open: open.into(),
                span: token.span.into(),
            }),
            kind => Err(ParseError::UnexpectedToken {
                found: kind.to_string(),
                expected: "')'",
                span: token.span.into(),
            }),
        }
    }
}

// Height of a new node over children of height `height`. Every tree walk recurses once per
// level, so the tree may never get taller than `MAX_DEPTH`.
fn grow(height: usize, span: Span) -> Result<usize, ParseError> {
    let height = height + 1;
    if height > MAX_DEPTH {
        return Err(ParseError::TooDeeplyNested { span: span.into() });
    }
    Ok(height)
}
