use crate::{
    ast::{BinaryOperator, UnaryOperator},
    token::TokenKind,
};

impl BinaryOperator {
    pub(crate) fn from(op: &TokenKind) -> Self {
        match op {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::Caret => Self::Pow,

            _ => unreachable!(),
        }
    }
}

impl UnaryOperator {
    pub(crate) fn from(op: &TokenKind) -> Self {
        match op {
            TokenKind::Minus => Self::Neg,
            TokenKind::Plus => Self::Pos,

            _ => unreachable!(),
        }
    }
}

impl TokenKind<'_> {
    // A token that may start the right operand of an implicit multiplication, e.g. the `x` in
    // `2x` or the `(` in `3(x + 1)`. Numbers are excluded: `x 3` is rejected, not `x * 3`.
    pub(crate) fn starts_implicit_operand(&self) -> bool {
        matches!(self, TokenKind::Identifier(_) | TokenKind::OpenParen)
    }
}
