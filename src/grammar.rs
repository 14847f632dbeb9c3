use crate::token::TokenKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Precedence {
    pub binding_power: u8,
    pub associativity: Associativity,
}

impl Precedence {
    const fn left(binding_power: u8) -> Self {
        Self {
            binding_power,
            associativity: Associativity::Left,
        }
    }

    const fn right(binding_power: u8) -> Self {
        Self {
            binding_power,
            associativity: Associativity::Right,
        }
    }

    /// Minimum binding power to parse the right hand side with.
    pub fn rhs_binding_power(&self) -> u8 {
        match self.associativity {
            Associativity::Left => self.binding_power + 1,
            Associativity::Right => self.binding_power,
        }
    }
}

// Low to high: additive, multiplicative (implicit multiplication included), unary prefix, power.
// Unary minus binds looser than `^` on its operand, so `-x^2` is `-(x^2)`, but tighter than `*`.
pub const ADDITIVE: Precedence = Precedence::left(10);
pub const MULTIPLICATIVE: Precedence = Precedence::left(20);
pub const POWER: Precedence = Precedence::right(40);

/// Binding power of the operand of a unary `+` or `-`.
pub const PREFIX_BINDING_POWER: u8 = 30;

/// Juxtaposition such as `2x` binds exactly like an explicit `*`.
pub const IMPLICIT_MULTIPLICATION: Precedence = MULTIPLICATIVE;

pub fn infix_precedence(kind: &TokenKind) -> Option<Precedence> {
    Some(match kind {
        TokenKind::Plus | TokenKind::Minus => ADDITIVE,
        TokenKind::Star | TokenKind::Slash => MULTIPLICATIVE,
        TokenKind::Caret => POWER,

        _ => return None,
    })
}
