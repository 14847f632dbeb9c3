use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::functions::Arity;

#[derive(Debug, Diagnostic, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("malformed number literal")]
    #[diagnostic(
        code(plotcalc::lexer::malformed_number),
        help(
            "a number has at most one decimal point, followed by at least one digit, and must \
             fit in a 64-bit float"
        )
    )]
    MalformedNumber {
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("unexpected character '{found}'")]
    #[diagnostic(code(plotcalc::lexer::unexpected_char))]
    UnexpectedChar {
        found: char,
        #[label("here")]
        span: SourceSpan,
    },
}

impl LexError {
    /// Byte offset of the offending input.
    pub fn position(&self) -> usize {
        match self {
            LexError::MalformedNumber { span } | LexError::UnexpectedChar { span, .. } => {
                span.offset()
            }
        }
    }
}

#[derive(Debug, Diagnostic, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found}")]
    #[diagnostic(code(plotcalc::parser::unexpected_token))]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("unclosed parenthesis")]
    #[diagnostic(code(plotcalc::parser::unclosed_paren))]
    UnclosedParen {
        #[label("this parenthesis is never closed")]
        open: SourceSpan,
        #[label("expected ')' here")]
        span: SourceSpan,
    },

    #[error("{name}() takes {expected}, but {got} were given")]
    #[diagnostic(code(plotcalc::parser::arity_mismatch))]
    ArityMismatch {
        name: String,
        expected: Arity,
        got: usize,
        #[label("in this call")]
        span: SourceSpan,
    },

    #[error("unknown function '{name}'")]
    #[diagnostic(
        code(plotcalc::parser::unknown_function),
        help("single letters are variables, longer names must be known functions or constants")
    )]
    UnknownFunction {
        name: String,
        #[label("not a known function")]
        span: SourceSpan,
    },

    #[error("function '{name}' must be called with parentheses")]
    #[diagnostic(code(plotcalc::parser::expected_open_paren))]
    ExpectedOpenParen {
        name: String,
        #[label("expected '(' after this")]
        span: SourceSpan,
    },

    #[error("expression is nested too deeply")]
    #[diagnostic(code(plotcalc::parser::too_deeply_nested))]
    TooDeeplyNested {
        #[label("giving up here")]
        span: SourceSpan,
    },

    #[error("unexpected trailing input")]
    #[diagnostic(code(plotcalc::parser::trailing_input))]
    TrailingInput {
        #[label("the expression already ended before this")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// Byte offset of the offending input.
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnclosedParen { span, .. }
            | ParseError::ArityMismatch { span, .. }
            | ParseError::UnknownFunction { span, .. }
            | ParseError::ExpectedOpenParen { span, .. }
            | ParseError::TooDeeplyNested { span }
            | ParseError::TrailingInput { span } => span.offset(),
        }
    }
}

#[derive(Debug, Diagnostic, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("variable '{name}' has no value")]
    #[diagnostic(code(plotcalc::eval::unbound_variable))]
    UnboundVariable { name: String },

    #[error("division by zero")]
    #[diagnostic(code(plotcalc::eval::division_by_zero))]
    DivisionByZero,

    #[error("{operation} is undefined for {value}")]
    #[diagnostic(code(plotcalc::eval::domain_error))]
    DomainError { operation: String, value: f64 },

    #[error("unknown function '{name}'")]
    #[diagnostic(code(plotcalc::eval::unknown_function))]
    UnknownFunction { name: String },

    #[error("{name}() takes {expected}, but {got} were given")]
    #[diagnostic(code(plotcalc::eval::arity_mismatch))]
    ArityMismatch {
        name: String,
        expected: Arity,
        got: usize,
    },
}

impl EvalError {
    pub(crate) fn domain(operation: impl Into<String>, value: f64) -> Self {
        EvalError::DomainError {
            operation: operation.into(),
            value,
        }
    }

    /// Whether this failure only makes the current sample point undefined, as opposed to the
    /// expression being unusable at every point.
    pub fn is_undefined_point(&self) -> bool {
        matches!(
            self,
            EvalError::DivisionByZero | EvalError::DomainError { .. }
        )
    }
}

#[derive(Debug, Diagnostic, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("invalid sampling range {x_min}..{x_max}")]
    #[diagnostic(
        code(plotcalc::sampling::invalid_range),
        help("both ends must be finite and the start must be below the end")
    )]
    InvalidRange { x_min: f64, x_max: f64 },

    #[error("at least 2 sample points are needed, got {points}")]
    #[diagnostic(code(plotcalc::sampling::too_few_points))]
    TooFewPoints { points: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}
