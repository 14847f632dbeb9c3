use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::LazyLock;

use crate::ast::Expression;
use crate::derivative::{add, div, mul, neg, num, pow, sub};
use crate::error::EvalError;

/// Accepted argument counts of a function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, 1) => write!(f, "1 argument"),
            (min, max) if min == max => write!(f, "{min} arguments"),
            (min, max) => write!(f, "{min} to {max} arguments"),
        }
    }
}

/// A callable function. Parsing, evaluation and differentiation all read the same definition,
/// so they agree on what a name means.
pub struct FunctionDefinition {
    pub name: &'static str,
    pub arity: Arity,

    /// Numeric semantic. Indexes its arguments unchecked, so callers go through [`Self::call`].
    pub(crate) eval: fn(&[f64]) -> Result<f64, EvalError>,

    /// Arguments: (arguments of the call, derivatives of those arguments).
    /// Returns the derivative of the whole call, chain rule included.
    pub(crate) derivative: fn(&[Expression], &[Expression]) -> Expression,
}

impl FunctionDefinition {
    pub fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::ArityMismatch {
                name: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }

        (self.eval)(args)
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

static FUNCTIONS: LazyLock<HashMap<&'static str, FunctionDefinition>> = LazyLock::new(|| {
    definitions()
        .into_iter()
        .map(|definition| (definition.name, definition))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static FunctionDefinition> {
    FUNCTIONS.get(name)
}

/// All function names, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = FUNCTIONS.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(PI),
        _ => None,
    }
}

fn call(name: &str, arg: &Expression) -> Expression {
    Expression::call(name, vec![arg.clone()])
}

fn require_positive(operation: &str, value: f64) -> Result<f64, EvalError> {
    if value <= 0.0 {
        return Err(EvalError::domain(operation, value));
    }
    Ok(value)
}

fn require_unit_interval(operation: &str, value: f64) -> Result<f64, EvalError> {
    if !(-1.0..=1.0).contains(&value) {
        return Err(EvalError::domain(operation, value));
    }
    Ok(value)
}

fn log_base(args: &[f64]) -> Result<f64, EvalError> {
    let value = require_positive("log", args[0])?;
    match args.get(1) {
        None => Ok(value.log10()),
        Some(&base) => {
            if base <= 0.0 || base == 1.0 {
                return Err(EvalError::domain("log base", base));
            }
            Ok(value.ln() / base.ln())
        }
    }
}

// d/dx log_b(u) with a constant base b
fn log_derivative(u: &Expression, du: &Expression, base: f64) -> Expression {
    div(
        du.clone(),
        mul(u.clone(), Expression::call("ln", vec![num(base)])),
    )
}

fn definitions() -> Vec<FunctionDefinition> {
    vec![
        // Trigonometric
        FunctionDefinition {
            name: "sin",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].sin()),
            derivative: |args, primes| mul(call("cos", &args[0]), primes[0].clone()),
        },
        FunctionDefinition {
            name: "cos",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].cos()),
            derivative: |args, primes| neg(mul(call("sin", &args[0]), primes[0].clone())),
        },
        // Near odd multiples of pi/2 this returns a huge finite value rather than failing.
        FunctionDefinition {
            name: "tan",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].tan()),
            derivative: |args, primes| div(primes[0].clone(), pow(call("cos", &args[0]), num(2.0))),
        },
        FunctionDefinition {
            name: "asin",
            arity: Arity::exactly(1),
            eval: |args| require_unit_interval("asin", args[0]).map(f64::asin),
            derivative: |args, primes| {
                div(
                    primes[0].clone(),
                    call("sqrt", &sub(num(1.0), pow(args[0].clone(), num(2.0)))),
                )
            },
        },
        FunctionDefinition {
            name: "acos",
            arity: Arity::exactly(1),
            eval: |args| require_unit_interval("acos", args[0]).map(f64::acos),
            derivative: |args, primes| {
                neg(div(
                    primes[0].clone(),
                    call("sqrt", &sub(num(1.0), pow(args[0].clone(), num(2.0)))),
                ))
            },
        },
        FunctionDefinition {
            name: "atan",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].atan()),
            derivative: |args, primes| {
                div(primes[0].clone(), add(num(1.0), pow(args[0].clone(), num(2.0))))
            },
        },
        // Hyperbolic
        FunctionDefinition {
            name: "sinh",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].sinh()),
            derivative: |args, primes| mul(call("cosh", &args[0]), primes[0].clone()),
        },
        FunctionDefinition {
            name: "cosh",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].cosh()),
            derivative: |args, primes| mul(call("sinh", &args[0]), primes[0].clone()),
        },
        FunctionDefinition {
            name: "tanh",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].tanh()),
            derivative: |args, primes| {
                div(primes[0].clone(), pow(call("cosh", &args[0]), num(2.0)))
            },
        },
        // Exponential and logarithmic
        FunctionDefinition {
            name: "exp",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].exp()),
            derivative: |args, primes| mul(call("exp", &args[0]), primes[0].clone()),
        },
        FunctionDefinition {
            name: "ln",
            arity: Arity::exactly(1),
            eval: |args| require_positive("ln", args[0]).map(f64::ln),
            derivative: |args, primes| div(primes[0].clone(), args[0].clone()),
        },
        FunctionDefinition {
            name: "log10",
            arity: Arity::exactly(1),
            eval: |args| require_positive("log10", args[0]).map(f64::log10),
            derivative: |args, primes| log_derivative(&args[0], &primes[0], 10.0),
        },
        FunctionDefinition {
            name: "log2",
            arity: Arity::exactly(1),
            eval: |args| require_positive("log2", args[0]).map(f64::log2),
            derivative: |args, primes| log_derivative(&args[0], &primes[0], 2.0),
        },
        // log(x) is base 10, log(x, b) is base b
        FunctionDefinition {
            name: "log",
            arity: Arity::between(1, 2),
            eval: log_base,
            derivative: |args, primes| match args {
                [u] => log_derivative(u, &primes[0], 10.0),
                [u, b] => {
                    // log_b(u) = ln(u) / ln(b), quotient rule over both
                    let ln_u = call("ln", u);
                    let ln_b = call("ln", b);
                    div(
                        sub(
                            mul(div(primes[0].clone(), u.clone()), ln_b.clone()),
                            mul(ln_u, div(primes[1].clone(), b.clone())),
                        ),
                        pow(ln_b, num(2.0)),
                    )
                }
                _ => unreachable!("log called with {} arguments", args.len()),
            },
        },
        // Roots and magnitude
        FunctionDefinition {
            name: "sqrt",
            arity: Arity::exactly(1),
            eval: |args| {
                if args[0] < 0.0 {
                    return Err(EvalError::domain("sqrt", args[0]));
                }
                Ok(args[0].sqrt())
            },
            derivative: |args, primes| {
                div(primes[0].clone(), mul(num(2.0), call("sqrt", &args[0])))
            },
        },
        FunctionDefinition {
            name: "cbrt",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].cbrt()),
            derivative: |args, primes| {
                div(
                    primes[0].clone(),
                    mul(num(3.0), pow(call("cbrt", &args[0]), num(2.0))),
                )
            },
        },
        FunctionDefinition {
            name: "abs",
            arity: Arity::exactly(1),
            eval: |args| Ok(args[0].abs()),
            derivative: |args, primes| {
                mul(primes[0].clone(), div(args[0].clone(), call("abs", &args[0])))
            },
        },
    ]
}
