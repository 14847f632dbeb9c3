use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::EvalError;
use crate::functions;

/// Values of the free variables an expression is evaluated with.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl<S: BuildHasher> Bindings for HashMap<String, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<S: BuildHasher> Bindings for HashMap<&str, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// A single variable, e.g. `("x", 2.0)`.
impl Bindings for (&str, f64) {
    fn lookup(&self, name: &str) -> Option<f64> {
        (self.0 == name).then_some(self.1)
    }
}

impl Bindings for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(variable, _)| *variable == name)
            .map(|&(_, value)| value)
    }
}

impl<const N: usize> Bindings for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.as_slice().lookup(name)
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn lookup(&self, name: &str) -> Option<f64> {
        (**self).lookup(name)
    }
}

/// Evaluates `expression` with the given variable values.
///
/// Either the whole expression evaluates to one number or evaluation stops at the first failure.
/// A NaN never escapes: any operation that produces one fails with [`EvalError::DomainError`]
/// instead. Infinities from overflow are returned as they are.
pub fn evaluate<B: Bindings + ?Sized>(
    expression: &Expression,
    bindings: &B,
) -> Result<f64, EvalError> {
    match expression {
        Expression::Number(n) => Ok(*n),
        Expression::Variable(name) => match bindings.lookup(name) {
            Some(value) if value.is_nan() => Err(EvalError::domain(name.as_str(), value)),
            Some(value) => Ok(value),
            None => Err(EvalError::UnboundVariable { name: name.clone() }),
        },
        Expression::UnaryOp { op, operand } => {
            let value = evaluate(operand, bindings)?;
            Ok(match op {
                UnaryOperator::Neg => -value,
                UnaryOperator::Pos => value,
            })
        }
        Expression::BinaryOp { op, lhs, rhs } => {
            let lhs = evaluate(lhs, bindings)?;
            let rhs = evaluate(rhs, bindings)?;
            binary(*op, lhs, rhs)
        }
        Expression::FunctionCall { name, args } => {
            let definition =
                functions::lookup(name).ok_or_else(|| EvalError::UnknownFunction {
                    name: name.clone(),
                })?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;

            let value = definition.call(&args)?;
            if value.is_nan() {
                let argument = args.first().copied().unwrap_or(f64::NAN);
                return Err(EvalError::domain(name.as_str(), argument));
            }
            Ok(value)
        }
    }
}

fn binary(op: BinaryOperator, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let value = match op {
        BinaryOperator::Add => lhs + rhs,
        BinaryOperator::Sub => lhs - rhs,
        BinaryOperator::Mul => lhs * rhs,
        BinaryOperator::Div => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        BinaryOperator::Pow => {
            // Only integer powers of negative numbers are real
            if lhs < 0.0 && rhs.fract() != 0.0 {
                return Err(EvalError::domain("^", lhs));
            }
            if lhs == 0.0 && rhs < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs.powf(rhs)
        }
    };

    if value.is_nan() {
        return Err(EvalError::domain(op.symbol(), lhs));
    }

    Ok(value)
}

impl Expression {
    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64, EvalError> {
        evaluate(self, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::Arity;
    use crate::parser::parse;

    fn eval_at(source: &str, x: f64) -> Result<f64, EvalError> {
        parse(source).expect("parsing should succeed").evaluate(&("x", x))
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval_at("2+3*4", 0.0), Ok(14.0));
        assert_eq!(eval_at("2^3^2", 0.0), Ok(512.0));
        assert_eq!(eval_at("-2^2", 0.0), Ok(-4.0));
        assert_eq!(eval_at("(-2)^2", 0.0), Ok(4.0));
        assert_eq!(eval_at("--3+x^2", 2.0), Ok(7.0));
        assert_eq!(eval_at("+x", 5.0), Ok(5.0));
        assert_eq!(eval_at("2x + 1", 3.0), Ok(7.0));
        assert_eq!(eval_at("7 / 2", 0.0), Ok(3.5));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval_at("1/x", 0.0), Err(EvalError::DivisionByZero));
        assert_eq!(eval_at("1/x", -0.0), Err(EvalError::DivisionByZero));
        assert_eq!(eval_at("0^x", -1.0), Err(EvalError::DivisionByZero));
        assert_eq!(eval_at("1/(x-x)", 4.0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn domain_errors() {
        assert_eq!(
            eval_at("ln(x)", -1.0),
            Err(EvalError::DomainError {
                operation: "ln".to_string(),
                value: -1.0
            })
        );
        assert_eq!(
            eval_at("x^0.5", -4.0),
            Err(EvalError::DomainError {
                operation: "^".to_string(),
                value: -4.0
            })
        );
        assert_eq!(eval_at("x^3", -2.0), Ok(-8.0));
        assert!(matches!(eval_at("sqrt(x)", -1.0), Err(EvalError::DomainError { .. })));
        assert!(matches!(eval_at("log(x)", 0.0), Err(EvalError::DomainError { .. })));
        assert!(matches!(eval_at("acos(x)", 2.0), Err(EvalError::DomainError { .. })));
        assert!(matches!(eval_at("log(8, x)", 1.0), Err(EvalError::DomainError { .. })));
    }

    #[test]
    fn nan_never_escapes() {
        // inf - inf
        assert!(matches!(
            eval_at("exp(x) - exp(x)", 1000.0),
            Err(EvalError::DomainError { .. })
        ));
        // sin(inf)
        assert!(matches!(eval_at("sin(exp(x))", 1000.0), Err(EvalError::DomainError { .. })));
        assert!(matches!(eval_at("x", f64::NAN), Err(EvalError::DomainError { .. })));

        // Overflow on its own is not an error
        assert_eq!(eval_at("exp(x)", 1000.0), Ok(f64::INFINITY));
    }

    #[test]
    fn tan_near_asymptote_is_large_not_an_error() {
        let value = eval_at("tan(x)", std::f64::consts::FRAC_PI_2).unwrap();
        assert!(value.abs() > 1e15);
    }

    #[test]
    fn unbound_variable() {
        assert_eq!(
            eval_at("x + y", 1.0),
            Err(EvalError::UnboundVariable {
                name: "y".to_string()
            })
        );
    }

    #[test]
    fn hand_built_trees_are_checked() {
        let unknown = Expression::call("foo", vec![Expression::number(1.0)]);
        assert_eq!(
            unknown.evaluate(&("x", 0.0)),
            Err(EvalError::UnknownFunction {
                name: "foo".to_string()
            })
        );

        let wrong_arity = Expression::call("sin", vec![]);
        assert_eq!(
            wrong_arity.evaluate(&("x", 0.0)),
            Err(EvalError::ArityMismatch {
                name: "sin".to_string(),
                expected: Arity::exactly(1),
                got: 0
            })
        );
    }

    #[test]
    fn binding_collections() {
        let expression = parse("x * y").unwrap();

        let hash: HashMap<String, f64> =
            [("x".to_string(), 2.0), ("y".to_string(), 3.0)].into_iter().collect();
        assert_eq!(expression.evaluate(&hash), Ok(6.0));

        let borrowed: HashMap<&str, f64> = [("x", 2.0), ("y", 4.0)].into_iter().collect();
        assert_eq!(expression.evaluate(&borrowed), Ok(8.0));

        let tree: BTreeMap<String, f64> =
            [("x".to_string(), 5.0), ("y".to_string(), 3.0)].into_iter().collect();
        assert_eq!(expression.evaluate(&tree), Ok(15.0));

        assert_eq!(expression.evaluate(&[("x", 1.5), ("y", 2.0)]), Ok(3.0));

        let slice: &[(&str, f64)] = &[("y", 1.0), ("x", 7.0)];
        assert_eq!(evaluate(&expression, slice), Ok(7.0));
    }
}
