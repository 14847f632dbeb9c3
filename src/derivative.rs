use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::EvalError;
use crate::functions;

// The node builders below fold local identities such as `0 + u`, `1 * u` and `u^1` as they go.
// Nothing else is simplified.

fn is_number(expression: &Expression, value: f64) -> bool {
    matches!(expression, Expression::Number(n) if *n == value)
}

pub(crate) fn num(value: f64) -> Expression {
    Expression::Number(value)
}

pub(crate) fn neg(u: Expression) -> Expression {
    match u {
        Expression::Number(n) => num(-n),
        Expression::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => *operand,
        u => Expression::unary(UnaryOperator::Neg, u),
    }
}

pub(crate) fn add(u: Expression, v: Expression) -> Expression {
    if is_number(&u, 0.0) {
        v
    } else if is_number(&v, 0.0) {
        u
    } else {
        Expression::binary(BinaryOperator::Add, u, v)
    }
}

pub(crate) fn sub(u: Expression, v: Expression) -> Expression {
    if is_number(&v, 0.0) {
        u
    } else if is_number(&u, 0.0) {
        neg(v)
    } else {
        Expression::binary(BinaryOperator::Sub, u, v)
    }
}

pub(crate) fn mul(u: Expression, v: Expression) -> Expression {
    if is_number(&u, 0.0) || is_number(&v, 0.0) {
        num(0.0)
    } else if is_number(&u, 1.0) {
        v
    } else if is_number(&v, 1.0) {
        u
    } else {
        Expression::binary(BinaryOperator::Mul, u, v)
    }
}

pub(crate) fn div(u: Expression, v: Expression) -> Expression {
    if is_number(&u, 0.0) && !is_number(&v, 0.0) {
        num(0.0)
    } else if is_number(&v, 1.0) {
        u
    } else {
        Expression::binary(BinaryOperator::Div, u, v)
    }
}

pub(crate) fn pow(u: Expression, v: Expression) -> Expression {
    if is_number(&v, 0.0) {
        num(1.0)
    } else if is_number(&v, 1.0) {
        u
    } else {
        Expression::binary(BinaryOperator::Pow, u, v)
    }
}

fn ln(u: &Expression) -> Expression {
    Expression::call("ln", vec![u.clone()])
}

/// The derivative of `expression` with respect to `variable`. Every other variable is held
/// constant.
pub fn differentiate(expression: &Expression, variable: &str) -> Result<Expression, EvalError> {
    Ok(match expression {
        Expression::Number(_) => num(0.0),
        Expression::Variable(name) => num(if name == variable { 1.0 } else { 0.0 }),
        Expression::UnaryOp { op, operand } => {
            let d = differentiate(operand, variable)?;
            match op {
                UnaryOperator::Neg => neg(d),
                UnaryOperator::Pos => d,
            }
        }
        Expression::BinaryOp { op, lhs, rhs } => {
            let (u, v) = (lhs.as_ref(), rhs.as_ref());
            let du = differentiate(u, variable)?;
            let dv = differentiate(v, variable)?;

            match op {
                BinaryOperator::Add => add(du, dv),
                BinaryOperator::Sub => sub(du, dv),
                BinaryOperator::Mul => add(mul(du, v.clone()), mul(u.clone(), dv)),
                BinaryOperator::Div => div(
                    sub(mul(du, v.clone()), mul(u.clone(), dv)),
                    pow(v.clone(), num(2.0)),
                ),
                BinaryOperator::Pow => power_rule(expression, u, v, du, dv, variable),
            }
        }
        Expression::FunctionCall { name, args } => {
            let definition =
                functions::lookup(name).ok_or_else(|| EvalError::UnknownFunction {
                    name: name.clone(),
                })?;
            if !definition.arity.accepts(args.len()) {
                return Err(EvalError::ArityMismatch {
                    name: name.clone(),
                    expected: definition.arity,
                    got: args.len(),
                });
            }

            let primes = args
                .iter()
                .map(|arg| differentiate(arg, variable))
                .collect::<Result<Vec<_>, _>>()?;
            (definition.derivative)(args, &primes)
        }
    })
}

fn power_rule(
    expression: &Expression,
    u: &Expression,
    v: &Expression,
    du: Expression,
    dv: Expression,
    variable: &str,
) -> Expression {
    if !v.contains_variable(variable) {
        // d(u^n) = n * u^(n - 1) * du
        let exponent = match v {
            Expression::Number(n) => num(n - 1.0),
            v => sub(v.clone(), num(1.0)),
        };
        mul(mul(v.clone(), pow(u.clone(), exponent)), du)
    } else if !u.contains_variable(variable) {
        // d(a^v) = a^v * ln(a) * dv
        mul(mul(expression.clone(), ln(u)), dv)
    } else {
        // d(u^v) = u^v * (dv * ln(u) + v * du / u)
        mul(
            expression.clone(),
            add(mul(dv, ln(u)), div(mul(v.clone(), du), u.clone())),
        )
    }
}
