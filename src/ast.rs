use std::collections::BTreeSet;
use std::fmt;

use crate::grammar::{
    Associativity, Precedence, ADDITIVE, MULTIPLICATIVE, POWER, PREFIX_BINDING_POWER,
};

/// A parsed expression. Trees are built once by the parser and only read afterwards, so a single
/// tree can be evaluated at many points, from many threads.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(f64),
    Variable(String),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum UnaryOperator {
    Neg,
    Pos,
}

impl BinaryOperator {
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub => ADDITIVE,
            BinaryOperator::Mul | BinaryOperator::Div => MULTIPLICATIVE,
            BinaryOperator::Pow => POWER,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Pow => "^",
        }
    }
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Pos => "+",
        }
    }
}

impl Expression {
    pub fn number(value: f64) -> Self {
        Expression::Number(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, lhs: Expression, rhs: Expression) -> Self {
        Expression::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// The distinct free variables, sorted by name.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names.into_iter().collect()
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Number(_) => {}
            Expression::Variable(name) => {
                names.insert(name);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_variables(names),
            Expression::BinaryOp { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        match self {
            Expression::Number(_) => false,
            Expression::Variable(name) => name == variable,
            Expression::UnaryOp { operand, .. } => operand.contains_variable(variable),
            Expression::BinaryOp { lhs, rhs, .. } => {
                lhs.contains_variable(variable) || rhs.contains_variable(variable)
            }
            Expression::FunctionCall { args, .. } => {
                args.iter().any(|arg| arg.contains_variable(variable))
            }
        }
    }

    // How tightly this node holds together when printed; a child printed with a lower value than
    // its parent requires needs parentheses.
    fn binding_power(&self) -> u8 {
        match self {
            Expression::Number(n) if n.is_sign_negative() => PREFIX_BINDING_POWER,
            Expression::UnaryOp { .. } => PREFIX_BINDING_POWER,
            Expression::BinaryOp { op, .. } => op.precedence().binding_power,
            Expression::Number(_) | Expression::Variable(_) | Expression::FunctionCall { .. } => {
                u8::MAX
            }
        }
    }
}

fn write_grouped(
    f: &mut fmt::Formatter<'_>,
    expression: &Expression,
    grouped: bool,
) -> fmt::Result {
    if grouped {
        write!(f, "({expression})")
    } else {
        write!(f, "{expression}")
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{n}"),
            Expression::Variable(name) => f.write_str(name),
            Expression::UnaryOp { op, operand } => {
                f.write_str(op.symbol())?;
                write_grouped(f, operand, operand.binding_power() < PREFIX_BINDING_POWER)
            }
            Expression::BinaryOp { op, lhs, rhs } => {
                let precedence = op.precedence();
                let bp = precedence.binding_power;

                let lhs_grouped = lhs.binding_power() < bp
                    || (lhs.binding_power() == bp
                        && precedence.associativity == Associativity::Right);
                let rhs_grouped = rhs.binding_power() < bp
                    || (rhs.binding_power() == bp
                        && precedence.associativity == Associativity::Left);

                write_grouped(f, lhs, lhs_grouped)?;
                match op {
                    BinaryOperator::Pow => f.write_str(op.symbol())?,
                    _ => write!(f, " {} ", op.symbol())?,
                }
                write_grouped(f, rhs, rhs_grouped)
            }
            Expression::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
