use std::f64::consts::PI;

use plotcalc::{
    derivative::differentiate,
    parse,
    sampling::{sample, SampleConfig},
    EvalError, Expression, ParseError,
};
use rstest::*;

fn eval_at(source: &str, x: f64) -> Result<f64, EvalError> {
    parse(source).expect("parsing should succeed").evaluate(&("x", x))
}

#[rstest]
#[case("2+3*4", 14.0)]
#[case("2^3^2", 512.0)]
#[case("-2^2", -4.0)]
#[case("(2+3)*4", 20.0)]
#[case("10 - 4 - 3", 3.0)]
#[case("2 ^ -1", 0.5)]
#[case("3(1 + 1)", 6.0)]
#[case("2pi / pi", 2.0)]
#[case("log(8, 2)", 3.0)]
#[case("log(1000)", 3.0)]
#[case("abs(-7) + sqrt(16)", 11.0)]
fn constant_expressions(#[case] source: &str, #[case] expected: f64) {
    let value = eval_at(source, 0.0).expect("evaluation should succeed");
    assert!(
        (value - expected).abs() < 1e-12,
        "{source} evaluated to {value}, expected {expected}"
    );
}

#[rstest]
#[case("x^2 - 2x + 1", 3.0, 4.0)]
#[case("2x", 1.5, 3.0)]
#[case("2sin(x)", PI / 2.0, 2.0)]
#[case("x(x + 1)", 2.0, 6.0)]
#[case("exp(ln(x))", 5.0, 5.0)]
#[case("-x^2", 3.0, -9.0)]
fn expressions_of_x(#[case] source: &str, #[case] x: f64, #[case] expected: f64) {
    let value = eval_at(source, x).expect("evaluation should succeed");
    assert!(
        (value - expected).abs() < 1e-12,
        "{source} at {x} evaluated to {value}, expected {expected}"
    );
}

#[rstest]
#[case("x")]
#[case("1 + 2 * 3")]
#[case("(1 + 2) * 3")]
#[case("2^3^2")]
#[case("(2^3)^2")]
#[case("-2^2")]
#[case("(-2)^2")]
#[case("1 - (2 - 3)")]
#[case("a / (b * c)")]
#[case("sin(x)^2 + cos(x)^2")]
#[case("log(x + 1, 2) * -y")]
#[case("2x + 3(x - 1)")]
#[case("x * -2")]
#[case("x^(-2) - -3")]
fn printing_reparses_to_the_same_tree(#[case] source: &str) {
    let expression = parse(source).expect("parsing should succeed");
    let printed = expression.to_string();
    assert_eq!(parse(&printed), Ok(expression.clone()), "printed as {printed}");

    // Extra parentheses around the whole thing change nothing
    assert_eq!(parse(&format!("({source})")), Ok(expression));
}

#[rstest]
#[case("x 3")]
#[case("(1 + 2")]
#[case("1 +")]
#[case("foo(x)")]
#[case("sin x")]
#[case("sin(x, 2)")]
#[case("1.2.3")]
#[case("x % 2")]
#[case(")")]
fn invalid_input(#[case] source: &str) {
    assert!(parse(source).is_err(), "{source} should not parse");
}

#[rstest]
#[case("x+")]
#[case("x*")]
#[case("x ")]
#[case("2^")]
fn long_chains_are_rejected_not_fatal(#[case] link: &str) {
    let source = format!("{}x", link.repeat(20_000));
    assert!(matches!(
        parse(&source),
        Err(ParseError::TooDeeplyNested { .. })
    ));
}

#[test]
fn unknown_functions_are_rejected_when_parsing() {
    assert!(matches!(
        parse("foo(x)"),
        Err(ParseError::UnknownFunction { name, .. }) if name == "foo"
    ));
}

#[test]
fn undefined_points() {
    assert_eq!(eval_at("1/x", 0.0), Err(EvalError::DivisionByZero));
    assert_eq!(
        eval_at("ln(x)", -1.0),
        Err(EvalError::DomainError {
            operation: "ln".to_string(),
            value: -1.0
        })
    );
}

#[test]
fn pythagorean_identity() {
    let expression = parse("sin(x)^2 + cos(x)^2").unwrap();
    for i in -50..=50 {
        let x = i as f64 * 0.37;
        let value = expression.evaluate(&("x", x)).unwrap();
        assert!((value - 1.0).abs() < 1e-12, "at {x}: {value}");
    }
}

#[rstest]
#[case("x^2 * sin(x)")]
#[case("exp(-x^2 / 2)")]
#[case("sqrt(x^2 + 1) / (x + 3)")]
#[case("log(x^2 + 2, 3)")]
fn derivatives_match_finite_differences(#[case] source: &str) {
    const H: f64 = 1e-6;

    let expression = parse(source).unwrap();
    let derivative = differentiate(&expression, "x").unwrap();

    for x in [-1.7, -0.4, 0.2, 1.1, 2.9] {
        let f = |x: f64| expression.evaluate(&("x", x)).unwrap();
        let expected = (f(x + H) - f(x - H)) / (2.0 * H);
        let actual = derivative.evaluate(&("x", x)).unwrap();
        assert!(
            (actual - expected).abs() <= 1e-5 * expected.abs().max(1.0),
            "d/dx {source} at {x}: {actual} vs {expected}"
        );
    }
}

#[test]
fn sampling_a_pole() {
    let expression = parse("1/(x - 1)").unwrap();
    let config = SampleConfig {
        x_min: -2.0,
        x_max: 2.0,
        points: 41,
        must_include: vec![1.0],
        ..SampleConfig::default()
    };
    let samples = sample(&expression, "x", &config).unwrap();

    let pole = samples.iter().find(|s| s.x == 1.0).unwrap();
    assert_eq!(pole.y, None);
    assert!(samples.len() > 41);
    assert!(samples.defined().all(|(_, y)| y.is_finite()));
}

#[test]
fn trees_are_shared_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Expression>();

    let expression = parse("x^3 - 2x").unwrap();
    let results: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let expression = &expression;
                scope.spawn(move || expression.evaluate(&("x", i as f64)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, vec![0.0, -1.0, 4.0, 21.0]);
}
