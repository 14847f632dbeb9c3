use clap::Parser;
use miette::{LabeledSpan, NamedSource, Report};
use plotcalc::{
    derivative::differentiate,
    functions, lexer,
    sampling::{self, SampleConfig},
    Expression, ParseError,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Input {
    /// The expression, e.g. "2x^2 - sin(x)"
    #[clap(allow_hyphen_values = true)]
    expression: String,

    /// Debug the lexer, printing out each token. Does not parse the expression.
    #[clap(long, default_value = "false")]
    debug_lexer: bool,

    /// Debug the parser, printing out the AST. Does not evaluate the expression.
    #[clap(long, default_value = "false")]
    debug_parser: bool,

    /// Evaluate at these values of the variable
    #[clap(long, num_args = 1.., allow_negative_numbers = true)]
    at: Vec<f64>,

    /// Differentiate with respect to the variable before doing anything else
    #[clap(long, default_value = "false")]
    derivative: bool,

    /// Print adaptively sampled `x y` pairs for plotting
    #[clap(long, default_value = "false")]
    sample: bool,

    /// Start of the sampled range
    #[clap(long, default_value_t = -10.0, allow_negative_numbers = true)]
    from: f64,

    /// End of the sampled range
    #[clap(long, default_value_t = 10.0, allow_negative_numbers = true)]
    to: f64,

    /// Size of the initial sampling grid
    #[clap(long, default_value_t = 1000)]
    points: usize,

    /// The variable to evaluate, differentiate and sample over
    #[clap(long, default_value = "x")]
    variable: String,

    /// Log more; repeat for even more
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let input = Input::parse();
    init_logging(input.verbose);

    let source_code = NamedSource::new("expression", input.expression.clone());

    if input.debug_lexer {
        run_debug_lexer(lexer::Lexer::new(&input.expression), source_code);
        return;
    }

    let mut expression = match plotcalc::parse(&input.expression) {
        Ok(expression) => expression,
        Err(e) => {
            if let ParseError::UnknownFunction { .. } = e {
                eprintln!("known functions: {}", functions::names().join(", "));
            }
            fail(Report::new(e).with_source_code(source_code))
        }
    };

    if input.debug_parser {
        dbg!(expression);
        return;
    }

    if input.derivative {
        expression = match differentiate(&expression, &input.variable) {
            Ok(derivative) => derivative,
            Err(e) => fail(Report::new(e)),
        };
        println!("d/d{} = {expression}", input.variable);
    }

    if input.sample {
        run_sample(&expression, &input);
    } else if !input.at.is_empty() {
        for &x in &input.at {
            match expression.evaluate(&(input.variable.as_str(), x)) {
                Ok(y) => println!("{x} {y}"),
                Err(e) => fail(Report::new(e)),
            }
        }
    } else if expression.variables().is_empty() {
        match expression.evaluate::<[(&str, f64)]>(&[]) {
            Ok(value) => println!("{value}"),
            Err(e) => fail(Report::new(e)),
        }
    } else if !input.derivative {
        println!("{expression}");
    }
}

fn init_logging(verbosity: u8) {
    use tracing_subscriber::{
        filter::{LevelFilter, Targets},
        fmt::Layer,
        prelude::*,
    };

    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            Layer::new().with_writer(std::io::stderr).with_filter(
                Targets::new()
                    .with_default(LevelFilter::WARN)
                    .with_target("plotcalc", level),
            ),
        )
        .init();
}

fn fail(report: Report) -> ! {
    eprintln!("{:?}", report);
    std::process::exit(1);
}

fn run_debug_lexer(lexer: lexer::Lexer, source_code: NamedSource<String>) {
    for token in lexer {
        match token {
            Ok(t) => {
                let diag = miette::miette!(
                    labels = vec![LabeledSpan::at(t.span.start..t.span.end, t.kind.to_string())],
                    severity = miette::Severity::Advice,
                    "found a token",
                )
                .with_source_code(source_code.clone());
                eprintln!("{:?}", diag);
            }
            Err(e) => fail(Report::new(e).with_source_code(source_code.clone())),
        }
    }
}

fn run_sample(expression: &Expression, input: &Input) {
    let config = SampleConfig {
        x_min: input.from,
        x_max: input.to,
        points: input.points,
        ..SampleConfig::default()
    };

    let samples = match sampling::sample(expression, &input.variable, &config) {
        Ok(samples) => samples,
        Err(e) => fail(Report::new(e)),
    };

    for sample in &samples {
        match sample.y {
            Some(y) => println!("{} {y}", sample.x),
            None => println!("{} undefined", sample.x),
        }
    }
}
