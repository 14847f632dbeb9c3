use crate::ast::Expression;
use crate::error::{EvalError, SampleError};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub x_min: f64,
    pub x_max: f64,
    /// Size of the initial even grid, both ends included.
    pub points: usize,
    /// Extra x values to evaluate. Values outside the range are ignored.
    pub must_include: Vec<f64>,
    pub tolerance: f64,
    /// Interior points added to each interval that needs refining.
    pub refine_points: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            points: 1000,
            must_include: Vec::new(),
            tolerance: 1e-3,
            refine_points: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    /// `None` where the expression is undefined or not finite.
    pub y: Option<f64>,
}

/// Sample points in increasing `x` order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Samples {
    points: Vec<Sample>,
}

impl Samples {
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `(x, y)` pairs where the expression has a value.
    pub fn defined(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().filter_map(|s| s.y.map(|y| (s.x, y)))
    }

    /// Smallest and largest defined value, if any point is defined.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        self.defined().map(|(_, y)| y).fold(None, |extent, y| match extent {
            None => Some((y, y)),
            Some((min, max)) => Some((min.min(y), max.max(y))),
        })
    }
}

impl<'a> IntoIterator for &'a Samples {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Samples `expression` as a function of `variable` over `config`'s range, for plotting.
///
/// An even grid is evaluated first. Every interval whose endpoints differ by more than the
/// tolerance, or where the expression stops or starts being defined, then gets a run of extra
/// points.
///
/// Undefined points (division by zero, domain errors) are kept with no value. Any other
/// evaluation failure, such as a second free variable, means no point can be evaluated and
/// aborts the whole run.
pub fn sample(
    expression: &Expression,
    variable: &str,
    config: &SampleConfig,
) -> Result<Samples, SampleError> {
    let SampleConfig {
        x_min,
        x_max,
        points,
        ..
    } = *config;

    if !x_min.is_finite() || !x_max.is_finite() || x_min >= x_max {
        return Err(SampleError::InvalidRange { x_min, x_max });
    }
    if points < 2 {
        return Err(SampleError::TooFewPoints { points });
    }

    let in_range = |x: &f64| (x_min..=x_max).contains(x);
    let mut xs: Vec<f64> = linspace(x_min, x_max, points)
        .chain(config.must_include.iter().copied().filter(in_range))
        .chain(Some(0.0).filter(in_range))
        .collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    let ys = evaluate_all(expression, variable, &xs).inspect_err(|e| {
        log::warn!("sampling {expression} aborted: {e}");
    })?;
    let coarse: Vec<Sample> = xs.into_iter().zip(ys).map(|(x, y)| Sample { x, y }).collect();

    let mut refined = 0;
    let mut result = Vec::with_capacity(coarse.len());
    for pair in coarse.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        result.push(left);

        if !needs_refining(left.y, right.y, config.tolerance) || config.refine_points == 0 {
            continue;
        }

        let extra: Vec<f64> = linspace(left.x, right.x, config.refine_points + 2)
            .filter(|&x| x > left.x && x < right.x)
            .collect();
        let values = evaluate_all(expression, variable, &extra)?;

        refined += 1;
        result.extend(extra.into_iter().zip(values).map(|(x, y)| Sample { x, y }));
    }
    if let Some(&last) = coarse.last() {
        result.push(last);
    }

    log::debug!(
        "sampled {expression} at {} points ({} intervals refined)",
        result.len(),
        refined
    );

    Ok(Samples { points: result })
}

// Interpolates without ever computing `end - start`, which overflows for ranges wider than
// f64::MAX.
fn linspace(start: f64, end: f64, points: usize) -> impl Iterator<Item = f64> {
    let last = (points - 1) as f64;
    (0..points).map(move |i| {
        let t = i as f64 / last;
        start * (1.0 - t) + end * t
    })
}

fn needs_refining(left: Option<f64>, right: Option<f64>, tolerance: f64) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => (a - b).abs() > tolerance,
        (None, None) => false,
        _ => true,
    }
}

fn evaluate_at(expression: &Expression, variable: &str, x: f64) -> Result<Option<f64>, EvalError> {
    match expression.evaluate(&(variable, x)) {
        Ok(y) if y.is_finite() => Ok(Some(y)),
        Ok(_) => Ok(None),
        Err(e) if e.is_undefined_point() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(feature = "parallel")]
fn evaluate_all(
    expression: &Expression,
    variable: &str,
    xs: &[f64],
) -> Result<Vec<Option<f64>>, EvalError> {
    use rayon::prelude::*;

    xs.par_iter()
        .map(|&x| evaluate_at(expression, variable, x))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all(
    expression: &Expression,
    variable: &str,
    xs: &[f64],
) -> Result<Vec<Option<f64>>, EvalError> {
    xs.iter()
        .map(|&x| evaluate_at(expression, variable, x))
        .collect()
}
