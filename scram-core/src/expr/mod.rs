//! The expression tree and its sampler.
//!
//! Uses a tagged-enum-over-type-parameter-free pattern generalised to a
//! numeric/Boolean expression language instead of a purely Boolean one,
//! and the same exponential-to-probability identity a reliability engine
//! typically uses for its weights (`1.0 - (-value * timepoint).exp()`).
//!
//! Two evaluation modes: a deterministic `mean()` used for point-value
//! quantification, and a repeatable pseudo-random `sample()` used for
//! Monte-Carlo uncertainty propagation. Both take an [`EvalContext`]
//! carrying the resolved parameter table and the mission time/timepoint
//! at which reliability functions are evaluated.

mod distributions;

use std::collections::HashMap;

use crate::error::{Locus, ScramError, ScramResult};

pub use distributions::Rng;

/// Parameter values resolved before evaluation (the parameter graph is
/// acyclic, so a single topological pass produces this table once).
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub parameters: HashMap<String, f64>,
    /// The time at which reliability functions (exponential, Weibull, ...)
    /// are evaluated; callers sweep this across a mission-time curve.
    pub time: f64,
}

impl EvalContext {
    pub fn new(time: f64) -> Self {
        EvalContext { parameters: HashMap::new(), time }
    }

    fn resolve(&self, name: &str, locus: &str) -> ScramResult<f64> {
        self.parameters.get(name).copied().ok_or_else(|| {
            ScramError::logic(format!("unresolved parameter reference '{name}' in {locus}"))
        })
    }
}

/// A histogram bucket: events with value in `(lower_bound, upper_bound]`
/// carry `weight`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub upper_bound: f64,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Constant(f64),
    Boolean(bool),
    Parameter(String),

    Neg(Box<Expression>),
    Add(Vec<Expression>),
    Sub(Box<Expression>, Box<Expression>),
    Mul(Vec<Expression>),
    Div(Box<Expression>, Box<Expression>),

    Lt(Box<Expression>, Box<Expression>),
    Gt(Box<Expression>, Box<Expression>),
    Leq(Box<Expression>, Box<Expression>),
    Geq(Box<Expression>, Box<Expression>),
    Eq(Box<Expression>, Box<Expression>),

    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),

    /// `1 - exp(-rate * time)`.
    Exponential { rate: Box<Expression> },
    /// Two-parameter Weibull hazard integrated to mission time, shifted by
    /// a start-of-life offset `t0`.
    Weibull { alpha: Box<Expression>, beta: Box<Expression>, t0: Box<Expression> },
    /// Generalized life model: `gamma + lambda * time.powf(mu)`, as a
    /// failure rate integrated against `time` then converted via the
    /// exponential identity (periodic-test family).
    Glm { gamma: Box<Expression>, lambda: Box<Expression>, mu: Box<Expression> },
    /// Periodic test unavailability: average unavailability of a component
    /// tested every `tau` with non-detection probability `theta` and
    /// constant failure rate `lambda`, evaluated at `time`.
    PeriodicTest { lambda: Box<Expression>, tau: Box<Expression>, theta: Box<Expression> },

    Uniform { min: Box<Expression>, max: Box<Expression> },
    Normal { mean: Box<Expression>, std_dev: Box<Expression> },
    LogNormal { mean: Box<Expression>, error_factor: Box<Expression> },
    Gamma { shape: Box<Expression>, scale: Box<Expression> },
    Beta { alpha: Box<Expression>, beta: Box<Expression> },
    Histogram { bins: Vec<HistogramBin> },
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Expression::Constant(value)
    }

    pub fn collect_parameter_refs(&self, out: &mut Vec<String>) {
        match self {
            Expression::Parameter(name) => out.push(name.clone()),
            Expression::Constant(_) | Expression::Boolean(_) => {}
            Expression::Neg(a) | Expression::Not(a) => a.collect_parameter_refs(out),
            Expression::Add(xs) | Expression::Mul(xs) | Expression::And(xs) | Expression::Or(xs) => {
                for x in xs {
                    x.collect_parameter_refs(out);
                }
            }
            Expression::Sub(a, b)
            | Expression::Div(a, b)
            | Expression::Lt(a, b)
            | Expression::Gt(a, b)
            | Expression::Leq(a, b)
            | Expression::Geq(a, b)
            | Expression::Eq(a, b)
            | Expression::Uniform { min: a, max: b }
            | Expression::Normal { mean: a, std_dev: b }
            | Expression::LogNormal { mean: a, error_factor: b }
            | Expression::Gamma { shape: a, scale: b }
            | Expression::Beta { alpha: a, beta: b } => {
                a.collect_parameter_refs(out);
                b.collect_parameter_refs(out);
            }
            Expression::Exponential { rate } => rate.collect_parameter_refs(out),
            Expression::Weibull { alpha, beta, t0 } => {
                alpha.collect_parameter_refs(out);
                beta.collect_parameter_refs(out);
                t0.collect_parameter_refs(out);
            }
            Expression::Glm { gamma, lambda, mu } => {
                gamma.collect_parameter_refs(out);
                lambda.collect_parameter_refs(out);
                mu.collect_parameter_refs(out);
            }
            Expression::PeriodicTest { lambda, tau, theta } => {
                lambda.collect_parameter_refs(out);
                tau.collect_parameter_refs(out);
                theta.collect_parameter_refs(out);
            }
            Expression::Histogram { .. } => {}
        }
    }

    /// Deterministic point-value evaluation, used by the point
    /// probability pass.
    pub fn mean(&self, ctx: &EvalContext) -> ScramResult<f64> {
        let m = |e: &Expression| e.mean(ctx);
        let v = match self {
            Expression::Constant(c) => *c,
            Expression::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Expression::Parameter(name) => ctx.resolve(name, "mean()")?,
            Expression::Neg(a) => -m(a)?,
            Expression::Add(xs) => xs.iter().map(m).collect::<ScramResult<Vec<_>>>()?.into_iter().sum(),
            Expression::Sub(a, b) => m(a)? - m(b)?,
            Expression::Mul(xs) => xs.iter().map(m).collect::<ScramResult<Vec<_>>>()?.into_iter().product(),
            Expression::Div(a, b) => {
                let denom = m(b)?;
                if denom == 0.0 {
                    return Err(ScramError::domain("division by zero", Locus::element("expression")));
                }
                m(a)? / denom
            }
            Expression::Lt(a, b) => bool_to_f64(m(a)? < m(b)?),
            Expression::Gt(a, b) => bool_to_f64(m(a)? > m(b)?),
            Expression::Leq(a, b) => bool_to_f64(m(a)? <= m(b)?),
            Expression::Geq(a, b) => bool_to_f64(m(a)? >= m(b)?),
            Expression::Eq(a, b) => bool_to_f64((m(a)? - m(b)?).abs() < 1e-12),
            Expression::And(xs) => bool_to_f64(xs.iter().map(m).collect::<ScramResult<Vec<_>>>()?.iter().all(|&x| x != 0.0)),
            Expression::Or(xs) => bool_to_f64(xs.iter().map(m).collect::<ScramResult<Vec<_>>>()?.iter().any(|&x| x != 0.0)),
            Expression::Not(a) => bool_to_f64(m(a)? == 0.0),
            Expression::Exponential { rate } => {
                let rate = require_non_negative(m(rate)?, "exponential rate")?;
                1.0 - (-rate * ctx.time).exp()
            }
            Expression::Weibull { alpha, beta, t0 } => {
                let alpha = require_non_negative(m(alpha)?, "weibull alpha")?;
                let beta = require_non_negative(m(beta)?, "weibull beta")?;
                let t0 = m(t0)?;
                let elapsed = (ctx.time - t0).max(0.0);
                1.0 - (-(elapsed / alpha).powf(beta)).exp()
            }
            Expression::Glm { gamma, lambda, mu } => {
                let gamma = m(gamma)?;
                let lambda = require_non_negative(m(lambda)?, "glm lambda")?;
                let mu = m(mu)?;
                let rate = gamma + lambda * ctx.time.powf(mu);
                1.0 - (-rate * ctx.time).exp()
            }
            Expression::PeriodicTest { lambda, tau, theta } => {
                let lambda = require_non_negative(m(lambda)?, "periodic-test lambda")?;
                let tau = require_non_negative(m(tau)?, "periodic-test tau")?;
                let theta = m(theta)?;
                // Average unavailability over one test interval, plus the
                // chance a failure before the last test went undetected.
                let within_interval = 1.0 - (1.0 - (-lambda * tau).exp()) / (lambda * tau).max(1e-300);
                (within_interval + theta).clamp(0.0, 1.0)
            }
            Expression::Uniform { min, max } => (m(min)? + m(max)?) / 2.0,
            Expression::Normal { mean, .. } => m(mean)?,
            Expression::LogNormal { mean, error_factor } => {
                let mu = m(mean)?.ln();
                let sigma = m(error_factor)?.ln() / 1.645;
                (mu + sigma * sigma / 2.0).exp()
            }
            Expression::Gamma { shape, scale } => m(shape)? * m(scale)?,
            Expression::Beta { alpha, beta } => m(alpha)? / (m(alpha)? + m(beta)?),
            Expression::Histogram { bins } => {
                let total: f64 = bins.iter().map(|b| b.weight).sum();
                if total <= 0.0 {
                    return Err(ScramError::domain("histogram has no weight", Locus::element("expression")));
                }
                let mut lower = 0.0;
                let mut acc = 0.0;
                for bin in bins {
                    let mid = (lower + bin.upper_bound) / 2.0;
                    acc += mid * bin.weight;
                    lower = bin.upper_bound;
                }
                acc / total
            }
        };
        Ok(v)
    }

    /// Repeatable pseudo-random sample for Monte-Carlo propagation (spec
    /// §4.8). Non-random variants delegate straight to [`Expression::mean`].
    pub fn sample(&self, ctx: &EvalContext, rng: &mut impl Rng) -> ScramResult<f64> {
        match self {
            Expression::Uniform { min, max } => Ok(distributions::uniform(rng, self.mean_arg(min, ctx)?, self.mean_arg(max, ctx)?)),
            Expression::Normal { mean, std_dev } => {
                Ok(distributions::normal(rng, self.mean_arg(mean, ctx)?, self.mean_arg(std_dev, ctx)?))
            }
            Expression::LogNormal { mean, error_factor } => {
                let mean = self.mean_arg(mean, ctx)?;
                let sigma = self.mean_arg(error_factor, ctx)?.ln() / 1.645;
                let mu = mean.ln() - sigma * sigma / 2.0;
                Ok(distributions::log_normal(rng, mu, sigma))
            }
            Expression::Gamma { shape, scale } => {
                Ok(distributions::gamma(rng, self.mean_arg(shape, ctx)?, self.mean_arg(scale, ctx)?))
            }
            Expression::Beta { alpha, beta } => Ok(distributions::beta(rng, self.mean_arg(alpha, ctx)?, self.mean_arg(beta, ctx)?)),
            Expression::Histogram { bins } => Ok(distributions::histogram(rng, bins)),
            Expression::Exponential { rate } => {
                let rate = require_non_negative(self.mean_arg(rate, ctx)?, "exponential rate")?;
                Ok(1.0 - (-rate * ctx.time).exp())
            }
            other => other.mean(ctx),
        }
    }

    fn mean_arg(&self, e: &Expression, ctx: &EvalContext) -> ScramResult<f64> {
        e.mean(ctx)
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn require_non_negative(v: f64, what: &str) -> ScramResult<f64> {
    if v < 0.0 {
        Err(ScramError::domain(format!("{what} must be non-negative, got {v}"), Locus::element("expression")))
    } else {
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_matches_teacher_identity() {
        let rate = Box::new(Expression::Constant(1e-5));
        let expr = Expression::Exponential { rate };
        let ctx = EvalContext::new(120.0);
        let p = expr.mean(&ctx).unwrap();
        assert!((p - (1.0 - (-1e-5_f64 * 120.0).exp())).abs() < 1e-15);
    }

    #[test]
    fn exponential_curve_matches_expected_time_points() {
        let rate = Box::new(Expression::Constant(1e-5));
        let expr = Expression::Exponential { rate };
        let expected = [0.0, 2.399e-4, 4.799e-4, 7.197e-4, 9.595e-4, 1.199e-3];
        for (i, &t) in [0.0, 24.0, 48.0, 72.0, 96.0, 120.0].iter().enumerate() {
            let ctx = EvalContext::new(t);
            let p = expr.mean(&ctx).unwrap();
            assert!((p - expected[i]).abs() < 1e-6, "t={t} got={p} want={}", expected[i]);
        }
    }

    #[test]
    fn parameter_resolution_and_cycle_collection() {
        let mut out = Vec::new();
        let expr = Expression::Add(vec![Expression::Parameter("lambda".into()), Expression::Constant(1.0)]);
        expr.collect_parameter_refs(&mut out);
        assert_eq!(out, vec!["lambda".to_string()]);

        let mut ctx = EvalContext::new(0.0);
        ctx.parameters.insert("lambda".into(), 2.0);
        assert_eq!(expr.mean(&ctx).unwrap(), 3.0);
    }

    #[test]
    fn division_by_zero_is_a_domain_error() {
        let expr = Expression::Div(Box::new(Expression::Constant(1.0)), Box::new(Expression::Constant(0.0)));
        let ctx = EvalContext::new(0.0);
        assert!(matches!(expr.mean(&ctx), Err(ScramError::Domain { .. })));
    }

    #[test]
    fn uniform_mean_is_midpoint() {
        let expr = Expression::Uniform { min: Box::new(Expression::Constant(2.0)), max: Box::new(Expression::Constant(4.0)) };
        let ctx = EvalContext::new(0.0);
        assert_eq!(expr.mean(&ctx).unwrap(), 3.0);
    }

    #[test]
    fn histogram_mean_is_weighted_midpoint_average() {
        let bins = vec![
            HistogramBin { upper_bound: 1.0, weight: 1.0 },
            HistogramBin { upper_bound: 2.0, weight: 1.0 },
        ];
        let expr = Expression::Histogram { bins };
        let ctx = EvalContext::new(0.0);
        // midpoints 0.5 and 1.5, equal weight -> mean 1.0
        assert!((expr.mean(&ctx).unwrap() - 1.0).abs() < 1e-12);
    }
}
