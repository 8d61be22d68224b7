//! Sampling routines backing [`super::Expression::sample`].
//!
//! Built on `rand` 0.8; the caller supplies a seeded
//! `rand_chacha::ChaCha8Rng` instead of the thread RNG so a Monte-Carlo
//! run is repeatable given the same seed.

pub use rand::Rng;

use super::HistogramBin;

pub fn uniform(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

/// Box-Muller transform, standard normal scaled to `(mean, std_dev)`.
pub fn normal(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

pub fn log_normal(rng: &mut impl Rng, mu: f64, sigma: f64) -> f64 {
    normal(rng, mu, sigma).exp()
}

/// Marsaglia-Tsang method; boosts `shape < 1` by sampling `shape + 1` and
/// correcting with a uniform power, per the standard trick.
pub fn gamma(rng: &mut impl Rng, shape: f64, scale: f64) -> f64 {
    if shape <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    if shape < 1.0 {
        let g = gamma_standard(rng, shape + 1.0);
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        return g * u.powf(1.0 / shape) * scale;
    }
    gamma_standard(rng, shape) * scale
}

fn gamma_standard(rng: &mut impl Rng, shape: f64) -> f64 {
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let mut x;
        let mut v;
        loop {
            x = normal(rng, 0.0, 1.0);
            v = 1.0 + c * x;
            if v > 0.0 {
                break;
            }
        }
        v = v * v * v;
        let u: f64 = rng.gen_range(0.0..1.0);
        if u < 1.0 - 0.0331 * x * x * x * x {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

pub fn beta(rng: &mut impl Rng, alpha: f64, beta_param: f64) -> f64 {
    let x = gamma(rng, alpha, 1.0);
    let y = gamma(rng, beta_param, 1.0);
    if x + y == 0.0 {
        0.0
    } else {
        x / (x + y)
    }
}

/// Picks a bin weighted by `bin.weight`, then a uniform value within it.
pub fn histogram(rng: &mut impl Rng, bins: &[HistogramBin]) -> f64 {
    let total: f64 = bins.iter().map(|b| b.weight).sum();
    if total <= 0.0 || bins.is_empty() {
        return 0.0;
    }
    let mut target = rng.gen_range(0.0..total);
    let mut lower = 0.0;
    for bin in bins {
        if target < bin.weight {
            return uniform(rng, lower, bin.upper_bound);
        }
        target -= bin.weight;
        lower = bin.upper_bound;
    }
    bins.last().map(|b| b.upper_bound).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn same_seed_gives_repeatable_samples() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let xs: Vec<f64> = (0..10).map(|_| uniform(&mut a, 0.0, 1.0)).collect();
        let ys: Vec<f64> = (0..10).map(|_| uniform(&mut b, 0.0, 1.0)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn uniform_samples_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = uniform(&mut rng, 1.0, 3.0);
            assert!((1.0..3.0).contains(&v));
        }
    }

    #[test]
    fn gamma_samples_are_non_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(gamma(&mut rng, 2.5, 1.0) >= 0.0);
        }
    }

    #[test]
    fn beta_samples_stay_in_unit_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let v = beta(&mut rng, 2.0, 5.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
