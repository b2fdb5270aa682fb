//! Summary statistics and convergence diagnostics for a finished [`Posterior`].
//!
//! Nothing here feeds back into the reshaping pipeline; these functions only read
//! the aligned `(n_chains, n_draws)` arrays.

use std::fmt;

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::posterior::Posterior;

/// Probability mass of the highest-density interval reported by [`summarize`].
pub const HDI_PROB: f64 = 0.94;

/// Biased (divide by `n`) autocovariance of a sequence at every lag `0..n`, via FFT.
pub fn autocovariance(x: ArrayView1<f64>) -> Array1<f64> {
    let n = x.len();
    if n == 0 {
        return Array1::zeros(0);
    }
    let mean = x.mean().unwrap_or(0.0);
    let len = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f64>> = x
        .iter()
        .map(|&v| Complex::new(v - mean, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(len)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(len).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(len).process(&mut buffer);

    let scale = (len * n) as f64;
    buffer.iter().take(n).map(|c| c.re / scale).collect()
}

/// Autocorrelation at every lag `0..n`, normalised so lag 0 is 1.
///
/// A constant sequence has no defined autocorrelation; it yields 1 at lag 0 and 0
/// elsewhere.
pub fn autocorrelation(x: ArrayView1<f64>) -> Array1<f64> {
    let acov = autocovariance(x);
    match acov.first().copied() {
        Some(c0) if c0 > 0.0 => acov / c0,
        Some(_) => {
            let mut flat = Array1::zeros(acov.len());
            flat[0] = 1.0;
            flat
        }
        None => acov,
    }
}

/// Splits every chain into its first and last `n / 2` draws.
fn split_chains(draws: ArrayView2<f64>, min_half: usize) -> Option<Array2<f64>> {
    let (n_chains, n) = draws.dim();
    let half = n / 2;
    if n_chains == 0 || half < min_half {
        return None;
    }
    ndarray::concatenate(
        Axis(0),
        &[draws.slice(s![.., ..half]), draws.slice(s![.., n - half..])],
    )
    .ok()
}

/// Split R-hat of one parameter, `draws[chain][draw]`.
///
/// Returns NaN with fewer than 4 draws per chain or when every half-chain is constant.
pub fn split_rhat(draws: ArrayView2<f64>) -> f64 {
    let split = match split_chains(draws, 2) {
        Some(split) => split,
        None => return f64::NAN,
    };
    let (m, n) = split.dim();
    let n = n as f64;

    let (means, within) = match (split.mean_axis(Axis(1)), split.var_axis(Axis(1), 1.0).mean()) {
        (Some(means), Some(within)) => (means, within),
        _ => return f64::NAN,
    };
    if within <= 0.0 {
        return f64::NAN;
    }
    let grand = means.mean().unwrap_or(f64::NAN);
    let between = (means - grand).pow2().sum() * n / (m as f64 - 1.0);

    let var = within * ((n - 1.0) / n) + between / n;
    (var / within).sqrt()
}

/// Effective sample size of one parameter over split chains, using Geyer's initial
/// monotone sequence to truncate the autocorrelation sum.
///
/// Returns NaN with fewer than 8 draws per chain or zero variance.
pub fn ess(draws: ArrayView2<f64>) -> f64 {
    let split = match split_chains(draws, 4) {
        Some(split) => split,
        None => return f64::NAN,
    };
    let (m, n) = split.dim();
    let n_f = n as f64;

    let mut acov = Array2::<f64>::zeros((m, n));
    for (mut row, chain) in acov.axis_iter_mut(Axis(0)).zip(split.axis_iter(Axis(0))) {
        row.assign(&autocovariance(chain));
    }
    let mean_acov = match acov.mean_axis(Axis(0)) {
        Some(mean_acov) => mean_acov,
        None => return f64::NAN,
    };

    let mean_var = mean_acov[0] * n_f / (n_f - 1.0);
    let mut var_plus = mean_var * (n_f - 1.0) / n_f;
    if m > 1 {
        if let Some(means) = split.mean_axis(Axis(1)) {
            var_plus += means.var(1.0);
        }
    }
    if var_plus.is_nan() || var_plus <= 0.0 {
        return f64::NAN;
    }

    let rho = |lag: usize| 1.0 - (mean_var - mean_acov[lag]) / var_plus;
    let mut rho_hat = Array1::<f64>::zeros(n);
    let mut rho_even = 1.0;
    let mut rho_odd = rho(1);
    rho_hat[0] = rho_even;
    rho_hat[1] = rho_odd;

    let mut t = 1;
    while t + 3 < n && rho_even + rho_odd > 0.0 {
        rho_even = rho(t + 1);
        rho_odd = rho(t + 2);
        if rho_even + rho_odd >= 0.0 {
            rho_hat[t + 1] = rho_even;
            rho_hat[t + 2] = rho_odd;
        }
        t += 2;
    }
    // Last lag kept by the positive-pair rule; `t >= 1` so this is never negative.
    let last = t - 1;
    if rho_even > 0.0 {
        rho_hat[last] = rho_even;
    }

    // Initial monotone sequence.
    let mut t = 1;
    while t + 3 <= last {
        let prev = rho_hat[t - 1] + rho_hat[t];
        if rho_hat[t + 1] + rho_hat[t + 2] > prev {
            rho_hat[t + 1] = prev / 2.0;
            rho_hat[t + 2] = prev / 2.0;
        }
        t += 2;
    }

    let total = (m * n) as f64;
    let tau = -1.0 + 2.0 * rho_hat.slice(s![..last]).sum() + rho_hat[last].max(0.0);
    total / tau.max(1.0 / total.log10())
}

/// Narrowest interval containing `prob` of the values.
///
/// Returns `(NaN, NaN)` for an empty input.
pub fn hdi(values: &[f64], prob: f64) -> (f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let width = ((prob.clamp(0.0, 1.0) * n as f64).floor() as usize).min(n - 1);
    let lo = (0..n - width)
        .min_by(|&a, &b| {
            (sorted[a + width] - sorted[a]).total_cmp(&(sorted[b + width] - sorted[b]))
        })
        .unwrap_or(0);
    (sorted[lo], sorted[lo + width])
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSummary {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    pub hdi_low: f64,
    pub hdi_high: f64,
    pub ess: f64,
    pub r_hat: f64,
}

impl ParamSummary {
    pub fn from_draws(name: &str, draws: ArrayView2<f64>) -> Self {
        let pooled: Vec<f64> = draws.iter().copied().collect();
        let flat = ArrayView1::from(&pooled[..]);
        let (mean, sd) = match flat.len() {
            0 => (f64::NAN, f64::NAN),
            1 => (flat[0], f64::NAN),
            _ => (flat.mean().unwrap_or(f64::NAN), flat.std(1.0)),
        };
        let (hdi_low, hdi_high) = hdi(&pooled, HDI_PROB);
        Self {
            name: name.to_string(),
            mean,
            sd,
            hdi_low,
            hdi_high,
            ess: ess(draws),
            r_hat: split_rhat(draws),
        }
    }
}

impl fmt::Display for ParamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(self.name.len());
        write!(
            f,
            "{:<width$} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.1} {:>7.3}",
            self.name,
            self.mean,
            self.sd,
            self.hdi_low,
            self.hdi_high,
            self.ess,
            self.r_hat,
        )
    }
}

/// Summary row for every parameter, in table order.
pub fn summarize(posterior: &Posterior) -> Vec<ParamSummary> {
    posterior
        .iter()
        .map(|(name, draws)| ParamSummary::from_draws(name, draws))
        .collect()
}

/// Renders summary rows as an aligned text table with a header line.
pub fn summary_table(rows: &[ParamSummary]) -> String {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let lo = format!("hdi_{}%", (100.0 * (1.0 - HDI_PROB) / 2.0).round());
    let hi = format!("hdi_{}%", (100.0 * (1.0 + HDI_PROB) / 2.0).round());
    let mut out = format!(
        "{:<width$} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7}\n",
        "", "mean", "sd", lo, hi, "ess", "r_hat"
    );
    for row in rows {
        out.push_str(&format!("{row:width$}\n"));
    }
    out
}

/// Split R-hat of every parameter, in table order.
pub fn rhat_all(posterior: &Posterior) -> Vec<(String, f64)> {
    posterior
        .iter()
        .map(|(name, draws)| (name.to_string(), split_rhat(draws)))
        .collect()
}

/// Largest R-hat across parameters, or `None` if any is NaN or the table is empty.
pub fn max_rhat(posterior: &Posterior) -> Option<f64> {
    let all: Array1<f64> = rhat_all(posterior).into_iter().map(|(_, r)| r).collect();
    all.max().ok().copied()
}
