/*!
# Diagnostic Figures

Draws the standard set of MCMC figures for a [`Posterior`] as SVG files. Enable
via the `plot` feature.

| File | Content |
|---|---|
| `trace.svg` | Per-chain density and trace of every parameter |
| `pair.svg` | Pairwise scatter of pooled draws |
| `posterior.svg` | Pooled histogram with mean and HDI |
| `autocorr.svg` | Autocorrelation per parameter and chain |
| `corner.svg` | Histograms on the diagonal, scatter below it |

Parameters without draws are drawn as empty panels.
*/

use std::ops::Range;
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{ArrayView2, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Result, TwalkError};
use crate::posterior::Posterior;
use crate::stats::{autocorrelation, hdi, HDI_PROB};

const PANEL: (u32, u32) = (400, 300);
const BINS: usize = 30;
const MAX_LAG: usize = 100;
const MAX_POINTS: usize = 2000;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for TwalkError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        TwalkError::Plot(e.to_string())
    }
}

/// Writes all five figures into `dir` and returns their paths.
pub fn write_all<P: AsRef<Path>>(posterior: &Posterior, dir: P) -> Result<Vec<PathBuf>> {
    let figures: [(&str, fn(&Posterior, &Path) -> Result<()>); 5] = [
        ("trace.svg", trace),
        ("pair.svg", pair),
        ("posterior.svg", posterior_plot),
        ("autocorr.svg", autocorr),
        ("corner.svg", corner),
    ];

    let mut written = Vec::with_capacity(figures.len());
    for (file, draw) in figures {
        let path = dir.as_ref().join(file);
        draw(posterior, &path)?;
        info!("Saved {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Density (left) and trace (right) of every chain, one row per parameter.
pub fn trace(posterior: &Posterior, path: &Path) -> Result<()> {
    let rows = posterior.len().max(1);
    let root = SVGBackend::new(path, (2 * PANEL.0, rows as u32 * PANEL.1)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((rows, 2));
    for ((name, draws), row) in posterior.iter().zip(panels.chunks(2)) {
        density_panel(&row[0], name, draws)?;
        trace_panel(&row[1], name, draws)?;
    }
    root.present()?;
    Ok(())
}

/// Scatter of every pair of parameters, lower triangle only.
pub fn pair(posterior: &Posterior, path: &Path) -> Result<()> {
    let params: Vec<(&str, ArrayView2<f64>)> = posterior.iter().collect();
    let n = params.len().saturating_sub(1).max(1);
    let root = SVGBackend::new(path, (n as u32 * PANEL.1, n as u32 * PANEL.1)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((n, n));
    for i in 1..params.len() {
        for j in 0..i {
            let area = &panels[(i - 1) * n + j];
            scatter_panel(area, params[j], params[i])?;
        }
    }
    root.present()?;
    Ok(())
}

/// Pooled histogram of every parameter, annotated with its mean and HDI.
pub fn posterior_plot(posterior: &Posterior, path: &Path) -> Result<()> {
    let cols = posterior.len().clamp(1, 3);
    let rows = posterior.len().div_ceil(cols).max(1);
    let root = SVGBackend::new(path, (cols as u32 * PANEL.0, rows as u32 * PANEL.1))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((rows, cols));
    for ((name, draws), area) in posterior.iter().zip(panels.iter()) {
        let values: Vec<f64> = draws.iter().copied().collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let (lo, hi) = hdi(&values, HDI_PROB);
        let caption = format!(
            "{name}: mean {mean:.3}, {:.0}% HDI [{lo:.3}, {hi:.3}]",
            100.0 * HDI_PROB
        );

        let x_range = padded_range(&values);
        let hist = histogram(&values, &x_range, BINS);
        let y_max = top(hist.iter().map(|&(_, _, d)| d));

        let mut chart = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 16))
            .margin(5)
            .x_label_area_size(25)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, 0.0..y_max)?;
        chart.configure_mesh().x_labels(5).y_labels(4).draw()?;
        chart.draw_series(
            hist.iter()
                .map(|&(l, r, d)| Rectangle::new([(l, 0.0), (r, d)], BLUE.mix(0.5).filled())),
        )?;
        if lo.is_finite() && hi.is_finite() {
            chart.draw_series(LineSeries::new(
                vec![(lo, 0.0), (hi, 0.0)],
                BLACK.stroke_width(4),
            ))?;
        }
    }
    root.present()?;
    Ok(())
}

/// Autocorrelation bars, one row per parameter and one column per chain.
pub fn autocorr(posterior: &Posterior, path: &Path) -> Result<()> {
    let rows = posterior.len().max(1);
    let cols = posterior.n_chains().max(1);
    let root = SVGBackend::new(path, (cols as u32 * PANEL.0, rows as u32 * PANEL.1))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((rows, cols));
    for (r, (name, draws)) in posterior.iter().enumerate() {
        for (c, chain) in draws.axis_iter(Axis(0)).enumerate().take(cols) {
            let acf = autocorrelation(chain);
            let lags = acf.len().min(MAX_LAG);

            let mut chart = ChartBuilder::on(&panels[r * cols + c])
                .caption(format!("{name} (chain {c})"), ("sans-serif", 16))
                .margin(5)
                .x_label_area_size(25)
                .y_label_area_size(40)
                .build_cartesian_2d(-0.5..lags.max(1) as f64, -1.05..1.05)?;
            chart.configure_mesh().x_labels(5).y_labels(5).draw()?;
            chart.draw_series(acf.iter().take(lags).enumerate().map(|(lag, &rho)| {
                let x = lag as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, rho)], BLUE.filled())
            }))?;
        }
    }
    root.present()?;
    Ok(())
}

/// Histograms on the diagonal and pairwise scatter below it.
pub fn corner(posterior: &Posterior, path: &Path) -> Result<()> {
    let params: Vec<(&str, ArrayView2<f64>)> = posterior.iter().collect();
    let n = params.len().max(1);
    let root = SVGBackend::new(path, (n as u32 * PANEL.1, n as u32 * PANEL.1)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((n, n));
    for i in 0..params.len() {
        for j in 0..=i {
            let area = &panels[i * n + j];
            if i == j {
                histogram_panel(area, params[i].0, params[i].1)?;
            } else {
                scatter_panel(area, params[j], params[i])?;
            }
        }
    }
    root.present()?;
    Ok(())
}

fn density_panel(area: &Area, name: &str, draws: ArrayView2<f64>) -> Result<()> {
    let pooled: Vec<f64> = draws.iter().copied().collect();
    let x_range = padded_range(&pooled);
    let hists: Vec<Vec<(f64, f64, f64)>> = draws
        .axis_iter(Axis(0))
        .map(|chain| histogram(&chain.to_vec(), &x_range, BINS))
        .collect();
    let y_max = top(hists.iter().flatten().map(|&(_, _, d)| d));

    let mut chart = ChartBuilder::on(area)
        .caption(name, ("sans-serif", 16))
        .margin(5)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, 0.0..y_max)?;
    chart.configure_mesh().x_labels(5).y_labels(4).draw()?;
    for (c, hist) in hists.iter().enumerate() {
        chart.draw_series(LineSeries::new(
            hist.iter().map(|&(l, r, d)| ((l + r) / 2.0, d)),
            Palette99::pick(c).stroke_width(1),
        ))?;
    }
    Ok(())
}

fn trace_panel(area: &Area, name: &str, draws: ArrayView2<f64>) -> Result<()> {
    let pooled: Vec<f64> = draws.iter().copied().collect();
    let mut chart = ChartBuilder::on(area)
        .caption(name, ("sans-serif", 16))
        .margin(5)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..draws.ncols().max(1) as f64, padded_range(&pooled))?;
    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(4)
        .light_line_style(WHITE.mix(0.8))
        .draw()?;
    for (c, chain) in draws.axis_iter(Axis(0)).enumerate() {
        chart.draw_series(LineSeries::new(
            chain.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            Palette99::pick(c).stroke_width(1),
        ))?;
    }
    Ok(())
}

fn histogram_panel(area: &Area, name: &str, draws: ArrayView2<f64>) -> Result<()> {
    let values: Vec<f64> = draws.iter().copied().collect();
    let x_range = padded_range(&values);
    let hist = histogram(&values, &x_range, BINS);
    let y_max = top(hist.iter().map(|&(_, _, d)| d));

    let mut chart = ChartBuilder::on(area)
        .margin(5)
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, 0.0..y_max)?;
    chart
        .configure_mesh()
        .x_desc(name)
        .x_labels(4)
        .y_labels(3)
        .draw()?;
    chart.draw_series(
        hist.iter()
            .map(|&(l, r, d)| Rectangle::new([(l, 0.0), (r, d)], BLACK.mix(0.6).filled())),
    )?;
    Ok(())
}

fn scatter_panel(
    area: &Area,
    (x_name, x): (&str, ArrayView2<f64>),
    (y_name, y): (&str, ArrayView2<f64>),
) -> Result<()> {
    let xs: Vec<f64> = x.iter().copied().collect();
    let ys: Vec<f64> = y.iter().copied().collect();

    let mut chart = ChartBuilder::on(area)
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(padded_range(&xs), padded_range(&ys))?;
    chart
        .configure_mesh()
        .x_desc(x_name)
        .y_desc(y_name)
        .x_labels(4)
        .y_labels(4)
        .draw()?;

    // Pairing pooled draws only makes sense when both tables line up.
    if x.dim() != y.dim() {
        return Ok(());
    }
    let stride = (xs.len() / MAX_POINTS).max(1);
    chart.draw_series(
        xs.iter()
            .zip(&ys)
            .step_by(stride)
            .map(|(&a, &b)| Circle::new((a, b), 1, BLUE.mix(0.3).filled())),
    )?;
    Ok(())
}

/// Range covering the finite values with 5% padding on both sides.
fn padded_range(values: &[f64]) -> Range<f64> {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        0.0..1.0
    } else if lo == hi {
        lo - 0.5..hi + 0.5
    } else {
        let pad = 0.05 * (hi - lo);
        lo - pad..hi + pad
    }
}

/// Density histogram over `range` as `(left, right, density)` bins.
fn histogram(values: &[f64], range: &Range<f64>, bins: usize) -> Vec<(f64, f64, f64)> {
    let width = (range.end - range.start) / bins as f64;
    let mut counts = vec![0usize; bins];
    let mut total = 0usize;
    for &v in values.iter().filter(|v| range.contains(*v)) {
        let idx = (((v - range.start) / width) as usize).min(bins - 1);
        counts[idx] += 1;
        total += 1;
    }

    let norm = total.max(1) as f64 * width;
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let left = range.start + i as f64 * width;
            (left, left + width, count as f64 / norm)
        })
        .collect()
}

/// Upper y limit for densities, never zero.
fn top(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 {
        1.05 * max
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[]), 0.0..1.0);
        assert_eq!(padded_range(&[2.0, 2.0]), 1.5..2.5);
        assert_eq!(padded_range(&[f64::NAN, 0.0, 10.0]), -0.5..10.5);
    }

    #[test]
    fn test_histogram_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let range = padded_range(&values);
        let hist = histogram(&values, &range, 10);
        assert_eq!(hist.len(), 10);
        let area: f64 = hist.iter().map(|&(l, r, d)| (r - l) * d).sum();
        assert!((area - 1.0).abs() < 1e-12, "Histogram area {}", area);
    }

    #[test]
    fn test_write_all_creates_files() {
        let mut post = Posterior::new();
        post.insert(
            "a",
            Array2::from_shape_fn((2, 50), |(c, i)| (i as f64).sin() + c as f64),
        );
        post.insert(
            "b",
            Array2::from_shape_fn((2, 50), |(c, i)| (i as f64).cos() - c as f64),
        );
        post.insert("empty", Array2::zeros((2, 0)));

        let dir = tempdir().expect("Could not create temp dir");
        let written = write_all(&post, dir.path()).unwrap();
        assert_eq!(written.len(), 5);
        for path in written {
            let contents = fs::read_to_string(&path).unwrap();
            assert!(contents.contains("<svg"), "{} is not an SVG", path.display());
        }
    }

    #[test]
    fn test_write_all_empty_posterior() {
        let dir = tempdir().expect("Could not create temp dir");
        let written = write_all(&Posterior::new(), dir.path()).unwrap();
        assert!(written.iter().all(|p| p.exists()));
    }
}
