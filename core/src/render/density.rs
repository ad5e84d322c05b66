use super::escape_markup;
use crate::error::Result;
use crate::volume::Volume;
use std::f64::consts::PI;
use std::fmt;
use std::fs;
use std::path::Path;

/// Number of evaluation points along the intensity axis
const GRID_SIZE: usize = 200;

/// Bandwidths the evaluation grid extends past the data range
const CUT: f64 = 3.0;

/// Bins used to pre-aggregate voxels before kernel evaluation
const BIN_COUNT: usize = 1024;

// SVG canvas geometry
const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

/// Gaussian kernel density estimate of a set of intensities
///
/// Uses Scott's rule for the bandwidth (`sample std * n^(-1/5)`). Values are
/// first aggregated into equal-width bins so the cost does not grow with
/// the voxel count.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityEstimate {
    pub bandwidth: f64,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl DensityEstimate {
    /// Estimates the density of `values`
    ///
    /// Non-finite values are ignored. Returns `None` when fewer than two
    /// finite values remain or they have zero variance.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        let n = values.len();
        if n < 2 {
            return None;
        }

        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if hi <= lo {
            return None;
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let sample_var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let bandwidth = sample_var.sqrt() * (n as f64).powf(-0.2);
        if bandwidth <= 0.0 || !bandwidth.is_finite() {
            return None;
        }

        // 1. Bin the data
        let bin_width = (hi - lo) / BIN_COUNT as f64;
        let mut counts = vec![0u64; BIN_COUNT];
        for v in &values {
            let bin = (((v - lo) / bin_width) as usize).min(BIN_COUNT - 1);
            counts[bin] += 1;
        }

        // 2. Evaluate the kernel sum on the grid
        let start = lo - CUT * bandwidth;
        let end = hi + CUT * bandwidth;
        let step = (end - start) / (GRID_SIZE - 1) as f64;
        let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());

        let xs: Vec<f64> = (0..GRID_SIZE).map(|i| start + i as f64 * step).collect();
        let ys = xs
            .iter()
            .map(|&x| {
                let kernel_sum: f64 = counts
                    .iter()
                    .enumerate()
                    .filter(|(_, &c)| c > 0)
                    .map(|(b, &c)| {
                        let center = lo + (b as f64 + 0.5) * bin_width;
                        let u = (x - center) / bandwidth;
                        c as f64 * (-0.5 * u * u).exp()
                    })
                    .sum();
                kernel_sum * norm
            })
            .collect();

        Some(Self { bandwidth, xs, ys })
    }

    /// Integral of the estimate over the grid (trapezoid rule)
    pub fn area(&self) -> f64 {
        self.xs
            .windows(2)
            .zip(self.ys.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }
}

/// Standalone SVG line plot of a density estimate
///
/// Without an estimate the plot carries a note in place of the curve.
#[derive(Debug, Clone)]
pub struct DensityPlot {
    pub title: String,
    pub estimate: Option<DensityEstimate>,
}

impl DensityPlot {
    /// Estimates the voxel intensity density of a volume
    pub fn from_volume(volume: &Volume, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            estimate: DensityEstimate::from_values(volume.voxels()),
        }
    }

    /// Writes the SVG document to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for DensityPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let bottom = MARGIN_TOP + plot_h;

        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = WIDTH,
            h = HEIGHT
        )?;
        writeln!(f, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            f,
            r#"<text x="{}" y="{}" font-size="18" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            MARGIN_TOP / 2.0,
            escape_markup(&self.title)
        )?;
        writeln!(
            f,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black"/>"#,
            MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h
        )?;
        writeln!(
            f,
            r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Image Intensity</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 20.0
        )?;
        writeln!(
            f,
            r#"<text x="20" y="{y}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y})">Density</text>"#,
            y = MARGIN_TOP + plot_h / 2.0
        )?;

        match &self.estimate {
            Some(est) => {
                let x_min = est.xs.first().copied().unwrap_or(0.0);
                let x_max = est.xs.last().copied().unwrap_or(1.0);
                let y_max = est.ys.iter().copied().fold(0.0, f64::max).max(f64::MIN_POSITIVE);
                let x_span = (x_max - x_min).max(f64::MIN_POSITIVE);

                let px = |x: f64| MARGIN_LEFT + (x - x_min) / x_span * plot_w;
                let py = |y: f64| bottom - y / y_max * plot_h;

                for i in 0..=5 {
                    let x = x_min + x_span * i as f64 / 5.0;
                    writeln!(
                        f,
                        r#"<line x1="{x}" y1="{b}" x2="{x}" y2="{t}" stroke="black"/><text x="{x}" y="{l}" font-size="12" text-anchor="middle">{v}</text>"#,
                        x = px(x),
                        b = bottom,
                        t = bottom + 5.0,
                        l = bottom + 20.0,
                        v = format_tick(x)
                    )?;
                }
                for i in 0..=4 {
                    let y = y_max * i as f64 / 4.0;
                    writeln!(
                        f,
                        r#"<line x1="{a}" y1="{y}" x2="{m}" y2="{y}" stroke="black"/><text x="{l}" y="{ty}" font-size="12" text-anchor="end">{v}</text>"#,
                        a = MARGIN_LEFT - 5.0,
                        m = MARGIN_LEFT,
                        y = py(y),
                        l = MARGIN_LEFT - 8.0,
                        ty = py(y) + 4.0,
                        v = format_tick(y)
                    )?;
                }

                let points: Vec<String> = est
                    .xs
                    .iter()
                    .zip(&est.ys)
                    .map(|(&x, &y)| format!("{:.2},{:.2}", px(x), py(y)))
                    .collect();
                writeln!(
                    f,
                    r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
                    points.join(" ")
                )?;
            }
            None => {
                writeln!(
                    f,
                    r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Density unavailable: fewer than two distinct intensities</text>"#,
                    MARGIN_LEFT + plot_w / 2.0,
                    MARGIN_TOP + plot_h / 2.0
                )?;
            }
        }

        writeln!(f, "</svg>")
    }
}

/// Writes the `Density Plot - <base>` SVG of a volume's intensities
pub fn save_density_plot<P: AsRef<Path>>(volume: &Volume, base: &str, path: P) -> Result<()> {
    DensityPlot::from_volume(volume, format!("Density Plot - {}", base)).save(path)
}

/// Short tick label for an axis value
fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(0.01..10_000.0).contains(&a) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}
