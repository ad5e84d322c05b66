//! Visual QC artifacts: slice montages (PNG) and density plots (SVG)

pub mod density;
pub mod montage;

pub use density::{save_density_plot, DensityEstimate, DensityPlot};
pub use montage::SliceMontage;

/// Escapes text for inclusion in HTML or SVG markup
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
