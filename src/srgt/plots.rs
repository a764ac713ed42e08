use crate::utils::Result;
use distplot::{generate, Figure, Layer, Point};
use std::path::Path;

const BAR_COLOR: &str = "#1f77b4";
const TRACE_COLOR: &str = "#1f77b4";
const PEAK_COLOR: &str = "#d62728";

/// Histogram of a density-estimation pass: one bar per bin, slightly
/// narrower than the bin for readability
pub fn save_density_plot(
    path: &Path,
    title: &str,
    densities: &[f64],
    edges: &[f64],
) -> Result<()> {
    let bin_width = edges[1] - edges[0];
    let points = densities
        .iter()
        .enumerate()
        .map(|(bin, &density)| Point::new((edges[bin] + edges[bin + 1]) / 2.0, density))
        .collect();

    let mut figure = Figure::new(title, "Read Count", "Bin Density");
    figure.layers.push(Layer::Bars {
        points,
        width: 0.7 * bin_width,
        color: BAR_COLOR.to_string(),
    });
    write_figure(&figure, path)
}

/// Raw count series with markers on the called peaks (1-based)
pub fn save_peak_plot(
    path: &Path,
    title: &str,
    x_label: &str,
    counts: &[u32],
    peaks: &[usize],
) -> Result<()> {
    let trace = counts
        .iter()
        .enumerate()
        .map(|(index, &count)| Point::new(index as f64, count as f64))
        .collect();
    let markers = peaks
        .iter()
        .map(|&peak| Point::new((peak - 1) as f64, counts[peak - 1] as f64))
        .collect();

    let mut figure = Figure::new(title, x_label, "Read Count");
    figure.layers.push(Layer::Line {
        points: trace,
        color: TRACE_COLOR.to_string(),
    });
    figure.layers.push(Layer::Markers {
        points: markers,
        color: PEAK_COLOR.to_string(),
    });
    write_figure(&figure, path)
}

fn write_figure(figure: &Figure, path: &Path) -> Result<()> {
    generate(figure, path).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}
