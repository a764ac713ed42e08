/*!
This crate provides functionality to generate simple distribution plots: bar
charts of binned densities and line traces of raw count series with marked
peaks. Figures are rendered as standalone SVG images.

Distribution plots are useful for visually reviewing read-count histograms
and the peaks called from them.
*/

mod figure;
mod svg;

pub use figure::{Color, Figure, Layer, Point};
pub use svg::generate;
