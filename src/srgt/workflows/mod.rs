mod sample;

use std::path::PathBuf;

pub use sample::{analyze_sample, SampleResult};

pub struct Params {
    pub max_peak_recalls: usize,
    pub plot_dir: Option<PathBuf>,
}
