mod estimate;
mod fod;
mod gt;
mod mosaicism;
mod twopass;

pub use estimate::{density_estimation, DensityEstimate, EstimateFlags, PeakEstimate};
pub use fod::find_peaks;
pub use gt::{Allele, Genotype, GenotypeFlags};
pub use mosaicism::{investigate, Mosaicism, PaddedBand, ANCHOR, PAD_LEN};
pub use twopass::{run_two_pass, TwoPassOutcome};
