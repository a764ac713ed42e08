use crate::utils::Result;
use std::collections::HashMap;

const HISTOGRAM_BINS: usize = 20;
const BASE_PEAK_THRESHOLD: f64 = 0.50;
const SKEW_DEDUCTION: f64 = 0.05;
const DENSITY_DEDUCTION: f64 = 0.075;
const AMBIGUITY_DEDUCTION: f64 = 0.10;

/// Peak locations estimated from the density pass, 1-based
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakEstimate {
    pub primary: usize,
    pub secondary: usize,
    pub distance: usize,
    pub threshold: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EstimateFlags {
    pub expansion_skew: bool,
    pub density_ambiguous: bool,
    pub peak_ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityEstimate {
    pub estimate: PeakEstimate,
    pub flags: EstimateFlags,
    /// Normalized histogram densities, one per bin
    pub densities: Vec<f64>,
    /// Histogram bin edges, one more than the bin count
    pub edges: Vec<f64>,
}

/// First pass of the two-pass algorithm: place the expected peaks from the
/// raw value ranking and a density histogram of the distribution, and derive
/// the detection threshold for the differential pass from what was seen.
pub fn density_estimation(counts: &[u32], peak_target: usize) -> Result<DensityEstimate> {
    assert!(peak_target == 1 || peak_target == 2);
    let mut flags = EstimateFlags::default();

    let (major_value, major_index) = first_max(counts, |_| true)
        .ok_or_else(|| "Cannot estimate peaks of an empty distribution".to_string())?;
    let (mut minor_value, mut minor_index) = first_max(counts, |n| n != major_value)
        .ok_or_else(|| "Cannot estimate peaks: all read counts are identical".to_string())?;

    // N-1 of the major peak as runner-up is a slippage artifact, not a real
    // second allele; fall back to the next-highest value
    if major_index.checked_sub(1) == Some(minor_index) {
        let (literal_value, literal_index) =
            first_max(counts, |n| n != major_value && n != minor_value).ok_or_else(|| {
                "Cannot estimate peaks: no candidate left after slippage correction".to_string()
            })?;
        minor_value = literal_value;
        minor_index = literal_index;
        flags.expansion_skew = true;
    }

    let (densities, edges) = density_histogram(counts, HISTOGRAM_BINS);

    // Many repeated low-density values point at a noisy distribution
    let mut density_frequency: HashMap<u64, usize> = HashMap::new();
    for &density in &densities {
        *density_frequency.entry(density.to_bits()).or_insert(0) += 1;
    }
    if density_frequency
        .iter()
        .any(|(&bits, &freq)| f64::from_bits(bits) != 0.0 && freq > 2)
    {
        flags.density_ambiguous = true;
    }

    // The asymmetric corrections below are intentional and verified against
    // historical calls; do not align them
    let major_bin = digitize(major_value as f64, &edges) as isize - 2;
    let minor_bin = digitize(minor_value as f64, &edges) as isize - 1;

    let major_sparsity = min_nonzero_density(&densities, None)
        .ok_or_else(|| "Density histogram is empty".to_string())?;
    let distance;
    if peak_target == 1 {
        distance = 0;
        if !peak_clarity_1(&densities, major_bin, major_sparsity) {
            flags.peak_ambiguous = true;
        }
    } else {
        let minor_sparsity =
            min_nonzero_density(&densities, Some(major_sparsity)).ok_or_else(|| {
                "Cannot estimate peaks: no distinct minor density in histogram".to_string()
            })?;
        distance = major_index.abs_diff(minor_index);
        if !peak_clarity_2(
            &densities,
            major_bin,
            major_sparsity,
            minor_bin,
            minor_sparsity,
        ) {
            flags.peak_ambiguous = true;
        }
    }

    let fuzzy_count = densities
        .iter()
        .filter(|&&density| isclose(major_sparsity, density))
        .count();
    if fuzzy_count > 3 {
        flags.density_ambiguous = true;
    }

    let mut threshold = BASE_PEAK_THRESHOLD;
    if flags.expansion_skew {
        threshold -= SKEW_DEDUCTION;
    }
    if flags.density_ambiguous {
        threshold -= DENSITY_DEDUCTION;
    }
    if flags.peak_ambiguous {
        threshold -= AMBIGUITY_DEDUCTION;
    }

    let (primary, secondary) = if peak_target == 1 {
        (major_index + 1, major_index + 1)
    } else {
        (major_index + 1, minor_index + 1)
    };

    Ok(DensityEstimate {
        estimate: PeakEstimate {
            primary,
            secondary,
            distance,
            threshold,
        },
        flags,
        densities,
        edges,
    })
}

/// Maximum over the values accepted by `keep`, with the first index at which
/// that maximum occurs anywhere in the slice
fn first_max(counts: &[u32], keep: impl Fn(u32) -> bool) -> Option<(u32, usize)> {
    let value = counts.iter().copied().filter(|&n| keep(n)).max()?;
    let index = counts.iter().position(|&n| n == value)?;
    Some((value, index))
}

/// Equal-width density histogram over `[min, max]`: bin areas sum to one,
/// all bins are half-open except the last, which also takes the maximum
fn density_histogram(counts: &[u32], bins: usize) -> (Vec<f64>, Vec<f64>) {
    let mut lo = counts.iter().copied().min().unwrap_or(0) as f64;
    let mut hi = counts.iter().copied().max().unwrap_or(0) as f64;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let mut edges = Vec::with_capacity(bins + 1);
    for i in 0..=bins {
        edges.push(lo + (hi - lo) * i as f64 / bins as f64);
    }
    edges[bins] = hi;

    let mut tallies = vec![0usize; bins];
    for &count in counts {
        let offset = (count as f64 - lo) / (hi - lo) * bins as f64;
        let bin = (offset as usize).min(bins - 1);
        tallies[bin] += 1;
    }

    let width = (hi - lo) / bins as f64;
    let total = counts.len() as f64;
    let densities = tallies
        .iter()
        .map(|&tally| tally as f64 / (total * width))
        .collect();
    (densities, edges)
}

/// Number of bin edges less than or equal to the value
fn digitize(value: f64, edges: &[f64]) -> usize {
    edges.iter().filter(|&&edge| edge <= value).count()
}

fn min_nonzero_density(densities: &[f64], exclude: Option<f64>) -> Option<f64> {
    densities
        .iter()
        .copied()
        .filter(|&d| d != 0.0 && Some(d) != exclude)
        .fold(None, |acc: Option<f64>, d| {
            Some(acc.map_or(d, |best| best.min(d)))
        })
}

/// Counts how many densities around the peak's bin are close to the peak's
/// sparsity value; a crowded neighborhood means the peak is not clean
fn clarity_count(densities: &[f64], bin: isize, sparsity: f64) -> usize {
    window(densities, bin - 2, bin + 2)
        .iter()
        .filter(|&&density| isclose(sparsity, density))
        .count()
}

fn peak_clarity_1(densities: &[f64], major_bin: isize, major_sparsity: f64) -> bool {
    clarity_count(densities, major_bin, major_sparsity) <= 3
}

fn peak_clarity_2(
    densities: &[f64],
    major_bin: isize,
    major_sparsity: f64,
    minor_bin: isize,
    minor_sparsity: f64,
) -> bool {
    let total = clarity_count(densities, major_bin, major_sparsity)
        + clarity_count(densities, minor_bin, minor_sparsity);
    total <= 5
}

/// Python-style slice: negative bounds count from the end, the window is
/// empty whenever the resolved start is not before the resolved stop
fn window(values: &[f64], start: isize, stop: isize) -> &[f64] {
    let len = values.len() as isize;
    let resolve = |i: isize| -> usize {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len) as usize
    };
    let (start, stop) = (resolve(start), resolve(stop));
    if start >= stop {
        &[]
    } else {
        &values[start..stop]
    }
}

fn isclose(a: f64, b: f64) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    (a - b).abs() <= ATOL + RTOL * b.abs()
}
