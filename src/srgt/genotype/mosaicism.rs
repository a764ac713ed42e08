use super::gt::Allele;
use crate::srgt::distribution::{RepeatDistribution, CAG_BINS};
use crate::utils::Result;

/// Length of the anchored padded distribution
pub const PAD_LEN: usize = 403;
/// 1-based slot every allele's N value is aligned to
pub const ANCHOR: usize = 203;

/// Neighbor counts around the called repeat length and their ratios.
/// Missing counts come from out-of-bounds lookups at the band edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mosaicism {
    pub n_minus: Option<u32>,
    pub n: Option<u32>,
    pub n_plus: Option<u32>,
    pub nminus_over_n: f64,
    pub nplus_over_n: f64,
}

/// The allele's 200-count CAG band placed in a 403-slot buffer so that the
/// called repeat length N sits at the same slot for every sample. Buffer
/// slots are `None`, which keeps them distinguishable from true zero counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBand {
    slots: Vec<Option<u32>>,
}

impl PaddedBand {
    fn new(band: &[u32], cag: usize) -> Result<Self> {
        let left = ANCHOR.checked_sub(cag).ok_or_else(|| {
            format!("CAG value {} exceeds the padding anchor {}", cag, ANCHOR)
        })?;
        let mut slots = Vec::with_capacity(PAD_LEN);
        slots.resize(left, None);
        slots.extend(band.iter().map(|&count| Some(count)));
        slots.resize(PAD_LEN, None);
        Ok(PaddedBand { slots })
    }

    pub fn slots(&self) -> &[Option<u32>] {
        &self.slots
    }
}

/// Quantifies somatic mosaicism around a called allele: scrape the N-1/N/N+1
/// read counts from the allele's CAG band of the forward distribution, form
/// the neighbor ratios, and anchor the band for cross-sample comparison.
/// Returns the metrics, the padded band, and whether a neighbor count
/// exceeds the called peak (a consensus-spread finding).
pub fn investigate(
    allele: &Allele,
    forward: &RepeatDistribution,
    sample_id: &str,
) -> Result<(Mosaicism, PaddedBand, bool)> {
    let band = forward.ccg_band(allele.ccg)?;
    if allele.cag == 0 || allele.cag > CAG_BINS {
        return Err(format!(
            "CAG value {} is out of bounds [1, {}]",
            allele.cag, CAG_BINS
        ));
    }

    let n_minus = allele.cag.checked_sub(2).and_then(|i| band.get(i)).copied();
    let n = allele.cag.checked_sub(1).and_then(|i| band.get(i)).copied();
    let n_plus = band.get(allele.cag).copied();
    if n_minus.is_none() || n.is_none() || n_plus.is_none() {
        log::info!(
            "{}: N-value scraping out of bounds for CAG {} (CCG {})",
            sample_id,
            allele.cag,
            allele.ccg
        );
    }

    let ratio = |neighbor: Option<u32>| {
        let (Some(neighbor), Some(n)) = (neighbor, n) else {
            return 0.0;
        };
        if n == 0 {
            log::info!(
                "{}: divide by zero attempted in mosaicism calculation (CAG {}, CCG {})",
                sample_id,
                allele.cag,
                allele.ccg
            );
            return 0.0;
        }
        neighbor as f64 / n as f64
    };
    let mosaicism = Mosaicism {
        n_minus,
        n,
        n_plus,
        nminus_over_n: ratio(n_minus),
        nplus_over_n: ratio(n_plus),
    };

    // A neighbor outgrowing the called peak means the call is not locally
    // dominant in the distribution
    let spread = match n {
        Some(n) => {
            n_minus.is_some_and(|count| count > n) || n_plus.is_some_and(|count| count > n)
        }
        None => false,
    };

    let padded = PaddedBand::new(band, allele.cag)?;
    Ok((mosaicism, padded, spread))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srgt::distribution::{CAG_BINS, DIST_LEN};

    fn distribution_with_band(ccg: usize, band: &[u32; CAG_BINS]) -> RepeatDistribution {
        let mut counts = vec![0u32; DIST_LEN];
        counts[(ccg - 1) * CAG_BINS..ccg * CAG_BINS].copy_from_slice(band);
        RepeatDistribution::new(counts).unwrap()
    }

    #[test]
    fn test_ratios() {
        let mut band = [0u32; CAG_BINS];
        band[40] = 10; // N-1
        band[41] = 20; // N for CAG 42
        band[42] = 5; // N+1
        let forward = distribution_with_band(3, &band);
        let allele = Allele::new(42, 3);
        let (mosaicism, _, spread) = investigate(&allele, &forward, "s1").unwrap();
        assert_eq!(mosaicism.n_minus, Some(10));
        assert_eq!(mosaicism.n, Some(20));
        assert_eq!(mosaicism.n_plus, Some(5));
        assert_eq!(mosaicism.nminus_over_n, 0.5);
        assert_eq!(mosaicism.nplus_over_n, 0.25);
        assert!(!spread);
    }

    #[test]
    fn test_zero_n_yields_zero_ratios() {
        let mut band = [0u32; CAG_BINS];
        band[40] = 10;
        band[42] = 5;
        let forward = distribution_with_band(3, &band);
        let allele = Allele::new(42, 3);
        let (mosaicism, _, _) = investigate(&allele, &forward, "s1").unwrap();
        assert_eq!(mosaicism.n, Some(0));
        assert_eq!(mosaicism.nminus_over_n, 0.0);
        assert_eq!(mosaicism.nplus_over_n, 0.0);
    }

    #[test]
    fn test_out_of_bounds_neighbors_are_missing() {
        let mut band = [0u32; CAG_BINS];
        band[0] = 8;
        band[CAG_BINS - 1] = 9;
        let forward = distribution_with_band(1, &band);

        let (left_edge, _, _) = investigate(&Allele::new(1, 1), &forward, "s1").unwrap();
        assert_eq!(left_edge.n_minus, None);
        assert_eq!(left_edge.n, Some(8));
        assert_eq!(left_edge.nminus_over_n, 0.0);

        let (right_edge, _, _) = investigate(&Allele::new(CAG_BINS, 1), &forward, "s1").unwrap();
        assert_eq!(right_edge.n_plus, None);
        assert_eq!(right_edge.n, Some(9));
    }

    #[test]
    fn test_spread_when_neighbor_dominates() {
        let mut band = [0u32; CAG_BINS];
        band[40] = 30;
        band[41] = 20;
        let forward = distribution_with_band(3, &band);
        let (_, _, spread) = investigate(&Allele::new(42, 3), &forward, "s1").unwrap();
        assert!(spread);
    }

    #[test]
    fn test_padded_band_anchor() {
        let mut band = [0u32; CAG_BINS];
        for (i, slot) in band.iter_mut().enumerate() {
            *slot = i as u32 + 1;
        }
        let forward = distribution_with_band(5, &band);
        for cag in [1, 42, CAG_BINS] {
            let (_, padded, _) = investigate(&Allele::new(cag, 5), &forward, "s1").unwrap();
            assert_eq!(padded.slots().len(), PAD_LEN);
            // The called length always lands on the anchor slot
            assert_eq!(padded.slots()[ANCHOR - 1], Some(cag as u32));
        }
    }

    #[test]
    fn test_padding_distinguishes_missing_from_zero() {
        let band = [0u32; CAG_BINS];
        let forward = distribution_with_band(5, &band);
        let (_, padded, _) = investigate(&Allele::new(100, 5), &forward, "s1").unwrap();
        assert_eq!(padded.slots()[0], None);
        assert_eq!(padded.slots()[ANCHOR - 1], Some(0));
        assert_eq!(padded.slots()[PAD_LEN - 1], None);
    }
}
