use crate::utils::{open_table_reader, Result};
use std::path::Path;

/// Number of CCG bins along the outer axis of a joint distribution
pub const CCG_BINS: usize = 20;
/// Number of CAG lengths within each CCG bin
pub const CAG_BINS: usize = 200;
/// Total length of a joint CAG x CCG read-count distribution
pub const DIST_LEN: usize = CCG_BINS * CAG_BINS;

/// Read counts over the joint CAG x CCG grid, contiguous per CCG bin
/// (CAG1-200 of CCG1, then CAG1-200 of CCG2, and so on)
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatDistribution {
    counts: Vec<u32>,
}

impl RepeatDistribution {
    pub fn new(counts: Vec<u32>) -> Result<Self> {
        if counts.len() != DIST_LEN {
            return Err(format!(
                "Expected a distribution of {} read counts, got {}",
                DIST_LEN,
                counts.len()
            ));
        }
        for (bin, segment) in counts.chunks_exact(CAG_BINS).enumerate() {
            let total: u64 = segment.iter().map(|&n| n as u64).sum();
            if total > u32::MAX as u64 {
                return Err(format!(
                    "CCG bin {} read count total {} exceeds the supported maximum {}",
                    bin + 1,
                    total,
                    u32::MAX
                ));
            }
        }
        Ok(RepeatDistribution { counts })
    }

    /// Loads read counts from an aligner-produced CSV table: one header row,
    /// then one row per (CAG, CCG) pair with the count in the third column
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_table_reader(path)?;
        let mut table = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut counts = Vec::with_capacity(DIST_LEN);
        for (row_index, record) in table.records().enumerate() {
            let record =
                record.map_err(|e| format!("{}: row {}: {}", path.display(), row_index + 2, e))?;
            let field = record.get(2).ok_or_else(|| {
                format!(
                    "{}: row {}: expected at least 3 columns, got {}",
                    path.display(),
                    row_index + 2,
                    record.len()
                )
            })?;
            let count: u32 = field.trim().parse().map_err(|_| {
                format!(
                    "{}: row {}: invalid read count `{}`",
                    path.display(),
                    row_index + 2,
                    field
                )
            })?;
            counts.push(count);
        }

        Self::new(counts).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn total_reads(&self) -> u64 {
        self.counts.iter().map(|&n| n as u64).sum()
    }

    /// Aggregates all CAG counts within each CCG bin, reducing the joint
    /// distribution to its 20-element CCG marginal
    pub fn collapse(&self) -> Result<[u32; CCG_BINS]> {
        if self.counts.len() % CCG_BINS != 0 {
            return Err(format!(
                "Unable to split distribution of length {} into {} CCG bins",
                self.counts.len(),
                CCG_BINS
            ));
        }
        let segment_len = self.counts.len() / CCG_BINS;
        let mut collapsed = [0u32; CCG_BINS];
        for (segment, slot) in self.counts.chunks_exact(segment_len).zip(&mut collapsed) {
            // Band totals fit in u32 by construction
            *slot = segment.iter().map(|&n| n as u64).sum::<u64>() as u32;
        }
        Ok(collapsed)
    }

    /// Returns the 200-element CAG sub-distribution for a 1-based CCG bin
    pub fn ccg_band(&self, ccg: usize) -> Result<&[u32]> {
        if !(1..=CCG_BINS).contains(&ccg) {
            return Err(format!(
                "CCG bin {} is out of bounds [1, {}]",
                ccg, CCG_BINS
            ));
        }
        let start = (ccg - 1) * CAG_BINS;
        Ok(&self.counts[start..start + CAG_BINS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ramp_distribution() -> RepeatDistribution {
        RepeatDistribution::new((0..DIST_LEN as u32).collect()).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(RepeatDistribution::new(vec![0; DIST_LEN - 1]).is_err());
        assert!(RepeatDistribution::new(vec![0; DIST_LEN + 1]).is_err());
        assert!(RepeatDistribution::new(vec![0; DIST_LEN]).is_ok());
    }

    #[test]
    fn test_large_counts_collapse_without_overflow() {
        let dist = RepeatDistribution::new(vec![20_000_000; DIST_LEN]).unwrap();
        let collapsed = dist.collapse().unwrap();
        assert_eq!(collapsed[0], 4_000_000_000);
        let collapsed_total: u64 = collapsed.iter().map(|&n| n as u64).sum();
        assert_eq!(collapsed_total, dist.total_reads());
    }

    #[test]
    fn test_rejects_band_totals_beyond_u32() {
        assert!(RepeatDistribution::new(vec![30_000_000; DIST_LEN]).is_err());
    }

    #[test]
    fn test_collapse_conserves_total() {
        let dist = ramp_distribution();
        let collapsed = dist.collapse().unwrap();
        let collapsed_total: u64 = collapsed.iter().map(|&n| n as u64).sum();
        assert_eq!(collapsed_total, dist.total_reads());
    }

    #[test]
    fn test_collapse_segment_order() {
        let mut counts = vec![0u32; DIST_LEN];
        counts[0] = 7; // CCG1
        counts[CAG_BINS] = 11; // CCG2
        counts[DIST_LEN - 1] = 3; // CCG20
        let dist = RepeatDistribution::new(counts).unwrap();
        let collapsed = dist.collapse().unwrap();
        assert_eq!(collapsed[0], 7);
        assert_eq!(collapsed[1], 11);
        assert_eq!(collapsed[19], 3);
    }

    #[test]
    fn test_bands_conserve_total() {
        let dist = ramp_distribution();
        let band_total: u64 = (1..=CCG_BINS)
            .map(|ccg| {
                dist.ccg_band(ccg)
                    .unwrap()
                    .iter()
                    .map(|&n| n as u64)
                    .sum::<u64>()
            })
            .sum();
        assert_eq!(band_total, dist.total_reads());
    }

    #[test]
    fn test_ccg_band_bounds() {
        let dist = ramp_distribution();
        assert!(dist.ccg_band(0).is_err());
        assert!(dist.ccg_band(21).is_err());
        let band = dist.ccg_band(2).unwrap();
        assert_eq!(band.len(), CAG_BINS);
        assert_eq!(band[0], CAG_BINS as u32);
    }

    #[test]
    fn test_collapse_matches_bands_on_random_counts() {
        use rand::Rng;
        let mut rng = rand::rng();
        let counts: Vec<u32> = (0..DIST_LEN).map(|_| rng.random_range(0..50)).collect();
        let dist = RepeatDistribution::new(counts).unwrap();
        let collapsed = dist.collapse().unwrap();
        for ccg in 1..=CCG_BINS {
            let band_sum: u32 = dist.ccg_band(ccg).unwrap().iter().sum();
            assert_eq!(collapsed[ccg - 1], band_sum);
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label,repeat,count").unwrap();
        for i in 0..DIST_LEN {
            writeln!(file, "ref_{},x,{}", i, i % 17).unwrap();
        }
        let dist = RepeatDistribution::from_path(file.path()).unwrap();
        assert_eq!(dist.counts().len(), DIST_LEN);
        assert_eq!(dist.counts()[1], 1);
    }

    #[test]
    fn test_from_path_wrong_row_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label,repeat,count").unwrap();
        writeln!(file, "ref_0,x,5").unwrap();
        assert!(RepeatDistribution::from_path(file.path()).is_err());
    }

    #[test]
    fn test_from_path_bad_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label,repeat,count").unwrap();
        writeln!(file, "ref_0,x,many").unwrap();
        assert!(RepeatDistribution::from_path(file.path()).is_err());
    }
}
