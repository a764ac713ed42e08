use super::Params;
use crate::srgt::classify::{Zygosity, ZygosityModel};
use crate::srgt::distribution::{RepeatDistribution, CCG_BINS};
use crate::srgt::genotype::{
    investigate, run_two_pass, Allele, Genotype, GenotypeFlags, Mosaicism, PaddedBand,
    TwoPassOutcome,
};
use crate::srgt::plots;
use crate::srgt::sample::SamplePair;
use crate::utils::Result;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug)]
pub struct SampleResult {
    pub genotype: Genotype,
    pub zygosity: Zygosity,
    pub flags: GenotypeFlags,
    pub mosaicism: [Mosaicism; 2],
    pub padded: [PaddedBand; 2],
}

/// Calls a sample's genotype from its forward/reverse read-count
/// distributions: CCG zygosity from the classifier, CCG peaks from the
/// reverse reads, CAG peaks per CCG allele from the forward reads, then
/// somatic-mosaicism metrics for both alleles.
pub fn analyze_sample(
    sample: &SamplePair,
    model: &ZygosityModel,
    params: &Params,
) -> Result<SampleResult> {
    let forward = RepeatDistribution::from_path(&sample.forward_path)?;
    let reverse = RepeatDistribution::from_path(&sample.reverse_path)?;
    let mut flags = GenotypeFlags::default();

    let forward_collapsed = forward.collapse()?;
    let reverse_collapsed = reverse.collapse()?;

    // CCG reads are higher quality in the reverse direction; the forward
    // label is only a cross-check
    let forward_label = model.predict(&forward_collapsed)?;
    let reverse_label = model.predict(&reverse_collapsed)?;
    if forward_label != reverse_label {
        log::debug!(
            "{}: zygosity disagreement, forward={} reverse={}",
            sample.id,
            forward_label,
            reverse_label
        );
        flags.ccg_zyg_disconnect = true;
    }
    let zygosity = Zygosity::from_str(reverse_label)?;

    // CCG genotype from the reverse collapsed distribution
    let (ccg_outcome, ccg_recalled) = two_pass_with_recall(
        &reverse_collapsed,
        zygosity.peak_target(),
        params.max_peak_recalls,
    )?;
    if ccg_recalled {
        flags.ccg_recall_warning = true;
        flags.fpsp_disconnect = true;
    }
    flags.ccg_expansion_skew |= ccg_outcome.density.flags.expansion_skew;
    flags.ccg_density_ambiguous |= ccg_outcome.density.flags.density_ambiguous;
    flags.ccg_peak_ambiguous |= ccg_outcome.density.flags.peak_ambiguous;

    let primary_ccg = ccg_outcome.primary;
    let secondary_ccg = ccg_outcome.secondary;
    if !(1..=CCG_BINS).contains(&primary_ccg) || !(1..=CCG_BINS).contains(&secondary_ccg) {
        flags.ccg_peak_oob = true;
        return Err(format!(
            "{}: called CCG pair ({}, {}) is out of bounds [1, {}]",
            sample.id, primary_ccg, secondary_ccg, CCG_BINS
        ));
    }

    // CAG genotype per CCG allele, from the forward distribution. A
    // homozygous CCG pairs one band with two CAG peaks (detected order);
    // a heterozygous CCG pairs each band with one peak, matched to its
    // allele slot by CCG value
    let mut cag_runs: Vec<(usize, &[u32], TwoPassOutcome)> = Vec::new();
    let (primary_cag, secondary_cag) = match zygosity {
        Zygosity::Homozygous => {
            let band = forward.ccg_band(primary_ccg)?;
            let (outcome, recalled) = two_pass_with_recall(band, 2, params.max_peak_recalls)?;
            if recalled {
                flags.cag_recall_warning = true;
                flags.fpsp_disconnect = true;
            }
            log_cag_estimate(&sample.id, primary_ccg, &outcome);
            let pair = (outcome.detected[0], outcome.detected[1]);
            cag_runs.push((primary_ccg, band, outcome));
            pair
        }
        Zygosity::Heterozygous => {
            let mut pair = [0usize; 2];
            for (slot, &ccg) in [primary_ccg, secondary_ccg].iter().enumerate() {
                let band = forward.ccg_band(ccg)?;
                let (outcome, recalled) = two_pass_with_recall(band, 1, params.max_peak_recalls)?;
                if recalled {
                    flags.cag_recall_warning = true;
                    flags.fpsp_disconnect = true;
                }
                log_cag_estimate(&sample.id, ccg, &outcome);
                pair[slot] = outcome.primary;
                cag_runs.push((ccg, band, outcome));
            }
            (pair[0], pair[1])
        }
    };

    let mut genotype = Genotype::new();
    genotype.push(Allele::new(primary_cag, primary_ccg));
    genotype.push(Allele::new(secondary_cag, secondary_ccg));

    let (primary_mosaicism, primary_padded, primary_spread) =
        investigate(&genotype[0], &forward, &sample.id)?;
    let (secondary_mosaicism, secondary_padded, secondary_spread) =
        investigate(&genotype[1], &forward, &sample.id)?;
    if primary_spread || secondary_spread {
        flags.cag_consensus_spread_warning = true;
    }

    if let Some(plot_dir) = &params.plot_dir {
        render_plots(
            plot_dir,
            &sample.id,
            &reverse_collapsed,
            &ccg_outcome,
            &cag_runs,
        );
    }

    Ok(SampleResult {
        genotype,
        zygosity,
        flags,
        mosaicism: [primary_mosaicism, secondary_mosaicism],
        padded: [primary_padded, secondary_padded],
    })
}

/// One full two-pass invocation; a consistency-gate failure triggers a
/// single sample-level rerun with the threshold bias applied. The biased
/// result is accepted either way; the caller records the recall.
fn two_pass_with_recall(
    counts: &[u32],
    peak_target: usize,
    max_recalls: usize,
) -> Result<(TwoPassOutcome, bool)> {
    let outcome = run_two_pass(counts, peak_target, false, max_recalls)?;
    if outcome.consistent {
        return Ok((outcome, false));
    }
    let retried = run_two_pass(counts, peak_target, true, max_recalls)?;
    Ok((retried, true))
}

fn log_cag_estimate(sample_id: &str, ccg: usize, outcome: &TwoPassOutcome) {
    let flags = &outcome.density.flags;
    if flags.expansion_skew || flags.density_ambiguous || flags.peak_ambiguous {
        log::debug!(
            "{}: CAG estimate for CCG {}: skew={} density_ambiguous={} peak_ambiguous={}",
            sample_id,
            ccg,
            flags.expansion_skew,
            flags.density_ambiguous,
            flags.peak_ambiguous
        );
    }
}

/// Diagnostic SVGs are presentational; rendering failures are logged and
/// never fail the sample
fn render_plots(
    plot_dir: &Path,
    sample_id: &str,
    reverse_collapsed: &[u32],
    ccg_outcome: &TwoPassOutcome,
    cag_runs: &[(usize, &[u32], TwoPassOutcome)],
) {
    let dir = plot_dir.join(sample_id);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::warn!("{}: cannot create plot directory: {}", sample_id, e);
        return;
    }

    let results = [
        plots::save_density_plot(
            &dir.join("CCGDensityEstimation.svg"),
            "CCG Density Distribution",
            &ccg_outcome.density.densities,
            &ccg_outcome.density.edges,
        ),
        plots::save_peak_plot(
            &dir.join("CCGPeakDetection.svg"),
            "CCG Peaks",
            "CCG Value",
            reverse_collapsed,
            &ccg_outcome.detected,
        ),
    ];
    for result in results {
        if let Err(e) = result {
            log::warn!("{}: {}", sample_id, e);
        }
    }

    for (ccg, band, outcome) in cag_runs {
        let path = dir.join(format!("CAG{}PeakDetection.svg", ccg));
        if let Err(e) = plots::save_peak_plot(&path, "CAG Peaks", "CAG Value", band, &outcome.detected)
        {
            log::warn!("{}: {}", sample_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srgt::distribution::{CAG_BINS, DIST_LEN};
    use std::io::Write;
    use std::path::PathBuf;

    fn write_distribution(path: &Path, counts: &[u32]) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "label,repeat,count").unwrap();
        for (row, count) in counts.iter().enumerate() {
            writeln!(file, "ref_{},x,{}", row, count).unwrap();
        }
    }

    fn set_band_peak(counts: &mut [u32], ccg: usize, cag: usize, height: u32) {
        let base = (ccg - 1) * CAG_BINS;
        counts[base + cag - 1] = height;
        counts[base + cag - 2] = height / 5;
        counts[base + cag] = height / 5;
    }

    struct ModelFiles {
        _dir: tempfile::TempDir,
        sample: SamplePair,
        model: ZygosityModel,
    }

    fn setup(forward: &[u32], reverse: &[u32], homozygous: bool) -> ModelFiles {
        let dir = tempfile::tempdir().unwrap();
        let model_path = write_model_for(dir.path(), homozygous);
        let forward_path = dir.path().join("fw.csv");
        let reverse_path = dir.path().join("rv.csv");
        write_distribution(&forward_path, forward);
        write_distribution(&reverse_path, reverse);
        ModelFiles {
            sample: SamplePair {
                id: "HD001".to_string(),
                forward_path,
                reverse_path,
            },
            model: ZygosityModel::from_path(&model_path).unwrap(),
            _dir: dir,
        }
    }

    /// A constant-decision model: intercept sign fixes the label for every
    /// input, which lets tests choose the zygosity path directly
    fn write_model_for(dir: &Path, homozygous: bool) -> PathBuf {
        let intercept = if homozygous { 1.0 } else { -1.0 };
        let json = format!(
            r#"{{"classes": ["HETERO", "HOMO"], "num_features": 20, "machines": [
                {{"first": 0, "second": 1,
                  "weights": [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
                  "intercept": {}}}
            ]}}"#,
            intercept
        );
        let path = dir.join("model.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn params() -> Params {
        Params {
            max_peak_recalls: 8,
            plot_dir: None,
        }
    }

    #[test]
    fn test_homozygous_sample_end_to_end() {
        // Reverse: all CCG reads in bin 7; forward: two CAG peaks in band 7
        let mut reverse = vec![0u32; DIST_LEN];
        for cag in 0..CAG_BINS {
            reverse[6 * CAG_BINS + cag] = if cag == 99 { 500 } else { 1 };
        }
        let mut forward = vec![0u32; DIST_LEN];
        set_band_peak(&mut forward, 7, 42, 400);
        set_band_peak(&mut forward, 7, 90, 350);

        let files = setup(&forward, &reverse, true);
        let result = analyze_sample(&files.sample, &files.model, &params()).unwrap();

        assert_eq!(result.zygosity, Zygosity::Homozygous);
        // Both alleles share the single CCG band; CAG order follows
        // detected-peak position
        assert_eq!(result.genotype[0], Allele::new(42, 7));
        assert_eq!(result.genotype[1], Allele::new(90, 7));
        assert_eq!(result.mosaicism[0].n, Some(400));
        assert_eq!(result.mosaicism[1].n, Some(350));
    }

    #[test]
    fn test_heterozygous_sample_end_to_end() {
        // Reverse: CCG reads split between bins 7 and 10, bin 10 dominant
        let mut reverse = vec![0u32; DIST_LEN];
        reverse[6 * CAG_BINS] = 400;
        reverse[9 * CAG_BINS] = 500;
        let mut forward = vec![0u32; DIST_LEN];
        set_band_peak(&mut forward, 7, 42, 400);
        set_band_peak(&mut forward, 10, 90, 350);

        let files = setup(&forward, &reverse, false);
        let result = analyze_sample(&files.sample, &files.model, &params()).unwrap();

        assert_eq!(result.zygosity, Zygosity::Heterozygous);
        // Primary slot is the dominant CCG 10; its CAG comes from band 10
        assert_eq!(result.genotype[0], Allele::new(90, 10));
        assert_eq!(result.genotype[1], Allele::new(42, 7));
        assert!(!result.flags.ccg_zyg_disconnect);
    }

    #[test]
    fn test_missing_distribution_fails_sample() {
        let mut reverse = vec![0u32; DIST_LEN];
        reverse[6 * CAG_BINS] = 400;
        let files = setup(&reverse.clone(), &reverse, true);
        let broken = SamplePair {
            id: "HD404".to_string(),
            forward_path: PathBuf::from("/no/such/fw.csv"),
            reverse_path: files.sample.reverse_path.clone(),
        };
        assert!(analyze_sample(&broken, &files.model, &params()).is_err());
    }

    #[test]
    fn test_plots_are_rendered_when_requested() {
        let mut reverse = vec![0u32; DIST_LEN];
        reverse[6 * CAG_BINS] = 400;
        reverse[9 * CAG_BINS] = 500;
        let mut forward = vec![0u32; DIST_LEN];
        set_band_peak(&mut forward, 7, 42, 400);
        set_band_peak(&mut forward, 10, 90, 350);

        let files = setup(&forward, &reverse, false);
        let plot_dir = tempfile::tempdir().unwrap();
        let params = Params {
            max_peak_recalls: 8,
            plot_dir: Some(plot_dir.path().to_path_buf()),
        };
        analyze_sample(&files.sample, &files.model, &params).unwrap();

        let sample_dir = plot_dir.path().join("HD001");
        assert!(sample_dir.join("CCGDensityEstimation.svg").exists());
        assert!(sample_dir.join("CCGPeakDetection.svg").exists());
        assert!(sample_dir.join("CAG10PeakDetection.svg").exists());
        assert!(sample_dir.join("CAG7PeakDetection.svg").exists());
    }
}
