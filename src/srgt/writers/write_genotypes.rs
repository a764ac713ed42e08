use crate::srgt::genotype::Mosaicism;
use crate::srgt::workflows::SampleResult;
use crate::utils::Result;
use itertools::Itertools;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

const HEADER: &[&str] = &[
    "sample",
    "primary_cag",
    "primary_ccg",
    "secondary_cag",
    "secondary_ccg",
    "ccg_zyg_disconnect",
    "ccg_expansion_skew",
    "ccg_peak_ambiguous",
    "ccg_density_ambiguous",
    "ccg_recall_warning",
    "ccg_peak_oob",
    "cag_recall_warning",
    "cag_consensus_spread_warning",
    "fpsp_disconnect",
    "primary_n_minus",
    "primary_n",
    "primary_n_plus",
    "primary_nminus_over_n",
    "primary_nplus_over_n",
    "secondary_n_minus",
    "secondary_n",
    "secondary_n_plus",
    "secondary_nminus_over_n",
    "secondary_nplus_over_n",
];

/// One row per sample: the called allele pair, all warning flags, and both
/// alleles' mosaicism metrics
pub struct GenotypeWriter {
    out: BufWriter<File>,
}

impl GenotypeWriter {
    pub fn new(path: &str) -> Result<Self> {
        let file = File::create(path).map_err(|e| format!("{}: {}", path, e))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{}", HEADER.iter().join("\t")).map_err(|e| e.to_string())?;
        Ok(GenotypeWriter { out })
    }

    pub fn write(&mut self, sample_id: &str, result: &SampleResult) -> Result<()> {
        let flags = &result.flags;
        let mut fields: Vec<String> = vec![
            sample_id.to_string(),
            result.genotype[0].cag.to_string(),
            result.genotype[0].ccg.to_string(),
            result.genotype[1].cag.to_string(),
            result.genotype[1].ccg.to_string(),
            flags.ccg_zyg_disconnect.to_string(),
            flags.ccg_expansion_skew.to_string(),
            flags.ccg_peak_ambiguous.to_string(),
            flags.ccg_density_ambiguous.to_string(),
            flags.ccg_recall_warning.to_string(),
            flags.ccg_peak_oob.to_string(),
            flags.cag_recall_warning.to_string(),
            flags.cag_consensus_spread_warning.to_string(),
            flags.fpsp_disconnect.to_string(),
        ];
        for mosaicism in &result.mosaicism {
            fields.extend(mosaicism_fields(mosaicism));
        }
        writeln!(self.out, "{}", fields.iter().join("\t")).map_err(|e| e.to_string())
    }
}

fn mosaicism_fields(mosaicism: &Mosaicism) -> Vec<String> {
    let count = |value: Option<u32>| value.map_or("-".to_string(), |n| n.to_string());
    vec![
        count(mosaicism.n_minus),
        count(mosaicism.n),
        count(mosaicism.n_plus),
        format!("{}", mosaicism.nminus_over_n),
        format!("{}", mosaicism.nplus_over_n),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srgt::classify::Zygosity;
    use crate::srgt::distribution::{RepeatDistribution, CAG_BINS, DIST_LEN};
    use crate::srgt::genotype::{investigate, Allele, Genotype, GenotypeFlags};

    fn sample_result() -> SampleResult {
        let mut counts = vec![0u32; DIST_LEN];
        let base = 2 * CAG_BINS;
        counts[base + 40] = 10;
        counts[base + 41] = 20;
        counts[base + 42] = 5;
        let forward = RepeatDistribution::new(counts).unwrap();
        let allele = Allele::new(42, 3);
        let (mosaicism, padded, _) = investigate(&allele, &forward, "s1").unwrap();

        let mut genotype = Genotype::new();
        genotype.push(allele);
        genotype.push(allele);
        SampleResult {
            genotype,
            zygosity: Zygosity::Homozygous,
            flags: GenotypeFlags {
                ccg_expansion_skew: true,
                ..Default::default()
            },
            mosaicism: [mosaicism, mosaicism],
            padded: [padded.clone(), padded],
        }
    }

    #[test]
    fn test_genotype_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.genotypes.tsv");
        let mut writer = GenotypeWriter::new(path.to_str().unwrap()).unwrap();
        writer.write("HD001", &sample_result()).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').count(), HEADER.len());

        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[0], "HD001");
        assert_eq!(fields[1], "42");
        assert_eq!(fields[2], "3");
        assert_eq!(fields[6], "true"); // ccg_expansion_skew
        assert_eq!(fields[14], "10"); // primary n_minus
        assert_eq!(fields[17], "0.5");
        assert_eq!(fields[18], "0.25");
    }
}
