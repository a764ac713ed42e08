use crate::srgt::genotype::PAD_LEN;
use crate::srgt::workflows::SampleResult;
use crate::utils::Result;
use itertools::Itertools;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Two rows per sample (primary and secondary allele), each the 403-slot
/// N-anchored padded distribution; buffer slots are written as `-` so they
/// stay distinguishable from genuine zero counts
pub struct MosaicismWriter {
    out: BufWriter<File>,
}

impl MosaicismWriter {
    pub fn new(path: &str) -> Result<Self> {
        let file = File::create(path).map_err(|e| format!("{}: {}", path, e))?;
        let mut out = BufWriter::new(file);
        let slots = (1..=PAD_LEN).map(|slot| format!("slot_{}", slot)).join("\t");
        writeln!(out, "sample\tallele\t{}", slots).map_err(|e| e.to_string())?;
        Ok(MosaicismWriter { out })
    }

    pub fn write(&mut self, sample_id: &str, result: &SampleResult) -> Result<()> {
        for (allele_name, padded) in ["primary", "secondary"].iter().zip(&result.padded) {
            let slots = padded
                .slots()
                .iter()
                .map(|slot| slot.map_or("-".to_string(), |count| count.to_string()))
                .join("\t");
            writeln!(self.out, "{}\t{}\t{}", sample_id, allele_name, slots)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
