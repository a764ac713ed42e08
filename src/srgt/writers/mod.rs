mod write_genotypes;
mod write_mosaicism;

pub use write_genotypes::GenotypeWriter;
pub use write_mosaicism::MosaicismWriter;
