pub mod classify;
pub mod distribution;
pub mod genotype;
pub mod plots;
pub mod sample;
pub mod workflows;
pub mod writers;
