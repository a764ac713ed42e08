pub mod cli;
pub mod commands;
pub mod srgt;
pub mod utils;
