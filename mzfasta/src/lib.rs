#![doc = include_str!("../README.md")]

/// The built-in list of downloadable reference proteomes and resolving names to local files.
pub mod database;
mod fasta;
/// Keep local copies of the known databases up to date.
#[cfg(feature = "internet")]
pub mod update;

pub use fasta::FastaData;
