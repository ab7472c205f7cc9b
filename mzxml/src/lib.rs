#![doc = include_str!("../README.md")]

mod file;
mod scan;

pub use file::MzXml;
pub use scan::{Compression, EncodedPeaks, Peak, Precision, Precursor, Scan};

/// The error type used throughout this crate.
pub type Error = context_error::BoxedError<'static, context_error::BasicKind>;
