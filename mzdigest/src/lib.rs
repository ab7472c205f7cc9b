#![doc = include_str!("../README.md")]

#[macro_use]
mod helper_functions;

/// Analyses that report on a full protein database at once.
pub mod analysis;
/// Contains all things related to the underlying chemistry: elements, formulas and mass ranges.
pub mod chemistry;
/// Find the peptides that uniquely identify a single protein in a set of protein databases.
pub mod proteotypic;
/// Contains all things related to sequences, amongst others proteases and digestion.
pub mod sequence;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::chemistry::{
        ELEMENTS, ElementTable, IsotopePeak, MolecularFormula, RESIDUES, ResidueTable, mass_range,
    };
    pub use crate::analysis::{MassAnalysis, analyse};
    pub use crate::proteotypic::{ProteotypicReport, proteotypic_peptides};
    pub use crate::sequence::{Digestor, Protease, Protein};
}

/// The error type used throughout this crate.
pub type Error = context_error::BoxedError<'static, context_error::BasicKind>;
