use std::sync::LazyLock;

use context_error::*;

use crate::{
    Error,
    chemistry::{ELEMENTS, ElementTable, MolecularFormula},
};

/// The residue formulas (amino acid minus water) of all amino acids with a known composition
const RESIDUE_FORMULAS: &[(u8, &str)] = &[
    (b'A', "C3H5NO"),
    (b'C', "C3H5NOS"),
    (b'D', "C4H5NO3"),
    (b'E', "C5H7NO3"),
    (b'F', "C9H9NO"),
    (b'G', "C2H3NO"),
    (b'H', "C6H7N3O"),
    (b'I', "C6H11NO"),
    (b'K', "C6H12N2O"),
    (b'L', "C6H11NO"),
    (b'M', "C5H9NOS"),
    (b'N', "C4H6N2O2"),
    (b'O', "C5H7NO2"),
    (b'P', "C5H7NO"),
    (b'Q', "C5H8N2O2"),
    (b'R', "C6H12N4O"),
    (b'S', "C3H5NO2"),
    (b'T', "C4H7NO2"),
    (b'U', "C5H5NO2"),
    (b'V', "C5H9NO"),
    (b'W', "C11H10N2O"),
    (b'Y', "C9H9NO2"),
];

/// An immutable lookup table from one letter amino acid codes to residue formulas, with element
/// indices referring to the [`ElementTable`] it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct ResidueTable {
    residues: [Option<MolecularFormula>; 26],
    water: MolecularFormula,
}

/// The residue table built from the built-in [`ELEMENTS`]
/// # Panics
/// If the built-in element table misses any of the elements C, H, N, O, S, which is checked by the tests.
pub static RESIDUES: LazyLock<ResidueTable> = LazyLock::new(|| {
    ResidueTable::new(&ELEMENTS).expect("The built-in element table misses amino acid elements")
});

impl ResidueTable {
    /// Build the residue table for the given element table.
    /// # Errors
    /// If any of the elements needed for amino acids is missing from the table.
    pub fn new(elements: &ElementTable) -> Result<Self, Error> {
        let mut residues: [Option<MolecularFormula>; 26] = Default::default();
        for (code, formula) in RESIDUE_FORMULAS {
            residues[usize::from(code - b'A')] = Some(MolecularFormula::parse(formula, elements)?);
        }
        Ok(Self {
            residues,
            water: MolecularFormula::parse("H2O", elements)?,
        })
    }

    /// The formula of water
    pub const fn water(&self) -> &MolecularFormula {
        &self.water
    }

    /// The residue formula (amino acid minus water) for a one letter amino acid code.
    /// # Errors
    /// If the code is not an uppercase letter with a known formula, this includes the ambiguous codes B, J, X, and Z.
    pub fn residue(&self, code: u8) -> Result<&MolecularFormula, Error> {
        code.is_ascii_uppercase()
            .then(|| self.residues[usize::from(code - b'A')].as_ref())
            .flatten()
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Unknown amino acid",
                    format!(
                        "The amino acid code '{}' does not have a known formula",
                        code.escape_ascii()
                    ),
                    Context::none(),
                )
            })
    }

    /// The formula of a full peptide or protein: all residues plus one water.
    /// # Errors
    /// If any residue does not have a known formula.
    pub fn peptide(&self, sequence: &str) -> Result<MolecularFormula, Error> {
        let mut formula = MolecularFormula::default();
        for (index, code) in sequence.bytes().enumerate() {
            formula += self.residue(code).map_err(|err| {
                err.replace_context(Context::line(None, sequence, index, 1).to_owned())
            })?;
        }
        Ok(formula + &self.water)
    }
}
