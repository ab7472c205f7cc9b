use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    chemistry::{ElementTable, MolecularFormula},
};

/// The mass of one isotope combination of a molecule together with its relative abundance
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct IsotopePeak {
    /// The mass in Dalton
    pub mass: f64,
    /// The relative abundance of this isotope combination as a fraction (0..=1)
    pub abundance: f64,
}

impl Default for IsotopePeak {
    fn default() -> Self {
        Self {
            mass: 0.0,
            abundance: 1.0,
        }
    }
}

/// Get the lightest and heaviest isotope combination of a molecule. The lightest uses the
/// lowest mass isotope for every atom, the heaviest the highest mass isotope. The abundance of
/// each is the product over all atoms of the abundance of the chosen isotope.
///
/// This only gives the extremes of the isotope distribution, not the full distribution nor the
/// most abundant peak.
/// # Errors
/// If any element in the formula is outside of the element table, or has no isotopes.
pub fn mass_range(
    formula: &MolecularFormula,
    elements: &ElementTable,
) -> Result<(IsotopePeak, IsotopePeak), Error> {
    let mut lightest = IsotopePeak::default();
    let mut heaviest = IsotopePeak::default();
    for (index, count) in formula.elements() {
        let isotopes = elements.isotopes(*index)?;
        let (Some(first), Some(last)) = (isotopes.first(), isotopes.last()) else {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Element without isotopes",
                format!(
                    "The element '{}' has no isotopes so its mass is not defined",
                    elements.symbol(*index)?
                ),
                Context::none(),
            ));
        };
        lightest.mass += first.mass * f64::from(*count);
        lightest.abundance *= first.abundance.powi(*count);
        heaviest.mass += last.mass * f64::from(*count);
        heaviest.abundance *= last.abundance.powi(*count);
    }
    Ok((lightest, heaviest))
}
