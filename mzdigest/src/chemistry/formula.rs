use std::{
    fmt::Write,
    ops::{Add, AddAssign},
    sync::LazyLock,
};

use context_error::*;
use itertools::{EitherOrBoth, Itertools};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, chemistry::ElementTable, helper_functions::explain_number_error};

/// A molecular formula, a list of element indices (into an [`ElementTable`]) with the number of
/// atoms of that element. The list is always sorted on element index and contains every element
/// at most once, this allows linear time addition.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MolecularFormula {
    elements: Vec<(usize, i32)>,
}

static FORMULA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]?)([0-9]*)").unwrap());

impl MolecularFormula {
    /// Create a new formula from (element index, count) pairs in any order. Repeated elements
    /// are summed and elements with a total count of zero are removed.
    /// # Panics
    /// If the summed count of an element does not fit in an `i32`.
    pub fn new(elements: impl IntoIterator<Item = (usize, i32)>) -> Self {
        Self::checked_new(elements)
            .unwrap_or_else(|| panic!("Element count overflow while building molecular formula"))
    }

    /// Create a new formula like [`Self::new`], returning `None` if the summed count of an
    /// element does not fit in an `i32`.
    pub fn checked_new(elements: impl IntoIterator<Item = (usize, i32)>) -> Option<Self> {
        let mut elements = elements.into_iter().collect_vec();
        elements.sort_by_key(|(index, _)| *index);
        let mut result: Vec<(usize, i32)> = Vec::with_capacity(elements.len());
        for (index, count) in elements {
            match result.last_mut() {
                Some(last) if last.0 == index => last.1 = last.1.checked_add(count)?,
                _ => result.push((index, count)),
            }
        }
        result.retain(|(_, count)| *count != 0);
        Some(Self { elements: result })
    }

    /// Add two formulas, returning `None` if the count of an element does not fit in an `i32`.
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        let mut elements = Vec::with_capacity(self.elements.len().max(rhs.elements.len()));
        for pair in self
            .elements
            .iter()
            .merge_join_by(rhs.elements.iter(), |a, b| a.0.cmp(&b.0))
        {
            let (index, count) = match pair {
                EitherOrBoth::Both(a, b) => (a.0, a.1.checked_add(b.1)?),
                EitherOrBoth::Left(a) | EitherOrBoth::Right(a) => *a,
            };
            if count != 0 {
                elements.push((index, count));
            }
        }
        Some(Self { elements })
    }

    /// Parse a simple chemical formula like `H2SO4` or `NaCl`. Every element is a symbol
    /// (one capital optionally followed by a lowercase letter) followed by an optional count.
    /// Elements are allowed to occur multiple times, `H2C3OH` is `H3C3O`.
    /// # Errors
    /// If the formula contains an element not present in the table, a count that is too big, or
    /// any text that is not an element with count.
    pub fn parse(text: &str, table: &ElementTable) -> Result<Self, Error> {
        let mut elements = Vec::new();
        let mut last_end = 0;
        for captures in FORMULA_REGEX.captures_iter(text) {
            let (Some(full), Some(symbol), Some(count)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            if full.start() != last_end {
                return Err(unparsable(text, last_end, full.start() - last_end));
            }
            last_end = full.end();
            let index = table.index(symbol.as_str()).map_err(|_| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid molecular formula",
                    format!("The element '{}' is not recognised", symbol.as_str()),
                    Context::line(None, text, symbol.start(), symbol.len()).to_owned(),
                )
            })?;
            let count = if count.is_empty() {
                1
            } else {
                count.as_str().parse::<i32>().map_err(|err| {
                    BoxedError::new(
                        BasicKind::Error,
                        "Invalid molecular formula",
                        format!("The element count {}", explain_number_error(&err)),
                        Context::line(None, text, count.start(), count.len()).to_owned(),
                    )
                })?
            };
            elements.push((index, count));
        }
        if last_end != text.len() {
            return Err(unparsable(text, last_end, text.len() - last_end));
        }
        Self::checked_new(elements).ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid molecular formula",
                "The total count of an element is too big",
                Context::show(text.to_string()),
            )
        })
    }

    /// The (element index, count) pairs sorted on element index
    pub fn elements(&self) -> &[(usize, i32)] {
        &self.elements
    }

    /// Check if this formula contains no atoms
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The number of atoms of the given element
    pub fn count(&self, index: usize) -> i32 {
        self.elements
            .binary_search_by_key(&index, |(i, _)| *i)
            .map_or(0, |i| self.elements[i].1)
    }

    /// Write this formula as text in element index order, `H2O` for water. Elements with a count
    /// of zero or below are left out and a count of one is not written.
    /// # Errors
    /// If an element index is outside of the table.
    pub fn to_formula_string(&self, table: &ElementTable) -> Result<String, Error> {
        let mut text = String::new();
        for (index, count) in &self.elements {
            if *count <= 0 {
                continue;
            }
            text.push_str(table.symbol(*index)?);
            if *count > 1 {
                write!(&mut text, "{count}").unwrap();
            }
        }
        Ok(text)
    }
}

fn unparsable(text: &str, start: usize, length: usize) -> Error {
    BoxedError::new(
        BasicKind::Error,
        "Invalid molecular formula",
        "This text is not an element symbol with an optional count",
        Context::line(None, text, start, length).to_owned(),
    )
}

impl Add<&MolecularFormula> for &MolecularFormula {
    type Output = MolecularFormula;

    /// Merge the two sorted element lists in a single pass, see [`MolecularFormula::checked_add`]
    /// for a version that does not panic.
    /// # Panics
    /// If the count of an element does not fit in an `i32`.
    fn add(self, rhs: &MolecularFormula) -> Self::Output {
        self.checked_add(rhs)
            .unwrap_or_else(|| panic!("Element count overflow while adding molecular formulas"))
    }
}

impl_binop_ref_cases!(impl Add, add for MolecularFormula, MolecularFormula, MolecularFormula);

impl AddAssign<&Self> for MolecularFormula {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl AddAssign for MolecularFormula {
    fn add_assign(&mut self, rhs: Self) {
        *self += &rhs;
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::chemistry::ELEMENTS;

    fn formula(text: &str) -> MolecularFormula {
        MolecularFormula::parse(text, &ELEMENTS).unwrap()
    }

    #[test]
    fn parse() {
        assert_eq!(formula("H2SO4").elements(), &[(0, 2), (7, 4), (15, 1)]);
        assert_eq!(formula("NaCl").elements(), &[(10, 1), (16, 1)]);
        assert_eq!(formula("H2C3OH").elements(), &[(0, 3), (5, 3), (7, 1)]);
        assert!(formula("").is_empty());
    }

    #[test]
    fn parse_invalid() {
        assert!(MolecularFormula::parse("NaCw", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("Xx2", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("Na3333333333333333333333333333", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("H2 O", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("h2o", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("H2O-", &ELEMENTS).is_err());
    }

    #[test]
    fn count_overflow() {
        assert!(MolecularFormula::parse("C2147483647C1", &ELEMENTS).is_err());
        assert!(MolecularFormula::parse("C2147483647H2C", &ELEMENTS).is_err());
        assert_eq!(formula("C2147483646C").elements(), &[(5, i32::MAX)]);
        assert!(MolecularFormula::checked_new([(5, i32::MAX), (5, 1)]).is_none());
        assert_eq!(
            MolecularFormula::checked_new([(5, i32::MAX), (5, -1)]),
            Some(MolecularFormula::new([(5, i32::MAX - 1)]))
        );
        assert!(formula("C2147483647").checked_add(&formula("C")).is_none());
        assert_eq!(
            formula("C2147483646").checked_add(&formula("CH")),
            Some(formula("C2147483647H"))
        );
    }

    #[test]
    #[should_panic = "overflow"]
    fn add_overflow_panics() {
        let _sum = formula("C2147483647") + formula("C");
    }

    #[test]
    fn to_string() {
        assert_eq!(formula("H2O").to_formula_string(&ELEMENTS).unwrap(), "H2O");
        assert_eq!(formula("SO4H2").to_formula_string(&ELEMENTS).unwrap(), "H2O4S");
        assert_eq!(
            MolecularFormula::new([(0, 2), (5, -1), (7, 1)])
                .to_formula_string(&ELEMENTS)
                .unwrap(),
            "H2O"
        );
        assert!(
            MolecularFormula::new([(1000, 1)])
                .to_formula_string(&ELEMENTS)
                .is_err()
        );
    }

    #[test]
    fn string_round_trip() {
        for text in ["H2SO4", "C6H12O6", "NaCl", "HCOOH", "C3H5NOSH2O"] {
            let parsed = formula(text);
            let written = parsed.to_formula_string(&ELEMENTS).unwrap();
            assert_eq!(formula(&written), parsed, "{text} -> {written}");
        }
    }

    #[test]
    fn add() {
        assert_eq!(formula("H2O") + formula("CS"), formula("H2COS"));
        assert_eq!(formula("H2O") + formula("O"), formula("H2O2"));
        assert_eq!(formula("CS") + formula("H2O"), formula("H2COS"));
        assert_eq!(formula("HO") + formula("HO"), formula("H2O2"));
        assert_eq!(
            (&formula("H2O") + &formula("CS"))
                .to_formula_string(&ELEMENTS)
                .unwrap(),
            "H2COS"
        );
        assert_eq!(
            MolecularFormula::new([(0, 1), (7, 3)]) + MolecularFormula::new([(0, 1), (7, -1)]),
            formula("H2O2")
        );
        assert_eq!(
            MolecularFormula::new([(0, 1)]) + MolecularFormula::new([(0, -1)]),
            MolecularFormula::default()
        );
    }

    #[test]
    fn add_properties() {
        let formulas = [
            formula("H2SO4"),
            formula("NaCl"),
            formula("C6H12O6"),
            MolecularFormula::new([(16, 2), (0, 1), (85, 1), (5, 3)]),
            MolecularFormula::new([(33, 1), (7, 2), (0, 4)]),
        ];
        let zero = MolecularFormula::default();
        for a in &formulas {
            assert_eq!(a + &zero, *a);
            assert_eq!(&zero + a, *a);
            for b in &formulas {
                assert_eq!(a + b, b + a);
                assert!((a + b).elements().windows(2).all(|w| w[0].0 < w[1].0));
                for c in &formulas {
                    assert_eq!((a + b) + c, a + (b + c));
                }
            }
        }
    }

    #[test]
    fn add_assign() {
        let mut water = formula("H2");
        water += formula("O");
        assert_eq!(water, formula("H2O"));
        water += &MolecularFormula::default();
        assert_eq!(water, formula("H2O"));
    }
}
