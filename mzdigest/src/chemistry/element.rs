use std::{collections::HashMap, io::Read, sync::LazyLock};

use context_error::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// A single isotope of an element
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Isotope {
    /// The mass in Dalton
    #[serde(rename = "Mass")]
    pub mass: f64,
    /// The natural abundance as a fraction (0..=1)
    #[serde(rename = "Abundance")]
    pub abundance: f64,
}

/// A chemical element with all information needed for mass calculations
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Element {
    /// The symbol, e.g. `Na`
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// The full name, e.g. `sodium`
    #[serde(rename = "Name")]
    pub name: String,
    /// The atomic number
    #[serde(rename = "Number")]
    pub number: u16,
    /// All isotopes, ordered by ascending mass. Empty for elements without stable isotopes.
    #[serde(rename = "Isotope", deserialize_with = "null_as_empty", default)]
    pub isotopes: Vec<Isotope>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Isotope>, D::Error> {
    Ok(Option::<Vec<Isotope>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A table of elements, the index of an element in this table is used to refer to the element in formulas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementTable {
    elements: Vec<Element>,
    symbols: HashMap<String, usize>,
}

/// The built-in element table
/// # Panics
/// If the compiled in element data is not valid JSON, this is checked by the tests.
pub static ELEMENTS: LazyLock<ElementTable> = LazyLock::new(|| {
    ElementTable::from_json(include_str!("../databases/elements.json"))
        .expect("The built-in element table is invalid")
});

impl ElementTable {
    /// Create a table from a list of elements.
    pub fn new(elements: Vec<Element>) -> Self {
        let symbols = elements
            .iter()
            .enumerate()
            .map(|(index, element)| (element.symbol.clone(), index))
            .collect();
        Self { elements, symbols }
    }

    /// Parse an element table from JSON text. The JSON is an array of
    /// `{"Symbol": .., "Name": .., "Number": .., "Isotope": [{"Mass": .., "Abundance": ..}]}` objects.
    /// # Errors
    /// If the text is not valid JSON of this shape.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str::<Vec<Element>>(text)
            .map(Self::new)
            .map_err(|err| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid element table",
                    err.to_string(),
                    Context::none(),
                )
            })
    }

    /// Parse an element table from a reader, see [`Self::from_json`] for the format.
    /// # Errors
    /// If the reader could not be read or does not contain a valid element table.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid element table",
                format!("The element table could not be read: {err}"),
                Context::none(),
            )
        })?;
        Self::from_json(&text)
    }

    /// The number of elements in this table
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if this table is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements in index order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get the index of an element by its symbol (case sensitive).
    /// # Errors
    /// If the symbol is not a known element.
    pub fn index(&self, symbol: &str) -> Result<usize, Error> {
        self.symbols.get(symbol).copied().ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Unknown element",
                format!("The element '{symbol}' is not present in the element table"),
                Context::show(symbol.to_string()),
            )
        })
    }

    /// Get the element at the given index.
    /// # Errors
    /// If the index is outside of this table.
    pub fn get(&self, index: usize) -> Result<&Element, Error> {
        self.elements.get(index).ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Element out of range",
                format!(
                    "The element index {index} is outside of the element table (which has {} elements)",
                    self.elements.len()
                ),
                Context::none(),
            )
        })
    }

    /// The symbol of the element at the given index.
    /// # Errors
    /// If the index is outside of this table.
    pub fn symbol(&self, index: usize) -> Result<&str, Error> {
        self.get(index).map(|e| e.symbol.as_str())
    }

    /// The full name of the element at the given index.
    /// # Errors
    /// If the index is outside of this table.
    pub fn name(&self, index: usize) -> Result<&str, Error> {
        self.get(index).map(|e| e.name.as_str())
    }

    /// The isotopes of the element at the given index, ordered by ascending mass.
    /// # Errors
    /// If the index is outside of this table.
    pub fn isotopes(&self, index: usize) -> Result<&[Isotope], Error> {
        self.get(index).map(|e| e.isotopes.as_slice())
    }
}
