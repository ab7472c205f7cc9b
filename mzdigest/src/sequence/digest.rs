use std::{ops::RangeBounds, sync::Arc};

use context_error::*;

use crate::{Error, sequence::Protease};

/// A filter on peptides, only peptides for which this returns true are kept
pub type PeptideFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A reusable digestion setup: a protease, the range of missed cleavages, and an optional filter.
///
/// ```rust
/// # use mzdigest::prelude::*;
/// let digestor = Digestor::new(Protease::TrypsinSimple)
///     .missed_cleavages(0, 1)
///     .unwrap()
///     .length_filter(4..=20);
/// assert_eq!(
///     digestor.digest("AAKGGGRPPPKAA"),
///     ["GGGRPPPK", "AAKGGGRPPPK", "GGGRPPPKAA"]
/// );
/// ```
#[derive(Clone, Default)]
pub struct Digestor {
    min_missed_cleavages: usize,
    max_missed_cleavages: usize,
    filter: Option<PeptideFilter>,
    protease: Protease,
}

impl Digestor {
    /// Create a digestor without missed cleavages and without filter
    pub fn new(protease: Protease) -> Self {
        Self {
            protease,
            ..Self::default()
        }
    }

    /// Set the range of allowed missed cleavages (inclusive).
    /// # Errors
    /// If the minimum is bigger than the maximum.
    pub fn missed_cleavages(self, min: usize, max: usize) -> Result<Self, Error> {
        if min > max {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid missed cleavages",
                format!(
                    "The minimal number of missed cleavages ({min}) cannot be bigger than the maximal number ({max})"
                ),
                Context::none(),
            ));
        }
        Ok(Self {
            min_missed_cleavages: min,
            max_missed_cleavages: max,
            ..self
        })
    }

    /// Allow zero up to and including `max` missed cleavages
    #[must_use]
    pub fn up_to_missed_cleavages(self, max: usize) -> Self {
        Self {
            min_missed_cleavages: 0,
            max_missed_cleavages: max,
            ..self
        }
    }

    /// Only keep the peptides for which this filter returns true
    #[must_use]
    pub fn filter(self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            filter: Some(Arc::new(filter)),
            ..self
        }
    }

    /// Only keep the peptides with a length (in residues) in the given range
    #[must_use]
    pub fn length_filter(self, range: impl RangeBounds<usize> + Send + Sync + 'static) -> Self {
        self.filter(move |peptide| range.contains(&peptide.len()))
    }

    /// The protease used
    pub const fn protease(&self) -> &Protease {
        &self.protease
    }

    /// The (min, max) missed cleavages
    pub const fn missed_cleavages_range(&self) -> (usize, usize) {
        (self.min_missed_cleavages, self.max_missed_cleavages)
    }

    /// The byte offsets of all fragment boundaries, including 0 and the length of the sequence.
    /// The last position in the sequence is never tested, and positions that are not on a
    /// character boundary are never used.
    fn boundaries(&self, sequence: &str) -> Vec<usize> {
        if sequence.is_empty() {
            return Vec::new();
        }
        let bytes = sequence.as_bytes();
        let mut boundaries = Vec::with_capacity(bytes.len() / 8 + 2);
        boundaries.push(0);
        boundaries.extend(
            (1..bytes.len().saturating_sub(1)).filter(|position| {
                sequence.is_char_boundary(*position) && self.protease.cuts(bytes, *position)
            }),
        );
        boundaries.push(bytes.len());
        boundaries
    }

    /// Cut the sequence at every cleavage site, the fragments together are the full sequence.
    /// An empty sequence gives no fragments.
    pub fn cleave<'a>(&self, sequence: &'a str) -> Vec<&'a str> {
        self.boundaries(sequence)
            .windows(2)
            .map(|w| &sequence[w[0]..w[1]])
            .collect()
    }

    /// Digest the sequence into all peptides with a number of missed cleavages in the
    /// configured range that pass the filter. Peptides are ordered by number of skipped
    /// fragments at the start, then by number of missed cleavages, then by position. A peptide
    /// can be reported more than once if it is found with multiple of these combinations.
    pub fn digest<'a>(&self, sequence: &'a str) -> Vec<&'a str> {
        let boundaries = self.boundaries(sequence);
        let fragments = boundaries.len().saturating_sub(1);
        let mut peptides = Vec::with_capacity(fragments * (self.max_missed_cleavages + 1));
        for skip in 0..=self.max_missed_cleavages {
            for glue in self.min_missed_cleavages.max(skip)..=self.max_missed_cleavages {
                let mut index = skip;
                while index + glue < fragments {
                    let peptide = &sequence[boundaries[index]..boundaries[index + glue + 1]];
                    if self.filter.as_ref().is_none_or(|filter| filter(peptide)) {
                        peptides.push(peptide);
                    }
                    index += glue + 1;
                }
            }
        }
        peptides
    }
}

impl std::fmt::Debug for Digestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digestor")
            .field("min_missed_cleavages", &self.min_missed_cleavages)
            .field("max_missed_cleavages", &self.max_missed_cleavages)
            .field("filter", &self.filter.is_some())
            .field("protease", &self.protease)
            .finish()
    }
}
