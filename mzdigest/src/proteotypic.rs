use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    io::Write,
};

use itertools::Itertools;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::sequence::{Digestor, Protease, Protein};

/// The proteotypic peptides for a set of proteins.
#[derive(Clone, Debug, PartialEq)]
pub struct ProteotypicReport<'a, P> {
    /// All proteins with at least one proteotypic peptide, in input order. The peptides are
    /// unique, sorted on length and then alphabetically, and have the number of times they occur
    /// in the protein.
    pub proteins: Vec<(&'a P, Vec<(String, usize)>)>,
    /// All proteins without any proteotypic peptide, in input order
    pub without_proteotypic: Vec<&'a P>,
}

/// Check that a peptide does not contain any of the ambiguous amino acids B, J, X, or Z.
pub fn is_valid_peptide(peptide: &str) -> bool {
    !peptide
        .bytes()
        .any(|aa| matches!(aa, b'B' | b'J' | b'X' | b'Z'))
}

/// Map isoleucine to leucine, which have the same mass, so that a peptide is unique in the
/// sense of mass spectrometry.
pub fn canonical_peptide(peptide: &str) -> Cow<'_, str> {
    if peptide.contains('I') {
        Cow::Owned(peptide.replace('I', "L"))
    } else {
        Cow::Borrowed(peptide)
    }
}

/// Find all proteotypic peptides: the peptides that after digestion (without missed cleavages)
/// are found in exactly one protein, when I and L are treated as identical. Peptides with
/// ambiguous amino acids are ignored. A peptide repeated in one protein still counts as
/// proteotypic for that protein.
///
/// Pass one counts for every canonical peptide in how many proteins it occurs, pass two keeps
/// the peptides of each protein that occur in only one protein. With the `rayon` feature both
/// passes run in parallel, the result is identical to a sequential run.
pub fn proteotypic_peptides<'a, P: Protein + Sync + 'a>(
    proteins: impl IntoIterator<Item = &'a P>,
    protease: &Protease,
) -> ProteotypicReport<'a, P> {
    let proteins = proteins.into_iter().collect_vec();
    let digestor = Digestor::new(protease.clone());

    #[cfg(feature = "rayon")]
    let counts = proteins
        .par_iter()
        .fold(HashMap::new, |counts, protein| {
            count_protein(counts, &digestor, *protein)
        })
        .reduce(HashMap::new, merge_counts);
    #[cfg(not(feature = "rayon"))]
    let counts = proteins.iter().fold(HashMap::new(), |counts, protein| {
        count_protein(counts, &digestor, *protein)
    });
    log::debug!(
        "Found {} distinct peptides in {} proteins",
        counts.len(),
        proteins.len()
    );

    #[cfg(feature = "rayon")]
    let classified: Vec<_> = proteins
        .par_iter()
        .map(|protein| (*protein, unique_peptides(&digestor, *protein, &counts)))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let classified: Vec<_> = proteins
        .iter()
        .map(|protein| (*protein, unique_peptides(&digestor, *protein, &counts)))
        .collect();

    let (proteins, without_proteotypic): (Vec<_>, Vec<_>) = classified
        .into_iter()
        .partition(|(_, peptides)| !peptides.is_empty());
    ProteotypicReport {
        proteins,
        without_proteotypic: without_proteotypic
            .into_iter()
            .map(|(protein, _)| protein)
            .collect(),
    }
}

/// Add one to the count of every distinct canonical peptide in this protein
fn count_protein(
    mut counts: HashMap<String, usize>,
    digestor: &Digestor,
    protein: &impl Protein,
) -> HashMap<String, usize> {
    let distinct: HashSet<Cow<'_, str>> = digestor
        .digest(protein.sequence())
        .into_iter()
        .filter(|peptide| is_valid_peptide(peptide))
        .map(canonical_peptide)
        .collect();
    for peptide in distinct {
        *counts.entry(peptide.into_owned()).or_default() += 1;
    }
    counts
}

#[cfg(feature = "rayon")]
fn merge_counts(
    mut into: HashMap<String, usize>,
    from: HashMap<String, usize>,
) -> HashMap<String, usize> {
    if into.len() < from.len() {
        return merge_counts(from, into);
    }
    for (peptide, count) in from {
        *into.entry(peptide).or_default() += count;
    }
    into
}

/// The peptides of this protein that are found in no other protein, with their multiplicity
fn unique_peptides(
    digestor: &Digestor,
    protein: &impl Protein,
    counts: &HashMap<String, usize>,
) -> Vec<(String, usize)> {
    let mut local: HashMap<&str, usize> = HashMap::new();
    for peptide in digestor.digest(protein.sequence()) {
        if is_valid_peptide(peptide)
            && counts.get(canonical_peptide(peptide).as_ref()) == Some(&1)
        {
            *local.entry(peptide).or_default() += 1;
        }
    }
    local
        .into_iter()
        .map(|(peptide, count)| (peptide.to_string(), count))
        .sorted_unstable_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .collect()
}

impl<P: Protein> ProteotypicReport<'_, P> {
    /// Write the report. For each protein with proteotypic peptides the identifier and
    /// description, followed by one line per peptide (with the multiplicity in brackets if the
    /// peptide occurs more than once), with an empty line between proteins. Followed by a list of
    /// all proteins without proteotypic peptides.
    /// # Errors
    /// If the writer errors.
    pub fn write(&self, mut writer: impl Write) -> std::io::Result<()> {
        let mut separator = "";
        for (protein, peptides) in &self.proteins {
            writeln!(
                writer,
                "{separator}{} {}",
                protein.identifier(),
                protein.description()
            )?;
            separator = "\n";
            for (peptide, count) in peptides {
                if *count > 1 {
                    writeln!(writer, "{peptide} ({count})")?;
                } else {
                    writeln!(writer, "{peptide}")?;
                }
            }
        }
        if !self.without_proteotypic.is_empty() {
            writeln!(writer, "\nProteins without proteotypic peptides")?;
            for protein in &self.without_proteotypic {
                writeln!(writer, "{} {}", protein.identifier(), protein.description())?;
            }
        }
        Ok(())
    }
}
