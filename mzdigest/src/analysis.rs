use std::{collections::HashMap, io::Write};

use crate::{
    chemistry::{ELEMENTS, IsotopePeak, RESIDUES, mass_range},
    sequence::{Digestor, Protease, Protein},
};

/// The mass properties of a single protein
#[derive(Clone, Debug, PartialEq)]
pub struct ProteinMass<'a, P> {
    /// The protein
    pub protein: &'a P,
    /// The lightest isotope combination of the full protein
    pub lightest: IsotopePeak,
    /// The heaviest isotope combination of the full protein
    pub heaviest: IsotopePeak,
    /// The number of peptides (0 or 1 missed cleavages, 6 to 30 residues)
    pub peptides: usize,
}

/// The mass analysis of a set of proteins, see [`analyse`]
#[derive(Clone, Debug, PartialEq)]
pub struct MassAnalysis<'a, P> {
    /// All proteins with a known formula, in input order
    pub proteins: Vec<ProteinMass<'a, P>>,
    /// The peptide produced by the most proteins with the number of proteins, if any peptide was
    /// produced at all
    pub most_shared: Option<(String, usize)>,
}

/// Analyse the mass range and digestion of all proteins. Each protein is digested with 0 or 1
/// missed cleavages and only peptides of 6 to 30 residues are kept. Proteins with residues
/// without a known formula are skipped.
///
/// The most shared peptide counts every time a protein produces it, so a peptide found twice in
/// one protein counts as two proteins. When multiple peptides are shared equally often the
/// alphabetically first is reported.
pub fn analyse<'a, P: Protein + 'a>(
    proteins: impl IntoIterator<Item = &'a P>,
    protease: &Protease,
) -> MassAnalysis<'a, P> {
    let digestor = Digestor::new(protease.clone())
        .up_to_missed_cleavages(1)
        .length_filter(6..=30);
    let mut shared: HashMap<&'a str, usize> = HashMap::new();
    let mut result = Vec::new();

    for protein in proteins {
        let (lightest, heaviest) = match RESIDUES
            .peptide(protein.sequence())
            .and_then(|formula| mass_range(&formula, &ELEMENTS))
        {
            Ok(range) => range,
            Err(err) => {
                log::warn!(
                    "Skipping protein {}, no mass could be determined: {err}",
                    protein.identifier()
                );
                continue;
            }
        };
        let peptides = digestor.digest(protein.sequence());
        for peptide in &peptides {
            *shared.entry(*peptide).or_default() += 1;
        }
        result.push(ProteinMass {
            protein,
            lightest,
            heaviest,
            peptides: peptides.len(),
        });
    }
    log::debug!(
        "Analysed {} proteins with {} distinct peptides",
        result.len(),
        shared.len()
    );

    MassAnalysis {
        proteins: result,
        most_shared: shared
            .into_iter()
            .max_by(|(a_peptide, a_count), (b_peptide, b_count)| {
                a_count.cmp(b_count).then_with(|| b_peptide.cmp(a_peptide))
            })
            .map(|(peptide, count)| (peptide.to_string(), count)),
    }
}

impl<P: Protein> MassAnalysis<'_, P> {
    /// Write the report, one block per protein separated by empty lines, followed by the most
    /// shared peptide. Abundances are written as fractions.
    /// # Errors
    /// If the writer errors.
    pub fn write(&self, mut writer: impl Write) -> std::io::Result<()> {
        let mut separator = "";
        for protein in &self.proteins {
            writeln!(
                writer,
                "{separator}{} {}",
                protein.protein.identifier(),
                protein.protein.description()
            )?;
            separator = "\n";
            writeln!(
                writer,
                "Mass min: {:.6} ({:.6}%) max {:.6} ({:.6}%)",
                protein.lightest.mass,
                protein.lightest.abundance,
                protein.heaviest.mass,
                protein.heaviest.abundance
            )?;
            writeln!(writer, "Num peps: {}", protein.peptides)?;
        }
        if let Some((peptide, count)) = &self.most_shared {
            writeln!(
                writer,
                "The most shared peptide ({peptide}) occurs in {count} proteins"
            )?;
        }
        Ok(())
    }
}
