use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    sync::LazyLock,
};

use context_error::*;
use itertools::Itertools;
use mzdigest::{Error, sequence::Protein};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The number of residues on a single sequence line when writing
const LINE_LENGTH: usize = 60;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>([^ \t]*)(?:[ \t]+(.+)?)?").unwrap());

/// A single protein from a FASTA file
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FastaData {
    identifier: String,
    description: String,
    sequence: String,
}

impl Protein for FastaData {
    fn identifier(&self) -> &str {
        &self.identifier
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn sequence(&self) -> &str {
        &self.sequence
    }
}

impl FastaData {
    /// Create a new protein
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    fn is_empty(&self) -> bool {
        self.identifier.is_empty() && self.description.is_empty() && self.sequence.is_empty()
    }

    /// Parse a single fasta file
    /// # Errors
    /// If the file could not be opened or read.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Self>, Error> {
        Self::parse_file_filtered(path, |_| true)
    }

    /// Parse a single fasta file, only keeping the proteins for which the filter returns true
    /// # Errors
    /// If the file could not be opened or read.
    pub fn parse_file_filtered(
        path: impl AsRef<Path>,
        filter: impl Fn(&Self) -> bool,
    ) -> Result<Vec<Self>, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Failed reading fasta file",
                format!("Error occurred while opening the file: {err}"),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        Self::parse_reader_filtered(BufReader::new(file), Some(path), filter)
    }

    /// Parse a fasta file from a reader, the path is only used for error messages
    /// # Errors
    /// If a line could not be read.
    pub fn parse_reader(reader: impl BufRead, path: Option<&Path>) -> Result<Vec<Self>, Error> {
        Self::parse_reader_filtered(reader, path, |_| true)
    }

    /// Parse a fasta file from a reader, only keeping the proteins for which the filter returns
    /// true. Lines starting with `#` (PEFF headers) are ignored. A header without identifier
    /// gets `DUMMY_ID_{n}` as identifier with `n` the number of proteins kept so far plus one.
    /// # Errors
    /// If a line could not be read.
    pub fn parse_reader_filtered(
        reader: impl BufRead,
        path: Option<&Path>,
        filter: impl Fn(&Self) -> bool,
    ) -> Result<Vec<Self>, Error> {
        let mut proteins = Vec::new();
        let mut current = Self::default();
        let store = |protein: Self, proteins: &mut Vec<Self>| {
            if filter(&protein) && !protein.is_empty() {
                proteins.push(protein);
            }
        };

        for (line_index, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| {
                BoxedError::new(
                    BasicKind::Error,
                    "Failed reading fasta file",
                    format!("Error occurred while reading line {}: {err}", line_index + 1),
                    path.map_or_else(Context::none, |p| {
                        Context::default().source(p.to_string_lossy()).to_owned()
                    }),
                )
            })?;
            if line.starts_with('#') {
                continue;
            } else if line.starts_with('>') {
                store(std::mem::take(&mut current), &mut proteins);
                let captures = HEADER.captures(&line);
                match captures
                    .as_ref()
                    .and_then(|c| c.get(1))
                    .filter(|id| !id.is_empty())
                {
                    Some(identifier) => {
                        current.identifier = identifier.as_str().to_string();
                        current.description = captures
                            .as_ref()
                            .and_then(|c| c.get(2))
                            .map_or_else(String::new, |d| d.as_str().to_string());
                    }
                    None => current.identifier = format!("DUMMY_ID_{}", proteins.len() + 1),
                }
            } else {
                current.sequence.push_str(line.trim());
            }
        }
        store(current, &mut proteins);
        log::debug!("Read {} proteins", proteins.len());
        Ok(proteins)
    }

    /// Write proteins in fasta format, the header is the identifier and description separated
    /// by a tab, the sequence is split over lines of 60 residues.
    /// # Errors
    /// If the writer errors.
    pub fn write<'a>(
        proteins: impl IntoIterator<Item = &'a Self>,
        mut writer: impl Write,
    ) -> std::io::Result<()> {
        for protein in proteins {
            writeln!(writer, ">{}\t{}", protein.identifier, protein.description)?;
            for line in &protein.sequence.chars().chunks(LINE_LENGTH) {
                writeln!(writer, "{}", line.collect::<String>())?;
            }
        }
        Ok(())
    }

    /// Write proteins to a fasta file, see [`Self::write`]
    /// # Errors
    /// If the file could not be created or written.
    pub fn write_file<'a>(
        proteins: impl IntoIterator<Item = &'a Self>,
        path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let error = |err: std::io::Error| {
            BoxedError::new(
                BasicKind::Error,
                "Failed writing fasta file",
                err.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        };
        let mut writer = BufWriter::new(std::fs::File::create(path).map_err(error)?);
        Self::write(proteins, &mut writer).map_err(error)?;
        writer.flush().map_err(error)
    }
}
