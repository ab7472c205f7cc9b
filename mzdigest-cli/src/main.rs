//! Digest, analyse and download FASTA protein databases, and inspect mzXML spectra

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use context_error::*;
use directories::BaseDirs;
use log::{LevelFilter, debug, info};
use mzdigest::{Error, prelude::*};
use mzfasta::{FastaData, database::resolve_fasta_path, update::update_fasta};
use mzxml::MzXml;

/// The command line interface arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Log informational messages, ignoring the RUST_LOG environment variable
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process FASTA files. Every FASTA can be a path, a common species name (human, yeast,
    /// swiss), or a taxonomy id (9606). Named databases are downloaded into the data directory
    /// if they are not present yet.
    Fasta(FastaArgs),
    /// List the scans in an mzXML file, or the peaks of a single scan
    Mzxml(MzxmlArgs),
    /// Generate a decoy database
    Decoy,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, clap::Args)]
struct FastaArgs {
    /// The FASTA files or database names
    #[arg(required_unless_present = "enzymes")]
    fasta: Vec<String>,
    /// List proteins which don't contain the specified sequence
    #[arg(short, long)]
    missing: Option<String>,
    /// List proteins which contain the specified sequence
    #[arg(short, long)]
    contains: Option<String>,
    /// The cleavage enzyme, see --enzymes
    #[arg(short, long, default_value = "trypsin")]
    enzyme: String,
    /// Update the named FASTA databases if a newer version is available
    #[arg(short, long)]
    update: bool,
    /// Analyse the mass and digestion of all proteins
    #[arg(short, long)]
    analyse: bool,
    /// List the proteotypic peptides over all FASTA files together
    #[arg(short, long)]
    proteotypic: bool,
    /// The directory for downloaded databases, defaults to `~/data/fasta`
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// List the known enzymes
    #[arg(long)]
    enzymes: bool,
}

#[derive(Debug, clap::Args)]
struct MzxmlArgs {
    /// The mzXML file
    file: PathBuf,
    /// Show the peaks of the scan with this number
    #[arg(short, long)]
    scan: Option<i64>,
}

fn main() {
    let args = Cli::parse();
    if args.verbose {
        env_logger::builder().filter_level(LevelFilter::Info).init();
        info!("Verbose output enabled (ignoring RUST_LOG environment variable)");
    } else {
        env_logger::init();
        debug!("Logging configured from environment variables");
    }

    let result = match args.command {
        Command::Fasta(fasta) => run_fasta(&fasta),
        Command::Mzxml(mzxml) => run_mzxml(&mzxml),
        Command::Decoy => {
            println!("Decoy generation is not implemented yet");
            Ok(())
        }
    };
    if let Err(error) = result {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

fn output_error(error: &std::io::Error) -> Error {
    BoxedError::new(
        BasicKind::Error,
        "Could not write output",
        error.to_string(),
        Context::none(),
    )
}

/// The directory for downloaded databases, created when missing
fn data_directory(data_dir: Option<&Path>) -> Result<PathBuf, Error> {
    let directory = match data_dir {
        Some(directory) => directory.to_path_buf(),
        None => BaseDirs::new()
            .map(|dirs| dirs.home_dir().join("data").join("fasta"))
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "No data directory",
                    "The home directory could not be found, set the data directory with --data-dir",
                    Context::none(),
                )
            })?,
    };
    std::fs::create_dir_all(&directory).map_err(|err| {
        BoxedError::new(
            BasicKind::Error,
            "No data directory",
            format!("The data directory could not be made: {err}"),
            Context::none().source(directory.to_string_lossy()).to_owned(),
        )
    })?;
    Ok(directory)
}

/// Find, and if needed download, the FASTA file for a name and read it
fn load_fasta(name: &str, directory: &Path, update: bool) -> Result<Vec<FastaData>, Error> {
    if update {
        let outcome = update_fasta(name, directory)?;
        info!("Using {}", outcome.path().display());
    }
    let path = resolve_fasta_path(name, directory)?;
    if !path.exists() {
        update_fasta(name, directory)?;
    }
    FastaData::parse_file(&path)
}

fn run_fasta(args: &FastaArgs) -> Result<(), Error> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.enzymes {
        for protease in Protease::ALL {
            writeln!(out, "{protease}: {}", protease.description())
                .map_err(|e| output_error(&e))?;
        }
    }

    let protease: Protease = args.enzyme.parse()?;
    let directory = data_directory(args.data_dir.as_deref())?;
    let databases = args
        .fasta
        .iter()
        .map(|name| load_fasta(name, &directory, args.update))
        .collect::<Result<Vec<_>, _>>()?;

    for proteins in &databases {
        if args.analyse {
            analyse(proteins, &protease)
                .write(&mut out)
                .map_err(|e| output_error(&e))?;
        }
        if args.contains.is_some() || args.missing.is_some() {
            for protein in proteins.iter().filter(|p| {
                args.contains
                    .as_ref()
                    .is_none_or(|contains| p.sequence().contains(contains.as_str()))
                    && args
                        .missing
                        .as_ref()
                        .is_none_or(|missing| !p.sequence().contains(missing.as_str()))
            }) {
                writeln!(
                    out,
                    "Length: {} {} {}",
                    protein.sequence().len(),
                    protein.identifier(),
                    protein.description()
                )
                .map_err(|e| output_error(&e))?;
            }
        }
    }

    if args.proteotypic {
        proteotypic_peptides(databases.iter().flatten(), &protease)
            .write(&mut out)
            .map_err(|e| output_error(&e))?;
    }
    out.flush().map_err(|e| output_error(&e))
}

fn run_mzxml(args: &MzxmlArgs) -> Result<(), Error> {
    let file = MzXml::parse_file(&args.file)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Some(id) = args.scan {
        for peak in file.read_scan(file.scan_index(id)?)? {
            writeln!(out, "{}\t{}", peak.mz, peak.intensity).map_err(|e| output_error(&e))?;
        }
    } else {
        writeln!(out, "index\tscan\tms level\tpeaks\tparent scan")
            .map_err(|e| output_error(&e))?;
        for (index, scan) in file.scans().iter().enumerate() {
            let parent = scan
                .parent
                .map(|parent| file.scan_id(parent))
                .transpose()?
                .map_or_else(String::new, |id| id.to_string());
            writeln!(
                out,
                "{index}\t{}\t{}\t{}\t{parent}",
                scan.number, scan.ms_level, scan.peaks_count
            )
            .map_err(|e| output_error(&e))?;
        }
    }
    out.flush().map_err(|e| output_error(&e))
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn data_directory_is_created() {
        let root = tempfile::tempdir().unwrap();
        let directory = root.path().join("nested").join("fasta");
        assert!(!directory.exists());
        assert_eq!(data_directory(Some(directory.as_path())).unwrap(), directory);
        assert!(directory.is_dir());
        assert_eq!(data_directory(Some(directory.as_path())).unwrap(), directory);
    }

    #[test]
    fn data_directory_on_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(data_directory(Some(file.as_path())).is_err());
    }

    #[test]
    fn arguments() {
        let cli = Cli::try_parse_from(["mzdigest", "fasta", "human", "-e", "lys_c", "-p"]).unwrap();
        let Command::Fasta(args) = cli.command else {
            panic!("Expected the fasta command");
        };
        assert_eq!(args.fasta, ["human"]);
        assert_eq!(args.enzyme, "lys_c");
        assert!(args.proteotypic);
        assert!(Cli::try_parse_from(["mzdigest", "fasta"]).is_err());
        assert!(Cli::try_parse_from(["mzdigest", "fasta", "--enzymes"]).is_ok());
        let cli = Cli::try_parse_from(["mzdigest", "mzxml", "run.mzXML", "-s", "12"]).unwrap();
        let Command::Mzxml(args) = cli.command else {
            panic!("Expected the mzxml command");
        };
        assert_eq!(args.file, PathBuf::from("run.mzXML"));
        assert_eq!(args.scan, Some(12));
    }
}
