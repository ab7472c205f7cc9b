use std::path::{Path, PathBuf};

use context_error::*;
use itertools::Itertools;
use mzdigest::Error;

/// A protein database that can be downloaded by name
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KnownDatabase {
    /// The common names, matched ignoring casing
    pub names: &'static [&'static str],
    /// The NCBI taxonomy id, 0 for SwissProt and -1 for databases not tied to a species
    pub taxonomy_id: i64,
    /// The location to download the database from
    pub url: &'static str,
}

macro_rules! reference_proteome {
    ($kingdom:literal, $proteome:literal, $taxonomy:literal) => {
        concat!(
            "https://ftp.expasy.org/databases/uniprot/current_release/knowledgebase/reference_proteomes/",
            $kingdom,
            "/",
            $proteome,
            "/",
            $proteome,
            "_",
            $taxonomy,
            ".fasta.gz"
        )
    };
}

/// All databases that can be referred to by common name or taxonomy id
pub const KNOWN_DATABASES: &[KnownDatabase] = &[
    KnownDatabase {
        names: &["swiss", "sprot", "uniprot swissprot", "sp"],
        taxonomy_id: 0,
        url: "https://ftp.expasy.org/databases/uniprot/current_release/knowledgebase/complete/uniprot_sprot.fasta.gz",
    },
    KnownDatabase {
        names: &["human", "homo sapiens"],
        taxonomy_id: 9606,
        url: reference_proteome!("Eukaryota", "UP000005640", "9606"),
    },
    KnownDatabase {
        names: &["ecoli", "e.coli", "e-coli", "escherichia coli", "K12"],
        taxonomy_id: 83333,
        url: reference_proteome!("Bacteria", "UP000000625", "83333"),
    },
    KnownDatabase {
        names: &["yeast", "s. cerevisiae", "saccharomyces cerevisiae"],
        taxonomy_id: 559_292,
        url: reference_proteome!("Eukaryota", "UP000002311", "559292"),
    },
    KnownDatabase {
        names: &["mouse", "mus musculus", "house mouse"],
        taxonomy_id: 10090,
        url: reference_proteome!("Eukaryota", "UP000000589", "10090"),
    },
    KnownDatabase {
        names: &["rat", "rattus norvegicus", "norway rat", "brown rat"],
        taxonomy_id: 10116,
        url: reference_proteome!("Eukaryota", "UP000002494", "10116"),
    },
    KnownDatabase {
        names: &["zebra fish", "danio rerio", "zebrafish"],
        taxonomy_id: 7955,
        url: reference_proteome!("Eukaryota", "UP000000437", "7955"),
    },
    KnownDatabase {
        names: &["cow", "bos taurus", "dairy cow", "domestic cow"],
        taxonomy_id: 9913,
        url: reference_proteome!("Eukaryota", "UP000009136", "9913"),
    },
    KnownDatabase {
        names: &["fruit fly", "drosophila melanogaster"],
        taxonomy_id: 7227,
        url: reference_proteome!("Eukaryota", "UP000000803", "7227"),
    },
    KnownDatabase {
        names: &["Nematode worm", "Caenorhabditis elegans"],
        taxonomy_id: 6239,
        url: reference_proteome!("Eukaryota", "UP000001940", "6239"),
    },
    KnownDatabase {
        names: &[
            "SARS-CoV-2",
            "corona",
            "corona virus",
            "2019-nCoV",
            "covid 19",
        ],
        taxonomy_id: 2_697_049,
        url: reference_proteome!("Viruses", "UP000464024", "2697049"),
    },
    KnownDatabase {
        names: &["Lambda phage", "coliphage λ", "Escherichia virus Lambda"],
        taxonomy_id: 10710,
        url: reference_proteome!("Viruses", "UP000001711", "10710"),
    },
    KnownDatabase {
        names: &[
            "SV40",
            "simian vacuolating virus 40",
            "simian virus 40",
            "Macaca mulatta polyomavirus 1",
        ],
        taxonomy_id: 1_891_767,
        url: reference_proteome!("Viruses", "UP000007705", "1891767"),
    },
    KnownDatabase {
        names: &[
            "Herpes simplex virus 1",
            "Herpes simplex 1",
            "HSV-1",
            "Human herpesvirus 1",
        ],
        taxonomy_id: 10298,
        url: reference_proteome!("Viruses", "UP000110586", "10298"),
    },
    KnownDatabase {
        names: &[
            "Herpes simplex virus 2",
            "Herpes simplex 2",
            "HSV-2",
            "Human herpesvirus 2",
            "Human alphaherpesvirus 2",
        ],
        taxonomy_id: 10310,
        url: reference_proteome!("Viruses", "UP000270953", "10310"),
    },
    KnownDatabase {
        names: &["Escherichia virus T4", "T4 phage"],
        taxonomy_id: 10665,
        url: reference_proteome!("Viruses", "UP000009087", "10665"),
    },
    KnownDatabase {
        names: &["CRAP"],
        taxonomy_id: -1,
        url: "http://ftp.thegpm.org/fasta/cRAP/crap.fasta",
    },
];

/// Find a known database by taxonomy id (if the name is numeric) or by common name, ignoring
/// casing.
/// # Errors
/// If no database is known by this name.
pub fn find_database(name: &str) -> Result<&'static KnownDatabase, Error> {
    let found = name.parse::<i64>().map_or_else(
        |_| {
            let name = name.to_lowercase();
            KNOWN_DATABASES.iter().find(|database| {
                database
                    .names
                    .iter()
                    .any(|known| known.to_lowercase() == name)
            })
        },
        |taxonomy_id| {
            KNOWN_DATABASES
                .iter()
                .find(|database| database.taxonomy_id == taxonomy_id)
        },
    );
    found.ok_or_else(|| {
        BoxedError::new(
            BasicKind::Error,
            "Unknown FASTA name",
            format!(
                "The FASTA name is not a known taxonomy id or common name, use any of: {}",
                KNOWN_DATABASES.iter().map(|database| database.names[0]).join(", ")
            ),
            Context::show(name.to_string()),
        )
    })
}

/// The download location for a known database, see [`find_database`]
/// # Errors
/// If no database is known by this name.
pub fn database_url(name: &str) -> Result<&'static str, Error> {
    find_database(name).map(|database| database.url)
}

/// The name of the local file for a download location, this is the last path segment without
/// the `.gz` extension as files are decompressed when downloaded.
pub fn url_to_filename(url: &str) -> &str {
    let name = url.rsplit_once('/').map_or(url, |(_, name)| name);
    name.strip_suffix(".gz").unwrap_or(name)
}

/// The path of the local file for a download location
pub fn url_to_path(url: &str, directory: &Path) -> PathBuf {
    directory.join(url_to_filename(url))
}

/// Find the FASTA file for a name. If the name is an existing path it is used as is,
/// otherwise the name is resolved as a known database in the given directory. The resolved file
/// does not have to exist.
/// # Errors
/// If the name is not an existing path and not a known database.
pub fn resolve_fasta_path(name: &str, directory: &Path) -> Result<PathBuf, Error> {
    let path = Path::new(name);
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        database_url(name).map(|url| url_to_path(url, directory))
    }
}
