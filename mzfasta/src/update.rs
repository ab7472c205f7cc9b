use std::{
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use context_error::*;
use flate2::bufread::MultiGzDecoder;
use mzdigest::Error;
use reqwest::header::LAST_MODIFIED;

use crate::database::{database_url, url_to_path};

/// The result of [`update_fasta`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UpdateOutcome {
    /// A new version was downloaded to this path
    Downloaded(PathBuf),
    /// The local file at this path is at least as new as the remote file
    UpToDate(PathBuf),
}

impl UpdateOutcome {
    /// The path of the local file
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded(path) | Self::UpToDate(path) => path,
        }
    }
}

fn download_error(url: &str, description: impl ToString) -> Error {
    BoxedError::new(
        BasicKind::Error,
        "Could not download FASTA file",
        description.to_string(),
        Context::none().source(url).to_owned(),
    )
}

fn parse_url(url: &str) -> Result<reqwest::Url, Error> {
    let parsed = reqwest::Url::parse(url).map_err(|e| download_error(url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(download_error(url, "Only HTTP(s) files can be downloaded"));
    }
    Ok(parsed)
}

/// Download a known database when the remote version is newer than the local file, or when
/// there is no local file yet. The directory is created if needed.
/// # Errors
/// If the name is not a known database, the directory could not be made, or the download
/// failed.
pub fn update_fasta(name: &str, directory: &Path) -> Result<UpdateOutcome, Error> {
    let url = database_url(name)?;
    std::fs::create_dir_all(directory).map_err(|err| {
        BoxedError::new(
            BasicKind::Error,
            "Could not download FASTA file",
            format!("The download directory could not be made: {err}"),
            Context::none().source(directory.to_string_lossy()).to_owned(),
        )
    })?;
    let path = url_to_path(url, directory);

    if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
        let response = reqwest::blocking::Client::new()
            .head(parse_url(url)?)
            .send()
            .map_err(|e| download_error(url, e))?;
        if response.status().as_u16() >= 400 {
            return Err(download_error(url, response.status()));
        }
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok());
        if !needs_download(last_modified, modified) {
            log::info!("Not downloading {url}: local file is newer or equal");
            return Ok(UpdateOutcome::UpToDate(path));
        }
    }

    download(url, directory).map(UpdateOutcome::Downloaded)
}

/// Decide if a remote file needs to be downloaded given its `Last-Modified` header and the
/// modification time of the local copy. A missing or unreadable header always downloads.
pub fn needs_download(last_modified: Option<&str>, local_modified: SystemTime) -> bool {
    last_modified
        .and_then(|header| DateTime::parse_from_rfc2822(header).ok())
        .is_none_or(|remote| remote.with_timezone(&Utc) > DateTime::<Utc>::from(local_modified))
}

/// Download a file into the directory, decompressing it if the URL ends in `.gz`. The file is
/// written to a temporary file first and only moved to its final location when complete.
/// # Errors
/// If the URL is not a valid HTTP(s) URL, or the download or writing the file failed.
pub fn download(url: &str, directory: &Path) -> Result<PathBuf, Error> {
    let path = url_to_path(url, directory);
    log::info!("Downloading {url} to {}", path.display());
    let response = reqwest::blocking::get(parse_url(url)?)
        .map_err(|e| download_error(url, e))?
        .error_for_status()
        .map_err(|e| download_error(url, e))?;

    let write_error = |err: std::io::Error| {
        BoxedError::new(
            BasicKind::Error,
            "Could not download FASTA file",
            err.to_string(),
            Context::none().source(path.to_string_lossy()).to_owned(),
        )
    };
    let temporary = tempfile::NamedTempFile::new_in(directory).map_err(write_error)?;
    let mut writer = BufWriter::new(temporary);
    let copied = if url.ends_with(".gz") {
        std::io::copy(
            &mut MultiGzDecoder::new(BufReader::new(response)),
            &mut writer,
        )
    } else {
        std::io::copy(&mut BufReader::new(response), &mut writer)
    };
    let bytes = copied.map_err(|e| download_error(url, e))?;
    log::debug!("Downloaded {bytes} bytes from {url}");
    writer.flush().map_err(write_error)?;
    let temporary = writer
        .into_inner()
        .map_err(|err| write_error(err.into_error()))?;
    temporary
        .persist(&path)
        .map_err(|err| write_error(err.error))?;
    Ok(path)
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn download_decision() {
        // Tue, 15 Nov 1994 08:12:31 GMT
        let remote = SystemTime::UNIX_EPOCH + Duration::from_secs(784_887_151);
        let header = Some("Tue, 15 Nov 1994 08:12:31 GMT");
        assert!(needs_download(header, remote - Duration::from_secs(1)));
        assert!(!needs_download(header, remote));
        assert!(!needs_download(header, remote + Duration::from_secs(3600)));
        assert!(needs_download(
            Some("Tue, 15 Nov 1994 09:12:31 +0100"),
            remote - Duration::from_secs(1)
        ));
        assert!(!needs_download(Some("Tue, 15 Nov 1994 09:12:31 +0100"), remote));
        assert!(needs_download(None, SystemTime::now()));
        assert!(needs_download(Some("yesterday"), SystemTime::now()));
    }

    #[test]
    fn outcome_path() {
        let path = PathBuf::from("data/human.fasta");
        assert_eq!(UpdateOutcome::UpToDate(path.clone()).path(), path);
        assert_eq!(UpdateOutcome::Downloaded(path.clone()).path(), path);
    }

    #[test]
    fn invalid_urls() {
        let directory = tempfile::tempdir().unwrap();
        assert!(download("ftp://ftp.expasy.org/file.fasta", directory.path()).is_err());
        assert!(download("not a url", directory.path()).is_err());
        assert!(update_fasta("unicorn", directory.path()).is_err());
    }
}
