use std::io::Read;

use base64::Engine;
use context_error::*;
use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A single peak in a spectrum
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Peak {
    /// The mass over charge
    pub mz: f64,
    /// The intensity
    pub intensity: f64,
}

/// The floating point precision of the stored peaks
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Precision {
    /// 32 bit floats
    #[default]
    Single,
    /// 64 bit floats
    Double,
}

impl Precision {
    /// The number of bytes for a single value
    pub const fn bytes(self) -> usize {
        match self {
            Self::Single => 4,
            Self::Double => 8,
        }
    }

    fn read(self, bytes: &[u8]) -> f64 {
        match self {
            Self::Single => {
                let mut value = [0; 4];
                value.copy_from_slice(&bytes[..4]);
                f64::from(f32::from_be_bytes(value))
            }
            Self::Double => {
                let mut value = [0; 8];
                value.copy_from_slice(&bytes[..8]);
                f64::from_be_bytes(value)
            }
        }
    }
}

/// The compression applied to the peak data before base64 encoding
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Compression {
    /// Not compressed
    #[default]
    None,
    /// Compressed with zlib
    Zlib,
}

/// The peaks of a scan as stored in the file: base64 text of big endian (m/z, intensity) pairs
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct EncodedPeaks {
    /// The precision of every value
    pub precision: Precision,
    /// The compression of the binary data
    pub compression: Compression,
    /// The base64 text, whitespace is ignored
    pub data: String,
}

fn decode_error(description: impl ToString) -> Error {
    BoxedError::new(
        BasicKind::Error,
        "Invalid mzXML peaks",
        description.to_string(),
        Context::none(),
    )
}

impl EncodedPeaks {
    /// Decode the first `count` peaks. Any data after these peaks is ignored.
    /// # Errors
    /// If the text is not valid base64, the compressed data is not valid zlib, or there is less
    /// data than needed for `count` peaks.
    pub fn decode(&self, count: usize) -> Result<Vec<Peak>, Error> {
        let text: String = self.data.split_ascii_whitespace().collect();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(text)
            .map_err(|err| decode_error(format!("The peaks are not valid base64: {err}")))?;
        if self.compression == Compression::Zlib {
            let mut decompressed = Vec::new();
            ZlibDecoder::new(bytes.as_slice())
                .read_to_end(&mut decompressed)
                .map_err(|err| decode_error(format!("The peaks are not valid zlib data: {err}")))?;
            bytes = decompressed;
        }

        let pair = 2 * self.precision.bytes();
        let needed = count.checked_mul(pair).ok_or_else(|| {
            decode_error(format!("The number of peaks ({count}) is too big"))
        })?;
        if bytes.len() < needed {
            return Err(decode_error(format!(
                "Expected {count} peaks ({needed} bytes) but only {} bytes are present",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(pair)
            .take(count)
            .map(|chunk| Peak {
                mz: self.precision.read(chunk),
                intensity: self.precision.read(&chunk[self.precision.bytes()..]),
            })
            .collect())
    }
}

/// The precursor of a fragmentation scan
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Precursor {
    /// The mass over charge
    pub mz: f64,
    /// The intensity, if given
    pub intensity: Option<f64>,
}

/// A single scan. Nested scans are stored by index in the list of all scans of the file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Scan {
    /// The scan number used in the file
    pub number: i64,
    /// The MS level, 1 for full scans
    pub ms_level: u32,
    /// The number of peaks
    pub peaks_count: usize,
    /// The retention time as written in the file, an XML duration like `PT5.2S`
    pub retention_time: Option<String>,
    /// The polarity, `+` or `-`
    pub polarity: Option<String>,
    /// The lowest m/z
    pub low_mz: Option<f64>,
    /// The highest m/z
    pub high_mz: Option<f64>,
    /// The m/z of the most intense peak
    pub base_peak_mz: Option<f64>,
    /// The intensity of the most intense peak
    pub base_peak_intensity: Option<f64>,
    /// The total ion current
    pub total_ion_current: Option<f64>,
    /// The precursors, empty for full scans
    pub precursors: Vec<Precursor>,
    /// The encoded peaks
    pub peaks: EncodedPeaks,
    /// The index of the scan this scan is nested in
    pub parent: Option<usize>,
    /// The indices of the scans nested in this scan, in file order
    pub children: Vec<usize>,
}

impl Scan {
    /// Decode the peaks of this scan
    /// # Errors
    /// If the peak data is invalid, see [`EncodedPeaks::decode`].
    pub fn read_peaks(&self) -> Result<Vec<Peak>, Error> {
        self.peaks.decode(self.peaks_count)
    }
}
