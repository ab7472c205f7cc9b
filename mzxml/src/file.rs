use std::{collections::HashMap, fmt::Display, io::Read, path::Path, str::FromStr};

use context_error::*;
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    scan::{Compression, EncodedPeaks, Peak, Precision, Precursor, Scan},
};

/// An mzXML file. All scans, including the fragmentation scans that are nested inside their
/// precursor scan, are stored in a single list in file order (a scan is followed by the scans
/// nested in it). The position in this list is the scan index, the scan number in the file is
/// the scan id.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MzXml {
    scans: Vec<Scan>,
    index: HashMap<i64, usize>,
    start_time: Option<String>,
    end_time: Option<String>,
}

fn format_error(description: impl ToString, node: Option<&Node>) -> Error {
    let description = description.to_string();
    BoxedError::new(
        BasicKind::Error,
        "Invalid mzXML file",
        match node {
            Some(node) => format!(
                "{description} (at {})",
                node.document().text_pos_at(node.range().start)
            ),
            None => description,
        },
        Context::none(),
    )
}

fn attribute<T: FromStr>(node: &Node, name: &str) -> Result<Option<T>, Error>
where
    T::Err: Display,
{
    node.attribute(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|err| {
                format_error(
                    format!("The attribute '{name}' with value '{value}' is invalid: {err}"),
                    Some(node),
                )
            })
        })
        .transpose()
}

fn required<T: FromStr>(node: &Node, name: &str) -> Result<T, Error>
where
    T::Err: Display,
{
    attribute(node, name)?.ok_or_else(|| {
        format_error(
            format!("The required attribute '{name}' is missing"),
            Some(node),
        )
    })
}

fn parse_peaks(node: &Node) -> Result<EncodedPeaks, Error> {
    let precision = match node.attribute("precision").map(str::trim) {
        None | Some("32") => Precision::Single,
        Some("64") => Precision::Double,
        Some(other) => {
            return Err(format_error(
                format!("Unsupported peak precision '{other}', only 32 and 64 are allowed"),
                Some(node),
            ));
        }
    };
    let compression = match node.attribute("compressionType").map(str::trim) {
        None | Some("none") => Compression::None,
        Some("zlib") => Compression::Zlib,
        Some(other) => {
            return Err(format_error(
                format!("Unsupported peak compression '{other}'"),
                Some(node),
            ));
        }
    };
    if let Some(order) = node.attribute("byteOrder")
        && order != "network"
    {
        return Err(format_error(
            format!("Unsupported byte order '{order}', only 'network' is allowed"),
            Some(node),
        ));
    }
    for name in ["pairOrder", "contentType"] {
        if let Some(order) = node.attribute(name)
            && order != "m/z-int"
        {
            return Err(format_error(
                format!("Unsupported peak content '{order}', only 'm/z-int' is allowed"),
                Some(node),
            ));
        }
    }
    Ok(EncodedPeaks {
        precision,
        compression,
        data: node.text().unwrap_or_default().to_string(),
    })
}

fn parse_precursor(node: &Node) -> Result<Precursor, Error> {
    let text = node.text().unwrap_or_default().trim();
    Ok(Precursor {
        mz: text.parse().map_err(|err| {
            format_error(
                format!("The precursor m/z '{text}' is invalid: {err}"),
                Some(node),
            )
        })?,
        intensity: attribute(node, "precursorIntensity")?,
    })
}

fn parse_scan(node: &Node, parent: Option<usize>) -> Result<Scan, Error> {
    let mut scan = Scan {
        number: required(node, "num")?,
        ms_level: required(node, "msLevel")?,
        peaks_count: required(node, "peaksCount")?,
        retention_time: node.attribute("retentionTime").map(ToString::to_string),
        polarity: node.attribute("polarity").map(ToString::to_string),
        low_mz: attribute(node, "lowMz")?,
        high_mz: attribute(node, "highMz")?,
        base_peak_mz: attribute(node, "basePeakMz")?,
        base_peak_intensity: attribute(node, "basePeakIntensity")?,
        total_ion_current: attribute(node, "totIonCurrent")?,
        parent,
        ..Scan::default()
    };
    for child in node.children() {
        if child.has_tag_name("precursorMz") {
            scan.precursors.push(parse_precursor(&child)?);
        } else if child.has_tag_name("peaks") {
            scan.peaks = parse_peaks(&child)?;
        }
    }
    Ok(scan)
}

impl MzXml {
    /// Parse an mzXML document
    /// # Errors
    /// If the text is not valid XML, the root is not an `mzXML` element with an `msRun`, a scan
    /// is missing its number, MS level, or peak count, or two scans share a number.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let document = Document::parse_with_options(
            text,
            ParsingOptions {
                allow_dtd: true,
                ..Default::default()
            },
        )
        .map_err(|err| format_error(err, None))?;
        let root = document.root_element();
        if !root.has_tag_name("mzXML") {
            return Err(format_error(
                format!(
                    "The root element is '{}' instead of 'mzXML'",
                    root.tag_name().name()
                ),
                Some(&root),
            ));
        }
        let run = root
            .children()
            .find(|node| node.has_tag_name("msRun"))
            .ok_or_else(|| format_error("There is no 'msRun' element", Some(&root)))?;

        let mut result = Self {
            start_time: run.attribute("startTime").map(ToString::to_string),
            end_time: run.attribute("endTime").map(ToString::to_string),
            ..Self::default()
        };
        let mut stack = run
            .children()
            .filter(|node| node.has_tag_name("scan"))
            .map(|node| (node, None))
            .collect::<Vec<_>>();
        stack.reverse();
        while let Some((node, parent)) = stack.pop() {
            let index = result.scans.len();
            let scan = parse_scan(&node, parent)?;
            if result.index.insert(scan.number, index).is_some() {
                return Err(format_error(
                    format!("The scan number {} is used more than once", scan.number),
                    Some(&node),
                ));
            }
            if let Some(parent) = parent {
                result.scans[parent].children.push(index);
            }
            result.scans.push(scan);
            let start = stack.len();
            stack.extend(
                node.children()
                    .filter(|child| child.has_tag_name("scan"))
                    .map(|child| (child, Some(index))),
            );
            stack[start..].reverse();
        }

        if let Some(count) = attribute::<usize>(&run, "scanCount")?
            && count != result.scans.len()
        {
            log::warn!(
                "The mzXML file declares {count} scans but contains {}",
                result.scans.len()
            );
        }
        log::debug!("Read {} scans", result.scans.len());
        Ok(result)
    }

    /// Read an mzXML document from a reader
    /// # Errors
    /// If the reader fails, the text is not UTF-8, or see [`Self::parse`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Failed reading mzXML file",
                err.to_string(),
                Context::none(),
            )
        })?;
        Self::parse(&text)
    }

    /// Read an mzXML file
    /// # Errors
    /// If the file could not be read, or see [`Self::parse`].
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Failed reading mzXML file",
                err.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        Self::parse(&text)
    }

    /// The number of scans, including nested scans
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    /// Check if there are no scans
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    /// All scans in file order
    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// The indices of the scans that are not nested in another scan
    pub fn top_level_scans(&self) -> impl Iterator<Item = usize> + '_ {
        self.scans
            .iter()
            .enumerate()
            .filter(|(_, scan)| scan.parent.is_none())
            .map(|(index, _)| index)
    }

    /// The start time of the run as written in the file
    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    /// The end time of the run as written in the file
    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Get the scan at the given index
    /// # Errors
    /// If the index is out of range.
    pub fn scan(&self, index: usize) -> Result<&Scan, Error> {
        self.scans.get(index).ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid scan index",
                format!(
                    "The scan index {index} is out of range, there are {} scans",
                    self.scans.len()
                ),
                Context::none(),
            )
        })
    }

    /// Decode the peaks of the scan at the given index. This index is the position in the file,
    /// not the scan number, use [`Self::scan_index`] to get the index for a scan number.
    /// # Errors
    /// If the index is out of range or the peaks are invalid.
    pub fn read_scan(&self, index: usize) -> Result<Vec<Peak>, Error> {
        self.scan(index)?.read_peaks()
    }

    /// Get the scan index for a scan number
    /// # Errors
    /// If no scan has this number.
    pub fn scan_index(&self, id: i64) -> Result<usize, Error> {
        self.index.get(&id).copied().ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid scan id",
                format!("There is no scan with number {id}"),
                Context::none(),
            )
        })
    }

    /// Get the scan number for a scan index
    /// # Errors
    /// If the index is out of range.
    pub fn scan_id(&self, index: usize) -> Result<i64, Error> {
        self.scan(index).map(|scan| scan.number)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn scan(attributes: &str, content: &str) -> String {
        format!(
            r#"<mzXML><msRun><scan num="1" msLevel="1" peaksCount="0" {attributes}>{content}</scan></msRun></mzXML>"#
        )
    }

    #[test]
    fn nesting_order() {
        let file = MzXml::parse(
            r#"<mzXML><msRun scanCount="6">
                <scan num="10" msLevel="1" peaksCount="0">
                    <scan num="11" msLevel="2" peaksCount="0">
                        <scan num="12" msLevel="3" peaksCount="0"/>
                        <scan num="13" msLevel="3" peaksCount="0"/>
                    </scan>
                    <scan num="14" msLevel="2" peaksCount="0"/>
                </scan>
                <scan num="20" msLevel="1" peaksCount="0"/>
            </msRun></mzXML>"#,
        )
        .unwrap();
        assert_eq!(file.len(), 6);
        let ids = (0..file.len())
            .map(|index| file.scan_id(index).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, [10, 11, 12, 13, 14, 20]);
        for (index, id) in ids.iter().enumerate() {
            assert_eq!(file.scan_index(*id).unwrap(), index);
        }
        assert_eq!(file.scans()[0].children, [1, 4]);
        assert_eq!(file.scans()[1].children, [2, 3]);
        assert_eq!(file.scans()[2].parent, Some(1));
        assert_eq!(file.scans()[4].parent, Some(0));
        assert_eq!(file.scans()[5].parent, None);
        assert_eq!(file.top_level_scans().collect::<Vec<_>>(), [0, 5]);
    }

    #[test]
    fn index_errors() {
        let file = MzXml::parse(&scan("", "")).unwrap();
        assert_eq!(file.scan_id(0).unwrap(), 1);
        assert!(file.scan_id(1).is_err());
        assert!(file.scan_index(0).is_err());
        assert!(file.scan_index(2).is_err());
        assert!(file.read_scan(1).is_err());
        assert!(file.read_scan(0).unwrap().is_empty());
    }

    #[test]
    fn deep_nesting() {
        let depth = 200;
        let mut text = String::from("<mzXML><msRun>");
        for number in 0..depth {
            text += &format!(r#"<scan num="{number}" msLevel="1" peaksCount="0">"#);
        }
        text += &"</scan>".repeat(depth);
        text += "</msRun></mzXML>";
        let file = MzXml::parse(&text).unwrap();
        assert_eq!(file.len(), depth);
        assert_eq!(file.top_level_scans().collect::<Vec<_>>(), [0]);
        for (index, scan) in file.scans().iter().enumerate().skip(1) {
            assert_eq!(scan.parent, Some(index - 1));
            assert_eq!(file.scan_id(index).unwrap(), i64::try_from(index).unwrap());
        }
    }

    #[test]
    fn attributes() {
        let file = MzXml::parse(&scan(
            r#"retentionTime="PT5.2S" polarity="-" lowMz="100" highMz=" 2000.5 " totIonCurrent="1e5""#,
            r#"<precursorMz precursorIntensity="25302.5">353.25</precursorMz><precursorMz>400</precursorMz>"#,
        ))
        .unwrap();
        let scan = &file.scans()[0];
        assert_eq!(scan.retention_time.as_deref(), Some("PT5.2S"));
        assert_eq!(scan.polarity.as_deref(), Some("-"));
        assert_eq!(scan.low_mz, Some(100.0));
        assert_eq!(scan.high_mz, Some(2000.5));
        assert_eq!(scan.base_peak_mz, None);
        assert_eq!(scan.total_ion_current, Some(100_000.0));
        assert_eq!(
            scan.precursors,
            [
                Precursor {
                    mz: 353.25,
                    intensity: Some(25302.5)
                },
                Precursor {
                    mz: 400.0,
                    intensity: None
                }
            ]
        );
    }

    #[test]
    fn peak_attributes() {
        let file = MzXml::parse(&scan(
            "",
            r#"<peaks precision="64" compressionType="zlib" byteOrder="network" contentType="m/z-int">eJwDAAAAAAE=</peaks>"#,
        ))
        .unwrap();
        assert_eq!(file.scans()[0].peaks.precision, Precision::Double);
        assert_eq!(file.scans()[0].peaks.compression, Compression::Zlib);
        assert_eq!(file.scans()[0].peaks.data, "eJwDAAAAAAE=");
        for peaks in [
            r#"<peaks precision="16"/>"#,
            r#"<peaks compressionType="gzip"/>"#,
            r#"<peaks byteOrder="little"/>"#,
            r#"<peaks pairOrder="int-m/z"/>"#,
            r#"<peaks contentType="m/z ruler"/>"#,
        ] {
            assert!(MzXml::parse(&scan("", peaks)).is_err(), "{peaks}");
        }
    }

    #[test]
    fn invalid() {
        assert!(MzXml::parse("").is_err());
        assert!(MzXml::parse("<mzXML>").is_err());
        assert!(MzXml::parse("<mzML><msRun/></mzML>").is_err());
        assert!(MzXml::parse("<mzXML></mzXML>").is_err());
        assert!(MzXml::parse("<mzXML><msRun/></mzXML>").unwrap().is_empty());
        assert!(
            MzXml::parse(r#"<mzXML><msRun><scan msLevel="1" peaksCount="0"/></msRun></mzXML>"#)
                .is_err()
        );
        assert!(
            MzXml::parse(r#"<mzXML><msRun><scan num="1" msLevel="1"/></msRun></mzXML>"#).is_err()
        );
        assert!(MzXml::parse(&scan(r#"lowMz="low""#, "")).is_err());
        assert!(MzXml::parse(&scan("", "<precursorMz>mass</precursorMz>")).is_err());
        assert!(
            MzXml::parse(
                r#"<mzXML><msRun>
                    <scan num="1" msLevel="1" peaksCount="0"/>
                    <scan num="1" msLevel="1" peaksCount="0"/>
                </msRun></mzXML>"#
            )
            .is_err()
        );
    }

    #[test]
    fn from_reader() {
        let text = scan("", "");
        assert_eq!(
            MzXml::from_reader(text.as_bytes()).unwrap(),
            MzXml::parse(&text).unwrap()
        );
        assert!(MzXml::from_reader(&[0xff, 0xfe, 0x00][..]).is_err());
    }
}
