#![allow(clippy::missing_panics_doc)]
//! Read a small mzXML file with nested fragmentation scans

use mzxml::{MzXml, Peak, Precursor};

const SMALL: &str = "tests/small.mzXML";

fn peak(mz: f64, intensity: f64) -> Peak {
    Peak { mz, intensity }
}

#[test]
fn scan_order() {
    let file = MzXml::parse_file(SMALL).unwrap();
    assert_eq!(file.len(), 5);
    assert_eq!(file.start_time(), Some("PT0.5S"));
    assert_eq!(file.end_time(), Some("PT12.25S"));
    let ids = (0..file.len())
        .map(|index| file.scan_id(index).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, [1, 2, 4, 3, 5]);
    assert_eq!(file.scan_index(4).unwrap(), 2);
    assert_eq!(file.scan_index(3).unwrap(), 3);
    assert!(file.scan_index(6).is_err());
    assert!(file.scan_id(5).is_err());
    assert_eq!(file.top_level_scans().collect::<Vec<_>>(), [0, 4]);
    assert_eq!(file.scans()[0].children, [1, 3]);
    assert_eq!(file.scans()[1].children, [2]);
    assert_eq!(
        file.scans()
            .iter()
            .map(|scan| scan.ms_level)
            .collect::<Vec<_>>(),
        [1, 2, 3, 2, 1]
    );
}

#[test]
fn peaks() {
    let file = MzXml::parse_file(SMALL).unwrap();
    assert_eq!(
        file.read_scan(0).unwrap(),
        [
            peak(100.5, 1000.0),
            peak(200.25, 50.0),
            peak(300.125, 7.5)
        ]
    );
    assert_eq!(
        file.read_scan(file.scan_index(2).unwrap()).unwrap(),
        [peak(150.1, 12.5), peak(250.2, 0.0)]
    );
    assert_eq!(file.read_scan(2).unwrap(), [peak(175.75, 3.0)]);
    assert!(file.read_scan(3).unwrap().is_empty());
    assert_eq!(
        file.read_scan(4).unwrap(),
        [peak(400.0, 1.0), peak(401.5, 2.0)]
    );
    assert!(file.read_scan(5).is_err());
}

#[test]
fn scan_metadata() {
    let file = MzXml::parse_file(SMALL).unwrap();
    let full = file.scan(0).unwrap();
    assert_eq!(full.polarity.as_deref(), Some("+"));
    assert_eq!(full.retention_time.as_deref(), Some("PT0.5S"));
    assert_eq!(full.base_peak_intensity, Some(1000.0));
    assert_eq!(full.total_ion_current, Some(1057.5));
    assert!(full.precursors.is_empty());
    let fragment = file.scan(1).unwrap();
    assert_eq!(fragment.parent, Some(0));
    assert_eq!(
        fragment.precursors,
        [Precursor {
            mz: 353.3153,
            intensity: Some(25302.23828125)
        }]
    );
    assert_eq!(file.scan(2).unwrap().precursors[0].intensity, None);
}

#[test]
fn missing_file() {
    assert!(MzXml::parse_file("does/not/exist.mzXML").is_err());
}
