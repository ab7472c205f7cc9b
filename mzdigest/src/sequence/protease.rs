use std::{fmt::Display, str::FromStr, sync::Arc};

use context_error::*;
use itertools::Itertools;

use crate::Error;

/// The rule of a custom protease, gets the full sequence and the position of the bond (between
/// `position - 1` and `position`) and returns if the protease cuts there.
pub type CutRule = Arc<dyn Fn(&[u8], usize) -> bool + Send + Sync>;

/// A protease defined by its cleavage rule, the rule is evaluated for the bond between residue
/// `position - 1` and `position` and only has access to the residues directly around the bond.
///
/// # Examples
/// ```rust
/// # use mzdigest::prelude::*;
/// let trypsin: Protease = "trypsin".parse().unwrap();
/// assert!(trypsin.cuts(b"AKA", 2));
/// assert!(!trypsin.cuts(b"AKP", 2));
///
/// // A custom protease cutting after any arginine
/// let argc = Protease::custom("ArgC", |sequence, position| sequence[position - 1] == b'R');
/// assert!(argc.cuts(b"ARP", 2));
/// ```
#[derive(Clone, Default)]
pub enum Protease {
    /// Cuts after K or R unless followed by P, with the exceptions from
    /// [`PeptideCutter`](https://web.expasy.org/peptide_cutter/peptidecutter_enzymes.html)
    #[default]
    Trypsin,
    /// Cuts after K or R unless followed by P
    TrypsinSimple,
    /// Cuts after K or R
    TrypsinP,
    /// Cuts after K unless followed by P
    LysC,
    /// Cuts after F or L unless followed by P
    PepsinA,
    /// Cuts after F, W, Y, or L unless followed by P
    Chymotrypsin,
    /// A custom rule, see [`Protease::custom`]
    Custom(String, CutRule),
}

impl Protease {
    /// All named proteases
    pub const ALL: &'static [Self] = &[
        Self::Trypsin,
        Self::TrypsinSimple,
        Self::TrypsinP,
        Self::LysC,
        Self::PepsinA,
        Self::Chymotrypsin,
    ];

    /// Create a custom protease from a rule. The rule gets the full sequence and the position of
    /// the bond, it is only called with `1 <= position < sequence.len()`.
    pub fn custom(
        name: impl Into<String>,
        rule: impl Fn(&[u8], usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(name.into(), Arc::new(rule))
    }

    /// Get a named protease, ignoring casing.
    /// # Errors
    /// If the name is not a known protease.
    pub fn named(name: &str) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .find(|protease| protease.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Unknown enzyme",
                    format!(
                        "The enzyme name is not known, use any of: {}",
                        Self::ALL.iter().map(Self::name).join(", ")
                    ),
                    Context::show(name.to_string()),
                )
            })
    }

    /// The name of this protease
    pub fn name(&self) -> &str {
        match self {
            Self::Trypsin => "Trypsin",
            Self::TrypsinSimple => "Trypsin_Simple",
            Self::TrypsinP => "Trypsin/P",
            Self::LysC => "Lys_C",
            Self::PepsinA => "PepsinA",
            Self::Chymotrypsin => "Chymotrypsin",
            Self::Custom(name, _) => name.as_str(),
        }
    }

    /// A short description of the cleavage rule
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Trypsin => "See https://web.expasy.org/peptide_cutter/peptidecutter_enzymes.html",
            Self::TrypsinSimple => "Cuts after K and R but not before P",
            Self::TrypsinP => "Cuts after K and R",
            Self::LysC => "Cuts after K but not before P",
            Self::PepsinA => "Cuts after F and L but not before P",
            Self::Chymotrypsin => "Cuts after F, W, Y, L but not before P",
            Self::Custom(..) => "Custom cleavage rule",
        }
    }

    /// Check if this protease cuts the bond between `position - 1` and `position`. Positions
    /// outside of `1..sequence.len()` never cut.
    pub fn cuts(&self, sequence: &[u8], position: usize) -> bool {
        if position == 0 || position >= sequence.len() {
            return false;
        }
        let before = sequence[position - 1];
        let after = sequence[position];
        match self {
            Self::Trypsin => trypsin(sequence, position),
            Self::TrypsinSimple => matches!(before, b'K' | b'R') && after != b'P',
            Self::TrypsinP => matches!(before, b'K' | b'R'),
            Self::LysC => before == b'K' && after != b'P',
            Self::PepsinA => matches!(before, b'F' | b'L') && after != b'P',
            Self::Chymotrypsin => matches!(before, b'F' | b'W' | b'Y' | b'L') && after != b'P',
            Self::Custom(_, rule) => rule(sequence, position),
        }
    }

    /// All positions in the sequence where this protease cuts, only positions strictly inside
    /// the sequence are reported
    pub fn match_locations(&self, sequence: &[u8]) -> Vec<usize> {
        (1..sequence.len())
            .filter(|position| self.cuts(sequence, *position))
            .collect_vec()
    }
}

/// Trypsin with the exceptions from the ExPASy PeptideCutter rules. The exceptions need the
/// residue before the bond's n terminal residue, near the start of the sequence only the
/// general rule applies.
fn trypsin(sequence: &[u8], position: usize) -> bool {
    let c1 = sequence[position - 1];
    let c2 = sequence[position];
    let cleave = matches!(c1, b'K' | b'R') && c2 != b'P';
    if position < 2 {
        return cleave;
    }
    let c0 = sequence[position - 2];
    if cleave {
        match c1 {
            b'K' => {
                !((matches!(c0, b'C' | b'D') && c2 == b'D')
                    || (c0 == b'C' && matches!(c2, b'H' | b'Y')))
            }
            _ => !((c0 == b'C' && c2 == b'K') || (c0 == b'R' && matches!(c2, b'H' | b'R'))),
        }
    } else {
        c2 == b'P' && ((c0 == b'W' && c1 == b'K') || (c0 == b'M' && c1 == b'R'))
    }
}

impl std::fmt::Debug for Protease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom(name, _) => f.debug_tuple("Custom").field(name).finish(),
            named => write!(f, "{}", named.name()),
        }
    }
}

impl PartialEq for Protease {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a_name, a_rule), Self::Custom(b_name, b_rule)) => {
                a_name == b_name && Arc::ptr_eq(a_rule, b_rule)
            }
            (Self::Custom(..), _) | (_, Self::Custom(..)) => false,
            (a, b) => a.name() == b.name(),
        }
    }
}

impl Display for Protease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Protease {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::named(s)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    struct CutSiteTestCase {
        sequence: &'static str,
        expected_cut_sites: Vec<usize>,
    }

    fn test_protease(protease: &Protease, test_cases: &[CutSiteTestCase]) {
        for test_case in test_cases {
            let cut_sites = protease.match_locations(test_case.sequence.as_bytes());
            assert_eq!(
                cut_sites, test_case.expected_cut_sites,
                "Incorrect cut sites for {protease} in '{}': found '{cut_sites:?}' expected '{:?}'",
                test_case.sequence, test_case.expected_cut_sites
            );
        }
    }

    #[test]
    fn named() {
        assert_eq!(Protease::named("trypsin").unwrap(), Protease::Trypsin);
        assert_eq!(Protease::named("TRYPSIN/P").unwrap(), Protease::TrypsinP);
        assert_eq!("lys_c".parse::<Protease>().unwrap(), Protease::LysC);
        assert!(Protease::named("trapsin").is_err());
        assert!(Protease::named("").is_err());
        for protease in Protease::ALL {
            assert_eq!(&Protease::named(protease.name()).unwrap(), protease);
            assert_eq!(
                &protease.to_string().to_ascii_uppercase().parse::<Protease>().unwrap(),
                protease
            );
        }
    }

    #[test]
    fn trypsin_simple() {
        test_protease(
            &Protease::TrypsinSimple,
            &[
                CutSiteTestCase {
                    sequence: "AKRPGKR",
                    expected_cut_sites: vec![2, 6],
                },
                CutSiteTestCase {
                    sequence: "ARAKGCVLRPKDGR",
                    expected_cut_sites: vec![2, 4, 11],
                },
                CutSiteTestCase {
                    sequence: "CKDWKP",
                    expected_cut_sites: vec![2],
                },
            ],
        );
    }

    #[test]
    fn trypsin_exceptions() {
        test_protease(
            &Protease::Trypsin,
            &[
                // C/D K D, C K H, C K Y
                CutSiteTestCase {
                    sequence: "ACKDADKDACKHACKYA",
                    expected_cut_sites: vec![],
                },
                // C R K, R R H, R R R
                CutSiteTestCase {
                    sequence: "ACRKARRHA",
                    expected_cut_sites: vec![4, 6],
                },
                // W K P and M R P cut anyway
                CutSiteTestCase {
                    sequence: "AWKPAMRPAKPA",
                    expected_cut_sites: vec![3, 7],
                },
                // No residue before the bond, only the general rule applies
                CutSiteTestCase {
                    sequence: "KDA",
                    expected_cut_sites: vec![1],
                },
            ],
        );
    }

    #[test]
    fn trypsin_p() {
        test_protease(
            &Protease::TrypsinP,
            &[CutSiteTestCase {
                sequence: "AKPRPA",
                expected_cut_sites: vec![2, 4],
            }],
        );
    }

    #[test]
    fn lysc() {
        test_protease(
            &Protease::LysC,
            &[
                CutSiteTestCase {
                    sequence: "FARKDPGLF",
                    expected_cut_sites: vec![4],
                },
                CutSiteTestCase {
                    sequence: "PFKDLTKPMSR",
                    expected_cut_sites: vec![3],
                },
            ],
        );
    }

    #[test]
    fn pepsin() {
        test_protease(
            &Protease::PepsinA,
            &[CutSiteTestCase {
                sequence: "AACVFLPAKLWRF",
                expected_cut_sites: vec![5, 10],
            }],
        );
    }

    #[test]
    fn chymotrypsin() {
        test_protease(
            &Protease::Chymotrypsin,
            &[
                CutSiteTestCase {
                    sequence: "AFWYPLGF",
                    expected_cut_sites: vec![2, 3, 6],
                },
                CutSiteTestCase {
                    sequence: "AVFUDGWTYPMSR",
                    expected_cut_sites: vec![3, 7],
                },
            ],
        );
    }

    #[test]
    fn custom() {
        let argc = Protease::custom("ArgC", |sequence, position| sequence[position - 1] == b'R');
        assert_eq!(argc.name(), "ArgC");
        assert_eq!(argc, argc.clone());
        assert_ne!(argc, Protease::custom("ArgC", |_, _| true));
        test_protease(
            &argc,
            &[CutSiteTestCase {
                sequence: "ARPRK",
                expected_cut_sites: vec![2, 4],
            }],
        );
    }

    #[test]
    fn out_of_bounds() {
        for protease in Protease::ALL {
            assert!(!protease.cuts(b"", 0));
            assert!(!protease.cuts(b"K", 0));
            assert!(!protease.cuts(b"K", 1));
            assert!(!protease.cuts(b"KA", 5));
        }
    }
}
