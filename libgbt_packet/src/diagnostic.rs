use bit_set::BitSet;
use std::fmt;

use super::checker::check;
use super::constants::NUMBER_OF_PLANES;
use super::decoder::decode_hits;
use super::error::CheckError;
use super::fiber_map::{fiber_for_slot, FiberLabel};
use super::hit::{Hit, HitSet};
use super::packet::Packet;

/// One side of a suspected fiber swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCandidate {
    pub index: usize,
    pub intended: Hit,
    pub recovered: Hit,
    pub fiber: FiberLabel,
}

/// Terminal verdicts of the fiber swap diagnosis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    /// Intended and recovered hits agree
    NoInvestigationNeeded,
    /// The recovered channels or chips are not a rearrangement of the intended ones
    NotFiberSwap,
    /// Exactly two hits moved. If any plane carries more than one hit the
    /// candidates must be checked against those planes before concluding.
    SwapCandidates {
        candidates: [SwapCandidate; 2],
        multiple_hit_planes: BitSet,
    },
    /// More (or fewer) hits moved than a single pairwise swap explains
    Inconclusive { mismatched: Vec<usize> },
    /// Two hits moved, but at least one sits past the region's four fiber slots
    BeyondFiberTable { mismatched: Vec<usize> },
}

impl Diagnosis {
    /// The two suspected fibers, if the diagnosis names any
    pub fn suspected_fibers(&self) -> Option<[FiberLabel; 2]> {
        match self {
            Self::SwapCandidates { candidates, .. } => {
                Some([candidates[0].fiber, candidates[1].fiber])
            }
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        match self {
            Self::SwapCandidates {
                multiple_hit_planes,
                ..
            } => !multiple_hit_planes.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInvestigationNeeded => write!(
                f,
                "Intended hits and hits read match up so no need for further investigation"
            ),
            Self::NotFiberSwap => write!(
                f,
                "Not possible that fibers are misconnected although the hits read don't match up; find the cause elsewhere"
            ),
            Self::SwapCandidates {
                candidates,
                multiple_hit_planes,
            } => {
                write!(
                    f,
                    "Fibers {} and {} are possible candidates of being swapped",
                    candidates[0].fiber, candidates[1].fiber
                )?;
                if !multiple_hit_planes.is_empty() {
                    let planes: Vec<String> =
                        multiple_hit_planes.iter().map(|p| p.to_string()).collect();
                    write!(
                        f,
                        "; planes [{}] have multiple hits and need to be checked before concluding",
                        planes.join(", ")
                    )?;
                }
                Ok(())
            }
            Self::Inconclusive { mismatched } if mismatched.len() < 2 => write!(
                f,
                "Only hit {mismatched:?} doesn't match up; no pairwise fiber swap explains it"
            ),
            Self::Inconclusive { mismatched } => write!(
                f,
                "Hits {mismatched:?} don't match up; more than two planes are possible candidates of misconnected fibers"
            ),
            Self::BeyondFiberTable { mismatched } => write!(
                f,
                "Hits {mismatched:?} don't match up, but the region only labels {slots} fiber slots; no candidates can be named",
                slots = NUMBER_OF_PLANES
            ),
        }
    }
}

/// Planes with more than one hit
pub fn multiple_hit_planes(hits: &HitSet) -> BitSet {
    hits.plane_multiplicity()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(plane, _)| plane as usize)
        .collect()
}

fn sorted<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort();
    values
}

/// Decide whether a mismatch between intended and recovered hits is explained
/// by two fibers of a region being swapped.
///
/// Candidates are aligned by index in canonical order and named by the fiber
/// slot at that index. Index alignment cannot tell which of several hits on
/// one plane moved; such results are flagged, not trusted.
pub fn diagnose(intended: &HitSet, recovered: &HitSet, region: u32) -> Diagnosis {
    log::info!("Expected hits {intended}, packet hits {recovered} in region {region}");
    let diagnosis = diagnose_quiet(intended, recovered, region);
    match &diagnosis {
        Diagnosis::NoInvestigationNeeded => log::info!("{diagnosis}"),
        _ => log::warn!("{diagnosis}"),
    }
    diagnosis
}

fn diagnose_quiet(intended: &HitSet, recovered: &HitSet, region: u32) -> Diagnosis {
    if check(intended, recovered).matched {
        return Diagnosis::NoInvestigationNeeded;
    }

    let same_channels = sorted(intended.channels()) == sorted(recovered.channels());
    let same_chips = sorted(intended.iter().map(|hit| hit.chip).collect::<Vec<u8>>())
        == sorted(recovered.iter().map(|hit| hit.chip).collect::<Vec<u8>>());
    if !same_channels || !same_chips {
        return Diagnosis::NotFiberSwap;
    }

    // Equal multisets mean equal lengths from here on
    let mismatched: Vec<usize> = intended
        .iter()
        .zip(recovered.iter())
        .enumerate()
        .filter(|(_, (want, got))| want != got)
        .map(|(idx, _)| idx)
        .collect();
    log::debug!(
        "{} hits matched, {} mismatched",
        intended.len() - mismatched.len(),
        mismatched.len()
    );

    if mismatched.len() != 2 {
        return if mismatched.is_empty() {
            Diagnosis::NoInvestigationNeeded
        } else {
            Diagnosis::Inconclusive { mismatched }
        };
    }

    let candidate = |idx: usize| {
        fiber_for_slot(region, idx).map(|fiber| SwapCandidate {
            index: idx,
            intended: intended.hits()[idx],
            recovered: recovered.hits()[idx],
            fiber,
        })
    };
    match (candidate(mismatched[0]), candidate(mismatched[1])) {
        (Some(first), Some(second)) => Diagnosis::SwapCandidates {
            candidates: [first, second],
            multiple_hit_planes: multiple_hit_planes(intended),
        },
        _ => Diagnosis::BeyondFiberTable { mismatched },
    }
}

/// Decode a packet and diagnose it against the intended hits, using the packet's region
pub fn diagnose_packet(packet: &Packet, intended: &HitSet) -> Result<Diagnosis, CheckError> {
    let recovered = decode_hits(packet)?;
    Ok(diagnose(intended, &recovered, packet.region))
}

//Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    fn set(ids: &[f64], channels: &[u32]) -> HitSet {
        HitSet::from_parallel(ids, channels).unwrap()
    }

    #[test]
    fn test_match_needs_no_investigation() {
        let hits = set(&[0.2, 1.0, 1.2, 2.2, 3.2], &[10, 10, 12, 11, 10]);
        assert_eq!(diagnose(&hits, &hits, 20), Diagnosis::NoInvestigationNeeded);
    }

    #[test]
    fn test_swap_with_multiple_hit_plane() {
        let intended = set(&[0.2, 1.0, 1.2, 2.2, 3.2], &[10, 10, 12, 11, 10]);
        let recovered = set(&[0.2, 1.0, 1.2, 2.2, 3.2], &[10, 10, 11, 12, 10]);
        let diagnosis = diagnose(&intended, &recovered, 20);
        match &diagnosis {
            Diagnosis::SwapCandidates {
                candidates,
                multiple_hit_planes,
            } => {
                assert_eq!(candidates[0].index, 2);
                assert_eq!(candidates[1].index, 3);
                assert_eq!(multiple_hit_planes.iter().collect::<Vec<usize>>(), vec![1]);
            }
            other => panic!("unexpected diagnosis {other:?}"),
        }
        // slots 2 and 3 of the even table
        assert_eq!(
            diagnosis.suspected_fibers(),
            Some([FiberLabel::U0, FiberLabel::V0])
        );
        assert!(diagnosis.is_ambiguous());
    }

    #[test]
    fn test_labels_follow_index_not_plane() {
        // two hits on planes 1 and 3 sit at indices 0 and 1
        let intended = set(&[1.2, 3.5], &[7, 9]);
        let recovered = set(&[1.5, 3.2], &[9, 7]);
        let diagnosis = diagnose(&intended, &recovered, 20);
        assert_eq!(
            diagnosis.suspected_fibers(),
            Some([FiberLabel::X0, FiberLabel::X1])
        );
        assert!(!diagnosis.is_ambiguous());
    }

    #[test]
    fn test_swap_past_fiber_table() {
        let intended = set(&[0.0, 0.1, 1.0, 2.0, 3.0, 3.1], &[1, 2, 3, 4, 5, 6]);
        let recovered = set(&[0.0, 0.1, 1.0, 2.0, 3.0, 3.1], &[1, 2, 3, 4, 6, 5]);
        let diagnosis = diagnose(&intended, &recovered, 20);
        assert_eq!(
            diagnosis,
            Diagnosis::BeyondFiberTable {
                mismatched: vec![4, 5]
            }
        );
        assert!(diagnosis.suspected_fibers().is_none());

        // one index inside the table is not enough
        let recovered = set(&[0.0, 0.1, 1.0, 2.0, 3.0, 3.1], &[1, 6, 3, 4, 5, 2]);
        assert_eq!(
            diagnose(&intended, &recovered, 21),
            Diagnosis::BeyondFiberTable {
                mismatched: vec![1, 5]
            }
        );
    }

    #[test]
    fn test_clean_swap() {
        // planes 1 and 2 trade their data
        let intended = set(&[0.2, 1.5, 2.3, 3.1], &[1, 2, 3, 4]);
        let recovered = set(&[0.2, 1.3, 2.5, 3.1], &[1, 3, 2, 4]);

        let even = diagnose(&intended, &recovered, 20);
        assert_eq!(even.suspected_fibers(), Some([FiberLabel::X1, FiberLabel::U0]));
        assert!(!even.is_ambiguous());

        let odd = diagnose(&intended, &recovered, 21);
        assert_eq!(odd.suspected_fibers(), Some([FiberLabel::V1, FiberLabel::X0]));
        assert_eq!(
            odd.to_string(),
            "Fibers v1 and x0 are possible candidates of being swapped"
        );
    }

    #[test]
    fn test_not_a_fiber_swap() {
        let intended = set(&[0.2, 1.5, 2.3, 3.1], &[1, 2, 3, 4]);
        // a channel value that was never sent
        let recovered = set(&[0.2, 1.5, 2.3, 3.1], &[1, 2, 3, 5]);
        assert_eq!(diagnose(&intended, &recovered, 20), Diagnosis::NotFiberSwap);
        // a chip that was never hit
        let recovered = set(&[0.2, 1.5, 2.3, 3.6], &[1, 2, 3, 4]);
        assert_eq!(diagnose(&intended, &recovered, 20), Diagnosis::NotFiberSwap);
        // a hit went missing
        let recovered = set(&[0.2, 1.5, 2.3], &[1, 2, 3]);
        assert_eq!(diagnose(&intended, &recovered, 20), Diagnosis::NotFiberSwap);
    }

    #[test]
    fn test_rotation_is_inconclusive() {
        let intended = set(&[0.2, 1.5, 2.3, 3.1], &[1, 2, 3, 4]);
        let recovered = set(&[0.2, 1.1, 2.5, 3.3], &[1, 4, 2, 3]);
        assert_eq!(
            diagnose(&intended, &recovered, 20),
            Diagnosis::Inconclusive {
                mismatched: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn test_single_moved_hit_is_inconclusive() {
        let intended = set(&[0.2], &[5]);
        let recovered = set(&[1.2], &[5]);
        let diagnosis = diagnose(&intended, &recovered, 20);
        assert_eq!(diagnosis, Diagnosis::Inconclusive { mismatched: vec![0] });
        assert!(diagnosis.suspected_fibers().is_none());
    }

    #[test]
    fn test_diagnose_packet_uses_packet_region() {
        let intended = set(&[0.2, 1.5, 2.3, 3.1], &[1, 2, 3, 4]);
        let swapped = set(&[0.2, 1.3, 2.5, 3.1], &[1, 3, 2, 4]);
        let packet = encode(&swapped, 64, 23).unwrap();
        let diagnosis = diagnose_packet(&packet, &intended).unwrap();
        assert_eq!(
            diagnosis.suspected_fibers(),
            Some([FiberLabel::V1, FiberLabel::X0])
        );
    }
}
