use super::decoder::decode_hits;
use super::error::CheckError;
use super::hit::HitSet;
use super::packet::Packet;

/// The result of comparing the hits a packet was meant to carry against the hits recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub intended: HitSet,
    pub recovered: HitSet,
    pub matched: bool,
}

impl CheckReport {
    pub fn summary(&self) -> String {
        if self.matched {
            format!(
                "Hits read {} match up with intended hits {}",
                self.recovered, self.intended
            )
        } else {
            format!(
                "Hits read {} don't match up with intended hits {}",
                self.recovered, self.intended
            )
        }
    }
}

/// Compare two HitSets element by element in canonical order.
///
/// The recovered set can be a decoded packet or a candidate remapping under test.
pub fn check(intended: &HitSet, recovered: &HitSet) -> CheckReport {
    let report = CheckReport {
        intended: intended.clone(),
        recovered: recovered.clone(),
        matched: intended == recovered,
    };
    if report.matched {
        log::info!("{}", report.summary());
    } else {
        log::warn!("{}", report.summary());
    }
    report
}

/// Compare parallel plane.chip / channel lists.
///
/// Lists of different length on either side are a fatal error.
pub fn check_lists(
    intended_ids: &[f64],
    intended_channels: &[u32],
    recovered_ids: &[f64],
    recovered_channels: &[u32],
) -> Result<bool, CheckError> {
    let intended = HitSet::from_parallel(intended_ids, intended_channels)?;
    let recovered = HitSet::from_parallel(recovered_ids, recovered_channels)?;
    Ok(check(&intended, &recovered).matched)
}

/// Decode a packet and compare it against the intended hits
pub fn check_packet(packet: &Packet, intended: &HitSet) -> Result<CheckReport, CheckError> {
    let recovered = decode_hits(packet)?;
    Ok(check(intended, &recovered))
}
