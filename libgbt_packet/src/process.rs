use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::checker::{check, CheckReport};
use super::config::{CaseConfig, Config, Mode};
use super::decoder::{decode_packet, read_first_packet, DecodedPacket};
use super::diagnostic::{diagnose, Diagnosis};
use super::encoder::encode_lists;
use super::error::{CheckError, EncodeError, ProcessorError};
use super::hit::HitSet;
use super::status::CaseStatus;

/// What running a single case produced
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Encoded(PathBuf),
    Checked(CheckReport),
    Diagnosed(Diagnosis),
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoded(path) => write!(f, "Wrote packet to {}", path.to_string_lossy()),
            Self::Checked(report) => write!(f, "{}", report.summary()),
            Self::Diagnosed(diagnosis) => write!(f, "{diagnosis}"),
        }
    }
}

/// Read back the packet of a case along with the hits it was meant to carry
fn read_case(case: &CaseConfig, path: &Path) -> Result<(HitSet, DecodedPacket), CheckError> {
    let intended = case.intended_hits()?;
    let decoded = decode_packet(&read_first_packet(path)?)?;
    if decoded.region != case.region {
        log::warn!(
            "Packet {} is tagged region {} but the case expects region {}",
            path.to_string_lossy(),
            decoded.region,
            case.region
        );
    }
    Ok((intended, decoded))
}

fn encode_case(config: &Config, case: &CaseConfig) -> Result<PathBuf, EncodeError> {
    let path = config.packet_path(case);
    let packet = encode_lists(&case.hits, &case.channels, case.bcid, case.region)?;
    packet.write_file(&path, config.append_sentinel)?;
    Ok(path)
}

/// Run one case of a job in the job's mode
pub fn process_case(
    config: &Config,
    case: &CaseConfig,
    case_index: usize,
) -> Result<CaseOutcome, ProcessorError> {
    match config.mode {
        Mode::Encode => encode_case(config, case)
            .map(CaseOutcome::Encoded)
            .map_err(|e| ProcessorError::EncodeError(case_index, e)),
        Mode::Check => {
            let (intended, decoded) = read_case(case, &config.packet_path(case))
                .map_err(|e| ProcessorError::CheckError(case_index, e))?;
            Ok(CaseOutcome::Checked(check(&intended, &decoded.hits)))
        }
        Mode::Diagnose => {
            let (intended, decoded) = read_case(case, &config.packet_path(case))
                .map_err(|e| ProcessorError::CheckError(case_index, e))?;
            Ok(CaseOutcome::Diagnosed(diagnose(
                &intended,
                &decoded.hits,
                decoded.region,
            )))
        }
    }
}

/// The main loop of gbt_packet.
///
/// Runs every case of the config in order, sending a status after each one.
/// The first failing case stops the job.
pub fn process(config: Config, tx: Sender<CaseStatus>) -> Result<Vec<CaseOutcome>, ProcessorError> {
    let total = config.cases.len();
    log::info!("Running {total} cases in {:?} mode...", config.mode);
    let mut outcomes = Vec::with_capacity(total);
    for (idx, case) in config.cases.iter().enumerate() {
        log::info!("Processing case {idx} ({})...", case.packet_file.to_string_lossy());
        outcomes.push(process_case(&config, case, idx)?);
        tx.send(CaseStatus::new((idx + 1) as f32 / total as f32, idx))?;
    }
    log::info!("Finished {total} cases.");
    Ok(outcomes)
}
