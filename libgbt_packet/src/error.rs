use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;
use super::status::CaseStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HitError {
    #[error("Invalid plane {0} found in Hit; expected at most {max}", max=NUMBER_OF_PLANES - 1)]
    BadPlane(u8),
    #[error("Invalid chip {0} found in Hit; expected at most {max}", max=CHIPS_PER_PLANE - 1)]
    BadChip(u8),
    #[error("Invalid channel {0} found in Hit; expected at most {max}", max=CHANNELS_PER_CHIP - 1)]
    BadChannel(u32),
    #[error("Value {0} is not a valid plane.chip identifier")]
    BadDecimalId(f64),
    #[error("HitSet was given {0} plane.chip values but {1} channels")]
    LengthMismatch(usize, usize),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("BCID {0} does not fit in the packet header; expected at most {max}", max=MAX_BCID)]
    BcidOutOfRange(u32),
    #[error("Encoder was given {0} hits but ART data holds at most {cap}", cap=ART_DATA_CAPACITY)]
    ExceedsArtDataCapacity(usize),
    #[error("Encoder was given more than one hit on plane {0} chip {1}; the hitmap can only mark one")]
    DuplicateHit(u8, u8),
    #[error("Encoder built a payload whose length is not a multiple of {digits}: {0}", digits=WORD_DIGITS)]
    BadPayloadLength(String),
    #[error("Encoder failed due to Hit error: {0}")]
    HitError(#[from] HitError),
    #[error("Encoder failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Could not read packet because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Decoder failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Malformed packet line {0}: {1:?}")]
    MalformedLine(usize, String),
    #[error("Packet stream ended after {0} of {words} lines", words=WORDS_PER_PACKET)]
    IncompletePacket(usize),
    #[error("Packet stream did not contain any packets")]
    NoPacket,
    #[error("Invalid hex field {0:?} found in packet")]
    BadField(String),
    #[error("Decoded hitmap has {0} hits but ART data has {1} channels; the packet is corrupt")]
    LengthMismatch(usize, usize),
    #[error("Decoder failed due to Hit error: {0}")]
    HitError(#[from] HitError),
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Checker failed due to Hit error: {0}")]
    HitError(#[from] HitError),
    #[error("Checker failed due to Decode error: {0}")]
    DecodeError(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not extract series because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Extractor failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Line {0} does not start with the expected header {1:?}")]
    MissingHeader(usize, String),
    #[error("Line {0} is too short for the configured field offsets")]
    ShortLine(usize),
    #[error("Extractor failed to parse a hex value: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Encode error in case {0}: {1}")]
    EncodeError(usize, EncodeError),
    #[error("Processor failed due to Check error in case {0}: {1}")]
    CheckError(usize, CheckError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<CaseStatus>),
}
