// Detector geometry
pub const NUMBER_OF_PLANES: u8 = 4;
pub const CHIPS_PER_PLANE: u8 = 8; // VMMs per plane
pub const CHANNELS_PER_CHIP: u32 = 64;

// ART data
pub const ART_CHANNEL_BITS: usize = 6;
pub const ART_DATA_CAPACITY: usize = 8; // 48 bits / 6 bits per channel
pub const ART_CHANNEL_MASK: u64 = 0x3F;

// Packet fields, in hex digits
pub const HEADER_PREFIX: &str = "0000A";
pub const ERROR_FIELD: &str = "00";
pub const MAX_BCID: u32 = 0xFFF;
pub const HEADER_DIGITS: usize = 8;
pub const ERROR_DIGITS: usize = 2;
pub const HITMAP_DIGITS: usize = 8;
pub const PARITY_DIGITS: usize = 2;
pub const ARTDATA_DIGITS: usize = 12;
pub const PAYLOAD_DIGITS: usize =
    HEADER_DIGITS + ERROR_DIGITS + HITMAP_DIGITS + PARITY_DIGITS + ARTDATA_DIGITS;

// Packet text
pub const WORD_DIGITS: usize = 8;
pub const WORDS_PER_PACKET: usize = PAYLOAD_DIGITS / WORD_DIGITS;
pub const SENTINEL_LINE: &str = "00000001 01";
