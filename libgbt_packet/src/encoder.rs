use bitvec::prelude::*;

use super::constants::*;
use super::error::EncodeError;
use super::hit::{to_wire_order, Hit, HitSet};
use super::packet::Packet;

/// Position of a (plane, chip) bit in the hitmap.
///
/// Rows run plane 3 to plane 0 and columns chip 7 to chip 0, so the most
/// significant bit is plane 3 chip 7.
pub fn hitmap_index(plane: u8, chip: u8) -> usize {
    (NUMBER_OF_PLANES - 1 - plane) as usize * CHIPS_PER_PLANE as usize
        + (CHIPS_PER_PLANE - 1 - chip) as usize
}

/// Build the 8 digit hitmap field: one bit per plane x chip with a hit
pub fn encode_hitmap(hits: &HitSet) -> String {
    let mut grid: BitArray<u32, Msb0> = BitArray::new(0);
    for hit in hits {
        grid.set(hitmap_index(hit.plane, hit.chip), true);
    }
    format!("{:0width$X}", grid.into_inner(), width = HITMAP_DIGITS)
}

/// Build the 12 digit ART data field: 6 bit channel codes in wire order
pub fn encode_artdata(hits: &HitSet) -> String {
    let mut bits: BitVec<u64, Msb0> = BitVec::with_capacity(ART_DATA_CAPACITY * ART_CHANNEL_BITS);
    for channel in to_wire_order(&hits.channels()) {
        bits.extend_from_bitslice(&channel.view_bits::<Msb0>()[8 - ART_CHANNEL_BITS..]);
    }
    let value: u64 = if bits.is_empty() { 0 } else { bits.load_be() };
    format!("{:0width$X}", value, width = ARTDATA_DIGITS)
}

/// 1 if the channel has an even number of set bits
pub fn channel_parity(channel: u8) -> u8 {
    (channel.count_ones() % 2 == 0) as u8
}

/// Build the 2 digit parity field: one bit per hit, in the same wire order as ART data
pub fn encode_parity(hits: &HitSet) -> String {
    let value = to_wire_order(&hits.channels())
        .into_iter()
        .fold(0u32, |acc, channel| (acc << 1) | channel_parity(channel) as u32);
    format!("{:0width$X}", value, width = PARITY_DIGITS)
}

/// The header field: constant prefix and a 3 digit BCID
pub fn encode_header(bcid: u32) -> Result<String, EncodeError> {
    if bcid > MAX_BCID {
        return Err(EncodeError::BcidOutOfRange(bcid));
    }
    Ok(format!("{HEADER_PREFIX}{bcid:03X}"))
}

/// Make sure every hit survives the trip into the fixed size fields.
///
/// The hitmap can only mark a plane+chip once, and the ART data only holds
/// eight channels; either limit would silently lose a hit.
fn check_capacity(hits: &HitSet) -> Result<(), EncodeError> {
    if hits.len() > ART_DATA_CAPACITY {
        return Err(EncodeError::ExceedsArtDataCapacity(hits.len()));
    }
    // Canonical order puts duplicates next to each other
    if let Some(pair) = hits
        .hits()
        .windows(2)
        .find(|pair| pair[0].plane_chip() == pair[1].plane_chip())
    {
        return Err(EncodeError::DuplicateHit(pair[0].plane, pair[0].chip));
    }
    Ok(())
}

/// Encode a HitSet into a Packet for a given BCID and region.
///
/// Nothing is produced if any field cannot hold the input.
pub fn encode(hits: &HitSet, bcid: u32, region: u32) -> Result<Packet, EncodeError> {
    let header = encode_header(bcid)?;
    check_capacity(hits)?;

    let packet = Packet {
        header,
        error: String::from(ERROR_FIELD),
        hitmap: encode_hitmap(hits),
        parity: encode_parity(hits),
        artdata: encode_artdata(hits),
        region,
    };

    let payload = packet.payload();
    if payload.len() % WORD_DIGITS != 0 || payload.len() != PAYLOAD_DIGITS {
        return Err(EncodeError::BadPayloadLength(payload));
    }

    log::debug!("Encoded {hits} as {payload} for region {region}");
    Ok(packet)
}

/// Encode from the parallel plane.chip and channel lists
pub fn encode_lists(
    ids: &[f64],
    channels: &[u32],
    bcid: u32,
    region: u32,
) -> Result<Packet, EncodeError> {
    let hits = HitSet::from_parallel(ids, channels)?;
    encode(&hits, bcid, region)
}

/// Encode a list of hits that may not be sorted yet
pub fn encode_hits(hits: Vec<Hit>, bcid: u32, region: u32) -> Result<Packet, EncodeError> {
    encode(&HitSet::new(hits), bcid, region)
}

//Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketField;

    #[test]
    fn test_reference_packet() {
        let packet = match encode_lists(&[0.0, 0.4, 1.5, 2.6, 3.7], &[1, 2, 4, 8, 13], 32, 20) {
            Ok(p) => p,
            Err(e) => panic!("encode failed: {e}"),
        };
        let fields = packet.fields();
        assert_eq!(fields[&PacketField::Header], "0000A020");
        assert_eq!(fields[&PacketField::Error], "00");
        assert_eq!(fields[&PacketField::HitMap], "80402011");
        assert_eq!(fields[&PacketField::Parity], "00");
        assert_eq!(fields[&PacketField::ArtData], "00000D204081");
        assert_eq!(packet.to_text(), "0000A020 20\n00804020 20\n11000000 20\n0D204081 20\n");
    }

    #[test]
    fn test_unsorted_input_is_co_sorted() {
        let sorted = encode_lists(&[0.0, 0.4, 1.5, 2.6, 3.7], &[1, 2, 4, 8, 13], 32, 20).unwrap();
        let shuffled = encode_lists(&[2.6, 0.4, 3.7, 0.0, 1.5], &[8, 2, 13, 1, 4], 32, 20).unwrap();
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_hitmap_bits() {
        // plane 0 chip 2 and plane 2 chip 1
        let hits = HitSet::from_parallel(&[0.2, 2.1], &[10, 12]).unwrap();
        assert_eq!(encode_hitmap(&hits), "00020004");
        assert_eq!(hitmap_index(3, 7), 0);
        assert_eq!(hitmap_index(0, 0), 31);
    }

    #[test]
    fn test_parity() {
        assert_eq!(channel_parity(0), 1);
        assert_eq!(channel_parity(3), 1);
        assert_eq!(channel_parity(7), 0);
        // wire order is [12, 10]: 12 -> 1, 10 -> 1
        let hits = HitSet::from_parallel(&[0.2, 2.1], &[10, 12]).unwrap();
        assert_eq!(encode_parity(&hits), "03");
        // wire order [7, 3]: 0, 1
        let hits = HitSet::from_parallel(&[0.0, 1.0], &[3, 7]).unwrap();
        assert_eq!(encode_parity(&hits), "01");
    }

    #[test]
    fn test_artdata_wire_order() {
        let hits = HitSet::from_parallel(&[0.2, 2.1], &[10, 12]).unwrap();
        // 001100 001010 -> 0x30A
        assert_eq!(encode_artdata(&hits), "00000000030A");
    }

    #[test]
    fn test_full_capacity() {
        let ids = [0.0, 0.1, 1.0, 1.1, 2.0, 2.1, 3.0, 3.1];
        let channels = [63, 62, 61, 60, 59, 58, 57, 56];
        let packet = encode_lists(&ids, &channels, 4095, 21).unwrap();
        assert_eq!(packet.header, "0000AFFF");
        assert_eq!(packet.artdata.len(), ARTDATA_DIGITS);
        assert_eq!(packet.parity.len(), PARITY_DIGITS);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let ids = [0.0, 0.1, 0.2, 1.0, 1.1, 2.0, 2.1, 3.0, 3.1];
        let channels = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        match encode_lists(&ids, &channels, 32, 20) {
            Err(EncodeError::ExceedsArtDataCapacity(9)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_bcid_out_of_range() {
        match encode_lists(&[0.0], &[1], 4096, 20) {
            Err(EncodeError::BcidOutOfRange(4096)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_plane_chip() {
        match encode_lists(&[1.3, 1.3], &[1, 2], 32, 20) {
            Err(EncodeError::DuplicateHit(1, 3)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
