use bitvec::prelude::*;
use std::path::Path;

use super::constants::*;
use super::encoder::encode_parity;
use super::error::DecodeError;
use super::hit::{from_wire_order, Hit, HitSet};
use super::packet::Packet;

/// A packet after decoding, with everything recovered from its text
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacket {
    pub hits: HitSet,
    pub region: u32,
    pub bcid: Option<u32>,
    pub parity: ParityCheck,
}

/// The parity field as received next to the one the recovered channels imply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityCheck {
    pub received: String,
    pub expected: String,
}

impl ParityCheck {
    pub fn is_consistent(&self) -> bool {
        self.received == self.expected
    }
}

/// One `<8 hex> <region>` line of a packet stream
struct PacketLine {
    word: String,
    region: u32,
}

fn parse_line(line_number: usize, line: &str) -> Result<PacketLine, DecodeError> {
    let malformed = || DecodeError::MalformedLine(line_number, line.to_string());
    let mut parts = line.split_whitespace();
    let (word, region) = match (parts.next(), parts.next(), parts.next()) {
        (Some(word), Some(region), None) => (word, region),
        _ => return Err(malformed()),
    };
    if word.len() != WORD_DIGITS || !word.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    let region: u32 = region.parse().map_err(|_| malformed())?;
    Ok(PacketLine {
        word: word.to_ascii_uppercase(),
        region,
    })
}

/// Cut the fields out of the four words at their fixed offsets.
///
/// ```text
/// word 0: header[0:8]
/// word 1: error[0:2]   hitmap[0:6]
/// word 2: hitmap[6:8]  parity[0:2]  artdata[0:4]
/// word 3: artdata[4:12]
/// ```
fn packet_from_words(words: &[String], region: u32) -> Packet {
    Packet {
        header: words[0].clone(),
        error: words[1][0..2].to_string(),
        hitmap: format!("{}{}", &words[1][2..8], &words[2][0..2]),
        parity: words[2][2..4].to_string(),
        artdata: format!("{}{}", &words[2][4..8], &words[3]),
        region,
    }
}

/// Split a packet stream into packets.
///
/// Blank lines and the sentinel line are skipped. The region of a packet is
/// the tag on its first line.
pub fn parse_packets(text: &str) -> Result<Vec<Packet>, DecodeError> {
    let mut packets: Vec<Packet> = Vec::new();
    let mut words: Vec<String> = Vec::with_capacity(WORDS_PER_PACKET);
    let mut region: u32 = 0;
    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line == SENTINEL_LINE {
            continue;
        }
        let parsed = parse_line(idx + 1, line)?;
        if words.is_empty() {
            region = parsed.region;
        }
        words.push(parsed.word);
        if words.len() == WORDS_PER_PACKET {
            packets.push(packet_from_words(&words, region));
            words.clear();
        }
    }

    if !words.is_empty() {
        return Err(DecodeError::IncompletePacket(words.len()));
    }
    Ok(packets)
}

/// Read every packet in a file. The whole file is read before parsing.
pub fn read_packet_file(path: &Path) -> Result<Vec<Packet>, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::BadFilePath(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_packets(&text)
}

/// Read the first packet in a file
pub fn read_first_packet(path: &Path) -> Result<Packet, DecodeError> {
    let mut packets = read_packet_file(path)?;
    if packets.len() > 1 {
        log::warn!(
            "File {} holds {} packets; only the first is used",
            path.to_string_lossy(),
            packets.len()
        );
    }
    if packets.is_empty() {
        Err(DecodeError::NoPacket)
    } else {
        Ok(packets.swap_remove(0))
    }
}

fn hex_nibbles(field: &str, width: usize) -> Result<Vec<u8>, DecodeError> {
    if field.len() != width {
        return Err(DecodeError::BadField(field.to_string()));
    }
    field
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| DecodeError::BadField(field.to_string()))
}

/// Recover the (plane, chip) pairs marked in a hitmap field, ascending
pub fn decode_hitmap(field: &str) -> Result<Vec<(u8, u8)>, DecodeError> {
    let mut bits: BitVec<u8, Msb0> = BitVec::with_capacity(HITMAP_DIGITS * 4);
    for nibble in hex_nibbles(field, HITMAP_DIGITS)? {
        bits.extend_from_bitslice(&nibble.view_bits::<Msb0>()[4..]);
    }

    let per_plane = CHIPS_PER_PLANE as usize;
    let mut plane_chips: Vec<(u8, u8)> = bits
        .iter_ones()
        .map(|idx| {
            let plane = NUMBER_OF_PLANES - 1 - (idx / per_plane) as u8;
            let chip = CHIPS_PER_PLANE - 1 - (idx % per_plane) as u8;
            (plane, chip)
        })
        .collect();
    plane_chips.sort();
    Ok(plane_chips)
}

/// Recover the channels of an ART data field, in canonical order.
///
/// Leading all-zero nibbles are alignment padding and are dropped before the
/// remaining bits are split into 6 bit groups (left padded to a whole group).
/// If every nibble is zero nothing is dropped.
pub fn decode_artdata(field: &str) -> Result<Vec<u8>, DecodeError> {
    let nibbles = hex_nibbles(field, ARTDATA_DIGITS)?;
    let start = if nibbles[0] == 0 {
        nibbles.iter().position(|n| *n != 0).unwrap_or(0)
    } else {
        0
    };

    let mut data: BitVec<u8, Msb0> = BitVec::with_capacity((nibbles.len() - start) * 4);
    for nibble in &nibbles[start..] {
        data.extend_from_bitslice(&nibble.view_bits::<Msb0>()[4..]);
    }
    let pad = (ART_CHANNEL_BITS - data.len() % ART_CHANNEL_BITS) % ART_CHANNEL_BITS;
    let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, pad);
    bits.extend_from_bitslice(&data);

    let wire: Vec<u8> = bits
        .chunks_exact(ART_CHANNEL_BITS)
        .map(|group| group.load_be::<u8>())
        .collect();
    Ok(from_wire_order(wire))
}

/// Settle a disagreement between the hitmap count and the ART data count.
///
/// A hit on channel 0 at the head of the wire order looks exactly like
/// alignment padding, so the ART decode can come up short (or, for an all zero
/// field, long). When the field holds nothing above the bits the hitmap
/// accounts for, the hitmap count decides. Anything else is a corrupt packet.
fn align_to_hit_count(
    field: &str,
    hit_count: usize,
    channels: Vec<u8>,
) -> Result<Vec<u8>, DecodeError> {
    if channels.len() == hit_count {
        return Ok(channels);
    }
    let value = u64::from_str_radix(field, 16).map_err(|_| DecodeError::BadField(field.to_string()))?;
    if hit_count <= ART_DATA_CAPACITY && value >> (ART_CHANNEL_BITS * hit_count) == 0 {
        log::debug!(
            "ART data {field} decoded to {} channels; reading {hit_count} to match the hitmap",
            channels.len()
        );
        return Ok((0..hit_count)
            .map(|k| ((value >> (ART_CHANNEL_BITS * k)) & ART_CHANNEL_MASK) as u8)
            .collect());
    }
    Err(DecodeError::LengthMismatch(hit_count, channels.len()))
}

/// Recover the HitSet carried by a packet
pub fn decode_hits(packet: &Packet) -> Result<HitSet, DecodeError> {
    let plane_chips = decode_hitmap(&packet.hitmap)?;
    let channels = decode_artdata(&packet.artdata)?;
    let channels = align_to_hit_count(&packet.artdata, plane_chips.len(), channels)?;

    let hits = plane_chips
        .iter()
        .zip(channels)
        .map(|((plane, chip), channel)| Hit::new(*plane, *chip, channel as u32))
        .collect::<Result<Vec<Hit>, _>>()?;
    Ok(HitSet::new(hits))
}

/// Decode a packet, including its BCID and a parity cross-check
pub fn decode_packet(packet: &Packet) -> Result<DecodedPacket, DecodeError> {
    let hits = decode_hits(packet)?;
    let parity = ParityCheck {
        received: packet.parity.clone(),
        expected: encode_parity(&hits),
    };
    if !parity.is_consistent() {
        log::warn!(
            "Parity {} of region {} packet does not match {} computed from channels {:?}",
            parity.received,
            packet.region,
            parity.expected,
            hits.channels()
        );
    }
    let bcid = packet.bcid();
    if bcid.is_none() {
        log::warn!("Packet header {} does not carry a BCID", packet.header);
    }
    Ok(DecodedPacket {
        hits,
        region: packet.region,
        bcid,
        parity,
    })
}

//Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, encode_lists};

    const REFERENCE: &str = "0000A020 20\n00804020 20\n11000000 20\n0D204081 20\n00000001 01";

    #[test]
    fn test_reference_stream() {
        let packets = match parse_packets(REFERENCE) {
            Ok(p) => p,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(packets.len(), 1);
        let packet = &packets[0];
        assert_eq!(packet.hitmap, "80402011");
        assert_eq!(packet.artdata, "00000D204081");
        assert_eq!(packet.region, 20);

        let decoded = decode_packet(packet).unwrap();
        assert_eq!(decoded.hits.decimal_ids(), vec![0.0, 0.4, 1.5, 2.6, 3.7]);
        assert_eq!(decoded.hits.channels(), vec![1, 2, 4, 8, 13]);
        assert_eq!(decoded.bcid, Some(32));
        assert!(decoded.parity.is_consistent());
    }

    #[test]
    fn test_region_is_the_whole_tag() {
        // the tag after the word is the region, whatever its width
        let text = "0000A020 120\n00804020 120\n11000000 120\n0D204081 120\n";
        let packets = parse_packets(text).unwrap();
        assert_eq!(packets[0].region, 120);
        assert_eq!(packets[0].hitmap, "80402011");

        let packet = encode_lists(&[0.2], &[5], 32, 7).unwrap();
        assert_eq!(parse_packets(&packet.to_text()).unwrap()[0].region, 7);
    }

    #[test]
    fn test_hitmap_fixture() {
        let packet = encode_lists(&[0.2, 2.1], &[10, 12], 32, 20).unwrap();
        assert_eq!(packet.hitmap, "00020004");
        assert_eq!(decode_hitmap(&packet.hitmap).unwrap(), vec![(0, 2), (2, 1)]);
        let hits = decode_hits(&packet).unwrap();
        assert_eq!(hits, HitSet::from_parallel(&[0.2, 2.1], &[10, 12]).unwrap());
    }

    #[test]
    fn test_decode_artdata() {
        assert_eq!(decode_artdata("00000D204081").unwrap(), vec![1, 2, 4, 8, 13]);
        assert_eq!(decode_artdata("00000000030a").unwrap(), vec![10, 12]);
        // nothing to skip when every nibble is zero
        assert_eq!(decode_artdata("000000000000").unwrap(), vec![0; 8]);
    }

    #[test]
    fn test_lowercase_stream() {
        let text = REFERENCE.to_lowercase();
        let packets = parse_packets(&text).unwrap();
        assert_eq!(packets[0].header, "0000A020");
        assert_eq!(decode_hits(&packets[0]).unwrap().len(), 5);
    }

    #[test]
    fn test_round_trip() {
        let cases: Vec<(Vec<f64>, Vec<u32>)> = vec![
            (vec![3.7], vec![63]),
            (vec![2.2, 0.1, 1.5], vec![17, 40, 0]),
            (vec![0.0, 1.0, 2.0, 3.0], vec![0, 0, 0, 0]),
            (
                vec![3.7, 3.6, 2.5, 2.4, 1.3, 1.2, 0.1, 0.0],
                vec![1, 2, 3, 4, 5, 6, 7, 8],
            ),
            (
                vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
                vec![63, 0, 31, 32, 1, 62, 2, 0],
            ),
            (vec![], vec![]),
        ];
        for (ids, channels) in cases {
            let intended = HitSet::from_parallel(&ids, &channels).unwrap();
            let packet = encode(&intended, 100, 21).unwrap();
            let text = packet.to_text();
            let recovered = decode_hits(&parse_packets(&text).unwrap()[0]).unwrap();
            assert_eq!(recovered, intended, "round trip of {intended}");
        }
    }

    #[test]
    fn test_leading_zero_channel() {
        // wire order puts channel 0 first, which reads like padding
        let packet = encode_lists(&[0.1, 1.0], &[5, 0], 32, 20).unwrap();
        assert_eq!(packet.artdata, "000000000005");
        assert_eq!(decode_artdata(&packet.artdata).unwrap(), vec![5]);
        assert_eq!(decode_hits(&packet).unwrap().channels(), vec![5, 0]);
    }

    #[test]
    fn test_corrupt_length_mismatch() {
        let mut packet = encode_lists(&[0.1, 1.0], &[1, 1], 32, 20).unwrap();
        packet.artdata = String::from("000000001041");
        match decode_hits(&packet) {
            Err(DecodeError::LengthMismatch(2, 3)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines() {
        match parse_packets("0000A020 20\n0080402 20\n") {
            Err(DecodeError::MalformedLine(2, _)) => (),
            other => panic!("unexpected result {other:?}"),
        }
        match parse_packets("0000A020\n") {
            Err(DecodeError::MalformedLine(1, _)) => (),
            other => panic!("unexpected result {other:?}"),
        }
        match parse_packets("0000A020 20\n00804020 20\n") {
            Err(DecodeError::IncompletePacket(2)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_multiple_packets() {
        let first = encode_lists(&[0.0], &[3], 32, 20).unwrap();
        let second = encode_lists(&[1.1], &[4], 64, 21).unwrap();
        let text = format!("{}{}{}", first.to_text(), second.to_text(), SENTINEL_LINE);
        let packets = parse_packets(&text).unwrap();
        assert_eq!(packets, vec![first, second]);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let packets = parse_packets(REFERENCE).unwrap();
        let a = decode_packet(&packets[0]).unwrap();
        let b = decode_packet(&packets[0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parity_mismatch_is_reported() {
        let mut packet = encode_lists(&[0.2, 2.1], &[10, 12], 32, 20).unwrap();
        packet.parity = String::from("00");
        let decoded = decode_packet(&packet).unwrap();
        assert!(!decoded.parity.is_consistent());
        assert_eq!(decoded.parity.expected, "03");
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join("libgbt_packet_decoder_test").join("packet.txt");
        let packet = encode_lists(&[0.2, 1.0, 3.3], &[9, 18, 27], 4000, 22).unwrap();
        packet.write_file(&path, true).unwrap();
        let read = read_first_packet(&path).unwrap();
        assert_eq!(read, packet);
        std::fs::remove_file(&path).unwrap();

        match read_packet_file(&path) {
            Err(DecodeError::BadFilePath(_)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
