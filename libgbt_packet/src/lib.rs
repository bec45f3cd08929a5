//! # gbt_packet
//!
//! gbt_packet builds, reads and checks the GBT packets sent by the front end of a
//! four plane micromegas trigger, written in Rust. Given the hits a packet is meant
//! to carry it encodes the packet text, decodes packet text back into hits, compares
//! the two, and when they disagree decides whether two fibers of the region could
//! have been swapped.
//!
//! ## Building & Install
//!
//! To build and install the CLI use `cargo install --path ./gbt_packet_cli` from the
//! top level repository. Once installed it will be in your path; see the CLI section
//! below.
//!
//! ## Hits
//!
//! A hit is a (plane, chip, channel) triple: plane 0-3, chip 0-7 within the plane and
//! channel 0-63 within the chip. Hits are often written in the compact `plane.chip`
//! form, so `2.6` is plane 2 chip 6, paired with a separate list of channels. A set of
//! hits is always kept sorted by (plane, chip), stably, so that hits on the same chip
//! keep the order they were given in.
//!
//! ## Packet Format
//!
//! A packet is 32 hex digits split into five fields:
//!
//! ```text
//! header   8 digits  0000A + 3 digit BCID
//! error    2 digits  always 00
//! hitmap   8 digits  one bit per plane x chip; MSB is plane 3 chip 7
//! parity   2 digits  one bit per hit, 1 when the channel has an even number of set bits
//! artdata 12 digits  6 bit channel numbers, last hit first
//! ```
//!
//! On the wire a packet is four lines of 8 hex digits each followed by the region
//! number, optionally closed by the sentinel line `00000001 01`:
//!
//! ```text
//! 0000A020 20
//! 00804020 20
//! 11000000 20
//! 0D204081 20
//! ```
//!
//! At most eight hits fit in the ART data, and the hitmap can mark each plane and chip
//! once, so inputs with more hits or a repeated plane+chip are rejected rather than
//! truncated.
//!
//! ## Fiber Mapping
//!
//! Each region has four fiber slots. The fiber names depend on the parity of the
//! region:
//!
//! ```text
//! even: x0 x1 u0 v0
//! odd:  u1 v1 x0 x2
//! ```
//!
//! When exactly two hits of a packet moved, the suspected fibers are the slots at the
//! indices of those hits. Hits past the fourth index have no slot to name.
//!
//! ## Configuration
//!
//! Jobs are described by a YAML file:
//!
//! ```yml
//! mode: Encode
//! packet_dir: packets
//! append_sentinel: true
//! cases:
//! - packet_file: case_0.txt
//!   hits: [0.0, 0.4, 1.5, 2.6, 3.7]
//!   channels: [1, 2, 4, 8, 13]
//!   bcid: 32
//!   region: 20
//! ```
//!
//! `mode` is one of `Encode` (write each case's packet into `packet_dir`), `Check`
//! (read each packet back and compare it with the case's hits) or `Diagnose` (check,
//! then look for swapped fibers). A template, set to `Encode`, can be made with
//! `gbt_packet_cli -p <path> new`.
//!
//! ## Simulator Output
//!
//! The [`extract`] module reads simulator output lines (header `A3`, an error code and a
//! run of 4 digit hex values) into per plane series grouped by error code, ready for
//! histogramming elsewhere.
pub mod checker;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod fiber_map;
pub mod hit;
pub mod packet;
pub mod process;
pub mod status;
