/*
    DATfox
    https://github.com/dbalsom/datfox

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! A track (the DDS specification calls it a channel) is everything one
//! swipe of the R-DAT head reads: 8 sub-code blocks, 128 data blocks, 8
//! more sub-code blocks, each 32 payload bytes plus a header byte.
//!
//! There are two heads, negative azimuth (A) and positive azimuth (B), and
//! each reads only the tracks laid down at its own azimuth. Nothing inside
//! a track says which head it came from, yet the higher layers assign
//! meaning by head, so the collector tags tracks with whatever azimuth
//! evidence it has.

pub mod framer;

pub use framer::TrackFramer;

use crate::{
    block::Block,
    ecc::{C1TrackWalk, C2TrackWalk, Codeword, EccStatus},
};

/// Blocks in a track: 0x00-0x7F data, 0x80-0x8F sub-code.
pub const TRACK_BLOCKS: usize = 144;

/// Payload bytes per block.
pub const TRACK_BLOCK_SIZE: usize = 32;

/// Which head a track was read with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackHead {
    /// Negative azimuth head.
    A,
    /// Positive azimuth head.
    B,
    Unknown,
}

impl std::fmt::Display for TrackHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackHead::A => write!(f, "A"),
            TrackHead::B => write!(f, "B"),
            TrackHead::Unknown => write!(f, "?"),
        }
    }
}

pub struct Track {
    head: TrackHead,

    data: [[u8; TRACK_BLOCK_SIZE]; TRACK_BLOCKS],
    data_valid: [[bool; TRACK_BLOCK_SIZE]; TRACK_BLOCKS],
    headers: [u8; TRACK_BLOCKS],
    header_valid: [bool; TRACK_BLOCKS],

    /// Sub-code packs keyed by pack identifier, filled in by `complete()`.
    subcode: [[u8; 7]; 16],
    subcode_valid: [bool; 16],

    /// The pack identifiers seen in the sub-code area and the slots they
    /// occupied, which is useful for fingerprinting the machine that made
    /// the tape.
    signature: [u8; 7],

    control_id: Option<u8>,
    data_id: Option<u8>,

    last_block: Option<u8>,

    c1_errors: usize,
    c1_uncorrectable: usize,
    c2_uncorrectable: usize,
}

impl Track {
    pub fn new(head: TrackHead) -> Self {
        Self {
            head,
            data: [[0; TRACK_BLOCK_SIZE]; TRACK_BLOCKS],
            data_valid: [[false; TRACK_BLOCK_SIZE]; TRACK_BLOCKS],
            headers: [0; TRACK_BLOCKS],
            header_valid: [false; TRACK_BLOCKS],
            subcode: [[0; 7]; 16],
            subcode_valid: [false; 16],
            signature: [0; 7],
            control_id: None,
            data_id: None,
            last_block: None,
            c1_errors: 0,
            c1_uncorrectable: 0,
            c2_uncorrectable: 0,
        }
    }

    pub fn head(&self) -> TrackHead {
        self.head
    }

    pub fn set_head(&mut self, head: TrackHead) {
        self.head = head;
    }

    /// Add a received block to this track.
    pub fn add_block(&mut self, block: &Block) {
        if !block_header_is_valid(block) {
            // The header is shot, but if the previous block was placed and
            // the sequence still has room, odds are good this is simply the
            // next block with a damaged header and an intact payload.
            if let Some(last) = self.last_block {
                if block.len() == 36
                    && (last < 0x7f || (0x88..0x8f).contains(&last) || (0x80..0x88).contains(&last))
                {
                    self.add_guessed_block(last + 1, block);
                    self.last_block = Some(last + 1);
                }
            }
            return;
        }

        self.add_verified_block(block);
    }

    /// The contents of a sub-code pack, if one was correctly received.
    /// Only meaningful after `complete()`.
    pub fn subcode(&self, id: usize) -> Option<&[u8; 7]> {
        if id > 15 || !self.subcode_valid[id] {
            return None;
        }
        Some(&self.subcode[id])
    }

    pub fn subcode_signature(&self) -> &[u8; 7] {
        &self.signature
    }

    pub fn control_id(&self) -> Option<u8> {
        self.control_id
    }

    pub fn data_id(&self) -> Option<u8> {
        self.data_id
    }

    pub fn data(&self) -> &[[u8; TRACK_BLOCK_SIZE]; TRACK_BLOCKS] {
        &self.data
    }

    pub fn data_valid(&self) -> &[[bool; TRACK_BLOCK_SIZE]; TRACK_BLOCKS] {
        &self.data_valid
    }

    pub fn headers(&self) -> &[u8; TRACK_BLOCKS] {
        &self.headers
    }

    pub fn header_valid(&self) -> &[bool; TRACK_BLOCKS] {
        &self.header_valid
    }

    /// C1 vectors that needed any attention at all.
    pub fn c1_errors(&self) -> usize {
        self.c1_errors
    }

    pub fn c1_uncorrectable_errors(&self) -> usize {
        self.c1_uncorrectable
    }

    /// C2 vectors beyond repair. (C2's corrected count equals C1's
    /// uncorrectable count, so it is not tallied twice.)
    pub fn c2_uncorrectable_errors(&self) -> usize {
        self.c2_uncorrectable
    }

    /// The track is complete: run both correction layers, then harvest the
    /// sub-code area. After this the track is read-only.
    pub fn complete(&mut self) {
        let mut c1 = Codeword::c1();
        let mut walk = C1TrackWalk::new(&mut self.data, &mut self.data_valid);
        loop {
            c1.fill(&walk);
            match c1.correct() {
                EccStatus::NoErrors => {}
                EccStatus::Uncorrectable => {
                    self.c1_uncorrectable += 1;
                    self.c1_errors += 1;
                    c1.dump(&mut walk);
                }
                EccStatus::Corrected => {
                    self.c1_errors += 1;
                    c1.dump(&mut walk);
                }
            }
            if !walk.advance() {
                break;
            }
        }

        // C2 runs second, fed by the validity verdicts C1 just wrote back.
        let mut c2 = Codeword::c2();
        let mut walk = C2TrackWalk::new(&mut self.data, &mut self.data_valid);
        loop {
            c2.fill(&walk);
            match c2.correct() {
                EccStatus::NoErrors => {}
                EccStatus::Corrected => {
                    c2.dump(&mut walk);
                }
                EccStatus::Uncorrectable => {
                    // Leave the slice as-is; audio interpolation or DDS C3
                    // get the next try.
                    self.c2_uncorrectable += 1;
                }
            }
            if !walk.advance() {
                break;
            }
        }

        log::debug!(
            "Track::complete(): C1 errors {} ({} uncorrectable), C2 uncorrectable {}",
            self.c1_errors,
            self.c1_uncorrectable,
            self.c2_uncorrectable
        );

        self.extract_subcodes();
    }

    /// Walk the sub-code blocks (0x80-0x8F) and latch the first good copy
    /// of every pack, plus the 7-slot signature and the Control/Data IDs.
    fn extract_subcodes(&mut self) {
        let mut have_slot = [false; 7];

        for i in 0..16usize {
            // Even-numbered sub-code blocks carry four 8-byte items, odd
            // ones three.
            let limit = if i & 1 == 1 { 3 } else { 4 };
            let block_number = 0x80 + i;
            let slot_start = if i & 1 == 1 { 4 } else { 0 };

            if block_number & 1 == 0 && self.control_id.is_none() && self.header_valid[block_number] {
                let header = self.headers[block_number];
                self.control_id = Some((header & 0xf0) >> 4);
                self.data_id = Some(header & 0x0f);
            }

            for j in 0..limit {
                let item = &self.data[block_number][8 * j..8 * j + 8];
                let validity = &self.data_valid[block_number][8 * j..8 * j + 8];

                if !validity[0] {
                    continue;
                }

                let pack_id = ((item[0] & 0xf0) >> 4) as usize;

                if self.subcode_valid[pack_id] && have_slot[slot_start + j] {
                    continue;
                }

                let parity = item.iter().fold(0u8, |acc, &b| acc ^ b);
                let all_valid = validity.iter().all(|&v| v);
                if !all_valid || parity != 0 {
                    continue;
                }

                if !self.subcode_valid[pack_id] {
                    self.subcode[pack_id].copy_from_slice(&item[..7]);
                    self.subcode_valid[pack_id] = true;
                }

                if !have_slot[slot_start + j] {
                    self.signature[slot_start + j] = pack_id as u8;
                    have_slot[slot_start + j] = true;
                }
            }
        }
    }

    fn add_verified_block(&mut self, block: &Block) {
        let bytes = block.bytes();

        let block_number = if bytes[2].value & 0x80 != 0 {
            // Sub-code block, numbered 0x80-0x8F.
            bytes[2].value & 0x8f
        } else {
            bytes[2].value
        };

        self.headers[block_number as usize] = bytes[1].value;
        self.header_valid[block_number as usize] = true;
        self.last_block = Some(block_number);

        self.data_fill(block_number, block);
    }

    fn add_guessed_block(&mut self, block_number: u8, block: &Block) {
        self.header_valid[block_number as usize] = false;
        self.data_fill(block_number, block);
    }

    /// Copy a block's payload bytes (and their validity) into the track
    /// array at the given block number.
    fn data_fill(&mut self, block_number: u8, block: &Block) {
        let mut count = block.len();
        if count < 4 {
            return;
        }
        count -= 4;
        count = count.min(TRACK_BLOCK_SIZE);

        let bytes = block.bytes();
        for i in 0..count {
            self.data[block_number as usize][i] = bytes[i + 4].value;
            self.data_valid[block_number as usize][i] = bytes[i + 4].valid;
        }
    }

    /// Direct cell access for tests and downstream demultiplexers.
    #[cfg(test)]
    pub(crate) fn set_cell(&mut self, block: usize, byte: usize, value: u8, valid: bool) {
        self.data[block][byte] = value;
        self.data_valid[block][byte] = valid;
    }
}

/// A block header is three flagged bytes (after the sync word) whose XOR
/// parity must be zero and all of which must have demodulated cleanly.
fn block_header_is_valid(block: &Block) -> bool {
    if block.len() < 4 {
        return false;
    }

    let bytes = block.bytes();
    if !(bytes[1].valid && bytes[2].valid && bytes[3].valid) {
        return false;
    }

    bytes[1].value ^ bytes[2].value ^ bytes[3].value == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::FlaggedByte;

    fn block_with_header(number: u8, header_ok: bool) -> Block {
        let mut block = Block::default();
        // Sync placeholder.
        block.add_word(0x111, FlaggedByte::invalid(0x11));
        let id = 0x00u8;
        let parity = id ^ number;
        block.add_word(0, FlaggedByte { value: id, valid: header_ok });
        block.add_word(0, FlaggedByte::valid(number));
        block.add_word(0, FlaggedByte::valid(parity));
        for i in 0..32u8 {
            block.add_word(0, FlaggedByte::valid(i));
        }
        block
    }

    #[test]
    fn verified_block_lands_at_declared_number() {
        let mut track = Track::new(TrackHead::Unknown);
        track.add_block(&block_with_header(5, true));
        assert!(track.header_valid()[5]);
        assert_eq!(track.data()[5][0], 0);
        assert_eq!(track.data()[5][31], 31);
        assert!(track.data_valid()[5].iter().all(|&v| v));
    }

    #[test]
    fn bad_header_is_guessed_after_a_good_block() {
        let mut track = Track::new(TrackHead::Unknown);
        track.add_block(&block_with_header(5, true));
        track.add_block(&block_with_header(99, false));
        // The damaged block is placed at 6, header marked invalid, payload
        // kept.
        assert!(!track.header_valid()[6]);
        assert_eq!(track.data()[6][10], 10);
        assert!(track.data_valid()[6][10]);
    }

    #[test]
    fn bad_header_with_no_predecessor_is_dropped() {
        let mut track = Track::new(TrackHead::Unknown);
        track.add_block(&block_with_header(99, false));
        for v in track.header_valid() {
            assert!(!v);
        }
        for row in track.data_valid() {
            assert!(row.iter().all(|&v| !v));
        }
    }

    #[test]
    fn guess_stops_at_the_end_of_the_sequence() {
        let mut track = Track::new(TrackHead::Unknown);
        track.add_block(&block_with_header(0x7f, true));
        track.add_block(&block_with_header(99, false));
        // 0x7F is the last data block; no guess is allowed past it.
        assert!(!track.data_valid()[0x80 & 0x8f].iter().any(|&v| v));
    }
}
