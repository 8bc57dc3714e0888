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

//! Codeword geometry: how each Reed–Solomon code scatters its vector
//! across the backing storage.
//!
//! The codec shells in [`codeword`](crate::ecc::codeword) neither know nor
//! care where their bytes live. Each walk type here owns the mapping from
//! codeword position to storage cell for one code, and doubles as an
//! iterator over every vector the code covers in a track or basic group.

use bit_vec::BitVec;

use crate::{
    dds::group1::SUB_GROUP_SIZE,
    track::{TRACK_BLOCKS, TRACK_BLOCK_SIZE},
};

/// Backing storage access for one codeword vector. Position 0 is the
/// highest-order coefficient as stored; the last PARITY positions hold the
/// check symbols.
pub trait CodewordSource {
    fn data(&self, position: usize) -> u8;
    fn set_data(&mut self, position: usize, value: u8);
    fn valid(&self, position: usize) -> bool;
    fn set_valid(&mut self, position: usize, value: bool);
}

type BlockArray = [[u8; TRACK_BLOCK_SIZE]; TRACK_BLOCKS];
type BlockValidArray = [[bool; TRACK_BLOCK_SIZE]; TRACK_BLOCKS];

/// C1 walks every pair of blocks, twice: the even byte offsets of both
/// blocks form one 32-symbol vector, the odd offsets the other. The last
/// four bytes of each interleave are the P parity.
pub struct C1TrackWalk<'a> {
    data: &'a mut BlockArray,
    valid: &'a mut BlockValidArray,
    pair_start: usize,
    interleave: usize,
}

impl<'a> C1TrackWalk<'a> {
    pub fn new(data: &'a mut BlockArray, valid: &'a mut BlockValidArray) -> Self {
        Self {
            data,
            valid,
            pair_start: 0,
            interleave: 0,
        }
    }

    /// Codeword position → (block, byte offset) within the track.
    #[inline]
    fn cell(&self, position: usize) -> (usize, usize) {
        (
            self.pair_start + position / 16,
            (position % 16) * 2 + self.interleave,
        )
    }

    pub fn advance(&mut self) -> bool {
        if self.end() {
            return false;
        }
        if self.interleave == 1 {
            self.pair_start += 2;
            self.interleave = 0;
        } else {
            self.interleave = 1;
        }
        !self.end()
    }

    pub fn end(&self) -> bool {
        self.pair_start >= TRACK_BLOCKS
    }
}

impl CodewordSource for C1TrackWalk<'_> {
    fn data(&self, position: usize) -> u8 {
        let (block, byte) = self.cell(position);
        self.data[block][byte]
    }

    fn set_data(&mut self, position: usize, value: u8) {
        let (block, byte) = self.cell(position);
        self.data[block][byte] = value;
    }

    fn valid(&self, position: usize) -> bool {
        let (block, byte) = self.cell(position);
        self.valid[block][byte]
    }

    fn set_valid(&mut self, position: usize, value: bool) {
        let (block, byte) = self.cell(position);
        self.valid[block][byte] = value;
    }
}

/// C2 stripes its vectors across every fourth block: four block groups,
/// each sliced vertically one byte offset at a time. Groups 0 and 2 have
/// 32 byte slices; groups 1 and 3 only 24, because their last eight byte
/// offsets are the C1 P parity and are already spent. The Q parity lands
/// in the middle of each vector, a direct consequence of where the parity
/// blocks sit in the track.
pub struct C2TrackWalk<'a> {
    data: &'a mut BlockArray,
    valid: &'a mut BlockValidArray,
    byte_slice: usize,
    group: usize,
}

const C2_GROUPS: usize = 4;
const C2_SLICES_EVEN_GROUP: usize = 32;
const C2_SLICES_ODD_GROUP: usize = 24;

impl<'a> C2TrackWalk<'a> {
    pub fn new(data: &'a mut BlockArray, valid: &'a mut BlockValidArray) -> Self {
        Self {
            data,
            valid,
            byte_slice: 0,
            group: 0,
        }
    }

    pub fn advance(&mut self) -> bool {
        if self.end() {
            return false;
        }
        let max_slice = if self.group & 1 == 0 {
            C2_SLICES_EVEN_GROUP
        } else {
            C2_SLICES_ODD_GROUP
        };
        if self.byte_slice == max_slice - 1 {
            self.byte_slice = 0;
            self.group += 1;
        } else {
            self.byte_slice += 1;
        }
        !self.end()
    }

    pub fn end(&self) -> bool {
        self.group >= C2_GROUPS
    }
}

impl CodewordSource for C2TrackWalk<'_> {
    fn data(&self, position: usize) -> u8 {
        self.data[position * 4 + self.group][self.byte_slice]
    }

    fn set_data(&mut self, position: usize, value: u8) {
        self.data[position * 4 + self.group][self.byte_slice] = value;
    }

    fn valid(&self, position: usize) -> bool {
        self.valid[position * 4 + self.group][self.byte_slice]
    }

    fn set_valid(&mut self, position: usize, value: bool) {
        self.valid[position * 4 + self.group][self.byte_slice] = value;
    }
}

/// C3 spans a whole basic group: 720 byte slices × 2 track pairs × 2
/// interleaves (the last byte slice has a single track pair). Codeword
/// position p draws from sub-group p/2; sub-group 22 is the ECC region,
/// which lives in its own buffer.
pub struct C3GroupWalk<'a> {
    data: &'a mut [u8],
    valid: &'a mut BitVec,
    ecc: &'a mut [u8],
    ecc_valid: &'a mut BitVec,
    byte_slice: usize,
    track_pair: usize,
    interleave: usize,
}

const C3_BYTE_SLICES: usize = 720;
const C3_INTERLEAVES: usize = 2;

#[inline]
fn c3_offset(position: usize, byte_slice: usize, track_pair: usize, interleave: usize) -> (usize, bool) {
    let sub_group = position / 2;
    let (base, is_ecc) = if sub_group == 22 {
        (0, true)
    } else {
        (sub_group * SUB_GROUP_SIZE, false)
    };

    let offset = if position & 1 == 0 {
        8 * byte_slice + 2 * (track_pair + 1) + interleave + base
    } else {
        8 * byte_slice + 6 * track_pair + interleave + base
    };

    (offset, is_ecc)
}

impl<'a> C3GroupWalk<'a> {
    pub fn new(
        data: &'a mut [u8],
        valid: &'a mut BitVec,
        ecc: &'a mut [u8],
        ecc_valid: &'a mut BitVec,
    ) -> Self {
        Self {
            data,
            valid,
            ecc,
            ecc_valid,
            byte_slice: 0,
            track_pair: 0,
            interleave: 0,
        }
    }

    pub fn advance(&mut self) -> bool {
        if self.end() {
            return false;
        }
        // Every byte slice except the last covers two track pairs.
        let max_track_pair = if self.byte_slice < C3_BYTE_SLICES - 1 { 2 } else { 1 };

        if self.interleave == C3_INTERLEAVES - 1 {
            if self.track_pair == max_track_pair - 1 {
                self.byte_slice += 1;
                self.track_pair = 0;
            } else {
                self.track_pair += 1;
            }
            self.interleave = 0;
        } else {
            self.interleave += 1;
        }
        !self.end()
    }

    pub fn end(&self) -> bool {
        self.byte_slice >= C3_BYTE_SLICES
    }
}

impl CodewordSource for C3GroupWalk<'_> {
    fn data(&self, position: usize) -> u8 {
        let (offset, is_ecc) = c3_offset(position, self.byte_slice, self.track_pair, self.interleave);
        if is_ecc {
            self.ecc[offset]
        } else {
            self.data[offset]
        }
    }

    fn set_data(&mut self, position: usize, value: u8) {
        let (offset, is_ecc) = c3_offset(position, self.byte_slice, self.track_pair, self.interleave);
        if is_ecc {
            self.ecc[offset] = value;
        } else {
            self.data[offset] = value;
        }
    }

    fn valid(&self, position: usize) -> bool {
        let (offset, is_ecc) = c3_offset(position, self.byte_slice, self.track_pair, self.interleave);
        if is_ecc {
            self.ecc_valid.get(offset).unwrap_or(false)
        } else {
            self.valid.get(offset).unwrap_or(false)
        }
    }

    fn set_valid(&mut self, position: usize, value: bool) {
        let (offset, is_ecc) = c3_offset(position, self.byte_slice, self.track_pair, self.interleave);
        if is_ecc {
            self.ecc_valid.set(offset, value);
        } else {
            self.valid.set(offset, value);
        }
    }
}
