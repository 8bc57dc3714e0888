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

//! The G1 sub-group: a data-area G3 sub-group with the whitening removed.
//!
//! DDS whitens everything it writes with a 15-bit LFSR (feedback is the
//! XOR of the two lowest bits, fed back into bit 14) so the channel never
//! sees long constant runs. De-whitening XORs the same key stream back
//! out: the register is seeded with 1 at the top of each frame, each
//! payload byte is XORed with the low eight bits of the register, and the
//! register cranks eight times per byte. XOR with a known constant cannot
//! change what is and is not known, so validity passes through untouched.

use crate::dds::group3::Group3;

/// Payload bytes in one sub-group: 1439 rows of 4.
pub const SUB_GROUP_SIZE: usize = 1439 * 4;

/// Advance the whitening LFSR one bit.
#[inline]
fn lfsr_crank(v: u16) -> u16 {
    let feedback = (v & 1) ^ ((v >> 1) & 1);
    let mut v = v >> 1;
    if feedback != 0 {
        v |= 0x4000;
    }
    v
}

/// Advance the LFSR to the state for the next byte.
#[inline]
fn lfsr_crank_8(mut v: u16) -> u16 {
    for _ in 0..8 {
        v = lfsr_crank(v);
    }
    v
}

/// XOR the whitening key stream over `bytes`, starting from the seeded
/// register state. An involution: applying it twice is the identity.
pub fn dewhiten(bytes: &mut [u8]) {
    let mut state: u16 = 1;
    for byte in bytes.iter_mut() {
        *byte ^= (state & 0xff) as u8;
        state = lfsr_crank_8(state);
    }
}

pub struct Group1 {
    data: Vec<u8>,
    valid: Vec<bool>,

    basic_group_id: u32,
    sub_frame_id: u8,
    is_last_frame: bool,
    is_ecc_frame: bool,
}

impl Group1 {
    /// De-whiten a decoded G3 sub-group. Rows 1..=1439 of the frame are
    /// the payload; row 0 is the header and takes no part.
    pub fn from_group3(g3: &Group3) -> Self {
        let frame = g3.frame();
        let frame_data = frame.data();
        let frame_valid = frame.valid();

        let mut data = Vec::with_capacity(SUB_GROUP_SIZE);
        let mut valid = Vec::with_capacity(SUB_GROUP_SIZE);
        for i in 0..SUB_GROUP_SIZE {
            let row = i / 4 + 1;
            let col = i % 4;
            data.push(frame_data[row][col]);
            valid.push(frame_valid[row][col]);
        }

        dewhiten(&mut data);

        Self {
            data,
            valid,
            basic_group_id: g3.basic_group_id(),
            sub_frame_id: g3.logical_frame_id(),
            is_last_frame: g3.is_last_logical_frame(),
            is_ecc_frame: g3.is_ecc3_frame(),
        }
    }

    /// Assemble a sub-group directly from recovered material, bypassing
    /// the tape path. `data` and `valid` must each hold
    /// [`SUB_GROUP_SIZE`] entries.
    pub fn from_parts(
        basic_group_id: u32,
        sub_frame_id: u8,
        is_last_frame: bool,
        is_ecc_frame: bool,
        data: Vec<u8>,
        valid: Vec<bool>,
    ) -> Self {
        assert_eq!(data.len(), SUB_GROUP_SIZE);
        assert_eq!(valid.len(), SUB_GROUP_SIZE);
        Self {
            data,
            valid,
            basic_group_id,
            sub_frame_id,
            is_last_frame,
            is_ecc_frame,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    pub fn basic_group_id(&self) -> u32 {
        self.basic_group_id
    }

    /// This sub-group's position within its basic group, 1..=22.
    pub fn sub_frame_id(&self) -> u8 {
        self.sub_frame_id
    }

    pub fn is_last_frame(&self) -> bool {
        self.is_last_frame
    }

    pub fn is_ecc_frame(&self) -> bool {
        self.is_ecc_frame
    }
}
