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

//! A DAT frame is a pair of tracks, one per head, demultiplexed into a
//! single 1456-row, 4-byte-wide matrix. DAT audio and DDS share this
//! interleave and its error correction scheme, so it lives here rather
//! than in either consumer.

use crate::track::Track;

/// Rows carrying user data.
pub const USER_DATA_ROWS: usize = 1440;

/// Trailing parity rows.
pub const PARITY_ROWS: usize = 16;

/// Bytes per row: left/right 16-bit samples for audio, four data columns
/// for DDS.
pub const BYTES_PER_ROW: usize = 4;

pub const TOTAL_ROWS: usize = USER_DATA_ROWS + PARITY_ROWS;

pub struct DatFrame {
    data: [[u8; BYTES_PER_ROW]; TOTAL_ROWS],
    valid: [[bool; BYTES_PER_ROW]; TOTAL_ROWS],

    c1_errors: usize,
    c1_uncorrectable: usize,
    c2_uncorrectable: usize,
}

impl Default for DatFrame {
    fn default() -> Self {
        Self {
            data: [[0; BYTES_PER_ROW]; TOTAL_ROWS],
            valid: [[false; BYTES_PER_ROW]; TOTAL_ROWS],
            c1_errors: 0,
            c1_uncorrectable: 0,
            c2_uncorrectable: 0,
        }
    }
}

impl DatFrame {
    /// Demultiplex a track pair into the frame matrix.
    ///
    /// The wiring follows the G4 sub-group layout of the DDS specification
    /// (§9.3.4); the DAT Conference Standard specifies the same pattern.
    /// On even rows the A track feeds columns 0-1 and B columns 2-3; odd
    /// rows swap the two tracks.
    pub fn fill_from_track_pair(&mut self, a: &Track, b: &Track) {
        let a_bytes = a.data();
        let b_bytes = b.data();
        let a_valid = a.data_valid();
        let b_valid = b.data_valid();

        let mut everything_ok = true;

        for column in 0..2usize {
            for word in 0..TOTAL_ROWS {
                let source_block = (word % 52) + 75 * (word % 2) + (word / 832);
                let u = (column + 1) % 2;
                let source_byte = 2 * (u + word / 52) - (word / 52) % 2 - 32 * (word / 832);

                if word % 2 == 0 {
                    self.data[word][column] = a_bytes[source_block][source_byte];
                    self.data[word][column + 2] = b_bytes[source_block][source_byte];
                    self.valid[word][column] = a_valid[source_block][source_byte];
                    self.valid[word][column + 2] = b_valid[source_block][source_byte];
                } else {
                    self.data[word][column] = b_bytes[source_block][source_byte];
                    self.data[word][column + 2] = a_bytes[source_block][source_byte];
                    self.valid[word][column] = b_valid[source_block][source_byte];
                    self.valid[word][column + 2] = a_valid[source_block][source_byte];
                }
                everything_ok =
                    everything_ok && self.valid[word][column] && self.valid[word][column + 2];
            }
        }

        self.c1_errors = a.c1_errors() + b.c1_errors();
        self.c1_uncorrectable = a.c1_uncorrectable_errors() + b.c1_uncorrectable_errors();
        self.c2_uncorrectable = a.c2_uncorrectable_errors() + b.c2_uncorrectable_errors();

        if self.c2_uncorrectable > 0 && everything_ok {
            // C2 reported an unrecoverable slice yet every demultiplexed
            // cell is valid; the two bookkeeping paths disagree.
            log::warn!("DatFrame: inconsistency between C2 error count and erasure flags");
        }
    }

    pub fn data(&self) -> &[[u8; BYTES_PER_ROW]; TOTAL_ROWS] {
        &self.data
    }

    pub fn valid(&self) -> &[[bool; BYTES_PER_ROW]; TOTAL_ROWS] {
        &self.valid
    }

    /// True when no C2-uncorrectable damage remains anywhere in the frame.
    pub fn ok(&self) -> bool {
        self.c2_uncorrectable == 0
    }

    pub fn c1_errors(&self) -> usize {
        self.c1_errors
    }

    pub fn c1_uncorrectable_errors(&self) -> usize {
        self.c1_uncorrectable
    }

    pub fn c2_uncorrectable_errors(&self) -> usize {
        self.c2_uncorrectable
    }
}
