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

//! Shared helpers for the integration tests: a software R-DAT *encoder*.
//!
//! The library only ever decodes; to exercise it end to end the tests
//! need authentic input, so this module builds it: parity-checked block
//! headers, C1/C2 parity computed by solving the check equations, sub-code
//! pack items, and whole synthetic tracks rendered down to line words and
//! NRZI levels.

#![allow(dead_code)]

use datfox::{
    ecc::{gf256, CodewordSource},
    nrzi::SYNC_WORD,
    symbol::encode_symbol,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A plain vector-backed codeword source for driving the codecs directly.
pub struct VecSource {
    pub data: Vec<u8>,
    pub valid: Vec<bool>,
}

impl VecSource {
    pub fn new(data: Vec<u8>) -> Self {
        let valid = vec![true; data.len()];
        Self { data, valid }
    }
}

impl CodewordSource for VecSource {
    fn data(&self, position: usize) -> u8 {
        self.data[position]
    }
    fn set_data(&mut self, position: usize, value: u8) {
        self.data[position] = value;
    }
    fn valid(&self, position: usize) -> bool {
        self.valid[position]
    }
    fn set_valid(&mut self, position: usize, value: bool) {
        self.valid[position] = value;
    }
}

/// The parity-check matrix shared by the DAT family codes:
/// H[i][j] = α^(i·(n−1−j)).
pub fn check_matrix(n: usize, two_t: usize) -> Vec<Vec<u8>> {
    (0..two_t)
        .map(|i| (0..n).map(|j| gf256::pow_alpha(i * (n - 1 - j))).collect())
        .collect()
}

/// Solve A·x = b over GF(2⁸) by Gaussian elimination. A must be square
/// and nonsingular (it always is for Vandermonde-style parity columns).
pub fn gf_solve(mut a: Vec<Vec<u8>>, mut b: Vec<u8>) -> Vec<u8> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).find(|&r| a[r][col] != 0).expect("singular system");
        a.swap(col, pivot);
        b.swap(col, pivot);

        let inv = gf256::invert(a[col][col]);
        for r in 0..n {
            if r == col || a[r][col] == 0 {
                continue;
            }
            let factor = gf256::multiply(a[r][col], inv);
            for c in 0..n {
                let t = gf256::multiply(a[col][c], factor);
                a[r][c] ^= t;
            }
            let t = gf256::multiply(b[col], factor);
            b[r] ^= t;
        }
    }
    (0..n)
        .map(|i| gf256::multiply(b[i], gf256::invert(a[i][i])))
        .collect()
}

/// Given a codeword with holes at `parity_positions`, fill those holes so
/// the full codeword satisfies H·c = 0.
pub fn fill_parity(codeword: &mut [u8], parity_positions: &[usize], two_t: usize) {
    let n = codeword.len();
    let h = check_matrix(n, two_t);

    // Syndrome contribution of the known positions.
    let mut b = vec![0u8; two_t];
    for (i, row) in h.iter().enumerate() {
        for (j, &c) in codeword.iter().enumerate() {
            if !parity_positions.contains(&j) {
                b[i] ^= gf256::multiply(c, row[j]);
            }
        }
    }

    let a: Vec<Vec<u8>> = (0..two_t)
        .map(|i| parity_positions.iter().map(|&p| h[i][p]).collect())
        .collect();

    let solution = gf_solve(a, b);
    for (k, &p) in parity_positions.iter().enumerate() {
        codeword[p] = solution[k];
    }
}

/// A synthetic track under construction: 144 blocks of 32 payload bytes
/// plus a header byte each.
pub struct TrackImage {
    pub data: Vec<[u8; 32]>,
    pub headers: Vec<u8>,
}

impl Default for TrackImage {
    fn default() -> Self {
        Self {
            data: vec![[0u8; 32]; 144],
            headers: vec![0u8; 144],
        }
    }
}

impl TrackImage {
    /// Write an 8-byte sub-code item (7 pack bytes + XOR parity) into a
    /// sub-code block.
    pub fn set_subcode_item(&mut self, block: usize, item: usize, pack: &[u8; 7]) {
        assert!((0x80..0x90).contains(&block));
        let offset = item * 8;
        let parity = pack.iter().fold(0u8, |acc, &b| acc ^ b);
        self.data[block][offset..offset + 7].copy_from_slice(pack);
        self.data[block][offset + 7] = parity;
    }

    /// Compute the C2 (Q) parity bytes. The Q bytes sit in the middle
    /// blocks of the track (52-75), which is the middle of each striped
    /// vector: positions 13..18.
    pub fn fill_c2_parity(&mut self) {
        const Q_POSITIONS: [usize; 6] = [13, 14, 15, 16, 17, 18];
        for group in 0..4usize {
            let slices = if group & 1 == 0 { 32 } else { 24 };
            for slice in 0..slices {
                let mut vector = [0u8; 32];
                for (pos, v) in vector.iter_mut().enumerate() {
                    *v = self.data[pos * 4 + group][slice];
                }
                fill_parity(&mut vector, &Q_POSITIONS, 6);
                for &pos in &Q_POSITIONS {
                    self.data[pos * 4 + group][slice] = vector[pos];
                }
            }
        }
    }

    /// Compute the C1 (P) parity bytes: vector positions 28..31, the even
    /// or odd byte offsets 24..31 of every odd-numbered block. Run after
    /// `fill_c2_parity` so the parity covers the Q bytes too.
    pub fn fill_c1_parity(&mut self) {
        for pair in (0..144usize).step_by(2) {
            for interleave in 0..2usize {
                let mut vector = [0u8; 32];
                for (pos, v) in vector.iter_mut().enumerate() {
                    *v = self.data[pair + pos / 16][(pos % 16) * 2 + interleave];
                }
                fill_parity(&mut vector, &[28, 29, 30, 31], 4);
                for pos in 28..32 {
                    self.data[pair + pos / 16][(pos % 16) * 2 + interleave] = vector[pos];
                }
            }
        }
    }

    /// Set every block's header ID byte: zero for data blocks, the given
    /// Control/Data ID byte for sub-code blocks. The block number and the
    /// XOR parity byte are derived at render time.
    pub fn fill_headers(&mut self, subcode_id_byte: u8) {
        for block in 0..144usize {
            self.headers[block] = if block < 128 { 0 } else { subcode_id_byte };
        }
    }

    /// Render one block as its 36 ten-bit line words.
    pub fn block_words(&self, block: usize) -> Vec<u16> {
        let number = if block < 128 {
            block as u8
        } else {
            0x80 | (block as u8 & 0x0f)
        };
        let id = self.headers[block];
        let parity = id ^ number;

        let mut words = Vec::with_capacity(36);
        words.push(SYNC_WORD);
        words.push(encode_symbol(id));
        words.push(encode_symbol(number));
        words.push(encode_symbol(parity));
        for &byte in &self.data[block] {
            words.push(encode_symbol(byte));
        }
        words
    }

    /// Render the whole track as line words, preceded by a preamble run.
    pub fn track_words(&self, preamble_words: usize) -> Vec<u16> {
        let mut words = Vec::new();
        for _ in 0..preamble_words {
            words.push(0x3ff);
        }
        for block in 0..144 {
            words.extend(self.block_words(block));
        }
        words
    }
}

/// Expand ten-bit words into NRZI channel levels, one level per symbol.
pub fn words_to_levels(words: &[u16]) -> Vec<bool> {
    let mut levels = Vec::with_capacity(words.len() * 10);
    let mut level = false;
    for &word in words {
        for bit in (0..10).rev() {
            if word >> bit & 1 != 0 {
                level = !level;
            }
            levels.push(level);
        }
    }
    levels
}

/// Build an 8-byte sub-code pack item body for the given pack ID. `body`
/// is the six bytes following the ID byte's low nibble carrier.
pub fn pack_item(id: u8, byte0_low: u8, body: &[u8; 6]) -> [u8; 7] {
    let mut item = [0u8; 7];
    item[0] = (id << 4) | (byte0_low & 0x0f);
    item[1..7].copy_from_slice(body);
    item
}

/// Reverse of the frame demultiplex: place each frame cell at the track
/// cell the decoder will read it back from. Every track cell must be hit
/// at most once or the geometry is wrong.
pub fn fill_tracks_from_rows(rows: &[[u8; 4]], a: &mut TrackImage, b: &mut TrackImage) {
    assert_eq!(rows.len(), 1456);
    let mut written = vec![[false; 32]; 144];
    for column in 0..2usize {
        for word in 0..1456usize {
            let source_block = (word % 52) + 75 * (word % 2) + (word / 832);
            let u = (column + 1) % 2;
            let source_byte = 2 * (u + word / 52) - (word / 52) % 2 - 32 * (word / 832);

            let (to_a, to_b) = if word % 2 == 0 {
                (rows[word][column], rows[word][column + 2])
            } else {
                (rows[word][column + 2], rows[word][column])
            };

            assert!(!written[source_block][source_byte], "demux collision");
            written[source_block][source_byte] = true;

            a.data[source_block][source_byte] = to_a;
            b.data[source_block][source_byte] = to_b;
        }
    }
}

/// Build a complete, parity-correct DDS track pair carrying one whitened
/// data-area sub-group, ready to be rendered to words and bits.
///
/// `plaintext` is the 5756-byte de-whitened payload the decoder should
/// eventually recover.
pub fn build_dds_track_pair(
    plaintext: &[u8],
    group_id: u16,
    sub_frame_id: u8,
    is_last: bool,
    absolute_frame: u32,
) -> (TrackImage, TrackImage) {
    use datfox::dds::group1::{dewhiten, SUB_GROUP_SIZE};

    assert_eq!(plaintext.len(), SUB_GROUP_SIZE);

    let lfid = sub_frame_id | if is_last { 0x80 } else { 0 };

    // Whitening is an involution, so whitening the plaintext gives what
    // must appear on tape.
    let mut whitened = plaintext.to_vec();
    dewhiten(&mut whitened);

    let mut rows = vec![[0u8; 4]; 1456];
    rows[0] = [0, lfid, 0, lfid];
    for (i, &byte) in whitened.iter().enumerate() {
        rows[i / 4 + 1][i % 4] = byte;
    }

    // Half-column checksums over the sub-group payload.
    let di = |i: usize| rows[i / 4 + 1][i % 4];
    let mut c1 = lfid;
    let mut c2 = 0u8;
    let mut c3 = lfid;
    let mut c4 = 0u8;
    for i in 0..719 {
        c1 ^= di(8 * i + 3) ^ di(8 * i + 5) ^ di(5755);
        c2 ^= di(8 * i + 2) ^ di(8 * i + 4) ^ di(5754);
        c3 ^= di(1) ^ di(8 * (i + 1) - 1) ^ di(8 * (i + 1) + 1);
        c4 ^= di(0) ^ di(8 * (i + 1) - 2) ^ di(8 * (i + 1));
    }

    let mut a = TrackImage::default();
    let mut b = TrackImage::default();
    fill_tracks_from_rows(&rows, &mut a, &mut b);

    // Sub-code packs 1-4, identical on both tracks.
    let af = absolute_frame.to_be_bytes();
    let pack1 = pack_item(
        1,
        0,
        &[(group_id >> 8) as u8, group_id as u8, 0, 0, 0, 1],
    );
    let pack2 = pack_item(2, 0, &[0, 0, 0, 0, 0, 1]);
    // Data area (4), partition 0.
    let pack3 = pack_item(3, 4, &[af[1], af[2], af[3], c1, c2, lfid]);
    let pack4 = pack_item(4, 4, &[af[1], af[2], af[3], c3, c4, lfid]);

    for track in [&mut a, &mut b] {
        track.set_subcode_item(0x80, 0, &pack1);
        track.set_subcode_item(0x80, 1, &pack2);
        track.set_subcode_item(0x80, 2, &pack3);
        track.set_subcode_item(0x80, 3, &pack4);
        // A second copy of pack 3 in an odd block, as real decks write.
        track.set_subcode_item(0x81, 0, &pack3);

        track.fill_headers(0);
        track.fill_c2_parity();
        track.fill_c1_parity();
    }

    (a, b)
}
