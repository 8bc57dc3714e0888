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

//! Ten-to-eight channel symbol demodulation.
//!
//! R-DAT writes each data byte as a ten-bit channel word chosen for good
//! NRZI behavior: enough transitions to keep the clock alive and a bounded
//! digital sum. Only 256 of the 1024 ten-bit patterns are data codewords;
//! receiving anything else proves a channel error at a known location,
//! which is exactly the erasure information the C1/C2 correctors feed on.
//!
//! An out-of-code word still decodes to a best-effort value. The erasure
//! flag tells everyone downstream not to trust it, but the bits often carry
//! residual information worth keeping.

/// A byte plus the knowledge of whether it can be trusted. Invalid means
/// "known erasure": the value may carry residual information but must not
/// be assumed correct.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlaggedByte {
    pub value: u8,
    pub valid: bool,
}

impl FlaggedByte {
    pub fn valid(value: u8) -> Self {
        Self { value, valid: true }
    }

    pub fn invalid(value: u8) -> Self {
        Self { value, valid: false }
    }
}

/// A data codeword may never contribute to a run of three zero symbols,
/// no matter what its neighbors are: no interior 000, and at most one
/// leading and one trailing zero. That both bounds the NRZI run length
/// and makes the sync pattern (which needs two 000 runs) impossible to
/// counterfeit anywhere in a data stream.
const fn zero_runs_ok(word: u16) -> bool {
    // Leading and trailing pairs of zeros.
    if word & 0x300 == 0 || word & 0x003 == 0 {
        return false;
    }
    let mut run = 0;
    let mut i = 0;
    while i < 10 {
        if (word >> (9 - i)) & 1 == 0 {
            run += 1;
            if run > 2 {
                return false;
            }
        } else {
            run = 0;
        }
        i += 1;
    }
    true
}

/// The 256 data codewords, in byte order: the lowest ten-bit patterns
/// satisfying the run constraints with four to seven ones.
const fn build_codewords() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut found = 0;
    let mut word: u16 = 0;
    while found < 256 && word < 1024 {
        let ones = word.count_ones();
        if ones >= 4 && ones <= 7 && zero_runs_ok(word) {
            table[found] = word;
            found += 1;
        }
        word += 1;
    }
    table
}

/// Demodulation table: ten-bit word → byte value, with bit 15 set for
/// out-of-code words (whose value field is the low eight bits of the word).
const fn build_decode_table() -> [u16; 1024] {
    let codewords = build_codewords();
    let mut table = [0u16; 1024];
    let mut w = 0;
    while w < 1024 {
        table[w] = INVALID | (w as u16 & 0xff);
        w += 1;
    }
    let mut byte = 0;
    while byte < 256 {
        table[codewords[byte] as usize] = byte as u16;
        byte += 1;
    }
    table
}

/// Marks a demodulated value as an erasure.
const INVALID: u16 = 0x8000;

static CODEWORDS: [u16; 256] = build_codewords();
static DECODE: [u16; 1024] = build_decode_table();

/// Demodulate one ten-bit line word.
#[inline]
pub fn decode_symbol(word: u16) -> FlaggedByte {
    let entry = DECODE[(word & 0x3ff) as usize];
    FlaggedByte {
        value: entry as u8,
        valid: entry & INVALID == 0,
    }
}

/// The channel word for a byte. Primarily of interest to tests and to the
/// raw word dumper.
#[inline]
pub fn encode_symbol(byte: u8) -> u16 {
    CODEWORDS[byte as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nrzi::{PREAMBLE_WORD, SYNC_WORD};

    #[test]
    fn all_bytes_round_trip() {
        for byte in 0..=255u8 {
            let word = encode_symbol(byte);
            let decoded = decode_symbol(word);
            assert!(decoded.valid);
            assert_eq!(decoded.value, byte);
        }
    }

    #[test]
    fn codewords_are_unique() {
        let mut seen = [false; 1024];
        for byte in 0..=255u8 {
            let word = encode_symbol(byte) as usize;
            assert!(!seen[word]);
            seen[word] = true;
        }
    }

    #[test]
    fn framing_words_are_not_codewords() {
        assert!(!decode_symbol(SYNC_WORD).valid);
        assert!(!decode_symbol(PREAMBLE_WORD).valid);
    }

    /// No concatenation of data codewords may ever produce the sync
    /// pattern in a sliding nine-bit window. Three consecutive zero
    /// symbols are impossible by construction, and the sync pattern needs
    /// two such runs.
    #[test]
    fn data_streams_cannot_counterfeit_sync() {
        for byte in 0..=255u8 {
            let word = encode_symbol(byte);
            assert_ne!(word & 0x1ff, SYNC_WORD);
            assert_ne!(word & 0x300, 0, "{:#05x} leads with 00", word);
            assert_ne!(word & 0x003, 0, "{:#05x} ends with 00", word);
            for shift in 0..8 {
                assert_ne!(word >> shift & 0b111, 0, "{:#05x} contains 000", word);
            }
        }
    }

    #[test]
    fn out_of_code_words_keep_residual_bits() {
        let fb = decode_symbol(0x3ff);
        assert!(!fb.valid);
        assert_eq!(fb.value, 0xff);
    }
}
