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

//! The NRZI deframer: turns the sliced level stream into framed ten-bit
//! line words, aligned on the R-DAT sync pattern.
//!
//! In NRZI a magnetic transition denotes a 1, so a bit is emitted whenever
//! the current symbol differs from the previous one. The bits shift into a
//! ten-bit register; when its low nine bits equal the sync pattern
//! 0100010001 the register is emitted and word boundaries are anchored
//! there. An interior sync pattern re-anchors the boundary; on a damaged
//! track that trades one garbled word for a clean resynchronization.

use crate::sink::{SymbolSink, WordSink};

/// The R-DAT sync word, 0100010001.
pub const SYNC_WORD: u16 = 0x111;

/// A preamble is an unbroken run of ones.
pub const PREAMBLE_WORD: u16 = 0x3ff;

/// Consecutive all-ones word checks required before a preamble is declared.
const PREAMBLE_RUN: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FramerState {
    SyncSearch,
    Synced,
}

pub struct NrziDeframer<R: WordSink> {
    receiver: R,

    /// Whether the raw bit stream is NRZI-coded levels (the envelope front
    /// end) or already-decoded transition indications (the slope front end).
    nrzi: bool,

    /// Ten-bit accumulating shift register.
    frame: u16,
    last_bit: bool,
    /// Bits received since the last word boundary.
    sync_bit_count: usize,
    state: FramerState,

    track_detected: bool,
    preamble_symbol_count: usize,
    preamble_check: usize,
}

impl<R: WordSink> NrziDeframer<R> {
    /// A deframer for NRZI level streams.
    pub fn new(receiver: R) -> Self {
        Self::with_coding(receiver, true)
    }

    /// A deframer for streams whose bits are already transition flags.
    pub fn direct(receiver: R) -> Self {
        Self::with_coding(receiver, false)
    }

    fn with_coding(receiver: R, nrzi: bool) -> Self {
        Self {
            receiver,
            nrzi,
            frame: 0,
            last_bit: false,
            sync_bit_count: 0,
            state: FramerState::SyncSearch,
            track_detected: false,
            preamble_symbol_count: 0,
            preamble_check: 0,
        }
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }

    /// Dump any accumulated bits and revert to sync search.
    pub fn reset(&mut self) {
        self.state = FramerState::SyncSearch;
        self.frame = 0;
        self.preamble_check = 0;
        self.preamble_symbol_count = 0;
        self.track_detected = false;
    }

    fn receive_framed_bit(&mut self, bit: bool) {
        self.frame &= 0x1ff;
        self.frame <<= 1;
        self.frame |= bit as u16;

        // Preamble detection runs only while hunting for a track start.
        if !self.track_detected {
            self.preamble_check += 1;
            if self.preamble_check == 10 {
                self.preamble_check = 0;
                if self.frame == PREAMBLE_WORD {
                    self.preamble_symbol_count += 1;
                } else {
                    self.preamble_symbol_count = 0;
                }
            }
        }

        if self.frame & 0x1ff == SYNC_WORD {
            // Sync pattern: anchor the word boundary here and deliver the
            // register as a word.
            self.sync_bit_count = 0;
            self.state = FramerState::Synced;
            self.receiver.receive_word(self.frame);
        } else if self.state == FramerState::Synced {
            self.sync_bit_count += 1;
            if self.sync_bit_count == 10 {
                self.sync_bit_count = 0;
                self.receiver.receive_word(self.frame);
            }
        }
    }
}

impl<R: WordSink> SymbolSink for NrziDeframer<R> {
    fn receive_bit(&mut self, bit: bool) {
        let decoded = if self.nrzi {
            let transition = bit != self.last_bit;
            self.last_bit = bit;
            transition
        } else {
            bit
        };
        self.receive_framed_bit(decoded);
    }

    fn clock_detected(&mut self, detected: bool) {
        // Carrier dropped: nothing buffered can be trusted.
        if !detected {
            log::trace!("NrziDeframer: clock lost, resetting");
            self.reset();
        }
    }

    fn track_detected(&mut self, start: bool) {
        self.track_detected = start;

        if !start {
            // Re-arm preamble detection for the next track.
            self.preamble_symbol_count = 0;
            self.preamble_check = 0;
        }

        self.receiver.track_detected(start);
    }

    fn receive_atf_tone(&mut self, tone: u8) {
        self.receiver.receive_atf_tone(tone);
    }

    fn preamble_detected(&self) -> bool {
        self.preamble_symbol_count > PREAMBLE_RUN
    }

    fn stop(&mut self) {
        self.receiver.stop();
    }
}
