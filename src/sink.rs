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

//! The push interfaces between pipeline stages.
//!
//! Each stage owns the next stage as a generic sink, so the whole pipeline
//! monomorphizes into direct calls. Events flow strictly forward: bits,
//! words, blocks, then completed tracks; clock and track boundary
//! indications ride along on the same interfaces.

use crate::{block::Block, track::Track};

/// Receiver of sliced bits and clock/track events from an RF front end.
pub trait SymbolSink {
    /// A bit has been sliced from the waveform.
    fn receive_bit(&mut self, bit: bool);

    /// The symbol clock has been acquired (`true`) or lost (`false`).
    fn clock_detected(&mut self, detected: bool);

    /// A head pass has started (`true`) or ended (`false`).
    fn track_detected(&mut self, start: bool);

    /// An automatic track finding pilot tone was observed in the waveform.
    fn receive_atf_tone(&mut self, tone: u8);

    /// Is there sufficient evidence of a preamble sequence right now? The
    /// front end polls this to arm its track timer.
    fn preamble_detected(&self) -> bool;

    /// No more input is coming.
    fn stop(&mut self);
}

/// Receiver of framed ten-bit line words.
pub trait WordSink {
    fn receive_word(&mut self, word: u16);
    fn track_detected(&mut self, start: bool);
    fn receive_atf_tone(&mut self, tone: u8);
    fn stop(&mut self);
}

/// Receiver of assembled 36-word blocks.
pub trait BlockSink {
    fn receive_block(&mut self, block: &Block);
    fn track_detected(&mut self, start: bool);
    fn receive_atf_tone(&mut self, tone: u8);
    fn stop(&mut self);
}

/// Receiver of completed track pairs. The framer consults `is_frame` to
/// decide whether two consecutive tracks belong together; the receiver owns
/// that judgement because DAT and DDS pair on different sub-codes.
pub trait FrameSink {
    fn is_frame(&mut self, a: &Track, b: &Track) -> bool;
    fn receive_frame(&mut self, a: &Track, b: &Track);
    fn stop(&mut self);
}
