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

//! DATfox recovers the logical contents of helical-scan R-DAT tapes, both
//! DAT digital audio and DDS computer data, from a baseband RF waveform
//! captured off the tape read head.
//!
//! The input is a stream of IEEE-754 32-bit floats sampled at 75.264 MHz,
//! eight times the 9.408 MHz channel symbol rate. From there the pipeline is
//! a chain of push stages, each owning the next:
//!
//! sample pump → symbol clock recovery → NRZI deframer → 10-to-8 symbol
//! decode → block assembly → track assembly (C1/C2 Reed–Solomon) → track
//! pairing → DAT frame demultiplex → audio sink, or DDS group decoding,
//! de-whitening and basic-group accumulation with a final C3 pass.
//!
//! Every byte from the symbol decoder onward travels with a validity flag;
//! each correction layer either trusts, repairs, or explicitly erases data,
//! so the final output carries an honest per-byte account of what was
//! actually recovered.

pub mod audio;
pub mod block;
pub mod clock;
pub mod dds;
pub mod decoder;
pub mod ecc;
pub mod frame;
pub mod nrzi;
pub mod sink;
pub mod subcode;
pub mod symbol;
pub mod track;

use thiserror::Error;

/// The R-DAT channel symbol rate, in symbols per second.
pub const SYMBOL_RATE: f64 = 9_408_000.0;

/// The nominal capture rate this crate expects: eight samples per symbol.
pub const DEFAULT_SAMPLE_RATE: f64 = SYMBOL_RATE * 8.0;

/// Errors raised at the recovery pipeline's I/O boundaries. Decode problems
/// inside the pipeline are never errors; they travel as per-byte validity
/// flags and kind-tagged statuses instead.
#[derive(Debug, Error)]
pub enum DatError {
    #[error("an IO error occurred reading or writing recovered data")]
    Io(#[from] std::io::Error),
    #[error("the output path could not be opened")]
    OutputOpen,
}

pub use crate::{
    block::{Block, BlockAssembler},
    decoder::RfDecoder,
    symbol::FlaggedByte,
    track::{Track, TrackHead},
};
