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

//! The nested Reed–Solomon error correction stack shared by DAT and DDS.
//!
//! R-DAT protects every track with two codes over GF(2⁸): C1, a (32,28)
//! code interleaved across block pairs, and C2, a (32,26) code striped
//! across every fourth block. DDS adds a third, C3, a (46,44) code spanning
//! an entire basic group. The three layers are deliberately run in
//! different modes:
//!
//! - C1 runs first and spends its budget on *detection*: known-bad byte
//!   positions count against its correction limit but are never fed to the
//!   solver as erasures, so its verdicts are trustworthy.
//! - C2 and C3 run in erasures-only mode, correcting purely from the
//!   positions the previous layer marked invalid. In that mode the code can
//!   repair 2t symbols instead of t, but has no detection power left. That
//!   is exactly why C1 must not dilute itself.

pub mod codeword;
pub mod fill;
pub mod gf256;
pub mod solver;

pub use codeword::{Codeword, EccC1, EccC2, EccC3, EccStatus};
pub use fill::{C1TrackWalk, C2TrackWalk, C3GroupWalk, CodewordSource};
