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

//! Symbol clock recovery primitives.
//!
//! The R-DAT channel has no separate clock track; symbol timing has to be
//! dug out of the waveform itself. The scheme, shared with the envelope
//! detector built into [`RfDecoder`](crate::decoder::RfDecoder): keep a
//! ring with one cell per sample phase of the symbol period, let an
//! exponential moving average accumulate "activity" per phase, and fire
//! the bit slicer at the phase diametrically opposite the activity peak.
//! The min/max ratio across the ring doubles as a lock indicator.

pub mod differential;
pub mod window;

pub use differential::{ClockTick, DifferentialClockDetector};
pub use window::SampleWindow;
