/*
    datfox
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

//! Whole-sample reads from a byte stream.
//!
//! Pipes deliver whatever they feel like; a read can end mid-float. The
//! reader carries the residue of a torn sample over to the next call so
//! the decoder only ever sees whole f32 values, and it returns early on
//! EOF or a signal-interrupted read so the pump loop can check the run
//! flag.

use std::io::{ErrorKind, Read};

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

pub struct SampleReader<R: Read> {
    inner: R,
    buffer: Vec<u8>,
    residual: [u8; SAMPLE_BYTES],
    residual_count: usize,
}

impl<R: Read> SampleReader<R> {
    pub fn new(inner: R, samples_per_read: usize) -> Self {
        Self {
            inner,
            buffer: vec![0u8; samples_per_read * SAMPLE_BYTES],
            residual: [0u8; SAMPLE_BYTES],
            residual_count: 0,
        }
    }

    /// Fill `out` with as many whole samples as the stream will give.
    /// Returns the number of samples produced; 0 means end of input.
    pub fn read_samples(&mut self, out: &mut [f32]) -> usize {
        let want = out.len() * SAMPLE_BYTES;
        debug_assert!(want <= self.buffer.len());

        self.buffer[..self.residual_count].copy_from_slice(&self.residual[..self.residual_count]);
        let mut pos = self.residual_count;

        while pos < want {
            match self.inner.read(&mut self.buffer[pos..want]) {
                Ok(0) => break,
                Ok(n) => pos += n,
                // A signal landed mid-read; hand back what we have so the
                // caller can poll its run flag.
                Err(e) if e.kind() == ErrorKind::Interrupted => break,
                Err(_) => break,
            }
        }

        let residue = pos % SAMPLE_BYTES;
        if residue != 0 {
            pos -= residue;
            self.residual[..residue].copy_from_slice(&self.buffer[pos..pos + residue]);
        }
        self.residual_count = residue;

        let samples = pos / SAMPLE_BYTES;
        for (i, slot) in out.iter_mut().take(samples).enumerate() {
            let bytes = [
                self.buffer[i * SAMPLE_BYTES],
                self.buffer[i * SAMPLE_BYTES + 1],
                self.buffer[i * SAMPLE_BYTES + 2],
                self.buffer[i * SAMPLE_BYTES + 3],
            ];
            *slot = f32::from_ne_bytes(bytes);
        }

        samples
    }
}
