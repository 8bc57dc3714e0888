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

/// A ring of the last N samples with two derived queries: the average slope
/// across the window, and whether the oldest and newest samples sit on
/// opposite sides of zero. One symbol period wide in practice.
pub struct SampleWindow {
    size: usize,
    window: Vec<f32>,
    next_position: usize,
}

impl SampleWindow {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            window: vec![0.0; size],
            next_position: 0,
        }
    }

    pub fn reset(&mut self) {
        self.window.fill(0.0);
    }

    pub fn add(&mut self, sample: f32) {
        self.window[self.next_position] = sample;
        self.next_position = (self.next_position + 1) % self.size;
    }

    /// Average rise per sample between the oldest and newest entries.
    pub fn slope(&self) -> f32 {
        let newest = (self.next_position + self.size - 1) % self.size;
        let oldest = self.next_position;
        (self.window[newest] - self.window[oldest]) / self.size as f32
    }

    /// Did the signal change sign across the window?
    pub fn crosses_zero(&self) -> bool {
        let newest = (self.next_position + self.size - 1) % self.size;
        let oldest = self.next_position;
        (self.window[newest] > 0.0) != (self.window[oldest] > 0.0)
    }
}
