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

/// What one sample did to the clock: whether the symbol should be evaluated
/// right now, and whether the lock state just changed.
#[derive(Copy, Clone, Debug, Default)]
pub struct ClockTick {
    /// Evaluate the symbol window now.
    pub fire: bool,
    /// `Some(state)` when the detected/undetected state transitioned on
    /// this sample.
    pub transition: Option<bool>,
}

/// In N samples there are N−1 differentials, so the best evaluation point
/// sits half that distance past the maximum-differential phase.
#[inline]
fn fire_position(pos: usize, num_samples: usize) -> usize {
    (pos + (num_samples - 1) / 2) % num_samples
}

/// Clock recovery from sample-to-sample movement. Each ring cell tracks an
/// EMA of |delta| at one sample phase; the phase where the signal moves the
/// most marks the symbol transition, and symbols are evaluated half a
/// period later. A flat ring (min/max ratio above the threshold) means no
/// usable clock.
pub struct DifferentialClockDetector {
    window_size: usize,
    alpha: f32,
    detection_threshold_ratio: f32,

    window: Vec<f32>,
    last_sample: f32,
    detected: bool,

    /// Phase of the strongest historical differential; also where the next
    /// firing position is adopted.
    maximum_diff_pos: usize,
    sync_pos: usize,
    next_sync_pos: usize,
    current_pos: usize,
}

impl DifferentialClockDetector {
    pub fn new(samples_per_symbol: usize, detect_threshold_ratio: f32, clock_alpha: f32) -> Self {
        let mut detector = Self {
            window_size: samples_per_symbol,
            alpha: clock_alpha,
            detection_threshold_ratio: detect_threshold_ratio,
            window: vec![0.0; samples_per_symbol],
            last_sample: 0.0,
            detected: false,
            maximum_diff_pos: 0,
            sync_pos: 0,
            next_sync_pos: 0,
            current_pos: 0,
        };
        detector.reset();
        detector
    }

    pub fn reset(&mut self) {
        self.last_sample = 0.0;
        self.maximum_diff_pos = 0;
        self.next_sync_pos = fire_position(self.maximum_diff_pos, self.window_size);
        self.sync_pos = self.next_sync_pos;
        self.detected = false;
        self.current_pos = 0;
        self.window.fill(0.0);
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Absorb one sample. The returned tick says whether the caller should
    /// evaluate its symbol window now.
    pub fn add_and_detect(&mut self, sample: f32) -> ClockTick {
        let mut tick = ClockTick::default();

        let difference = sample - self.last_sample;

        self.window[self.current_pos] *= 1.0 - self.alpha;
        self.window[self.current_pos] += difference.abs() * self.alpha;

        if self.current_pos == self.maximum_diff_pos {
            // Staggered update: adopt the firing position queued by the
            // last evaluation.
            self.sync_pos = self.next_sync_pos;
        } else if self.current_pos == self.sync_pos {
            tick.fire = true;
            tick.transition = self.evaluate_clock();
        }

        self.current_pos += 1;
        self.last_sample = sample;

        if self.current_pos == self.window_size {
            self.current_pos = 0;
        }

        tick.fire = tick.fire && self.detected;
        tick
    }

    /// Rescan the ring for the strongest differential and requalify the
    /// lock. Returns the new state on a transition.
    fn evaluate_clock(&mut self) -> Option<bool> {
        let mut max = self.window[0];
        let mut min = self.window[0];
        let mut max_i = 0;

        for (i, &v) in self.window.iter().enumerate().skip(1) {
            if v > max {
                max = v;
                max_i = i;
            }
            if v < min {
                min = v;
            }
        }

        if max_i != self.maximum_diff_pos {
            self.maximum_diff_pos = max_i;
            self.next_sync_pos = fire_position(self.maximum_diff_pos, self.window_size);
        }

        let ratio = if max > 0.0 { min / max } else { 0.0 };
        let new_state = ratio <= self.detection_threshold_ratio;

        let transition = (new_state != self.detected).then_some(new_state);
        self.detected = new_state;
        transition
    }
}
