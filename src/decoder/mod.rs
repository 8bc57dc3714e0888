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

//! RF front ends: the sample pumps that turn the raw head waveform into a
//! bit stream, plus track start/stop timing.
//!
//! [`RfDecoder`] is the production front end. It recovers the symbol clock
//! from the zero-crossing envelope of the waveform and slices bits from the
//! sign of an integrator, which makes it robust against amplitude fades.
//! [`SlopeDecoder`](slope::SlopeDecoder) is the alternative front end that
//! detects magnetic pulses from the waveform slope directly.

pub mod slope;

use crate::{sink::SymbolSink, SYMBOL_RATE};

/// Blocks in one head pass, counting the preamble and postamble blocks that
/// surround the 144 payload blocks.
pub(crate) const TRACK_BLOCK_PERIODS: f64 = 196.0;

/// Words per block times symbols per word.
pub(crate) const TRACK_SYMBOLS_PER_BLOCK: f64 = 36.0 * 10.0;

/// Padding applied to the nominal track duration. The timer is a heuristic;
/// 5% covers tape speed wander without swallowing the next track.
pub(crate) const TRACK_DURATION_TOLERANCE: f64 = 1.05;

/// ATF pilot tones sit far below the channel rate, so they show up as long
/// runs without a zero crossing. Runs in this band (in samples at 8×
/// oversampling) are counted as ATF3 sightings.
const ATF3_RUN_MIN: u32 = 200;
const ATF3_RUN_MAX: u32 = 400;

pub(crate) fn track_duration_samples(sample_rate: f64) -> u64 {
    ((sample_rate / SYMBOL_RATE) * TRACK_SYMBOLS_PER_BLOCK * TRACK_BLOCK_PERIODS * TRACK_DURATION_TOLERANCE)
        as u64
}

/// The envelope-based RF front end.
///
/// A ring with one cell per sample phase accumulates an EMA of the
/// zero-crossing indicator. The phase with the most crossings is where
/// symbols change; bits are sampled diametrically opposite it, from the
/// sign of an integrator that sums the raw waveform between firings.
pub struct RfDecoder<S: SymbolSink> {
    sink: S,

    window: Vec<f32>,
    window_size: usize,
    cur_pos: usize,
    sync_pos: usize,
    eval_pos: usize,
    next_eval_pos: usize,

    clock_detected: bool,
    clock_ratio_threshold: f32,
    clock_alpha: f32,

    integrator: f32,
    last_sign: bool,

    track_duration: u64,
    track_in_progress: bool,
    track_sample_count: u64,

    atf_run: u32,
}

impl<S: SymbolSink> RfDecoder<S> {
    pub fn new(sample_rate: f64, sink: S) -> Self {
        let window_size = (sample_rate / SYMBOL_RATE) as usize;
        Self {
            sink,
            window: vec![0.0; window_size],
            window_size,
            cur_pos: 0,
            sync_pos: 0,
            eval_pos: window_size / 2,
            next_eval_pos: window_size / 2,
            clock_detected: false,
            clock_ratio_threshold: 0.97,
            clock_alpha: 1.0 / 30.0,
            integrator: 0.0,
            last_sign: false,
            track_duration: track_duration_samples(sample_rate),
            track_in_progress: false,
            track_sample_count: 0,
            atf_run: 0,
        }
    }

    pub fn set_clock_ratio_threshold(&mut self, threshold: f32) {
        self.clock_ratio_threshold = threshold;
    }

    pub fn set_clock_alpha(&mut self, alpha: f32) {
        self.clock_alpha = alpha;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Push a chunk of raw samples through the decoder.
    pub fn process(&mut self, samples: &[f32]) {
        for &signal in samples {
            let sign = signal > 0.0;
            let zero_cross = sign != self.last_sign;

            // Long crossing-free stretches are not data; they are the
            // low-frequency ATF pilot the servo uses to find the track.
            if zero_cross {
                if (ATF3_RUN_MIN..=ATF3_RUN_MAX).contains(&self.atf_run) {
                    self.sink.receive_atf_tone(3);
                }
                self.atf_run = 0;
            } else {
                self.atf_run = self.atf_run.saturating_add(1);
            }

            if self.clock_detect(zero_cross) {
                // The clock says to sample now. Dump the integrator.
                self.sink.receive_bit(self.integrator > 0.0);
                self.integrator = 0.0;
            }

            self.integrator += signal;
            self.last_sign = sign;

            if !self.track_in_progress {
                if self.sink.preamble_detected() {
                    // A track appears to have started. Arm the duration
                    // timer and tell the chain.
                    self.track_in_progress = true;
                    self.track_sample_count = self.track_duration;
                    log::debug!("RfDecoder::process(): track start, timer {} samples", self.track_duration);
                    self.sink.track_detected(true);
                }
            } else {
                self.track_sample_count -= 1;
                if self.track_sample_count == 0 {
                    self.track_in_progress = false;
                    log::debug!("RfDecoder::process(): track timer expired");
                    self.sink.track_detected(false);
                }
            }
        }
    }

    /// No further input is coming.
    pub fn stop(&mut self) {
        self.sink.stop();
    }

    /// Absorb one zero-crossing observation. Returns true when the signal
    /// should be sampled on this very sample.
    fn clock_detect(&mut self, crossing: bool) -> bool {
        let mut sync_now = false;

        let energy = if crossing { 1.0 } else { 0.0 };
        self.window[self.cur_pos] *= 1.0 - self.clock_alpha;
        self.window[self.cur_pos] += energy * self.clock_alpha;

        if self.cur_pos == self.sync_pos {
            sync_now = true;
            // Staggered update of the evaluation position from the last
            // ring scan.
            self.eval_pos = self.next_eval_pos;
        }

        if self.cur_pos == self.eval_pos {
            self.evaluate_clock();
        }

        self.cur_pos += 1;
        if self.cur_pos == self.window_size {
            self.cur_pos = 0;
        }

        self.clock_detected && sync_now
    }

    /// Rescan the ring for the strongest crossing phase and requalify the
    /// lock from the min/max ratio.
    fn evaluate_clock(&mut self) {
        let mut max = 0.0f32;
        let mut min = 100.0f32;
        let mut max_i = 0usize;

        for (i, &v) in self.window.iter().enumerate() {
            if v > max {
                max = v;
                max_i = i;
            }
            if v < min {
                min = v;
            }
        }

        if max_i != self.sync_pos {
            // New synchronization point; evaluate diametrically opposite it
            // from now on.
            self.sync_pos = max_i;
            self.next_eval_pos = (max_i + self.window_size / 2) % self.window_size;
        }

        let ratio = if max > 0.0 { min / max } else { 0.0 };

        if ratio < self.clock_ratio_threshold {
            if !self.clock_detected {
                log::debug!("RfDecoder::evaluate_clock(): clock acquired, ratio {:.3}", ratio);
                self.sink.clock_detected(true);
            }
            self.clock_detected = true;
        } else {
            if self.clock_detected {
                log::debug!("RfDecoder::evaluate_clock(): clock lost, ratio {:.3}", ratio);
                self.sink.clock_detected(false);
            }
            self.clock_detected = false;
        }
    }
}
