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

//! The slope-threshold RF front end.
//!
//! Where [`RfDecoder`](super::RfDecoder) slices levels, this front end
//! detects the magnetic pulses themselves: a symbol window's average slope
//! is compared against a threshold derived from the running signal level,
//! and each firing reports whether a pulse (a flux transition) was present.
//! Its bits are therefore already NRZI-decoded and should be framed
//! without a second NRZI pass.

use crate::{
    clock::{DifferentialClockDetector, SampleWindow},
    decoder::track_duration_samples,
    sink::SymbolSink,
    SYMBOL_RATE,
};

/// Slope threshold factor when the window crosses zero.
const PULSE_THRESHOLD_CROSSING: f32 = 0.72;

/// Slope threshold factor when it does not; a pulse without a crossing has
/// to climb much harder to be believed.
const PULSE_THRESHOLD_FLAT: f32 = 3.0;

pub struct SlopeDecoder<S: SymbolSink> {
    sink: S,

    samples_per_symbol: usize,
    clock_detector: DifferentialClockDetector,
    symbol_window: SampleWindow,

    /// EMA coefficient reaching 99% agreement on the signal level within
    /// 2000 symbols.
    level_alpha: f32,
    overall_signal_level: f32,

    track_duration: u64,
    track_in_progress: bool,
    track_sample_count: u64,
}

impl<S: SymbolSink> SlopeDecoder<S> {
    pub fn new(sample_rate: f64, sink: S) -> Self {
        let samples_per_symbol = (sample_rate / SYMBOL_RATE) as usize;
        Self {
            sink,
            samples_per_symbol,
            clock_detector: DifferentialClockDetector::new(samples_per_symbol, 0.97, 1.0 / 30.0),
            symbol_window: SampleWindow::new(samples_per_symbol),
            level_alpha: 0.01f32.powf(1.0 / (2000.0 * samples_per_symbol as f32)),
            overall_signal_level: 0.0,
            track_duration: track_duration_samples(sample_rate),
            track_in_progress: false,
            track_sample_count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.clock_detector.reset();
        self.symbol_window.reset();
        self.overall_signal_level = 0.0;
        self.track_in_progress = false;
        self.track_sample_count = 0;
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn process(&mut self, samples: &[f32]) {
        for &signal in samples {
            self.overall_signal_level *= self.level_alpha;
            self.overall_signal_level += (1.0 - self.level_alpha) * signal.abs();

            self.symbol_window.add(signal);

            let tick = self.clock_detector.add_and_detect(signal);
            if let Some(state) = tick.transition {
                self.sink.clock_detected(state);
            }

            if tick.fire {
                // The detector fires half a period past the pulse peak, so
                // the whole pulse sits centered in the window.
                let slope = self.symbol_window.slope();
                let factor = if self.symbol_window.crosses_zero() {
                    PULSE_THRESHOLD_CROSSING
                } else {
                    PULSE_THRESHOLD_FLAT
                };
                let threshold = self.overall_signal_level / self.samples_per_symbol as f32 * factor;

                self.sink.receive_bit(slope.abs() > threshold);
            }

            if !self.track_in_progress {
                if self.sink.preamble_detected() {
                    self.track_in_progress = true;
                    self.track_sample_count = self.track_duration;
                    log::debug!("SlopeDecoder::process(): track start");
                    self.sink.track_detected(true);
                }
            } else {
                self.track_sample_count -= 1;
                if self.track_sample_count == 0 {
                    self.track_in_progress = false;
                    log::debug!("SlopeDecoder::process(): track timer expired");
                    self.sink.track_detected(false);
                }
            }
        }
    }

    pub fn stop(&mut self) {
        self.sink.stop();
    }
}
