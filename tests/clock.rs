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

mod common;

use common::init;
use datfox::clock::DifferentialClockDetector;

const SAMPLES_PER_SYMBOL: usize = 8;
const DETECT_RATIO: f32 = 0.97;
const ALPHA: f32 = 1.0 / 30.0;

/// Prime the detector with symbols whose energy sits at offsets 3/4 of
/// each period: after locking, it must fire exactly once per symbol
/// period, half a period past the movement peak.
#[test]
fn differential_detector_fires_once_per_symbol_at_offset_seven() {
    init();
    let mut detector = DifferentialClockDetector::new(SAMPLES_PER_SYMBOL, DETECT_RATIO, ALPHA);

    for i in 0..10 * SAMPLES_PER_SYMBOL {
        let sample = match i % SAMPLES_PER_SYMBOL {
            3 => -1.0,
            4 => 1.0,
            _ => 0.0,
        };
        detector.add_and_detect(sample);
    }
    assert!(detector.detected());

    let mut fire_count = 0;
    let mut fire_position = 0;
    for i in 0..SAMPLES_PER_SYMBOL {
        let tick = detector.add_and_detect(0.0);
        if tick.fire {
            fire_count += 1;
            fire_position = i;
        }
    }

    assert_eq!(fire_count, 1);
    assert_eq!(fire_position, 7);
}

/// Acquisition is reported as a single transition, not re-announced on
/// every evaluation.
#[test]
fn acquisition_transition_fires_once() {
    init();
    let mut detector = DifferentialClockDetector::new(SAMPLES_PER_SYMBOL, DETECT_RATIO, ALPHA);

    let mut acquisitions = 0;
    for i in 0..50 * SAMPLES_PER_SYMBOL {
        let sample = match i % SAMPLES_PER_SYMBOL {
            3 => -1.0,
            4 => 1.0,
            _ => 0.0,
        };
        if detector.add_and_detect(sample).transition == Some(true) {
            acquisitions += 1;
        }
    }
    assert_eq!(acquisitions, 1);
    assert!(detector.detected());
}

/// When the signal degenerates to movement at every phase, the window
/// flattens, the min/max ratio climbs over the threshold, and the
/// detector must surface the detected→undetected transition so the
/// deframer can reset.
#[test]
fn detector_reports_loss_transition() {
    init();
    let mut detector = DifferentialClockDetector::new(SAMPLES_PER_SYMBOL, DETECT_RATIO, ALPHA);

    for i in 0..20 * SAMPLES_PER_SYMBOL {
        let sample = match i % SAMPLES_PER_SYMBOL {
            3 => -1.0,
            4 => 1.0,
            _ => 0.0,
        };
        detector.add_and_detect(sample);
    }
    assert!(detector.detected());

    // A square wave toggling on every sample deposits the same |delta|
    // into every cell of the ring.
    let mut saw_loss = false;
    for i in 0..2000 * SAMPLES_PER_SYMBOL {
        let sample = if i % 2 == 0 { 0.5 } else { -0.5 };
        if detector.add_and_detect(sample).transition == Some(false) {
            saw_loss = true;
            break;
        }
    }
    assert!(saw_loss);
}
