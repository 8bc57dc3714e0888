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

//! The track framer collects blocks into tracks and pairs consecutive
//! tracks into frames.
//!
//! Whether two tracks belong together is not the framer's call: DAT pairs
//! on identical absolute time (pack 2) and DDS on identical absolute frame
//! number (pack 3), so the downstream frame receiver owns the predicate.
//! When a pair fails, the older track is discarded and the newer one kept;
//! losing a lone track is normal around dropouts, not an error.

use crate::{
    block::Block,
    sink::{BlockSink, FrameSink},
    track::{Track, TrackHead},
};

/// ATF3 sightings needed before a track is declared negative-azimuth.
const ATF3_THRESHOLD: u32 = 10;

pub struct TrackFramer<R: FrameSink> {
    receiver: R,
    tracking: bool,

    current: Box<Track>,
    last: Option<Box<Track>>,

    atf2_count: u32,
    atf3_count: u32,
}

impl<R: FrameSink> TrackFramer<R> {
    pub fn new(receiver: R) -> Self {
        Self {
            receiver,
            tracking: false,
            current: Box::new(Track::new(TrackHead::Unknown)),
            last: None,
            atf2_count: 0,
            atf3_count: 0,
        }
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }
}

impl<R: FrameSink> BlockSink for TrackFramer<R> {
    fn receive_block(&mut self, block: &Block) {
        if !self.tracking {
            // Blocks outside a track boundary shouldn't happen.
            return;
        }
        self.current.add_block(block);
    }

    fn track_detected(&mut self, start: bool) {
        self.tracking = start;

        if start {
            return;
        }

        // The head pass is over; let the track run its error correction and
        // parse its sub-codes.
        self.current.complete();

        // Only ATF3, the negative-azimuth pilot, is reliably observed; a
        // strong count marks an A track, and everything else stays unknown.
        log::debug!("TrackFramer: track ATF3 count {}", self.atf3_count);
        if self.atf3_count > ATF3_THRESHOLD {
            self.current.set_head(TrackHead::A);
        }

        let current = std::mem::replace(&mut self.current, Box::new(Track::new(TrackHead::Unknown)));

        match self.last.take() {
            None => {
                self.last = Some(current);
            }
            Some(last) => {
                if self.receiver.is_frame(&last, &current) {
                    self.receiver.receive_frame(&last, &current);
                } else {
                    // No pair. Dump the older track and keep searching.
                    self.last = Some(current);
                }
            }
        }

        self.atf2_count = 0;
        self.atf3_count = 0;
    }

    fn receive_atf_tone(&mut self, tone: u8) {
        match tone {
            2 => self.atf2_count += 1,
            3 => self.atf3_count += 1,
            _ => {}
        }
    }

    fn stop(&mut self) {
        if self.tracking {
            self.track_detected(false);
        }
        self.receiver.stop();
    }
}
