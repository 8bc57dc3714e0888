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

//! DDS: recovering computer data from the DAT frame stream.
//!
//! Frames become G3 sub-groups, G3 sub-groups are de-whitened into G1
//! sub-groups, and 22 G1 sub-groups accumulate into a basic group that
//! gets a final ECC3 pass and is persisted with its validity bitmaps.

pub mod basic_group;
pub mod group1;
pub mod group3;
pub mod subcode;

pub use basic_group::{BasicGroup, BASIC_GROUP_SIZE};
pub use group1::{Group1, SUB_GROUP_SIZE};
pub use group3::{Area, Group3, Group3Status, Partition};

use std::path::PathBuf;

use crate::{
    dds::subcode::Pack3,
    sink::FrameSink,
    track::Track,
};

/// Session tracking: a frame with the end-of-data area while reading data
/// ends the session; any other area after that begins the next one. Data
/// past an EOD mark can carry stale duplicate group identifiers, so only
/// one selected session is ever accumulated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SessionState {
    Data,
    EndOfTape,
}

pub struct DdsReceiver {
    output_directory: Option<PathBuf>,
    group: Option<BasicGroup>,

    dump_session: u32,
    current_session: u32,
    state: SessionState,
}

impl Default for DdsReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl DdsReceiver {
    pub fn new() -> Self {
        Self {
            output_directory: None,
            group: None,
            dump_session: 0,
            current_session: 0,
            state: SessionState::Data,
        }
    }

    /// Dump recovered basic groups into the given directory.
    pub fn dump_to_directory<P: Into<PathBuf>>(&mut self, dir: P) {
        self.output_directory = Some(dir.into());
    }

    /// Select which tape session to dump. Most tapes have exactly one;
    /// data recovery sometimes needs what lies beyond an end-of-data mark.
    pub fn dump_session(&mut self, session: u32) {
        self.dump_session = session;
    }

    fn add_frame(&mut self, g3: &Group3) {
        // Finalize the active group when this frame belongs elsewhere.
        let group_changed = self
            .group
            .as_ref()
            .is_some_and(|group| group.id() != g3.basic_group_id());
        if group_changed {
            self.finalize_group();
        }

        if self.group.is_none() {
            let mut group = BasicGroup::new(g3.basic_group_id());
            if let Some(dir) = &self.output_directory {
                // A previous pass may already have recovered parts of this
                // group.
                group.load_from_dir(dir);
            }
            self.group = Some(group);
        }

        let g1 = Group1::from_group3(g3);

        if let Some(group) = self.group.as_mut() {
            group.add_sub_frame(&g1);
        }

        if g3.is_last_logical_frame() {
            self.finalize_group();
        }
    }

    fn finalize_group(&mut self) {
        let Some(mut group) = self.group.take() else {
            return;
        };

        let correct = group.correct();
        log::info!(
            "Group ECC3    : {} (Group {})",
            if correct { "GOOD" } else { "----BAD---" },
            group.id()
        );

        if let Some(dir) = &self.output_directory {
            if let Err(e) = group.dump_to_dir(dir) {
                // Advisory: other groups can still be recovered.
                log::error!("BasicGroup {}: sidecar write failed: {}", group.id(), e);
            }
        }
    }
}

impl FrameSink for DdsReceiver {
    /// DDS tracks pair when both carry pack 3 with identical contents.
    fn is_frame(&mut self, a: &Track, b: &Track) -> bool {
        match (a.subcode(Pack3::ID), b.subcode(Pack3::ID)) {
            (Some(a_frame), Some(b_frame)) => a_frame == b_frame,
            _ => false,
        }
    }

    fn receive_frame(&mut self, a: &Track, b: &Track) {
        let (g3, status) = Group3::decode(a, b);

        if status != Group3Status::DecodeOk {
            log::info!("Group 3 decode: {}", status);
        }

        match g3.area() {
            Some(area) => log::info!("Area          : {}", area),
            None => log::info!("Area          : ?"),
        }
        log::info!("Absolute frame: {:06}", g3.absolute_frame_id());
        log::info!("Basic Group   : {:05}", g3.basic_group_id());
        log::info!(
            "Sub frame     : {:02}{}{}",
            g3.logical_frame_id(),
            if g3.is_last_logical_frame() { " (Last of group)" } else { "" },
            if g3.is_ecc3_frame() { " (ECC3)" } else { "" }
        );
        log::info!("File          : {:04}", g3.separator1_count());
        log::info!("Record        : 0x{:08x}", g3.record_count());

        let frame = g3.frame();
        let c1_errors = frame.c1_errors();
        let c1_uncorrectable = frame.c1_uncorrectable_errors();
        let c2_uncorrectable = frame.c2_uncorrectable_errors();
        let c1_corrected = c1_errors - c1_uncorrectable;
        // Aligned burst damage can fail more C2 vectors than C1 vectors,
        // so the "corrected by C2" figure is clamped at zero.
        let c2_corrected = c1_uncorrectable.saturating_sub(c2_uncorrectable);

        if c2_uncorrectable > 0 {
            log::info!(
                "Errors  C1/C2 : {}/{} {} UNCORRECTED",
                c1_corrected,
                c2_corrected,
                c2_uncorrectable
            );
        } else {
            log::info!("Errors  C1/C2 : {}/{} (all corrected)", c1_corrected, c2_corrected);
        }

        match self.state {
            SessionState::Data => {
                if g3.area() == Some(Area::EndOfData) {
                    self.state = SessionState::EndOfTape;
                }
            }
            SessionState::EndOfTape => {
                if g3.area() != Some(Area::EndOfData) {
                    self.current_session += 1;
                    self.state = SessionState::Data;
                    log::info!("------------------------ START OF SESSION {}", self.current_session);
                }
            }
        }

        // Accumulate only within the selected session, and stop cold at
        // its end-of-data mark: frames past it may reuse group identifiers
        // and would corrupt groups already assembled.
        if self.output_directory.is_some() && self.current_session == self.dump_session {
            if g3.area() == Some(Area::EndOfData) {
                if self.group.is_some() {
                    self.finalize_group();
                }
            } else if g3.area() == Some(Area::Data) && status.frame_usable() {
                self.add_frame(&g3);
            }
        }
    }

    fn stop(&mut self) {
        if self.group.is_some() && self.output_directory.is_some() {
            self.finalize_group();
        }
    }
}
