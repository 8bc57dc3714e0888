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

//! The basic group: 126,632 bytes, the quantum of data a DDS drive reads
//! or writes, assembled from 22 de-whitened sub-groups plus an optional
//! ECC3 sub-group.
//!
//! A basic group outlives any single pass over the tape. Its on-disk form
//! is four sidecar files (payload, validity, ECC region, ECC validity)
//! that are reloaded at the start of the next pass, so every re-read of a
//! damaged region gets a chance to fill in bytes the previous passes
//! missed.

use std::{fs, io, path::Path, path::PathBuf};

use bit_vec::BitVec;

use crate::{
    dds::group1::{Group1, SUB_GROUP_SIZE},
    ecc::{C3GroupWalk, Codeword, EccStatus},
    DatError,
};

/// Sub-groups per basic group.
pub const SUB_GROUPS: usize = 22;

/// Payload bytes per basic group.
pub const BASIC_GROUP_SIZE: usize = SUB_GROUPS * SUB_GROUP_SIZE;

pub struct BasicGroup {
    id: u32,
    data: Vec<u8>,
    valid: BitVec,
    ecc_data: Vec<u8>,
    ecc_valid: BitVec,
}

/// The four sidecar paths for a group id under an output directory.
pub fn sidecar_paths(dir: &Path, id: u32) -> [PathBuf; 4] {
    [
        dir.join(format!("g{:06}.bin", id)),
        dir.join(format!("g{:06}.val", id)),
        dir.join(format!("g{:06}.ecc.bin", id)),
        dir.join(format!("g{:06}.ecc.val", id)),
    ]
}

impl BasicGroup {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            data: vec![0; BASIC_GROUP_SIZE],
            valid: BitVec::from_elem(BASIC_GROUP_SIZE, false),
            ecc_data: vec![0; SUB_GROUP_SIZE],
            ecc_valid: BitVec::from_elem(SUB_GROUP_SIZE, false),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn valid(&self) -> &BitVec {
        &self.valid
    }

    pub fn ecc_data(&self) -> &[u8] {
        &self.ecc_data
    }

    pub fn ecc_valid(&self) -> &BitVec {
        &self.ecc_valid
    }

    /// Reload this group's state from a previous pass, if sidecars exist.
    /// Absent or short files simply leave the group empty.
    pub fn load_from_dir(&mut self, dir: &Path) -> bool {
        let [data_path, valid_path, ecc_path, ecc_valid_path] = sidecar_paths(dir, self.id);

        let loaded = (|| -> io::Result<()> {
            let data = fs::read(&data_path)?;
            let valid = fs::read(&valid_path)?;
            let ecc = fs::read(&ecc_path)?;
            let ecc_valid = fs::read(&ecc_valid_path)?;

            if data.len() != BASIC_GROUP_SIZE
                || valid.len() != BASIC_GROUP_SIZE
                || ecc.len() != SUB_GROUP_SIZE
                || ecc_valid.len() != SUB_GROUP_SIZE
            {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "short sidecar"));
            }

            self.data.copy_from_slice(&data);
            for (i, &v) in valid.iter().enumerate() {
                self.valid.set(i, v != 0);
            }
            self.ecc_data.copy_from_slice(&ecc);
            for (i, &v) in ecc_valid.iter().enumerate() {
                self.ecc_valid.set(i, v != 0);
            }
            Ok(())
        })();

        match loaded {
            Ok(()) => {
                log::info!("BasicGroup {}: reloaded prior pass from sidecars", self.id);
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("BasicGroup {}: sidecar reload failed: {}", self.id, e);
                false
            }
        }
    }

    /// Persist the group's payload, ECC region and both validity bitmaps.
    /// Validity is one byte per data byte, 0xFF for valid and 0x00 for
    /// invalid.
    pub fn dump_to_dir(&self, dir: &Path) -> Result<(), DatError> {
        let [data_path, valid_path, ecc_path, ecc_valid_path] = sidecar_paths(dir, self.id);

        let valid_bytes: Vec<u8> = (0..BASIC_GROUP_SIZE)
            .map(|i| if self.valid.get(i).unwrap_or(false) { 0xff } else { 0x00 })
            .collect();
        let ecc_valid_bytes: Vec<u8> = (0..SUB_GROUP_SIZE)
            .map(|i| if self.ecc_valid.get(i).unwrap_or(false) { 0xff } else { 0x00 })
            .collect();

        fs::write(&data_path, &self.data)?;
        fs::write(&valid_path, &valid_bytes)?;
        fs::write(&ecc_path, &self.ecc_data)?;
        fs::write(&ecc_valid_path, &ecc_valid_bytes)?;

        Ok(())
    }

    /// Merge one de-whitened sub-group into its slice of the group.
    ///
    /// Per-cell policy: a valid byte fills an invalid cell; two valid
    /// bytes that agree are a no-op; two valid bytes that disagree keep
    /// the earlier one and log the conflict; and an invalid byte may
    /// overwrite an invalid cell, because wholesale-erased blocks often
    /// still carry mostly-correct bytes worth keeping around for a human.
    pub fn add_sub_frame(&mut self, frame: &Group1) -> bool {
        if frame.basic_group_id() != self.id {
            log::error!(
                "BasicGroup {}: refusing sub-frame belonging to group {}",
                self.id,
                frame.basic_group_id()
            );
            return false;
        }

        // Sub-frame id 0 is never stored.
        if frame.sub_frame_id() == 0 {
            return true;
        }

        let is_ecc = frame.is_ecc_frame();
        let base = if is_ecc {
            0
        } else {
            SUB_GROUP_SIZE * (frame.sub_frame_id() as usize - 1)
        };

        let data = frame.data();
        let valid = frame.valid();

        for i in 0..SUB_GROUP_SIZE {
            let (stored, stored_valid) = if is_ecc {
                (self.ecc_data[i], self.ecc_valid.get(i).unwrap_or(false))
            } else {
                (self.data[base + i], self.valid.get(base + i).unwrap_or(false))
            };

            if valid[i] && !stored_valid {
                self.write_cell(is_ecc, base + i, data[i], true);
            } else if valid[i] && stored_valid {
                if data[i] != stored {
                    log::warn!(
                        "BasicGroup {}: reread mismatch in sub-group {} at offset {}: {:02x} vs {:02x}, keeping existing",
                        self.id,
                        frame.sub_frame_id(),
                        i,
                        stored,
                        data[i]
                    );
                }
            } else if !valid[i] && !stored_valid {
                self.write_cell(is_ecc, base + i, data[i], false);
            }
        }

        true
    }

    fn write_cell(&mut self, is_ecc: bool, offset: usize, value: u8, valid: bool) {
        if is_ecc {
            self.ecc_data[offset] = value;
            self.ecc_valid.set(offset, valid);
        } else {
            self.data[offset] = value;
            self.valid.set(offset, valid);
        }
    }

    /// Run ECC3 across the whole group, repairing whatever erasures the
    /// lower layers left behind. Returns true when no vector remained
    /// uncorrectable.
    pub fn correct(&mut self) -> bool {
        let mut c3 = Codeword::c3();
        let mut uncorrectable = 0usize;

        let mut walk = C3GroupWalk::new(
            &mut self.data,
            &mut self.valid,
            &mut self.ecc_data,
            &mut self.ecc_valid,
        );
        loop {
            c3.fill(&walk);
            match c3.correct() {
                EccStatus::NoErrors => {}
                EccStatus::Corrected => {
                    c3.dump(&mut walk);
                }
                EccStatus::Uncorrectable => {
                    uncorrectable += 1;
                }
            }
            if !walk.advance() {
                break;
            }
        }

        uncorrectable == 0
    }

    /// Test access to a single payload cell.
    #[cfg(test)]
    pub(crate) fn cell(&self, offset: usize) -> (u8, bool) {
        (self.data[offset], self.valid.get(offset).unwrap_or(false))
    }
}
