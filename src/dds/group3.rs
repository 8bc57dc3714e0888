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

//! The G3 sub-group (ECMA-139 §9.3.3): a DAT frame reinterpreted as one of
//! the 22 pieces of a DDS basic group.
//!
//! Layout of the demultiplexed frame:
//!
//! ```text
//!               +-----------------+-----------------+
//! Channel    -> |        A        |        B        |
//!               +--------+--------+--------+--------+
//! Byte name  -> | lower  | upper  | lower  | upper  |
//!        +------+========+========+========+========+
//! Header |    0 |0000DFID| LF-ID  |0000DFID|  LF-ID |
//!        +------+--------+--------+--------+--------+
//!        |    1 |   D0   |   D1   |   D2   |   D3   |
//!        |  ... |   ...  |   ...  |   ...  |   ...  |
//!        | 1439 | D5752  | D5753  | D5754  | D5755  |
//!        +------+--------+--------+--------+--------+
//!        | 1440 |   All bytes set to zero           |
//!        |  ... |                                   |
//!        +------+-----------------------------------+
//! ```

use thiserror::Error;

use crate::{
    dds::subcode::{Pack1, Pack2, Pack3, Pack4},
    frame::DatFrame,
    track::Track,
};

/// Tape area identifiers (§9.4.9.1.1, the SW1 byte). Three bits, carried
/// alongside the single-bit partition marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Area {
    Device,
    Reference,
    System,
    Data,
    EndOfData,
}

impl Area {
    pub fn from_id(id: u8) -> Option<Area> {
        match id {
            0 => Some(Area::Device),
            1 => Some(Area::Reference),
            2 => Some(Area::System),
            4 => Some(Area::Data),
            5 => Some(Area::EndOfData),
            _ => None,
        }
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Area::Device => write!(f, "DEVICE"),
            Area::Reference => write!(f, "REFERENCE"),
            Area::System => write!(f, "SYSTEM"),
            Area::Data => write!(f, "DATA"),
            Area::EndOfData => write!(f, "END-OF-DATA"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Partition {
    Zero,
    One,
}

/// Everything that can go sideways while assembling a G3 sub-group from a
/// track pair. These are statuses, not failures: the receiver logs them
/// and still processes the frame as far as its fields allow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Group3Status {
    #[error("DECODE_OK")]
    DecodeOk,
    #[error("A_MISSING_SUBCODE_3")]
    AMissingSubcode3,
    #[error("B_MISSING_SUBCODE_3")]
    BMissingSubcode3,
    #[error("MISSING_SUBCODE_1")]
    MissingSubcode1,
    #[error("MISSING_SUBCODE_2")]
    MissingSubcode2,
    #[error("MISSING_SUBCODE_4")]
    MissingSubcode4,
    #[error("ABSOLUTE_FRAME_MISMATCH")]
    AbsoluteFrameMismatch,
    #[error("LOGICAL_FRAME_MISMATCH")]
    LogicalFrameMismatch,
    #[error("UNKNOWN_AREA_ID")]
    UnknownAreaId,
    #[error("C2_ERRORS_PRESENT")]
    C2ErrorsPresent,
    #[error("INVALID_HEADER")]
    InvalidHeader,
    #[error("CHECKSUM_MISMATCH")]
    ChecksumMismatch,
}

impl Group3Status {
    /// Whether the decoded frame's identity fields (basic group, logical
    /// frame) and payload were actually filled in, so the accumulator can
    /// use them. Statuses raised before the sub-code fetches leave the
    /// sub-group unusable.
    pub fn frame_usable(&self) -> bool {
        matches!(
            self,
            Group3Status::DecodeOk
                | Group3Status::C2ErrorsPresent
                | Group3Status::InvalidHeader
                | Group3Status::ChecksumMismatch
        )
    }
}

pub struct Group3 {
    frame: DatFrame,

    area: Option<Area>,
    partition: Partition,
    absolute_frame_id: u32,

    basic_group_id: u32,
    logical_frame_id: u8,
    is_last_logical_frame: bool,
    is_ecc3_frame: bool,

    separator1_count: u32,
    separator2_count: u16,
    record_count: u32,

    /// Result of the half-column checksum comparison, when computed.
    checksums_match: Option<bool>,
}

impl Default for Group3 {
    fn default() -> Self {
        Self {
            frame: DatFrame::default(),
            area: None,
            partition: Partition::Zero,
            absolute_frame_id: 0,
            basic_group_id: 0,
            logical_frame_id: 0,
            is_last_logical_frame: false,
            is_ecc3_frame: false,
            separator1_count: 0,
            separator2_count: 0,
            record_count: 0,
            checksums_match: None,
        }
    }
}

impl Group3 {
    /// Assemble a sub-group from a received track pair.
    pub fn decode(a: &Track, b: &Track) -> (Group3, Group3Status) {
        let mut group = Group3::default();
        let status = group.decode_frame(a, b);
        (group, status)
    }

    fn decode_frame(&mut self, a: &Track, b: &Track) -> Group3Status {
        // Both tracks must identify themselves with pack 3; the pairing
        // protocol upstream should already have checked agreement, but the
        // check is cheap and the stakes are a whole sub-group.
        let a3 = match a.subcode(Pack3::ID) {
            Some(item) => Pack3::decode(item),
            None => return Group3Status::AMissingSubcode3,
        };
        let b3 = match b.subcode(Pack3::ID) {
            Some(item) => Pack3::decode(item),
            None => return Group3Status::BMissingSubcode3,
        };

        if a3.absolute_frame_id != b3.absolute_frame_id {
            return Group3Status::AbsoluteFrameMismatch;
        }

        self.partition = if a3.partition_id != 0 { Partition::One } else { Partition::Zero };
        self.area = Area::from_id(a3.area_id);
        self.absolute_frame_id = a3.absolute_frame_id;

        match self.area {
            Some(Area::Device) | Some(Area::Reference) | Some(Area::System) | Some(Area::EndOfData) => {
                // Nothing beyond the area identifier is decoded for these.
                Group3Status::DecodeOk
            }
            Some(Area::Data) => {
                if a3.logical_frame_id != b3.logical_frame_id {
                    return Group3Status::LogicalFrameMismatch;
                }
                self.decode_data_area_frame(&a3, a, b)
            }
            None => Group3Status::UnknownAreaId,
        }
    }

    fn decode_data_area_frame(&mut self, sub3: &Pack3, a: &Track, b: &Track) -> Group3Status {
        self.logical_frame_id = sub3.logical_frame_id;
        self.is_last_logical_frame = sub3.is_last_logical_frame;
        self.is_ecc3_frame = sub3.is_ecc3_frame;

        let sub1 = match get_subcode_pack(Pack1::ID, a, b) {
            Some(item) => Pack1::decode(item),
            None => return Group3Status::MissingSubcode1,
        };
        self.basic_group_id = sub1.group as u32;
        self.separator1_count = sub1.separator1_count;

        let sub2 = match get_subcode_pack(Pack2::ID, a, b) {
            Some(item) => Pack2::decode(item),
            None => return Group3Status::MissingSubcode2,
        };
        self.separator2_count = sub2.separator2_count;
        self.record_count = sub2.record_count;

        // The LFID byte as it was originally written, reassembled from its
        // parsed parts.
        let original_lfid = self.logical_frame_id
            | if self.is_ecc3_frame { 0x40 } else { 0 }
            | if self.is_last_logical_frame { 0x80 } else { 0 };

        let sub4 = match get_subcode_pack(Pack4::ID, a, b) {
            Some(item) => Pack4::decode(item),
            None => return Group3Status::MissingSubcode4,
        };

        self.frame.fill_from_track_pair(a, b);

        if !self.frame.ok() {
            // The payload has known holes. Hand it up anyway; the basic
            // group accumulator and C3 may still pull the data through.
            return Group3Status::C2ErrorsPresent;
        }

        let data = self.frame.data();

        // The header row repeats the LFID in bytes 1 and 3, with zero
        // format identifiers in bytes 0 and 2.
        if data[0][1] != original_lfid
            || data[0][3] != original_lfid
            || data[0][0] != 0
            || data[0][2] != 0
        {
            return Group3Status::InvalidHeader;
        }

        // Half-column checksums (§9.4.3.3.1, §9.4.4.3.1). c1 and c3 are
        // seeded with the LFID byte.
        let di = |i: usize| data[i / 4 + 1][i % 4];

        let mut r_c1 = original_lfid;
        let mut r_c2 = 0u8;
        let mut r_c3 = original_lfid;
        let mut r_c4 = 0u8;

        for i in 0..719 {
            r_c1 ^= di(8 * i + 3) ^ di(8 * i + 5) ^ di(5755);
            r_c2 ^= di(8 * i + 2) ^ di(8 * i + 4) ^ di(5754);
            r_c3 ^= di(1) ^ di(8 * (i + 1) - 1) ^ di(8 * (i + 1) + 1);
            r_c4 ^= di(0) ^ di(8 * (i + 1) - 2) ^ di(8 * (i + 1));
        }

        let matches = r_c1 == sub3.checksum1
            && r_c2 == sub3.checksum2
            && r_c3 == sub4.checksum3
            && r_c4 == sub4.checksum4;
        self.checksums_match = Some(matches);

        if !matches {
            // Surfaced but not fatal: C1/C2 already vouched for every byte
            // the checksums cover, so a mismatch says more about the
            // sub-code packs than about the payload.
            log::warn!(
                "Group3: half-column checksum mismatch ({:02x}/{:02x} {:02x}/{:02x} {:02x}/{:02x} {:02x}/{:02x})",
                r_c1,
                sub3.checksum1,
                r_c2,
                sub3.checksum2,
                r_c3,
                sub4.checksum3,
                r_c4,
                sub4.checksum4
            );
            return Group3Status::ChecksumMismatch;
        }

        Group3Status::DecodeOk
    }

    pub fn frame(&self) -> &DatFrame {
        &self.frame
    }

    /// The tape area this frame purports to belong to, if its identifier
    /// was recognized.
    pub fn area(&self) -> Option<Area> {
        self.area
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn absolute_frame_id(&self) -> u32 {
        self.absolute_frame_id
    }

    pub fn basic_group_id(&self) -> u32 {
        self.basic_group_id
    }

    pub fn logical_frame_id(&self) -> u8 {
        self.logical_frame_id
    }

    pub fn is_last_logical_frame(&self) -> bool {
        self.is_last_logical_frame
    }

    pub fn is_ecc3_frame(&self) -> bool {
        self.is_ecc3_frame
    }

    pub fn separator1_count(&self) -> u32 {
        self.separator1_count
    }

    pub fn separator2_count(&self) -> u16 {
        self.separator2_count
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Whether the computed half-column checksums matched the sub-code
    /// packs' copies. `None` when decode never got that far.
    pub fn checksums_match(&self) -> Option<bool> {
        self.checksums_match
    }
}

/// The first valid copy of a sub-code pack from either track.
fn get_subcode_pack<'a>(id: usize, a: &'a Track, b: &'a Track) -> Option<&'a [u8; 7]> {
    a.subcode(id).or_else(|| b.subcode(id))
}
