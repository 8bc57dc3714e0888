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

//! DDS sub-code pack items 1 through 4 (ECMA-139 §9.4). All multi-byte
//! fields are big-endian.

fn decode_u16(bytes: &[u8]) -> u16 {
    (bytes[0] as u16) << 8 | bytes[1] as u16
}

fn decode_u24(bytes: &[u8]) -> u32 {
    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
}

fn decode_u32(bytes: &[u8]) -> u32 {
    (bytes[0] as u32) << 24 | (bytes[1] as u32) << 16 | (bytes[2] as u32) << 8 | bytes[3] as u32
}

/// Pack item no. 1: the running file number (separator 1 count) and the
/// running basic group within that file.
#[derive(Copy, Clone, Debug)]
pub struct Pack1 {
    pub position: u8,
    pub group: u16,
    pub separator1_count: u32,
}

impl Pack1 {
    pub const ID: usize = 1;

    pub fn decode(bytes: &[u8; 7]) -> Self {
        Self {
            position: bytes[0] & 7,
            group: decode_u16(&bytes[1..]),
            separator1_count: decode_u32(&bytes[3..]),
        }
    }
}

/// Pack item no. 2: the running separator 2 (set mark) count and record
/// count.
#[derive(Copy, Clone, Debug)]
pub struct Pack2 {
    pub repetitions: u8,
    pub separator2_count: u16,
    pub record_count: u32,
}

impl Pack2 {
    pub const ID: usize = 2;

    pub fn decode(bytes: &[u8; 7]) -> Self {
        Self {
            repetitions: bytes[0] & 7,
            separator2_count: decode_u16(&bytes[1..]),
            record_count: decode_u32(&bytes[3..]),
        }
    }
}

/// Pack item no. 3: the absolute frame number (unique across the tape),
/// the logical frame number within the current basic group, and two of
/// the four half-column checksums.
#[derive(Copy, Clone, Debug)]
pub struct Pack3 {
    pub partition_id: u8,
    pub area_id: u8,
    pub absolute_frame_id: u32,
    pub checksum1: u8,
    pub checksum2: u8,
    pub logical_frame_id: u8,
    pub is_last_logical_frame: bool,
    pub is_ecc3_frame: bool,
}

impl Pack3 {
    pub const ID: usize = 3;

    pub fn decode(bytes: &[u8; 7]) -> Self {
        let lfid = bytes[6];
        Self {
            partition_id: if bytes[0] & 8 != 0 { 1 } else { 0 },
            area_id: bytes[0] & 7,
            absolute_frame_id: decode_u24(&bytes[1..]),
            checksum1: bytes[4],
            checksum2: bytes[5],
            logical_frame_id: lfid & 0x3f,
            is_last_logical_frame: lfid & 0x80 != 0,
            is_ecc3_frame: lfid & 0x40 != 0,
        }
    }
}

/// Pack item no. 4: mostly redundant with pack 3, but carries the other
/// two half-column checksums.
#[derive(Copy, Clone, Debug)]
pub struct Pack4 {
    pub partition_id: u8,
    pub area_id: u8,
    pub absolute_frame_id: u32,
    pub checksum3: u8,
    pub checksum4: u8,
    pub logical_frame_id: u8,
    pub is_last_logical_frame: bool,
    pub is_ecc3_frame: bool,
}

impl Pack4 {
    pub const ID: usize = 4;

    pub fn decode(bytes: &[u8; 7]) -> Self {
        let lfid = bytes[6];
        Self {
            partition_id: if bytes[0] & 8 != 0 { 1 } else { 0 },
            area_id: bytes[0] & 7,
            absolute_frame_id: decode_u24(&bytes[1..]),
            checksum3: bytes[4],
            checksum4: bytes[5],
            logical_frame_id: lfid & 0x3f,
            is_last_logical_frame: lfid & 0x80 != 0,
            is_ecc3_frame: lfid & 0x40 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack3_fields() {
        // Data area, partition 0, absolute frame 0x012345, LFID 22 with
        // the last-of-group flag.
        let pack = Pack3::decode(&[0x34, 0x01, 0x23, 0x45, 0xaa, 0xbb, 0x80 | 22]);
        assert_eq!(pack.partition_id, 0);
        assert_eq!(pack.area_id, 4);
        assert_eq!(pack.absolute_frame_id, 0x012345);
        assert_eq!(pack.checksum1, 0xaa);
        assert_eq!(pack.checksum2, 0xbb);
        assert_eq!(pack.logical_frame_id, 22);
        assert!(pack.is_last_logical_frame);
        assert!(!pack.is_ecc3_frame);
    }

    #[test]
    fn pack1_group_and_file_counts() {
        let pack = Pack1::decode(&[0x11, 0x00, 0x2a, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(pack.position, 1);
        assert_eq!(pack.group, 42);
        assert_eq!(pack.separator1_count, 256);
    }
}
