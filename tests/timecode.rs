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
use datfox::subcode::{TimeCode, INDEX_NOT_VALID, PROGRAM_LEAD_IN, PROGRAM_NOT_VALID};

const ABSOLUTE_CASES: &[u32] = &[0, 99, 100, 101, 1000, 1999, 119_999];

#[test]
fn absolute_frames_round_trip() {
    init();
    for &case in ABSOLUTE_CASES {
        let time = TimeCode::from_absolute_frame(case);
        assert_eq!(time.absolute_frame(), case, "absolute frame {}", case);
    }
}

#[test]
fn every_frame_of_a_minute_round_trips() {
    init();
    for af in 0..2000u32 {
        let time = TimeCode::from_absolute_frame(af);
        assert_eq!(time.absolute_frame(), af, "absolute frame {}", af);
        assert!(time.frame() < 34);
        assert!(time.second() < 60);
    }
}

#[test]
fn pack_decoding_handles_special_program_ids() {
    init();
    // Lead-in marker, index not valid, 12h-34m-56s-10f.
    let pack = [0x00, 0xbb, 0xaa, 0x12, 0x34, 0x56, 0x10];
    let time = TimeCode::from_pack(&pack);
    assert_eq!(time.program(), PROGRAM_LEAD_IN);
    assert_eq!(time.index(), INDEX_NOT_VALID);
    assert_eq!(time.hour(), 12);
    assert_eq!(time.minute(), 34);
    assert_eq!(time.second(), 56);
    assert_eq!(time.frame(), 10);
}

#[test]
fn pack_decoding_combines_program_digits() {
    init();
    // PNO1 = 2, PNO2/3 = 0x45 -> program 245.
    let pack = [0x02, 0x45, 0x01, 0x00, 0x01, 0x02, 0x03];
    let time = TimeCode::from_pack(&pack);
    assert_eq!(time.program(), 245);
    assert_eq!(time.index(), 1);
}

#[test]
fn garbage_program_digits_are_not_special_markers() {
    init();
    let pack = [0x00, 0x1f, 0x00, 0x00, 0x00, 0x00, 0x00];
    let time = TimeCode::from_pack(&pack);
    assert_ne!(time.program(), PROGRAM_NOT_VALID);
    // Bad BCD in the program digits decodes to the 100-marker plus the
    // hundreds digit contribution.
    assert_eq!(time.program(), 100);
}
