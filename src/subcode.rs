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

//! DAT sub-code time packs.
//!
//! DAT time codes tick 100 frames every three seconds: two 33-frame
//! seconds followed by a 34-frame second. The hour/minute/second/frame
//! fields are BCD, and the program and index identifiers reserve a few
//! bit patterns for "not valid" and the lead-in/lead-out markers.

/// Decode one BCD byte. Nibbles above 9 yield 100, an impossible value the
/// callers use to notice garbage.
pub fn bcd_decode(byte: u8) -> u8 {
    let tens = (byte & 0xf0) >> 4;
    let units = byte & 0x0f;
    if tens > 9 || units > 9 {
        return 100;
    }
    tens * 10 + units
}

/// Program number states decoded from PNO2/PNO3.
pub const PROGRAM_NOT_VALID: u16 = 0x80aa;
pub const PROGRAM_LEAD_IN: u16 = 0x80bb;
pub const PROGRAM_LEAD_OUT: u16 = 0x80ee;

/// Index identifier "not valid" marker.
pub const INDEX_NOT_VALID: u8 = 0xaa;

/// Frames per hour of DAT time code.
const FRAMES_PER_HOUR: u32 = 120_000;

/// Frames per minute.
const FRAMES_PER_MINUTE: u32 = 2_000;

#[derive(Copy, Clone, Debug)]
pub struct TimeCode {
    program_id: u16,
    index_id: u8,
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
}

impl TimeCode {
    /// Decode a seven-byte time pack.
    pub fn from_pack(item: &[u8; 7]) -> Self {
        let pno1 = item[0] & 0x7;
        let pno23 = item[1];

        let program_id = match pno23 {
            0xaa => PROGRAM_NOT_VALID,
            0xbb => PROGRAM_LEAD_IN,
            0xee => PROGRAM_LEAD_OUT,
            _ => bcd_decode(pno23) as u16 + 100 * pno1 as u16,
        };

        let index_id = if item[2] == 0xaa {
            INDEX_NOT_VALID
        } else {
            bcd_decode(item[2])
        };

        Self {
            program_id,
            index_id,
            hour: bcd_decode(item[3]),
            minute: bcd_decode(item[4]),
            second: bcd_decode(item[5]),
            frame: bcd_decode(item[6]),
        }
    }

    /// Reconstruct h/m/s/f from an absolute frame count.
    pub fn from_absolute_frame(absolute_frame: u32) -> Self {
        let mut remainder = absolute_frame;

        let hour = (remainder / FRAMES_PER_HOUR) as u8;
        remainder %= FRAMES_PER_HOUR;

        let minute = (remainder / FRAMES_PER_MINUTE) as u8;
        remainder %= FRAMES_PER_MINUTE;

        // 100 frames pass every three seconds; the first two seconds of
        // each group run 33 frames, the third 34.
        let mut second = ((remainder / 100) * 3) as u8;
        remainder %= 100;
        second += (remainder / 33) as u8;
        let mut frame = (remainder % 33) as u8;
        second -= (remainder / 99) as u8;
        frame += ((remainder / 99) * 33) as u8;

        Self {
            program_id: PROGRAM_NOT_VALID,
            index_id: INDEX_NOT_VALID,
            hour,
            minute,
            second,
            frame,
        }
    }

    pub fn program(&self) -> u16 {
        self.program_id
    }

    pub fn index(&self) -> u8 {
        self.index_id
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// The frame count since 00h-00m-00s-00f.
    pub fn absolute_frame(&self) -> u32 {
        let mut frames = (self.second as u32 / 3) * 100 + self.frame as u32;
        frames += (self.second as u32 % 3) * 33;
        frames += self.minute as u32 * FRAMES_PER_MINUTE;
        frames += self.hour as u32 * FRAMES_PER_HOUR;
        frames
    }
}
