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

//! The DAT audio sink: demultiplexes frames into 48 kHz stereo PCM, keeps
//! the WAV dump file, and runs the sub-code wall-clock synchronizer.
//!
//! DAT delivers 33 1/3 frames per second and can only stamp the date/time
//! sub-code at frame boundaries, so the stamps advance in a fixed pattern:
//! a 34-frame second, then a 33-frame second 20 ms off, then a 33-frame
//! second 10 ms off. Observing the 34-frame boundary therefore pins the
//! real start of a second, from which the sink maintains millisecond-
//! accurate wall-clock time as long as frames keep advancing by one.

use std::{
    fs::File,
    io::{Seek, SeekFrom, Write},
    path::Path,
};

use binrw::BinWrite;

use crate::{
    frame::{DatFrame, BYTES_PER_ROW, USER_DATA_ROWS},
    sink::FrameSink,
    subcode::{bcd_decode, TimeCode, INDEX_NOT_VALID, PROGRAM_LEAD_IN, PROGRAM_LEAD_OUT, PROGRAM_NOT_VALID},
    track::{Track, TrackHead},
    DatError,
};

/// The absolute-time value some machines write when they have no idea:
/// 100h-100m-100s-100f.
const ABSOLUTE_TIME_UNKNOWN: u32 = 12_203_433;

/// Milliseconds of tape per frame.
const MS_PER_FRAME: u32 = 30;

#[binrw::binwrite]
#[bw(little)]
struct WavHeader {
    riff: [u8; 4],
    riff_size: u32,
    wave: [u8; 4],
    fmt_id: [u8; 4],
    fmt_size: u32,
    format_tag: u16,
    channels: u16,
    samples_per_sec: u32,
    avg_bytes_per_sec: u32,
    block_align: u16,
    bits_per_sample: u16,
    data_id: [u8; 4],
    data_size: u32,
}

/// Total header bytes reserved at the front of the dump file.
const WAV_HEADER_SIZE: usize = 44;

pub struct AudioSink {
    file: Option<File>,
    /// Stereo sample rows written to the data chunk so far.
    frames_written: u64,

    frame: Box<DatFrame>,

    // Wall-clock synchronizer state.
    have_last_date_time: bool,
    last_date_time_seconds: u64,
    have_date_time_sync: bool,
    current_seconds: u64,
    current_milliseconds: u32,
    have_last_change_frame: bool,
    last_change_frame: u32,

    have_last_absolute_frame: bool,
    last_absolute_frame: u32,

    /// Fallback frame counter used when the tape carries no usable
    /// absolute time.
    next_session_frame: u32,
}

impl Default for AudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink {
    pub fn new() -> Self {
        Self {
            file: None,
            frames_written: 0,
            frame: Box::default(),
            have_last_date_time: false,
            last_date_time_seconds: 0,
            have_date_time_sync: false,
            current_seconds: 0,
            current_milliseconds: 0,
            have_last_change_frame: false,
            last_change_frame: 0,
            have_last_absolute_frame: false,
            last_absolute_frame: 0,
            next_session_frame: 0,
        }
    }

    /// Stream recovered PCM to `path`. Space for the WAV header is
    /// reserved now and filled in at stop, when the sample count is known.
    pub fn set_dump_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DatError> {
        let mut file = File::create(path)?;
        file.write_all(&[0u8; WAV_HEADER_SIZE])?;
        self.file = Some(file);
        self.frames_written = 0;
        Ok(())
    }

    fn narrate_frame(&self, a: &Track) -> u32 {
        let mut absolute_frame = 0u32;

        if let Some(item) = a.subcode(2) {
            let time = TimeCode::from_pack(item);
            absolute_frame = time.absolute_frame();
            log::info!(
                "Absolute time: {:02}h-{:02}m-{:02}s-{:02}f ({})",
                time.hour(),
                time.minute(),
                time.second(),
                time.frame(),
                absolute_frame
            );
            match time.program() {
                PROGRAM_NOT_VALID => {}
                PROGRAM_LEAD_IN => log::info!("Program ID   : (LEAD IN)"),
                PROGRAM_LEAD_OUT => log::info!("Program ID   : (LEAD OUT)"),
                program => log::info!("Program ID   : {:03}", program),
            }
            match time.index() {
                INDEX_NOT_VALID => {}
                index => log::info!("Index ID     : {:03}", index),
            }
        }

        if let Some(control_id) = a.control_id() {
            if control_id != 0 {
                let mut bits = String::new();
                if control_id & 0x1 != 0 {
                    bits.push_str(" TOC");
                }
                if control_id & 0x2 != 0 {
                    bits.push_str(" SKIP");
                }
                if control_id & 0x4 != 0 {
                    bits.push_str(" START");
                }
                if control_id & 0x8 != 0 {
                    bits.push_str(" PRIORITY");
                }
                log::info!("Control      :{}", bits);
            }
        }

        if let Some(item) = a.subcode(1) {
            let time = TimeCode::from_pack(item);
            log::info!(
                "Program time : {:02}h-{:02}m-{:02}s-{:02}f",
                time.hour(),
                time.minute(),
                time.second(),
                time.frame()
            );
        }

        if let Some(item) = a.subcode(3) {
            self.narrate_running_time(item);
        }

        if let Some(item) = a.subcode(4) {
            let time = TimeCode::from_pack(item);
            log::info!("Table of Contents:");
            match time.program() {
                PROGRAM_NOT_VALID => {}
                PROGRAM_LEAD_IN => log::info!("  Program ID : (LEAD IN)"),
                PROGRAM_LEAD_OUT => log::info!("  Program ID : (LEAD OUT)"),
                program => log::info!("  Program ID : {:03}", program),
            }
            match time.index() {
                INDEX_NOT_VALID => {}
                index => log::info!("  Index ID   : {:03}", index),
            }
            log::info!(
                "  Time       : {:02}h-{:02}m-{:02}s-{:02}f",
                time.hour(),
                time.minute(),
                time.second(),
                time.frame()
            );
        }

        if a.subcode(7).is_some() {
            log::info!("ISRC         : (not decoded)");
        }
        if a.subcode(8).is_some() {
            log::info!("Pro Binary   : (not decoded)");
        }

        let signature = a.subcode_signature();
        log::info!(
            "Subcode packs: {:2} {:2} {:2} {:2} {:2} {:2} {:2}",
            signature[0],
            signature[1],
            signature[2],
            signature[3],
            signature[4],
            signature[5],
            signature[6]
        );

        absolute_frame
    }

    /// Pack 3 is either a running-time stamp or a Pro R time code with its
    /// own little taxonomy of source and rate identifiers.
    fn narrate_running_time(&self, item: &[u8; 7]) {
        let time = TimeCode::from_pack(item);
        if item[0] & 0x4 != 0 {
            log::info!(
                "Running time : {:02}h-{:02}m-{:02}s-{:02}f",
                time.hour(),
                time.minute(),
                time.second(),
                time.frame()
            );
            return;
        }

        let code_type = match item[0] & 3 {
            0 => "IEC/SMPTE",
            1 => "Pro DIO; sample address",
            2 => "Pro DIO; Time-of-day",
            _ => "Reserved-3",
        };
        let freq = match (item[1] & 0xc0) >> 6 {
            0 => "48 kHz",
            1 => "44.1 kHz",
            2 => "32 kHz",
            _ => "Reserved-3",
        };
        let smpte_rate = match (item[1] & 0x38) >> 3 {
            0 => "30 Hz",
            1 => "29.97 Hz NDF",
            2 => "29.97 Hz DF",
            3 => "25 Hz",
            4 => "24 Hz",
            _ => "Reserved",
        };
        log::info!(
            "Pro R Time   : {:02}h-{:02}m-{:02}s-{:02}f ({}-{}-{})",
            time.hour(),
            time.minute(),
            time.second(),
            time.frame(),
            code_type,
            freq,
            smpte_rate
        );
    }

    /// Track the date/time sub-code and the millisecond synchronizer.
    fn handle_date_time(&mut self, item: Option<&[u8; 7]>, absolute_frame: u32) {
        let mut dow = 0u8;
        let mut year = 0u8;
        let mut mon = 0u8;
        let mut day = 0u8;
        let mut hour = 0u8;
        let mut min = 0u8;
        let mut sec = 0u8;
        let mut likely_year = 0i32;
        let mut time_is_valid = false;
        let mut abs_seconds = 0u64;
        let mut dropped_sync = false;

        if let Some(item) = item {
            dow = item[0] & 0xf;
            year = bcd_decode(item[1]);
            mon = bcd_decode(item[2]);
            day = bcd_decode(item[3]);
            hour = bcd_decode(item[4]);
            min = bcd_decode(item[5]);
            sec = bcd_decode(item[6]);

            likely_year = if year < 80 { year as i32 + 2000 } else { year as i32 + 1900 };

            // Bad BCD decodes surface as 100.
            if (1..=12).contains(&mon) && day != 100 && hour != 100 && min != 100 && sec != 100 {
                abs_seconds = seconds_since_1900(likely_year, mon, day, hour, min, sec);
                time_is_valid = true;
            }
        }

        if self.have_date_time_sync {
            if time_is_valid
                && self.have_last_absolute_frame
                && absolute_frame == self.last_absolute_frame.wrapping_add(1)
            {
                // Still in sync: advance the clock one frame's worth.
                self.current_milliseconds += MS_PER_FRAME;
                if self.current_milliseconds >= 1000 {
                    self.current_milliseconds %= 1000;
                    self.current_seconds += 1;
                }

                if self.current_seconds != abs_seconds {
                    self.have_date_time_sync = false;
                    dropped_sync = true;
                }
            } else {
                // The date/time pack disappeared or the frame counter
                // jumped.
                self.have_date_time_sync = false;
                dropped_sync = true;
            }
        }

        // Whatever the sync state, keep watching for second boundaries; a
        // 34-frame second is the anchor that can (re)establish sync.
        if self.have_last_date_time && time_is_valid {
            if self.last_date_time_seconds != abs_seconds {
                if abs_seconds == self.last_date_time_seconds + 1 {
                    if self.have_last_change_frame {
                        let frames_per_second = absolute_frame.wrapping_sub(self.last_change_frame);
                        if frames_per_second == 34 {
                            // This frame ends the 34-frame second and
                            // starts the one that is 20 ms late.
                            if !self.have_date_time_sync {
                                self.have_date_time_sync = true;
                                self.current_milliseconds = 20;
                                self.current_seconds = abs_seconds;
                            }
                        }
                    }

                    self.have_last_change_frame = true;
                    self.last_change_frame = absolute_frame;
                } else {
                    // Discontinuity; the previous boundary is useless.
                    self.have_last_change_frame = false;
                }
            }
        }

        self.have_last_date_time = time_is_valid;
        self.last_date_time_seconds = abs_seconds;

        if dropped_sync && self.have_date_time_sync {
            log::info!("Date     time: ------- SYNC DROPPED AND REESTABLISHED --------");
        } else if dropped_sync {
            log::info!("Date     time: ------- SYNC DROPPED --------------------------");
        }

        if self.have_date_time_sync {
            log::info!(
                "Date     time: {:02} {:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} (SYNCED)",
                dow,
                likely_year,
                mon,
                day,
                hour,
                min,
                sec,
                self.current_milliseconds
            );
        } else if time_is_valid {
            log::info!(
                "Date     time: {:02} {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                dow,
                likely_year,
                mon,
                day,
                hour,
                min,
                sec
            );
        }
    }
}

impl FrameSink for AudioSink {
    /// Two tracks pair into an audio frame when both carry the absolute
    /// time pack with identical contents and neither track sits at the
    /// wrong azimuth.
    fn is_frame(&mut self, a: &Track, b: &Track) -> bool {
        let time_good = match (a.subcode(2), b.subcode(2)) {
            (Some(a_time), Some(b_time)) => a_time == b_time,
            _ => false,
        };

        log::debug!(
            "AudioSink::is_frame(): times good {}, heads {}/{}",
            time_good,
            a.head(),
            b.head()
        );

        time_good && a.head() != TrackHead::B && b.head() != TrackHead::A
    }

    fn receive_frame(&mut self, a: &Track, b: &Track) {
        let mut absolute_frame = self.narrate_frame(a);

        // A corrupted or placeholder absolute time gets a session-local
        // pseudo count so the output remains navigable.
        if absolute_frame == 0 || absolute_frame == ABSOLUTE_TIME_UNKNOWN {
            let pseudo = TimeCode::from_absolute_frame(self.next_session_frame);
            log::info!(
                "Pseudo   time: {:02}h-{:02}m-{:02}s-{:02}f ({})",
                pseudo.hour(),
                pseudo.minute(),
                pseudo.second(),
                pseudo.frame(),
                self.next_session_frame
            );
            absolute_frame = self.next_session_frame;
        }

        self.handle_date_time(a.subcode(5), absolute_frame);

        let mut frame = std::mem::take(&mut self.frame);
        frame.fill_from_track_pair(a, b);

        let c1_errors = frame.c1_errors();
        let c1_uncorrectable = frame.c1_uncorrectable_errors();
        let c2_uncorrectable = frame.c2_uncorrectable_errors();
        let c1_corrected = c1_errors - c1_uncorrectable;
        // Aligned burst damage can fail more C2 vectors than C1 vectors,
        // so the "corrected by C2" figure is clamped at zero.
        let c2_corrected = c1_uncorrectable.saturating_sub(c2_uncorrectable);

        if c2_uncorrectable > 0 {
            log::info!(
                "Errors  C1/C2: {}/{} {} UNCORRECTED",
                c1_corrected,
                c2_corrected,
                c2_uncorrectable
            );
        } else {
            log::info!("Errors  C1/C2: {}/{} (all corrected)", c1_corrected, c2_corrected);
        }

        let data = frame.data();
        for row in data.iter().take(8) {
            log::debug!(
                "Samples L/R  : {:02x}{:02x} {:02x}{:02x}",
                row[1],
                row[0],
                row[3],
                row[2]
            );
        }

        if let Some(file) = self.file.as_mut() {
            let mut result = Ok(());
            for row in data.iter().take(USER_DATA_ROWS) {
                result = file.write_all(row);
                if result.is_err() {
                    break;
                }
            }
            match result {
                Ok(()) => self.frames_written += USER_DATA_ROWS as u64,
                // Advisory: the run continues even if the dump file fails.
                Err(e) => log::error!("AudioSink: PCM write failed: {}", e),
            }
        }

        self.frame = frame;
        self.have_last_absolute_frame = true;
        self.last_absolute_frame = absolute_frame;
        self.next_session_frame += 1;
    }

    fn stop(&mut self) {
        // Fill in the WAV header now that the sample count is final.
        if let Some(mut file) = self.file.take() {
            let header = WavHeader {
                riff: *b"RIFF",
                riff_size: (24 + 8 + self.frames_written * 4 + 4) as u32,
                wave: *b"WAVE",
                fmt_id: *b"fmt ",
                fmt_size: 16,
                format_tag: 1,
                channels: 2,
                samples_per_sec: 48_000,
                avg_bytes_per_sec: 48_000 * 4,
                block_align: BYTES_PER_ROW as u16,
                bits_per_sample: 16,
                data_id: *b"data",
                data_size: (self.frames_written * 4) as u32,
            };

            let write_header = |file: &mut File| -> Result<(), DatError> {
                file.seek(SeekFrom::Start(0))?;
                header.write(file).map_err(|e| match e {
                    binrw::Error::Io(io) => DatError::Io(io),
                    _ => DatError::OutputOpen,
                })?;
                Ok(())
            };

            if let Err(e) = write_header(&mut file) {
                log::error!("AudioSink: WAV header write failed: {}", e);
            }
        }
    }
}

/// Seconds elapsed since the epoch this decoder counts from.
///
/// The year term is year·365·86400 counted from year zero, not 1900, so
/// the absolute value is a misnomer; the 1 Hz synchronizer only ever
/// compares differences between successive stamps, which are exact.
fn seconds_since_1900(year: i32, mon: u8, day: u8, hour: u8, min: u8, sec: u8) -> u64 {
    const MONTH_DOY_NORMAL: [u64; 12] = [0, 31, 59, 91, 121, 152, 182, 213, 244, 274, 305, 335];
    const MONTH_DOY_LEAP: [u64; 12] = [0, 31, 60, 92, 122, 153, 183, 214, 245, 275, 306, 336];

    let mut seconds = year as u64 * 86_400 * 365;
    seconds += sec as u64;
    seconds += min as u64 * 60;
    seconds += hour as u64 * 3600;
    seconds += (day as u64 - 1) * 86_400;

    let leap_year = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let doy = if leap_year {
        MONTH_DOY_LEAP[mon as usize - 1]
    } else {
        MONTH_DOY_NORMAL[mon as usize - 1]
    };
    seconds += doy * 86_400;

    // Leap days inserted since January 1, 1900.
    if year > 1904 {
        let mut leaps = (year - 1) / 4 - 475;
        leaps -= (year - 1) / 100 - 19;
        leaps += (year - 1) / 400 - 4;
        seconds += leaps as u64 * 86_400;
    }

    seconds
}
