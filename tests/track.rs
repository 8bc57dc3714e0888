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

//! Track assembly and sub-code extraction, driven through the block
//! assembler the way the real pipeline does it.

mod common;

use common::{init, pack_item, TrackImage};
use datfox::{
    block::BlockAssembler,
    sink::{FrameSink, WordSink},
    track::{Track, TrackFramer},
};

/// A frame sink that never pairs; it just copies out what each completed
/// track recovered.
#[derive(Default)]
struct TrackInspector {
    subcode_2: Vec<Option<[u8; 7]>>,
    subcode_5: Vec<Option<[u8; 7]>>,
    signatures: Vec<[u8; 7]>,
    control_ids: Vec<Option<u8>>,
    c1_errors: Vec<usize>,
}

impl TrackInspector {
    fn record(&mut self, track: &Track) {
        self.subcode_2.push(track.subcode(2).copied());
        self.subcode_5.push(track.subcode(5).copied());
        self.signatures.push(*track.subcode_signature());
        self.control_ids.push(track.control_id());
        self.c1_errors.push(track.c1_errors());
    }
}

impl FrameSink for TrackInspector {
    fn is_frame(&mut self, _a: &Track, b: &Track) -> bool {
        // Only the newest track is unseen; the oldest was recorded when it
        // was the newcomer.
        self.record(b);
        false
    }

    fn receive_frame(&mut self, _a: &Track, _b: &Track) {}

    fn stop(&mut self) {}
}

fn feed_track<W: WordSink>(sink: &mut W, track: &TrackImage) {
    sink.track_detected(true);
    for block in 0..144 {
        for word in track.block_words(block) {
            sink.receive_word(word);
        }
    }
    sink.track_detected(false);
}

fn inspect(tracks: &[&TrackImage]) -> TrackInspector {
    let mut assembler = BlockAssembler::new(TrackFramer::new(TrackInspector::default()));
    // Prime with a throwaway first track so every interesting track
    // arrives as the newcomer of an is_frame call.
    let mut first = TrackImage::default();
    first.fill_headers(0);
    first.fill_c2_parity();
    first.fill_c1_parity();
    feed_track(&mut assembler, &first);

    for track in tracks {
        feed_track(&mut assembler, track);
    }
    let mut inspector = TrackInspector::default();
    std::mem::swap(
        &mut inspector,
        assembler.sink_mut().receiver_mut(),
    );
    inspector
}

#[test]
fn first_good_pack_observation_wins() {
    init();
    let mut track = TrackImage::default();

    let first = pack_item(2, 0, &[0xaa, 0xaa, 0x00, 0x01, 0x02, 0x03]);
    let second = pack_item(2, 0, &[0xaa, 0xaa, 0x09, 0x09, 0x09, 0x09]);
    track.set_subcode_item(0x80, 0, &first);
    track.set_subcode_item(0x82, 0, &second);

    track.fill_headers(0x53);
    track.fill_c2_parity();
    track.fill_c1_parity();

    let inspector = inspect(&[&track]);
    assert_eq!(inspector.subcode_2[0], Some(first));
    // Control and Data ID nibbles come from the sub-code block headers.
    assert_eq!(inspector.control_ids[0], Some(0x5));
    // An intact synthetic track corrects nothing.
    assert_eq!(inspector.c1_errors[0], 0);
}

#[test]
fn corrupt_item_parity_is_rejected() {
    init();
    let mut track = TrackImage::default();

    let pack = pack_item(5, 0, &[0x18, 0x06, 0x15, 0x12, 0x30, 0x00]);
    track.set_subcode_item(0x80, 0, &pack);
    // Break the item parity byte after the fact.
    track.data[0x80][7] ^= 0xff;

    track.fill_headers(0);
    track.fill_c2_parity();
    track.fill_c1_parity();

    let inspector = inspect(&[&track]);
    assert_eq!(inspector.subcode_5[0], None);
}

#[test]
fn signature_records_slot_order() {
    init();
    let mut track = TrackImage::default();

    track.set_subcode_item(0x80, 0, &pack_item(1, 0, &[0; 6]));
    track.set_subcode_item(0x80, 1, &pack_item(2, 0, &[0xaa, 0xaa, 0, 0, 0, 0]));
    track.set_subcode_item(0x80, 2, &pack_item(3, 4, &[0, 0, 1, 0, 0, 1]));
    track.set_subcode_item(0x80, 3, &pack_item(4, 4, &[0, 0, 1, 0, 0, 1]));
    track.set_subcode_item(0x81, 0, &pack_item(3, 4, &[0, 0, 1, 0, 0, 1]));

    track.fill_headers(0);
    track.fill_c2_parity();
    track.fill_c1_parity();

    let inspector = inspect(&[&track]);
    // Slots 0-3 from even blocks, 4-6 from odd blocks.
    assert_eq!(inspector.signatures[0], [1, 2, 3, 4, 3, 0, 0]);
}
