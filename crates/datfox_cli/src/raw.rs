/*
    datfox
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

//! The raw word dumper behind `-r`: every framed line word, printed as it
//! arrives, for channel-level diagnosis.

use datfox::{
    nrzi::SYNC_WORD,
    sink::WordSink,
    symbol::decode_symbol,
};

#[derive(Default)]
pub struct RawWordDumper {
    words_on_line: usize,
}

impl WordSink for RawWordDumper {
    fn receive_word(&mut self, word: u16) {
        if word & 0x1ff == SYNC_WORD {
            if self.words_on_line > 0 {
                println!();
            }
            print!("SYNC");
            self.words_on_line = 1;
        } else {
            let byte = decode_symbol(word);
            print!(
                " {:03x}:{:02x}{}",
                word,
                byte.value,
                if byte.valid { ' ' } else { '!' }
            );
            self.words_on_line += 1;
            if self.words_on_line >= 12 {
                println!();
                self.words_on_line = 0;
            }
        }
    }

    fn track_detected(&mut self, start: bool) {
        if self.words_on_line > 0 {
            println!();
            self.words_on_line = 0;
        }
        println!("---- track {} ----", if start { "start" } else { "stop" });
    }

    fn receive_atf_tone(&mut self, _tone: u8) {}

    fn stop(&mut self) {
        if self.words_on_line > 0 {
            println!();
            self.words_on_line = 0;
        }
    }
}
