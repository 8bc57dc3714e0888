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

//! Blocks: the smallest framed unit on tape, one sync word plus 35 payload
//! words, and the assembler that groups line words into them.

use crate::{
    nrzi::SYNC_WORD,
    sink::{BlockSink, WordSink},
    symbol::{decode_symbol, FlaggedByte},
};

/// Words in a complete block, counting the sync word.
pub const BLOCK_WORDS: usize = 36;

/// A received block. Both the raw ten-bit line words and the demodulated
/// flagged bytes are retained, so a later stage can reinterpret a channel
/// error if it wants to.
#[derive(Clone)]
pub struct Block {
    line_words: [u16; BLOCK_WORDS],
    bytes: [FlaggedByte; BLOCK_WORDS],
    count: usize,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            line_words: [0; BLOCK_WORDS],
            bytes: [FlaggedByte::default(); BLOCK_WORDS],
            count: 0,
        }
    }
}

impl Block {
    /// Forget any current contents.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Append a word and its demodulated byte. Returns true when the block
    /// is complete.
    pub fn add_word(&mut self, line_word: u16, byte: FlaggedByte) -> bool {
        if self.count == BLOCK_WORDS {
            return true;
        }
        self.line_words[self.count] = line_word;
        self.bytes[self.count] = byte;
        self.count += 1;
        self.count == BLOCK_WORDS
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The raw ten-bit line words received so far.
    pub fn line_words(&self) -> &[u16] {
        &self.line_words[..self.count]
    }

    /// The demodulated bytes received so far. Index 0 is the sync word's
    /// (meaningless) decode; the header starts at index 1.
    pub fn bytes(&self) -> &[FlaggedByte] {
        &self.bytes[..self.count]
    }
}

/// Groups the deframer's word stream into blocks. A sync word opens a
/// block; the block is delivered downstream when its 36th word arrives, or
/// truncated early if a fresh sync word shows up first.
pub struct BlockAssembler<B: BlockSink> {
    sink: B,
    block: Block,
    in_block: bool,
}

impl<B: BlockSink> BlockAssembler<B> {
    pub fn new(sink: B) -> Self {
        Self {
            sink,
            block: Block::default(),
            in_block: false,
        }
    }

    pub fn sink(&self) -> &B {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut B {
        &mut self.sink
    }

    fn flush(&mut self) {
        if self.in_block && !self.block.is_empty() {
            if self.block.len() < BLOCK_WORDS {
                log::trace!("BlockAssembler: truncated block of {} words", self.block.len());
            }
            self.sink.receive_block(&self.block);
        }
        self.block.reset();
        self.in_block = false;
    }
}

impl<B: BlockSink> WordSink for BlockAssembler<B> {
    fn receive_word(&mut self, word: u16) {
        let byte = decode_symbol(word);

        if word & 0x1ff == SYNC_WORD {
            // A sync word opens a new block; whatever was in flight is as
            // complete as it will ever get.
            self.flush();
            self.in_block = true;
            self.block.add_word(word, byte);
            return;
        }

        if !self.in_block {
            // Words with no block open belong to nothing.
            return;
        }

        if self.block.add_word(word, byte) {
            self.sink.receive_block(&self.block);
            self.block.reset();
            self.in_block = false;
        }
    }

    fn track_detected(&mut self, start: bool) {
        // A track boundary invalidates any partial block.
        self.block.reset();
        self.in_block = false;
        self.sink.track_detected(start);
    }

    fn receive_atf_tone(&mut self, tone: u8) {
        self.sink.receive_atf_tone(tone);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}
