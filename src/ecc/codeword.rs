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

//! The C1, C2 and C3 codec shells: fill a codeword vector from a
//! [`CodewordSource`](crate::ecc::fill::CodewordSource), correct it, and
//! write the result (data and validity) back.

use crate::ecc::{fill::CodewordSource, gf256, solver};

/// The parity-check matrix for C1, the (32,28) code. Multiplying the
/// codeword vector by this matrix yields the four-element syndrome.
#[rustfmt::skip]
static H_C1: [[u8; 32]; 4] = [
    [
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    ],
    [
        0xc0, 0x60, 0x30, 0x18, 0x0c, 0x06, 0x03, 0x8f,
        0xc9, 0xea, 0x75, 0xb4, 0x5a, 0x2d, 0x98, 0x4c,
        0x26, 0x13, 0x87, 0xcd, 0xe8, 0x74, 0x3a, 0x1d,
        0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01,
    ],
    [
        0xde, 0xb9, 0x69, 0x5d, 0x50, 0x14, 0x05, 0x46,
        0x9f, 0xee, 0xb5, 0x6a, 0x94, 0x25, 0x4e, 0x9d,
        0x60, 0x18, 0x06, 0x8f, 0xea, 0xb4, 0x2d, 0x4c,
        0x13, 0xcd, 0x74, 0x1d, 0x40, 0x10, 0x04, 0x01,
    ],
    [
        0xb6, 0xdf, 0x7f, 0x6b, 0xe7, 0x78, 0x0f, 0x65,
        0x2f, 0x61, 0xa1, 0xb9, 0xba, 0x50, 0x0a, 0x46,
        0xc1, 0xb5, 0x35, 0x25, 0x27, 0x60, 0x0c, 0x8f,
        0x75, 0x2d, 0x26, 0xcd, 0x3a, 0x40, 0x08, 0x01,
    ],
];

/// The parity-check matrix for C2, the (32,26) code.
#[rustfmt::skip]
static H_C2: [[u8; 32]; 6] = [
    [
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    ],
    [
        0xc0, 0x60, 0x30, 0x18, 0x0c, 0x06, 0x03, 0x8f,
        0xc9, 0xea, 0x75, 0xb4, 0x5a, 0x2d, 0x98, 0x4c,
        0x26, 0x13, 0x87, 0xcd, 0xe8, 0x74, 0x3a, 0x1d,
        0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01,
    ],
    [
        0xde, 0xb9, 0x69, 0x5d, 0x50, 0x14, 0x05, 0x46,
        0x9f, 0xee, 0xb5, 0x6a, 0x94, 0x25, 0x4e, 0x9d,
        0x60, 0x18, 0x06, 0x8f, 0xea, 0xb4, 0x2d, 0x4c,
        0x13, 0xcd, 0x74, 0x1d, 0x40, 0x10, 0x04, 0x01,
    ],
    [
        0xb6, 0xdf, 0x7f, 0x6b, 0xe7, 0x78, 0x0f, 0x65,
        0x2f, 0x61, 0xa1, 0xb9, 0xba, 0x50, 0x0a, 0x46,
        0xc1, 0xb5, 0x35, 0x25, 0x27, 0x60, 0x0c, 0x8f,
        0x75, 0x2d, 0x26, 0xcd, 0x3a, 0x40, 0x08, 0x01,
    ],
    [
        0x97, 0x3b, 0xf8, 0x81, 0xd0, 0x0d, 0x11, 0xd9,
        0x5b, 0xfe, 0x6b, 0xfd, 0x1e, 0x65, 0x99, 0x5f,
        0xb9, 0x5d, 0x14, 0x46, 0xee, 0x6a, 0x25, 0x9d,
        0x18, 0x8f, 0xb4, 0x4c, 0xcd, 0x1d, 0x10, 0x01,
    ],
    [
        0x72, 0x55, 0x4d, 0x84, 0xa9, 0x2e, 0x33, 0x3b,
        0x7c, 0x67, 0x1a, 0x11, 0xe2, 0xdf, 0xd6, 0xfd,
        0x0f, 0x5e, 0xbe, 0xb9, 0xa0, 0x05, 0xc1, 0x6a,
        0x9c, 0x60, 0x03, 0xb4, 0x26, 0x74, 0x20, 0x01,
    ],
];

/// The parity-check matrix for C3, the (46,44) code DDS runs across an
/// entire basic group.
#[rustfmt::skip]
static H_C3: [[u8; 46]; 2] = [
    [
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
        0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    ],
    [
        0xc1, 0xee, 0x77, 0xb5, 0xd4, 0x6a, 0x35, 0x94,
        0x4a, 0x25, 0x9c, 0x4e, 0x27, 0x9d, 0xc0, 0x60,
        0x30, 0x18, 0x0c, 0x06, 0x03, 0x8f, 0xc9, 0xea,
        0x75, 0xb4, 0x5a, 0x2d, 0x98, 0x4c, 0x26, 0x13,
        0x87, 0xcd, 0xe8, 0x74, 0x3a, 0x1d, 0x80, 0x40,
        0x20, 0x10, 0x08, 0x04, 0x02, 0x01,
    ],
];

/// Outcome of a correction pass over one codeword vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EccStatus {
    /// The syndrome was zero and no byte was flagged.
    NoErrors,
    /// Errors or erasures were present and have been repaired (or, for a
    /// vector that entered with erasure flags but a clean syndrome,
    /// vouched for).
    Corrected,
    /// The vector cannot be repaired. Its validity flags have been cleared.
    Uncorrectable,
}

/// How a code treats bytes already known to be bad.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CorrectionMode {
    /// Count invalid bytes against the correction budget but solve without
    /// erasure hints, preserving the code's full detection power (C1).
    CountErasures,
    /// Hand every invalid byte position to the solver as an erasure and
    /// correct from positions alone (C2, C3). No detection power remains.
    ErasuresOnly,
}

/// A Reed–Solomon codeword vector of N symbols with PARITY check symbols,
/// plus the per-byte validity flags that ride along with it.
pub struct Codeword<const N: usize, const PARITY: usize> {
    data: [u8; N],
    valid: [bool; N],
    corrections: usize,
    matrix: &'static [[u8; N]; PARITY],
    mode: CorrectionMode,
}

/// The C1 code: n=32, 2t=4, run in detection-preserving mode.
pub type EccC1 = Codeword<32, 4>;

/// The C2 code: n=32, 2t=6, erasures only.
pub type EccC2 = Codeword<32, 6>;

/// The C3 code: n=46, 2t=2, erasures only.
pub type EccC3 = Codeword<46, 2>;

impl Codeword<32, 4> {
    pub fn c1() -> Self {
        Self::new(&H_C1, CorrectionMode::CountErasures)
    }
}

impl Codeword<32, 6> {
    pub fn c2() -> Self {
        Self::new(&H_C2, CorrectionMode::ErasuresOnly)
    }
}

impl Codeword<46, 2> {
    pub fn c3() -> Self {
        Self::new(&H_C3, CorrectionMode::ErasuresOnly)
    }
}

impl<const N: usize, const PARITY: usize> Codeword<N, PARITY> {
    fn new(matrix: &'static [[u8; N]; PARITY], mode: CorrectionMode) -> Self {
        Self {
            data: [0; N],
            valid: [false; N],
            corrections: 0,
            matrix,
            mode,
        }
    }

    /// Pull the vector's bytes and validity flags out of the source.
    pub fn fill<S: CodewordSource + ?Sized>(&mut self, source: &S) {
        for i in 0..N {
            self.data[i] = source.data(i);
            self.valid[i] = source.valid(i);
        }
    }

    /// Write the (possibly corrected) bytes and validity flags back.
    pub fn dump<S: CodewordSource + ?Sized>(&self, source: &mut S) {
        for i in 0..N {
            source.set_data(i, self.data[i]);
            source.set_valid(i, self.valid[i]);
        }
    }

    pub fn data(&self) -> &[u8; N] {
        &self.data
    }

    pub fn valid(&self) -> &[bool; N] {
        &self.valid
    }

    /// Multiply the vector by the check matrix. Returns the syndrome and
    /// whether it came out all-zero.
    fn compute_syndrome(&self) -> ([u8; PARITY], bool) {
        let mut syndrome = [0u8; PARITY];
        let mut clean = true;
        for (row, out) in self.matrix.iter().zip(syndrome.iter_mut()) {
            let mut acc = 0u8;
            for (j, &h) in row.iter().enumerate() {
                acc ^= gf256::multiply(self.data[j], h);
            }
            *out = acc;
            clean = clean && acc == 0;
        }
        (syndrome, clean)
    }

    /// Detect and correct errors in the filled vector.
    pub fn correct(&mut self) -> EccStatus {
        let mut erasures = [0u8; PARITY];
        let mut erasure_count = 0usize;
        let mut ok = true;
        let mut corrected = false;

        // Tally the known-bad positions. More than 2t of them and the
        // vector is beyond saving regardless of mode.
        for i in 0..N {
            if !self.valid[i] {
                if erasure_count >= PARITY {
                    ok = false;
                    break;
                }
                erasures[erasure_count] = (N - 1 - i) as u8;
                erasure_count += 1;
            }
        }

        if ok {
            let (mut syndrome, clean) = self.compute_syndrome();
            if clean {
                self.corrections = 0;
            } else {
                let hints = match self.mode {
                    CorrectionMode::CountErasures => &erasures[..0],
                    CorrectionMode::ErasuresOnly => &erasures[..erasure_count],
                };
                ok = self.handle_syndrome(&mut syndrome, hints);
                if ok {
                    corrected = true;
                }
            }
        }

        if ok {
            if erasure_count > 0 || corrected {
                // The vector entered flagged or dirty and has now been
                // vouched for end to end. A C1 vector that needed its full
                // correction budget is the exception: the chance that a
                // maximal fix is a miscorrection is too high to certify the
                // rest of the vector.
                let trust = match self.mode {
                    CorrectionMode::CountErasures => self.corrections < PARITY,
                    CorrectionMode::ErasuresOnly => true,
                };
                self.valid = [trust; N];
                EccStatus::Corrected
            } else {
                EccStatus::NoErrors
            }
        } else {
            self.valid = [false; N];
            EccStatus::Uncorrectable
        }
    }

    /// Solve the key equation, locate roots, and apply Forney corrections,
    /// but only if the full set of planned corrections zeroes the syndrome.
    fn handle_syndrome(&mut self, syndrome: &mut [u8; PARITY], erasures: &[u8]) -> bool {
        let solution = match solver::solve(&syndrome[..], erasures) {
            Some(s) => s,
            None => return false,
        };
        let sigma = &solution.sigma[..PARITY + 1];
        let omega = &solution.omega[..PARITY];

        let mut corrections = [0u8; PARITY];
        let mut locations = [0usize; PARITY];
        self.corrections = 0;
        let mut corrected = false;

        for i in 0..N {
            let alpha_inv = gf256::invert(gf256::pow_alpha(i));
            if gf256::evaluate(sigma, alpha_inv) != 0 {
                continue;
            }

            // σ has a root here, so position i (counted from the lowest
            // order term, the opposite end from storage order) holds an
            // error.
            let magnitude = solver::error_at(sigma, omega, alpha_inv);
            let loc = N - i - 1;

            if self.corrections >= PARITY {
                // More roots than the code has parity to explain; the
                // solution is bogus.
                return false;
            }
            corrections[self.corrections] = magnitude;
            locations[self.corrections] = loc;
            self.corrections += 1;

            corrected = true;
            for (j, s) in syndrome.iter_mut().enumerate() {
                *s ^= gf256::multiply(magnitude, self.matrix[j][loc]);
                corrected = corrected && *s == 0;
            }
        }

        if corrected {
            for k in 0..self.corrections {
                self.data[locations[k]] ^= corrections[k];
            }
        }

        corrected
    }
}
