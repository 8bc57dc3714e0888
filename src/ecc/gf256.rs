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

//! Arithmetic in the Galois field GF(2⁸) used by the R-DAT C1/C2 codes and
//! the DDS C3 code: the field modulo G(x) = x⁸ + x⁴ + x³ + x² + 1, with
//! primitive element α = 2.

/// The field generator polynomial, G(x) = x⁸ + x⁴ + x³ + x² + 1.
const FIELD_POLY: u16 = 0x11d;

/// Antilog table: `ALOG[i] = α^i`. Doubled so a sum of two logs (at most
/// 254 + 254) can index it without a modulo.
static ALOG: [u8; 510] = build_alog();

/// Log table: `LOG[α^i] = i`. `LOG[0]` is never consulted.
static LOG: [u8; 256] = build_log();

const fn build_alog() -> [u8; 510] {
    let mut table = [0u8; 510];
    let mut v: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = v as u8;
        table[i + 255] = v as u8;
        v <<= 1;
        if v & 0x100 != 0 {
            v ^= FIELD_POLY;
        }
        i += 1;
    }
    table
}

const fn build_log() -> [u8; 256] {
    let alog = build_alog();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[alog[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Multiply two field elements. Zero is a legal operand; anything times
/// zero is zero.
#[inline]
pub fn multiply(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    ALOG[LOG[a as usize] as usize + LOG[b as usize] as usize]
}

/// α raised to the i-th power.
#[inline]
pub fn pow_alpha(i: usize) -> u8 {
    ALOG[i % 255]
}

/// The multiplicative inverse of `a`. `invert(0)` returns 0; the solvers
/// never divide by a zero element.
#[inline]
pub fn invert(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    ALOG[255 - LOG[a as usize] as usize]
}

/// Evaluate the polynomial `poly` (lowest-order coefficient first) at `x`
/// in the field.
pub fn evaluate(poly: &[u8], x: u8) -> u8 {
    if poly.is_empty() {
        return 0;
    }
    let mut r = poly[0];
    let mut y = x;
    for &coefficient in &poly[1..] {
        r ^= multiply(coefficient, y);
        y = multiply(y, x);
    }
    r
}
