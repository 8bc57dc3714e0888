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

//! The Reed–Solomon key-equation solver.
//!
//! This is the swap-based extended Euclidean variant from Sarwate & Yan,
//! "Modified Euclidean Algorithms for Decoding Reed-Solomon Codes" (2009).
//! Its appeal for tape recovery is that it folds known erasure locations
//! into the same iteration that reduces the syndrome: the ten-to-eight
//! symbol decoder and the C1 layer both hand later layers a list of byte
//! positions that are definitely wrong, and a code given e erasures plus v
//! unknown errors is solvable whenever e + 2v ≤ 2t.

use crate::ecc::gf256;

/// The largest 2t across the three codes (C2, with six parity symbols).
pub(crate) const MAX_PARITY: usize = 6;

/// A solved key equation: the error-locator polynomial σ and the error
/// evaluator ω, both lowest-order coefficient first. Only the leading
/// `two_t + 1` / `two_t` coefficients are meaningful.
pub(crate) struct Solution {
    pub sigma: [u8; MAX_PARITY + 1],
    pub omega: [u8; MAX_PARITY],
}

fn poly_shift_up(p: &mut [u8]) {
    for i in (1..p.len()).rev() {
        p[i] = p[i - 1];
    }
    p[0] = 0;
}

fn poly_scale(src: &[u8], s: u8, out: &mut [u8]) {
    for (o, &v) in out.iter_mut().zip(src.iter()) {
        *o = gf256::multiply(v, s);
    }
}

fn poly_scale_in_place(p: &mut [u8], s: u8) {
    for v in p.iter_mut() {
        *v = gf256::multiply(*v, s);
    }
}

fn poly_add_in(dst: &mut [u8], src: &[u8]) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}

/// Solve for (σ, ω) given a syndrome of length 2t and a list of known
/// erasure locations (each the position of the erased coefficient in the
/// codeword polynomial, 0 = lowest order). Returns `None` when the vector
/// is uncorrectable: the degree indicator must end negative and every
/// erasure must have been consumed.
///
/// A `Some` result is still only a candidate; the caller must confirm each
/// root of σ and verify that the implied corrections actually zero the
/// syndrome before touching any data.
pub(crate) fn solve(syndrome: &[u8], erasures: &[u8]) -> Option<Solution> {
    let two_t = syndrome.len();
    debug_assert!(two_t <= MAX_PARITY && erasures.len() <= two_t);
    let n = two_t + 1;

    let mut u = [0u8; MAX_PARITY + 1];
    let mut v = [0u8; MAX_PARITY + 1];
    let mut w = [0u8; MAX_PARITY + 1];
    let mut x = [0u8; MAX_PARITY + 1];

    v[..two_t].copy_from_slice(syndrome);
    u[two_t] = 1;
    x[0] = 1;

    let mut degree: i32 = -1;
    let mut consumed: usize = 0;

    for _ in 0..two_t {
        // The first passes of the loop fold in the known erasure locators;
        // after those are exhausted it becomes the ordinary Euclidean
        // reduction.
        let first = consumed < erasures.len();
        let swap = !first && v[two_t - 1] != 0 && degree < 0;

        let (g, z) = if first {
            let locator = gf256::pow_alpha(erasures[consumed] as usize);
            consumed += 1;
            (locator, 1)
        } else {
            (u[two_t], v[two_t - 1])
        };

        if swap {
            degree = -degree - 1;
        } else if !first {
            degree -= 1;
        }

        let mut v_adjust = [0u8; MAX_PARITY + 1];
        let mut x_adjust = [0u8; MAX_PARITY + 1];
        if first {
            poly_scale(&v[..n], z, &mut v_adjust[..n]);
            poly_scale(&x[..n], z, &mut x_adjust[..n]);
        } else {
            poly_scale(&u[..n], z, &mut v_adjust[..n]);
            poly_scale(&w[..n], z, &mut x_adjust[..n]);
        }

        // new_V = G·z·V + adjust, and likewise for X.
        let mut new_v = v;
        let mut new_x = x;
        poly_shift_up(&mut new_v[..n]);
        poly_shift_up(&mut new_x[..n]);
        poly_scale_in_place(&mut new_v[..n], g);
        poly_scale_in_place(&mut new_x[..n], g);
        poly_add_in(&mut new_v[..n], &v_adjust[..n]);
        poly_add_in(&mut new_x[..n], &x_adjust[..n]);

        if swap {
            u = v;
            w = x;
            poly_shift_up(&mut u[..n]);
            poly_shift_up(&mut w[..n]);
        }

        v = new_v;
        x = new_x;
    }

    if degree < 0 && consumed == erasures.len() {
        let mut omega = [0u8; MAX_PARITY];
        omega[..two_t].copy_from_slice(&v[..two_t]);
        Some(Solution { sigma: x, omega })
    } else {
        None
    }
}

/// Forney's formula: the error magnitude at a codeword position whose
/// inverse locator is `location` (i.e. α⁻ⁱ for position i).
///
/// The DAT family's check matrices all start with a row of ones (the codes
/// use b0 = 0), so the usual location^b0 factor in the numerator is 1 and
/// is skipped. In GF(2) the formal derivative of σ is just its odd terms,
/// which is what the inner loop accumulates.
pub(crate) fn error_at(sigma: &[u8], omega: &[u8], location: u8) -> u8 {
    let top = gf256::evaluate(omega, location);

    let mut derivative = 0u8;
    let mut y = 1u8;
    for (i, &coefficient) in sigma.iter().enumerate().skip(1) {
        if i & 1 == 1 {
            derivative ^= gf256::multiply(coefficient, y);
        }
        y = gf256::multiply(y, location);
    }

    let bottom = gf256::multiply(derivative, location);
    gf256::multiply(top, gf256::invert(bottom))
}
