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

use common::{fill_parity, init, VecSource};
use datfox::ecc::{Codeword, CodewordSource, EccStatus};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A pair of 32-byte blocks interpreted through the C1 interleave, as the
/// track walk does it: position p reads block p/16, byte (p%16)·2 + set.
struct BlockPair {
    data: [[u8; 32]; 2],
    valid: [[bool; 32]; 2],
    offset: usize,
}

impl BlockPair {
    fn new(blocks: [&str; 2], erasures: Option<[&str; 2]>) -> Self {
        let mut data = [[0u8; 32]; 2];
        let mut valid = [[true; 32]; 2];
        for i in 0..2 {
            hex_decode(blocks[i], &mut data[i]);
            if let Some(e) = &erasures {
                let mut flags = [0u8; 32];
                hex_decode(e[i], &mut flags);
                for j in 0..32 {
                    valid[i][j] = flags[j] == 0;
                }
            }
        }
        Self {
            data,
            valid,
            offset: 0,
        }
    }

    fn fill_from(&mut self, offset: usize) {
        self.offset = offset;
    }
}

impl CodewordSource for BlockPair {
    fn data(&self, position: usize) -> u8 {
        self.data[position / 16][(position % 16) * 2 + self.offset]
    }
    fn set_data(&mut self, position: usize, value: u8) {
        self.data[position / 16][(position % 16) * 2 + self.offset] = value;
    }
    fn valid(&self, position: usize) -> bool {
        self.valid[position / 16][(position % 16) * 2 + self.offset]
    }
    fn set_valid(&mut self, position: usize, value: bool) {
        self.valid[position / 16][(position % 16) * 2 + self.offset] = value;
    }
}

fn hex_decode(s: &str, out: &mut [u8]) {
    let bytes = s.as_bytes();
    for (i, slot) in out.iter_mut().enumerate() {
        let hi = char::from(bytes[2 * i]).to_digit(16).unwrap() as u8;
        let lo = char::from(bytes[2 * i + 1]).to_digit(16).unwrap() as u8;
        *slot = hi << 4 | lo;
    }
}

struct VectorCase {
    input: [&'static str; 2],
    erasures: Option<[&'static str; 2]>,
    answer: Option<[&'static str; 2]>,
    results: [EccStatus; 2],
}

fn run_case(case: &VectorCase) {
    let mut pair = BlockPair::new(case.input, case.erasures);

    let expected = case
        .answer
        .map(|answer| BlockPair::new(answer, None));

    for interleave in 0..2 {
        pair.fill_from(interleave);
        let mut c1 = Codeword::c1();
        c1.fill(&pair);
        let status = c1.correct();
        c1.dump(&mut pair);
        assert_eq!(status, case.results[interleave], "interleave {}", interleave);
    }

    if let Some(expected) = expected {
        assert_eq!(pair.data, expected.data);
    }
}

#[test]
fn c1_clean_vectors_pass_untouched() {
    init();
    run_case(&VectorCase {
        input: [
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ],
        erasures: None,
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ]),
        results: [EccStatus::NoErrors, EccStatus::NoErrors],
    });
}

#[test]
fn c1_two_errors_in_the_odd_interleave_are_repaired() {
    init();
    run_case(&VectorCase {
        input: [
            "20abaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976e",
        ],
        erasures: None,
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ]),
        results: [EccStatus::NoErrors, EccStatus::Corrected],
    });
}

#[test]
fn c1_three_errors_are_beyond_repair() {
    init();
    run_case(&VectorCase {
        input: [
            "20abaa010024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976e",
        ],
        erasures: None,
        answer: None,
        results: [EccStatus::NoErrors, EccStatus::Uncorrectable],
    });
}

#[test]
fn c1_two_errors_in_each_interleave_are_repaired() {
    init();
    run_case(&VectorCase {
        input: [
            "20aaFFFF0024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe795FFFF976d",
        ],
        erasures: None,
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ]),
        results: [EccStatus::Corrected, EccStatus::Corrected],
    });
}

#[test]
fn c1_erasure_flag_on_an_intact_byte_is_vouched_for() {
    init();
    run_case(&VectorCase {
        input: [
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ],
        erasures: Some([
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000011",
        ]),
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ]),
        results: [EccStatus::NoErrors, EccStatus::Corrected],
    });
}

#[test]
fn c1_erasure_flag_on_a_damaged_byte_is_repaired() {
    init();
    run_case(&VectorCase {
        input: [
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da97FF",
        ],
        erasures: Some([
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000011",
        ]),
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa0000241317abbbe79542da976d",
        ]),
        results: [EccStatus::NoErrors, EccStatus::Corrected],
    });
}

#[test]
fn c1_eight_erasures_overwhelm_the_code() {
    init();
    // C1 favors detection over correction: known-bad positions count
    // against the budget but are never fed to the solver.
    run_case(&VectorCase {
        input: [
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa00002413170000000000000000",
        ],
        erasures: Some([
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000001111111111111111",
        ]),
        // No byte may be touched; only the validity flags change.
        answer: Some([
            "20aaaa000024131756940729193914d820aaaa000024131720aaaa0000241317",
            "20aaaa000024131756940729193914d820aaaa00002413170000000000000000",
        ]),
        results: [EccStatus::Uncorrectable, EccStatus::Uncorrectable],
    });
}

#[test]
fn c1_pathological_vector_is_rejected_not_miscorrected() {
    init();
    // A real-world capture that a naive corrector "fixed" wrongly: it has
    // more errors than the code can see, and the only right answer is
    // UNCORRECTABLE.
    run_case(&VectorCase {
        input: [
            "b10043005500af00fc00580029009f00d50073004800bd001a002100e5001700",
            "0a00420038009700af00770020000200a8009d00a5006a00670000000e00f100",
        ],
        erasures: None,
        answer: None,
        results: [EccStatus::Uncorrectable, EccStatus::NoErrors],
    });
}

/// A random valid C1 codeword (parity in the last four positions).
fn random_c1_codeword(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let mut codeword: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    fill_parity(&mut codeword, &[28, 29, 30, 31], 4);
    codeword
}

fn random_c2_codeword(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let mut codeword: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    fill_parity(&mut codeword, &[26, 27, 28, 29, 30, 31], 6);
    codeword
}

fn distinct_positions(rng: &mut ChaCha8Rng, count: usize, n: usize) -> Vec<usize> {
    let mut positions = Vec::new();
    while positions.len() < count {
        let p = rng.gen_range(0..n);
        if !positions.contains(&p) {
            positions.push(p);
        }
    }
    positions
}

#[test]
fn c1_round_trips_up_to_two_random_errors() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(0x0da7);

    for trial in 0..200 {
        let original = random_c1_codeword(&mut rng);
        let errors = 1 + trial % 2;

        let mut source = VecSource::new(original.clone());
        for &p in &distinct_positions(&mut rng, errors, 32) {
            let delta = rng.gen_range(1..=255) as u8;
            source.data[p] ^= delta;
        }

        let mut c1 = Codeword::c1();
        c1.fill(&source);
        assert_eq!(c1.correct(), EccStatus::Corrected, "trial {}", trial);
        c1.dump(&mut source);
        assert_eq!(source.data, original, "trial {}", trial);
        assert!(source.valid.iter().all(|&v| v));
    }
}

#[test]
fn c1_never_claims_a_flood_of_errors_clean() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..200 {
        let original = random_c1_codeword(&mut rng);

        let mut source = VecSource::new(original);
        for &p in &distinct_positions(&mut rng, 5, 32) {
            let delta = rng.gen_range(1..=255) as u8;
            source.data[p] ^= delta;
        }

        let mut c1 = Codeword::c1();
        c1.fill(&source);
        match c1.correct() {
            EccStatus::Uncorrectable | EccStatus::Corrected => {}
            EccStatus::NoErrors => panic!("five errors reported as clean"),
        }
    }
}

#[test]
fn c2_recovers_up_to_six_erasures() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for erasures in 1..=6usize {
        for _ in 0..50 {
            let original = random_c2_codeword(&mut rng);

            let mut source = VecSource::new(original.clone());
            for &p in &distinct_positions(&mut rng, erasures, 32) {
                source.data[p] = rng.gen();
                source.valid[p] = false;
            }

            let mut c2 = Codeword::c2();
            c2.fill(&source);
            assert_eq!(c2.correct(), EccStatus::Corrected, "{} erasures", erasures);
            c2.dump(&mut source);
            assert_eq!(source.data, original);
            assert!(source.valid.iter().all(|&v| v));
        }
    }
}

#[test]
fn c2_gives_up_at_seven_erasures() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(100);

    let original = random_c2_codeword(&mut rng);
    let mut source = VecSource::new(original);
    for &p in &distinct_positions(&mut rng, 7, 32) {
        source.data[p] = rng.gen();
        source.valid[p] = false;
    }

    let mut c2 = Codeword::c2();
    c2.fill(&source);
    assert_eq!(c2.correct(), EccStatus::Uncorrectable);
    c2.dump(&mut source);
    assert!(source.valid.iter().all(|&v| !v));
}

#[test]
fn c3_recovers_up_to_two_erasures() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for erasures in 1..=2usize {
        for _ in 0..50 {
            let mut original: Vec<u8> = (0..46).map(|_| rng.gen()).collect();
            fill_parity(&mut original, &[44, 45], 2);

            let mut source = VecSource::new(original.clone());
            for &p in &distinct_positions(&mut rng, erasures, 46) {
                source.data[p] = rng.gen();
                source.valid[p] = false;
            }

            let mut c3 = Codeword::c3();
            c3.fill(&source);
            assert_eq!(c3.correct(), EccStatus::Corrected);
            c3.dump(&mut source);
            assert_eq!(source.data, original);
        }
    }
}
