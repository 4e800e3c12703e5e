/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// The fingerprint modulus, the Mersenne prime 2⁶¹ − 1.
pub const MERSENNE_61: u64 = (1 << 61) - 1;

/// The fingerprint base. A small odd prime avoids the low-bit degeneracy
/// of base 256.
pub const BASE: u64 = 263;

/// Process-wide cache of `BASE^(p−1) mod MERSENNE_61`, keyed by seed
/// length. Append-only; recomputation is idempotent.
static BASE_POWERS: OnceLock<Mutex<HashMap<usize, u64>>> = OnceLock::new();

fn base_power(seed_len: usize) -> u64 {
    let cache = BASE_POWERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap();
    *cache.entry(seed_len).or_insert_with(|| {
        let mut power = 1;
        for _ in 1..seed_len {
            power = mul_mod(power, BASE);
        }
        power
    })
}

#[inline(always)]
fn mul_mod(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) % MERSENNE_61 as u128) as u64
}

#[inline(always)]
fn push_byte(fingerprint: u64, byte: u8) -> u64 {
    (mul_mod(fingerprint, BASE) + byte as u64) % MERSENNE_61
}

/// A Karp–Rabin window over a borrowed byte string.
///
/// The window holds the 61-bit fingerprint of
/// `data[start..start + seed_len]`; [`roll`](RollingHash::roll) slides it
/// one byte to the right in constant time, and
/// [`rebuild`](RollingHash::rebuild) repositions it at an arbitrary
/// offset in O(seed_len). A sequence of rolls yields exactly the residue
/// a rebuild at the final offset would: unequal windows collide with
/// probability about seed_len / 2⁶¹ per pair, so callers must verify the
/// seed bytes before committing to a match. The fingerprint is an
/// index, never proof.
#[derive(Debug, Clone)]
pub struct RollingHash<'a> {
    data: &'a [u8],
    seed_len: usize,
    /// `BASE^(seed_len − 1) mod MERSENNE_61`, from the process-wide cache.
    base_power: u64,
    start: usize,
    fingerprint: u64,
}

impl<'a> RollingHash<'a> {
    /// Creates a window of length `seed_len` positioned at `start`.
    ///
    /// # Panics
    ///
    /// If `seed_len` is zero or the window does not fit in `data`.
    pub fn new(data: &'a [u8], start: usize, seed_len: usize) -> Self {
        assert!(seed_len >= 1, "seed length must be at least 1");
        let mut window = RollingHash {
            data,
            seed_len,
            base_power: base_power(seed_len),
            start,
            fingerprint: 0,
        };
        window.rebuild(start);
        window
    }

    /// The fingerprint of the current window.
    #[inline(always)]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// The offset of the first byte of the current window.
    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Recomputes the fingerprint from scratch at `start`.
    pub fn rebuild(&mut self, start: usize) {
        assert!(start + self.seed_len <= self.data.len());
        let mut fingerprint = 0;
        for &byte in &self.data[start..start + self.seed_len] {
            fingerprint = push_byte(fingerprint, byte);
        }
        self.start = start;
        self.fingerprint = fingerprint;
    }

    /// Slides the window one byte to the right in constant time.
    ///
    /// # Panics
    ///
    /// If the shifted window does not fit in the data.
    pub fn roll(&mut self) {
        let outgoing = self.data[self.start] as u64;
        let incoming = self.data[self.start + self.seed_len] as u64;
        // keep the subtraction non-negative on residues
        let fingerprint =
            (self.fingerprint + MERSENNE_61 - mul_mod(outgoing, self.base_power)) % MERSENNE_61;
        self.fingerprint = (mul_mod(fingerprint, BASE) + incoming) % MERSENNE_61;
        self.start += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_roll_matches_rebuild() {
        let mut rng = SmallRng::seed_from_u64(0);
        let data: Vec<u8> = (0..1000).map(|_| rng.random()).collect();
        for seed_len in [1, 2, 4, 16, 61] {
            let mut rolled = RollingHash::new(&data, 0, seed_len);
            for start in 1..data.len() - seed_len + 1 {
                rolled.roll();
                let rebuilt = RollingHash::new(&data, start, seed_len);
                assert_eq!(
                    rolled.fingerprint(),
                    rebuilt.fingerprint(),
                    "divergence at offset {} with seed length {}",
                    start,
                    seed_len
                );
            }
        }
    }

    #[test]
    fn test_equal_windows_equal_fingerprints() {
        let data = b"abcabcabc";
        let first = RollingHash::new(data, 0, 3);
        let second = RollingHash::new(data, 3, 3);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_base_power_cache() {
        assert_eq!(base_power(1), 1);
        assert_eq!(base_power(2), BASE);
        assert_eq!(base_power(3), BASE * BASE);
        // second hit comes from the cache
        assert_eq!(base_power(3), BASE * BASE);
    }
}
