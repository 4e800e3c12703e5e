/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Hashing primitives: the Karp–Rabin rolling fingerprint driving the
//! differencers and the CRC-64/XZ integrity hash stored in the delta
//! container.

mod crc64;
mod rolling;

pub use crc64::crc64;
pub use rolling::{RollingHash, BASE, MERSENNE_61};
