/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use thiserror::Error;

/// Errors returned by the delta engine.
///
/// No error is recovered internally: every operation either succeeds and
/// returns its full contract, or fails with one of these variants and no
/// partial result. Note that the differencers themselves cannot fail once
/// their parameters are validated, as every reference/version pair admits
/// at least the trivial all-literal encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// The container magic is wrong, a record type is unknown, or the
    /// stream ends in the middle of a record.
    #[error("bad delta format: {0}")]
    BadFormat(String),

    /// A recomputed integrity hash differs from the header field.
    #[error("{which} hash mismatch: header says {expected:#018x}, data hashes to {computed:#018x}")]
    HashMismatch {
        /// Which field failed, `"source"` or `"destination"`.
        which: &'static str,
        expected: u64,
        computed: u64,
    },

    /// A parameter is out of range. Raised at entry, before any work
    /// begins.
    #[error("bad parameter: {0}")]
    BadParameter(String),

    /// A command references offsets outside its buffer. Deltas produced
    /// by this crate never trigger this; it indicates corruption or a
    /// bug.
    #[error("internal consistency: {0}")]
    InternalConsistency(String),
}

/// A [`std::result::Result`] with a [`DeltaError`] error type.
pub type Result<T> = std::result::Result<T, DeltaError>;
