/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod apply;
pub mod cmds;
pub mod container;
pub mod diff;
pub mod error;
pub mod hash;
pub mod inplace;
pub mod utils;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::apply::*;
    pub use crate::cmds::*;
    pub use crate::container::*;
    pub use crate::diff::*;
    pub use crate::error::*;
    pub use crate::hash::*;
    pub use crate::inplace::*;
    pub use crate::utils::*;
}
