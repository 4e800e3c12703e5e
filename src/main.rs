/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Command;
mod cli;

pub fn main() -> Result<()> {
    let command = Command::new("webdelta")
        .about("Computes, converts, inspects, and applies binary deltas.")
        .subcommand_required(true)
        .arg_required_else_help(true);

    macro_rules! impl_dispatch {
        ($command:expr, $($module:ident),*) => {{
            let command = $command;
            $(
                let command = cli::$module::cli(command);
            )*

            let matches = command.get_matches();
            match matches.subcommand() {
                $(
                    Some((cli::$module::COMMAND_NAME, sub_m)) => cli::$module::main(sub_m),
                )*
                _ => unreachable!(),
            }
        }};
    }

    impl_dispatch!(command, encode, decode, info, inplace, gen)
}
