// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A solution to Advent of Code 2019 Day 9 built using the `intcomputer` library.

use intcomputer::prelude::*;
use std::error::Error;

fn boost(machine: &mut Machine, mode: i64) -> Result<i64, Box<dyn Error>> {
    machine.reset();
    machine.push_input(mode);
    machine.execute()?;
    match machine.outputs() {
        &[keycode] => Ok(keycode),
        outputs => Err(format!("BOOST reported malfunctioning opcodes: {outputs:?}").into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    use std::env::args_os;
    use std::fs::read_to_string;
    let input = read_to_string(args_os().nth(1).ok_or("missing file name")?)?;
    let mut machine: Machine = input.parse()?;
    println!("part 1: {}", boost(&mut machine, 1)?);
    println!("part 2: {}", boost(&mut machine, 2)?);
    Ok(())
}
