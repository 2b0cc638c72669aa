// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A solution to Advent of Code 2019 Day 5 built using the `intcomputer` library.

use intcomputer::prelude::*;
use std::error::Error;

/// Run the diagnostic program for the system with ID `system_id`, returning the diagnostic code
fn diagnose(machine: &mut Machine, system_id: i64) -> Result<i64, Box<dyn Error>> {
    machine.reset();
    let (mut outputs, State::Halted) = machine.run_through_inputs([system_id])? else {
        return Err("diagnostic program wanted more input".into());
    };
    let diagnostic = outputs.pop().ok_or("diagnostic program had no output")?;
    if outputs.into_iter().any(|i| i != 0) {
        return Err("diagnostic failed".into());
    }
    Ok(diagnostic)
}

fn main() -> Result<(), Box<dyn Error>> {
    use std::env::args_os;
    use std::fs::read_to_string;
    let input = read_to_string(args_os().nth(1).ok_or("missing file name")?)?;
    let mut machine: Machine = input.parse()?;
    println!("part 1: {}", diagnose(&mut machine, 1)?);
    println!("part 2: {}", diagnose(&mut machine, 5)?);
    Ok(())
}
