// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A solution to Advent of Code 2019 Day 2 built using the `intcomputer` library.

use intcomputer::prelude::*;
use std::error::Error;

fn part1(machine: &mut Machine) -> Result<i64, ExecutionError> {
    machine.reset();
    machine.set_noun_verb(12, 2)?;
    machine.execute()
}

fn part2(machine: &mut Machine) -> Option<i64> {
    #[allow(clippy::unreadable_literal, reason = "from Advent of Code")]
    let (noun, verb) = machine.find_noun_verb(19690720, 0..=99)?;
    Some(100 * noun + verb)
}

fn main() -> Result<(), Box<dyn Error>> {
    use std::env::args_os;
    use std::fs::File;
    let path = args_os().nth(1).ok_or("missing file name")?;
    let mut machine = Machine::from_program(Program::read_from(File::open(path)?)?);
    println!("part 1: {}", part1(&mut machine)?);
    match part2(&mut machine) {
        Some(answer) => println!("part 2: {answer}"),
        None => return Err("no noun and verb produce the target".into()),
    }
    Ok(())
}
