// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Load an Intcode program, optionally patch it, and run it to completion

use clap::{Parser, ValueEnum};
use intcomputer::disasm::disassemble;
use intcomputer::prelude::*;
use itertools::Itertools;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_CRATE_NAME"), '-', env!("CARGO_PKG_VERSION"));
const INTCODE_HELP: &str = "File containing the intcode\nuses stdin if unset or set to '-'";
const PATCH_HELP: &str =
    "Set memory before running, as ADDRESS=VALUE\nmay be given more than once, e.g. -p 1=12 -p 2=2";

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = VERSION)]
#[command(about = "Intcode Runner", long_about = None)]
struct Args {
    #[arg(help = INTCODE_HELP.split_once('\n').map_or(INTCODE_HELP, |(short, _)| short))]
    #[arg(long_help = INTCODE_HELP)]
    source: Option<PathBuf>,
    #[arg(help = "Format of the intcode")]
    #[arg(short, long)]
    #[arg(default_value = "ascii")]
    format: InputFormat,
    #[arg(help = PATCH_HELP.split_once('\n').map_or(PATCH_HELP, |(short, _)| short))]
    #[arg(long_help = PATCH_HELP)]
    #[arg(short, long = "patch", value_parser = parse_patch)]
    patches: Vec<(u64, i64)>,
    #[arg(help = "Comma-separated values to queue as input")]
    #[arg(short = 'i', long = "input", value_delimiter = ',', allow_negative_numbers = true)]
    inputs: Vec<i64>,
    #[arg(help = "Log each executed instruction to stderr")]
    #[arg(short, long)]
    trace: bool,
    #[arg(help = "Print the disassembly of the patched memory instead of running it")]
    #[arg(short, long)]
    disassemble: bool,
}

#[derive(PartialEq, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// comma-separated ASCII-encoded decimal numbers
    #[value(alias("text"))]
    #[value(alias("aoc"))]
    Ascii,
    /// little-endian 64-bit integers
    #[cfg_attr(target_endian = "little", value(alias("binary-native")))]
    #[value(name("binary-little-endian"), alias("binle"))]
    LittleEndian,
    #[cfg_attr(target_endian = "big", value(alias("binary-native")))]
    #[value(name("binary-big-endian"), alias("binbe"))]
    /// big-endian 64-bit integers
    BigEndian,
}

#[derive(Debug)]
struct InputFormatError {
    msg: Cow<'static, str>,
}

impl Display for InputFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error parsing input: {}", self.msg)
    }
}
impl Error for InputFormatError {}

impl<IntoCow: Into<Cow<'static, str>>> From<IntoCow> for InputFormatError {
    fn from(cow: IntoCow) -> Self {
        Self { msg: cow.into() }
    }
}

fn load_bin<F: Fn([u8; 8]) -> i64>(input: &[u8], func: F) -> Result<Program, InputFormatError> {
    let (chunks, remainder) = input.as_chunks::<8>();
    if !remainder.is_empty() {
        return Err(format!("{} extra bytes", remainder.len()).into());
    }
    if chunks.is_empty() {
        return Err("no intcode found".into());
    }
    Ok(chunks.iter().copied().map(func).collect())
}

impl InputFormat {
    fn parse(self, input: &[u8]) -> Result<Program, InputFormatError> {
        match self {
            InputFormat::Ascii => str::from_utf8(input)
                .map_err(|e| e.to_string())?
                .parse()
                .map_err(|e: LoadError| e.to_string().into()),
            InputFormat::LittleEndian => load_bin(input, i64::from_le_bytes),
            InputFormat::BigEndian => load_bin(input, i64::from_be_bytes),
        }
    }
}

fn parse_patch(arg: &str) -> Result<(u64, i64), String> {
    let (address, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=VALUE, got {arg:?}"))?;
    let address = address
        .trim()
        .parse()
        .map_err(|e| format!("invalid address {address:?}: {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value {value:?}: {e}"))?;
    Ok((address, value))
}

fn main() -> Result<(), DisplayedError> {
    let args = Args::parse();
    let input = match args.source.as_deref() {
        Some(path) if path.as_os_str() != "-" => fs::read(path)?,
        _ => {
            let mut v = Vec::new();
            io::stdin().read_to_end(&mut v)?;
            v
        }
    };

    let mut machine = Machine::from_program(args.format.parse(&input)?).with_inputs(args.inputs);
    for (address, value) in args.patches {
        machine.patch(address, value)?;
    }

    if args.disassemble {
        print!("{}", disassemble(machine.memory().iter().copied()));
        return Ok(());
    }

    if args.trace {
        machine.log_with(io::stderr());
    }

    let result = machine.execute();
    if !machine.outputs().is_empty() {
        println!("outputs: {}", machine.outputs().iter().join(","));
    }
    println!("address 0: {}", result?);
    Ok(())
}

/// a wrapper around a [`Box`ed][Box] [dyn Error][Error] that uses its implementation of [Display]
/// for the [Debug] impl, to display the Error if returned from `main`
struct DisplayedError(Box<dyn Error>);
impl<E: Error + 'static> From<E> for DisplayedError {
    fn from(e: E) -> Self {
        Self(Box::from(e))
    }
}

impl Debug for DisplayedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_args() {
        assert_eq!(parse_patch("1=12"), Ok((1, 12)));
        assert_eq!(parse_patch(" 2 = -3 "), Ok((2, -3)));
        assert!(parse_patch("12").is_err());
        assert!(parse_patch("x=1").is_err());
        assert!(parse_patch("1=y").is_err());
        assert!(parse_patch("-1=5").is_err());
        assert!(parse_patch("1=99999999999999999999").is_err());
    }

    #[test]
    fn binary_formats() {
        let code = [1_i64, 0, 0, 0, 99];
        let le = code.iter().flat_map(|i| i.to_le_bytes()).collect_vec();
        let be = code.iter().flat_map(|i| i.to_be_bytes()).collect_vec();
        assert_eq!(
            InputFormat::LittleEndian.parse(&le).unwrap().as_slice(),
            &code
        );
        assert_eq!(InputFormat::BigEndian.parse(&be).unwrap().as_slice(), &code);

        let mut extra = le;
        extra.push(0);
        assert_eq!(
            InputFormat::LittleEndian.parse(&extra).unwrap_err().msg,
            "1 extra bytes"
        );
        assert_eq!(
            InputFormat::BigEndian.parse(&[]).unwrap_err().msg,
            "no intcode found"
        );
    }

    #[test]
    fn ascii_format() {
        assert_eq!(
            InputFormat::Ascii.parse(b"1,0,0,0,99\n").unwrap().as_slice(),
            &[1, 0, 0, 0, 99]
        );
        assert!(InputFormat::Ascii.parse(b"1,0,\xff").is_err());
        assert!(InputFormat::Ascii.parse(b"1,,99").is_err());
        assert!(InputFormat::Ascii.parse(b"").is_err());
    }
}
