// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Disassembler-related functionality
//!
//! See [disassemble] for documentation

use itertools::Itertools;

use super::internals::parse_op;
use super::{OpCode, ParamMode};

/// Parse `i` as an instruction, but only if re-encoding the result would give back `i`. That
/// rules out mode digits for parameters the opcode doesn't have.
fn parse_op_strict(i: i64) -> Option<(OpCode, [ParamMode; 3])> {
    let (opcode, modes) = parse_op(i).ok()?;
    let rebuilt = modes
        .iter()
        .zip([100, 1000, 10000])
        .take(usize::try_from(opcode.arity()).ok()?)
        .fold(opcode as i64, |acc, (&mode, place)| acc + mode as i64 * place);
    (rebuilt == i).then_some((opcode, modes))
}

/// Create disassembly from the memory
///
/// Each instruction gets its own line, written as its mnemonic followed by its parameters.
/// Parameters in [positional mode](ParamMode::Positional) are written as-is, while
/// [immediate](ParamMode::Immediate) and [relative](ParamMode::Relative) parameters are prefixed
/// with `#` and `@` respectively. Runs of ints that aren't instructions are grouped into `DATA`
/// lines.
///
/// # Example
///
/// ```
/// use intcomputer::disasm::disassemble;
/// const CODE: [i64; 12] = [1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50];
/// assert_eq!(
///     disassemble(CODE),
///     "ADD 9, 10, 3\nMUL 3, 11, 0\nHALT\nDATA 30, 40, 50\n"
/// );
/// ```
///
/// # Caveats
///
/// Due to the ability to jump to any index, it's ambiguous where an instruction begins, and data
/// can look like valid instructions. This function starts at the beginning of `mem_iter`, and
/// treats the first valid opcode as the start of an instruction, falling back to `DATA` for
/// anything that can't be matched.
///
/// If an int's last 2 digits are a valid opcode, but it has mode digits for parameters the opcode
/// doesn't take, it's treated as data, even though the [Machine](crate::Machine) would run it:
///
/// ```
/// use intcomputer::{prelude::*, disasm::disassemble};
/// const HALT_WITH_MODES: i64 = 21299;
/// let mut machine = Machine::new([HALT_WITH_MODES]);
/// assert_eq!(machine.run_through_inputs(empty()).unwrap(), (vec![], State::Halted));
/// assert_eq!(disassemble([HALT_WITH_MODES]), "DATA 21299\n");
/// ```
///
/// Because Intcode programs can modify themselves, the disassembly can only show the code as it
/// exists at a specific point in time.
pub fn disassemble(mem_iter: impl IntoIterator<Item = i64>) -> String {
    let mut mem_iter = mem_iter.into_iter().peekable();

    let mut lines = Vec::new();

    while let Some(i) = mem_iter.next() {
        if let Some((opcode, modes)) = parse_op_strict(i) {
            let params = modes
                .iter()
                .take(usize::try_from(opcode.arity()).unwrap_or_default())
                .map(|mode| format!("{mode}{}", mem_iter.next().unwrap_or_default()))
                .join(", ");
            if params.is_empty() {
                lines.push(opcode.to_string());
            } else {
                lines.push(format!("{opcode} {params}"));
            }
        } else {
            let mut data = vec![i];
            while let Some(n) = mem_iter.next_if(|&n| parse_op_strict(n).is_none()) {
                data.push(n);
            }
            lines.push(format!("DATA {}", data.iter().join(", ")));
        }
    }

    lines.into_iter().map(|line| format!("{line}\n")).collect()
}
