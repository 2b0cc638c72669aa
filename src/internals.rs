// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use super::*;
use std::io::Write;
use crate::trace::{Param, TracedInstr};

/// Split an instruction int into its opcode and parameter modes.
///
/// Given a 5 digit number, digits ABCDE are used as follows:
/// DE is the two-digit opcode
/// C is the 1st parameter's mode
/// B is the 2nd parameter's mode
/// A is the 3rd parameter's mode
///
/// So *0*1202 would be parsed as follows:
///
/// Opcode 02 is multiply
/// C=2: 1st parameter is in relative mode
/// B=1: 2nd parameter is in immediate mode
/// A=0: 3rd parameter is in positional mode
///
/// Digits beyond the ten thousands' place are folded into the 3rd parameter's mode, so they are
/// rejected as an unknown mode.
pub(crate) fn parse_op(op: i64) -> Result<(OpCode, [ParamMode; 3]), DecodeError> {
    let opcode = OpCode::try_from(op % 100).map_err(|_| DecodeError::Opcode)?;
    let modes = [
        ParamMode::try_from((op / 100) % 10), // C (hundreds place)
        ParamMode::try_from((op / 1000) % 10), // B (thousands place)
        ParamMode::try_from(op / 10000),      // A (ten thousands place and up)
    ];
    match modes {
        [Ok(c), Ok(b), Ok(a)] => Ok((opcode, [c, b, a])),
        [Err(m), _, _] | [_, Err(m), _] | [_, _, Err(m)] => Err(DecodeError::Mode(m)),
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum DecodeError {
    Opcode,
    Mode(i64),
}

impl Machine {
    /// The raw parameter `offset` ints after the current instruction
    fn raw_param(&self, offset: u64) -> i64 {
        self.memory[self.index + offset]
    }

    /// Turn a parameter into the address it refers to, given that it's not immediate
    fn address_of(&self, mode: ParamMode, raw: i64) -> Result<u64, ExecutionError> {
        let address = match mode {
            ParamMode::Relative => self
                .rel_offset
                .checked_add(raw)
                .ok_or(ExecutionError::ArithmeticOverflow { ip: self.index })?,
            _ => raw,
        };
        u64::try_from(address).map_err(|_| ExecutionError::NegativeAddress {
            address,
            ip: self.index,
        })
    }

    /// Processes the parameter `offset` ints after the current instruction into a concrete value
    /// using the method appropriate for `mode`.
    fn resolve_param(&self, mode: ParamMode, offset: u64) -> Result<Param, ExecutionError> {
        let raw = self.raw_param(offset);
        let value = match mode {
            ParamMode::Immediate => raw,
            ParamMode::Positional | ParamMode::Relative => self.memory[self.address_of(mode, raw)?],
        };
        Ok(Param { raw, value })
    }

    /// Processes the parameter `offset` ints after the current instruction into a destination
    /// address, failing if it's in [`ParamMode::Immediate`] or out of range
    fn resolve_dest(&self, mode: ParamMode, offset: u64) -> Result<(i64, u64), ExecutionError> {
        if mode == ParamMode::Immediate {
            return Err(ExecutionError::InvalidWriteMode {
                address: self.index,
            });
        }
        let raw = self.raw_param(offset);
        let dest = self.check_writable(self.address_of(mode, raw)?)?;
        Ok((raw, dest))
    }

    /// Ensure that `address` is no higher than [`MAX_ADDRESS`]
    pub(crate) fn check_writable(&self, address: u64) -> Result<u64, ExecutionError> {
        if address > MAX_ADDRESS {
            return Err(ExecutionError::AddressOutOfRange {
                address: i64::try_from(address).unwrap_or(i64::MAX),
                ip: self.index,
            });
        }
        Ok(address)
    }

    /// Hand an executed instruction to the logger and trace, if either is active
    fn record(
        &mut self,
        op_int: i64,
        opcode: OpCode,
        modes: [ParamMode; 3],
        params: &[Param],
    ) -> Result<(), ExecutionError> {
        if self.logger.is_none() && self.trace.is_none() {
            return Ok(());
        }
        let traced = TracedInstr::build(op_int, opcode, modes, self.index, self.rel_offset, params);
        if let Some(logger) = self.logger.as_mut() {
            writeln!(
                logger,
                "ip: {:>8} | rbo: {:>5} | {traced}",
                self.index, self.rel_offset
            )?;
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.0.push(traced);
        }
        Ok(())
    }

    /// common logic of all 4 instructions that take 3 parameters
    fn op3(
        &mut self,
        op_int: i64,
        opcode: OpCode,
        modes: [ParamMode; 3],
        operation: impl Fn(i64, i64) -> Option<i64>,
    ) -> Result<StepOutcome, ExecutionError> {
        let a = self.resolve_param(modes[0], 1)?;
        let b = self.resolve_param(modes[1], 2)?;
        let (raw, dest) = self.resolve_dest(modes[2], 3)?;
        let value = operation(a.value, b.value)
            .ok_or(ExecutionError::ArithmeticOverflow { ip: self.index })?;
        self.record(op_int, opcode, modes, &[a, b, Param { raw, value }])?;
        self.memory[dest] = value;
        self.index += 4;
        Ok(StepOutcome::Running)
    }

    fn jump(
        &mut self,
        op_int: i64,
        opcode: OpCode,
        modes: [ParamMode; 3],
        condition: impl Fn(i64) -> bool,
    ) -> Result<StepOutcome, ExecutionError> {
        let expr = self.resolve_param(modes[0], 1)?;
        let target = self.resolve_param(modes[1], 2)?;
        let taken = condition(expr.value);
        let dest = if taken {
            Some(
                u64::try_from(target.value).map_err(|_| ExecutionError::JumpToNegative {
                    target: target.value,
                    ip: self.index,
                })?,
            )
        } else {
            None
        };
        self.record(op_int, opcode, modes, &[expr, target])?;
        self.index = dest.unwrap_or(self.index + 3);
        Ok(StepOutcome::Running)
    }

    fn next_input(&mut self) -> Option<i64> {
        self.inputs
            .pop_front()
            .or_else(|| self.input_source.as_mut().and_then(|source| source()))
    }

    /// Fetch, decode, and execute the instruction at the instruction pointer.
    ///
    /// No state changes before an error is returned.
    pub(crate) fn exec_instruction(&mut self) -> Result<StepOutcome, ExecutionError> {
        let op_int = self.memory[self.index];
        let (opcode, modes) = parse_op(op_int).map_err(|e| match e {
            DecodeError::Opcode => ExecutionError::UnknownOpcode {
                opcode: op_int,
                address: self.index,
            },
            DecodeError::Mode(mode) => ExecutionError::UnknownMode {
                mode,
                address: self.index,
            },
        })?;

        match opcode {
            OpCode::Add => self.op3(op_int, opcode, modes, i64::checked_add),
            OpCode::Mul => self.op3(op_int, opcode, modes, i64::checked_mul),
            OpCode::Lt => self.op3(op_int, opcode, modes, |a, b| Some(i64::from(a < b))),
            OpCode::Eq => self.op3(op_int, opcode, modes, |a, b| Some(i64::from(a == b))),
            OpCode::Jnz => self.jump(op_int, opcode, modes, |i| i != 0),
            OpCode::Jz => self.jump(op_int, opcode, modes, |i| i == 0),
            OpCode::In => {
                // resolve first, so that a bad destination doesn't swallow input
                let (raw, dest) = self.resolve_dest(modes[0], 1)?;
                let Some(value) = self.next_input() else {
                    return Err(ExecutionError::InputExhausted {
                        address: self.index,
                    });
                };
                if let Err(e) = self.record(op_int, opcode, modes, &[Param { raw, value }]) {
                    // put it back, so a failing logger doesn't eat input
                    self.inputs.push_front(value);
                    return Err(e);
                }
                self.memory[dest] = value;
                self.index += 2;
                Ok(StepOutcome::Running)
            }
            OpCode::Out => {
                let a = self.resolve_param(modes[0], 1)?;
                self.record(op_int, opcode, modes, &[a])?;
                self.outputs.push(a.value);
                self.index += 2;
                Ok(StepOutcome::Running)
            }
            OpCode::Rbo => {
                let a = self.resolve_param(modes[0], 1)?;
                let rel_offset = self
                    .rel_offset
                    .checked_add(a.value)
                    .ok_or(ExecutionError::ArithmeticOverflow { ip: self.index })?;
                self.record(op_int, opcode, modes, &[a])?;
                self.rel_offset = rel_offset;
                self.index += 2;
                Ok(StepOutcome::Running)
            }
            OpCode::Halt => {
                self.record(op_int, opcode, modes, &[])?;
                Ok(StepOutcome::Halted)
            }
        }
    }
}
