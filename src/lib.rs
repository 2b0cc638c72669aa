// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! A resettable Intcode virtual machine
//!
//! The machine supports all of the [Opcodes] and [Parameter Modes] defined in the completed
//! Intcode computer for [Day 9], and is built around a load-once, run-many contract: a [Machine]
//! keeps the [Program] it was loaded from, and [Machine::reset] restores memory from it without
//! re-parsing anything. That makes brute-force searches over patched inputs cheap.
//!
//! # Example
//!
//! ```rust
//! use intcomputer::prelude::*;
//! let mut machine: Machine = "1,9,10,3,2,3,11,0,99,30,40,50".parse().unwrap();
//! assert_eq!(machine.execute().unwrap(), 3500);
//!
//! machine.reset();
//! // (mem[10] + mem[10]) * mem[11]
//! machine.patch(1, 10).unwrap();
//! machine.patch(2, 10).unwrap();
//! assert_eq!(machine.execute().unwrap(), 4000);
//! ```
//!
//! Programs that communicate through opcodes 3 and 4 can be run with queued inputs:
//!
//! ```rust
//! use intcomputer::prelude::*;
//! let mut machine = Machine::new([3, 0, 4, 0, 99]);
//! assert_eq!(
//!     machine.run_through_inputs([42]).unwrap(),
//!     (vec![42], State::Halted)
//! );
//! ```
//!
//! [Opcodes]: https://esolangs.org/wiki/Intcode#Opcodes
//! [Parameter Modes]: https://esolangs.org/wiki/Intcode#Parameter_Modes
//! [Day 9]: https://adventofcode.com/2019/day/9

/// A flat, zero-extending memory image
mod memory;

/// Instruction decoding and the shared logic of the instruction implementations
mod internals;

/// The day 2 noun/verb search
mod search;

pub mod disasm;
pub mod program;
pub mod trace;

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::ops::Index;
use std::str::FromStr;

use memory::Memory;
pub use program::{LoadError, Program};
pub use search::{NOUN_ADDRESS, VERB_ADDRESS};
use trace::Trace;

/// A small module that re-exports items needed when working with the Intcode machine
pub mod prelude {
    pub use crate::{ExecutionError, LoadError, Machine, Program, State, StepOutcome};
    pub use std::iter::empty;
}

/// The highest address that a running program may write to.
///
/// Reads from higher addresses are fine, and yield `0`, but a write would require allocating
/// memory all the way up to the destination. Programs computing destinations this large are
/// treated as faulty, and stopped with [`ExecutionError::AddressOutOfRange`].
pub const MAX_ADDRESS: u64 = (1 << 24) - 1;

/// The state of the machine, returned by [`Machine::run_through_inputs`] when it stops.
///
/// [Awaiting](State::Awaiting) means that there are more instructions to execute, but all input
/// has been consumed and the next instruction requires input.
///
/// [Halted](State::Halted) means that a `HALT` instruction has been executed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Execution is awaiting input
    Awaiting,
    /// Execution has halted
    Halted,
}

/// The result of executing a single instruction with [`Machine::step`]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// The instruction was executed and the machine can keep going
    Running,
    /// The instruction was `HALT`
    Halted,
}

/// An error that stopped execution
#[derive(Debug)]
#[non_exhaustive]
pub enum ExecutionError {
    /// An invalid opcode was encountered
    UnknownOpcode {
        /// the full instruction int, including any parameter mode digits
        opcode: i64,
        /// where the instruction was found
        address: u64,
    },
    /// An unknown parameter mode was encountered
    UnknownMode {
        /// the offending mode digit
        mode: i64,
        /// address of the instruction it belongs to
        address: u64,
    },
    /// An instruction tried to write to an immediate-mode destination
    InvalidWriteMode {
        /// address of the instruction
        address: u64,
    },
    /// A parameter resolved to a negative memory address
    NegativeAddress {
        /// the resolved address
        address: i64,
        /// address of the instruction
        ip: u64,
    },
    /// A parameter resolved to a destination above [`MAX_ADDRESS`]
    AddressOutOfRange {
        /// the resolved address
        address: i64,
        /// address of the instruction
        ip: u64,
    },
    /// A jump instruction tried to jump to a negative address
    JumpToNegative {
        /// the jump target
        target: i64,
        /// address of the instruction
        ip: u64,
    },
    /// An arithmetic instruction or relative base adjustment overflowed
    ArithmeticOverflow {
        /// address of the instruction
        ip: u64,
    },
    /// An input instruction was reached with no input available
    InputExhausted {
        /// address of the input instruction
        address: u64,
    },
    /// The machine previously faulted, and must be [reset](Machine::reset) before it can run
    Poisoned,
    /// The instruction logger failed to write
    LoggerFailed(io::Error),
}

impl ExecutionError {
    /// Whether the machine can keep going after this error once the cause is resolved.
    ///
    /// Only [`InputExhausted`](Self::InputExhausted) is recoverable: the input instruction is left
    /// unexecuted, so pushing more input and executing again picks up where it left off.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InputExhausted { .. })
    }
}

impl PartialEq for ExecutionError {
    fn eq(&self, other: &Self) -> bool {
        use ExecutionError as E;
        match (self, other) {
            (
                E::UnknownOpcode {
                    opcode: o1,
                    address: a1,
                },
                E::UnknownOpcode {
                    opcode: o2,
                    address: a2,
                },
            ) => o1 == o2 && a1 == a2,
            (E::UnknownMode { mode: m1, address: a1 }, E::UnknownMode { mode: m2, address: a2 }) => {
                m1 == m2 && a1 == a2
            }
            (E::InvalidWriteMode { address: lhs }, E::InvalidWriteMode { address: rhs })
            | (E::InputExhausted { address: lhs }, E::InputExhausted { address: rhs })
            | (E::ArithmeticOverflow { ip: lhs }, E::ArithmeticOverflow { ip: rhs }) => lhs == rhs,
            (
                E::NegativeAddress { address: a1, ip: i1 },
                E::NegativeAddress { address: a2, ip: i2 },
            )
            | (
                E::AddressOutOfRange { address: a1, ip: i1 },
                E::AddressOutOfRange { address: a2, ip: i2 },
            )
            | (
                E::JumpToNegative { target: a1, ip: i1 },
                E::JumpToNegative { target: a2, ip: i2 },
            ) => a1 == a2 && i1 == i2,
            (E::Poisoned, E::Poisoned) => true,
            // io::Error isn't comparable
            _ => false,
        }
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ExecutionError as E;
        match self {
            E::UnknownOpcode { opcode, address } => {
                write!(f, "encountered unrecognized opcode {opcode} at address {address}")
            }
            E::UnknownMode { mode, address } => write!(
                f,
                "encountered unknown parameter mode {mode} in instruction at address {address}"
            ),
            E::InvalidWriteMode { address } => write!(
                f,
                "instruction at address {address} attempted to write to an immediate parameter"
            ),
            E::NegativeAddress { address, ip } => write!(
                f,
                "instruction at address {ip} accessed negative memory address {address}"
            ),
            E::AddressOutOfRange { address, ip } => write!(
                f,
                "instruction at address {ip} wrote to address {address}, above the limit of {MAX_ADDRESS}"
            ),
            E::JumpToNegative { target, ip } => {
                write!(f, "instruction at address {ip} jumped to negative address {target}")
            }
            E::ArithmeticOverflow { ip } => {
                write!(f, "instruction at address {ip} overflowed a 64-bit integer")
            }
            E::InputExhausted { address } => write!(
                f,
                "input instruction at address {address} was reached with no input available"
            ),
            E::Poisoned => write!(f, "machine previously faulted and has not been reset"),
            E::LoggerFailed(e) => write!(f, "logger encountered an error: {e}"),
        }
    }
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoggerFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(err: io::Error) -> Self {
        Self::LoggerFailed(err)
    }
}

/// Parameter mode for Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// A parameter in relative mode evaluates to the value at the address specified by the
    /// parameter, added to the [Relative Base], which starts out as `0` but can be modified
    /// throughout the program's execution.
    ///
    /// [Relative Base]: https://adventofcode.com/2019/day/9
    #[doc(alias = "@")]
    Relative = 2,
}

impl Display for ParamMode {
    /// Writes the prefix used for this mode in disassembly
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMode::Positional => Ok(()),
            ParamMode::Immediate => write!(f, "#"),
            ParamMode::Relative => write!(f, "@"),
        }
    }
}

impl TryFrom<i64> for ParamMode {
    type Error = i64;
    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            0 => Ok(ParamMode::Positional),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(i),
        }
    }
}

/// An Intcode opcode: the last two decimal digits of an instruction
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(missing_docs, reason = "documented by their Display impls")]
pub enum OpCode {
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Lt = 7,
    Eq = 8,
    Rbo = 9,
    Halt = 99,
}

impl OpCode {
    /// How many parameters follow the opcode in memory
    pub const fn arity(self) -> u64 {
        match self {
            OpCode::Add | OpCode::Mul | OpCode::Lt | OpCode::Eq => 3,
            OpCode::Jnz | OpCode::Jz => 2,
            OpCode::In | OpCode::Out | OpCode::Rbo => 1,
            OpCode::Halt => 0,
        }
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;
    fn try_from(i: i64) -> Result<Self, i64> {
        match i {
            1 => Ok(OpCode::Add),
            2 => Ok(OpCode::Mul),
            3 => Ok(OpCode::In),
            4 => Ok(OpCode::Out),
            5 => Ok(OpCode::Jnz),
            6 => Ok(OpCode::Jz),
            7 => Ok(OpCode::Lt),
            8 => Ok(OpCode::Eq),
            9 => Ok(OpCode::Rbo),
            99 => Ok(OpCode::Halt),
            _ => Err(i),
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpCode::Add => "ADD",
            OpCode::Mul => "MUL",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::Jnz => "JNZ",
            OpCode::Jz => "JZ",
            OpCode::Lt => "LT",
            OpCode::Eq => "EQ",
            OpCode::Rbo => "RBO",
            OpCode::Halt => "HALT",
        })
    }
}

type InputSource = Box<dyn FnMut() -> Option<i64> + Send>;
type Logger = Box<dyn io::Write + Send>;

/// An Intcode machine
///
/// The machine owns its memory, instruction pointer, relative base, and input and output queues,
/// along with the [Program] it was loaded from. It is `Send`, but every method that changes it
/// takes `&mut self`, so a single machine can't be driven from two threads at once. Parallel
/// searches should give each worker its own clone.
pub struct Machine {
    program: Program,
    memory: Memory,
    index: u64,
    rel_offset: i64,
    inputs: VecDeque<i64>,
    outputs: Vec<i64>,
    input_source: Option<InputSource>,
    logger: Option<Logger>,
    trace: Option<Trace>,
    poisoned: bool,
}

impl Machine {
    /// Create a new machine. Collects `code` into the [Program] it will reset to.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self::from_program(Program::new(code))
    }

    /// Create a new machine that runs `program`
    pub fn from_program(program: Program) -> Self {
        Self {
            memory: Memory::from(program.as_slice()),
            program,
            index: 0,
            rel_offset: 0,
            inputs: VecDeque::new(),
            outputs: Vec::new(),
            input_source: None,
            logger: None,
            trace: None,
            poisoned: false,
        }
    }

    /// Queue `inputs` for the program, returning the machine
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = i64>) -> Self {
        self.extend_inputs(inputs);
        self
    }

    /// Use `source` to produce input whenever the input queue is empty, returning the machine.
    ///
    /// See [`Machine::set_input_source`]
    #[must_use]
    pub fn with_input_source(
        mut self,
        source: impl FnMut() -> Option<i64> + Send + 'static,
    ) -> Self {
        self.set_input_source(source);
        self
    }

    /// Use `source` to produce input whenever the input queue is empty.
    ///
    /// If `source` returns [`None`], the input instruction fails with
    /// [`ExecutionError::InputExhausted`]. The source is kept across [resets](Machine::reset).
    ///
    /// ```
    /// use intcomputer::prelude::*;
    /// let mut counter = 0;
    /// let mut machine = Machine::new([3, 9, 4, 9, 3, 9, 4, 9, 99]).with_input_source(move || {
    ///     counter += 1;
    ///     Some(counter * 10)
    /// });
    /// machine.execute().unwrap();
    /// assert_eq!(machine.outputs(), &[10, 20]);
    /// ```
    pub fn set_input_source(&mut self, source: impl FnMut() -> Option<i64> + Send + 'static) {
        self.input_source = Some(Box::new(source));
    }

    /// Remove any input source set with [`Machine::set_input_source`]
    pub fn clear_input_source(&mut self) {
        self.input_source = None;
    }

    /// Log each executed instruction to `logger`, one line per instruction
    pub fn log_with(&mut self, logger: impl io::Write + Send + 'static) {
        self.logger = Some(Box::new(logger));
    }

    /// Stop logging executed instructions
    pub fn stop_logging(&mut self) {
        self.logger = None;
    }

    /// Queue one input value
    pub fn push_input(&mut self, input: i64) {
        self.inputs.push_back(input);
    }

    /// Queue several input values, in order
    pub fn extend_inputs(&mut self, inputs: impl IntoIterator<Item = i64>) {
        self.inputs.extend(inputs);
    }

    /// Manually set a memory location, growing memory if needed
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::AddressOutOfRange`] if `address` is above [`MAX_ADDRESS`], the
    /// same limit that applies to writes made by the program itself. The machine is not poisoned.
    #[doc(alias("poke", "write", "mem_override"))]
    pub fn patch(&mut self, address: u64, value: i64) -> Result<(), ExecutionError> {
        let address = self.check_writable(address)?;
        self.memory[address] = value;
        Ok(())
    }

    /// Get the memory at `address`. Addresses that were never written hold `0`.
    #[doc(alias("mem_get"))]
    pub fn peek(&self, address: u64) -> i64 {
        self.memory[address]
    }

    /// All of the memory, up to the highest address that was loaded or written
    pub fn memory(&self) -> &[i64] {
        self.memory.as_slice()
    }

    /// The program the machine was loaded from, and resets to
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The current instruction pointer
    pub fn instr_ptr(&self) -> u64 {
        self.index
    }

    /// The current relative base
    pub fn rel_base(&self) -> i64 {
        self.rel_offset
    }

    /// Every value output since the machine was created or last reset
    pub fn outputs(&self) -> &[i64] {
        &self.outputs
    }

    /// Remove and return every value output so far
    pub fn take_outputs(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.outputs)
    }

    /// Inputs that have been queued but not yet consumed
    pub fn pending_inputs(&self) -> impl ExactSizeIterator<Item = i64> + '_ {
        self.inputs.iter().copied()
    }

    /// Whether the machine faulted and needs a [reset](Machine::reset) before running again
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Restore the machine to the state it was loaded in.
    ///
    /// Memory is copied back from the [Program], the instruction pointer and relative base go back
    /// to `0`, both the input and output queues are cleared, and any fault is forgotten. If a
    /// [Trace] is running, it is restarted empty. The input source and logger are kept.
    pub fn reset(&mut self) {
        self.memory.restore(&self.program);
        self.index = 0;
        self.rel_offset = 0;
        self.inputs.clear();
        self.outputs.clear();
        self.poisoned = false;
        if let Some(trace) = self.trace.as_mut() {
            trace.0.clear();
        }
    }

    /// Execute a single instruction
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] if the instruction can't be executed. Any error other than
    /// [`ExecutionError::InputExhausted`] poisons the machine, so until it is
    /// [reset](Machine::reset), all further steps return [`ExecutionError::Poisoned`].
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        if self.poisoned {
            return Err(ExecutionError::Poisoned);
        }
        let result = self.exec_instruction();
        if result.as_ref().is_err_and(|e| !e.is_recoverable()) {
            self.poisoned = true;
        }
        result
    }

    /// Execute until the program halts, returning the value at address `0`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionError`] encountered, see [`Machine::step`].
    pub fn execute(&mut self) -> Result<i64, ExecutionError> {
        while self.step()? == StepOutcome::Running {}
        Ok(self.memory[0])
    }

    /// Queue `inputs` and execute until either the program halts, or it tries to read nonexistent
    /// input.
    ///
    /// Returns `Ok((v, s))`, where `v` is a [`Vec<i64>`] containing all outputs produced during
    /// this call, and `s` is the [`State`] at the time it stopped. Outputs are also kept in
    /// [`Machine::outputs`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionError`] encountered, other than running out of input.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, State), ExecutionError> {
        self.extend_inputs(inputs);
        let first_new = self.outputs.len();
        let state = loop {
            match self.step() {
                Ok(StepOutcome::Running) => (),
                Ok(StepOutcome::Halted) => break State::Halted,
                Err(ExecutionError::InputExhausted { .. }) => break State::Awaiting,
                Err(e) => return Err(e),
            }
        };
        Ok((self.outputs[first_new..].to_vec(), state))
    }
}

impl FromStr for Machine {
    type Err = LoadError;
    fn from_str(text: &str) -> Result<Self, LoadError> {
        text.parse().map(Self::from_program)
    }
}

impl From<Program> for Machine {
    fn from(program: Program) -> Self {
        Self::from_program(program)
    }
}

/// Clones share the immutable [Program], but nothing else. The input source and logger are not
/// carried over, as they can't be cloned.
impl Clone for Machine {
    fn clone(&self) -> Self {
        Self {
            program: self.program.clone(),
            memory: self.memory.clone(),
            index: self.index,
            rel_offset: self.rel_offset,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            input_source: None,
            logger: None,
            trace: self.trace.clone(),
            poisoned: self.poisoned,
        }
    }
}

// ignore the input source, logger, and trace
impl PartialEq for Machine {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.rel_offset == other.rel_offset
            && self.poisoned == other.poisoned
            && self.memory == other.memory
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.program == other.program
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Machine")
            .field("memory", &self.memory)
            .field("rbo", &self.rel_offset)
            .field("ip", &self.index)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("poisoned", &self.poisoned)
            .field("input_source", &self.input_source.is_some())
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl Index<u64> for Machine {
    type Output = i64;

    fn index(&self, i: u64) -> &Self::Output {
        &self.memory[i]
    }
}
