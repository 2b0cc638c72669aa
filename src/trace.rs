// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Recording the instructions a [Machine] executes
//!
//! See [`Machine::start_trace`] for an example.
use std::fmt::{self, Debug, Display};

use super::{Machine, OpCode, ParamMode};

#[derive(Clone, Copy, PartialEq, Eq)]
struct PackedModes(u8);
impl PackedModes {
    const fn pack(modes: [ParamMode; 3]) -> Self {
        Self(modes[0] as u8 | ((modes[1] as u8) << 2) | ((modes[2] as u8) << 4))
    }
    const fn unpack(self) -> [ParamMode; 3] {
        const fn unpack_bit_pair(bit_pair: u8) -> ParamMode {
            match bit_pair {
                0b00 => ParamMode::Positional,
                0b01 => ParamMode::Immediate,
                _ => ParamMode::Relative,
            }
        }
        [
            unpack_bit_pair(self.0 & 0b11),
            unpack_bit_pair((self.0 & 0b1100) >> 2),
            unpack_bit_pair((self.0 & 0b11_0000) >> 4),
        ]
    }
}

/// A parameter of a traced instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// The parameter as it appeared in memory
    pub raw: i64,
    /// What the parameter resolved to. For destinations, this is the value that was stored.
    pub value: i64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TracedOp {
    Add(Param, Param, Param),
    Mul(Param, Param, Param),
    In(Param),
    Out(Param),
    Jnz(Param, Param),
    Jz(Param, Param),
    Lt(Param, Param, Param),
    Eq(Param, Param, Param),
    Rbo(Param),
    Halt,
}

#[derive(Clone, PartialEq, Eq)]
/// An opaque type containing information about what instruction was executed, which can be queried
/// with its various methods, or converted into a [String] using its [Display] impl.
pub struct TracedInstr {
    op: TracedOp,
    op_int: i64,
    instr_ptr: u64,
    rel_base: i64,
    packed_modes: PackedModes,
    opcode: OpCode,
}

impl TracedInstr {
    /// Return the relative base at the time the traced instruction was executed
    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    /// Return the instruction pointer's position when the traced instruction was executed
    pub fn instr_ptr(&self) -> u64 {
        self.instr_ptr
    }

    /// Return the actual integer of the traced instruction
    pub fn op_int(&self) -> i64 {
        self.op_int
    }

    /// Return the opcode of the traced instruction
    pub fn op_code(&self) -> OpCode {
        self.opcode
    }

    /// If the instruction stored a value, return that value
    pub fn stored_val(&self) -> Option<i64> {
        match self.op {
            TracedOp::Add(_, _, dest)
            | TracedOp::Mul(_, _, dest)
            | TracedOp::Lt(_, _, dest)
            | TracedOp::Eq(_, _, dest)
            | TracedOp::In(dest) => Some(dest.value),
            _ => None,
        }
    }

    /// Return the parameters of the traced instruction
    pub fn params(&self) -> Vec<Param> {
        match self.op {
            TracedOp::Add(a, b, c)
            | TracedOp::Mul(a, b, c)
            | TracedOp::Lt(a, b, c)
            | TracedOp::Eq(a, b, c) => vec![a, b, c],
            TracedOp::Jnz(a, b) | TracedOp::Jz(a, b) => vec![a, b],
            TracedOp::In(a) | TracedOp::Out(a) | TracedOp::Rbo(a) => vec![a],
            TracedOp::Halt => vec![],
        }
    }

    /// Return an array of the parameter modes of the traced instruction
    pub fn param_modes(&self) -> [ParamMode; 3] {
        self.packed_modes.unpack()
    }

    /// `params` must hold exactly as many entries as `opcode` takes parameters
    pub(crate) fn build(
        op_int: i64,
        opcode: OpCode,
        modes: [ParamMode; 3],
        instr_ptr: u64,
        rel_base: i64,
        params: &[Param],
    ) -> Self {
        macro_rules! op {
            {$id: ident(_, _, _)} => {{
                debug_assert_eq!(params.len(), 3);
                TracedOp::$id(params[0], params[1], params[2])
            }};
            {$id: ident(_, _)} => {{
                debug_assert_eq!(params.len(), 2);
                TracedOp::$id(params[0], params[1])
            }};
            {$id: ident(_)} => {{
                debug_assert_eq!(params.len(), 1);
                TracedOp::$id(params[0])
            }};
            {$id: ident} => {{
                debug_assert_eq!(params.len(), 0);
                TracedOp::$id
            }}
        }

        let op = match opcode {
            OpCode::Add => op! { Add(_, _, _) },
            OpCode::Mul => op! { Mul(_, _, _) },
            OpCode::In => op! { In(_) },
            OpCode::Out => op! { Out(_) },
            OpCode::Jnz => op! { Jnz(_, _) },
            OpCode::Jz => op! { Jz(_, _) },
            OpCode::Lt => op! { Lt(_, _, _) },
            OpCode::Eq => op! { Eq(_, _, _) },
            OpCode::Rbo => op! { Rbo(_) },
            OpCode::Halt => op! { Halt },
        };
        Self {
            op,
            op_int,
            instr_ptr,
            rel_base,
            packed_modes: PackedModes::pack(modes),
            opcode,
        }
    }
}

impl Machine {
    /// Begin a [Trace] of executed instructions. If a trace is already running, this replaces that
    /// trace and returns it in a [`Some`], otherwise, it returns [`None`].
    ///
    /// # Example
    /// ```
    /// use intcomputer::prelude::*;
    /// let mut machine = Machine::new([1101, 90, 9, 0, 99]);
    /// machine.start_trace();
    /// assert_eq!(machine.execute().unwrap(), 99);
    ///
    /// let trace = machine.end_trace().unwrap();
    /// assert_eq!(trace.0.len(), 2);
    /// assert_eq!(trace.0[0].stored_val(), Some(99));
    /// assert_eq!(
    ///     trace.0[0].to_string(),
    ///     "ran instruction at 0000: op int 1101  | [ADD #90 (resolves to 90), #9 (resolves to 9), 0 (stored 99)]"
    /// );
    /// ```
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.trace.replace(Trace::default())
    }

    /// Stop tracing executed instructions into a [Trace]. If no trace was active, returns [`None`]
    ///
    /// see [`Machine::start_trace`]
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Get a view of the current trace
    pub fn show_trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// A log of instructions that a [Machine] has executed since a call to [`Machine::start_trace`]
///
/// see [`Machine::start_trace`]
pub struct Trace(pub Vec<TracedInstr>);

impl Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.0 {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}

impl Debug for TracedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! arg {
            ($arg: ident) => {
                format_args!("{} => {}", $arg.raw, $arg.value)
            };
        }
        macro_rules! variant {
            ($name: literal, ($($arg: ident),*)) => {
                f.debug_tuple($name)
                $(.field(&arg!($arg) ))*
                .finish()
            }
        }
        match self {
            Self::Add(a0, a1, a2) => variant!("Add", (a0, a1, a2)),
            Self::Mul(a0, a1, a2) => variant!("Mul", (a0, a1, a2)),
            Self::In(a0) => variant!("In", (a0)),
            Self::Out(a0) => variant!("Out", (a0)),
            Self::Jnz(a0, a1) => variant!("Jnz", (a0, a1)),
            Self::Jz(a0, a1) => variant!("Jz", (a0, a1)),
            Self::Lt(a0, a1, a2) => variant!("Lt", (a0, a1, a2)),
            Self::Eq(a0, a1, a2) => variant!("Eq", (a0, a1, a2)),
            Self::Rbo(a0) => variant!("Rbo", (a0)),
            Self::Halt => write!(f, "Halt"),
        }
    }
}

impl Debug for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedInstr")
            .field("op", &self.op)
            .field("op_int", &self.op_int)
            .field("instr_ptr", &self.instr_ptr)
            .field("rel_base", &self.rel_base)
            .field("modes", &self.packed_modes.unpack())
            .field("opcode", &self.opcode)
            .finish()
    }
}

impl Display for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ran instruction at {:0>4}: op int {: <5} | ",
            self.instr_ptr, self.op_int
        )?;
        let [m0, m1, m2] = self.packed_modes.unpack();
        let opcode = self.opcode;

        match self.op {
            TracedOp::Add(a, b, dest)
            | TracedOp::Mul(a, b, dest)
            | TracedOp::Lt(a, b, dest)
            | TracedOp::Eq(a, b, dest) => write!(
                f,
                "[{opcode} {m0}{} (resolves to {}), {m1}{} (resolves to {}), {m2}{} (stored {})]",
                a.raw, a.value, b.raw, b.value, dest.raw, dest.value
            ),
            TracedOp::Jnz(cond, dest) | TracedOp::Jz(cond, dest) => {
                let jumped = (cond.value != 0) == (opcode == OpCode::Jnz);
                write!(
                    f,
                    "[{opcode} {m0}{} (resolves to {}), {m1}{} ({} to {})]",
                    cond.raw,
                    cond.value,
                    dest.raw,
                    if jumped { "jumped" } else { "didn't jump" },
                    dest.value
                )
            }
            TracedOp::In(p) => write!(f, "[{opcode} {m0}{} (stored {})]", p.raw, p.value),
            TracedOp::Out(p) => write!(f, "[{opcode} {m0}{} (resolves to {})]", p.raw, p.value),
            TracedOp::Rbo(p) => write!(
                f,
                "[{opcode} {m0}{} (resolves to {}) (went from {} to {})]",
                p.raw,
                p.value,
                self.rel_base,
                self.rel_base.wrapping_add(p.value),
            ),
            TracedOp::Halt => write!(f, "[{opcode}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_mode_packing() {
        const MODES: [ParamMode; 3] = [
            ParamMode::Positional,
            ParamMode::Immediate,
            ParamMode::Relative,
        ];

        for a in MODES {
            for b in MODES {
                for c in MODES {
                    assert_eq!(PackedModes::pack([a, b, c]).unpack(), [a, b, c]);
                }
            }
        }
    }

    #[test]
    fn jumps_display_whether_taken() {
        // JZ #0, #3 ; HALT ; JNZ #0, #0 ; HALT
        let mut machine = Machine::new([1106, 0, 3, 1105, 0, 0, 99]);
        machine.start_trace();
        machine.execute().unwrap();
        let lines = machine.end_trace().unwrap().to_string();
        let lines: Vec<&str> = lines.lines().collect();
        assert_eq!(
            lines,
            [
                "ran instruction at 0000: op int 1106  | [JZ #0 (resolves to 0), #3 (jumped to 3)]",
                "ran instruction at 0003: op int 1105  | [JNZ #0 (resolves to 0), #0 (didn't jump to 0)]",
                "ran instruction at 0006: op int 99    | [HALT]",
            ]
        );
    }

    #[test]
    fn rbo_display() {
        let mut machine = Machine::new([109, 19, 2201, 0, 1, 2, 99]);
        machine.start_trace();
        machine.execute().unwrap();
        let Trace(trace) = machine.end_trace().unwrap();
        assert_eq!(
            trace[0].to_string(),
            "ran instruction at 0000: op int 109   | [RBO #19 (resolves to 19) (went from 0 to 19)]"
        );
        assert_eq!(trace[1].rel_base(), 19);
        assert_eq!(
            trace[1].params(),
            vec![
                Param { raw: 0, value: 0 },
                Param { raw: 1, value: 0 },
                Param { raw: 2, value: 0 },
            ]
        );
    }

    #[test]
    fn reset_restarts_trace() {
        let mut machine = Machine::new([1, 0, 0, 0, 99]);
        machine.start_trace();
        machine.execute().unwrap();
        assert_eq!(machine.show_trace().map(|t| t.0.len()), Some(2));
        machine.reset();
        assert_eq!(machine.show_trace(), Some(&Trace::default()));
    }
}
