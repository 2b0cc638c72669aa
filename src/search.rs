// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use std::ops::RangeInclusive;

use itertools::iproduct;

use super::{ExecutionError, Machine};

/// Address of the noun, as defined by [Day 2](https://adventofcode.com/2019/day/2)
pub const NOUN_ADDRESS: u64 = 1;
/// Address of the verb, as defined by [Day 2](https://adventofcode.com/2019/day/2)
pub const VERB_ADDRESS: u64 = 2;

impl Machine {
    /// Patch the noun and verb into addresses 1 and 2
    ///
    /// # Errors
    ///
    /// Never fails in practice, as both addresses are far below [`MAX_ADDRESS`](crate::MAX_ADDRESS),
    /// but passes on any error from [`Machine::patch`].
    pub fn set_noun_verb(&mut self, noun: i64, verb: i64) -> Result<(), ExecutionError> {
        self.patch(NOUN_ADDRESS, noun)?;
        self.patch(VERB_ADDRESS, verb)
    }

    /// Search for the noun and verb that make the program halt with `target` at address `0`.
    ///
    /// Every combination of values in `candidates` is tried, nouns in the outer loop, with the
    /// machine [reset](Machine::reset) before each trial. Trials that fault are skipped.
    ///
    /// The machine is left in the state the matching trial finished in, or that of the last trial
    /// if none matched.
    ///
    /// # Example
    ///
    /// ```
    /// use intcomputer::prelude::*;
    /// // mem[0] = mem[1] * mem[2]
    /// let mut machine = Machine::new([1102, 0, 0, 0, 99]);
    /// assert_eq!(machine.find_noun_verb(9409, 0..=99), Some((97, 97)));
    /// assert_eq!(machine.find_noun_verb(97, 2..=96), None);
    /// ```
    pub fn find_noun_verb(
        &mut self,
        target: i64,
        candidates: RangeInclusive<i64>,
    ) -> Option<(i64, i64)> {
        iproduct!(candidates.clone(), candidates).find(|&(noun, verb)| {
            self.reset();
            self.set_noun_verb(noun, verb)
                .and_then(|()| self.execute())
                .is_ok_and(|result| result == target)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noun_verb_patch_addresses() {
        let mut machine = Machine::new([1, 0, 0, 0, 99]);
        machine.set_noun_verb(4, 4).unwrap();
        assert_eq!(machine.memory(), &[1, 4, 4, 0, 99]);
        assert_eq!(machine.execute(), Ok(198));
    }

    #[test]
    fn faulting_trials_skipped() {
        // position-mode reads from the noun and verb, so negative candidates fault
        let mut machine = Machine::new([1, 0, 0, 0, 99]);
        assert_eq!(machine.find_noun_verb(2, -3..=0), Some((0, 0)));

        machine.reset();
        machine.set_noun_verb(-3, 0).unwrap();
        assert_eq!(
            machine.execute(),
            Err(ExecutionError::NegativeAddress { address: -3, ip: 0 })
        );
    }
}
