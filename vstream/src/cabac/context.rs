//! Adaptive probability contexts.

use std::ops::{Index, IndexMut};

/// The adaptive state of a single context.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextState {
    /// Probability state index, from 0 (near equiprobable) to 63.
    pub state: u8,

    /// Value of the most probable symbol.
    pub mps: bool,
}

/// An `(m, n)` initialization seed for one context.
///
/// The seed turns into a starting state through the slice quantizer, as in
/// H.264 clause 9.3.1.1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContextInit {
    pub m: i16,
    pub n: i16,
}

impl ContextInit {
    pub const fn new(m: i16, n: i16) -> Self {
        Self { m, n }
    }

    /// The starting state of the context for a given slice QP.
    pub fn state(self, slice_qp: i32) -> ContextState {
        let qp = slice_qp.clamp(0, 51);
        let pre = (((i32::from(self.m) * qp) >> 4) + i32::from(self.n)).clamp(1, 126);

        if pre <= 63 {
            ContextState {
                state: (63 - pre) as u8,
                mps: false,
            }
        } else {
            ContextState {
                state: (pre - 64) as u8,
                mps: true,
            }
        }
    }
}

/// All of the contexts used by one arithmetic coder, indexed by `ctxIdx`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextBank {
    contexts: Vec<ContextState>,
}

impl ContextBank {
    /// Number of contexts defined by H.264.
    pub const H264_LEN: usize = 1024;

    /// A bank of `len` contexts, all in state 0 with a zero MPS.
    pub fn new(len: usize) -> Self {
        Self {
            contexts: vec![ContextState::default(); len],
        }
    }

    /// A bank sized for H.264 and seeded for the given slice QP.
    ///
    /// Contexts beyond the end of `seeds` keep the default state.
    pub fn h264(seeds: &[ContextInit], slice_qp: i32) -> Self {
        let mut bank = Self::new(Self::H264_LEN);
        bank.init(seeds, slice_qp);
        bank
    }

    /// Reset the leading contexts from their seeds.
    pub fn init(&mut self, seeds: &[ContextInit], slice_qp: i32) {
        for (context, seed) in self.contexts.iter_mut().zip(seeds.iter()) {
            *context = seed.state(slice_qp);
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn get(&self, ctx_idx: usize) -> Option<&ContextState> {
        self.contexts.get(ctx_idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextState> {
        self.contexts.iter()
    }
}

impl Index<usize> for ContextBank {
    type Output = ContextState;

    fn index(&self, ctx_idx: usize) -> &ContextState {
        &self.contexts[ctx_idx]
    }
}

impl IndexMut<usize> for ContextBank {
    fn index_mut(&mut self, ctx_idx: usize) -> &mut ContextState {
        &mut self.contexts[ctx_idx]
    }
}

#[cfg(test)]
mod tests {
    use crate::cabac::{ContextBank, ContextInit, ContextState};

    #[test]
    fn seeds_map_through_slice_qp() {
        // mb_type I, ctxIdx 3..5.
        assert_eq!(
            ContextState { state: 46, mps: false },
            ContextInit::new(20, -15).state(26)
        );
        assert_eq!(ContextState { state: 6, mps: false }, ContextInit::new(2, 54).state(26));
        assert_eq!(ContextState { state: 0, mps: true }, ContextInit::new(0, 64).state(26));
        assert_eq!(ContextState { state: 0, mps: false }, ContextInit::new(0, 63).state(26));

        // The pre-state is clipped to 1..=126 and the QP to 0..=51.
        assert_eq!(ContextState { state: 62, mps: false }, ContextInit::new(0, -40).state(0));
        assert_eq!(ContextState { state: 62, mps: true }, ContextInit::new(0, 127).state(0));
        assert_eq!(
            ContextInit::new(-28, 127).state(51),
            ContextInit::new(-28, 127).state(80)
        );
    }

    #[test]
    fn bank_init_seeds_leading_contexts() {
        let seeds = [ContextInit::new(0, 100), ContextInit::new(0, 10)];
        let bank = ContextBank::h264(&seeds, 30);

        assert_eq!(ContextBank::H264_LEN, bank.len());
        assert_eq!(ContextState { state: 36, mps: true }, bank[0]);
        assert_eq!(ContextState { state: 53, mps: false }, bank[1]);
        assert_eq!(ContextState::default(), bank[2]);
    }
}
