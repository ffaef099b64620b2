use alloc::{vec, vec::Vec};

use crate::{
    block::BlockSet,
    doubling::{DoublingTable, Transition, transition_from_impulse},
    error::FilterError,
    impulse::impulse_response,
};

/// Homogeneous solver for one block-set shape and one filter configuration.
///
/// Holds the feedback coefficients, the external output history, the
/// impulse-response table over the block count and the recursive-doubling
/// table over the block length. All tables are computed once at construction
/// and never mutated, so one solver can be shared read-only across threads.
///
/// [`compute`](Self::compute) turns a particular-solution block set (the
/// output of [`particular_solution`](crate::particular_solution) on permuted
/// blocks) into the final filter output, still in the permuted layout. The
/// two trailing blocks must be resolved first via recursive doubling: every
/// other block is then a single multiply-subtract against their lane-shifted
/// copies, which is what [`forward`](Self::forward) computes.
#[derive(Debug)]
pub struct HomogeneousSolver {
    y2: f64,
    y1: f64,
    h2: Vec<f64>,
    h1: Vec<f64>,
    table: DoublingTable,
    num_blocks: usize,
    block_len: usize,
}

impl HomogeneousSolver {
    /// Create a solver for `num_blocks` blocks of `block_len` samples.
    ///
    /// `a1`/`a2` are the feedback coefficients of the recursion
    /// `y[n] = x[n] + b1·x[n-1] + b2·x[n-2] − a1·y[n-1] − a2·y[n-2]`;
    /// `y2`/`y1` the two output samples preceding the block set.
    pub fn new(
        num_blocks: usize,
        block_len: usize,
        a1: f64,
        a2: f64,
        y2: f64,
        y1: f64,
    ) -> Result<Self, FilterError> {
        if !block_len.is_power_of_two() {
            return Err(FilterError::BlockLength);
        }
        if !num_blocks.is_multiple_of(block_len) {
            return Err(FilterError::BlockCount);
        }
        if num_blocks < 2 {
            return Err(FilterError::NotEnoughBlocks);
        }

        let (h2, h1) = impulse_response(num_blocks, a2, a1);
        let table = DoublingTable::new(block_len, transition_from_impulse(&h2, &h1));

        Ok(Self {
            y2,
            y1,
            h2,
            h1,
            table,
            num_blocks,
            block_len,
        })
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub(crate) fn doubling_table(&self) -> &DoublingTable {
        &self.table
    }

    pub(crate) fn initial_state(&self) -> (f64, f64) {
        (self.y2, self.y1)
    }

    /// The transition advancing the state pair across the whole block set.
    pub(crate) fn transition(&self) -> Transition {
        transition_from_impulse(&self.h2, &self.h1)
    }

    /// Complete a particular-solution block set using the initial state given
    /// at construction.
    pub fn compute(&self, w: &BlockSet) -> Result<BlockSet, FilterError> {
        self.compute_with_initial_state(w, self.y2, self.y1)
    }

    /// Complete a particular-solution block set with an explicit output
    /// history, for callers that carry evolving state across chunks or
    /// partitions.
    pub fn compute_with_initial_state(
        &self,
        w: &BlockSet,
        y2: f64,
        y1: f64,
    ) -> Result<BlockSet, FilterError> {
        if w.num_blocks() != self.num_blocks || w.block_len() != self.block_len {
            return Err(FilterError::ShapeMismatch);
        }

        let mut v2 = w.block(self.num_blocks - 2).to_vec();
        let mut v1 = w.block(self.num_blocks - 1).to_vec();
        self.table.doubling_rounds(&mut v2, &mut v1);
        self.table.apply_initial_state(&mut v2, &mut v1, y2, y1);

        Ok(self.forward(w, &v2, &v1, y2, y1))
    }

    /// Propagate the two corrected trailing blocks to every other block via
    /// the impulse response.
    pub(crate) fn forward(
        &self,
        w: &BlockSet,
        yv2: &[f64],
        yv1: &[f64],
        y2: f64,
        y1: f64,
    ) -> BlockSet {
        let num_blocks = self.num_blocks;
        let block_len = self.block_len;

        // Lane j of block n needs the state of its segment, which is the
        // corrected trailing pair of lane j − 1 (the external history for
        // lane 0).
        let mut prev2 = vec![0.0; block_len];
        let mut prev1 = vec![0.0; block_len];
        prev2[0] = y2;
        prev1[0] = y1;
        prev2[1..].copy_from_slice(&yv2[..block_len - 1]);
        prev1[1..].copy_from_slice(&yv1[..block_len - 1]);

        let mut out = BlockSet::zeros(num_blocks, block_len);
        for block in 0..num_blocks - 2 {
            let sens2 = self.h2[block];
            let sens1 = self.h1[block];
            for lane in 0..block_len {
                out.block_mut(block)[lane] =
                    w.block(block)[lane] - sens2 * prev2[lane] - sens1 * prev1[lane];
            }
        }
        out.block_mut(num_blocks - 2).copy_from_slice(yv2);
        out.block_mut(num_blocks - 1).copy_from_slice(yv1);

        out
    }
}
