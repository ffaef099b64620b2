//! The non-recursive (particular) stages of the block pipeline.
//!
//! Both operate on the permuted block layout, where block `n - 1` holds the
//! time-predecessor of every sample of block `n`, so the feedforward taps and
//! the particular recursion are whole-block arithmetic with no lane shifts.

use alloc::vec;

use crate::block::BlockSet;

/// Apply the feedforward (numerator) taps to a permuted block set.
///
/// Produces `x[n] + b1·x[n-1] + b2·x[n-2]` for every sample, pulling the
/// predecessors of the first two blocks from the one-lane-shifted trailing
/// blocks and from the external input history `(x2, x1)`.
pub fn feedforward(x: &BlockSet, b1: f64, b2: f64, x2: f64, x1: f64) -> BlockSet {
    let num_blocks = x.num_blocks();
    let block_len = x.block_len();
    assert!(num_blocks >= 2, "feedforward needs at least two blocks");

    let mut out = BlockSet::zeros(num_blocks, block_len);

    // Lane j of block 0 is sample j·N, whose predecessors are the lane-shifted
    // trailing blocks (sample j·N − 1 lives at lane j − 1 of block N − 1).
    let mut prev1 = vec![0.0; block_len];
    let mut prev2 = vec![0.0; block_len];
    prev1[0] = x1;
    prev2[0] = x2;
    prev1[1..].copy_from_slice(&x.block(num_blocks - 1)[..block_len - 1]);
    prev2[1..].copy_from_slice(&x.block(num_blocks - 2)[..block_len - 1]);

    for lane in 0..block_len {
        out.block_mut(0)[lane] = x.block(0)[lane] + b1 * prev1[lane] + b2 * prev2[lane];
    }
    for lane in 0..block_len {
        out.block_mut(1)[lane] = x.block(1)[lane] + b1 * x.block(0)[lane] + b2 * prev1[lane];
    }
    for block in 2..num_blocks {
        for lane in 0..block_len {
            out.block_mut(block)[lane] = x.block(block)[lane]
                + b1 * x.block(block - 1)[lane]
                + b2 * x.block(block - 2)[lane];
        }
    }

    out
}

/// Run the feedback recursion block-granularly over the feedforwarded set,
/// with zero initial state per lane.
///
/// Each lane of the result holds the particular solution of its own
/// `N`-sample segment; the homogeneous solver later corrects every segment
/// for the state it inherits from its predecessor.
pub fn particular_solution(bx: &BlockSet, a1: f64, a2: f64) -> BlockSet {
    let num_blocks = bx.num_blocks();
    let block_len = bx.block_len();

    let mut out = bx.clone();
    let data = out.samples_mut();

    if num_blocks > 1 {
        for lane in 0..block_len {
            data[block_len + lane] -= a1 * data[lane];
        }
    }
    for block in 2..num_blocks {
        let base = block * block_len;
        for lane in 0..block_len {
            data[base + lane] -=
                a1 * data[base - block_len + lane] + a2 * data[base - 2 * block_len + lane];
        }
    }

    out
}
