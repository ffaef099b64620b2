//! Sample permutation across blocks for lane-parallel filtering.
//!
//! `permute` interleaves the samples of `N` blocks of power-of-two length `L`
//! in `log2(L)` rounds so that block `n` ends up holding the samples whose
//! index is congruent to `n` modulo `N`. In that layout the time-predecessor
//! of every sample of block `n` sits at the same lane of block `n - 1`, which
//! is what lets the solver stages work on whole blocks. `depermute` is the
//! exact inverse, but is not the permutation run backwards: its round-0 pass
//! regroups whole blocks while the later rounds regroup within
//! already-restored partitions, so the two use different block-index
//! arithmetic.

use alloc::vec;

use crate::block::BlockSet;

/// Permute the samples of a block set into the lane-parallel layout.
///
/// Runs `log2(L)` rounds. Each round pairs block `n` with block `n + N/2`,
/// splits both into `2·stride` chunks and gathers the chunk tops into the new
/// block `2n` and the chunk bottoms into the new block `2n + 1`, with
/// `stride = L / 2^(round+1)`.
pub fn permute(blocks: &BlockSet) -> BlockSet {
    let num_blocks = blocks.num_blocks();
    let block_len = blocks.block_len();
    let rounds = block_len.trailing_zeros();

    let mut src = blocks.samples().to_vec();
    let mut dst = vec![0.0; src.len()];

    for round in 0..rounds {
        let stride = block_len >> (round + 1);

        for n in 0..num_blocks / 2 {
            let top = n * block_len;
            let bottom = (n + num_blocks / 2) * block_len;
            let even = 2 * n * block_len;
            let odd = (2 * n + 1) * block_len;

            for chunk in (0..block_len).step_by(2 * stride) {
                dst[even + chunk..even + chunk + stride]
                    .copy_from_slice(&src[top + chunk..top + chunk + stride]);
                dst[even + chunk + stride..even + chunk + 2 * stride]
                    .copy_from_slice(&src[bottom + chunk..bottom + chunk + stride]);
                dst[odd + chunk..odd + chunk + stride]
                    .copy_from_slice(&src[top + chunk + stride..top + chunk + 2 * stride]);
                dst[odd + chunk + stride..odd + chunk + 2 * stride]
                    .copy_from_slice(&src[bottom + chunk + stride..bottom + chunk + 2 * stride]);
            }
        }

        core::mem::swap(&mut src, &mut dst);
    }

    BlockSet::from_samples(src, block_len).expect("shape preserved by permutation")
}

/// Restore a permuted block set to signal-time order.
///
/// Exact inverse of [`permute`] for every valid shape.
pub fn depermute(blocks: &BlockSet) -> BlockSet {
    let num_blocks = blocks.num_blocks();
    let block_len = blocks.block_len();
    let rounds = block_len.trailing_zeros();

    let mut src = blocks.samples().to_vec();
    let mut dst = vec![0.0; src.len()];

    for round in 0..rounds {
        let stride = block_len >> (round + 1);

        // Round 0 regroups whole blocks; later rounds regroup within the
        // partitions the earlier rounds have already restored.
        let (groups, runs) = if round == 0 {
            (block_len / 2, num_blocks / block_len)
        } else {
            (1 << round, num_blocks >> (round + 1))
        };

        for k in 0..groups {
            for n in 0..runs {
                let (top_src, bottom_src, top_dst, bottom_dst) = if round == 0 {
                    (
                        k + n * 2 * groups,
                        k + groups + n * 2 * groups,
                        n + k * runs,
                        n + num_blocks / 2 + k * runs,
                    )
                } else {
                    (
                        n + k * 2 * runs,
                        n + runs + k * 2 * runs,
                        n + k * 2 * runs,
                        n + runs + k * 2 * runs,
                    )
                };

                let ts = top_src * block_len;
                let bs = bottom_src * block_len;
                let td = top_dst * block_len;
                let bd = bottom_dst * block_len;

                for chunk in (0..block_len).step_by(2 * stride) {
                    dst[td + chunk..td + chunk + stride]
                        .copy_from_slice(&src[ts + chunk..ts + chunk + stride]);
                    dst[td + chunk + stride..td + chunk + 2 * stride]
                        .copy_from_slice(&src[bs + chunk..bs + chunk + stride]);
                    dst[bd + chunk..bd + chunk + stride]
                        .copy_from_slice(&src[ts + chunk + stride..ts + chunk + 2 * stride]);
                    dst[bd + chunk + stride..bd + chunk + 2 * stride]
                        .copy_from_slice(&src[bs + chunk + stride..bs + chunk + 2 * stride]);
                }
            }
        }

        core::mem::swap(&mut src, &mut dst);
    }

    BlockSet::from_samples(src, block_len).expect("shape preserved by permutation")
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    fn ramp(num_blocks: usize, block_len: usize) -> BlockSet {
        let samples: Vec<f64> = (0..num_blocks * block_len).map(|i| i as f64).collect();
        BlockSet::from_samples(samples, block_len).unwrap()
    }

    /// The permuted layout has a closed form: block `n`, lane `j` holds
    /// sample `n + j·N`. Both index formulas are checked against it.
    fn verify_interleave(permuted: &BlockSet) {
        let num_blocks = permuted.num_blocks();
        for n in 0..num_blocks {
            for (j, &value) in permuted.block(n).iter().enumerate() {
                assert_eq!(
                    value,
                    (n + j * num_blocks) as f64,
                    "block {n}, lane {j}: got {value}",
                );
            }
        }
    }

    #[test]
    fn permute_interleaves_modulo_block_count() {
        for (num_blocks, block_len) in [(2, 2), (4, 4), (8, 4), (16, 4), (8, 8), (64, 8)] {
            verify_interleave(&permute(&ramp(num_blocks, block_len)));
        }
    }

    #[test]
    fn permute_worked_example() {
        // N = 8, L = 4: the first permuted blocks are [0, 8, 16, 24] and
        // [1, 9, 17, 25].
        let permuted = permute(&ramp(8, 4));
        assert_eq!(permuted.block(0), &[0.0, 8.0, 16.0, 24.0]);
        assert_eq!(permuted.block(1), &[1.0, 9.0, 17.0, 25.0]);
        assert_eq!(permuted.block(7), &[7.0, 15.0, 23.0, 31.0]);
    }

    #[test]
    fn depermute_inverts_permute() {
        for (num_blocks, block_len) in [(2, 2), (4, 2), (4, 4), (8, 4), (16, 4), (32, 8)] {
            let blocks = ramp(num_blocks, block_len);
            let restored = depermute(&permute(&blocks));
            assert_eq!(restored.samples(), blocks.samples());
        }
    }

    #[test]
    fn permute_inverts_depermute() {
        for (num_blocks, block_len) in [(4, 4), (8, 4), (16, 4), (32, 8)] {
            let blocks = ramp(num_blocks, block_len);
            let restored = permute(&depermute(&blocks));
            assert_eq!(restored.samples(), blocks.samples());
        }
    }

    #[test]
    fn round_trip_random_values() {
        let num_blocks = 16;
        let block_len = 4;
        let samples: Vec<f64> = (0..num_blocks * block_len)
            .map(|_| rand_aes::tls::rand_f64())
            .collect();
        let blocks = BlockSet::from_samples(samples, block_len).unwrap();

        let restored = depermute(&permute(&blocks));
        assert_eq!(restored.samples(), blocks.samples());
    }

    #[test]
    fn unit_block_len_is_identity() {
        let samples = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        let blocks = BlockSet::from_samples(samples.clone(), 1).unwrap();
        assert_eq!(permute(&blocks).samples(), samples.as_slice());
        assert_eq!(depermute(&blocks).samples(), samples.as_slice());
    }
}
