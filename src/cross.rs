use alloc::{vec, vec::Vec};

use crate::{
    block::BlockSet,
    doubling::{DoublingTable, cross_transition},
    error::FilterError,
    solver::HomogeneousSolver,
};

/// Homogeneous solver for several independently-processed partitions of one
/// signal.
///
/// Each partition owns a contiguous run of blocks and is processed with the
/// inner [`HomogeneousSolver`]; a single extra doubling pass over the
/// per-partition transition chains them together, so no partition ever waits
/// for a sequential walk of the signal. Phases 1 and 3 of
/// [`compute`](Self::compute) touch one partition at a time with a shared
/// read-only solver and can be fanned out across threads; phase 2 is the only
/// serialization point and is `O(log2 P)` work over `P` lanes.
#[derive(Debug)]
pub struct CrossCoreSolver {
    inner: HomogeneousSolver,
    cross_table: DoublingTable,
    num_partitions: usize,
}

impl CrossCoreSolver {
    /// Create a solver for `num_partitions` partitions, each holding
    /// `num_blocks` blocks of `block_len` samples.
    ///
    /// The canonical configuration is `num_partitions == block_len`, matching
    /// one partition per vector lane; any power of two works, and a single
    /// partition degenerates to the plain block solver.
    pub fn new(
        num_blocks: usize,
        block_len: usize,
        num_partitions: usize,
        a1: f64,
        a2: f64,
        y2: f64,
        y1: f64,
    ) -> Result<Self, FilterError> {
        let inner = HomogeneousSolver::new(num_blocks, block_len, a1, a2, y2, y1)?;
        if !num_partitions.is_power_of_two() {
            return Err(FilterError::PartitionCount);
        }

        // One partition spans `block_len` lane segments, so the transition
        // chaining partition to partition is the block-length entry of the
        // alternating power sequence.
        let cross = cross_transition(block_len, inner.transition());
        let cross_table = DoublingTable::new(num_partitions, cross);

        Ok(Self {
            inner,
            cross_table,
            num_partitions,
        })
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    pub fn inner(&self) -> &HomogeneousSolver {
        &self.inner
    }

    /// Complete the particular-solution block sets of all partitions.
    ///
    /// Three phases:
    ///
    /// 1. Per partition, run the doubling rounds over the two trailing blocks
    ///    and collect the final lane pair, the partition's zero-state exit
    ///    state.
    /// 2. One doubling pass over those `P` exit-state pairs with the cross
    ///    table and the external initial states, yielding the true entry
    ///    state of every partition.
    /// 3. Per partition, fold its entry state into the pre-doubled trailing
    ///    blocks and forward-propagate as in the single-partition solver.
    pub fn compute(&self, partitions: &[BlockSet]) -> Result<Vec<BlockSet>, FilterError> {
        if partitions.len() != self.num_partitions {
            return Err(FilterError::ShapeMismatch);
        }
        let num_blocks = self.inner.num_blocks();
        let block_len = self.inner.block_len();
        if partitions
            .iter()
            .any(|w| w.num_blocks() != num_blocks || w.block_len() != block_len)
        {
            return Err(FilterError::ShapeMismatch);
        }

        let (y2, y1) = self.inner.initial_state();

        // Phase 1: zero-state doubling per partition.
        let mut exit2 = vec![0.0; self.num_partitions];
        let mut exit1 = vec![0.0; self.num_partitions];
        let mut trailing = Vec::with_capacity(self.num_partitions);
        for (partition, w) in partitions.iter().enumerate() {
            let mut v2 = w.block(num_blocks - 2).to_vec();
            let mut v1 = w.block(num_blocks - 1).to_vec();
            self.inner.doubling_table().doubling_rounds(&mut v2, &mut v1);

            exit2[partition] = v2[block_len - 1];
            exit1[partition] = v1[block_len - 1];
            trailing.push((v2, v1));
        }

        // Phase 2: chain the partitions.
        self.cross_table.doubling_rounds(&mut exit2, &mut exit1);
        self.cross_table
            .apply_initial_state(&mut exit2, &mut exit1, y2, y1);

        // Phase 3: per-partition completion with the resolved entry states.
        let mut outputs = Vec::with_capacity(self.num_partitions);
        for (partition, w) in partitions.iter().enumerate() {
            let (entry2, entry1) = if partition == 0 {
                (y2, y1)
            } else {
                (exit2[partition - 1], exit1[partition - 1])
            };

            let (mut v2, mut v1) = core::mem::take(&mut trailing[partition]);
            self.inner
                .doubling_table()
                .apply_initial_state(&mut v2, &mut v1, entry2, entry1);

            outputs.push(self.inner.forward(w, &v2, &v1, entry2, entry1));
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::{
        particular::{feedforward, particular_solution},
        permute::{depermute, permute},
    };

    const COEFFS: (f64, f64, f64, f64) = (0.5, -0.15, -0.7, 0.12);

    fn sequential_filter(
        samples: &[f64],
        (b1, b2, a1, a2): (f64, f64, f64, f64),
        (x2, x1, y2, y1): (f64, f64, f64, f64),
    ) -> Vec<f64> {
        let mut state_x = (x2, x1);
        let mut state_y = (y2, y1);
        samples
            .iter()
            .map(|&x| {
                let y = x + b1 * state_x.1 + b2 * state_x.0 - a1 * state_y.1 - a2 * state_y.0;
                state_x = (state_x.1, x);
                state_y = (state_y.1, y);
                y
            })
            .collect()
    }

    /// Split a signal into partitions and run the full cross-core pipeline.
    ///
    /// The feedforward stage only needs the raw input history, so each
    /// partition takes its input states from the tail of the previous
    /// partition's raw samples; only the output states need the cross pass.
    fn cross_core_filter(
        samples: &[f64],
        num_blocks: usize,
        block_len: usize,
        num_partitions: usize,
        (b1, b2, a1, a2): (f64, f64, f64, f64),
        (x2, x1, y2, y1): (f64, f64, f64, f64),
    ) -> Vec<f64> {
        let span = num_blocks * block_len;
        assert_eq!(samples.len(), span * num_partitions);

        let solver =
            CrossCoreSolver::new(num_blocks, block_len, num_partitions, a1, a2, y2, y1).unwrap();

        let particulars: Vec<BlockSet> = (0..num_partitions)
            .map(|partition| {
                let start = partition * span;
                let (px2, px1) = if partition == 0 {
                    (x2, x1)
                } else {
                    (samples[start - 2], samples[start - 1])
                };

                let chunk = samples[start..start + span].to_vec();
                let permuted = permute(&BlockSet::from_samples(chunk, block_len).unwrap());
                let fed = feedforward(&permuted, b1, b2, px2, px1);
                particular_solution(&fed, a1, a2)
            })
            .collect();

        let outputs = solver.compute(&particulars).unwrap();

        let mut result = Vec::with_capacity(samples.len());
        for output in &outputs {
            result.extend_from_slice(depermute(output).samples());
        }
        result
    }

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len());
        for (index, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
            let scale = e.abs().max(1.0);
            assert!(
                (g - e).abs() <= 1e-9 * scale,
                "sample {index}: got {g}, expected {e}",
            );
        }
    }

    #[test]
    fn partitions_match_sequential_filter() {
        let num_blocks = 8;
        let block_len = 4;
        let num_partitions = block_len;
        let state = (0.2, -0.4, 0.9, -0.1);

        let samples: Vec<f64> = (0..num_blocks * block_len * num_partitions)
            .map(|_| rand_aes::tls::rand_f64() - 0.5)
            .collect();

        let got = cross_core_filter(
            &samples,
            num_blocks,
            block_len,
            num_partitions,
            COEFFS,
            state,
        );
        let expected = sequential_filter(&samples, COEFFS, state);
        assert_close(&got, &expected);
    }

    #[test]
    fn partitions_match_single_partition_solver() {
        // The partitioned result must agree with one solver run over the
        // whole signal, not just with the sequential oracle.
        let num_blocks = 16;
        let block_len = 4;
        let num_partitions = 4;
        let state = (0.0, 0.0, 0.35, -0.6);
        let (b1, b2, a1, a2) = COEFFS;

        let total = num_blocks * block_len * num_partitions;
        let samples: Vec<f64> = (0..total).map(|_| rand_aes::tls::rand_f64() - 0.5).collect();

        let partitioned = cross_core_filter(
            &samples,
            num_blocks,
            block_len,
            num_partitions,
            COEFFS,
            state,
        );

        let whole = {
            let permuted = permute(&BlockSet::from_samples(samples.clone(), block_len).unwrap());
            let fed = feedforward(&permuted, b1, b2, state.0, state.1);
            let w = particular_solution(&fed, a1, a2);
            let solver = HomogeneousSolver::new(
                num_blocks * num_partitions,
                block_len,
                a1,
                a2,
                state.2,
                state.3,
            )
            .unwrap();
            depermute(&solver.compute(&w).unwrap()).into_samples()
        };

        assert_close(&partitioned, &whole);
    }

    #[test]
    fn single_partition_degenerates_to_block_solver() {
        let num_blocks = 8;
        let block_len = 8;
        let state = (0.1, 0.2, 0.3, 0.4);
        let (b1, b2, a1, a2) = COEFFS;

        let samples: Vec<f64> = (0..num_blocks * block_len)
            .map(|_| rand_aes::tls::rand_f64())
            .collect();

        let partitioned =
            cross_core_filter(&samples, num_blocks, block_len, 1, COEFFS, state);

        let single = {
            let permuted = permute(&BlockSet::from_samples(samples.clone(), block_len).unwrap());
            let fed = feedforward(&permuted, b1, b2, state.0, state.1);
            let w = particular_solution(&fed, a1, a2);
            let solver =
                HomogeneousSolver::new(num_blocks, block_len, a1, a2, state.2, state.3).unwrap();
            depermute(&solver.compute(&w).unwrap()).into_samples()
        };

        assert_close(&partitioned, &single);
    }

    #[test]
    fn rejects_wrong_partition_count() {
        assert_eq!(
            CrossCoreSolver::new(8, 4, 3, 0.0, 0.0, 0.0, 0.0).unwrap_err(),
            FilterError::PartitionCount,
        );

        let solver = CrossCoreSolver::new(8, 4, 4, 0.0, 0.0, 0.0, 0.0).unwrap();
        let partitions = alloc::vec![BlockSet::zeros(8, 4); 2];
        assert_eq!(
            solver.compute(&partitions).unwrap_err(),
            FilterError::ShapeMismatch,
        );
    }
}
