use alloc::vec::Vec;

use crate::{
    Coefficients, FilterState,
    block::BlockSet,
    error::FilterError,
    particular::{feedforward, particular_solution},
    permute::{depermute, permute},
    solver::HomogeneousSolver,
};

/// Filter a sample buffer with the plain sample-by-sample recursion,
/// advancing `state` past the processed samples.
///
/// This is the scalar reference the block pipeline is checked against; the
/// streaming filters also use it for signal tails shorter than one chunk.
pub fn filter_sequential(
    samples: &[f64],
    coeffs: Coefficients,
    state: &mut FilterState,
) -> Vec<f64> {
    samples
        .iter()
        .map(|&x| {
            let y = x + coeffs.b1 * state.x1 + coeffs.b2 * state.x2
                - coeffs.a1 * state.y1
                - coeffs.a2 * state.y2;
            state.x2 = state.x1;
            state.x1 = x;
            state.y2 = state.y1;
            state.y1 = y;
            y
        })
        .collect()
}

/// Streaming single-section filter over fixed-size chunks.
///
/// Each chunk of `num_blocks · block_len` samples runs through the full block
/// pipeline: permute, feedforward, particular recursion, homogeneous
/// completion, depermute. The four history samples are carried across chunks,
/// so consecutive [`process`](Self::process) calls are equivalent to one
/// sequential pass over the concatenated input.
pub struct SosFilter {
    coeffs: Coefficients,
    state: FilterState,
    solver: HomogeneousSolver,
}

impl SosFilter {
    /// Create a filter processing chunks of `num_blocks` blocks of
    /// `block_len` samples.
    ///
    /// # Example
    ///
    /// ```rust
    /// use parfilt::{Coefficients, FilterState, SosFilter};
    ///
    /// let coeffs = Coefficients {
    ///     b1: 0.0,
    ///     b2: 0.0,
    ///     a1: -0.5,
    ///     a2: 0.1,
    /// };
    /// let mut filter = SosFilter::new(8, 4, coeffs, FilterState::default()).unwrap();
    ///
    /// let chunk = vec![1.0; filter.chunk_size()];
    /// let output = filter.process(&chunk).unwrap();
    /// assert_eq!(output.len(), chunk.len());
    /// ```
    pub fn new(
        num_blocks: usize,
        block_len: usize,
        coeffs: Coefficients,
        state: FilterState,
    ) -> Result<Self, FilterError> {
        let solver =
            HomogeneousSolver::new(num_blocks, block_len, coeffs.a1, coeffs.a2, state.y2, state.y1)?;
        Ok(Self {
            coeffs,
            state,
            solver,
        })
    }

    /// Number of samples consumed and produced per [`process`](Self::process)
    /// call.
    pub fn chunk_size(&self) -> usize {
        self.solver.num_blocks() * self.solver.block_len()
    }

    /// The input/output history as of the last processed chunk.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Restart the filter from the given history.
    pub fn reset(&mut self, state: FilterState) {
        self.state = state;
    }

    /// Filter one chunk of exactly [`chunk_size`](Self::chunk_size) samples.
    pub fn process(&mut self, chunk: &[f64]) -> Result<Vec<f64>, FilterError> {
        if chunk.len() != self.chunk_size() {
            return Err(FilterError::InputSize);
        }

        let blocks = BlockSet::from_samples(chunk.to_vec(), self.solver.block_len())?;
        let permuted = permute(&blocks);
        let fed = feedforward(
            &permuted,
            self.coeffs.b1,
            self.coeffs.b2,
            self.state.x2,
            self.state.x1,
        );
        let w = particular_solution(&fed, self.coeffs.a1, self.coeffs.a2);
        let completed = self
            .solver
            .compute_with_initial_state(&w, self.state.y2, self.state.y1)?;
        let output = depermute(&completed).into_samples();

        self.state = FilterState {
            x2: chunk[chunk.len() - 2],
            x1: chunk[chunk.len() - 1],
            y2: output[output.len() - 2],
            y1: output[output.len() - 1],
        };

        Ok(output)
    }
}

struct CascadeStage {
    coeffs: Coefficients,
    state: FilterState,
    solver: HomogeneousSolver,
}

/// Streaming cascade of second-order sections.
///
/// The whole cascade runs in the permuted domain: one permute at the head of
/// a chunk, one depermute at the tail, with every section's feedforward,
/// particular and homogeneous stages chained on the permuted blocks in
/// between. Section state is read off the trailing lanes directly, so no
/// intermediate depermutation is needed.
pub struct CascadedSosFilter {
    stages: Vec<CascadeStage>,
    num_blocks: usize,
    block_len: usize,
}

impl CascadedSosFilter {
    /// Create a cascade from per-section coefficients and initial histories,
    /// applied in order.
    pub fn new(
        num_blocks: usize,
        block_len: usize,
        sections: &[(Coefficients, FilterState)],
    ) -> Result<Self, FilterError> {
        assert!(!sections.is_empty(), "cascade needs at least one section");

        let stages = sections
            .iter()
            .map(|&(coeffs, state)| {
                let solver = HomogeneousSolver::new(
                    num_blocks, block_len, coeffs.a1, coeffs.a2, state.y2, state.y1,
                )?;
                Ok(CascadeStage {
                    coeffs,
                    state,
                    solver,
                })
            })
            .collect::<Result<Vec<_>, FilterError>>()?;

        Ok(Self {
            stages,
            num_blocks,
            block_len,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.num_blocks * self.block_len
    }

    pub fn num_sections(&self) -> usize {
        self.stages.len()
    }

    /// Filter one chunk of exactly [`chunk_size`](Self::chunk_size) samples
    /// through all sections.
    pub fn process(&mut self, chunk: &[f64]) -> Result<Vec<f64>, FilterError> {
        if chunk.len() != self.chunk_size() {
            return Err(FilterError::InputSize);
        }

        let last = self.num_blocks - 2;
        let tail_lane = self.block_len - 1;

        let mut permuted = permute(&BlockSet::from_samples(chunk.to_vec(), self.block_len)?);
        for stage in &mut self.stages {
            let fed = feedforward(
                &permuted,
                stage.coeffs.b1,
                stage.coeffs.b2,
                stage.state.x2,
                stage.state.x1,
            );
            let w = particular_solution(&fed, stage.coeffs.a1, stage.coeffs.a2);
            let completed = stage
                .solver
                .compute_with_initial_state(&w, stage.state.y2, stage.state.y1)?;

            // The chunk's last two samples in time order sit at the trailing
            // lane of the two trailing permuted blocks.
            stage.state = FilterState {
                x2: permuted.block(last)[tail_lane],
                x1: permuted.block(last + 1)[tail_lane],
                y2: completed.block(last)[tail_lane],
                y1: completed.block(last + 1)[tail_lane],
            };

            permuted = completed;
        }

        Ok(depermute(&permuted).into_samples())
    }
}
