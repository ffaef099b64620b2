use alloc::{vec, vec::Vec};

use crate::error::FilterError;

/// An ordered set of equal-length sample blocks stored contiguously.
///
/// A block set represents `N·L` consecutive samples of a signal as `N` blocks
/// of `L` samples each, where `L` is a power of two matching a target vector
/// width and `N` is a multiple of `L`. Block order is signal-time order,
/// except after [`permute`](crate::permute), where block `n` holds the
/// samples whose index is congruent to `n` modulo `N`.
#[derive(Clone, PartialEq)]
pub struct BlockSet {
    data: Vec<f64>,
    block_len: usize,
}

impl BlockSet {
    /// Wrap a sample buffer as a block set of `block_len`-sized blocks.
    ///
    /// Fails if `block_len` is not a power of two or if the buffer does not
    /// split into a block count that is a multiple of `block_len`.
    pub fn from_samples(samples: Vec<f64>, block_len: usize) -> Result<Self, FilterError> {
        if !block_len.is_power_of_two() {
            return Err(FilterError::BlockLength);
        }
        if !samples.len().is_multiple_of(block_len * block_len) {
            return Err(FilterError::BlockCount);
        }
        Ok(Self {
            data: samples,
            block_len,
        })
    }

    /// A zero-filled block set of the given shape.
    pub(crate) fn zeros(num_blocks: usize, block_len: usize) -> Self {
        Self {
            data: vec![0.0; num_blocks * block_len],
            block_len,
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.data.len() / self.block_len
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// The `n`-th block as a sample slice.
    pub fn block(&self, n: usize) -> &[f64] {
        &self.data[n * self.block_len..(n + 1) * self.block_len]
    }

    pub(crate) fn block_mut(&mut self, n: usize) -> &mut [f64] {
        &mut self.data[n * self.block_len..(n + 1) * self.block_len]
    }

    /// All samples in block order.
    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the block set and return the underlying sample buffer.
    pub fn into_samples(self) -> Vec<f64> {
        self.data
    }
}

impl core::fmt::Debug for BlockSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockSet")
            .field("num_blocks", &self.num_blocks())
            .field("block_len", &self.block_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn rejects_non_power_of_two_block_len() {
        let result = BlockSet::from_samples(vec![0.0; 18], 3);
        assert_eq!(result.unwrap_err(), FilterError::BlockLength);
    }

    #[test]
    fn rejects_block_count_not_multiple_of_block_len() {
        // 24 samples of block length 4 give 6 blocks, not a multiple of 4.
        let result = BlockSet::from_samples(vec![0.0; 24], 4);
        assert_eq!(result.unwrap_err(), FilterError::BlockCount);
    }

    #[test]
    fn block_access() {
        let samples: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let blocks = BlockSet::from_samples(samples, 4).unwrap();

        assert_eq!(blocks.num_blocks(), 8);
        assert_eq!(blocks.block_len(), 4);
        assert_eq!(blocks.block(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(blocks.block(7), &[28.0, 29.0, 30.0, 31.0]);
    }

    #[test]
    fn trivial_block_len_is_valid() {
        let blocks = BlockSet::from_samples(vec![0.0; 5], 1).unwrap();
        assert_eq!(blocks.num_blocks(), 5);
    }
}
