/// Errors the block-filtering entry points can return.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterError {
    /// Block length is not a power of two.
    BlockLength,
    /// Block count is not a multiple of the block length.
    BlockCount,
    /// Fewer than two blocks in the block set.
    NotEnoughBlocks,
    /// Input length does not match the configured chunk size.
    InputSize,
    /// Block set shape does not match the solver configuration.
    ShapeMismatch,
    /// Partition count is not a power of two.
    PartitionCount,
}

impl core::fmt::Display for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BlockLength => "Block length is not a power of two".fmt(f),
            Self::BlockCount => "Block count is not a multiple of the block length".fmt(f),
            Self::NotEnoughBlocks => "Fewer than two blocks in the block set".fmt(f),
            Self::InputSize => "Input length does not match the configured chunk size".fmt(f),
            Self::ShapeMismatch => "Block set shape does not match the solver configuration".fmt(f),
            Self::PartitionCount => "Partition count is not a power of two".fmt(f),
        }
    }
}

impl core::fmt::Debug for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self, f)
    }
}

#[cfg(not(feature = "no_std"))]
impl std::error::Error for FilterError {}
