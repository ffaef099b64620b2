//! Block-parallel evaluation of second-order recursive (IIR) filters.
//!
//! The output of a recursive filter depends on its own previous outputs,
//! which makes the recursion inherently sequential. This crate breaks that
//! dependency into a bounded number of whole-vector rounds: the signal is
//! split into power-of-two-length blocks, permuted into a lane-parallel
//! layout, run through a non-recursive feedforward pass and a block-granular
//! particular recursion, and completed by a recursive-doubling homogeneous
//! solver in `O(log2 L)` rounds per block pair. The result matches the
//! sample-by-sample recursion to numeric rounding.

#![cfg_attr(feature = "no_std", no_std)]

extern crate alloc;

mod block;
mod cross;
mod doubling;
mod error;
mod filter;
mod impulse;
mod particular;
mod permute;
mod solver;

pub use block::BlockSet;
pub use cross::CrossCoreSolver;
pub use doubling::{DoublingTable, Transition, cross_transition, transition_from_impulse};
pub use error::FilterError;
pub use filter::{CascadedSosFilter, SosFilter, filter_sequential};
pub use impulse::impulse_response;
pub use particular::{feedforward, particular_solution};
pub use permute::{depermute, permute};
pub use solver::HomogeneousSolver;

/// Coefficients of one second-order section, defining the recursion
/// `y[n] = x[n] + b1·x[n-1] + b2·x[n-2] − a1·y[n-1] − a2·y[n-2]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coefficients {
    /// Feedforward tap on `x[n-1]`.
    pub b1: f64,
    /// Feedforward tap on `x[n-2]`.
    pub b2: f64,
    /// Feedback tap on `y[n-1]`.
    pub a1: f64,
    /// Feedback tap on `y[n-2]`.
    pub a2: f64,
}

/// The four history samples feeding a section at the start of a buffer: the
/// two inputs and the two outputs preceding the first sample.
///
/// Defaults to all zeros, a filter at rest.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FilterState {
    /// Input history `x[-2]`.
    pub x2: f64,
    /// Input history `x[-1]`.
    pub x1: f64,
    /// Output history `y[-2]`.
    pub y2: f64,
    /// Output history `y[-1]`.
    pub y1: f64,
}
