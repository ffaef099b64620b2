//! Recursive-doubling multiplier tables.
//!
//! Once the particular pass is done, the remaining work per block pair is the
//! two-state recursion `Y[j] = X[j] − C·Y[j-1]` over the `L` lanes of a block,
//! where `C` is a 2×2 state-transition matrix and `Y[-1]` holds the two
//! external initial states. Walking that recursion lane by lane costs `L`
//! dependent steps; the tables below let [`DoublingTable::doubling_rounds`]
//! replace it with `log2(L)` whole-vector multiply-subtract rounds.

use alloc::vec::Vec;

/// 2×2 state-transition matrix of the homogeneous recursion, row-major.
pub type Transition = [[f64; 2]; 2];

/// The transition matrix advancing the two trailing states across a whole
/// block set, taken from the last two entries of the impulse response.
pub fn transition_from_impulse(h2: &[f64], h1: &[f64]) -> Transition {
    let len = h2.len();
    assert!(len >= 2, "impulse response must cover at least two samples");
    assert_eq!(len, h1.len(), "impulse response columns differ in length");

    [[h2[len - 2], h1[len - 2]], [h2[len - 1], h1[len - 1]]]
}

/// `-(a · b)`, the step of the alternating power sequence.
fn negated_product(a: &Transition, b: &Transition) -> Transition {
    let mut out = [[0.0; 2]; 2];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, value) in out_row.iter_mut().enumerate() {
            *value = -(a[row][0] * b[0][col] + a[row][1] * b[1][col]);
        }
    }
    out
}

/// The sequence `(-1)^k · C^(k+1)` for `k` in `0..count`.
///
/// These are the effective transitions of the doubled recursion: propagating
/// the state pair `k + 1` lanes forward through `Y[j] = X[j] − C·Y[j-1]`
/// multiplies the initial pair by `(-1)^k · C^(k+1)`.
fn alternating_powers(count: usize, c: Transition) -> Vec<Transition> {
    let mut powers = Vec::with_capacity(count);
    powers.push(c);
    for k in 1..count {
        powers.push(negated_product(&c, &powers[k - 1]));
    }
    powers
}

/// The transition chaining one whole partition to the next: the final entry
/// of the alternating power sequence over `block_len` lanes.
///
/// Feeding this back into [`DoublingTable::new`] yields the table for the
/// cross-partition doubling pass.
pub fn cross_transition(block_len: usize, c: Transition) -> Transition {
    assert!(
        block_len.is_power_of_two(),
        "block length must be a power of two"
    );
    *alternating_powers(block_len, c)
        .last()
        .expect("power sequence is never empty")
}

/// Per-round, per-lane multipliers for one doubling round.
///
/// `v2`/`v1` hold the coefficients subtracted from the −2 and −1 state slots;
/// each is a pair of lane vectors applied to the shuffled copies of the two
/// slots.
#[derive(Clone, PartialEq, Debug)]
struct RoundMultipliers {
    v2: [Vec<f64>; 2],
    v1: [Vec<f64>; 2],
}

/// Precomputed multiplier vectors driving the recursive-doubling rounds for
/// one block length and one transition matrix.
///
/// Round 0 holds the direct per-lane coefficients combining a block pair with
/// the two scalar initial states; rounds `1..=log2(L)` hold the coefficients
/// of the doubling passes, laid out as `2^(round-1)` leading zeros followed
/// by that many power-sequence entries, repeated across the vector.
#[derive(Clone, PartialEq, Debug)]
pub struct DoublingTable {
    block_len: usize,
    rounds: Vec<RoundMultipliers>,
}

impl DoublingTable {
    /// Build the table for `block_len` lanes from the transition matrix `c`.
    ///
    /// Pure function of its inputs; `block_len` must be a power of two.
    pub fn new(block_len: usize, c: Transition) -> Self {
        assert!(
            block_len.is_power_of_two(),
            "block length must be a power of two"
        );

        let powers = alternating_powers(block_len, c);
        let num_rounds = block_len.trailing_zeros() as usize;
        let mut rounds = Vec::with_capacity(num_rounds + 1);

        let lane_vector = |row: usize, col: usize| -> Vec<f64> {
            powers.iter().map(|power| power[row][col]).collect()
        };
        rounds.push(RoundMultipliers {
            v2: [lane_vector(0, 0), lane_vector(0, 1)],
            v1: [lane_vector(1, 0), lane_vector(1, 1)],
        });

        for round in 1..=num_rounds {
            let zeros = 1 << (round - 1);
            let patterned = |row: usize, col: usize| -> Vec<f64> {
                let mut lanes = Vec::with_capacity(block_len);
                for _ in 0..block_len / (2 * zeros) {
                    lanes.extend(core::iter::repeat_n(0.0, zeros));
                    lanes.extend(powers[..zeros].iter().map(|power| power[row][col]));
                }
                lanes
            };
            rounds.push(RoundMultipliers {
                v2: [patterned(0, 0), patterned(0, 1)],
                v1: [patterned(1, 0), patterned(1, 1)],
            });
        }

        Self { block_len, rounds }
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Run the `log2(L)` doubling rounds over one pair of lane vectors in
    /// place, resolving the lane-to-lane dependencies that involve only the
    /// inputs.
    ///
    /// Each round broadcasts the last lane of the first half of every
    /// `2K`-lane segment across the second half and multiply-subtracts it
    /// with the round's lane coefficients, `K` doubling per round. After the
    /// final round, lane `j` holds `Y[j]` of the recursion
    /// `Y[j] = X[j] − C·Y[j-1]` evaluated with zero initial state.
    pub fn doubling_rounds(&self, v2: &mut [f64], v1: &mut [f64]) {
        assert_eq!(v2.len(), self.block_len, "lane vector length mismatch");
        assert_eq!(v1.len(), self.block_len, "lane vector length mismatch");

        for (round, multipliers) in self.rounds.iter().enumerate().skip(1) {
            let half = 1 << (round - 1);

            for segment in 0..self.block_len / (2 * half) {
                let base = segment * 2 * half;
                let carry2 = v2[base + half - 1];
                let carry1 = v1[base + half - 1];

                for lane in base + half..base + 2 * half {
                    v2[lane] -=
                        multipliers.v2[0][lane] * carry2 + multipliers.v2[1][lane] * carry1;
                    v1[lane] -=
                        multipliers.v1[0][lane] * carry2 + multipliers.v1[1][lane] * carry1;
                }
            }
        }
    }

    /// Fold the two scalar initial states into a pre-doubled pair of lane
    /// vectors, completing the recursion.
    pub fn apply_initial_state(&self, v2: &mut [f64], v1: &mut [f64], y2: f64, y1: f64) {
        assert_eq!(v2.len(), self.block_len, "lane vector length mismatch");
        assert_eq!(v1.len(), self.block_len, "lane vector length mismatch");

        let direct = &self.rounds[0];
        for lane in 0..self.block_len {
            v2[lane] -= direct.v2[0][lane] * y2 + direct.v2[1][lane] * y1;
            v1[lane] -= direct.v1[0][lane] * y2 + direct.v1[1][lane] * y1;
        }
    }
}
