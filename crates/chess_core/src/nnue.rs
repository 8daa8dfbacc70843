//! Quantised NNUE network and its incrementally updated accumulator.
//!
//! Topology: 768 one-hot inputs (relative color × kind × square) feed a
//! 64-unit hidden layer evaluated from both perspectives; the two hidden
//! vectors pass a clipped ReLU into a single output.
//!
//! Weight file layout (little-endian `i16`, in order):
//!
//! | block            | shape     |
//! |------------------|-----------|
//! | feature weights  | 768 × 64  |
//! | feature bias     | 64        |
//! | output weights   | 2 × 64    |
//! | output bias      | 1         |

use std::fs;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::board::Position;
use crate::types::{Color, Piece, Square};

pub const INPUT_SIZE: usize = 768;
pub const HIDDEN_SIZE: usize = 64;
/// Hidden-layer activation ceiling.
pub const QA: i32 = 255;
/// Output weight quantisation.
pub const QB: i32 = 64;
pub const EVAL_SCALE: i32 = 400;

const WEIGHT_COUNT: usize = INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to read network weights from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("network weights truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("{name} has shape {actual:?}, expected {expected:?}")]
    Shape {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Owned row-major matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn zeroed(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap a row-major buffer; `None` if its length is not `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline(always)]
    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (r, c): (usize, usize)) -> &T {
        assert!(c < self.cols, "column {c} out of range");
        &self.data[r * self.cols + c]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        assert!(c < self.cols, "column {c} out of range");
        &mut self.data[r * self.cols + c]
    }
}

/// Input index of `piece` on `sq` seen from `perspective`.
///
/// The perspective's own pieces occupy the first 384 inputs; the black
/// perspective sees the board mirrored vertically.
#[inline(always)]
pub fn feature_index(piece: Piece, sq: Square, perspective: Color) -> usize {
    let relative = usize::from(piece.color != perspective);
    let sq = match perspective {
        Color::White => sq,
        Color::Black => sq ^ 56,
    };
    64 * (6 * relative + piece.kind.idx()) + sq as usize
}

#[inline(always)]
fn crelu(x: i32) -> i64 {
    i64::from(x.clamp(0, QA))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    feature_weights: Matrix<i16>,
    feature_bias: Vec<i16>,
    output_weights: Matrix<i16>,
    output_bias: i16,
}

impl Network {
    /// Size of a serialized network in bytes.
    pub const BYTE_LEN: usize = 2 * WEIGHT_COUNT;

    /// A network with every weight zero; evaluates every position as 0.
    pub fn zeroed() -> Self {
        Self {
            feature_weights: Matrix::zeroed(INPUT_SIZE, HIDDEN_SIZE),
            feature_bias: vec![0; HIDDEN_SIZE],
            output_weights: Matrix::zeroed(2, HIDDEN_SIZE),
            output_bias: 0,
        }
    }

    pub fn from_parts(
        feature_weights: Matrix<i16>,
        feature_bias: Vec<i16>,
        output_weights: Matrix<i16>,
        output_bias: i16,
    ) -> Result<Self, NetworkError> {
        check_shape("feature weights", feature_weights.shape(), (INPUT_SIZE, HIDDEN_SIZE))?;
        check_shape("feature bias", (1, feature_bias.len()), (1, HIDDEN_SIZE))?;
        check_shape("output weights", output_weights.shape(), (2, HIDDEN_SIZE))?;
        Ok(Self {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        })
    }

    /// Decode the weight-file layout. Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        if bytes.len() < Self::BYTE_LEN {
            return Err(NetworkError::Truncated {
                expected: Self::BYTE_LEN,
                actual: bytes.len(),
            });
        }
        let mut values = bytes[..Self::BYTE_LEN]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]));
        let mut take = |n: usize| -> Vec<i16> { values.by_ref().take(n).collect() };

        let feature_weights = take(INPUT_SIZE * HIDDEN_SIZE);
        let feature_bias = take(HIDDEN_SIZE);
        let output_weights = take(2 * HIDDEN_SIZE);
        let output_bias = take(1)[0];

        Ok(Self {
            feature_weights: Matrix {
                data: feature_weights,
                rows: INPUT_SIZE,
                cols: HIDDEN_SIZE,
            },
            feature_bias,
            output_weights: Matrix {
                data: output_weights,
                rows: 2,
                cols: HIDDEN_SIZE,
            },
            output_bias,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| NetworkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let network = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "loaded NNUE weights");
        Ok(network)
    }

    /// Encode in the weight-file layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::BYTE_LEN);
        let values = self
            .feature_weights
            .as_slice()
            .iter()
            .chain(&self.feature_bias)
            .chain(self.output_weights.as_slice())
            .chain(std::iter::once(&self.output_bias));
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), NetworkError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()).map_err(|source| NetworkError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn feature_bias(&self) -> &[i16] {
        &self.feature_bias
    }

    /// Score in centipawns for `side`, given both perspectives' hidden sums.
    pub fn evaluate(&self, acc: &Accumulator, side: Color) -> i32 {
        let us = &acc.values[side.idx()];
        let them = &acc.values[side.other().idx()];
        let w_us = self.output_weights.row(0);
        let w_them = self.output_weights.row(1);

        let mut sum = i64::from(self.output_bias);
        for i in 0..HIDDEN_SIZE {
            sum += crelu(us[i]) * i64::from(w_us[i]);
            sum += crelu(them[i]) * i64::from(w_them[i]);
        }
        (sum * i64::from(EVAL_SCALE) / i64::from(QA * QB)) as i32
    }
}

fn check_shape(
    name: &'static str,
    actual: (usize, usize),
    expected: (usize, usize),
) -> Result<(), NetworkError> {
    if actual == expected {
        Ok(())
    } else {
        Err(NetworkError::Shape {
            name,
            expected,
            actual,
        })
    }
}

/// Hidden-layer sums for both perspectives, indexed by `Color::idx`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accumulator {
    values: [[i32; HIDDEN_SIZE]; 2],
}

impl Accumulator {
    /// Empty board: just the bias.
    pub fn new(network: &Network) -> Self {
        let mut bias = [0i32; HIDDEN_SIZE];
        for (b, &w) in bias.iter_mut().zip(&network.feature_bias) {
            *b = i32::from(w);
        }
        Self {
            values: [bias; 2],
        }
    }

    /// Full recomputation from the pieces on the board.
    pub fn from_position(network: &Network, pos: &Position) -> Self {
        let mut acc = Self::new(network);
        for sq in pos.occupied() {
            if let Some(piece) = pos.piece_at(sq) {
                acc.add(network, piece, sq);
            }
        }
        acc
    }

    pub fn add(&mut self, network: &Network, piece: Piece, sq: Square) {
        for color in Color::ALL {
            let row = network.feature_weights.row(feature_index(piece, sq, color));
            for (v, &w) in self.values[color.idx()].iter_mut().zip(row) {
                *v += i32::from(w);
            }
        }
    }

    pub fn remove(&mut self, network: &Network, piece: Piece, sq: Square) {
        for color in Color::ALL {
            let row = network.feature_weights.row(feature_index(piece, sq, color));
            for (v, &w) in self.values[color.idx()].iter_mut().zip(row) {
                *v -= i32::from(w);
            }
        }
    }

    pub fn values(&self, perspective: Color) -> &[i32; HIDDEN_SIZE] {
        &self.values[perspective.idx()]
    }
}

/// One accumulator per ply, owned by the position it tracks.
#[derive(Clone, Debug)]
pub(crate) struct AccumulatorStack {
    network: Arc<Network>,
    stack: Vec<Accumulator>,
}

impl AccumulatorStack {
    pub(crate) fn new(network: Arc<Network>, pos: &Position) -> Self {
        let root = Accumulator::from_position(&network, pos);
        let mut stack = Vec::with_capacity(128);
        stack.push(root);
        Self { network, stack }
    }

    pub(crate) fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub(crate) fn current(&self) -> &Accumulator {
        &self.stack[self.stack.len() - 1]
    }

    #[inline]
    pub(crate) fn push(&mut self) {
        let top = self.current().clone();
        self.stack.push(top);
    }

    /// Drop the current ply. Returns false when already at the ply the
    /// stack was built on, in which case the caller must rebuild it.
    #[inline]
    pub(crate) fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    #[inline]
    pub(crate) fn add(&mut self, piece: Piece, sq: Square) {
        let last = self.stack.len() - 1;
        self.stack[last].add(&self.network, piece, sq);
    }

    #[inline]
    pub(crate) fn remove(&mut self, piece: Piece, sq: Square) {
        let last = self.stack.len() - 1;
        self.stack[last].remove(&self.network, piece, sq);
    }
}

#[cfg(test)]
#[path = "nnue_tests.rs"]
mod nnue_tests;
