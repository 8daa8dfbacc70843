use std::fmt;
use std::sync::Arc;

use chess_core::{Accumulator, Evaluator, Network, Position};

/// Scores positions with a shared NNUE network.
#[derive(Clone)]
pub struct NeuralEvaluator {
    network: Arc<Network>,
}

impl NeuralEvaluator {
    pub fn new(network: Network) -> Self {
        Self::from_shared(Arc::new(network))
    }

    pub fn from_shared(network: Arc<Network>) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    fn tracks(&self, pos: &Position) -> bool {
        pos.network().is_some_and(|n| Arc::ptr_eq(n, &self.network))
    }
}

impl Evaluator for NeuralEvaluator {
    fn evaluate(&self, pos: &Position) -> i32 {
        let side = pos.side_to_move();
        match pos.accumulator() {
            Some(acc) if self.tracks(pos) => self.network.evaluate(acc, side),
            _ => {
                let acc = Accumulator::from_position(&self.network, pos);
                self.network.evaluate(&acc, side)
            }
        }
    }

    /// Attach the network so make/undo keep the accumulator current.
    fn prepare(&self, pos: &mut Position) {
        if !self.tracks(pos) {
            pos.attach_network(Arc::clone(&self.network));
        }
    }

    fn name(&self) -> &str {
        "nnue"
    }
}

impl fmt::Debug for NeuralEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeuralEvaluator").finish_non_exhaustive()
    }
}
