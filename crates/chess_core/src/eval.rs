use crate::board::Position;

/// Static evaluation, in centipawns from the side to move's point of view.
///
/// Search treats the evaluator as a black box: a positive score means the
/// side to move is better off.
pub trait Evaluator: Send {
    fn evaluate(&self, pos: &Position) -> i32;

    /// Called once on the search's private copy of the position before the
    /// search starts. Evaluators that track incremental state attach it here.
    fn prepare(&self, _pos: &mut Position) {}

    fn name(&self) -> &str;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, pos: &Position) -> i32 {
        (**self).evaluate(pos)
    }

    fn prepare(&self, pos: &mut Position) {
        (**self).prepare(pos)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
