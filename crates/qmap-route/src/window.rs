//! Bounded read-ahead over the upstream operation stream.

use std::collections::VecDeque;

use qmap_ir::{VirtualOperation, VirtualQubit};

use crate::error::RouteResult;
use crate::stream::OperationSource;

/// Fixed-capacity queue of not-yet-routed operations.
///
/// The front of the queue is the next operation to route; up to `capacity`
/// operations behind it form the lookahead the router uses as a tie-break.
/// The window only pulls from upstream when it is below `capacity + 1`
/// entries, and stops pulling for good once upstream reports end-of-stream.
#[derive(Debug, Clone)]
pub struct LookaheadWindow {
    buffer: VecDeque<VirtualOperation>,
    capacity: usize,
    exhausted: bool,
}

impl LookaheadWindow {
    /// Create an empty window showing `capacity` upcoming operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity + 1),
            capacity,
            exhausted: false,
        }
    }

    /// Create a window that starts with operations already pulled from
    /// upstream (the placement prefix).
    pub fn primed(capacity: usize, prefix: Vec<VirtualOperation>, exhausted: bool) -> Self {
        Self {
            buffer: prefix.into(),
            capacity,
            exhausted,
        }
    }

    /// Take the next operation to route, refilling from `source` first.
    ///
    /// Returns `None` once upstream is exhausted and the buffer is drained.
    pub fn advance<S: OperationSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> RouteResult<Option<VirtualOperation>> {
        self.refill(source)?;
        Ok(self.buffer.pop_front())
    }

    fn refill<S: OperationSource + ?Sized>(&mut self, source: &mut S) -> RouteResult<()> {
        while !self.exhausted && self.buffer.len() <= self.capacity {
            match source.pull()? {
                Some(op) => self.buffer.push_back(op),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// Upcoming operations, nearest first, at most `capacity` of them.
    pub fn upcoming(&self) -> impl Iterator<Item = &VirtualOperation> + '_ {
        self.buffer.iter().take(self.capacity)
    }

    /// Operand pairs of the upcoming two-qubit gates, nearest first.
    ///
    /// The second element is the position in the window, used to weight
    /// nearer operations more heavily.
    pub fn upcoming_pairs(&self) -> impl Iterator<Item = (usize, VirtualQubit, VirtualQubit)> + '_ {
        self.upcoming()
            .enumerate()
            .filter_map(|(k, op)| op.qubit_pair().map(|(&a, &b)| (k, a, b)))
    }

    /// Number of upcoming operations shown to the router.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of operations currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether upstream has signalled end-of-stream.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
