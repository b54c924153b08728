//! Conversion pipeline status
//!
//! Tensors, operators, the graph and the model all move through the same
//! ordered states. Skipping or repeating a state is a programming error.

use std::fmt;

/// Pipeline state, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    /// Created, nothing read yet
    #[default]
    Initialized,
    /// Source record read and validated
    Parsed,
    /// Transposes inserted around layout-sensitive edges
    GraphBuilt,
    /// Layout tags final
    Propagated,
    /// ONNX output produced
    Converted,
}

impl Status {
    /// The state after this one, if any
    pub fn next(self) -> Option<Status> {
        match self {
            Status::Initialized => Some(Status::Parsed),
            Status::Parsed => Some(Status::GraphBuilt),
            Status::GraphBuilt => Some(Status::Propagated),
            Status::Propagated => Some(Status::Converted),
            Status::Converted => None,
        }
    }

    /// Move to `to`, which must be the immediate successor.
    ///
    /// # Panics
    ///
    /// Panics on any other transition.
    pub fn advance(&mut self, to: Status) {
        assert_eq!(
            self.next(),
            Some(to),
            "invalid status transition {} -> {}",
            self,
            to
        );
        *self = to;
    }

    /// Panic unless the current state is `expected`
    pub fn require(self, expected: Status) {
        assert_eq!(self, expected, "expected status {}, found {}", expected, self);
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Initialized => "INITIALIZED",
            Status::Parsed => "PARSED",
            Status::GraphBuilt => "GRAPH_BUILT",
            Status::Propagated => "PROPAGATED",
            Status::Converted => "CONVERTED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut s = Status::default();
        s.advance(Status::Parsed);
        s.advance(Status::GraphBuilt);
        s.advance(Status::Propagated);
        s.advance(Status::Converted);
        assert_eq!(s, Status::Converted);
        assert_eq!(s.next(), None);
    }

    #[test]
    #[should_panic(expected = "invalid status transition")]
    fn test_skip_panics() {
        let mut s = Status::Parsed;
        s.advance(Status::Propagated);
    }

    #[test]
    #[should_panic(expected = "invalid status transition")]
    fn test_repeat_panics() {
        let mut s = Status::Parsed;
        s.advance(Status::Parsed);
    }

    #[test]
    fn test_ordering() {
        assert!(Status::Initialized < Status::Converted);
        Status::GraphBuilt.require(Status::GraphBuilt);
    }
}
