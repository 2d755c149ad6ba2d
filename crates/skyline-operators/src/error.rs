use std::fmt;

use skyline_core::schema::DataType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpError>;

/// Which input of the nested loop a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSide {
    Outer,
    Inner,
}

impl fmt::Display for ScanSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSide::Outer => f.write_str("outer"),
            ScanSide::Inner => f.write_str("inner"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OpError {
    /// Relation create/open/scan/insert/delete failure.
    #[error("storage fault: {0}")]
    Storage(#[from] skyline_heap::Error),

    #[error("type mismatch on attribute {index}: {left:?} vs {right:?}")]
    TypeMismatch {
        index: usize,
        left: DataType,
        right: DataType,
    },

    /// A fault raised while producing output; the operator is done.
    #[error("query execution fault in {side} scan: {source}")]
    Execution {
        side: ScanSide,
        #[source]
        source: Box<OpError>,
    },

    /// Every failure seen while closing, in teardown order.
    #[error("teardown fault: {}", join_errors(.0))]
    Teardown(Vec<OpError>),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl OpError {
    pub fn execution(side: ScanSide, source: OpError) -> Self {
        OpError::Execution {
            side,
            source: Box::new(source),
        }
    }

    /// Side of the nested loop for execution faults.
    pub fn side(&self) -> Option<ScanSide> {
        match self {
            OpError::Execution { side, .. } => Some(*side),
            _ => None,
        }
    }
}

impl From<skyline_core::Error> for OpError {
    fn from(e: skyline_core::Error) -> Self {
        match e {
            skyline_core::Error::Schema(msg) => OpError::Schema(msg),
            other => OpError::Config(other.to_string()),
        }
    }
}

fn join_errors(errors: &[OpError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_display_names_the_side() {
        let e = OpError::execution(
            ScanSide::Inner,
            OpError::Storage(skyline_heap::Error::Storage("disk gone".into())),
        );
        assert_eq!(e.side(), Some(ScanSide::Inner));
        assert_eq!(
            e.to_string(),
            "query execution fault in inner scan: storage fault: storage error: disk gone"
        );
    }

    #[test]
    fn teardown_lists_every_error() {
        let e = OpError::Teardown(vec![
            OpError::Config("a".into()),
            OpError::Schema("b".into()),
        ]);
        assert_eq!(
            e.to_string(),
            "teardown fault: configuration error: a; schema error: b"
        );
    }
}
