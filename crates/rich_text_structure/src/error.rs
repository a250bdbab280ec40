use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("offset {offset} is out of range for a text of {len} characters")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("line {line} is out of range for a value of {lines} lines")]
    LineOutOfRange { line: usize, lines: usize },

    #[error("single-line and multiline values or selections cannot be mixed")]
    ShapeMismatch,

    #[error("no offsets given and the selection is unset")]
    MissingSelection,

    #[error("{given} format slots given for {expected} inserted characters")]
    FormatCountMismatch { given: usize, expected: usize },
}

pub type StructureResult<T> = Result<T, StructureError>;
