pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("no graph declaration or edges found; expected e.g. `graph TD` followed by `A --> B`")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerializationError {
    #[error("edge references node `{id}` which has no position")]
    UnplacedNode { id: String },

    #[error("position of node `{id}` does not fit in the drawing area; reduce sizes or spacing")]
    GeometryOverflow { id: String },

    #[error("failed to write diagram: {0}")]
    Write(String),

    #[error("malformed diagram payload: {0}")]
    Payload(String),
}
