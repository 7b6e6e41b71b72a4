//! Error types

/// Errors produced by basis construction, transforms and solvers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument is out of range or inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The ε-rank of the fine kernel matrix exceeds the caller's cap.
    #[error("rank overflow: discovered rank {rank} exceeds cap {max_rank}")]
    RankOverflow { rank: usize, max_rank: usize },

    /// A dense or diagonal linear solve hit an exactly singular system.
    /// Should not occur for a well-formed basis; indicates numerical
    /// pathology in the caller's data.
    #[error("singular system in {0}")]
    SingularSystem(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
