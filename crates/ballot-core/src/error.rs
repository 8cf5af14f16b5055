use ballot_store::StoreError;
use ballot_types::PollId;

/// Errors produced by Ballot operations.
///
/// Every error is surfaced to the caller; none is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum BallotError {
    /// Malformed or missing input that the caller can correct.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("email already registered: {0}")]
    DuplicateUser(String),

    /// Unknown email or wrong password. Which one is never revealed.
    #[error("invalid email or password")]
    Authentication,

    #[error("poll not found: {0}")]
    PollNotFound(PollId),

    #[error("{voter} has already voted in poll {poll}")]
    AlreadyVoted { poll: PollId, voter: String },

    #[error("{option:?} is not an option of poll {poll}")]
    InvalidOption { poll: PollId, option: String },

    /// The requester does not own the poll.
    #[error("{requester} is not the owner of poll {poll}")]
    Unauthorized { poll: PollId, requester: String },

    #[error("could not generate a unique poll id: {0}")]
    IdGeneration(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// I/O or serialization fault. The in-memory state is left unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl BallotError {
    /// Stable snake-case tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateUser(_) => "duplicate_user",
            Self::Authentication => "authentication",
            Self::PollNotFound(_) => "not_found",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::InvalidOption { .. } => "invalid_option",
            Self::Unauthorized { .. } => "authorization",
            Self::IdGeneration(_) => "id_generation",
            Self::PasswordHash(_) => "internal",
            Self::Storage(_) => "storage",
        }
    }
}

/// Result alias for Ballot operations.
pub type Result<T> = std::result::Result<T, BallotError>;
