use thiserror::Error;

/// Engine errors surfaced to the hosting service.
///
/// Challenge variants are client-input failures (a 4xx once they cross the
/// HTTP boundary); `InvalidCatalog` is raised once, at load time.
#[derive(Debug, Error)]
pub enum GamifyError {
    #[error("unknown challenge: {0}")]
    ChallengeNotFound(String),

    #[error("challenge '{0}' is outside its active window")]
    ChallengeInactive(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}
