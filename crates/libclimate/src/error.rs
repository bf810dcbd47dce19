use climate_clasp::ParseError;

/// Errors returned by [`crate::Climate::init`] and [`crate::Climate::parse`].
///
/// Validation failures and [`crate::Climate::abort`] are not errors: they
/// write a diagnostic and invoke the exit strategy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("initialisation failed: {0:#}")]
    Init(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to write to output stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("values constraint must have 0, 1 or 2 elements, got {0}")]
    InvalidConstraint(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
