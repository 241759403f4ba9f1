use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter needs at least one coefficient")]
    EmptyFilter,

    #[error("Insufficient storage: need {needed} slots, have {available}")]
    InsufficientStorage { needed: usize, available: usize },

    #[error("Insufficient coefficients: need {needed}, have {available}")]
    InsufficientCoefficients { needed: usize, available: usize },

    #[error("Feedback coefficients not normalized: a[0] = {0}, expected 1")]
    FeedbackNotNormalized(f32),

    #[error("Feedback coefficient a[0] is zero, cannot normalize")]
    SingularFeedback,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
