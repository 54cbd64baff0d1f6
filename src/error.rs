//! Error types for the FlourCraft funnel.

use uuid::Uuid;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Flow errors. None of these are fatal: the flow stays where it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunnelError {
    #[error("Continue is disabled until a choice is made")]
    ContinueDisabled,

    #[error("Option {option:?} is not offered by step {step}")]
    OptionNotOffered { step: usize, option: String },

    #[error("Step {step} does not accept {expected} input")]
    WrongStepKind { step: usize, expected: String },

    #[error("Action requires the {expected} stage, flow is in {actual}")]
    WrongStage { expected: String, actual: String },

    #[error("Questionnaire already completed")]
    AlreadyCompleted,

    #[error("Session {id} not found")]
    SessionNotFound { id: Uuid },
}

/// Terminal/channel I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to write output on channel {name}: {reason}")]
    WriteFailed { name: String, reason: String },
}
