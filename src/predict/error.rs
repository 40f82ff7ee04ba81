use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid element set: {0}")]
    PropagationInit(String),
    #[error("propagation failed: {0}")]
    PropagationSample(String),
}
