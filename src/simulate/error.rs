use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulateError {
    #[error("invalid tle format: {0}")]
    InvalidTleFormat(&'static str),
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
}
