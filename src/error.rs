use std::{io,time};

use thiserror::Error;

use super::dataset::Feature;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error,Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IO(#[from] io::Error),
    #[error("CSV error: {0}")]
    CSV(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JSON(#[from] serde_json::Error),
    #[error("Request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),
    #[error("System Time error: {0}")]
    SystemTime(#[from] time::SystemTimeError),
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("Missing entity: {0}")]
    MissingEntity(String),
    #[error("Missing feature {feature} for {entity}")]
    MissingFeature { entity: String, feature: Feature },
    #[error("Series cannot be aligned: reference {reference}, target {target}")]
    Misaligned { reference: String, target: String },
    #[error("No data!")]
    MissingData,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
	Self::Config(Box::new(err))
    }
}
