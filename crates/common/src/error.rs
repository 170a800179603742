//! Error types for FlightPath

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using FlightPath Error
pub type Result<T> = std::result::Result<T, Error>;

/// Rule and data errors raised by the journey core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid departure city: {0}")]
    InvalidOrigin(String),

    #[error("Invalid destination city for {origin}: {destination}")]
    InvalidDestination { origin: String, destination: String },

    #[error("Departure and destination cannot be the same: {0}")]
    SameCity(String),

    #[error("Unknown origin: {0}")]
    UnknownOrigin(String),

    #[error("Cannot pick from an empty sequence")]
    EmptySequence,

    #[error("No flights available")]
    NoFlightsAvailable,

    #[error("Invalid flight #{index}. Total flights: {total}")]
    InvalidFlightIndex { index: usize, total: usize },

    #[error("Price could not be parsed from {0:?}")]
    PriceParse(String),

    #[error("Price {price} is not above the minimum of {minimum}")]
    PriceOutOfRange { price: f64, minimum: f64 },

    #[error("Invalid route catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable kind of this error, used by scenario expectations
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOrigin(_) => ErrorKind::InvalidOrigin,
            Error::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            Error::SameCity(_) => ErrorKind::SameCity,
            Error::UnknownOrigin(_) => ErrorKind::UnknownOrigin,
            Error::EmptySequence => ErrorKind::EmptySequence,
            Error::NoFlightsAvailable => ErrorKind::NoFlightsAvailable,
            Error::InvalidFlightIndex { .. } => ErrorKind::InvalidFlightIndex,
            Error::PriceParse(_) => ErrorKind::PriceParse,
            Error::PriceOutOfRange { .. } => ErrorKind::PriceOutOfRange,
            Error::InvalidCatalog(_)
            | Error::InvalidConfig(_)
            | Error::InvalidStateTransition { .. }
            | Error::Io(_)
            | Error::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

/// Distinguishable failure kinds, as named in scenario files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidOrigin,
    InvalidDestination,
    SameCity,
    UnknownOrigin,
    EmptySequence,
    NoFlightsAvailable,
    InvalidFlightIndex,
    PriceParse,
    PriceOutOfRange,
    StatusMismatch,
    StageTimeout,
    Timeout,
    Browser,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidOrigin => "invalid_origin",
            ErrorKind::InvalidDestination => "invalid_destination",
            ErrorKind::SameCity => "same_city",
            ErrorKind::UnknownOrigin => "unknown_origin",
            ErrorKind::EmptySequence => "empty_sequence",
            ErrorKind::NoFlightsAvailable => "no_flights_available",
            ErrorKind::InvalidFlightIndex => "invalid_flight_index",
            ErrorKind::PriceParse => "price_parse",
            ErrorKind::PriceOutOfRange => "price_out_of_range",
            ErrorKind::StatusMismatch => "status_mismatch",
            ErrorKind::StageTimeout => "stage_timeout",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Browser => "browser",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
