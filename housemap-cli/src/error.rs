//! Error handling for the housemap CLI

use housemap_core::routes::RouteError;
use housemap_core::{ListError, MapError, PointId, StoreError};
use thiserror::Error;

/// Main error type for housemap CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("No point with id {id}")]
    PointNotFound { id: PointId },

    #[error("Invalid coordinates '{input}': {message}")]
    InvalidCoordinates { input: String, message: String },

    #[error("Route error: {message}")]
    Route { message: String },

    #[error("Map error: {message}")]
    Map { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into() }
    }

    pub fn point_not_found(id: PointId) -> Self {
        Self::PointNotFound { id }
    }

    pub fn invalid_coordinates<S: Into<String>, M: Into<String>>(input: S, message: M) -> Self {
        Self::InvalidCoordinates {
            input: input.into(),
            message: message.into(),
        }
    }

    pub fn route<S: Into<String>>(message: S) -> Self {
        Self::Route { message: message.into() }
    }

    pub fn map<S: Into<String>>(message: S) -> Self {
        Self::Map { message: message.into() }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<RouteError> for CliError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::Store(e) => e.into(),
            other => Self::route(other.to_string()),
        }
    }
}

impl From<ListError> for CliError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Store(e) => e.into(),
            ListError::UnknownPoint(id) => Self::point_not_found(id),
        }
    }
}

impl From<MapError> for CliError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::Store(e) => e.into(),
            MapError::Route(e) => e.into(),
            other => Self::map(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::PointNotFound { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Run 'housemap list' to see the stored ids\n\
                 • The point may already have been deleted",
            );
        }

        CliError::InvalidCoordinates { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Write a position as 'lat,lng', for example 40.7128,-74.006\n\
                 • Separate route points with ';'\n\
                 • Latitude must be within ±90 and longitude within ±180",
            );
        }

        CliError::Route { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • A route segment needs at least two points\n\
                 • Run 'housemap routes show' to see the stored route indices",
            );
        }

        CliError::Storage { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check that the data directory is writable (see --data-dir)\n\
                 • If storage.json was edited by hand, check that it is valid JSON",
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your housemap.toml configuration file\n\
                 • Use 'housemap config --example' to generate a sample configuration\n\
                 • Verify that all configuration values are valid",
            );
        }

        CliError::Map { .. } => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}
