use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Exif error: `{0}`")]
    Exif(#[from] exif::Error),
    #[error("IO error: `{0}`")]
    IO(#[from] std::io::Error),
    #[error("Extraction task failed: `{0}`")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid rules file: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("Invalid fingerprint pattern for {app}: {source}")]
    InvalidPattern { app: String, source: regex::Error },
    #[error("Invalid value `{value}` for {name}")]
    InvalidVariable { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("Unable to fetch location: {0}")]
    Unavailable(String),
    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Coordinates out of range: {lat}, {lng}")]
    OutOfRange { lat: f64, lng: f64 },
    #[error("No location available, enter one manually")]
    Missing,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unsupported file type `{0}`, only JPG and PNG are accepted")]
    UnsupportedType(String),
    #[error("File is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("At most {0} images can be attached")]
    TooMany(usize),
}
