// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

/// Error type for SceneSync client operations.
///
/// Covers transport failures reported by the annotation platform, local I/O
/// and serialization problems, and the misuse errors raised by the
/// synchronization logic (unmapped labels, unsupported media kinds, missing
/// annotation sources).
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// Configuration parsing or loading error.
    ConfigError(config::ConfigError),
    /// JSON serialization or deserialization error.
    JsonError(serde_json::Error),
    /// HTTP error from the reqwest client (connection, timeout, TLS).
    HttpError(reqwest::Error),
    /// URL parsing error.
    UrlParseError(url::ParseError),
    /// The platform answered a request with an unexpected HTTP status.
    /// Carries the status code and the response body.
    RequestError(u16, String),
    /// A source label name has no counterpart in the project labels.
    UnmappedLabel(String),
    /// The requested media kind is not recognized.
    InvalidMediaType(String),
    /// The operation is not supported for this kind of media item.
    UnsupportedMediaType(String),
    /// No annotation scene was supplied and no annotation reader is
    /// configured.
    NoAnnotationSource,
    /// The platform version string could not be parsed.
    InvalidVersion(String),
    /// Invalid parameters provided to an operation.
    InvalidParameters(String),
}

impl Error {
    /// Returns the HTTP status code for a [`Error::RequestError`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RequestError(status, _) => Some(*status),
            Error::HttpError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::UrlParseError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::HttpError(e) => write!(f, "HTTP error: {}", e),
            Error::UrlParseError(e) => write!(f, "URL parse error: {}", e),
            Error::RequestError(status, msg) => {
                write!(f, "Request failed with status {}: {}", status, msg)
            }
            Error::UnmappedLabel(name) => write!(
                f,
                "Found label {} in source labels, but this label is not in the project labels",
                name
            ),
            Error::InvalidMediaType(s) => write!(f, "Invalid media type: {}", s),
            Error::UnsupportedMediaType(s) => write!(f, "Unsupported media type: {}", s),
            Error::NoAnnotationSource => write!(
                f,
                "No annotation data was passed and no annotation reader is configured"
            ),
            Error::InvalidVersion(s) => write!(f, "Invalid platform version: {}", s),
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::HttpError(e) => Some(e),
            Error::UrlParseError(e) => Some(e),
            _ => None,
        }
    }
}
