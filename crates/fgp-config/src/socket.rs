use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Filesystem-local socket a daemon listens on.
///
/// Endpoints are written either as `unix:///absolute/path.sock` or as a bare
/// absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct SocketEndpoint {
    path: Utf8PathBuf,
}

impl SocketEndpoint {
    /// Builds an endpoint for a Unix domain socket path.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the socket file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Ensures the socket's parent directory exists with restrictive permissions.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(parent) = self.path.parent().filter(|parent| !parent.as_str().is_empty())
        else {
            return Err(SocketPreparationError::MissingParent {
                path: self.path.clone(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "unix://{}", self.path)
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SocketParseError::Empty);
        }
        if trimmed.starts_with('/') {
            return Ok(Self::unix(trimmed));
        }

        let url = Url::parse(trimmed)?;
        match url.scheme() {
            "unix" => {
                let decoded = percent_decode_str(url.path())
                    .decode_utf8()
                    .map_err(|_| SocketParseError::InvalidEncoding(input.to_owned()))?;
                if decoded.is_empty() || decoded == "/" {
                    return Err(SocketParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(decoded.into_owned()))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

impl TryFrom<String> for SocketEndpoint {
    type Error = SocketParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SocketEndpoint> for String {
    fn from(endpoint: SocketEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// No endpoint text was supplied.
    #[error("socket endpoint is empty")]
    Empty,
    /// Scheme was not recognised; only `unix` is supported.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// Percent-encoded path was not valid UTF-8.
    #[error("socket path in '{0}' is not valid UTF-8")]
    InvalidEncoding(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Parent directory is missing for the socket path.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Failed to create the socket directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
