// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BellhopError {
    #[error("Invalid environment configuration: {0}")]
    ConfigurationError(String),
    #[error("Failed to parse `{path}` (line {line}): {reason}")]
    OutputParseError {
        path: PathBuf,
        line: usize,
        reason: String
    },
    #[error("Could not write `{path}`: {source}")]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl BellhopError {
    pub fn config<S: Into<String>>(msg: S) -> BellhopError {
        BellhopError::ConfigurationError(msg.into())
    }

    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, reason: S) -> BellhopError {
        BellhopError::OutputParseError { path: path.into(), line, reason: reason.into() }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, BellhopError::ConfigurationError(_))
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, BellhopError::OutputParseError { .. })
    }
}
