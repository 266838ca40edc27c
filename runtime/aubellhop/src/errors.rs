// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use aubellhop_base::errors;

#[derive(Error, Debug)]
pub enum AubellhopError {
    #[error("Unknown model: `{0}`")]
    UnknownModelError(String),
    #[error("A model named `{0}` is already registered")]
    DuplicateModelError(String),
    #[error("Executable `{0}` not found in PATH")]
    ExecutableNotFoundError(String),
    #[error("Execution of `{}` failed ({status})\n\nCommand: {command}\n\nOutput:\n{output}\n\nExtract from PRT file:\n{}",
        .exe.display(), .prt.as_deref().unwrap_or("(none)"))]
    ExternalToolError {
        exe: PathBuf,
        command: String,
        status: String,
        output: String,
        prt: Option<String>
    },
    #[error("`{}` did not finish within {timeout:?} and was terminated", .exe.display())]
    TimeoutError {
        exe: PathBuf,
        timeout: Duration
    },
    #[error("Model `{model}` does not support {reason}")]
    UnsupportedTaskError {
        model: String,
        reason: String
    },
    #[error("No suitable propagation model available for {0}")]
    NoSuitableModelError(String),
    #[error("Model `{model}` returned no {expected} result")]
    UnexpectedResultError {
        model: String,
        expected: String
    },
    #[error("Could not write plot `{}`: {reason}", .path.display())]
    PlotError {
        path: PathBuf,
        reason: String
    },
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    #[error(transparent)]
    BellhopError(#[from] errors::BellhopError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
