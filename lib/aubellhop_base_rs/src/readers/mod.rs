// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

//! Parsers for Bellhop's text output and companion input files.
//! Malformed, truncated or missing files fail with
//! [`BellhopError::OutputParseError`](crate::errors::BellhopError::OutputParseError).

mod arrivals;
mod rays;
mod tables;
pub mod tokens;

pub use arrivals::read_arrivals;
pub use rays::read_rays;
pub use tables::{read_ati, read_brc, read_bty, read_sbp, read_ssp, read_trc, BoundaryCurve, SspTable};
