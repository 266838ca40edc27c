// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

pub mod errors;
pub mod types;
pub mod defaults;
pub mod environment;
pub mod env_writer;
pub mod readers;
pub mod results;
pub mod impulse;

mod env_reader;

pub use environment::{Bathymetry, EnvConfig, Environment, SoundSpeed, SoundSpeedField};
