// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

pub mod errors;
pub mod simulator;
pub mod models;
pub mod compute;
pub mod demo;
pub mod plot;

pub use aubellhop_base::{defaults, env_writer, impulse, readers, results, types};
pub use aubellhop_base::{Bathymetry, EnvConfig, Environment, SoundSpeed, SoundSpeedField};

pub use compute::{compute, compute_all, compute_arrivals, compute_eigenrays, compute_from_file, compute_rays};
pub use demo::demo;
pub use models::Models;
pub use simulator::{Simulator, TaskResult};
