// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::Path;

use log::info;

use aubellhop_base::results::Arrivals;
use aubellhop_base::{Bathymetry, Environment, SoundSpeed};

use crate::compute::compute_arrivals;
use crate::errors::AubellhopError;

/// Shallow-water scenario: 25 m deep, isovelocity, one source and receiver 1 km apart
pub fn demo_environment() -> Result<Environment, AubellhopError> {
    let env = Environment::default_env()?.with(|c| {
        c.name = "aubellhop demo".to_string();
        c.frequency = 25000.0;
        c.soundspeed = SoundSpeed::Constant(1500.0);
        c.depth = Bathymetry::Flat(25.0);
        c.source_depth = vec![5.0];
        c.receiver_depth = vec![10.0];
        c.receiver_range = vec![1000.0];
    })?;
    Ok(env)
}

/// Arrivals of the demo scenario, computed with the first available 2-D model
pub fn demo() -> Result<Arrivals, AubellhopError> {
    let env = demo_environment()?;
    let arrivals = compute_arrivals(&env, None)?;
    info!("Demo produced {} arrivals", arrivals.len());
    Ok(arrivals)
}

/// Write the demo scenario's options as JSON, a starting point for own configurations
pub fn write_demo_config(path: &Path) -> Result<(), AubellhopError> {
    let json = demo_environment()?.to_json_string()?;
    fs::write(path, json)?;
    info!("Demo configuration written to `{}`", path.display());
    Ok(())
}
