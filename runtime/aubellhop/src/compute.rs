// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::Path;

use log::{info, warn};

use aubellhop_base::results::{Arrivals, RayFan};
use aubellhop_base::types::{Dimension, Task};
use aubellhop_base::Environment;

use crate::errors::AubellhopError;
use crate::models::{ModelRegistry, Models};
use crate::simulator::{Simulator, TaskResult};

/// One run of a batch
#[derive(Debug)]
pub struct ComputeRecord {
    pub env_name: String,
    pub task: Task,
    pub model: String,
    pub result: Result<TaskResult, AubellhopError>,
}

/// Run `task` on `env` with the named model, or the first suitable registered one
pub fn compute(env: &Environment, task: Task, model: Option<&str>) -> Result<TaskResult, AubellhopError> {
    // the registry lock is released before the external process runs
    let sim = Models::read().select(env, task, model)?;
    run_selected(sim, env, task)
}

/// As [`compute`], against an explicit registry
pub fn compute_with(registry: &ModelRegistry, env: &Environment, task: Task, model: Option<&str>) -> Result<TaskResult, AubellhopError> {
    run_selected(registry.select(env, task, model)?, env, task)
}

fn run_selected(sim: Box<dyn Simulator>, env: &Environment, task: Task) -> Result<TaskResult, AubellhopError> {
    info!("Computing {} for `{}` with `{}`", task.name(), env.name(), sim.name());
    sim.run(env, task)
}

pub fn compute_arrivals(env: &Environment, model: Option<&str>) -> Result<Arrivals, AubellhopError> {
    match compute(env, Task::Arrivals, model)? {
        TaskResult::Arrivals(arr) => Ok(arr),
        _ => Err(unexpected(model, "arrivals")),
    }
}

pub fn compute_rays(env: &Environment, model: Option<&str>) -> Result<RayFan, AubellhopError> {
    rays(compute(env, Task::Rays, model)?, model)
}

/// Only the rays connecting sources to receivers
pub fn compute_eigenrays(env: &Environment, model: Option<&str>) -> Result<RayFan, AubellhopError> {
    rays(compute(env, Task::Eigenrays, model)?, model)
}

fn rays(result: TaskResult, model: Option<&str>) -> Result<RayFan, AubellhopError> {
    match result {
        TaskResult::Rays(fan) => Ok(fan),
        _ => Err(unexpected(model, "ray")),
    }
}

fn unexpected(model: Option<&str>, expected: &str) -> AubellhopError {
    AubellhopError::UnexpectedResultError {
        model: model.unwrap_or("auto").to_string(),
        expected: expected.to_string(),
    }
}

/// Every combination of environment, task and model. A failed run is
/// recorded and the batch continues. An empty `models` list means
/// automatic selection.
pub fn compute_all(envs: &[Environment], tasks: &[Task], models: &[&str]) -> Vec<ComputeRecord> {
    compute_all_with(&Models::read(), envs, tasks, models)
}

pub fn compute_all_with(registry: &ModelRegistry, envs: &[Environment], tasks: &[Task], models: &[&str]) -> Vec<ComputeRecord> {
    let models: Vec<Option<&str>> = if models.is_empty() {
        vec![None]
    } else {
        models.iter().map(|m| Some(*m)).collect()
    };

    let mut records = Vec::with_capacity(envs.len() * tasks.len() * models.len());
    for env in envs {
        for task in tasks {
            for model in &models {
                let result = compute_with(registry, env, *task, *model);
                if let Err(e) = &result {
                    warn!("{} of `{}` failed: {}", task.name(), env.name(), e);
                }
                records.push(ComputeRecord {
                    env_name: env.name().to_string(),
                    task: *task,
                    model: model.unwrap_or("auto").to_string(),
                    result,
                });
            }
        }
    }
    records
}

/// Run an existing `.env` file in place. The task comes from the file's run
/// type; output files are removed afterwards.
pub fn compute_from_file(model: Option<&str>, path: &Path, dimension: Dimension) -> Result<TaskResult, AubellhopError> {
    let env = Environment::from_env_file(path, dimension)?;
    let task = file_task(&env, model, path)?;
    let sim = Models::read().select(&env, task, model)?;
    run_file_selected(sim, &env, task, path)
}

pub fn compute_from_file_with(registry: &ModelRegistry, model: Option<&str>, path: &Path, dimension: Dimension) -> Result<TaskResult, AubellhopError> {
    let env = Environment::from_env_file(path, dimension)?;
    let task = file_task(&env, model, path)?;
    run_file_selected(registry.select(&env, task, model)?, &env, task, path)
}

fn file_task(env: &Environment, model: Option<&str>, path: &Path) -> Result<Task, AubellhopError> {
    env.config().task.ok_or_else(|| AubellhopError::UnsupportedTaskError {
        model: model.unwrap_or("auto").to_string(),
        reason: format!("the run type of `{}`", path.display()),
    })
}

fn run_file_selected(sim: Box<dyn Simulator>, env: &Environment, task: Task, path: &Path) -> Result<TaskResult, AubellhopError> {
    sim.check(Some(env), Some(task), None)?;
    info!("Computing {} from `{}` with `{}`", task.name(), path.display(), sim.name());
    sim.run_file(path, task)
}
