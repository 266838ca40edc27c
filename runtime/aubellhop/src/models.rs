// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};
use once_cell::sync::Lazy;

use aubellhop_base::defaults;
use aubellhop_base::types::Task;
use aubellhop_base::Environment;

use crate::errors::AubellhopError;
use crate::simulator::{BellhopSimulator, Simulator, SimulatorOptions};

/// Builds a simulator from its options
pub type Factory = Box<dyn Fn(&SimulatorOptions) -> Result<Box<dyn Simulator>, AubellhopError> + Send + Sync>;

/// Environment variables overriding the default executables
pub const BELLHOP_EXE_VAR: &str = "BELLHOP_EXE";
pub const BELLHOP3D_EXE_VAR: &str = "BELLHOP3D_EXE";

struct Entry {
    name: String,
    defaults: SimulatorOptions,
    factory: Factory,
}

/// Named simulator factories, kept in registration order
pub struct ModelRegistry {
    entries: Vec<Entry>,
    /// 2-D and 3-D executables `reset` restores
    default_exes: Option<(String, String)>,
}

impl ModelRegistry {
    pub fn empty() -> ModelRegistry {
        ModelRegistry { entries: Vec::new(), default_exes: None }
    }

    /// Registry holding `bellhop` and `bellhop3d` with the given executables
    pub fn with_default_models(exe_2d: &str, exe_3d: &str) -> ModelRegistry {
        let mut registry = ModelRegistry::empty();
        registry.insert_bellhop(defaults::MODEL_NAME_2D, exe_2d, 2);
        registry.insert_bellhop(defaults::MODEL_NAME_3D, exe_3d, 3);
        registry.default_exes = Some((exe_2d.to_string(), exe_3d.to_string()));
        registry
    }

    /// Default registry; `BELLHOP_EXE` and `BELLHOP3D_EXE` override the executables
    pub fn with_defaults() -> ModelRegistry {
        let exe_2d = env::var(BELLHOP_EXE_VAR).unwrap_or_else(|_| defaults::MODEL_EXE_2D.to_string());
        let exe_3d = env::var(BELLHOP3D_EXE_VAR).unwrap_or_else(|_| defaults::MODEL_EXE_3D.to_string());
        ModelRegistry::with_default_models(&exe_2d, &exe_3d)
    }

    fn insert_bellhop(&mut self, name: &str, exe: &str, dim: usize) {
        let options = SimulatorOptions { exe: exe.to_string(), dim, ..SimulatorOptions::default() };
        self.entries.retain(|e| e.name != name);
        self.entries.push(Entry { name: name.to_string(), defaults: options, factory: bellhop_factory(name) });
    }

    /// Add a model; an existing name is rejected and left untouched
    pub fn register(&mut self, name: &str, defaults: SimulatorOptions, factory: Factory) -> Result<(), AubellhopError> {
        if self.contains(name) {
            return Err(AubellhopError::DuplicateModelError(name.to_string()));
        }
        debug!("Registering model `{}` ({})", name, defaults.exe);
        self.entries.push(Entry { name: name.to_string(), defaults, factory });
        Ok(())
    }

    /// Add a model, replacing any model of the same name in place
    pub fn register_or_replace(&mut self, name: &str, defaults: SimulatorOptions, factory: Factory) {
        let entry = Entry { name: name.to_string(), defaults, factory };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Register a further Bellhop executable under its own name
    pub fn register_bellhop(&mut self, name: &str, options: SimulatorOptions) -> Result<(), AubellhopError> {
        self.register(name, options, bellhop_factory(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Fresh simulator for `name`; `options` replace the registered defaults
    pub fn new_model(&self, name: &str, options: Option<SimulatorOptions>) -> Result<Box<dyn Simulator>, AubellhopError> {
        let entry = self.entries.iter().find(|e| e.name == name)
            .ok_or_else(|| AubellhopError::UnknownModelError(name.to_string()))?;
        let options = options.unwrap_or_else(|| entry.defaults.clone());
        (entry.factory)(&options)
    }

    /// Names of all registered models
    pub fn supported(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Names of the models able to run the given environment, task or dimension
    pub fn supported_for(&self, env: Option<&Environment>, task: Option<Task>, dim: Option<usize>) -> Vec<String> {
        self.entries.iter()
            .filter(|e| (e.factory)(&e.defaults).map_or(false, |m| m.supports(env, task, dim)))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Drop all registrations and restore `bellhop` and `bellhop3d` with
    /// the executables this registry was built with
    pub fn reset(&mut self) {
        *self = match self.default_exes.take() {
            Some((exe_2d, exe_3d)) => ModelRegistry::with_default_models(&exe_2d, &exe_3d),
            None => ModelRegistry::with_defaults(),
        };
    }

    /// Simulator for a run: `model` by name, or else the first registered
    /// model able to run `env`
    pub fn select(&self, env: &Environment, task: Task, model: Option<&str>) -> Result<Box<dyn Simulator>, AubellhopError> {
        if let Some(name) = model {
            return self.new_model(name, None);
        }

        let mut missing_exe = None;
        for entry in &self.entries {
            let sim = (entry.factory)(&entry.defaults)?;
            match sim.check(Some(env), Some(task), None) {
                Ok(()) => {
                    info!("Selected model `{}` for `{}` ({})", entry.name, env.name(), task.name());
                    return Ok(sim);
                },
                Err(e @ AubellhopError::ExecutableNotFoundError(_)) => {
                    missing_exe.get_or_insert(e);
                },
                Err(e) => debug!("Model `{}` skipped: {}", entry.name, e),
            }
        }
        Err(missing_exe.unwrap_or_else(|| AubellhopError::NoSuitableModelError(
            format!("a {}-D `{}` run of `{}`", env.dim(), task.name(), env.name()))))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        ModelRegistry::with_defaults()
    }
}

fn bellhop_factory(name: &str) -> Factory {
    let name = name.to_string();
    Box::new(move |options: &SimulatorOptions| -> Result<Box<dyn Simulator>, AubellhopError> {
        Ok(Box::new(BellhopSimulator::new(&name, options.clone())))
    })
}

static REGISTRY: Lazy<RwLock<ModelRegistry>> = Lazy::new(|| RwLock::new(ModelRegistry::with_defaults()));

/// Process-wide model registry
pub struct Models;

impl Models {
    /// Shared access; a panic in another holder does not invalidate the registry
    pub fn read() -> RwLockReadGuard<'static, ModelRegistry> {
        REGISTRY.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write() -> RwLockWriteGuard<'static, ModelRegistry> {
        REGISTRY.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn new(name: &str, options: Option<SimulatorOptions>) -> Result<Box<dyn Simulator>, AubellhopError> {
        Models::read().new_model(name, options)
    }

    pub fn register(name: &str, defaults: SimulatorOptions, factory: Factory) -> Result<(), AubellhopError> {
        Models::write().register(name, defaults, factory)
    }

    pub fn register_bellhop(name: &str, options: SimulatorOptions) -> Result<(), AubellhopError> {
        Models::write().register_bellhop(name, options)
    }

    pub fn supported() -> Vec<String> {
        Models::read().supported()
    }

    pub fn supported_for(env: Option<&Environment>, task: Option<Task>, dim: Option<usize>) -> Vec<String> {
        Models::read().supported_for(env, task, dim)
    }

    pub fn reset() {
        Models::write().reset()
    }
}
