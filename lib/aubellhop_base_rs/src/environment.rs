// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::defaults::{self, DEFAULTS};
use crate::errors::BellhopError;
use crate::types::*;

/// Water depth: a single value for a flat bottom, or `[range (m), depth (m)]` pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bathymetry {
    Flat(f64),
    Profile(Vec<[f64; 2]>),
}

/// Range-dependent sound speed: `speeds[depth index][range index]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoundSpeedField {
    /// Profile ranges (m)
    pub ranges: Vec<f64>,
    /// Profile depths (m)
    pub depths: Vec<f64>,
    pub speeds: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoundSpeed {
    Constant(f64),
    /// `[depth (m), speed (m/s)]` pairs
    Profile(Vec<[f64; 2]>),
    Field(SoundSpeedField),
}

/// User-facing options of an environment; every field has a default in
/// [`DEFAULTS`](crate::defaults::DEFAULTS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    pub name: String,
    pub dimension: Dimension,
    /// Hz
    pub frequency: f64,
    /// Task named by the run type of a `.env` file this environment was read from
    pub task: Option<Task>,

    pub soundspeed: SoundSpeed,
    pub soundspeed_interp: SoundSpeedInterp,

    pub depth: Bathymetry,
    pub depth_interp: CurveInterp,
    pub depth_max: Option<f64>,
    /// Ignored by Bellhop but kept for faithful `.env` round trips
    pub mesh_npts: usize,
    pub depth_sigma: f64,

    pub bottom_soundspeed: f64,
    pub bottom_soundspeed_shear: f64,
    /// kg/m^3
    pub bottom_density: f64,
    pub bottom_attenuation: Option<f64>,
    pub bottom_attenuation_shear: Option<f64>,
    /// m (rms)
    pub bottom_roughness: f64,
    pub bottom_boundary_condition: BoundaryCondition,
    /// `[angle (deg), magnitude, phase (deg)]` rows
    pub bottom_reflection_coefficient: Option<Vec<[f64; 3]>>,

    /// Altimetry as `[range (m), height (m)]` pairs
    pub surface: Option<Vec<[f64; 2]>>,
    pub surface_interp: CurveInterp,
    pub surface_boundary_condition: BoundaryCondition,
    pub surface_reflection_coefficient: Option<Vec<[f64; 3]>>,
    pub surface_soundspeed: f64,
    pub surface_soundspeed_shear: f64,
    pub surface_density: f64,
    pub surface_attenuation: Option<f64>,
    pub surface_attenuation_shear: Option<f64>,

    pub source_type: SourceType,
    #[serde(deserialize_with = "one_or_many")]
    pub source_range: Vec<f64>,
    #[serde(deserialize_with = "one_or_many")]
    pub source_cross_range: Vec<f64>,
    #[serde(deserialize_with = "one_or_many")]
    pub source_depth: Vec<f64>,
    pub source_nrange: Option<usize>,
    pub source_ncrossrange: Option<usize>,
    pub source_ndepth: Option<usize>,
    /// `[angle (deg), level (dB)]` rows
    pub source_directionality: Option<Vec<[f64; 2]>>,

    #[serde(deserialize_with = "one_or_many")]
    pub receiver_depth: Vec<f64>,
    #[serde(deserialize_with = "one_or_many")]
    pub receiver_range: Vec<f64>,
    #[serde(deserialize_with = "one_or_many")]
    pub receiver_bearing: Vec<f64>,
    pub receiver_ndepth: Option<usize>,
    pub receiver_nrange: Option<usize>,
    pub receiver_nbearing: Option<usize>,

    pub beam_type: BeamType,
    pub beam_angle_min: Option<f64>,
    pub beam_angle_max: Option<f64>,
    pub beam_bearing_min: Option<f64>,
    pub beam_bearing_max: Option<f64>,
    /// 0 lets Bellhop choose
    pub beam_num: usize,
    pub beam_bearing_num: usize,
    pub single_beam_index: Option<usize>,

    /// m; 0 lets Bellhop choose
    pub step_size: f64,
    pub box_depth: Option<f64>,
    pub box_range: Option<f64>,
    pub box_cross_range: Option<f64>,
    pub grid_type: GridType,

    pub volume_attenuation: VolumeAttenuation,
    pub attenuation_units: AttenuationUnits,
    /// `[z1, z2, f0, Q, a0]` rows
    pub biological_layer_parameters: Option<Vec<[f64; 5]>>,
    pub fg_salinity: Option<f64>,
    pub fg_temperature: Option<f64>,
    pub fg_ph: Option<f64>,
    pub fg_depth: Option<f64>,

    pub comment_pad: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}

impl EnvConfig {
    /// Names of all recognised options
    pub fn option_names() -> Vec<String> {
        match serde_json::to_value(&*DEFAULTS) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new()
        }
    }
}

fn merge_options<K, V>(map: &mut Map<String, Value>, options: &[(K, V)]) -> Result<(), BellhopError>
where K: AsRef<str>, V: AsRef<str>
{
    let known = EnvConfig::option_names();
    for (key, value) in options {
        let key = key.as_ref();
        if !known.iter().any(|k| k == key) {
            return Err(BellhopError::config(format!("unknown environment option `{}`", key)));
        }
        let value = value.as_ref();
        let parsed = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        map.insert(key.to_string(), parsed);
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(f64),
    Many(Vec<f64>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where D: Deserializer<'de>
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

/// Values derived from the options when an environment is built
#[derive(Debug, Clone, PartialEq)]
struct Resolved {
    depth_max: f64,
    soundspeed: SoundSpeed,
    soundspeed_interp: SoundSpeedInterp,
    surface_boundary_condition: BoundaryCondition,
    bottom_boundary_condition: BoundaryCondition,
    beam_angle_min: f64,
    beam_angle_max: f64,
    beam_bearing_min: f64,
    beam_bearing_max: f64,
    box_depth: f64,
    box_range: f64,
    box_cross_range: f64,
}

/// A validated propagation scenario.
///
/// Construction finalises and checks the options eagerly. An environment is
/// never modified afterwards; [`Environment::with`] builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    config: EnvConfig,
    resolved: Resolved,
}

impl Environment {
    /// Environment built from [`DEFAULTS`](crate::defaults::DEFAULTS) alone
    pub fn default_env() -> Result<Environment, BellhopError> {
        Environment::new(EnvConfig::default())
    }

    pub fn new(config: EnvConfig) -> Result<Environment, BellhopError> {
        let resolved = finalise(&config)?;
        let env = Environment { config, resolved };
        env.check()?;
        debug!("Environment `{}` validated ({}-D, depth_max {} m)", env.config.name, env.dim(), env.depth_max());
        Ok(env)
    }

    /// Build from `(option, value)` pairs. Values are read as JSON where
    /// possible (`"25.0"`, `"[5, 10]"`, `"null"`) and as plain strings otherwise.
    pub fn from_options<K, V>(options: &[(K, V)]) -> Result<Environment, BellhopError>
    where K: AsRef<str>, V: AsRef<str>
    {
        let mut map = Map::new();
        merge_options(&mut map, options)?;
        Environment::from_json_value(Value::Object(map))
    }

    /// Override some options of this environment, read as in [`Environment::from_options`]
    pub fn with_options<K, V>(&self, options: &[(K, V)]) -> Result<Environment, BellhopError>
    where K: AsRef<str>, V: AsRef<str>
    {
        let mut map = self.option_map()?;
        merge_options(&mut map, options)?;
        Environment::from_json_value(Value::Object(map))
    }

    pub fn from_json_str(json: &str) -> Result<Environment, BellhopError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| BellhopError::config(format!("malformed JSON configuration: {}", e)))?;
        Environment::from_json_value(value)
    }

    pub fn from_json_file(path: &Path) -> Result<Environment, BellhopError> {
        let file = File::open(path)
            .map_err(|e| BellhopError::config(format!("cannot open `{}`: {}", path.display(), e)))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| BellhopError::config(format!("malformed JSON in `{}`: {}", path.display(), e)))?;
        Environment::from_json_value(value)
    }

    fn from_json_value(value: Value) -> Result<Environment, BellhopError> {
        let config: EnvConfig = serde_json::from_value(value)
            .map_err(|e| BellhopError::config(e.to_string()))?;
        Environment::new(config)
    }

    /// Read a Bellhop `.env` file and any companion files it references
    pub fn from_env_file(path: &Path, dimension: Dimension) -> Result<Environment, BellhopError> {
        crate::env_reader::read_env(path, dimension)
    }

    pub fn to_json_string(&self) -> Result<String, BellhopError> {
        serde_json::to_string_pretty(&self.config)
            .map_err(|e| BellhopError::config(e.to_string()))
    }

    /// Functional update: apply `update` to a copy of the options and build a new environment
    pub fn with<F>(&self, update: F) -> Result<Environment, BellhopError>
    where F: FnOnce(&mut EnvConfig)
    {
        let mut config = self.config.clone();
        update(&mut config);
        Environment::new(config)
    }

    /// Expand over the listed array-valued options (source depths, receiver
    /// ranges, ...). Every combination of their entries becomes its own
    /// environment, named after the parent and the values.
    pub fn unwrap(&self, keys: &[&str]) -> Result<Vec<Environment>, BellhopError> {
        let base = self.option_map()?;
        let mut axes: Vec<(&str, Vec<Value>)> = Vec::new();
        for key in keys {
            let value = base.get(*key)
                .ok_or_else(|| BellhopError::config(format!("environment has no option `{}`", key)))?;
            let values = match value {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            axes.push((key, values));
        }
        self.sweep(&axes)
    }

    /// Expand over explicit values, e.g. a list of frequencies. Naming
    /// follows [`Environment::unwrap`].
    pub fn sweep(&self, axes: &[(&str, Vec<Value>)]) -> Result<Vec<Environment>, BellhopError> {
        let base = self.option_map()?;
        for (key, _) in axes {
            if !base.contains_key(*key) {
                return Err(BellhopError::config(format!("environment has no option `{}`", key)));
            }
        }

        let mut combos: Vec<Vec<Value>> = vec![Vec::new()];
        for (_, values) in axes {
            combos = combos.into_iter()
                .flat_map(|prefix| values.iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v.clone());
                    next
                }))
                .collect();
        }

        let mut envs = Vec::with_capacity(combos.len());
        for combo in combos {
            let mut map = base.clone();
            let mut name_parts = vec![self.config.name.clone()];
            for ((key, _), value) in axes.iter().zip(combo) {
                name_parts.push(format!("{}{}", key, value_label(&value)));
                if let Some(count_key) = count_option(key) {
                    map.insert(count_key.to_string(), Value::Null);
                }
                map.insert(key.to_string(), value);
            }
            map.insert("name".to_string(), Value::String(name_parts.join("-")));
            envs.push(Environment::from_json_value(Value::Object(map))?);
        }
        debug!("Expanded `{}` into {} environments", self.config.name, envs.len());
        Ok(envs)
    }

    fn option_map(&self) -> Result<Map<String, Value>, BellhopError> {
        match serde_json::to_value(&self.config) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(BellhopError::config("environment is not representable as a map")),
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn dimension(&self) -> Dimension {
        self.config.dimension
    }

    /// 2 or 3
    pub fn dim(&self) -> usize {
        self.config.dimension.dim()
    }

    pub fn depth_max(&self) -> f64 {
        self.resolved.depth_max
    }

    /// Sound speed after finalisation: always a profile of at least two
    /// points, or a range-dependent field
    pub fn soundspeed(&self) -> &SoundSpeed {
        &self.resolved.soundspeed
    }

    pub fn soundspeed_interp(&self) -> SoundSpeedInterp {
        self.resolved.soundspeed_interp
    }

    /// `[depth, speed]` pairs; for a range-dependent field the first range column
    pub fn soundspeed_profile(&self) -> Vec<[f64; 2]> {
        match &self.resolved.soundspeed {
            SoundSpeed::Profile(points) => points.clone(),
            SoundSpeed::Field(field) => field.depths.iter().zip(&field.speeds)
                .map(|(z, row)| [*z, row[0]])
                .collect(),
            SoundSpeed::Constant(c) => vec![[0.0, *c], [self.depth_max(), *c]],
        }
    }

    pub fn surface_boundary_condition(&self) -> BoundaryCondition {
        self.resolved.surface_boundary_condition
    }

    pub fn bottom_boundary_condition(&self) -> BoundaryCondition {
        self.resolved.bottom_boundary_condition
    }

    /// Bathymetry is written to a companion `.bty` file
    pub fn has_bathymetry_file(&self) -> bool {
        matches!(self.config.depth, Bathymetry::Profile(_))
    }

    /// Altimetry is written to a companion `.ati` file
    pub fn has_altimetry_file(&self) -> bool {
        self.config.surface.is_some()
    }

    pub fn beam_angles(&self) -> (f64, f64) {
        (self.resolved.beam_angle_min, self.resolved.beam_angle_max)
    }

    pub fn beam_bearings(&self) -> (f64, f64) {
        (self.resolved.beam_bearing_min, self.resolved.beam_bearing_max)
    }

    pub fn box_depth(&self) -> f64 {
        self.resolved.box_depth
    }

    pub fn box_range(&self) -> f64 {
        self.resolved.box_range
    }

    pub fn box_cross_range(&self) -> f64 {
        self.resolved.box_cross_range
    }

    pub fn max_receiver_range(&self) -> f64 {
        max_of(&self.config.receiver_range)
    }

    fn check(&self) -> Result<(), BellhopError> {
        self.check_header()?;
        self.check_surface()?;
        self.check_depth()?;
        self.check_ssp()?;
        self.check_sbp()?;
        self.check_counts()?;
        self.check_beam()?;
        Ok(())
    }

    fn check_header(&self) -> Result<(), BellhopError> {
        let cfg = &self.config;
        ensure(!cfg.name.contains(|c| c == '\'' || c == '\n' || c == '\r'),
            format!("name `{}` cannot be written as a quoted title", cfg.name))?;
        ensure(cfg.frequency.is_finite() && cfg.frequency > 0.0,
            format!("frequency must be positive, found {} Hz", cfg.frequency))?;
        match cfg.volume_attenuation {
            VolumeAttenuation::FrancoisGarrison => ensure(
                cfg.fg_salinity.is_some() && cfg.fg_temperature.is_some() && cfg.fg_ph.is_some() && cfg.fg_depth.is_some(),
                "Francois-Garrison attenuation needs fg_salinity, fg_temperature, fg_ph and fg_depth"),
            VolumeAttenuation::Biological => ensure(
                cfg.biological_layer_parameters.as_ref().map_or(false, |b| !b.is_empty()),
                "biological attenuation needs biological_layer_parameters"),
            _ => Ok(()),
        }
    }

    fn check_surface(&self) -> Result<(), BellhopError> {
        let cfg = &self.config;
        let max_range = self.max_receiver_range();
        if let Some(surface) = &cfg.surface {
            ensure(self.dim() == 2, "altimetry is only written for 2-D environments")?;
            ensure(surface.len() > 1, "surface must be an Nx2 array with at least two rows")?;
            ensure(surface[0][0] <= 0.0, "first range in surface array must be 0 m")?;
            ensure(surface[surface.len() - 1][0] >= max_range,
                format!("last range in surface array must be beyond maximum range: {} m", max_range))?;
            ensure(strictly_increasing(surface.iter().map(|p| p[0])), "surface array must be strictly monotonic in range")?;
        }
        if self.resolved.surface_boundary_condition == BoundaryCondition::FromFile {
            ensure(cfg.surface_reflection_coefficient.as_ref().map_or(false, |rc| !rc.is_empty()),
                "surface boundary condition `from-file` needs surface_reflection_coefficient values")?;
        }
        Ok(())
    }

    fn check_depth(&self) -> Result<(), BellhopError> {
        let cfg = &self.config;
        let max_range = self.max_receiver_range();
        let depth_max = self.depth_max();
        ensure(depth_max.is_finite() && depth_max > 0.0, format!("water depth must be positive, found {} m", depth_max))?;

        if let Bathymetry::Profile(points) = &cfg.depth {
            ensure(self.dim() == 2, "range-dependent bathymetry is only written for 2-D environments")?;
            ensure(points.len() > 1, "depth must be a scalar or an Nx2 array [ranges, depths] with at least two rows")?;
            ensure(points[points.len() - 1][0] >= max_range,
                format!("last range in depth array must be beyond maximum range: {} m", max_range))?;
            ensure(strictly_increasing(points.iter().map(|p| p[0])), "depth array must be strictly monotonic in range")?;
            ensure(points.iter().all(|p| p[1] >= 0.0), "depths in depth array cannot be negative")?;
        }
        if self.resolved.bottom_boundary_condition == BoundaryCondition::FromFile {
            ensure(cfg.bottom_reflection_coefficient.as_ref().map_or(false, |rc| !rc.is_empty()),
                "bottom boundary condition `from-file` needs bottom_reflection_coefficient values")?;
        }

        ensure(!cfg.source_depth.is_empty(), "at least one source depth is required")?;
        ensure(!cfg.receiver_depth.is_empty(), "at least one receiver depth is required")?;
        ensure(!cfg.receiver_range.is_empty(), "at least one receiver range is required")?;
        ensure(cfg.source_depth.iter().chain(&cfg.receiver_depth).all(|z| *z >= 0.0),
            "source and receiver depths cannot be negative")?;
        ensure(max_of(&cfg.source_depth) <= depth_max,
            format!("source_depth cannot exceed water depth: {} m", depth_max))?;
        ensure(max_of(&cfg.receiver_depth) <= depth_max,
            format!("receiver_depth cannot exceed water depth: {} m", depth_max))?;
        Ok(())
    }

    fn check_ssp(&self) -> Result<(), BellhopError> {
        let interp = self.resolved.soundspeed_interp;
        let depths: Vec<f64> = match &self.resolved.soundspeed {
            SoundSpeed::Profile(points) => {
                ensure(points.iter().all(|p| p[1] > 0.0), "sound speeds must be positive")?;
                ensure(points.last().map_or(false, |p| p[0] >= self.depth_max()),
                    format!("soundspeed profile must reach the water depth: {} m", self.depth_max()))?;
                points.iter().map(|p| p[0]).collect()
            },
            SoundSpeed::Field(field) => {
                ensure(self.dim() == 2, "range-dependent sound speed is only written for 2-D environments")?;
                ensure(interp == SoundSpeedInterp::Quadrilateral,
                    "a range-dependent sound speed field implies quadrilateral interpolation")?;
                ensure(!field.ranges.is_empty(), "sound speed field needs at least one range")?;
                ensure(strictly_increasing(field.ranges.iter().copied()), "sound speed field ranges must be strictly increasing")?;
                ensure(field.speeds.len() == field.depths.len(),
                    format!("sound speed field has {} depths but {} rows", field.depths.len(), field.speeds.len()))?;
                ensure(field.speeds.iter().all(|row| row.len() == field.ranges.len()),
                    format!("every sound speed field row needs {} values", field.ranges.len()))?;
                ensure(field.depths.last().map_or(false, |z| *z == self.depth_max()),
                    format!("final depth of a range-dependent sound speed field must be the water depth: {} m", self.depth_max()))?;
                field.depths.clone()
            },
            SoundSpeed::Constant(_) => return Err(BellhopError::config("sound speed was not expanded to a profile")),
        };

        if interp == SoundSpeedInterp::Spline {
            ensure(depths.len() > 3, "soundspeed profile must have at least 4 points for spline interpolation")?;
        } else {
            ensure(depths.len() > 1, "soundspeed profile must have at least 2 points")?;
        }
        ensure(depths[0] <= 0.0, "first depth in soundspeed array must be 0 m")?;
        ensure(strictly_increasing(depths.iter().copied()), "soundspeed array must be strictly monotonic in depth")?;
        Ok(())
    }

    fn check_sbp(&self) -> Result<(), BellhopError> {
        if let Some(dir) = &self.config.source_directionality {
            ensure(dir.len() > 1, "source_directionality must be an Nx2 array with at least two rows")?;
            ensure(dir.iter().all(|p| p[0] >= -180.0 && p[0] <= 180.0), "source_directionality angles must be in (-180, 180]")?;
        }
        Ok(())
    }

    /// A count replaces the number of listed values, so it can only add points
    fn check_counts(&self) -> Result<(), BellhopError> {
        let cfg = &self.config;
        let counted = [
            ("source_nrange", cfg.source_nrange, cfg.source_range.len()),
            ("source_ncrossrange", cfg.source_ncrossrange, cfg.source_cross_range.len()),
            ("source_ndepth", cfg.source_ndepth, cfg.source_depth.len()),
            ("receiver_ndepth", cfg.receiver_ndepth, cfg.receiver_depth.len()),
            ("receiver_nrange", cfg.receiver_nrange, cfg.receiver_range.len()),
            ("receiver_nbearing", cfg.receiver_nbearing, cfg.receiver_bearing.len()),
        ];
        for &(key, count, values) in counted.iter() {
            if let Some(n) = count {
                ensure(n >= values, format!("{} is {} but {} values are listed", key, n, values))?;
            }
        }
        Ok(())
    }

    fn check_beam(&self) -> Result<(), BellhopError> {
        let (amin, amax) = self.beam_angles();
        ensure((-180.0..=180.0).contains(&amin), "beam_angle_min must be in range (-180, 180]")?;
        ensure((-180.0..=180.0).contains(&amax), "beam_angle_max must be in range (-180, 180]")?;
        if let Some(index) = self.config.single_beam_index {
            ensure(index >= 1, "single_beam_index counts from 1")?;
        }
        Ok(())
    }
}

/// Fill in the derived settings the way Bellhop expects them
fn finalise(cfg: &EnvConfig) -> Result<Resolved, BellhopError> {
    ensure(cfg.receiver_range.iter().chain(&cfg.receiver_depth).chain(&cfg.source_depth).all(|v| v.is_finite()),
        "source and receiver positions must be finite")?;

    let depth_max = match cfg.depth_max {
        Some(d) => d,
        None => match &cfg.depth {
            Bathymetry::Flat(d) => *d,
            Bathymetry::Profile(points) => points.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max),
        },
    };

    let surface_boundary_condition = if cfg.surface_reflection_coefficient.is_some() {
        BoundaryCondition::FromFile
    } else {
        cfg.surface_boundary_condition
    };
    let bottom_boundary_condition = if cfg.bottom_reflection_coefficient.is_some() {
        BoundaryCondition::FromFile
    } else {
        cfg.bottom_boundary_condition
    };

    let mut soundspeed_interp = cfg.soundspeed_interp;
    let soundspeed = match &cfg.soundspeed {
        SoundSpeed::Constant(c) => SoundSpeed::Profile(vec![[0.0, *c], [depth_max, *c]]),
        SoundSpeed::Profile(points) if points.is_empty() =>
            return Err(BellhopError::config("soundspeed profile cannot be empty")),
        SoundSpeed::Profile(points) if points.len() == 1 => {
            let [z, c] = points[0];
            SoundSpeed::Profile(vec![[z.min(0.0), c], [z.max(depth_max), c]])
        },
        SoundSpeed::Profile(points) => SoundSpeed::Profile(trim_profile(points, depth_max)),
        SoundSpeed::Field(field) => {
            if soundspeed_interp == SoundSpeedInterp::Linear {
                soundspeed_interp = SoundSpeedInterp::Quadrilateral;
            }
            SoundSpeed::Field(field.clone())
        },
    };
    if soundspeed_interp == SoundSpeedInterp::Quadrilateral && !matches!(soundspeed, SoundSpeed::Field(_)) {
        return Err(BellhopError::config("quadrilateral interpolation needs a range-dependent sound speed field"));
    }

    // receivers on both sides of the source need beams fanning over the full circle
    let two_sided = min_of(&cfg.receiver_range) < 0.0;
    let (angle_span, bearing_span) = if two_sided {
        (defaults::BEAM_ANGLE_FULLSPACE, defaults::BEAM_BEARING_FULLSPACE)
    } else {
        (defaults::BEAM_ANGLE_HALFSPACE, defaults::BEAM_BEARING_HALFSPACE)
    };
    let beam_angle_min = cfg.beam_angle_min.unwrap_or(-angle_span);
    let beam_angle_max = cfg.beam_angle_max.unwrap_or(angle_span);
    let beam_bearing_min = cfg.beam_bearing_min.unwrap_or(-bearing_span);
    let beam_bearing_max = cfg.beam_bearing_max.unwrap_or(bearing_span);
    let bearing_max = beam_bearing_min.abs().max(beam_bearing_max.abs());

    let max_range = max_of(&cfg.receiver_range);
    let box_depth = cfg.box_depth.unwrap_or(defaults::BOX_PADDING * depth_max);
    let box_range = cfg.box_range.unwrap_or(defaults::BOX_PADDING * (max_range - min_of(&cfg.receiver_range).min(0.0)));
    let box_cross_range = cfg.box_cross_range.unwrap_or(defaults::BOX_PADDING * max_range * bearing_max.to_radians().sin());

    Ok(Resolved {
        depth_max,
        soundspeed,
        soundspeed_interp,
        surface_boundary_condition,
        bottom_boundary_condition,
        beam_angle_min,
        beam_angle_max,
        beam_bearing_min,
        beam_bearing_max,
        box_depth,
        box_range,
        box_cross_range,
    })
}

/// Cut a profile that runs deeper than the water column at `depth_max`,
/// interpolating the speed there
fn trim_profile(points: &[[f64; 2]], depth_max: f64) -> Vec<[f64; 2]> {
    let last = points[points.len() - 1][0];
    if last <= depth_max {
        return points.to_vec();
    }
    let larger = points.iter().position(|p| p[0] > depth_max).unwrap_or(points.len() - 1);
    if larger == 0 {
        return points.to_vec();
    }
    let [z0, c0] = points[larger - 1];
    let [z1, c1] = points[larger];
    let c = c0 + (c1 - c0) * (depth_max - z0) / (z1 - z0);

    let mut trimmed: Vec<[f64; 2]> = points[..larger].to_vec();
    if z0 < depth_max {
        trimmed.push([depth_max, c]);
    }
    warn!("Sound speed profile extends below the water depth; it was linearly interpolated to end at {} m", depth_max);
    trimmed
}

fn ensure<S: Into<String>>(condition: bool, msg: S) -> Result<(), BellhopError> {
    if condition { Ok(()) } else { Err(BellhopError::config(msg)) }
}

fn strictly_increasing<I: Iterator<Item = f64>>(values: I) -> bool {
    let mut prev = f64::NEG_INFINITY;
    for v in values {
        if !(v > prev) {
            return false;
        }
        prev = v;
    }
    true
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn count_option(key: &str) -> Option<&'static str> {
    match key {
        "source_range" => Some("source_nrange"),
        "source_cross_range" => Some("source_ncrossrange"),
        "source_depth" => Some("source_ndepth"),
        "receiver_depth" => Some("receiver_ndepth"),
        "receiver_range" => Some("receiver_nrange"),
        "receiver_bearing" => Some("receiver_nbearing"),
        _ => None
    }
}

fn value_label(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{}", f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
