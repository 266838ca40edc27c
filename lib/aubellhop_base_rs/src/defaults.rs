// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use once_cell::sync::Lazy;

use crate::environment::{Bathymetry, EnvConfig, SoundSpeed};
use crate::types::*;

pub const SOUND_SPEED: f64 = 1500.0;
pub const BOTTOM_SOUND_SPEED: f64 = 1600.0;
/// kg/m^3; the `.env` file carries g/cm^3
pub const DENSITY: f64 = 1600.0;

pub const BEAM_ANGLE_HALFSPACE: f64 = 90.0;
pub const BEAM_ANGLE_FULLSPACE: f64 = 180.0;
pub const BEAM_BEARING_HALFSPACE: f64 = 90.0;
pub const BEAM_BEARING_FULLSPACE: f64 = 180.0;

/// Box extents are padded so rays reaching the last receiver are not cut off
pub const BOX_PADDING: f64 = 1.01;

/// Column at which the trailing `!` comments of the `.env` file start
pub const ENV_COMMENT_PAD: usize = 50;

pub const MODEL_NAME_2D: &str = "bellhop";
pub const MODEL_EXE_2D: &str = "bellhop.exe";
pub const MODEL_NAME_3D: &str = "bellhop3d";
pub const MODEL_EXE_3D: &str = "bellhop3d.exe";

/// Process-wide defaults for every environment option; read-only after first use
pub static DEFAULTS: Lazy<EnvConfig> = Lazy::new(default_config);

fn default_config() -> EnvConfig {
    EnvConfig {
        name: "bellhop/rust default".to_string(),
        dimension: Dimension::TwoD,
        frequency: 25000.0,
        task: None,

        soundspeed: SoundSpeed::Constant(SOUND_SPEED),
        soundspeed_interp: SoundSpeedInterp::Linear,

        depth: Bathymetry::Flat(25.0),
        depth_interp: CurveInterp::Linear,
        depth_max: None,
        mesh_npts: 0,
        depth_sigma: 0.0,

        bottom_soundspeed: BOTTOM_SOUND_SPEED,
        bottom_soundspeed_shear: 0.0,
        bottom_density: DENSITY,
        bottom_attenuation: None,
        bottom_attenuation_shear: None,
        bottom_roughness: 0.0,
        bottom_boundary_condition: BoundaryCondition::AcoustoElastic,
        bottom_reflection_coefficient: None,

        surface: None,
        surface_interp: CurveInterp::Linear,
        surface_boundary_condition: BoundaryCondition::Vacuum,
        surface_reflection_coefficient: None,
        surface_soundspeed: SOUND_SPEED,
        surface_soundspeed_shear: 0.0,
        surface_density: DENSITY,
        surface_attenuation: None,
        surface_attenuation_shear: None,

        source_type: SourceType::Default,
        source_range: vec![0.0],
        source_cross_range: vec![0.0],
        source_depth: vec![5.0],
        source_nrange: None,
        source_ncrossrange: None,
        source_ndepth: None,
        source_directionality: None,

        receiver_depth: vec![10.0],
        receiver_range: vec![1000.0],
        receiver_bearing: vec![0.0],
        receiver_ndepth: None,
        receiver_nrange: None,
        receiver_nbearing: None,

        beam_type: BeamType::Default,
        beam_angle_min: None,
        beam_angle_max: None,
        beam_bearing_min: None,
        beam_bearing_max: None,
        beam_num: 0,
        beam_bearing_num: 0,
        single_beam_index: None,

        step_size: 0.0,
        box_depth: None,
        box_range: None,
        box_cross_range: None,
        grid_type: GridType::Default,

        volume_attenuation: VolumeAttenuation::Off,
        attenuation_units: AttenuationUnits::DbPerWavelength,
        biological_layer_parameters: None,
        fg_salinity: None,
        fg_temperature: None,
        fg_ph: None,
        fg_depth: None,

        comment_pad: ENV_COMMENT_PAD,
    }
}
