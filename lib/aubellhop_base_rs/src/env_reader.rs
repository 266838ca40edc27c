// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

//! Reader for Bellhop `.env` files, including the companion files they flag.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::env_writer::with_ext;
use crate::environment::{Bathymetry, EnvConfig, Environment, SoundSpeed, SoundSpeedField};
use crate::errors::BellhopError;
use crate::readers::tokens::{Record, RecordReader};
use crate::readers::{read_ati, read_brc, read_bty, read_sbp, read_ssp, read_trc};
use crate::types::*;

/// Option string of a record, padded so every position can be indexed
fn option_chars(record: &Record, width: usize) -> Result<Vec<char>, BellhopError> {
    let mut chars: Vec<char> = record.text(0)?.chars().collect();
    chars.resize(chars.len().max(width), ' ');
    Ok(chars)
}

fn decode<T, F>(record: &Record, what: &str, code: char, from_code: F) -> Result<T, BellhopError>
where F: Fn(char) -> Option<T>
{
    from_code(code).ok_or_else(|| record.error(format!("unsupported {} option `{}`", what, code)))
}

/// Companion-file flag: `*` or `~` reads the file, a blank, `_` or `-` means none
fn file_flag(record: &Record, what: &str, code: char) -> Result<bool, BellhopError> {
    match code {
        '*' | '~' => Ok(true),
        ' ' | '_' | '-' => Ok(false),
        other => Err(record.error(format!("unsupported {} option `{}`", what, other))),
    }
}

/// Half-space line: depth, compressional and shear speed, density (g/cm^3), optional attenuations
struct HalfSpace {
    soundspeed: f64,
    soundspeed_shear: f64,
    density: f64,
    attenuation: Option<f64>,
    attenuation_shear: Option<f64>,
}

fn read_halfspace(reader: &mut RecordReader) -> Result<HalfSpace, BellhopError> {
    let r = reader.next_record()?;
    Ok(HalfSpace {
        soundspeed: r.real(1)?,
        soundspeed_shear: r.opt_real(2)?.unwrap_or(0.0),
        density: r.opt_real(3)?.map_or(crate::defaults::DENSITY, |rho| rho * 1000.0),
        attenuation: r.opt_real(4)?,
        attenuation_shear: r.opt_real(5)?,
    })
}

/// Source and receiver arrays: the count is kept only when it differs from
/// the number of listed values (Bellhop then fills the range linearly)
fn read_array(reader: &mut RecordReader, scale: f64) -> Result<(Vec<f64>, Option<usize>), BellhopError> {
    let (n, values) = reader.counted_reals()?;
    if values.is_empty() {
        return Err(reader.error("array has no values"));
    }
    let values: Vec<f64> = values.iter().map(|v| v * scale).collect();
    let count = if n == values.len() { None } else { Some(n) };
    Ok((values, count))
}

/// Parse `path` as an environment of the given dimension
pub fn read_env(path: &Path, dimension: Dimension) -> Result<Environment, BellhopError> {
    let mut reader = RecordReader::open(path)?;
    let base: PathBuf = path.with_extension("");
    let mut cfg = EnvConfig { dimension, ..EnvConfig::default() };

    let title = reader.next_record()?;
    cfg.name = title.fields().join(" ");
    cfg.frequency = reader.next_record()?.real(0)?;
    let media = reader.next_record()?;
    if media.count(0)? != 1 {
        return Err(media.error("Bellhop supports exactly one medium"));
    }

    let top = reader.next_record()?;
    let topopt = option_chars(&top, 6)?;
    cfg.soundspeed_interp = decode(&top, "sound speed interpolation", topopt[0], SoundSpeedInterp::from_code)?;
    cfg.surface_boundary_condition = decode(&top, "top boundary", topopt[1], BoundaryCondition::from_code)?;
    cfg.attenuation_units = decode(&top, "attenuation units", topopt[2], AttenuationUnits::from_code)?;
    cfg.volume_attenuation = decode(&top, "volume attenuation", topopt[3], VolumeAttenuation::from_code)?;
    let has_altimetry = file_flag(&top, "altimetry", topopt[4])?;
    let single_beam = topopt[5] == 'I';

    if cfg.volume_attenuation == VolumeAttenuation::FrancoisGarrison {
        let fg = reader.next_record()?;
        cfg.fg_salinity = Some(fg.real(0)?);
        cfg.fg_temperature = Some(fg.real(1)?);
        cfg.fg_ph = Some(fg.real(2)?);
        cfg.fg_depth = Some(fg.real(3)?);
    }
    if cfg.volume_attenuation == VolumeAttenuation::Biological {
        let n = reader.next_record()?.count(0)?;
        let mut layers = Vec::with_capacity(n);
        for _ in 0..n {
            let v = reader.next_record()?.exact_reals(5)?;
            layers.push([v[0], v[1], v[2], v[3], v[4]]);
        }
        cfg.biological_layer_parameters = Some(layers);
    }
    if cfg.surface_boundary_condition == BoundaryCondition::AcoustoElastic {
        let hs = read_halfspace(&mut reader)?;
        cfg.surface_soundspeed = hs.soundspeed;
        cfg.surface_soundspeed_shear = hs.soundspeed_shear;
        cfg.surface_density = hs.density;
        cfg.surface_attenuation = hs.attenuation;
        cfg.surface_attenuation_shear = hs.attenuation_shear;
    }

    let ssp_header = reader.next_record()?;
    cfg.mesh_npts = ssp_header.count(0)?;
    cfg.depth_sigma = ssp_header.real(1)?;
    let depth_max = ssp_header.real(2)?;

    // profile rows run until the one at the water depth
    let mut profile: Vec<[f64; 2]> = Vec::new();
    loop {
        let row = reader.next_record()?;
        let z = row.real(0)?;
        let c = row.real(1)?;
        profile.push([z, c]);
        if z >= depth_max {
            break;
        }
    }

    let bottom = reader.next_record()?;
    let botopt = option_chars(&bottom, 2)?;
    cfg.bottom_boundary_condition = decode(&bottom, "bottom boundary", botopt[0], BoundaryCondition::from_code)?;
    let has_bathymetry = file_flag(&bottom, "bathymetry", botopt[1])?;
    cfg.bottom_roughness = bottom.opt_real(1)?.unwrap_or(0.0);
    if cfg.bottom_boundary_condition == BoundaryCondition::AcoustoElastic {
        let hs = read_halfspace(&mut reader)?;
        cfg.bottom_soundspeed = hs.soundspeed;
        cfg.bottom_soundspeed_shear = hs.soundspeed_shear;
        cfg.bottom_density = hs.density;
        cfg.bottom_attenuation = hs.attenuation;
        cfg.bottom_attenuation_shear = hs.attenuation_shear;
    }

    if dimension.dim() == 3 {
        let (v, n) = read_array(&mut reader, 1000.0)?;
        cfg.source_range = v;
        cfg.source_nrange = n;
        let (v, n) = read_array(&mut reader, 1000.0)?;
        cfg.source_cross_range = v;
        cfg.source_ncrossrange = n;
    }
    let (v, n) = read_array(&mut reader, 1.0)?;
    cfg.source_depth = v;
    cfg.source_ndepth = n;
    let (v, n) = read_array(&mut reader, 1.0)?;
    cfg.receiver_depth = v;
    cfg.receiver_ndepth = n;
    let (v, n) = read_array(&mut reader, 1000.0)?;
    cfg.receiver_range = v;
    cfg.receiver_nrange = n;
    if dimension.dim() == 3 {
        let (v, n) = read_array(&mut reader, 1.0)?;
        cfg.receiver_bearing = v;
        cfg.receiver_nbearing = n;
    }

    let run = reader.next_record()?;
    let runtype = option_chars(&run, 5)?;
    cfg.task = Task::from_code(runtype[0]);
    if cfg.task.is_none() {
        warn!("Run type `{}` in `{}` has no supported task; choose one when computing", runtype[0], path.display());
    }
    cfg.beam_type = decode(&run, "beam type", runtype[1], BeamType::from_code)?;
    let has_pattern = runtype[2] == '*';
    cfg.source_type = decode(&run, "source type", runtype[3], SourceType::from_code)?;
    cfg.grid_type = decode(&run, "grid type", runtype[4], GridType::from_code)?;

    let beams = reader.next_record()?;
    cfg.beam_num = beams.count(0)?;
    if single_beam {
        if beams.len() < 2 {
            return Err(beams.error("single beam was requested with option I but no index was given"));
        }
        cfg.single_beam_index = Some(beams.count(1)?);
    }
    let angles = reader.next_record()?;
    cfg.beam_angle_min = Some(angles.real(0)?);
    cfg.beam_angle_max = Some(angles.real(1)?);

    if dimension.dim() == 3 {
        cfg.beam_bearing_num = reader.next_record()?.count(0)?;
        let bearings = reader.next_record()?;
        cfg.beam_bearing_min = Some(bearings.real(0)?);
        cfg.beam_bearing_max = Some(bearings.real(1)?);
        let bx = reader.next_record()?;
        cfg.step_size = bx.real(0)?;
        cfg.box_range = Some(bx.real(1)? * 1000.0);
        cfg.box_cross_range = Some(bx.real(2)? * 1000.0);
        cfg.box_depth = Some(bx.real(3)?);
    } else {
        let bx = reader.next_record()?;
        cfg.step_size = bx.real(0)?;
        cfg.box_depth = Some(bx.real(1)?);
        cfg.box_range = Some(bx.real(2)? * 1000.0);
    }
    if let Some(extra) = reader.peek() {
        warn!("Ignoring data after the box line of `{}` (line {})", path.display(), extra.number());
    }

    // companion files
    if has_altimetry {
        let ati = read_ati(&with_ext(&base, FileExt::ATI))?;
        cfg.surface_interp = ati.interp;
        cfg.surface = Some(ati.points);
    }
    if cfg.surface_boundary_condition == BoundaryCondition::FromFile {
        cfg.surface_reflection_coefficient = Some(read_trc(&with_ext(&base, FileExt::TRC))?);
    }
    if has_bathymetry {
        let bty = read_bty(&with_ext(&base, FileExt::BTY))?;
        cfg.depth_interp = bty.interp;
        cfg.depth = Bathymetry::Profile(bty.points);
        cfg.depth_max = Some(depth_max);
    } else {
        cfg.depth = Bathymetry::Flat(depth_max);
    }
    if cfg.bottom_boundary_condition == BoundaryCondition::FromFile {
        cfg.bottom_reflection_coefficient = Some(read_brc(&with_ext(&base, FileExt::BRC))?);
    }
    if has_pattern {
        cfg.source_directionality = Some(read_sbp(&with_ext(&base, FileExt::SBP))?);
    }
    cfg.soundspeed = if cfg.soundspeed_interp == SoundSpeedInterp::Quadrilateral {
        let ssp_path = with_ext(&base, FileExt::SSP);
        let table = read_ssp(&ssp_path)?;
        if table.speeds.len() != profile.len() {
            return Err(BellhopError::parse(&ssp_path, 0, format!(
                "{} sound speed rows for {} profile depths", table.speeds.len(), profile.len())));
        }
        SoundSpeed::Field(SoundSpeedField {
            ranges: table.ranges,
            depths: profile.iter().map(|p| p[0]).collect(),
            speeds: table.speeds,
        })
    } else {
        SoundSpeed::Profile(profile)
    };

    debug!("Parsed `{}` ({} task)", path.display(), cfg.task.map_or("no", |t| t.name()));
    Environment::new(cfg)
}
