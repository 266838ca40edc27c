// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

//! Writer for Bellhop's `.env` input file and its companion files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::environment::{Bathymetry, Environment, SoundSpeed, SoundSpeedField};
use crate::errors::BellhopError;
use crate::types::*;

/// Format a real the way the `.env` grammar expects it (always with a decimal point)
pub fn fmt_real(v: f64) -> String {
    format!("{:?}", v)
}

fn fmt_reals(values: &[f64]) -> String {
    values.iter().map(|v| fmt_real(*v)).collect::<Vec<_>>().join(" ")
}

/// Values up to the first missing one, terminated by `/`
fn slash_list(values: &[Option<f64>]) -> String {
    let present: Vec<f64> = values.iter().take_while(|v| v.is_some()).flatten().copied().collect();
    let mut s = fmt_reals(&present);
    s.push_str(" /");
    s
}

/// Option string: codes concatenated, outer blanks trimmed, single-quoted.
/// Inner blanks are kept since Bellhop reads the codes by position.
fn quoted_opt(codes: &[char]) -> String {
    let combined: String = codes.iter().collect();
    format!("'{}'", combined.trim())
}

struct EnvLines<'a, W: Write> {
    out: &'a mut W,
    pad: usize,
}

impl<'a, W: Write> EnvLines<'a, W> {
    fn line(&mut self, data: &str, comment: &str) -> std::io::Result<()> {
        if comment.is_empty() {
            writeln!(self.out, "{}", data)
        } else {
            writeln!(self.out, "{:<width$} ! {}", data, comment, width = self.pad)
        }
    }

    fn blank(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "{:width$}", "", width = self.pad)
    }

    fn array(&mut self, values: &[f64], count: Option<usize>, label: &str) -> std::io::Result<()> {
        let n = count.unwrap_or(values.len());
        if n == 1 || values.len() == 1 {
            let comment = format!("{} (single value)", label);
            self.line("1", &comment)?;
            let v = values.first().copied().unwrap_or_default();
            self.line(&format!("{} /", fmt_real(v)), &comment)
        } else {
            self.line(&n.to_string(), &format!("{}s ({} values)", label, n))?;
            writeln!(self.out, "{} /", fmt_reals(values))
        }
    }
}

/// Write the `.env` text for `env` running `task`
pub fn write_env<W: Write>(env: &Environment, task: Task, out: &mut W) -> Result<(), BellhopError> {
    let cfg = env.config();
    let mut w = EnvLines { out, pad: cfg.comment_pad };

    w.line(&format!("'{}'", cfg.name), "Bellhop environment name/description")?;
    w.line(&fmt_real(cfg.frequency), "Frequency (Hz)")?;
    w.line("1", "NMedia -- always =1 for Bellhop")?;
    w.blank()?;

    // surface and volume options
    let topopt = quoted_opt(&[
        env.soundspeed_interp().code(),
        env.surface_boundary_condition().code(),
        cfg.attenuation_units.code(),
        cfg.volume_attenuation.code(),
        if env.has_altimetry_file() { '*' } else { ' ' },
        if cfg.single_beam_index.is_some() { 'I' } else { ' ' },
    ]);
    w.line(&topopt, "SSP parameters: Interp / Top Boundary Cond / Attenuation Units / Volume Attenuation)")?;

    if cfg.volume_attenuation == VolumeAttenuation::FrancoisGarrison {
        let fg = slash_list(&[cfg.fg_salinity, cfg.fg_temperature, cfg.fg_ph, cfg.fg_depth]);
        w.line(fg.trim_end_matches(" /"), "Francois-Garrison volume attenuation parameters (sal, temp, pH, depth)")?;
    }

    if let (VolumeAttenuation::Biological, Some(layers)) = (cfg.volume_attenuation, &cfg.biological_layer_parameters) {
        w.line(&layers.len().to_string(), "N_Biol_Layers / z1 z2 w0 Q a0")?;
        for (j, row) in layers.iter().enumerate() {
            let data = slash_list(&row.iter().map(|v| Some(*v)).collect::<Vec<_>>());
            w.line(&data, &format!("biol_{}", j))?;
        }
    }

    if env.surface_boundary_condition() == BoundaryCondition::AcoustoElastic {
        let halfspace = slash_list(&[
            Some(0.0),
            Some(cfg.surface_soundspeed),
            Some(cfg.surface_soundspeed_shear),
            Some(cfg.surface_density / 1000.0),
            cfg.surface_attenuation,
            cfg.surface_attenuation_shear,
        ]);
        w.line(&halfspace, "DEPTH_Top (m)  TOP_SoundSpeed (m/s)  TOP_SoundSpeed_Shear (m/s)  TOP_Density (g/cm^3)  [ TOP_Absorp [ TOP_Absorp_Shear ] ]")?;
    }

    w.line(&format!("{} {} {}", cfg.mesh_npts, fmt_real(cfg.depth_sigma), fmt_real(env.depth_max())),
        "[Npts - ignored]  [Sigma - ignored]  Depth_Max")?;
    for (j, [z, c]) in env.soundspeed_profile().iter().enumerate() {
        w.line(&slash_list(&[Some(*z), Some(*c)]), &format!("ssp_{}", j))?;
    }
    w.blank()?;

    let botopt = quoted_opt(&[
        env.bottom_boundary_condition().code(),
        if env.has_bathymetry_file() { '*' } else { ' ' },
    ]);
    w.line(&format!("{} {}", botopt, fmt_real(cfg.bottom_roughness)), "BOT_Boundary_cond / BOT_Roughness")?;
    if env.bottom_boundary_condition() == BoundaryCondition::AcoustoElastic {
        let halfspace = slash_list(&[
            Some(env.depth_max()),
            Some(cfg.bottom_soundspeed),
            Some(cfg.bottom_soundspeed_shear),
            Some(cfg.bottom_density / 1000.0),
            cfg.bottom_attenuation,
            cfg.bottom_attenuation_shear,
        ]);
        w.line(&halfspace, "Depth_Max  BOT_SoundSpeed  BOT_SS_Shear  BOT_Density  BOT_Absorp  BOT_Absorp Shear")?;
    }
    w.blank()?;

    let km = |v: &Vec<f64>| v.iter().map(|r| r / 1000.0).collect::<Vec<f64>>();
    if env.dim() == 3 {
        w.array(&km(&cfg.source_range), cfg.source_nrange, "Source range (km)")?;
        w.array(&km(&cfg.source_cross_range), cfg.source_ncrossrange, "Source cross range (km)")?;
    }
    w.array(&cfg.source_depth, cfg.source_ndepth, "Source depth (m)")?;
    w.array(&cfg.receiver_depth, cfg.receiver_ndepth, "Receiver depth (m)")?;
    w.array(&km(&cfg.receiver_range), cfg.receiver_nrange, "Receiver range (km)")?;
    if env.dim() == 3 {
        w.array(&cfg.receiver_bearing, cfg.receiver_nbearing, "Receiver bearing (deg)")?;
    }
    w.blank()?;

    let runtype = quoted_opt(&[
        task.code(),
        cfg.beam_type.code(),
        if cfg.source_directionality.is_some() { '*' } else { ' ' },
        cfg.source_type.code(),
        cfg.grid_type.code(),
    ]);
    w.line(&runtype, "RUN TYPE")?;

    let beams = match cfg.single_beam_index {
        Some(index) => format!("{} {} /", cfg.beam_num, index),
        None => format!("{} /", cfg.beam_num),
    };
    w.line(&beams, "Num_Beams_Inclination [ Single_Beam_Index ]")?;
    let (amin, amax) = env.beam_angles();
    w.line(&slash_list(&[Some(amin), Some(amax)]), "Inclination angle min/max (deg)")?;

    if env.dim() == 3 {
        let (bmin, bmax) = env.beam_bearings();
        w.line(&cfg.beam_bearing_num.to_string(), "Num_Beams_Bearing")?;
        w.line(&slash_list(&[Some(bmin), Some(bmax)]), "Bearing angle min/max (deg)")?;
        w.line(&format!("{} {} {} {}", fmt_real(cfg.step_size), fmt_real(env.box_range() / 1000.0),
                fmt_real(env.box_cross_range() / 1000.0), fmt_real(env.box_depth())),
            "Step_Size (m), BoxRange (x) (km), BoxCrossRange (y) (km), BoxDepth (z) (m)")?;
    } else {
        w.line(&format!("{} {} {}", fmt_real(cfg.step_size), fmt_real(env.box_depth()), fmt_real(env.box_range() / 1000.0)),
            "Step_Size (m), ZBOX (m), RBOX (km)")?;
    }
    w.line("", "End of Bellhop environment file")?;
    Ok(())
}

/// Write `<base>.env` plus the companion files the environment needs.
/// Returns every path written, the `.env` file first.
pub fn write_env_files(env: &Environment, task: Task, base: &Path) -> Result<Vec<PathBuf>, BellhopError> {
    let cfg = env.config();
    let env_path = with_ext(base, FileExt::ENV);
    write_file(&env_path, |out| write_env(env, task, out))?;
    let mut written = vec![env_path];

    if env.surface_boundary_condition() == BoundaryCondition::FromFile {
        if let Some(rc) = &cfg.surface_reflection_coefficient {
            written.push(write_aux(base, FileExt::TRC, |out| write_reflection_coefficients(rc, out))?);
        }
    }
    if let Some(surface) = &cfg.surface {
        written.push(write_aux(base, FileExt::ATI, |out| write_boundary_curve(cfg.surface_interp, surface, out))?);
    }
    if let SoundSpeed::Field(field) = env.soundspeed() {
        written.push(write_aux(base, FileExt::SSP, |out| write_ssp_field(field, out))?);
    }
    if let Bathymetry::Profile(points) = &cfg.depth {
        written.push(write_aux(base, FileExt::BTY, |out| write_boundary_curve(cfg.depth_interp, points, out))?);
    }
    if env.bottom_boundary_condition() == BoundaryCondition::FromFile {
        if let Some(rc) = &cfg.bottom_reflection_coefficient {
            written.push(write_aux(base, FileExt::BRC, |out| write_reflection_coefficients(rc, out))?);
        }
    }
    if let Some(dir) = &cfg.source_directionality {
        written.push(write_aux(base, FileExt::SBP, |out| write_beam_pattern(dir, out))?);
    }

    debug!("Wrote {} input file(s) for `{}`", written.len(), base.display());
    Ok(written)
}

/// `.bty`/`.ati` table: interpolation code, count, then `range (km) depth (m)` rows
pub fn write_boundary_curve<W: Write>(interp: CurveInterp, points: &[[f64; 2]], out: &mut W) -> Result<(), BellhopError> {
    writeln!(out, "'{}'", interp.code())?;
    writeln!(out, "{}", points.len())?;
    for [r, z] in points {
        writeln!(out, "{} {}", fmt_real(r / 1000.0), fmt_real(*z))?;
    }
    Ok(())
}

/// `.sbp` table: count, then `angle (deg)  level (dB)` rows
pub fn write_beam_pattern<W: Write>(pattern: &[[f64; 2]], out: &mut W) -> Result<(), BellhopError> {
    writeln!(out, "{}", pattern.len())?;
    for [angle, level] in pattern {
        writeln!(out, "{}  {}", fmt_real(*angle), fmt_real(*level))?;
    }
    Ok(())
}

/// `.trc`/`.brc` table: count, then `angle  magnitude  phase` rows
pub fn write_reflection_coefficients<W: Write>(rc: &[[f64; 3]], out: &mut W) -> Result<(), BellhopError> {
    writeln!(out, "{}", rc.len())?;
    for [theta, mag, phase] in rc {
        writeln!(out, "{}  {}  {}", fmt_real(*theta), fmt_real(*mag), fmt_real(*phase))?;
    }
    Ok(())
}

/// `.ssp` table for quadrilateral interpolation: range count, ranges (km), then one row per depth
pub fn write_ssp_field<W: Write>(field: &SoundSpeedField, out: &mut W) -> Result<(), BellhopError> {
    fn fixed<I: Iterator<Item = f64>>(values: I) -> String {
        values.map(|v| format!("{:.6}", v)).collect::<Vec<_>>().join(" ")
    }
    writeln!(out, "{}", field.ranges.len())?;
    writeln!(out, "{}", fixed(field.ranges.iter().map(|r| r / 1000.0)))?;
    for row in &field.speeds {
        writeln!(out, "{}", fixed(row.iter().copied()))?;
    }
    Ok(())
}

pub(crate) fn with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(ext);
    PathBuf::from(s)
}

fn write_file<F>(path: &Path, body: F) -> Result<(), BellhopError>
where F: FnOnce(&mut BufWriter<File>) -> Result<(), BellhopError>
{
    let file = File::create(path)
        .map_err(|source| BellhopError::FileError { path: path.to_path_buf(), source })?;
    let mut out = BufWriter::new(file);
    body(&mut out)?;
    out.flush()
        .map_err(|source| BellhopError::FileError { path: path.to_path_buf(), source })?;
    Ok(())
}

fn write_aux<F>(base: &Path, ext: &str, body: F) -> Result<PathBuf, BellhopError>
where F: FnOnce(&mut BufWriter<File>) -> Result<(), BellhopError>
{
    let path = with_ext(base, ext);
    write_file(&path, body)?;
    Ok(path)
}
