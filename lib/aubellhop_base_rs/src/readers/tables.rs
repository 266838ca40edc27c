// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

//! Readers for the companion input files of an environment.

use std::path::Path;

use crate::errors::BellhopError;
use crate::readers::tokens::RecordReader;
use crate::types::CurveInterp;

/// Bathymetry or altimetry table, ranges converted to metres
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCurve {
    pub interp: CurveInterp,
    /// `[range (m), depth (m)]`
    pub points: Vec<[f64; 2]>,
}

/// Range-dependent sound speed table of a `.ssp` file
#[derive(Debug, Clone, PartialEq)]
pub struct SspTable {
    /// m
    pub ranges: Vec<f64>,
    /// One row per depth of the `.env` profile, one value per range
    pub speeds: Vec<Vec<f64>>,
}

/// Read a bathymetry (`.bty`) file
pub fn read_bty(path: &Path) -> Result<BoundaryCurve, BellhopError> {
    read_boundary_curve(path)
}

/// Read an altimetry (`.ati`) file
pub fn read_ati(path: &Path) -> Result<BoundaryCurve, BellhopError> {
    read_boundary_curve(path)
}

fn read_boundary_curve(path: &Path) -> Result<BoundaryCurve, BellhopError> {
    let mut reader = RecordReader::open(path)?;
    let opt = reader.next_record()?;
    let code = opt.text(0)?.chars().next().unwrap_or(' ');
    let interp = CurveInterp::from_code(code)
        .ok_or_else(|| opt.error(format!("unknown interpolation option `{}`", code)))?;

    let n = reader.next_record()?.count(0)?;
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        let row = reader.next_record()?;
        // the long format ('LL') appends geoacoustic columns, which are not kept
        if row.len() < 2 {
            return Err(row.error("expected range and depth"));
        }
        points.push([row.real(0)? * 1000.0, row.real(1)?]);
    }
    reader.expect_end()?;
    Ok(BoundaryCurve { interp, points })
}

/// Read a sound speed (`.ssp`) file used with quadrilateral interpolation
pub fn read_ssp(path: &Path) -> Result<SspTable, BellhopError> {
    let mut reader = RecordReader::open(path)?;
    let nr = reader.next_record()?.count(0)?;
    if nr == 0 {
        return Err(reader.error("sound speed table needs at least one range"));
    }
    let ranges_km = reader.reals_until(nr)?;
    if ranges_km.len() != nr {
        return Err(reader.error(format!("expected {} ranges, found {}", nr, ranges_km.len())));
    }

    let mut speeds = Vec::new();
    while !reader.is_exhausted() {
        let row = reader.reals_until(nr)?;
        if row.len() != nr {
            return Err(reader.error(format!("expected {} sound speeds per depth, found {}", nr, row.len())));
        }
        speeds.push(row);
    }
    Ok(SspTable { ranges: ranges_km.iter().map(|r| r * 1000.0).collect(), speeds })
}

/// Read a source beam pattern (`.sbp`) file: `[angle (deg), level (dB)]` rows
pub fn read_sbp(path: &Path) -> Result<Vec<[f64; 2]>, BellhopError> {
    let mut reader = RecordReader::open(path)?;
    let n = reader.next_record()?.count(0)?;
    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        let v = reader.next_record()?.exact_reals(2)?;
        rows.push([v[0], v[1]]);
    }
    reader.expect_end()?;
    Ok(rows)
}

/// Read a top reflection coefficient (`.trc`) file
pub fn read_trc(path: &Path) -> Result<Vec<[f64; 3]>, BellhopError> {
    read_reflection_coefficients(path)
}

/// Read a bottom reflection coefficient (`.brc`) file
pub fn read_brc(path: &Path) -> Result<Vec<[f64; 3]>, BellhopError> {
    read_reflection_coefficients(path)
}

fn read_reflection_coefficients(path: &Path) -> Result<Vec<[f64; 3]>, BellhopError> {
    let mut reader = RecordReader::open(path)?;
    let n = reader.next_record()?.count(0)?;
    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        let v = reader.next_record()?.exact_reals(3)?;
        rows.push([v[0], v[1], v[2]]);
    }
    reader.expect_end()?;
    Ok(rows)
}
