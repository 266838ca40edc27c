// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::Path;

use log::debug;

use crate::errors::BellhopError;
use crate::readers::tokens::{Record, RecordReader};
use crate::results::{Ray, RayFan};
use crate::types::Dimension;

/// Every field of a header record as a count
fn header_counts(record: &Record) -> Result<Vec<usize>, BellhopError> {
    (0..record.len().max(1)).map(|i| record.count(i)).collect()
}

/// Read a ray (`.ray`) file written for the rays or eigenrays task.
///
/// The header is seven records: title, frequency, source counts, beam
/// counts, top and bottom depth, and the coordinate tag (`rz` or `xyz`).
pub fn read_rays(path: &Path) -> Result<RayFan, BellhopError> {
    let mut reader = RecordReader::open(path)?;

    let title = reader.next_record()?.text(0)?.trim().to_string();
    let frequency = reader.next_record()?.real(0)?;
    let source_counts = header_counts(&reader.next_record()?)?;
    let beams = reader.next_record()?;
    let beam_counts = header_counts(&beams)?;
    let depth_top = reader.next_record()?.real(0)?;
    let depth_bottom = reader.next_record()?.real(0)?;
    let tag = reader.next_record()?;
    let (dimension, ncoords) = match tag.text(0)? {
        "rz" => (Dimension::TwoD, 2),
        "xyz" => (Dimension::ThreeD, 3),
        other => return Err(tag.error(format!("expected 'rz' or 'xyz', found `{}`", other))),
    };

    let max_rays: usize = source_counts.iter().chain(beam_counts.iter()).product();
    let mut rays = Vec::new();
    while let Some(next) = reader.peek() {
        if rays.len() == max_rays {
            return Err(next.error(format!(
                "more rays than the {} declared by the source and beam counts on line {}", max_rays, beams.number())));
        }
        let angle_of_departure = reader.next_record()?.real(0)?;
        let counts = reader.next_record()?;
        let npoints = counts.count(0)?;
        let surface_bounces = counts.count(1)? as u32;
        let bottom_bounces = counts.count(2)? as u32;

        let mut points = Vec::with_capacity(npoints);
        for _ in 0..npoints {
            points.push(reader.next_record()?.exact_reals(ncoords)?);
        }
        rays.push(Ray { angle_of_departure, surface_bounces, bottom_bounces, points });
    }

    debug!("Read {} rays from `{}`", rays.len(), path.display());
    Ok(RayFan { title, frequency, dimension, source_counts, beam_counts, depth_top, depth_bottom, rays })
}
