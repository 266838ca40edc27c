// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::Path;

use log::debug;
use num_complex::Complex64;

use crate::errors::BellhopError;
use crate::readers::tokens::{Record, RecordReader};
use crate::results::{Arrival, Arrivals};
use crate::types::Dimension;

/// Read a Bellhop or Bellhop3D ASCII arrivals (`.arr`) file.
///
/// Every count in the file is checked against the records that follow it,
/// so a truncated file fails instead of yielding partial results.
pub fn read_arrivals(path: &Path) -> Result<Arrivals, BellhopError> {
    let mut reader = RecordReader::open(path)?;

    let tag = reader.next_record()?;
    let dimension = match tag.text(0)? {
        "2D" => Dimension::TwoD,
        "3D" => Dimension::ThreeD,
        other => return Err(tag.error(format!("expected '2D' or '3D', found `{}`", other))),
    };
    let frequency = reader.next_record()?.real(0)?;

    let (source_x, source_y) = if dimension == Dimension::ThreeD {
        (positions(&mut reader, "source x")?, positions(&mut reader, "source y")?)
    } else {
        (vec![0.0], vec![0.0])
    };
    let source_depths = positions(&mut reader, "source depth")?;
    let receiver_depths = positions(&mut reader, "receiver depth")?;
    let receiver_ranges = positions(&mut reader, "receiver range")?;
    let receiver_bearings = if dimension == Dimension::ThreeD {
        positions(&mut reader, "receiver bearing")?
    } else {
        vec![0.0]
    };

    let mut arrivals = Vec::new();
    let mut source_index = 0;
    for _ in &source_x {
        for _ in &source_y {
            for &source_depth in &source_depths {
                let max_arrivals = reader.next_record()?.count(0)?;
                for ib in 0..receiver_bearings.len() {
                    for (id, &receiver_depth) in receiver_depths.iter().enumerate() {
                        for (ir, &receiver_range) in receiver_ranges.iter().enumerate() {
                            let count_record = reader.next_record()?;
                            let count = count_record.count(0)?;
                            if count > max_arrivals {
                                return Err(count_record.error(format!(
                                    "{} arrivals exceed the declared maximum of {}", count, max_arrivals)));
                            }
                            for n in 0..count {
                                let record = reader.next_record()?;
                                let fields = parse_record(&record, dimension)?;
                                arrivals.push(Arrival {
                                    source_index,
                                    receiver_bearing_index: ib,
                                    receiver_depth_index: id,
                                    receiver_range_index: ir,
                                    arrival_number: n,
                                    source_depth,
                                    receiver_depth,
                                    receiver_range,
                                    ..fields
                                });
                            }
                        }
                    }
                }
                source_index += 1;
            }
        }
    }
    reader.expect_end()?;

    debug!("Read {} arrivals from `{}`", arrivals.len(), path.display());
    Ok(Arrivals {
        dimension,
        frequency,
        source_x,
        source_y,
        source_depths,
        receiver_depths,
        receiver_ranges,
        receiver_bearings,
        arrivals,
    })
}

/// Header line: a count followed by exactly that many positions
fn positions(reader: &mut RecordReader, what: &str) -> Result<Vec<f64>, BellhopError> {
    let (n, values) = reader.counted_reals()?;
    if values.len() != n {
        return Err(reader.error(format!("{} count is {} but {} values follow", what, n, values.len())));
    }
    if n == 0 {
        return Err(reader.error(format!("no {} positions", what)));
    }
    Ok(values)
}

fn parse_record(record: &Record, dimension: Dimension) -> Result<Arrival, BellhopError> {
    let n = if dimension == Dimension::ThreeD { 10 } else { 8 };
    let v = record.exact_reals(n)?;
    let bounces = |x: f64| -> Result<u32, BellhopError> {
        if x >= 0.0 && x.fract() == 0.0 {
            Ok(x as u32)
        } else {
            Err(record.error(format!("bounce count `{}` is not a non-negative integer", x)))
        }
    };

    let amplitude = Complex64::from_polar(v[0], v[1].to_radians());
    let complex_time_of_arrival = Complex64::new(v[2], v[3]);
    let (angle_of_departure, bearing_of_departure, angle_of_arrival, bearing_of_arrival, top, bot) =
        if dimension == Dimension::ThreeD {
            (v[4], Some(v[5]), v[6], Some(v[7]), v[8], v[9])
        } else {
            (v[4], None, v[5], None, v[6], v[7])
        };

    Ok(Arrival {
        source_index: 0,
        receiver_bearing_index: 0,
        receiver_depth_index: 0,
        receiver_range_index: 0,
        arrival_number: 0,
        source_depth: 0.0,
        receiver_depth: 0.0,
        receiver_range: 0.0,
        amplitude,
        time_of_arrival: complex_time_of_arrival.re,
        complex_time_of_arrival,
        angle_of_departure,
        angle_of_arrival,
        bearing_of_departure,
        bearing_of_arrival,
        surface_bounces: bounces(top)?,
        bottom_bounces: bounces(bot)?,
    })
}
