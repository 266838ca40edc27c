// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use num_complex::Complex64;
use serde::Serialize;

use crate::types::Dimension;

/// Contents of a `.arr` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrivals {
    pub dimension: Dimension,
    /// Hz
    pub frequency: f64,
    /// Source positions (m); only 3-D files carry x and y
    pub source_x: Vec<f64>,
    pub source_y: Vec<f64>,
    pub source_depths: Vec<f64>,
    pub receiver_depths: Vec<f64>,
    pub receiver_ranges: Vec<f64>,
    /// deg; 3-D only
    pub receiver_bearings: Vec<f64>,
    pub arrivals: Vec<Arrival>,
}

impl Arrivals {
    /// Arrivals at one receiver, in file order
    pub fn at_receiver(&self, depth_index: usize, range_index: usize) -> impl Iterator<Item = &Arrival> {
        self.arrivals.iter()
            .filter(move |a| a.receiver_depth_index == depth_index && a.receiver_range_index == range_index)
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }
}

/// One eigenray arriving at a receiver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrival {
    pub source_index: usize,
    pub receiver_bearing_index: usize,
    pub receiver_depth_index: usize,
    pub receiver_range_index: usize,
    /// Counts from 0 within its receiver
    pub arrival_number: usize,
    pub source_depth: f64,
    pub receiver_depth: f64,
    pub receiver_range: f64,
    /// Complex pressure amplitude
    pub amplitude: Complex64,
    /// s
    pub time_of_arrival: f64,
    /// Real and imaginary delay (s); the imaginary part is the beam's damping
    pub complex_time_of_arrival: Complex64,
    /// deg
    pub angle_of_departure: f64,
    pub angle_of_arrival: f64,
    pub bearing_of_departure: Option<f64>,
    pub bearing_of_arrival: Option<f64>,
    pub surface_bounces: u32,
    pub bottom_bounces: u32,
}

/// One ray path from a `.ray` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ray {
    /// deg
    pub angle_of_departure: f64,
    pub surface_bounces: u32,
    pub bottom_bounces: u32,
    /// `[range, depth]` in 2-D files, `[x, y, depth]` in 3-D files (m)
    pub points: Vec<Vec<f64>>,
}

impl Ray {
    /// Depth is always the last coordinate
    pub fn depths(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.last().copied())
    }

    /// Horizontal distance from the origin of each point
    pub fn ranges(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| match p.as_slice() {
            [x, y, _] => x.hypot(*y),
            [r, ..] => *r,
            [] => 0.0,
        })
    }
}

/// Rays of a `.ray` file with the header values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RayFan {
    pub title: String,
    pub frequency: f64,
    pub dimension: Dimension,
    /// Source positions per axis (x, y, depth)
    pub source_counts: Vec<usize>,
    /// Launch angles and bearings of the fan
    pub beam_counts: Vec<usize>,
    pub depth_top: f64,
    pub depth_bottom: f64,
    pub rays: Vec<Ray>,
}
