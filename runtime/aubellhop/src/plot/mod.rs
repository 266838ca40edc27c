// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use num_complex::Complex64;

use aubellhop_base::results::{Arrivals, RayFan};
use aubellhop_base::{Bathymetry, Environment};

use crate::errors::AubellhopError;

mod csv_backend;
mod plotly_backend;

pub use csv_backend::CsvBackend;
pub use plotly_backend::PlotlyBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Lines,
    Markers,
}

/// One named curve of a figure
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub style: Style,
    pub color: Option<&'static str>,
}

impl Series {
    pub fn lines(name: &str, x: Vec<f64>, y: Vec<f64>) -> Series {
        Series { name: name.to_string(), x, y, style: Style::Lines, color: None }
    }

    pub fn markers(name: &str, x: Vec<f64>, y: Vec<f64>) -> Series {
        Series { name: name.to_string(), x, y, style: Style::Markers, color: None }
    }

    pub fn color(mut self, color: &'static str) -> Series {
        self.color = Some(color);
        self
    }
}

/// Back-end independent description of a plot
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// y values are depths, increasing downwards
    pub y_is_depth: bool,
}

impl Figure {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Figure {
        Figure {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
            y_is_depth: false,
        }
    }

    pub fn depth_axis(mut self) -> Figure {
        self.y_is_depth = true;
        self
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.x.is_empty())
    }
}

/// Renders figures to files
pub trait PlotBackend {
    /// Write `fig` next to `stem`; returns the file written
    fn render(&self, fig: &Figure, stem: &Path) -> Result<PathBuf, AubellhopError>;

    fn plot_rays(&self, fan: &RayFan, stem: &Path) -> Result<PathBuf, AubellhopError> {
        self.render(&rays_figure(fan), stem)
    }

    fn plot_arrivals(&self, arrivals: &Arrivals, stem: &Path) -> Result<PathBuf, AubellhopError> {
        self.render(&arrivals_figure(arrivals), stem)
    }

    fn plot_soundspeed(&self, env: &Environment, stem: &Path) -> Result<PathBuf, AubellhopError> {
        self.render(&soundspeed_figure(env), stem)
    }

    fn plot_environment(&self, env: &Environment, stem: &Path) -> Result<PathBuf, AubellhopError> {
        self.render(&environment_figure(env), stem)
    }
}

/// Colour by boundary interaction: red direct, green surface only, blue
/// bottom only, black both
pub fn ray_color(surface_bounces: u32, bottom_bounces: u32) -> &'static str {
    match (surface_bounces > 0, bottom_bounces > 0) {
        (false, false) => "red",
        (true, false) => "green",
        (false, true) => "blue",
        (true, true) => "black",
    }
}

pub fn rays_figure(fan: &RayFan) -> Figure {
    let mut fig = Figure::new(&fan.title, "Range (m)", "Depth (m)").depth_axis();
    for ray in &fan.rays {
        let name = format!("{:.2} deg", ray.angle_of_departure);
        fig.push(Series::lines(&name, ray.ranges().collect(), ray.depths().collect())
            .color(ray_color(ray.surface_bounces, ray.bottom_bounces)));
    }
    fig
}

/// Arrival amplitude over time, one series per receiver
pub fn arrivals_figure(arrivals: &Arrivals) -> Figure {
    let mut fig = Figure::new("Arrivals", "Arrival time (s)", "Amplitude");
    for (di, depth) in arrivals.receiver_depths.iter().enumerate() {
        for (ri, range) in arrivals.receiver_ranges.iter().enumerate() {
            let (t, a): (Vec<f64>, Vec<f64>) = arrivals.at_receiver(di, ri)
                .map(|arr| (arr.time_of_arrival, arr.amplitude.norm()))
                .unzip();
            if !t.is_empty() {
                fig.push(Series::markers(&format!("rd {} m, rr {} m", depth, range), t, a));
            }
        }
    }
    fig
}

pub fn soundspeed_figure(env: &Environment) -> Figure {
    let mut fig = Figure::new(&format!("Sound speed: {}", env.name()), "Sound speed (m/s)", "Depth (m)").depth_axis();
    let (z, c): (Vec<f64>, Vec<f64>) = env.soundspeed_profile().iter().map(|p| (p[0], p[1])).unzip();
    fig.push(Series::lines("soundspeed", c, z));
    fig
}

/// Surface, bottom, sources and receivers in the range/depth plane
pub fn environment_figure(env: &Environment) -> Figure {
    let cfg = env.config();
    let rmax = env.max_receiver_range().max(0.0);
    let rmin = cfg.receiver_range.iter().copied().fold(0.0, f64::min);

    let mut fig = Figure::new(env.name(), "Range (m)", "Depth (m)").depth_axis();
    let (sx, sz): (Vec<f64>, Vec<f64>) = match &cfg.surface {
        Some(points) => points.iter().map(|p| (p[0], p[1])).unzip(),
        None => (vec![rmin, rmax], vec![0.0, 0.0]),
    };
    fig.push(Series::lines("surface", sx, sz).color("blue"));

    let (bx, bz): (Vec<f64>, Vec<f64>) = match &cfg.depth {
        Bathymetry::Profile(points) => points.iter().map(|p| (p[0], p[1])).unzip(),
        Bathymetry::Flat(d) => (vec![rmin, rmax], vec![*d, *d]),
    };
    fig.push(Series::lines("bottom", bx, bz).color("brown"));

    fig.push(Series::markers("sources", vec![0.0; cfg.source_depth.len()], cfg.source_depth.clone()).color("red"));

    let (rx, rz): (Vec<f64>, Vec<f64>) = cfg.receiver_range.iter()
        .flat_map(|r| cfg.receiver_depth.iter().map(move |z| (*r, *z)))
        .unzip();
    fig.push(Series::markers("receivers", rx, rz).color("black"));
    fig
}

/// Magnitude of an impulse response sampled at `fs`
pub fn impulse_response_figure(ir: &[Complex64], fs: f64) -> Figure {
    let mut fig = Figure::new("Impulse response", "Time (s)", "Amplitude");
    let t = (0..ir.len()).map(|i| i as f64 / fs).collect();
    fig.push(Series::lines("|h(t)|", t, ir.iter().map(|h| h.norm()).collect()));
    fig
}

pub(crate) fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut s = stem.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
