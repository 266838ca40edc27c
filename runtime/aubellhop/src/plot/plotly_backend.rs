// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use plotly::common::{Line, Marker, Mode, Title};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};

use crate::errors::AubellhopError;
use super::{with_extension, Figure, PlotBackend, Style};

/// Interactive HTML plots. Depths are drawn as negative heights so the
/// surface is at the top.
#[derive(Debug, Clone, Default)]
pub struct PlotlyBackend;

impl PlotlyBackend {
    pub fn new() -> PlotlyBackend {
        PlotlyBackend
    }

    fn build(&self, fig: &Figure) -> Plot {
        let mut plot = Plot::new();
        for series in &fig.series {
            let y: Vec<f64> = if fig.y_is_depth {
                series.y.iter().map(|z| -z).collect()
            } else {
                series.y.clone()
            };
            let mut trace = Scatter::new(series.x.clone(), y).name(&series.name);
            trace = match series.style {
                Style::Lines => {
                    let trace = trace.mode(Mode::Lines);
                    match series.color {
                        Some(color) => trace.line(Line::new().color(color)),
                        None => trace,
                    }
                },
                Style::Markers => {
                    let trace = trace.mode(Mode::Markers);
                    match series.color {
                        Some(color) => trace.marker(Marker::new().color(color)),
                        None => trace,
                    }
                },
            };
            plot.add_trace(trace);
        }

        let layout = Layout::new()
            .title(Title::with_text(&fig.title))
            .x_axis(Axis::new().title(Title::with_text(&fig.x_label)))
            .y_axis(Axis::new().title(Title::with_text(&fig.y_label)));
        plot.set_layout(layout);
        plot
    }
}

impl PlotBackend for PlotlyBackend {
    fn render(&self, fig: &Figure, stem: &Path) -> Result<PathBuf, AubellhopError> {
        let path = with_extension(stem, "html");
        fs::write(&path, self.build(fig).to_html())
            .map_err(|e| AubellhopError::PlotError { path: path.clone(), reason: e.to_string() })?;
        debug!("Plot written to `{}`", path.display());
        Ok(path)
    }
}
