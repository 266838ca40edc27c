// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::AubellhopError;
use super::{with_extension, Figure, PlotBackend};

/// Plot data as a `series,x,y` table, for use with external plotting tools
#[derive(Debug, Clone, Default)]
pub struct CsvBackend;

impl CsvBackend {
    pub fn new() -> CsvBackend {
        CsvBackend
    }
}

impl PlotBackend for CsvBackend {
    fn render(&self, fig: &Figure, stem: &Path) -> Result<PathBuf, AubellhopError> {
        let path = with_extension(stem, "csv");
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(&["series", fig.x_label.as_str(), fig.y_label.as_str()])?;
        for series in &fig.series {
            for (x, y) in series.x.iter().zip(&series.y) {
                wtr.write_record(&[series.name.clone(), x.to_string(), y.to_string()])?;
            }
        }
        wtr.flush()?;
        debug!("Plot data written to `{}`", path.display());
        Ok(path)
    }
}
