/*
Copyright 2021 Jakub Lewandowski

This file is part of Mars WRF Diagnostics (WRFD).

Mars WRF Diagnostics (WRFD) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Mars WRF Diagnostics (WRFD) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Mars WRF Diagnostics (WRFD). If not, see https://www.gnu.org/licenses/.
*/

//! Output tables of the diagnostics.
//!
//! Every command produces columns aligned with the time axis of the
//! input file, written next to the `Times` and `L_S` coordinates.

use crate::{errors::SeriesError, Float};
use ndarray::Array2;
use std::{fs::OpenOptions, io::Write, path::Path};

/// Named scalar time series sharing the `Times` and `L_S` coordinates.
#[derive(Clone, PartialEq, Debug)]
pub struct DerivedSeries {
    pub times: Vec<String>,
    pub ls: Vec<Float>,
    columns: Vec<(String, Vec<Float>)>,
}

impl DerivedSeries {
    pub fn new(times: Vec<String>, ls: Vec<Float>) -> Result<Self, SeriesError> {
        if times.len() != ls.len() {
            return Err(SeriesError::LengthMismatch {
                name: "L_S".to_string(),
                len: ls.len(),
                expected: times.len(),
            });
        }

        Ok(DerivedSeries {
            times,
            ls,
            columns: vec![],
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Appends a column, which must have one value per time step.
    pub fn push_column<I>(&mut self, name: &str, values: I) -> Result<(), SeriesError>
    where
        I: IntoIterator<Item = Float>,
    {
        let values: Vec<Float> = values.into_iter().collect();

        if values.len() != self.len() {
            return Err(SeriesError::LengthMismatch {
                name: name.to_string(),
                len: values.len(),
                expected: self.len(),
            });
        }

        self.columns.push((name.to_string(), values));
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[Float]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn to_csv<W: Write>(&self, writer: W) -> Result<(), SeriesError> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header = vec!["Times", "L_S"];
        header.extend(self.column_names());
        out.write_record(&header)?;

        for step in 0..self.len() {
            let mut record = vec![self.times[step].clone(), self.ls[step].to_string()];
            record.extend(self.columns.iter().map(|(_, v)| v[step].to_string()));
            out.write_record(&record)?;
        }

        out.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), SeriesError> {
        self.to_csv(create_new(path)?)
    }
}

/// Zonal means (Time, south_north) of several variables,
/// written in long format with one row per time step and grid row.
#[derive(Clone, PartialEq, Debug)]
pub struct ZonalTable {
    pub times: Vec<String>,
    pub ls: Vec<Float>,
    pub latitudes: Vec<Float>,
    columns: Vec<(String, Array2<Float>)>,
}

impl ZonalTable {
    pub fn new(times: Vec<String>, ls: Vec<Float>, latitudes: Vec<Float>) -> Result<Self, SeriesError> {
        if times.len() != ls.len() {
            return Err(SeriesError::LengthMismatch {
                name: "L_S".to_string(),
                len: ls.len(),
                expected: times.len(),
            });
        }

        Ok(ZonalTable {
            times,
            ls,
            latitudes,
            columns: vec![],
        })
    }

    pub fn push_column(&mut self, name: &str, values: Array2<Float>) -> Result<(), SeriesError> {
        let expected = (self.times.len(), self.latitudes.len());

        if values.dim() != expected {
            return Err(SeriesError::LengthMismatch {
                name: name.to_string(),
                len: values.len(),
                expected: expected.0 * expected.1,
            });
        }

        self.columns.push((name.to_string(), values));
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Array2<Float>> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn to_csv<W: Write>(&self, writer: W) -> Result<(), SeriesError> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header = vec!["Times", "L_S", "XLAT"];
        header.extend(self.columns.iter().map(|(n, _)| n.as_str()));
        out.write_record(&header)?;

        for (step, time) in self.times.iter().enumerate() {
            for (row, lat) in self.latitudes.iter().enumerate() {
                let mut record = vec![time.clone(), self.ls[step].to_string(), lat.to_string()];
                record.extend(self.columns.iter().map(|(_, v)| v[[step, row]].to_string()));
                out.write_record(&record)?;
            }
        }

        out.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), SeriesError> {
        self.to_csv(create_new(path)?)
    }
}

/// Opens a new file for writing, refusing to overwrite existing output.
fn create_new(path: &Path) -> Result<std::fs::File, SeriesError> {
    Ok(OpenOptions::new().write(true).create_new(true).open(path)?)
}
