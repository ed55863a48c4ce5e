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

//! In-memory dataset, readable from YAML grid files.
//!
//! Mostly useful for small synthetic grids and test fixtures,
//! real model output is read with the netCDF backend.

use super::{Field, GridDataset};
use crate::{errors::DatasetError, Float};
use ndarray::{ArrayD, IxDyn};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{fs, path::Path};

/// Raw variable as stored in the YAML file, data is in row-major order.
#[derive(Clone, PartialEq, Debug, Deserialize)]
struct RawVariable {
    dims: Vec<String>,
    shape: Vec<usize>,
    values: Vec<Float>,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    attributes: FxHashMap<String, Float>,

    #[serde(default, rename = "Times")]
    times: Vec<String>,

    #[serde(default)]
    variables: FxHashMap<String, RawVariable>,
}

#[derive(Clone, Debug)]
struct StoredVariable {
    dims: Vec<String>,
    data: ArrayD<Float>,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryDataset {
    name: String,
    attributes: FxHashMap<String, Float>,
    times: Vec<String>,
    variables: FxHashMap<String, StoredVariable>,
    dimensions: FxHashMap<String, usize>,
}

impl InMemoryDataset {
    pub fn new(name: &str) -> Self {
        InMemoryDataset {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, DatasetError> {
        let data = fs::read(path)?;
        let raw: RawDataset = serde_yaml::from_slice(data.as_slice())?;

        let name = raw
            .name
            .unwrap_or_else(|| path.display().to_string());

        let mut dataset = InMemoryDataset::new(&name);
        dataset.attributes = raw.attributes;
        dataset.times = raw.times;

        for (var_name, var) in raw.variables {
            let data = ArrayD::from_shape_vec(IxDyn(&var.shape), var.values)?;
            dataset.insert_variable(&var_name, var.dims.as_slice(), data)?;
        }

        Ok(dataset)
    }

    pub fn with_attribute(mut self, name: &str, value: Float) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_times(mut self, times: Vec<String>) -> Self {
        self.times = times;
        self
    }

    pub fn with_variable<S: AsRef<str>>(
        mut self,
        name: &str,
        dims: &[S],
        data: ArrayD<Float>,
    ) -> Result<Self, DatasetError> {
        self.insert_variable(name, dims, data)?;
        Ok(self)
    }

    /// Stores the variable checking that its dimensions
    /// agree with previously stored ones.
    fn insert_variable<S: AsRef<str>>(
        &mut self,
        name: &str,
        dims: &[S],
        data: ArrayD<Float>,
    ) -> Result<(), DatasetError> {
        if dims.len() != data.ndim() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has {} dimension names but {} data dimensions",
                name,
                dims.len(),
                data.ndim()
            )));
        }

        for (dim, &len) in dims.iter().zip(data.shape()) {
            let known = *self
                .dimensions
                .entry(dim.as_ref().to_string())
                .or_insert(len);

            if known != len {
                return Err(DatasetError::DimensionMismatch(format!(
                    "{} has {} of length {}, previously {}",
                    name,
                    dim.as_ref(),
                    len,
                    known
                )));
            }
        }

        self.variables.insert(
            name.to_string(),
            StoredVariable {
                dims: dims.iter().map(|d| d.as_ref().to_string()).collect(),
                data,
            },
        );

        Ok(())
    }
}

impl GridDataset for InMemoryDataset {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn contains(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    fn variable(&self, name: &str) -> Result<Field, DatasetError> {
        let stored = self
            .variables
            .get(name)
            .ok_or_else(|| self.variable_not_found(name))?;

        Field::new(name, stored.dims.as_slice(), stored.data.clone())
    }

    fn attribute(&self, name: &str) -> Result<Float, DatasetError> {
        self.attributes
            .get(name)
            .copied()
            .ok_or_else(|| DatasetError::AttributeNotFound {
                source_name: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    fn times(&self) -> Result<Vec<String>, DatasetError> {
        if self.times.is_empty() {
            return Err(self.variable_not_found("Times"));
        }

        Ok(self.times.clone())
    }

    fn dimension_len(&self, name: &str) -> Result<usize, DatasetError> {
        if let Some(len) = self.dimensions.get(name) {
            return Ok(*len);
        }

        // Times can be given without any time-dependent variable
        if name == "Time" && !self.times.is_empty() {
            return Ok(self.times.len());
        }

        Err(DatasetError::DimensionMismatch(format!(
            "{} has no dimension {}",
            self.name, name
        )))
    }
}
