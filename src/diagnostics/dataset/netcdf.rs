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

//! netCDF backend reading wrfout files.

use super::{Field, GridDataset};
use crate::{errors::DatasetError, Float};
use log::debug;
use ndarray::{ArrayD, IxDyn};
use ::netcdf::AttributeValue;
use std::path::Path;

pub struct NetCdfDataset {
    name: String,
    file: ::netcdf::File,
}

impl NetCdfDataset {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = ::netcdf::open(path)?;

        Ok(NetCdfDataset {
            name: path.display().to_string(),
            file,
        })
    }
}

impl GridDataset for NetCdfDataset {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn contains(&self, variable: &str) -> bool {
        self.file.variable(variable).is_some()
    }

    fn variable(&self, name: &str) -> Result<Field, DatasetError> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| self.variable_not_found(name))?;

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        debug!("Reading {} ({}) from {}", name, dims.join(", "), self.name);

        let values: Vec<Float> = var.get_values::<Float, _>(..)?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;

        Field::new(name, dims.as_slice(), data)
    }

    fn attribute(&self, name: &str) -> Result<Float, DatasetError> {
        let not_found = || DatasetError::AttributeNotFound {
            source_name: self.name.clone(),
            attribute: name.to_string(),
        };

        let value = self.file.attribute(name).ok_or_else(not_found)?.value()?;

        match value {
            AttributeValue::Double(v) => Ok(v),
            AttributeValue::Float(v) => Ok(Float::from(v)),
            AttributeValue::Int(v) => Ok(Float::from(v)),
            AttributeValue::Short(v) => Ok(Float::from(v)),
            _ => Err(not_found()),
        }
    }

    /// WRF stores `Times` as a (Time, DateStrLen) character array.
    fn times(&self) -> Result<Vec<String>, DatasetError> {
        let var = self
            .file
            .variable("Times")
            .ok_or_else(|| self.variable_not_found("Times"))?;

        let str_len = var
            .dimensions()
            .last()
            .map(|d| d.len())
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                DatasetError::DimensionMismatch(format!("{} has empty Times", self.name))
            })?;

        let raw = var.get_raw_values(..)?;

        Ok(raw
            .chunks(str_len)
            .map(|chunk| {
                String::from_utf8_lossy(chunk)
                    .trim_end_matches(char::from(0))
                    .trim()
                    .to_string()
            })
            .collect())
    }

    fn dimension_len(&self, name: &str) -> Result<usize, DatasetError> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| {
                DatasetError::DimensionMismatch(format!("{} has no dimension {}", self.name, name))
            })
    }
}
