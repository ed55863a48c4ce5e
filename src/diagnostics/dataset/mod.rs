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

//! Module responsible for reading gridded model output
//! and providing it to the diagnostics.
//!
//! The diagnostics never touch a file format directly, they only see
//! the [`GridDataset`] trait. A backend needs to provide variable lookup
//! by name, dimension lengths and global scalar attributes.

mod dimensions;
mod memory;
#[cfg(feature = "netcdf")]
mod netcdf;

pub use self::dimensions::{canonical_dimension, Axis, Dimension};
pub use self::memory::InMemoryDataset;

use crate::{errors::DatasetError, Float};
use log::debug;
use ndarray::{Array1, Array2, Array3, Array4, ArrayD, Ix1, Ix2, Ix3, Ix4};
use std::path::Path;

/// Read-only gridded dataset with named variables.
pub trait GridDataset {
    /// Name of the dataset (usually the file path) used in error messages.
    fn source_name(&self) -> &str;

    /// Checks if the variable is present in the dataset.
    fn contains(&self, variable: &str) -> bool;

    /// Reads the whole variable together with its dimensions.
    ///
    /// Fails with [`DatasetError::VariableNotFound`] when the variable is absent.
    fn variable(&self, name: &str) -> Result<Field, DatasetError>;

    /// Reads the global scalar attribute (eg. `RADIUS`, `CP`, `P0`).
    fn attribute(&self, name: &str) -> Result<Float, DatasetError>;

    /// Reads the `Times` strings, one per time step.
    fn times(&self) -> Result<Vec<String>, DatasetError>;

    /// Length of the dimension with given raw name.
    fn dimension_len(&self, name: &str) -> Result<usize, DatasetError>;

    fn time_count(&self) -> Result<usize, DatasetError> {
        self.dimension_len(Axis::Time.wrf_name())
    }

    fn variable_not_found(&self, name: &str) -> DatasetError {
        DatasetError::VariableNotFound {
            source_name: self.source_name().to_string(),
            variable: name.to_string(),
        }
    }
}

/// Opens the dataset choosing the backend from file extension.
pub fn open(path: &Path) -> Result<Box<dyn GridDataset>, DatasetError> {
    debug!("Opening dataset {}", path.display());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => Ok(Box::new(InMemoryDataset::from_yaml_file(path)?)),
        _ => open_netcdf(path),
    }
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Box<dyn GridDataset>, DatasetError> {
    Ok(Box::new(self::netcdf::NetCdfDataset::open(path)?))
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(path: &Path) -> Result<Box<dyn GridDataset>, DatasetError> {
    Err(DatasetError::UnsupportedFormat(format!(
        "{} (built without the netcdf feature)",
        path.display()
    )))
}

/// Variable read from the dataset with its dimensions
/// mapped onto canonical axes.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub dims: Vec<Dimension>,
    pub data: ArrayD<Float>,
}

impl Field {
    pub fn new<S: AsRef<str>>(
        name: &str,
        raw_dims: &[S],
        data: ArrayD<Float>,
    ) -> Result<Self, DatasetError> {
        if raw_dims.len() != data.ndim() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has {} dimension names but {} data dimensions",
                name,
                raw_dims.len(),
                data.ndim()
            )));
        }

        let dims = raw_dims
            .iter()
            .map(|d| canonical_dimension(d.as_ref()))
            .collect();

        Ok(Field {
            name: name.to_string(),
            dims,
            data,
        })
    }

    /// Position of the canonical axis in field dimensions.
    pub fn axis_index(&self, axis: Axis) -> Result<usize, DatasetError> {
        self.dims
            .iter()
            .position(|d| d.axis() == Some(axis))
            .ok_or_else(|| DatasetError::MissingDimension {
                variable: self.name.clone(),
                dimension: axis.wrf_name().to_string(),
            })
    }

    pub fn is_staggered_along(&self, axis: Axis) -> Result<bool, DatasetError> {
        let index = self.axis_index(axis)?;
        Ok(self.dims[index].is_staggered())
    }

    pub fn len_of(&self, axis: Axis) -> Result<usize, DatasetError> {
        let index = self.axis_index(axis)?;
        Ok(self.data.len_of(ndarray::Axis(index)))
    }

    /// Data with axes permuted to the requested order.
    ///
    /// The field must have exactly the requested axes (staggered or not).
    fn ordered(&self, axes: &[Axis]) -> Result<ArrayD<Float>, DatasetError> {
        if axes.len() != self.dims.len() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has dimensions ({}), expected {} grid axes",
                self.name,
                self.dims_list(),
                axes.len()
            )));
        }

        let permutation = axes
            .iter()
            .map(|a| self.axis_index(*a))
            .collect::<Result<Vec<usize>, DatasetError>>()?;

        // the same axis can appear both staggered and unstaggered
        let mut unique = permutation.clone();
        unique.sort_unstable();
        unique.dedup();

        if unique.len() != permutation.len() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has repeated grid axes ({})",
                self.name,
                self.dims_list()
            )));
        }

        Ok(self.data.clone().permuted_axes(permutation))
    }

    /// Time series of scalars, eg. `L_S`.
    pub fn series(&self) -> Result<Array1<Float>, DatasetError> {
        Ok(self.ordered(&[Axis::Time])?.into_dimensionality::<Ix1>()?)
    }

    /// Horizontal field at every time step (Time, south_north, west_east).
    pub fn surface_series(&self) -> Result<Array3<Float>, DatasetError> {
        Ok(self
            .ordered(&[Axis::Time, Axis::SouthNorth, Axis::WestEast])?
            .into_dimensionality::<Ix3>()?)
    }

    /// Horizontal field at the first time step (south_north, west_east).
    ///
    /// Used for grid coordinates which do not change in time.
    pub fn first_surface(&self) -> Result<Array2<Float>, DatasetError> {
        let series = self.surface_series()?;

        if series.is_empty() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has no time steps",
                self.name
            )));
        }

        Ok(series
            .index_axis(ndarray::Axis(0), 0)
            .to_owned()
            .into_dimensionality::<Ix2>()?)
    }

    /// Volume field at every time step (Time, bottom_top, south_north, west_east).
    pub fn volume_series(&self) -> Result<Array4<Float>, DatasetError> {
        Ok(self
            .ordered(&[
                Axis::Time,
                Axis::BottomTop,
                Axis::SouthNorth,
                Axis::WestEast,
            ])?
            .into_dimensionality::<Ix4>()?)
    }

    fn dims_list(&self) -> String {
        self.dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Latitudes of grid rows taken along the first column at the first time step.
pub fn row_latitudes(dataset: &dyn GridDataset) -> Result<Array1<Float>, DatasetError> {
    let xlat = dataset.variable("XLAT")?.first_surface()?;
    Ok(xlat.column(0).to_owned())
}

/// Longitudes of grid columns taken along the first row at the first time step.
pub fn column_longitudes(dataset: &dyn GridDataset) -> Result<Array1<Float>, DatasetError> {
    let xlong = dataset.variable("XLONG")?.first_surface()?;
    Ok(xlong.row(0).to_owned())
}
