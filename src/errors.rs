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

//! Errors that can occur while computing the diagnostics.
//!
//! Each concern has its own enum and they are composed with `#[from]`
//! into [`DiagnosticError`], so the source of a failure stays visible
//! all the way up to the log message printed by `main`.

use crate::Float;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("Error while reading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Cannot set memory limit of {0} MB, it is below current allocation")]
    MemoryLimit(usize),

    #[error("Error while handling input dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Error in numerical computation: {0}")]
    Numeric(#[from] NumericError),

    #[error("Error while searching the grid: {0}")]
    Search(#[from] SearchError),

    #[error("Error while writing output: {0}")]
    Series(#[from] SeriesError),

    #[error("Error while handling output directory: {0}")]
    CantAccessOutput(#[from] std::io::Error),

    #[error("Output location is faulty: {0}")]
    FaultyOutput(String),

    #[error("Unknown lander site: {0}")]
    UnknownSite(String),

    #[error("{0} of {1} input files failed, check the log for details")]
    FilesFailed(usize, usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open configuration file: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize configuration file: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds: {0}")]
    OutOfBounds(&'static str),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Variable {variable} not found in {source_name}")]
    VariableNotFound {
        source_name: String,
        variable: String,
    },

    #[error("Global attribute {attribute} not found in {source_name}")]
    AttributeNotFound {
        source_name: String,
        attribute: String,
    },

    #[error("Variable {variable} has no {dimension} dimension")]
    MissingDimension { variable: String, dimension: String },

    #[error("Dimensions do not match: {0}")]
    DimensionMismatch(String),

    #[error("Time index {index} out of range for {count} time steps")]
    TimeIndexOutOfRange { index: usize, count: usize },

    #[error("Cannot reshape variable data: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Cannot open dataset: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize dataset: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::error::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot parse model time: {0}")]
    InvalidTime(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Profile has {0} levels, at least 2 are needed to interpolate")]
    TooFewLevels(usize),

    #[error("Pressure profile has {0} levels but temperature profile has {1}")]
    ProfileLengthMismatch(usize, usize),

    #[error("Denominator too close to zero in {stage}: {value}")]
    NearZeroDenominator { stage: &'static str, value: Float },

    #[error("Computed {0} is not finite")]
    NonFinite(&'static str),

    #[error("No grid cells with non-zero weight in the requested band")]
    EmptyBand,

    #[error("Data grid {data:?} does not match area grid {area:?}")]
    AreaShapeMismatch {
        data: (usize, usize),
        area: (usize, usize),
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("Searched array is empty")]
    EmptyArray,

    #[error("Searched value is out of array bounds")]
    OutOfBounds,
}

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("Column {name} has {len} values but the series has {expected} time steps")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("Cannot write CSV table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot write output file: {0}")]
    Io(#[from] std::io::Error),
}
