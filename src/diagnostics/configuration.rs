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

//! Optional YAML configuration of a run.
//!
//! Every section and field has a default, so an empty file (or no file)
//! is a valid configuration. Values are range-checked right after
//! deserialization and the first violated bound is reported.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::Float;

/// _(Optional)_ Worker and memory settings of a run.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Number of input files processed at the same time.
    ///
    /// At least `1`, which is also the default.
    #[serde(default = "Resources::single_worker")]
    pub threads: u16,

    /// _(Optional)_ Heap cap in MB, at least `128`. Unlimited by default.
    ///
    /// Variables are read whole, so a few long wrfout files on many
    /// workers can exhaust the machine. With a cap the process stops
    /// with an allocation error naming the limit.
    #[serde(default = "Resources::unlimited_memory")]
    pub memory: usize,
}

impl Resources {
    fn single_worker() -> u16 {
        1
    }

    fn unlimited_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::OutOfBounds("resources.threads must be at least 1"));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds("resources.memory must be at least 128 MB"));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::single_worker(),
            memory: Resources::unlimited_memory(),
        }
    }
}

/// _(Optional)_ Latitude band of the T15 retrieval.
///
/// Rows with `south_lat <= lat < north_lat` are included.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct T15Band {
    /// Defaults to `-40.0`.
    #[serde(default = "T15Band::default_south_lat")]
    pub south_lat: Float,

    /// Defaults to `40.0`. Must be greater than `south_lat`.
    #[serde(default = "T15Band::default_north_lat")]
    pub north_lat: Float,
}

impl T15Band {
    fn default_south_lat() -> Float {
        -40.0
    }

    fn default_north_lat() -> Float {
        40.0
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.south_lat) || !(-90.0..=90.0).contains(&self.north_lat) {
            return Err(ConfigError::OutOfBounds(
                "T15 band latitudes must be within [-90, 90]",
            ));
        }

        if self.south_lat >= self.north_lat {
            return Err(ConfigError::OutOfBounds(
                "T15 band south latitude must be lower than north latitude",
            ));
        }

        Ok(())
    }
}

impl Default for T15Band {
    fn default() -> Self {
        T15Band {
            south_lat: T15Band::default_south_lat(),
            north_lat: T15Band::default_north_lat(),
        }
    }
}

/// _(Optional)_ Settings of the equatorial dust opacity.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Dust {
    /// Half-width (degrees) of the equatorial band.
    /// Overridden by `--width` on the command line.
    ///
    /// Defaults to `10.0`. Must be positive.
    #[serde(default = "Dust::default_width")]
    pub width: Float,

    /// Dust optical depth variable. Defaults to `TAU_OD2D`.
    #[serde(default = "Dust::default_variable")]
    pub variable: String,

    /// Divisor of the pressure-scaled opacity.
    ///
    /// Defaults to `1.0`. Cannot be zero.
    #[serde(default = "Dust::default_rescale")]
    pub rescale: Float,
}

impl Dust {
    fn default_width() -> Float {
        10.0
    }

    fn default_variable() -> String {
        "TAU_OD2D".to_string()
    }

    fn default_rescale() -> Float {
        1.0
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.width <= 0.0 || self.width >= 90.0 {
            return Err(ConfigError::OutOfBounds(
                "Dust band width must be within (0, 90) degrees",
            ));
        }

        if self.rescale == 0.0 {
            return Err(ConfigError::OutOfBounds("Dust rescale factor cannot be 0"));
        }

        Ok(())
    }
}

impl Default for Dust {
    fn default() -> Self {
        Dust {
            width: Dust::default_width(),
            variable: Dust::default_variable(),
            rescale: Dust::default_rescale(),
        }
    }
}

/// Named geographic site at which surface pressure is calculated.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct SiteLocation {
    pub name: String,

    /// Latitude in degrees.
    pub lat: Float,

    /// Longitude in degrees, in the convention of `XLONG`.
    pub lon: Float,

    /// _(Optional)_ True elevation (m) of the site, without it
    /// surface pressure is not corrected.
    #[serde(default)]
    pub height: Option<Float>,
}

impl SiteLocation {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ConfigError::OutOfBounds(
                "Site latitude is too low or too high",
            ));
        }

        if !(-360.0..=360.0).contains(&self.lon) {
            return Err(ConfigError::OutOfBounds(
                "Site longitude is too low or too high",
            ));
        }

        Ok(())
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resources: Resources,

    #[serde(default)]
    pub t15: T15Band,

    #[serde(default)]
    pub dust: Dust,

    /// Sites available for the `lander` command in addition to
    /// the built-in ones (which they override when names repeat).
    #[serde(default)]
    pub landers: Vec<SiteLocation>,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        config.check_bounds()?;

        Ok(config)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        self.resources.check_bounds()?;
        self.t15.check_bounds()?;
        self.dust.check_bounds()?;

        for site in &self.landers {
            site.check_bounds()?;
        }

        Ok(())
    }
}
