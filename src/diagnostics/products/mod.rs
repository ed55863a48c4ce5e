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

//! Derived quantities computed from a single input dataset.
//!
//! Each sub-module reads the variables it needs through [`GridDataset`]
//! and returns a table aligned with the time axis of the input.

pub mod dust;
pub mod energy_balance;
pub mod icemass;
pub mod lander;
pub mod series;
pub mod solar_longitude;
pub mod t15;
pub mod zonal_mean;

pub use self::series::{DerivedSeries, ZonalTable};

use self::solar_longitude::{ModelTime, Orbit};
use crate::{
    diagnostics::dataset::GridDataset,
    errors::{DatasetError, DiagnosticError},
    Float,
};
use log::warn;

/// `Times` strings and `L_S` values of every time step.
///
/// When the dataset has no `L_S` it is derived from `Times`.
pub fn time_coordinates(
    dataset: &dyn GridDataset,
) -> Result<(Vec<String>, Vec<Float>), DiagnosticError> {
    let times = dataset.times()?;

    let ls = if dataset.contains("L_S") {
        dataset.variable("L_S")?.series()?.to_vec()
    } else {
        warn!(
            "{} has no L_S, deriving it from Times with the default Mars orbit",
            dataset.source_name()
        );
        solar_longitude_from_times(&times)?
    };

    if ls.len() != times.len() {
        return Err(DatasetError::DimensionMismatch(format!(
            "{} has {} Times but {} L_S values",
            dataset.source_name(),
            times.len(),
            ls.len()
        ))
        .into());
    }

    Ok((times, ls))
}

fn solar_longitude_from_times(times: &[String]) -> Result<Vec<Float>, DatasetError> {
    let orbit = Orbit::default();

    times
        .iter()
        .map(|t| {
            let time: ModelTime = t.parse()?;
            Ok(orbit.solar_longitude(time.julian_sol()))
        })
        .collect()
}

/// Copy of the time coordinates, the `ls` command.
pub fn coordinates(dataset: &dyn GridDataset) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    Ok(DerivedSeries::new(times, ls)?)
}

#[cfg(test)]
mod tests {
    use super::time_coordinates;
    use crate::diagnostics::dataset::InMemoryDataset;
    use float_cmp::approx_eq;

    #[test]
    fn derives_ls_from_times() {
        let dataset = InMemoryDataset::new("no_ls")
            .with_times(vec!["0001-00001_00:00:00".to_string(), "0001-00372_12:00:00".to_string()]);

        let (times, ls) = time_coordinates(&dataset).unwrap();

        assert_eq!(times.len(), 2);
        // the year starts at the northern spring equinox
        assert!(ls[0] < 0.01 || ls[0] > 359.99);
        assert!(approx_eq!(f64, ls[1], 179.47, epsilon = 0.01));
    }
}
