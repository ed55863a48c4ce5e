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

//! Zonal means (averages over longitude) of surface variables.

use super::{time_coordinates, ZonalTable};
use crate::{
    diagnostics::dataset::{row_latitudes, Axis, GridDataset},
    errors::{DatasetError, DiagnosticError},
    Float,
};
use log::{debug, warn};
use ndarray::{Array2, Array3, Axis as ArrayAxis};

/// Variables of the `water-column` command.
pub const WATER_COLUMN: [&str; 3] = ["H2OICE", "QV_COLUMN", "QI_COLUMN"];

/// Variables of the `spinup-surface` command.
pub const SPINUP_SURFACE: [&str; 7] = [
    "H2OICE",
    "QV_COLUMN",
    "QI_COLUMN",
    "TSK",
    "PSFC",
    "TAU_OD2D",
    "TAU_CL2D",
];

/// Zonal means of each variable, tabulated against row latitudes.
pub fn zonal_mean_surface<S: AsRef<str>>(
    dataset: &dyn GridDataset,
    variables: &[S],
) -> Result<ZonalTable, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    let lats = row_latitudes(dataset)?.to_vec();

    let mut table = ZonalTable::new(times, ls, lats)?;

    for variable in variables {
        let variable = variable.as_ref();
        debug!("Zonal mean of {} in {}", variable, dataset.source_name());

        let field = dataset.variable(variable)?;

        if field.is_staggered_along(Axis::WestEast)? {
            warn!(
                "{} is on the staggered west_east grid, its zonal mean mixes cell edges",
                variable
            );
        }

        if field.is_staggered_along(Axis::SouthNorth)? {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} is staggered along south_north, zonal means need unstaggered rows",
                variable
            ))
            .into());
        }

        table.push_column(variable, zonal_mean(&field.surface_series()?))?;
    }

    Ok(table)
}

/// Mean over west_east of (Time, south_north, west_east) data, skipping NaNs.
pub fn zonal_mean(data: &Array3<Float>) -> Array2<Float> {
    data.map_axis(ArrayAxis(2), |row| {
        let (sum, count) = row
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

        if count == 0 {
            Float::NAN
        } else {
            sum / count as Float
        }
    })
}

#[cfg(test)]
mod tests {
    use super::zonal_mean;
    use ndarray::arr3;

    #[test]
    fn averages_longitudes() {
        let data = arr3(&[[[1.0, 2.0, 3.0], [4.0, f64::NAN, 8.0]], [[0.0, 0.0, 0.0], [f64::NAN, f64::NAN, f64::NAN]]]);

        let mean = zonal_mean(&data);

        assert_eq!(mean.dim(), (2, 2));
        assert_eq!(mean[[0, 0]], 2.0);
        assert_eq!(mean[[0, 1]], 6.0);
        assert_eq!(mean[[1, 0]], 0.0);
        assert!(mean[[1, 1]].is_nan());
    }
}
