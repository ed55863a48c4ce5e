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

//! Area-integrated surface ice mass, globally and per hemisphere.

use super::{time_coordinates, DerivedSeries};
use crate::{
    diagnostics::{
        dataset::{row_latitudes, GridDataset},
        grid::{compute_area, equator_row, weighted_sum, RowBand},
    },
    errors::DiagnosticError,
};
use log::debug;

/// Sums `variable` (kg m^-2) times cell area over the whole grid and
/// separately north (rows from the equator row) and south of the equator.
///
/// When `MU` and `MUB` are present the atmosphere mass is integrated the
/// same way. `MU + MUB` is the dry column pressure (Pa), so it is divided
/// by `G` first to give column mass (kg m^-2) and `atmosphere_mass` in kg.
pub fn icemass(dataset: &dyn GridDataset, variable: &str) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    let area = compute_area(dataset)?;

    let ice = dataset.variable(variable)?.surface_series()?;

    let lats = row_latitudes(dataset)?.to_vec();
    let equator = equator_row(&lats)?;
    debug!("Equator of {} at row {}", dataset.source_name(), equator);

    let total = weighted_sum(&ice, Some(&area.values), RowBand::all(), false)?;
    let north = weighted_sum(&ice, Some(&area.values), RowBand::from_row(equator), false)?;
    let south = weighted_sum(&ice, Some(&area.values), RowBand::to_row(equator), false)?;

    let mut series = DerivedSeries::new(times, ls)?;
    series.push_column("icemass", total)?;
    series.push_column("nh_icemass", north)?;
    series.push_column("sh_icemass", south)?;

    if dataset.contains("MU") && dataset.contains("MUB") {
        let gravity = dataset.attribute("G")?;
        let column_mass = (dataset.variable("MU")?.surface_series()?
            + dataset.variable("MUB")?.surface_series()?)
            / gravity;

        let mass = weighted_sum(&column_mass, Some(&area.values), RowBand::all(), false)?;
        series.push_column("atmosphere_mass", mass)?;
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::icemass;
    use crate::diagnostics::{dataset::InMemoryDataset, grid::compute_area};
    use float_cmp::approx_eq;
    use ndarray::{Array, IxDyn};

    fn hemispheres() -> InMemoryDataset {
        let lats = [-45.0, -15.0, 15.0, 45.0];
        let lons = [0.0, 90.0, 180.0, 270.0];
        let dims = ["Time", "south_north", "west_east"];

        let xlat = Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| lats[d[1]]);
        let xlong = Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| lons[d[2]]);
        let ice = Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| (d[1] + d[2]) as f64);

        InMemoryDataset::new("hemispheres")
            .with_attribute("RADIUS", 3_389_500.0)
            .with_times(vec!["0001-00001_00:00:00".to_string()])
            .with_variable("L_S", &["Time"], Array::zeros(IxDyn(&[1])))
            .and_then(|d| d.with_variable("XLAT", &dims, xlat))
            .and_then(|d| d.with_variable("XLONG", &dims, xlong))
            .and_then(|d| d.with_variable("CO2ICE", &dims, ice))
            .unwrap()
    }

    #[test]
    fn hemispheres_partition_total() {
        let series = icemass(&hemispheres(), "CO2ICE").unwrap();

        let total = series.column("icemass").unwrap()[0];
        let north = series.column("nh_icemass").unwrap()[0];
        let south = series.column("sh_icemass").unwrap()[0];

        assert!(total > 0.0);
        assert!(north > south);
        assert!(approx_eq!(f64, north + south, total, epsilon = total * 1e-12));
        assert!(series.column("atmosphere_mass").is_none());
    }

    #[test]
    fn atmosphere_mass_in_kilograms() {
        let dims = ["Time", "south_north", "west_east"];
        let dataset = hemispheres()
            .with_attribute("G", 3.727)
            .with_variable("MU", &dims, Array::from_elem(IxDyn(&[1, 4, 4]), 10.0))
            .and_then(|d| d.with_variable("MUB", &dims, Array::from_elem(IxDyn(&[1, 4, 4]), 590.0)))
            .unwrap();

        let area = compute_area(&dataset).unwrap().values.sum();
        let mass = icemass(&dataset, "CO2ICE").unwrap().column("atmosphere_mass").unwrap()[0];

        assert!(approx_eq!(f64, mass, 600.0 / 3.727 * area, epsilon = mass * 1e-12));
    }
}
