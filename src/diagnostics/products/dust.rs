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

//! Area-weighted means over an equatorial band:
//! column dust opacity and surface temperature.

use super::{time_coordinates, DerivedSeries};
use crate::{
    constants::DUST_REFERENCE_PRESSURE,
    diagnostics::{
        configuration::Dust,
        dataset::{row_latitudes, GridDataset},
        grid::{compute_area, dust_band, surface_temperature_band, weighted_sum},
    },
    errors::{DatasetError, DiagnosticError, NumericError},
    Float,
};
use log::debug;
use ndarray::Zip;

/// Mean dust optical depth over `[-width, width]` and the same opacity
/// scaled to the reference surface pressure of 610 Pa.
pub fn equatorial_dust(
    dataset: &dyn GridDataset,
    settings: &Dust,
) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    let area = compute_area(dataset)?;

    let lats = row_latitudes(dataset)?.to_vec();
    let band = dust_band(&lats, settings.width)?;
    debug!("Dust band of {}: {:?}", dataset.source_name(), band);

    let dust = dataset.variable(&settings.variable)?.surface_series()?;
    let psfc = dataset.variable("PSFC")?.surface_series()?;

    if dust.raw_dim() != psfc.raw_dim() {
        return Err(DatasetError::DimensionMismatch(format!(
            "{} and PSFC do not share the grid",
            settings.variable
        ))
        .into());
    }

    let scaled = Zip::from(&dust)
        .and(&psfc)
        .map_collect(|&tau, &p| DUST_REFERENCE_PRESSURE * tau / p);

    if settings.rescale == 0.0 {
        return Err(NumericError::NearZeroDenominator {
            stage: "dust rescaling",
            value: settings.rescale,
        }
        .into());
    }

    let mean_tau = weighted_sum(&dust, Some(&area.values), band, true)?;
    let mean_scaled = weighted_sum(&scaled, Some(&area.values), band, true)? / settings.rescale;

    let mut series = DerivedSeries::new(times, ls)?;
    series.push_column(&settings.variable, mean_tau)?;
    series.push_column("taudust_scaled", mean_scaled)?;

    Ok(series)
}

/// Mean surface skin temperature (`TSK`) over the equatorial band.
pub fn equatorial_surface_temperature(
    dataset: &dyn GridDataset,
    width: Float,
) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    let area = compute_area(dataset)?;

    let lats = row_latitudes(dataset)?.to_vec();
    let band = surface_temperature_band(&lats, width)?;

    let tsk = dataset.variable("TSK")?.surface_series()?;

    let mut series = DerivedSeries::new(times, ls)?;
    series.push_column("TSK", weighted_sum(&tsk, Some(&area.values), band, true)?)?;

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::{equatorial_dust, equatorial_surface_temperature};
    use crate::diagnostics::{configuration::Dust, dataset::InMemoryDataset};
    use float_cmp::approx_eq;
    use ndarray::{Array, IxDyn};

    fn band_grid() -> InMemoryDataset {
        let lats = [-30.0, -10.0, 0.0, 10.0, 30.0];
        let dims = ["Time", "south_north", "west_east"];
        let shape = [1, 5, 3];

        // opacity is 1 inside [-10, 10] and 100 outside
        let tau = Array::from_shape_fn(IxDyn(&shape), |d| if (1..=3).contains(&d[1]) { 1.0 } else { 100.0 });

        InMemoryDataset::new("band")
            .with_attribute("RADIUS", 1.0)
            .with_times(vec!["0001-00001_00:00:00".to_string()])
            .with_variable("L_S", &["Time"], Array::zeros(IxDyn(&[1])))
            .and_then(|d| d.with_variable("XLAT", &dims, Array::from_shape_fn(IxDyn(&shape), |d| lats[d[1]])))
            .and_then(|d| d.with_variable("XLONG", &dims, Array::from_shape_fn(IxDyn(&shape), |d| 120.0 * d[2] as f64)))
            .and_then(|d| d.with_variable("TAU_OD2D", &dims, tau.clone()))
            .and_then(|d| d.with_variable("TSK", &dims, tau * 2.0))
            .and_then(|d| d.with_variable("PSFC", &dims, Array::from_elem(IxDyn(&shape), 305.0)))
            .unwrap()
    }

    #[test]
    fn band_excludes_outer_rows() {
        let series = equatorial_dust(&band_grid(), &Dust::default()).unwrap();

        // band spans rows 1..4 (from lat -10 to the first lat above 10)
        assert!(approx_eq!(f64, series.column("TAU_OD2D").unwrap()[0], 1.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, series.column("taudust_scaled").unwrap()[0], 2.0, epsilon = 1e-12));
    }

    #[test]
    fn surface_temperature_band_is_narrower() {
        let series = equatorial_surface_temperature(&band_grid(), 10.0).unwrap();

        // rows 1..3 only, both with value 2
        assert!(approx_eq!(f64, series.column("TSK").unwrap()[0], 2.0, epsilon = 1e-12));
    }
}
