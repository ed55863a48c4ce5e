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

//! 15-micron brightness temperature (T15) retrieval.
//!
//! Every column of the equatorial band is interpolated onto the
//! reference pressure grid, converted to radiance with an empirical
//! rational transform, weighted with the channel weighting function
//! and calibrated back to brightness temperature. The band is then
//! averaged with weights equal to the band area of each row.

use super::{time_coordinates, DerivedSeries};
use crate::{
    constants::{
        pressure_grid, CALIBRATION_COEFFS, DENOMINATOR_EPSILON, RADIANCE_COEFFS,
        WEIGHTING_FUNCTION,
    },
    diagnostics::{
        dataset::{row_latitudes, Axis as GridAxis, GridDataset},
        grid::{interpolation::interpolate_profile, latitude_band_area, latitude_rows},
    },
    errors::{DatasetError, DiagnosticError, NumericError},
    Float,
};
use log::debug;
use ndarray::{s, Array3, ArrayView2, ArrayView3, Axis, Zip};

/// Pascals to hectopascals.
const PA_TO_HPA: Float = 0.01;

#[derive(Clone, PartialEq, Debug)]
pub struct T15Retrieval {
    pressure_grid: Vec<Float>,
    weights: Vec<Float>,
    south_lat: Float,
    north_lat: Float,
}

impl T15Retrieval {
    /// Retrieval with the standard reference tables over rows
    /// with `south_lat <= lat < north_lat`.
    pub fn new(south_lat: Float, north_lat: Float) -> Self {
        T15Retrieval {
            pressure_grid: pressure_grid().to_vec(),
            weights: WEIGHTING_FUNCTION.to_vec(),
            south_lat,
            north_lat,
        }
    }

    #[cfg(test)]
    pub fn with_tables(pressure_grid: Vec<Float>, weights: Vec<Float>) -> Self {
        T15Retrieval {
            pressure_grid,
            weights,
            ..T15Retrieval::new(-40.0, 40.0)
        }
    }

    /// Runs the retrieval for selected time steps (all when `None`).
    pub fn retrieve(
        &self,
        dataset: &dyn GridDataset,
        time_indices: Option<&[usize]>,
    ) -> Result<DerivedSeries, DiagnosticError> {
        let (times, ls) = time_coordinates(dataset)?;
        let count = times.len();

        let selected: Vec<usize> = match time_indices {
            Some(indices) if !indices.is_empty() => indices.to_vec(),
            _ => (0..count).collect(),
        };

        if let Some(&index) = selected.iter().find(|&&i| i >= count) {
            return Err(DatasetError::TimeIndexOutOfRange { index, count }.into());
        }

        let lats = row_latitudes(dataset)?.to_vec();
        let rows = latitude_rows(&lats, self.south_lat, self.north_lat)?;

        if rows.is_empty() {
            return Err(NumericError::EmptyBand.into());
        }

        debug!(
            "T15 band of {} spans rows {}..{}",
            dataset.source_name(),
            rows.start,
            rows.end
        );

        let p0 = dataset.attribute("P0")?;
        let t0 = dataset.attribute("T0")?;
        let kappa = dataset.attribute("R_D")? / dataset.attribute("CP")?;
        let radius = dataset.attribute("RADIUS")?;

        let perturbation_pressure = dataset.variable("P")?.volume_series()?;
        let base_pressure = dataset.variable("PB")?.volume_series()?;
        let theta = dataset.variable("T")?.volume_series()?;

        if perturbation_pressure.raw_dim() != base_pressure.raw_dim()
            || perturbation_pressure.raw_dim() != theta.raw_dim()
        {
            return Err(DatasetError::DimensionMismatch(
                "P, PB and T must share the same grid".to_string(),
            )
            .into());
        }

        let column_count = theta.len_of(Axis(3));
        let lat_v = row_edges(dataset, lats.len())?;
        let area = latitude_band_area(&lat_v, rows.clone(), column_count, radius)?;

        let mut t15 = Vec::with_capacity(selected.len());

        for &step in &selected {
            let (south, north) = (rows.start, rows.end);

            let pressure: Array3<Float> = &perturbation_pressure.slice(s![step, .., south..north, ..])
                + &base_pressure.slice(s![step, .., south..north, ..]);

            let mut temperature = Array3::zeros(pressure.raw_dim());
            Zip::from(&mut temperature)
                .and(&pressure)
                .and(theta.slice(s![step, .., south..north, ..]))
                .for_each(|temp, &press, &th| {
                    *temp = (press / p0).powf(kappa) * (th + t0);
                });

            let value = self.band_average(pressure.view(), temperature.view(), area.view())?;
            debug!("T15 at time step {}: {}", step, value);

            t15.push(value);
        }

        let mut series = DerivedSeries::new(
            selected.iter().map(|&i| times[i].clone()).collect(),
            selected.iter().map(|&i| ls[i]).collect(),
        )?;
        series.push_column("t15", t15)?;

        Ok(series)
    }

    /// Area-weighted mean brightness temperature of the columns
    /// (bottom_top, south_north, west_east) with pressure in Pa.
    pub fn band_average(
        &self,
        pressure: ArrayView3<Float>,
        temperature: ArrayView3<Float>,
        area: ArrayView2<Float>,
    ) -> Result<Float, NumericError> {
        let (_, rows, cols) = pressure.dim();

        if area.dim() != (rows, cols) {
            return Err(NumericError::AreaShapeMismatch {
                data: (rows, cols),
                area: area.dim(),
            });
        }

        let mut weighted: Float = 0.0;
        let mut total_area: Float = 0.0;

        for i in 0..rows {
            for j in 0..cols {
                let p_column = pressure.slice(s![.., i, j]).mapv(|p| p * PA_TO_HPA);
                let t_column = temperature.slice(s![.., i, j]);

                let tw = interpolate_profile(p_column.view(), t_column, &self.pressure_grid)?;
                let tb = self.brightness_temperature(&tw)?;

                weighted += tb * area[[i, j]];
                total_area += area[[i, j]];
            }
        }

        if total_area.abs() < DENOMINATOR_EPSILON {
            return Err(NumericError::EmptyBand);
        }

        Ok(weighted / total_area)
    }

    /// Brightness temperature of a single column interpolated onto the reference grid.
    pub fn brightness_temperature(&self, tw: &[Float]) -> Result<Float, NumericError> {
        if tw.len() != self.weights.len() {
            return Err(NumericError::ProfileLengthMismatch(
                tw.len(),
                self.weights.len(),
            ));
        }

        let mut radsum = 0.0;

        for (t, w) in tw.iter().zip(&self.weights) {
            radsum += radiance(*t)? * w;
        }

        let sumwt: Float = self.weights.iter().sum();
        let xx = checked_ratio(radsum, sumwt, "weighting function normalisation")?;

        let tb = calibrate(xx)?;

        if !tb.is_finite() {
            return Err(NumericError::NonFinite("brightness temperature"));
        }

        Ok(tb)
    }
}

/// Latitudes of row edges (`XLAT_V` along south_north_stag),
/// one more than there are rows.
fn row_edges(dataset: &dyn GridDataset, row_count: usize) -> Result<Vec<Float>, DatasetError> {
    let field = dataset.variable("XLAT_V")?;

    if !field.is_staggered_along(GridAxis::SouthNorth)? {
        return Err(DatasetError::DimensionMismatch(
            "XLAT_V is not staggered along south_north".to_string(),
        ));
    }

    let edges: Vec<Float> = field.first_surface()?.column(0).to_vec();

    if edges.len() != row_count + 1 {
        return Err(DatasetError::DimensionMismatch(format!(
            "XLAT_V has {} row edges for {} rows",
            edges.len(),
            row_count
        )));
    }

    Ok(edges)
}

/// `rad = c0 - c1 / (tw - c2 - c3 / (tw + c4 + c5 / (tw - c6)))`
fn radiance(tw: Float) -> Result<Float, NumericError> {
    let [c0, c1, c2, c3, c4, c5, c6] = RADIANCE_COEFFS;
    let stage = "radiance transform";

    let inner = tw + c4 + checked_ratio(c5, tw - c6, stage)?;
    let outer = tw - c2 - checked_ratio(c3, inner, stage)?;

    Ok(c0 - checked_ratio(c1, outer, stage)?)
}

/// `tb = c0 - c1 / (xx + c2 - c3 / (xx + c4 - c5 / (xx + c6)))`
fn calibrate(xx: Float) -> Result<Float, NumericError> {
    let [c0, c1, c2, c3, c4, c5, c6] = CALIBRATION_COEFFS;
    let stage = "brightness temperature calibration";

    let inner = xx + c4 - checked_ratio(c5, xx + c6, stage)?;
    let outer = xx + c2 - checked_ratio(c3, inner, stage)?;

    Ok(c0 - checked_ratio(c1, outer, stage)?)
}

fn checked_ratio(
    numerator: Float,
    denominator: Float,
    stage: &'static str,
) -> Result<Float, NumericError> {
    if denominator.abs() < DENOMINATOR_EPSILON || !denominator.is_finite() {
        return Err(NumericError::NearZeroDenominator {
            stage,
            value: denominator,
        });
    }

    Ok(numerator / denominator)
}
