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

//! Cell areas of the latitude-longitude grid and
//! area-weighted reductions over the horizontal dimensions.
//!
//! Spacing is taken from staggered coordinates (`XLAT_V`, `XLONG_U`)
//! when they are present. Otherwise the mean spacing of the
//! unstaggered coordinate is used for every cell, which is coarser,
//! so the result carries the information which branch was taken.

use crate::{
    diagnostics::dataset::{Axis, GridDataset},
    errors::{DatasetError, NumericError},
    Float,
};
use log::warn;
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis as ArrayAxis, Zip};
use std::f64::consts::PI;

/// Source of the coordinate spacing used for the cell areas.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SpacingSource {
    Staggered,
    MeanSpacing,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AreaSpacing {
    pub latitude: SpacingSource,
    pub longitude: SpacingSource,
}

impl AreaSpacing {
    /// True when any of the spacings fell back to the mean spacing.
    pub fn is_approximate(&self) -> bool {
        self.latitude == SpacingSource::MeanSpacing || self.longitude == SpacingSource::MeanSpacing
    }
}

/// Areas (south_north, west_east) of grid cells in units of `RADIUS` squared.
#[derive(Clone, Debug)]
pub struct CellArea {
    pub values: Array2<Float>,
    pub spacing: AreaSpacing,
}

/// Computes `R² · Δlon · Δlat · cos(lat)` (angles in radians) for every cell.
pub fn compute_area(dataset: &dyn GridDataset) -> Result<CellArea, DatasetError> {
    let radius = dataset.attribute("RADIUS")?;
    let xlat = dataset.variable("XLAT")?.first_surface()?;

    let (dy, latitude) = coordinate_spacing(dataset, "XLAT", "XLAT_V", Axis::SouthNorth, &xlat)?;

    let xlong = dataset.variable("XLONG")?.first_surface()?;

    if xlong.raw_dim() != xlat.raw_dim() {
        return Err(DatasetError::DimensionMismatch(format!(
            "XLAT has shape {:?} but XLONG has shape {:?}",
            xlat.shape(),
            xlong.shape()
        )));
    }

    let (dx, longitude) =
        coordinate_spacing(dataset, "XLONG", "XLONG_U", Axis::WestEast, &xlong)?;

    let mut values = Array2::zeros(xlat.raw_dim());

    Zip::from(&mut values)
        .and(&dx)
        .and(&dy)
        .and(&xlat)
        .for_each(|area, &dx, &dy, &lat| {
            *area = radius * radius * dx.to_radians() * dy.to_radians() * lat.to_radians().cos();
        });

    Ok(CellArea {
        values,
        spacing: AreaSpacing {
            latitude,
            longitude,
        },
    })
}

/// Spacing (degrees) of the coordinate along the axis on the unstaggered grid.
fn coordinate_spacing(
    dataset: &dyn GridDataset,
    name: &str,
    staggered_name: &str,
    axis: Axis,
    unstaggered: &Array2<Float>,
) -> Result<(Array2<Float>, SpacingSource), DatasetError> {
    let array_axis = match axis {
        Axis::SouthNorth => ArrayAxis(0),
        _ => ArrayAxis(1),
    };

    if dataset.contains(staggered_name) {
        let field = dataset.variable(staggered_name)?;

        if !field.is_staggered_along(axis)? {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} is not staggered along {}",
                staggered_name,
                axis.wrf_name()
            )));
        }

        let staggered = field.first_surface()?;
        let expected = unstaggered.len_of(array_axis) + 1;

        if staggered.len_of(array_axis) != expected {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} has {} points along {}_stag, expected {}",
                staggered_name,
                staggered.len_of(array_axis),
                axis.wrf_name(),
                expected
            )));
        }

        let spacing = difference(staggered.view(), array_axis);

        if spacing.raw_dim() != unstaggered.raw_dim() {
            return Err(DatasetError::DimensionMismatch(format!(
                "{} and {} do not share the {} axis",
                staggered_name,
                name,
                other_axis(axis).wrf_name()
            )));
        }

        return Ok((spacing, SpacingSource::Staggered));
    }

    warn!(
        "{} has no {}, using mean {} spacing along {} for cell areas",
        dataset.source_name(),
        staggered_name,
        name,
        axis.wrf_name()
    );

    if unstaggered.len_of(array_axis) < 2 {
        return Err(DatasetError::DimensionMismatch(format!(
            "{} needs at least 2 points along {} to compute spacing",
            name,
            axis.wrf_name()
        )));
    }

    let mean = difference(unstaggered.view(), array_axis)
        .mean()
        .unwrap_or(0.0);

    Ok((
        Array2::from_elem(unstaggered.raw_dim(), mean),
        SpacingSource::MeanSpacing,
    ))
}

fn other_axis(axis: Axis) -> Axis {
    match axis {
        Axis::SouthNorth => Axis::WestEast,
        _ => Axis::SouthNorth,
    }
}

/// Forward difference along the axis, one element shorter than input.
fn difference(array: ArrayView2<Float>, axis: ArrayAxis) -> Array2<Float> {
    let n = array.len_of(axis);

    match axis.index() {
        0 => &array.slice(s![1..n, ..]) - &array.slice(s![0..n - 1, ..]),
        _ => &array.slice(s![.., 1..n]) - &array.slice(s![.., 0..n - 1]),
    }
}

/// Half-open range `[south, north)` of south_north row indices.
///
/// Missing bounds extend to the edge of the grid.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct RowBand {
    pub south: Option<usize>,
    pub north: Option<usize>,
}

impl RowBand {
    pub fn all() -> Self {
        RowBand::default()
    }

    pub fn new(south: usize, north: usize) -> Self {
        RowBand {
            south: Some(south),
            north: Some(north),
        }
    }

    pub fn from_row(south: usize) -> Self {
        RowBand {
            south: Some(south),
            north: None,
        }
    }

    pub fn to_row(north: usize) -> Self {
        RowBand {
            south: None,
            north: Some(north),
        }
    }

    /// Row range clamped to the grid.
    pub fn rows(&self, row_count: usize) -> std::ops::Range<usize> {
        let north = self.north.unwrap_or(row_count).min(row_count);
        let south = self.south.unwrap_or(0).min(north);

        south..north
    }
}

/// Weighted sum over both horizontal dimensions of every time step
/// in `data` (Time, south_north, west_east), restricted to the row band.
///
/// Cells where the weighted value is NaN are skipped. Without `area`
/// weights are uniform. With `mean` the sum is divided by the band's
/// total area, or by the count of valid cells when no area is given.
pub fn weighted_sum(
    data: &Array3<Float>,
    area: Option<&Array2<Float>>,
    band: RowBand,
    mean: bool,
) -> Result<Array1<Float>, NumericError> {
    let (_, rows, cols) = data.dim();

    if let Some(area) = area {
        if area.dim() != (rows, cols) {
            return Err(NumericError::AreaShapeMismatch {
                data: (rows, cols),
                area: area.dim(),
            });
        }
    }

    let range = band.rows(rows);
    let band_area = area.map(|a| a.slice(s![range.clone(), ..]));

    let mut result = Array1::zeros(data.len_of(ArrayAxis(0)));

    for (step, slab) in data.outer_iter().enumerate() {
        let slab = slab.slice(s![range.clone(), ..]);

        let mut total = 0.0;
        let mut valid = 0usize;

        match &band_area {
            Some(weights) => {
                Zip::from(&slab).and(weights).for_each(|&v, &w| {
                    let weighted = v * w;
                    if !weighted.is_nan() {
                        total += weighted;
                        valid += 1;
                    }
                });
            }
            None => {
                slab.iter().filter(|v| !v.is_nan()).for_each(|v| {
                    total += v;
                    valid += 1;
                });
            }
        }

        if mean {
            let norm = match &band_area {
                Some(weights) => weights.iter().filter(|w| !w.is_nan()).sum::<Float>(),
                None => valid as Float,
            };

            if norm == 0.0 {
                return Err(NumericError::EmptyBand);
            }

            total /= norm;
        }

        result[step] = total;
    }

    Ok(result)
}

/// Total area of cells within the row band.
pub fn band_area_sum(area: &Array2<Float>, band: RowBand) -> Float {
    let range = band.rows(area.nrows());

    area.slice(s![range, ..])
        .iter()
        .filter(|a| !a.is_nan())
        .sum()
}

/// Area of every cell in the given rows of a latitude band, assuming
/// each row is split evenly between `column_count` cells:
/// `R² · (1 / n) · 2π · (sin(lat_v[i + 1]) - sin(lat_v[i]))`.
///
/// `lat_v` holds row edge latitudes (south_north_stag) in degrees.
pub fn latitude_band_area(
    lat_v: &[Float],
    rows: std::ops::Range<usize>,
    column_count: usize,
    radius: Float,
) -> Result<Array2<Float>, DatasetError> {
    if rows.end >= lat_v.len() {
        return Err(DatasetError::DimensionMismatch(format!(
            "row edges have {} points, rows up to {} requested",
            lat_v.len(),
            rows.end
        )));
    }

    let row_areas: Vec<Float> = rows
        .map(|i| {
            radius * radius * (1.0 / column_count as Float)
                * 2.0
                * PI
                * (lat_v[i + 1].to_radians().sin() - lat_v[i].to_radians().sin())
        })
        .collect();

    Ok(Array2::from_shape_fn(
        (row_areas.len(), column_count),
        |(i, _)| row_areas[i],
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        band_area_sum, compute_area, latitude_band_area, weighted_sum, RowBand, SpacingSource,
    };
    use crate::diagnostics::dataset::InMemoryDataset;
    use crate::errors::{DatasetError, NumericError};
    use float_cmp::approx_eq;
    use ndarray::{Array, Array2, Array3, IxDyn};

    const LATS: [f64; 4] = [-45.0, -15.0, 15.0, 45.0];
    const LONS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

    fn unstaggered_grid() -> InMemoryDataset {
        let dims = ["Time", "south_north", "west_east"];

        InMemoryDataset::new("unstaggered")
            .with_attribute("RADIUS", 1.0)
            .with_variable("XLAT", &dims, Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| LATS[d[1]]))
            .and_then(|d| {
                d.with_variable("XLONG", &dims, Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| LONS[d[2]]))
            })
            .unwrap()
    }

    #[test]
    fn mean_spacing_fallback() {
        let area = compute_area(&unstaggered_grid()).unwrap();

        assert_eq!(area.spacing.latitude, SpacingSource::MeanSpacing);
        assert_eq!(area.spacing.longitude, SpacingSource::MeanSpacing);
        assert!(area.spacing.is_approximate());

        for (i, lat) in LATS.iter().enumerate() {
            let expected = 90f64.to_radians() * 30f64.to_radians() * lat.to_radians().cos();

            for j in 0..4 {
                assert!(approx_eq!(f64, area.values[[i, j]], expected, epsilon = 1e-12));
            }
        }

        assert!(approx_eq!(f64, area.values[[0, 0]], 0.58157, epsilon = 1e-5));
    }

    #[test]
    fn staggered_edges_must_match_rows() {
        // 4 edges for 4 rows, one is missing
        let edges = Array::from_shape_fn(IxDyn(&[1, 4, 4]), |d| -60.0 + 30.0 * d[1] as f64);
        let dataset = unstaggered_grid()
            .with_variable("XLAT_V", &["Time", "south_north_stag", "west_east"], edges)
            .unwrap();

        assert!(matches!(
            compute_area(&dataset),
            Err(DatasetError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn band_restriction() {
        let data = Array3::from_elem((1, 10, 4), 1.0);
        let area = Array2::from_elem((10, 4), 1.0);

        let sum = weighted_sum(&data, Some(&area), RowBand::new(2, 5), false).unwrap();

        assert!(approx_eq!(f64, sum[0], 12.0, ulps = 2));
    }

    #[test]
    fn mean_normalization() {
        let data = Array3::from_shape_fn((2, 6, 3), |(t, i, j)| (t + 1) as f64 * (i * 3 + j) as f64);
        let area = Array2::from_shape_fn((6, 3), |(i, _)| 1.0 + i as f64);

        for band in [RowBand::all(), RowBand::new(1, 4), RowBand::from_row(3), RowBand::to_row(2)] {
            let mean = weighted_sum(&data, Some(&area), band, true).unwrap();
            let sum = weighted_sum(&data, Some(&area), band, false).unwrap();
            let norm = band_area_sum(&area, band);

            for t in 0..2 {
                assert!(approx_eq!(f64, mean[t], sum[t] / norm, epsilon = 1e-12));
            }
        }
    }

    #[test]
    fn skips_missing_values() {
        let mut data = Array3::from_elem((1, 2, 2), 2.0);
        data[[0, 0, 0]] = f64::NAN;

        let sum = weighted_sum(&data, None, RowBand::all(), false).unwrap();
        let mean = weighted_sum(&data, None, RowBand::all(), true).unwrap();

        assert!(approx_eq!(f64, sum[0], 6.0, ulps = 2));
        assert!(approx_eq!(f64, mean[0], 2.0, ulps = 2));
    }

    #[test]
    fn empty_band_mean_fails() {
        let data = Array3::from_elem((1, 4, 2), 1.0);
        let area = Array2::from_elem((4, 2), 1.0);

        assert_eq!(
            weighted_sum(&data, Some(&area), RowBand::new(3, 3), true),
            Err(NumericError::EmptyBand)
        );
        assert!(matches!(
            weighted_sum(&data, Some(&Array2::zeros((3, 2))), RowBand::all(), false),
            Err(NumericError::AreaShapeMismatch { .. })
        ));
    }

    #[test]
    fn band_area_covers_sphere() {
        let edges: Vec<f64> = (0..=18).map(|i| -90.0 + 10.0 * i as f64).collect();
        let area = latitude_band_area(&edges, 0..18, 36, 1.0).unwrap();

        assert!(approx_eq!(f64, area.sum(), 4.0 * std::f64::consts::PI, epsilon = 1e-12));
        assert!(area.iter().all(|a| *a > 0.0));
    }
}
