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

//! Module with numerical tools operating on the model grid:
//! cell areas and area-weighted reductions, row searches
//! by latitude and interpolation of profiles and surfaces.
//!
//! Rows of WRF latitude-longitude grids go from south to north
//! so latitudes of rows (and longitudes of columns) are ascending.

pub mod area;
pub mod bisection;
pub mod interpolation;

pub use self::area::{
    band_area_sum, compute_area, latitude_band_area, weighted_sum, RowBand, SpacingSource,
};

use self::bisection::{first_above, first_not_below, last_not_above, lower_bound};
use crate::{errors::SearchError, Float};

/// First row with strictly positive latitude, the hemisphere boundary.
pub fn equator_row(lats: &[Float]) -> Result<usize, SearchError> {
    first_above(lats, &0.0)
}

/// Rows with `south <= lat < north`.
pub fn latitude_rows(
    lats: &[Float],
    south: Float,
    north: Float,
) -> Result<std::ops::Range<usize>, SearchError> {
    let start = lower_bound(lats, &south)?;
    let end = lower_bound(lats, &north)?;

    Ok(start..end.max(start))
}

/// Equatorial band of half-width `width` (degrees) used for dust opacity:
/// from the last row with `lat <= -width` to the first row with `lat > width`.
pub fn dust_band(lats: &[Float], width: Float) -> Result<RowBand, SearchError> {
    let south = last_not_above(lats, &-width)?;
    let north = first_above(lats, &width)?;

    Ok(RowBand::new(south, north))
}

/// Same as [`dust_band`] but the northern edge is the first row with `lat >= width`.
pub fn surface_temperature_band(lats: &[Float], width: Float) -> Result<RowBand, SearchError> {
    let south = last_not_above(lats, &-width)?;
    let north = first_not_below(lats, &width)?;

    Ok(RowBand::new(south, north))
}

#[cfg(test)]
mod tests {
    use super::{dust_band, equator_row, latitude_rows, surface_temperature_band, RowBand};
    use crate::errors::SearchError;

    const LATS: [f64; 8] = [-70.0, -50.0, -30.0, -10.0, 10.0, 30.0, 50.0, 70.0];

    #[test]
    fn equator() {
        assert_eq!(equator_row(&LATS).unwrap(), 4);
        assert_eq!(equator_row(&[-5.0, 0.0, 5.0]).unwrap(), 2);
        assert_eq!(equator_row(&[-5.0, -1.0]), Err(SearchError::OutOfBounds));
    }

    #[test]
    fn t15_rows_include_south_edge_only() {
        assert_eq!(latitude_rows(&LATS, -30.0, 30.0).unwrap(), 2..5);
        assert_eq!(latitude_rows(&LATS, -40.0, 40.0).unwrap(), 2..6);
        assert_eq!(latitude_rows(&LATS, -90.0, 90.0).unwrap(), 0..8);
    }

    #[test]
    fn equatorial_bands() {
        assert_eq!(dust_band(&LATS, 10.0).unwrap(), RowBand::new(3, 5));
        assert_eq!(surface_temperature_band(&LATS, 10.0).unwrap(), RowBand::new(3, 4));
        assert_eq!(dust_band(&LATS, 20.0).unwrap(), RowBand::new(2, 5));
        assert!(dust_band(&LATS, 80.0).is_err());
    }
}
