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

//! Module containing interpolation methods.
//!
//! Vertical profiles are interpolated linearly in pressure with
//! values clamped at both ends of the profile. Surface fields are
//! interpolated bilinearly to geographic sites.

use super::bisection::{find_bracket, upper_bound};
use crate::{
    constants::DENOMINATOR_EPSILON,
    errors::{NumericError, SearchError},
    Float,
};
use ndarray::{ArrayView1, ArrayView2};

/// Interpolates profile `t(p)` given in ascending pressure order
/// onto the query points `pw`.
///
/// Points below `p[0]` take `t[0]`, points at or above the last
/// pressure take the last value. Inside the profile the bracketing
/// pair satisfies `p[j] <= x < p[j + 1]`.
pub fn interpolate_ascending(
    p: &[Float],
    t: &[Float],
    pw: &[Float],
) -> Result<Vec<Float>, NumericError> {
    if p.len() != t.len() {
        return Err(NumericError::ProfileLengthMismatch(p.len(), t.len()));
    }

    if p.len() < 2 {
        return Err(NumericError::TooFewLevels(p.len()));
    }

    let last = p.len() - 1;
    let mut tw = Vec::with_capacity(pw.len());

    for x in pw {
        if *x < p[0] {
            tw.push(t[0]);
            continue;
        }

        if *x >= p[last] {
            tw.push(t[last]);
            continue;
        }

        // x is inside [p[0], p[last]) so the bracket always exists
        let k2 = upper_bound(p, x).map_err(|_| NumericError::TooFewLevels(p.len()))?;
        let k1 = k2 - 1;

        let denominator = p[k2] - p[k1];

        if denominator.abs() < DENOMINATOR_EPSILON {
            return Err(NumericError::NearZeroDenominator {
                stage: "profile interpolation",
                value: denominator,
            });
        }

        tw.push(((p[k2] - x) * t[k1] + (x - p[k1]) * t[k2]) / denominator);
    }

    Ok(tw)
}

/// Interpolates a column given in model level order (near-surface first,
/// descending pressure) onto the ascending query points.
pub fn interpolate_profile(
    p: ArrayView1<Float>,
    t: ArrayView1<Float>,
    pw: &[Float],
) -> Result<Vec<Float>, NumericError> {
    let p_ascending: Vec<Float> = p.iter().rev().copied().collect();
    let t_ascending: Vec<Float> = t.iter().rev().copied().collect();

    interpolate_ascending(&p_ascending, &t_ascending, pw)
}

/// Bilinear interpolation of a (south_north, west_east) field
/// to the site at `(lat, lon)`.
///
/// Rows are located along `lats` and columns along `lons`
/// with bracket `x[k] <= site < x[k + 1]`.
pub fn bilinear_at_site(
    field: ArrayView2<Float>,
    lats: &[Float],
    lons: &[Float],
    lat: Float,
    lon: Float,
) -> Result<Float, SearchError> {
    let wlon = find_bracket(lons, &lon)?;
    let wlat = find_bracket(lats, &lat)?;

    let fx = (lon - lons[wlon]) / (lons[wlon + 1] - lons[wlon]);
    let fy = (lat - lats[wlat]) / (lats[wlat + 1] - lats[wlat]);

    let south = field[[wlat, wlon]] * (1.0 - fx) + field[[wlat, wlon + 1]] * fx;
    let north = field[[wlat + 1, wlon]] * (1.0 - fx) + field[[wlat + 1, wlon + 1]] * fx;

    Ok(south * (1.0 - fy) + north * fy)
}

#[cfg(test)]
mod tests {
    use super::{bilinear_at_site, interpolate_ascending, interpolate_profile};
    use crate::errors::NumericError;
    use float_cmp::approx_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn clamps_both_ends() {
        let p = arr1(&[1000.0, 500.0, 100.0]);
        let t = arr1(&[300.0, 250.0, 200.0]);
        let pw = [50.0, 100.0, 300.0, 1000.0, 2000.0];

        let tw = interpolate_profile(p.view(), t.view(), &pw).unwrap();
        let expected = [200.0, 200.0, 225.0, 300.0, 300.0];

        for (result, expected) in tw.iter().zip(expected.iter()) {
            assert!(approx_eq!(f64, *result, *expected, ulps = 4));
        }
    }

    #[test]
    fn exact_levels_take_upper_bracket() {
        let tw = interpolate_ascending(&[1.0, 2.0, 3.0], &[10.0, 20.0, 40.0], &[2.0, 2.5]).unwrap();

        assert!(approx_eq!(f64, tw[0], 20.0, ulps = 4));
        assert!(approx_eq!(f64, tw[1], 30.0, ulps = 4));
    }

    #[test]
    fn rejects_degenerate_profiles() {
        assert_eq!(
            interpolate_ascending(&[1.0], &[10.0], &[1.0]),
            Err(NumericError::TooFewLevels(1))
        );
        assert_eq!(
            interpolate_ascending(&[1.0, 2.0], &[10.0], &[1.0]),
            Err(NumericError::ProfileLengthMismatch(2, 1))
        );
        assert!(matches!(
            interpolate_ascending(&[1.0, 1.0 + 1.0e-13, 2.0], &[10.0, 11.0, 12.0], &[1.0]),
            Err(NumericError::NearZeroDenominator { .. })
        ));
    }

    #[test]
    fn bilinear_plane() {
        let lats = [0.0, 10.0];
        let lons = [0.0, 20.0];
        // f = lat + 2 * lon
        let field = arr2(&[[0.0, 40.0], [10.0, 50.0]]);

        let value = bilinear_at_site(field.view(), &lats, &lons, 5.0, 5.0).unwrap();
        assert!(approx_eq!(f64, value, 15.0, ulps = 4));

        assert!(bilinear_at_site(field.view(), &lats, &lons, 10.0, 5.0).is_err());
    }
}
