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

//! Module containing constants used by the diagnostics.
//!
//! Calibration coefficients of the T15 retrieval are empirical
//! and must be kept exactly as they are.

use crate::Float;

/// Number of levels in the T15 reference pressure grid.
pub const PRESSURE_LEVELS: usize = 62;

/// Reference pressure grid (hPa) of the T15 retrieval.
///
/// `pw[k] = exp((k + 1) / 10 - 4.6)`, monotonically increasing.
pub fn pressure_grid() -> [Float; PRESSURE_LEVELS] {
    let mut grid = [0.0; PRESSURE_LEVELS];

    for (k, p) in grid.iter_mut().enumerate() {
        *p = ((k as Float + 1.0) / 10.0 - 4.6).exp();
    }

    grid
}

/// Radiative weighting function of the 15-micron channel,
/// paired one-to-one with [`pressure_grid`].
pub const WEIGHTING_FUNCTION: [Float; PRESSURE_LEVELS] = [
    0.03500, 0.03500, 0.03600, 0.03600, 0.03700, 0.03700, 0.03800, 0.03900, 0.04100, 0.04300,
    0.04600, 0.04900, 0.05200, 0.05600, 0.06000, 0.06500, 0.07000, 0.07600, 0.08200, 0.09000,
    0.09700, 0.10500, 0.11500, 0.12500, 0.13600, 0.14700, 0.15900, 0.17200, 0.18600, 0.20100,
    0.21700, 0.23400, 0.25200, 0.27000, 0.28800, 0.30800, 0.32600, 0.34300, 0.36000, 0.37200,
    0.38200, 0.38800, 0.39100, 0.38800, 0.37900, 0.36400, 0.34200, 0.31000, 0.27800, 0.24600,
    0.21300, 0.17800, 0.14300, 0.10900, 0.08100, 0.06100, 0.04500, 0.03200, 0.02200, 0.01500,
    0.01000, 0.00700,
];

/// Coefficients of the temperature to radiance transform:
///
/// `rad = c0 - c1 / (tw - c2 - c3 / (tw + c4 + c5 / (tw - c6)))`
pub const RADIANCE_COEFFS: [Float; 7] = [
    -0.0181075, 39.4312, 2353.76, 62644.0, 64.445, 84263.9, 185.333,
];

/// Coefficients of the radiance to brightness temperature calibration:
///
/// `tb = c0 - c1 / (xx + c2 - c3 / (xx + c4 - c5 / (xx + c6)))`
#[allow(clippy::excessive_precision)]
pub const CALIBRATION_COEFFS: [Float; 7] = [
    881.042,
    2.40183,
    0.00364298,
    0.61044e-7,
    0.162965e-3,
    0.113959e-8,
    0.228812e-4,
];

/// Denominators smaller than this (in absolute value) are treated
/// as a numerical domain error in the rational transforms.
pub const DENOMINATOR_EPSILON: Float = 1.0e-12;

/// Stefan-Boltzmann constant (W m^-2 K^-4)
pub const STEFAN_BOLTZMANN: Float = 5.67e-8;

/// Latent heat of CO2 sublimation (J kg^-1), hard-coded approximation.
pub const CO2_LATENT_HEAT: Float = 5.713e5;

/// Time interval (s) assumed between consecutive output records
/// when differencing the CO2 ice mass, hard-coded approximation.
pub const CO2_TIME_INTERVAL: Float = 14400.0 * 60.0;

/// Reference surface pressure (Pa) for pressure-scaled dust opacity.
pub const DUST_REFERENCE_PRESSURE: Float = 610.0;

/// Geographic site with true surface elevation.
#[derive(Clone, PartialEq, PartialOrd, Debug)]
pub struct Site {
    pub name: &'static str,
    pub lat: Float,
    pub lon: Float,
    pub height: Option<Float>,
}

/// Landing sites with known surface elevations (m).
///
/// MSL location is known but its elevation is approximate.
pub const LANDER_SITES: [Site; 4] = [
    Site {
        name: "vl1",
        lat: 22.2692,
        lon: -48.1887,
        height: Some(-3627.0),
    },
    Site {
        name: "vl2",
        lat: 47.6680,
        lon: 134.0430,
        height: Some(-4505.0),
    },
    Site {
        name: "mpf",
        lat: 19.0949,
        lon: -33.4908,
        height: Some(-3682.0),
    },
    Site {
        name: "msl",
        lat: -4.5,
        lon: 137.4,
        height: Some(-4501.0),
    },
];

/// Mars orbit obliquity (degrees)
pub const MARS_OBLIQUITY: Float = 25.19;

/// Mars orbit eccentricity
pub const MARS_ECCENTRICITY: Float = 0.09341233;

/// Fraction of the year between perihelion and vernal equinox
pub const MARS_EQUINOX_FRACTION: Float = 0.2695;

/// Sol of the perihelion passage counted from the start of the year
pub const MARS_ZERO_DATE: Float = 488.7045;

/// Length of the Mars year (sols)
pub const MARS_YEAR: Float = 669.0;
