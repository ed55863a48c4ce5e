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

//! Conversions between model time, Julian sol and areocentric
//! solar longitude (L_S) on the Mars orbit.
//!
//! Julian sol 0.0 is midnight at the beginning of the first sol of the year.

use crate::{
    constants::{
        MARS_ECCENTRICITY, MARS_EQUINOX_FRACTION, MARS_OBLIQUITY, MARS_YEAR, MARS_ZERO_DATE,
    },
    errors::DatasetError,
    Float,
};
use std::f64::consts::PI;
use std::str::FromStr;

const KEPLER_TOLERANCE: Float = 1.0e-6;
const KEPLER_MAX_ITERATIONS: usize = 100;

/// Parameters of the planet orbit.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Orbit {
    /// Unused by the calculations, kept for completeness of the description.
    pub obliquity: Float,
    pub eccentricity: Float,
    pub equinox_fraction: Float,
    pub zero_date: Float,
    pub year: Float,
}

impl Default for Orbit {
    fn default() -> Self {
        Orbit {
            obliquity: MARS_OBLIQUITY,
            eccentricity: MARS_ECCENTRICITY,
            equinox_fraction: MARS_EQUINOX_FRACTION,
            zero_date: MARS_ZERO_DATE,
            year: MARS_YEAR,
        }
    }
}

impl Orbit {
    fn eccentricity_ratio(&self) -> Float {
        ((1.0 + self.eccentricity) / (1.0 - self.eccentricity)).sqrt()
    }

    /// Solves Kepler's equation `E - e sin(E) = M` with Newton iterations.
    fn eccentric_anomaly(&self, mean_anomaly: Float) -> Float {
        let mut e: Float = 1.0;

        for _ in 0..KEPLER_MAX_ITERATIONS {
            let next = e
                - (e - self.eccentricity * e.sin() - mean_anomaly)
                    / (1.0 - self.eccentricity * e.cos());
            let change = (e - next).abs();
            e = next;

            if change <= KEPLER_TOLERANCE {
                break;
            }
        }

        e
    }

    fn true_anomaly(&self, mean_anomaly: Float) -> Float {
        let e = self.eccentric_anomaly(mean_anomaly);
        2.0 * (self.eccentricity_ratio() * (0.5 * e).tan()).atan()
    }

    /// True anomaly at the vernal equinox.
    fn equinox_anomaly(&self) -> Float {
        let mean_anomaly = 2.0 * PI * self.equinox_fraction;
        self.true_anomaly(mean_anomaly)
    }

    /// Solar longitude (degrees) at the Julian sol.
    pub fn solar_longitude(&self, julian: Float) -> Float {
        let date = (julian - self.zero_date).rem_euclid(self.year);

        let mean_anomaly = 2.0 * PI * date / self.year;
        let ls = (self.true_anomaly(mean_anomaly) - self.equinox_anomaly()).to_degrees();

        if ls < 0.0 {
            ls + 360.0
        } else {
            ls
        }
    }

    /// Julian sol at which the solar longitude (degrees) is reached.
    pub fn julian_sol(&self, ls: Float) -> Float {
        let w = self.equinox_anomaly() + ls.to_radians();
        let e = 2.0 * ((0.5 * w).tan() / self.eccentricity_ratio()).atan();
        let mean_anomaly = e - self.eccentricity * e.sin();

        let julian = mean_anomaly * self.year / (2.0 * PI) + self.zero_date;

        if julian < 0.0 {
            julian + self.year
        } else if julian > self.year {
            julian - self.year
        } else {
            julian
        }
    }
}

/// Model time as written in WRF Mars `Times` (`YYYY-DDDDD_HH:MM:SS`).
///
/// Sols are counted from 1 and a sol has 24 model hours.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ModelTime {
    pub year: u32,
    pub sol: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ModelTime {
    /// Fractional sol of the year, starting from 0.0.
    pub fn julian_sol(&self) -> Float {
        Float::from(self.sol) - 1.0
            + Float::from(self.hour) / 24.0
            + Float::from(self.minute) / (24.0 * 60.0)
            + Float::from(self.second) / (24.0 * 3600.0)
    }
}

impl FromStr for ModelTime {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DatasetError::InvalidTime(s.to_string());

        let (date, clock) = s.trim().split_once('_').ok_or_else(invalid)?;
        let (year, sol) = date.split_once('-').ok_or_else(invalid)?;

        let mut clock = clock.split(':');
        let mut next_field = || -> Result<u32, DatasetError> {
            clock
                .next()
                .ok_or_else(invalid)?
                .parse()
                .map_err(|_| invalid())
        };

        let hour = next_field()?;
        let minute = next_field()?;
        let second = next_field()?;

        Ok(ModelTime {
            year: year.parse().map_err(|_| invalid())?,
            sol: sol.parse().map_err(|_| invalid())?,
            hour,
            minute,
            second,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelTime, Orbit};
    use float_cmp::approx_eq;

    #[test]
    fn parses_model_time() {
        let time: ModelTime = "0002-00371_18:30:00".parse().unwrap();

        assert_eq!(time.year, 2);
        assert_eq!(time.sol, 371);
        assert_eq!(time.hour, 18);
        assert!(approx_eq!(f64, time.julian_sol(), 370.0 + 18.5 / 24.0, epsilon = 1e-12));

        assert!("0002-00371".parse::<ModelTime>().is_err());
        assert!("0002-0x371_18:30:00".parse::<ModelTime>().is_err());
    }

    #[test]
    fn equinox_is_zero_longitude() {
        let orbit = Orbit::default();
        let equinox = orbit.julian_sol(0.0);

        let ls = orbit.solar_longitude(equinox);
        assert!(ls < 1.0e-3 || ls > 360.0 - 1.0e-3);
    }

    #[test]
    fn longitude_and_sol_are_inverse() {
        let orbit = Orbit::default();

        for ls in [30.0, 90.0, 180.0, 251.0, 330.0] {
            let julian = orbit.julian_sol(ls);
            assert!((0.0..=orbit.year).contains(&julian));
            assert!(approx_eq!(f64, orbit.solar_longitude(julian), ls, epsilon = 1e-4));
        }
    }
}
