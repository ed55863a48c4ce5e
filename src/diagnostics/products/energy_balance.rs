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

//! Global energy balance of the atmosphere.
//!
//! Radiative and thermal fluxes are area-integrated with fixed signs
//! (positive into the atmosphere), combined into a few budgets and
//! reported per unit area of the planet.
//!
//! Some terms are rough approximations: shortwave reflected at the top
//! of the atmosphere is estimated from surface fluxes, and the latent
//! heat of CO2 deposition uses a constant latent heat and a fixed
//! interval between output records.

use super::{time_coordinates, DerivedSeries};
use crate::{
    constants::{CO2_LATENT_HEAT, CO2_TIME_INTERVAL, STEFAN_BOLTZMANN},
    diagnostics::{
        dataset::GridDataset,
        grid::{band_area_sum, compute_area, weighted_sum, RowBand},
    },
    errors::{DiagnosticError, NumericError},
    Float,
};
use log::{debug, warn};
use ndarray::{Array1, Array3, Zip};

/// Fluxes summed as they are with their sign.
const SIMPLE_INPUTS: [(&str, Float); 4] = [
    ("TOASW", 1.0),
    ("TOALW", -1.0),
    ("RNET_2D", -1.0),
    ("HFX", 1.0),
];

/// Budgets and the terms they are composed of.
const BUDGETS: [(&str, &[&str]); 6] = [
    ("eb_lw", &["GLW", "UPFLUX", "TOALW"]),
    ("eb_sw", &["GSW", "TOASW", "fake_swout"]),
    ("eb_thermal", &["HFX", "CO2"]),
    ("eb_toa", &["TOASW", "TOALW", "fake_swout"]),
    ("eb_surface", &["RNET_2D", "HFX", "CO2"]),
    (
        "eb_sum",
        &["RNET_2D", "HFX", "TOASW", "TOALW", "fake_swout", "CO2"],
    ),
];

/// Integrated terms in insertion order.
#[derive(Default)]
struct Terms(Vec<(String, Array1<Float>)>);

impl Terms {
    fn insert(&mut self, name: &str, values: Array1<Float>) {
        debug!("Energy balance term {} integrated", name);
        self.0.push((name.to_string(), values));
    }

    fn get(&self, name: &str) -> Option<&Array1<Float>> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

pub fn energy_balance(dataset: &dyn GridDataset) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;
    let area = compute_area(dataset)?.values;
    let steps = times.len();

    let areasum = |data: &Array3<Float>| -> Result<Array1<Float>, NumericError> {
        weighted_sum(data, Some(&area), RowBand::all(), false)
    };

    let mut terms = Terms::default();

    for (name, sign) in SIMPLE_INPUTS {
        if dataset.contains(name) {
            let field = dataset.variable(name)?.surface_series()?;
            terms.insert(name, areasum(&field)? * sign);
        } else {
            warn!("{} not in {}, skipping", name, dataset.source_name());
        }
    }

    let tsk = dataset.variable("TSK")?.surface_series()?;
    let upflux = tsk.mapv(|t| STEFAN_BOLTZMANN * t.powi(4));
    let emissivity = optional_surface(dataset, "EMISS")?;
    let gsw = optional_surface(dataset, "GSW")?;

    if let Some(gsw) = &gsw {
        terms.insert("GSW", -areasum(gsw)?);
    }

    if let Some(emiss) = &emissivity {
        if let Some(glw) = optional_surface(dataset, "GLW")? {
            terms.insert("GLW", -areasum(&(glw * emiss))?);
        }

        terms.insert("UPFLUX", areasum(&(upflux * emiss))?);
    }

    let swdown = dataset.variable("SWDOWN")?.surface_series()?;
    terms.insert("SWDOWN", areasum(&swdown)?);

    warn!("Shortwave out at the top of atmosphere is estimated from surface fluxes");
    match (optional_surface(dataset, "TOASW")?, &gsw) {
        (Some(toasw), Some(gsw)) => {
            let mut swout = Array3::zeros(swdown.raw_dim());
            Zip::from(&mut swout)
                .and(&swdown)
                .and(gsw)
                .and(&toasw)
                .for_each(|out, &down, &ground, &top| {
                    *out = -(down - ground) * (down / top);
                });

            terms.insert("fake_swout", areasum(&swout)?);
        }
        _ => warn!("fake_swout needs TOASW and GSW, skipping"),
    }

    warn!(
        "CO2 latent heat ({} J/kg) and output interval ({} s) are hard-coded",
        CO2_LATENT_HEAT, CO2_TIME_INTERVAL
    );
    let co2ice = dataset.variable("CO2ICE")?.surface_series()?;
    terms.insert("CO2", co2_condensation(&-areasum(&co2ice)?));

    let total_area = band_area_sum(&area, RowBand::all());

    if total_area == 0.0 {
        return Err(NumericError::EmptyBand.into());
    }

    terms.insert("area", Array1::from_elem(steps, total_area * total_area));

    for (budget, members) in BUDGETS {
        let mut sum = Array1::zeros(steps);

        for member in members.iter().filter_map(|m| terms.get(m)) {
            sum += member;
        }

        terms.insert(budget, sum);
    }

    let mut series = DerivedSeries::new(times, ls)?;

    for (name, values) in terms.0 {
        series.push_column(&name, values / total_area)?;
    }

    Ok(series)
}

/// Latent heat flux of CO2 deposition from the integrated (negated) ice mass.
///
/// The first record is left as the undifferenced mass.
fn co2_condensation(cond: &Array1<Float>) -> Array1<Float> {
    let mut result = cond.clone();

    for step in 1..cond.len() {
        result[step] = (cond[step] - cond[step - 1]) * CO2_LATENT_HEAT;
    }

    result / CO2_TIME_INTERVAL
}

fn optional_surface(
    dataset: &dyn GridDataset,
    name: &str,
) -> Result<Option<Array3<Float>>, DiagnosticError> {
    if !dataset.contains(name) {
        return Ok(None);
    }

    Ok(Some(dataset.variable(name)?.surface_series()?))
}

#[cfg(test)]
mod tests {
    use super::{co2_condensation, energy_balance, CO2_LATENT_HEAT, CO2_TIME_INTERVAL};
    use crate::constants::STEFAN_BOLTZMANN;
    use crate::diagnostics::{dataset::InMemoryDataset, grid::compute_area};
    use float_cmp::approx_eq;
    use ndarray::{arr1, Array, IxDyn};

    const LATS: [f64; 4] = [-45.0, -15.0, 15.0, 45.0];
    const LONS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

    /// Every flux is constant in space and time.
    fn uniform_grid() -> InMemoryDataset {
        let dims = ["Time", "south_north", "west_east"];
        let shape = [2, 4, 4];
        let uniform = |value: f64| Array::from_elem(IxDyn(&shape), value);

        let mut dataset = InMemoryDataset::new("uniform")
            .with_attribute("RADIUS", 1.0)
            .with_times(vec!["0001-00001_00:00:00".to_string(), "0001-00002_00:00:00".to_string()])
            .with_variable("L_S", &["Time"], Array::zeros(IxDyn(&[2])))
            .and_then(|d| d.with_variable("XLAT", &dims, Array::from_shape_fn(IxDyn(&shape), |d| LATS[d[1]])))
            .and_then(|d| d.with_variable("XLONG", &dims, Array::from_shape_fn(IxDyn(&shape), |d| LONS[d[2]])))
            .unwrap();

        for (name, value) in [
            ("TOASW", 400.0),
            ("TOALW", 150.0),
            ("RNET_2D", 50.0),
            ("HFX", 10.0),
            ("GSW", 300.0),
            ("GLW", 40.0),
            ("EMISS", 0.5),
            ("SWDOWN", 320.0),
            ("TSK", 200.0),
            ("CO2ICE", 7.0),
        ] {
            dataset = dataset.with_variable(name, &dims, uniform(value)).unwrap();
        }

        dataset
    }

    #[test]
    fn signs_and_normalisation() {
        let dataset = uniform_grid();
        let total_area: f64 = compute_area(&dataset).unwrap().values.sum();
        let series = energy_balance(&dataset).unwrap();

        let column = |name: &str| series.column(name).unwrap().to_vec();
        let check = |name: &str, expected: f64| {
            for value in column(name) {
                assert!(
                    approx_eq!(f64, value, expected, epsilon = 1e-9 * expected.abs().max(1.0)),
                    "{} is {}, expected {}",
                    name,
                    value,
                    expected
                );
            }
        };

        check("TOASW", 400.0);
        check("TOALW", -150.0);
        check("RNET_2D", -50.0);
        check("HFX", 10.0);
        check("GSW", -300.0);
        check("GLW", -40.0 * 0.5);
        check("UPFLUX", STEFAN_BOLTZMANN * 200f64.powi(4) * 0.5);
        check("SWDOWN", 320.0);
        check("fake_swout", -(320.0 - 300.0) * (320.0 / 400.0));
        check("area", total_area);

        // constant ice: only the first record is non-zero
        let co2 = column("CO2");
        assert!(approx_eq!(f64, co2[0], -7.0 / CO2_TIME_INTERVAL, epsilon = 1e-12));
        assert!(approx_eq!(f64, co2[1], 0.0, epsilon = 1e-12));

        check("eb_lw", -20.0 + STEFAN_BOLTZMANN * 200f64.powi(4) * 0.5 - 150.0);
        check("eb_sw", -300.0 + 400.0 - 16.0);
        check("eb_toa", 400.0 - 150.0 - 16.0);
    }

    #[test]
    fn first_record_is_not_differenced() {
        let result = co2_condensation(&arr1(&[-10.0, -12.0, -11.0]));

        assert!(approx_eq!(f64, result[0], -10.0 / CO2_TIME_INTERVAL, ulps = 2));
        assert!(approx_eq!(
            f64,
            result[1],
            -2.0 * CO2_LATENT_HEAT / CO2_TIME_INTERVAL,
            ulps = 2
        ));
        assert!(approx_eq!(
            f64,
            result[2],
            CO2_LATENT_HEAT / CO2_TIME_INTERVAL,
            ulps = 2
        ));
    }
}
