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

//! Surface pressure at landing sites.
//!
//! Surface pressure, skin temperature and terrain height are bilinearly
//! interpolated to the site and the pressure is corrected hydrostatically
//! from the model terrain height to the true elevation of the site.

use super::{time_coordinates, DerivedSeries};
use crate::{
    constants::LANDER_SITES,
    diagnostics::{
        configuration::SiteLocation,
        dataset::{column_longitudes, row_latitudes, GridDataset},
        grid::interpolation::bilinear_at_site,
    },
    errors::DiagnosticError,
    Float,
};
use log::debug;
use ndarray::{Array3, Axis};

/// Finds sites by name, first among user-defined sites, then built-in ones.
pub fn resolve_sites(
    names: &[String],
    custom: &[SiteLocation],
) -> Result<Vec<SiteLocation>, DiagnosticError> {
    names
        .iter()
        .map(|name| {
            if let Some(site) = custom.iter().find(|s| &s.name == name) {
                return Ok(site.clone());
            }

            LANDER_SITES
                .iter()
                .find(|s| s.name == name.as_str())
                .map(|s| SiteLocation {
                    name: s.name.to_string(),
                    lat: s.lat,
                    lon: s.lon,
                    height: s.height,
                })
                .ok_or_else(|| DiagnosticError::UnknownSite(name.clone()))
        })
        .collect()
}

/// Columns `<site>_psfc_uncorrected`, `<site>_psfc_corrected` and `<site>_tsfc`
/// for every site. Sites without known elevation only get the uncorrected pressure.
pub fn lander_pressure(
    dataset: &dyn GridDataset,
    sites: &[SiteLocation],
) -> Result<DerivedSeries, DiagnosticError> {
    let (times, ls) = time_coordinates(dataset)?;

    let lats = row_latitudes(dataset)?.to_vec();
    let lons = column_longitudes(dataset)?.to_vec();

    let psfc = dataset.variable("PSFC")?.surface_series()?;

    let needs_correction = sites.iter().any(|s| s.height.is_some());
    let correction_inputs = if needs_correction {
        Some((
            dataset.variable("TSK")?.surface_series()?,
            dataset.variable("HGT")?.surface_series()?,
            dataset.attribute("R_D")?,
            dataset.attribute("G")?,
        ))
    } else {
        None
    };

    let mut series = DerivedSeries::new(times, ls)?;

    for site in sites {
        debug!("Interpolating to {} ({}, {})", site.name, site.lat, site.lon);

        let psfc_site = at_site(&psfc, &lats, &lons, site)?;
        series.push_column(&format!("{}_psfc_uncorrected", site.name), psfc_site.clone())?;

        if let (Some(height), Some((tsk, hgt, r_d, gravity))) = (site.height, &correction_inputs) {
            let tsfc_site = at_site(tsk, &lats, &lons, site)?;
            let hgt_site = at_site(hgt, &lats, &lons, site)?;

            let corrected: Vec<Float> = psfc_site
                .iter()
                .zip(&tsfc_site)
                .zip(&hgt_site)
                .map(|((p, t), h)| hydrostatic_correction(*p, *t, *h, height, *r_d, *gravity))
                .collect();

            series.push_column(&format!("{}_psfc_corrected", site.name), corrected)?;
            series.push_column(&format!("{}_tsfc", site.name), tsfc_site)?;
        }
    }

    Ok(series)
}

/// Surface pressure moved from model terrain height to true elevation
/// assuming density of the surface air is constant over the height difference.
pub fn hydrostatic_correction(
    psfc: Float,
    tsfc: Float,
    model_height: Float,
    true_height: Float,
    r_d: Float,
    gravity: Float,
) -> Float {
    let rho = psfc / (r_d * tsfc);
    let dp = -rho * gravity * (true_height - model_height);

    psfc + dp
}

fn at_site(
    field: &Array3<Float>,
    lats: &[Float],
    lons: &[Float],
    site: &SiteLocation,
) -> Result<Vec<Float>, DiagnosticError> {
    field
        .axis_iter(Axis(0))
        .map(|surface| {
            bilinear_at_site(surface, lats, lons, site.lat, site.lon).map_err(DiagnosticError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{hydrostatic_correction, resolve_sites};
    use crate::diagnostics::configuration::SiteLocation;
    use crate::errors::DiagnosticError;
    use float_cmp::approx_eq;

    #[test]
    fn lower_site_has_higher_pressure() {
        let corrected = hydrostatic_correction(600.0, 200.0, -3000.0, -3600.0, 192.0, 3.727);
        let rho = 600.0 / (192.0 * 200.0);

        assert!(approx_eq!(f64, corrected, 600.0 + rho * 3.727 * 600.0, epsilon = 1e-9));
    }

    #[test]
    fn resolves_sites() {
        let custom = vec![SiteLocation {
            name: "vl1".to_string(),
            lat: 0.0,
            lon: 0.0,
            height: None,
        }];

        let sites = resolve_sites(&["vl1".to_string(), "msl".to_string()], &custom).unwrap();

        assert_eq!(sites[0].lat, 0.0);
        assert_eq!(sites[1].lat, -4.5);

        assert!(matches!(
            resolve_sites(&["phoenix".to_string()], &custom),
            Err(DiagnosticError::UnknownSite(name)) if name == "phoenix"
        ));
    }
}
