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

//! This is a module for integration tests of the diagnostics,
//! but with access to private fields and methods.
//!
//! Most diagnostics need a complete grid with coordinates, attributes
//! and many variables, so instead of building one for every unit test
//! they share the small synthetic grid from `test-data`.

use std::path::{Path, PathBuf};

use float_cmp::approx_eq;

use crate::{
    diagnostics::{
        compute,
        configuration::{Config, SiteLocation},
        dataset::{self, GridDataset},
        grid::{compute_area, SpacingSource},
        output_path,
        products::{
            coordinates, energy_balance::energy_balance, icemass::icemass,
            lander::lander_pressure, lander::resolve_sites, t15::T15Retrieval,
        },
        Product,
    },
    errors::{DiagnosticError, SeriesError},
    Command, Files,
};

fn synthetic_grid() -> Box<dyn GridDataset> {
    dataset::open(Path::new("./test-data/synthetic_grid.yaml")).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wrfd_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn area_from_staggered_coordinates() {
    let dataset = synthetic_grid();
    let area = compute_area(dataset.as_ref()).unwrap();

    assert_eq!(area.values.dim(), (6, 4));
    assert_eq!(area.spacing.latitude, SpacingSource::Staggered);
    assert_eq!(area.spacing.longitude, SpacingSource::Staggered);
    assert!(!area.spacing.is_approximate());
    assert!(area.values.iter().all(|a| *a > 0.0));

    // symmetric rows have equal areas
    assert!(approx_eq!(
        f64,
        area.values[[0, 0]],
        area.values[[5, 0]],
        epsilon = area.values[[0, 0]] * 1e-12
    ));
}

#[test]
fn time_coordinates_from_file() {
    let series = coordinates(synthetic_grid().as_ref()).unwrap();

    assert_eq!(series.times, vec!["0001-00010_00:00:00", "0001-00011_00:00:00"]);
    assert_eq!(series.ls, vec![10.0, 10.5]);
    assert_eq!(series.column_names().count(), 0);
}

#[test]
fn t15_is_deterministic() {
    let dataset = synthetic_grid();
    let retrieval = T15Retrieval::new(-40.0, 40.0);

    let first = retrieval.retrieve(dataset.as_ref(), None).unwrap();
    let second = retrieval.retrieve(dataset.as_ref(), None).unwrap();

    let t15 = first.column("t15").unwrap();
    assert_eq!(t15.len(), 2);
    assert!(t15.iter().all(|t| t.is_finite() && *t > 0.0));
    assert_eq!(first, second);

    let single = retrieval.retrieve(dataset.as_ref(), Some([1].as_slice())).unwrap();
    assert_eq!(single.times, vec!["0001-00011_00:00:00"]);
    assert_eq!(single.column("t15").unwrap()[0], t15[1]);
}

#[test]
fn t15_rejects_time_index_out_of_range() {
    let dataset = synthetic_grid();
    let result = T15Retrieval::new(-40.0, 40.0).retrieve(dataset.as_ref(), Some([2].as_slice()));

    assert!(matches!(
        result,
        Err(DiagnosticError::Dataset(
            crate::errors::DatasetError::TimeIndexOutOfRange { index: 2, count: 2 }
        ))
    ));
}

#[test]
fn icemass_hemispheres_add_up() {
    let series = icemass(synthetic_grid().as_ref(), "CO2ICE").unwrap();

    for step in 0..2 {
        let total = series.column("icemass").unwrap()[step];
        let north = series.column("nh_icemass").unwrap()[step];
        let south = series.column("sh_icemass").unwrap()[step];

        assert!(total > 0.0);
        assert!(approx_eq!(f64, north + south, total, epsilon = total * 1e-12));
    }

    let mass = series.column("atmosphere_mass").unwrap();
    assert!(mass[1] > mass[0]);
}

#[test]
fn energy_balance_budgets() {
    let series = energy_balance(synthetic_grid().as_ref()).unwrap();

    for name in ["GSW", "GLW", "UPFLUX", "fake_swout", "CO2", "area", "eb_sum"] {
        let column = series.column(name).unwrap();
        assert!(column.iter().all(|v| v.is_finite()), "{} is not finite", name);
    }

    let sum = series.column("eb_sum").unwrap()[0];
    let parts: f64 = ["RNET_2D", "HFX", "TOASW", "TOALW", "fake_swout", "CO2"]
        .iter()
        .map(|n| series.column(n).unwrap()[0])
        .sum();

    assert!(approx_eq!(f64, sum, parts, epsilon = 1e-9 * parts.abs().max(1.0)));
}

#[test]
fn lander_at_custom_site() {
    let custom = vec![SiteLocation {
        name: "centre".to_string(),
        lat: 0.0,
        lon: 0.0,
        height: Some(-2000.0),
    }];

    let sites = resolve_sites(&["centre".to_string(), "vl1".to_string()], &custom).unwrap();
    let series = lander_pressure(synthetic_grid().as_ref(), &sites).unwrap();

    let uncorrected = series.column("centre_psfc_uncorrected").unwrap();
    let corrected = series.column("centre_psfc_corrected").unwrap();

    // halfway between rows 2 and 3 and columns 1 and 2
    assert!(approx_eq!(f64, uncorrected[0], 600.0 - 5.0 + 1.5, epsilon = 1e-9));
    // model terrain at the site is -1000 + 375 - 250, the site is lower
    assert!(corrected[0] > uncorrected[0]);

    assert!(series.column("vl1_psfc_corrected").is_some());
    assert!(series.column("vl1_tsfc").is_some());
}

#[test]
fn lander_outside_grid_fails() {
    let sites = resolve_sites(&["msl".to_string()], &[]).unwrap();

    assert!(matches!(
        lander_pressure(synthetic_grid().as_ref(), &sites),
        Err(DiagnosticError::Search(_))
    ));
}

#[test]
fn zonal_mean_command_table() {
    let command = Command::TauOd2d {
        files: Files {
            inputs: vec![],
            output_dir: PathBuf::from("./output"),
        },
    };

    let product = compute(synthetic_grid().as_ref(), &command, &Config::default()).unwrap();

    match product {
        Product::Zonal(table) => {
            let tau = table.column("TAU_OD2D").unwrap();
            assert_eq!(tau.dim(), (2, 6));
            assert!(approx_eq!(f64, tau[[1, 2]], 0.3 + 0.1 + 0.1, epsilon = 1e-9));
        }
        Product::Series(_) => panic!("tau-od2d should produce a zonal table"),
    }
}

#[test]
fn eq_dust_width_override() {
    let command = Command::EqTauOd2d {
        files: Files {
            inputs: vec![],
            output_dir: PathBuf::from("./output"),
        },
        width: Some(-5.0),
    };

    assert!(matches!(
        compute(synthetic_grid().as_ref(), &command, &Config::default()),
        Err(DiagnosticError::Config(_))
    ));
}

#[test]
fn eq_tsk_width_override() {
    let command = |width| Command::EqTsk {
        files: Files {
            inputs: vec![],
            output_dir: PathBuf::from("./output"),
        },
        width,
    };

    assert!(matches!(
        compute(synthetic_grid().as_ref(), &command(Some(-5.0)), &Config::default()),
        Err(DiagnosticError::Config(_))
    ));

    // from the row at -10 up to (without) the row at 10
    match compute(synthetic_grid().as_ref(), &command(Some(10.0)), &Config::default()).unwrap() {
        Product::Series(series) => {
            let tsk = series.column("TSK").unwrap();
            assert!(approx_eq!(f64, tsk[0], 240.0 - 8.0, epsilon = 1e-9));
        }
        Product::Zonal(_) => panic!("eq-tsk should produce a time series"),
    }
}

#[test]
fn output_is_never_overwritten() {
    let dir = scratch_dir("overwrite");
    let input = Path::new("./test-data/synthetic_grid.yaml");
    let out_path = output_path(&dir, input, "ls");

    assert_eq!(out_path, dir.join("synthetic_grid_ls.csv"));

    let command = Command::Ls {
        files: Files {
            inputs: vec![input.to_path_buf()],
            output_dir: dir.clone(),
        },
    };

    let product = compute(synthetic_grid().as_ref(), &command, &Config::default()).unwrap();
    product.save(&out_path).unwrap();

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("Times,L_S"));
    assert_eq!(written.lines().count(), 3);

    assert!(matches!(product.save(&out_path), Err(SeriesError::Io(_))));

    std::fs::remove_dir_all(&dir).unwrap();
}
