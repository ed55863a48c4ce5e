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

//! Module containing the diagnostics code.
//!
//! Every input file is an independent job: it is opened, the requested
//! product is computed from it and written as a CSV table into the output
//! directory. Jobs are deployed onto a threadpool and a failure of one
//! file does not stop the others.

mod configuration;
pub mod dataset;
pub mod grid;
pub mod products;

#[cfg(test)]
mod super_tests;

use crate::{
    diagnostics::{
        configuration::{Config, Dust},
        products::{
            dust, energy_balance, icemass, lander, t15::T15Retrieval, zonal_mean, DerivedSeries,
            ZonalTable,
        },
    },
    errors::{ConfigError, DiagnosticError, SeriesError},
    Cli, Command, Float, ALLOCATOR,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
};

/// Main diagnostics function.
///
/// It reads the configuration, deploys input files onto the threadpool
/// and counts the failed ones.
pub fn main(cli: Cli) -> Result<(), DiagnosticError> {
    info!("Preparing the diagnostics core");

    let core = Core::new(cli.config.as_deref())?;

    let files = cli.command.files().clone();
    prepare_output_dir(&files.output_dir)?;

    let files_count = files.inputs.len();

    let config = Arc::new(core.config);
    let command = Arc::new(cli.command);
    let output_dir = Arc::new(files.output_dir);

    info!("Processing {} input files with {}", files_count, command.name());

    let files_bar = ProgressBar::new(files_count as u64);
    files_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    files_bar.set_prefix("Processed files");

    let (tx, rx) = mpsc::channel();

    for input in files.inputs {
        let tx = tx.clone();
        let config = Arc::clone(&config);
        let command = Arc::clone(&command);
        let output_dir = Arc::clone(&output_dir);

        core.threadpool.spawn(move || {
            let result = process_file(&input, &command, &config, &output_dir);
            // receiver outlives all jobs so sending cannot fail
            // unless the main thread already panicked
            let _ = tx.send((input, result));
        });
    }

    drop(tx);

    let mut failed = 0;

    for (input, result) in rx.iter() {
        match result {
            Ok(output) => debug!("{} written to {}", input.display(), output.display()),
            Err(err) => {
                failed += 1;
                error!(
                    "Processing {} failed due to an error, check the details and rerun: {}",
                    input.display(),
                    err
                );
                // make sure the error message is fully written
                // before the progress bar updates
                println!();
            }
        }
        files_bar.inc(1);
    }

    files_bar.finish_with_message("All files finished");

    if failed > 0 {
        return Err(DiagnosticError::FilesFailed(failed, files_count));
    }

    Ok(())
}

/// Structure containing diagnostics prerequisites.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
}

impl Core {
    /// Diagnostics [`Core`] constructor.
    ///
    /// Configuration file is optional, without it all settings take
    /// their default values.
    pub fn new(config_path: Option<&Path>) -> Result<Self, DiagnosticError> {
        let config = match config_path {
            Some(path) => {
                debug!("Reading configuration from {}", path.display());
                Config::new_from_file(path)?
            }
            None => {
                debug!("No configuration file, using defaults");
                Config::default()
            }
        };

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| DiagnosticError::MemoryLimit(config.resources.memory))?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        Ok(Core { config, threadpool })
    }
}

/// Creates the output directory if it does not exist.
///
/// Existing directory is reused, but output files in it are never overwritten.
fn prepare_output_dir(out_path: &Path) -> Result<(), DiagnosticError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        debug!("Output directory exists so continuing");
    } else if out_path.exists() {
        return Err(DiagnosticError::FaultyOutput(format!(
            "{} exists and is not a directory",
            out_path.display()
        )));
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

/// Table produced by a command.
#[derive(Debug)]
pub enum Product {
    Series(DerivedSeries),
    Zonal(ZonalTable),
}

impl Product {
    pub fn save(&self, path: &Path) -> Result<(), SeriesError> {
        match self {
            Product::Series(series) => series.save(path),
            Product::Zonal(table) => table.save(path),
        }
    }
}

/// Output file of the input: `<output_dir>/<input stem>_<command>.csv`.
pub fn output_path(output_dir: &Path, input: &Path, command: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());

    output_dir.join(format!("{}_{}.csv", stem, command))
}

fn process_file(
    input: &Path,
    command: &Command,
    config: &Config,
    output_dir: &Path,
) -> Result<PathBuf, DiagnosticError> {
    debug!("Opening {}", input.display());
    let dataset = dataset::open(input)?;

    let product = compute(dataset.as_ref(), command, config)?;

    let out_path = output_path(output_dir, input, command.name());
    product.save(&out_path)?;

    Ok(out_path)
}

/// Dust settings with the band width from the command line, if given.
fn dust_settings(config: &Config, width: Option<Float>) -> Result<Dust, ConfigError> {
    let mut settings = config.dust.clone();

    if let Some(width) = width {
        settings.width = width;
    }

    settings.check_bounds()?;
    Ok(settings)
}

/// Computes the product of the command from a single dataset.
pub fn compute(
    dataset: &dyn dataset::GridDataset,
    command: &Command,
    config: &Config,
) -> Result<Product, DiagnosticError> {
    let product = match command {
        Command::Ls { .. } => Product::Series(products::coordinates(dataset)?),
        Command::T15 { time_index, .. } => {
            let retrieval = T15Retrieval::new(config.t15.south_lat, config.t15.north_lat);
            Product::Series(retrieval.retrieve(dataset, Some(time_index.as_slice()))?)
        }
        Command::Icemass { variable, .. } => Product::Series(icemass::icemass(dataset, variable)?),
        Command::EnergyBalance { .. } => Product::Series(energy_balance::energy_balance(dataset)?),
        Command::EqTauOd2d { width, .. } => {
            let settings = dust_settings(config, *width)?;
            Product::Series(dust::equatorial_dust(dataset, &settings)?)
        }
        Command::EqTsk { width, .. } => {
            let settings = dust_settings(config, *width)?;
            Product::Series(dust::equatorial_surface_temperature(
                dataset,
                settings.width,
            )?)
        }
        Command::Lander { lander: names, .. } => {
            let sites = lander::resolve_sites(names, &config.landers)?;
            Product::Series(lander::lander_pressure(dataset, &sites)?)
        }
        Command::ZonalMeanSurface { variables, .. } => {
            let variables: Vec<&str> = variables
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            Product::Zonal(zonal_mean::zonal_mean_surface(dataset, variables.as_slice())?)
        }
        Command::TauOd2d { .. } => {
            Product::Zonal(zonal_mean::zonal_mean_surface(dataset, &["TAU_OD2D"])?)
        }
        Command::WaterColumn { .. } => Product::Zonal(zonal_mean::zonal_mean_surface(
            dataset,
            &zonal_mean::WATER_COLUMN,
        )?),
        Command::SpinupSurface { .. } => Product::Zonal(zonal_mean::zonal_mean_surface(
            dataset,
            &zonal_mean::SPINUP_SURFACE,
        )?),
    };

    Ok(product)
}
