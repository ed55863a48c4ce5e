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

//! Mars WRF Diagnostics (WRFD) post-processes gridded output of the
//! Mars configuration of the WRF model (wrfout files) into derived
//! time series: 15-micron brightness temperature, CO2 ice mass,
//! surface pressure at landing sites, energy balance, equatorial
//! dust opacity and zonal means of surface fields.
//!
//! Every command reads one or more input files, processes each of them
//! independently and writes a small CSV table per input file.

mod constants;
mod diagnostics;
mod errors;

use cap::Cap;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use std::{alloc, path::PathBuf, process::ExitCode};

type Float = f64;

/// Global allocator used by the program.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// Calculate diagnostics from Mars WRF output files.
#[derive(Parser, Debug)]
#[command(name = "wrfd", version)]
pub struct Cli {
    /// Optional YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Input files and output location shared by all commands.
#[derive(Args, Clone, Debug)]
pub struct Files {
    /// Input files (wrfout netCDF or YAML grid files).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory to which output tables are written.
    #[arg(short, long, default_value = "./output")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Write the Times and L_S coordinates.
    Ls {
        #[command(flatten)]
        files: Files,
    },

    /// Calculate 15-micron brightness temperature.
    T15 {
        #[command(flatten)]
        files: Files,

        /// Time indices to process (defaults to all).
        #[arg(short, long = "time-index")]
        time_index: Vec<usize>,
    },

    /// Calculate area-integrated ice mass, globally and per hemisphere.
    Icemass {
        #[command(flatten)]
        files: Files,

        /// Ice variable to integrate.
        #[arg(long, default_value = "CO2ICE")]
        variable: String,
    },

    /// Calculate the energy balance of the atmosphere.
    EnergyBalance {
        #[command(flatten)]
        files: Files,
    },

    /// Calculate equatorial dust opacity.
    EqTauOd2d {
        #[command(flatten)]
        files: Files,

        /// Half-width (degrees) of the equatorial band.
        #[arg(long)]
        width: Option<Float>,
    },

    /// Calculate equatorial surface temperature.
    EqTsk {
        #[command(flatten)]
        files: Files,

        /// Half-width (degrees) of the equatorial band.
        #[arg(long)]
        width: Option<Float>,
    },

    /// Calculate surface pressure at lander sites.
    Lander {
        #[command(flatten)]
        files: Files,

        /// Sites to process.
        #[arg(long, default_values = ["vl1", "vl2", "msl", "mpf"])]
        lander: Vec<String>,
    },

    /// Calculate zonal means of comma-separated surface variables.
    ZonalMeanSurface {
        #[command(flatten)]
        files: Files,

        variables: String,
    },

    /// Calculate zonal mean dust optical depth.
    TauOd2d {
        #[command(flatten)]
        files: Files,
    },

    /// Calculate zonal mean water column abundance in ice and vapor.
    WaterColumn {
        #[command(flatten)]
        files: Files,
    },

    /// Calculate a suite of zonal mean surface diagnostics.
    SpinupSurface {
        #[command(flatten)]
        files: Files,
    },
}

impl Command {
    /// Name of the command, used in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ls { .. } => "ls",
            Command::T15 { .. } => "t15",
            Command::Icemass { .. } => "icemass",
            Command::EnergyBalance { .. } => "energy_balance",
            Command::EqTauOd2d { .. } => "eq_tau_od2d",
            Command::EqTsk { .. } => "eq_tsk",
            Command::Lander { .. } => "lander",
            Command::ZonalMeanSurface { .. } => "zonal_mean_surface",
            Command::TauOd2d { .. } => "tau_od2d",
            Command::WaterColumn { .. } => "water_column",
            Command::SpinupSurface { .. } => "spinup_surface",
        }
    }

    pub fn files(&self) -> &Files {
        match self {
            Command::Ls { files }
            | Command::T15 { files, .. }
            | Command::Icemass { files, .. }
            | Command::EnergyBalance { files }
            | Command::EqTauOd2d { files, .. }
            | Command::EqTsk { files, .. }
            | Command::Lander { files, .. }
            | Command::ZonalMeanSurface { files, .. }
            | Command::TauOd2d { files }
            | Command::WaterColumn { files }
            | Command::SpinupSurface { files } => files,
        }
    }
}

/// The main program function.
/// Prepares the runtime environment and calls the [`diagnostics::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() -> ExitCode {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("WRFD_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("WRFD_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match diagnostics::main(cli) {
        Ok(_) => {
            info!("Diagnostics finished. Check the output directory and log.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Diagnostics failed with error: {}", err);
            ExitCode::FAILURE
        }
    }
}
