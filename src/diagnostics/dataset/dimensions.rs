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

//! Mapping of raw WRF dimension names onto canonical axes.
//!
//! WRF stores staggered variables (on cell edges) along dimensions
//! whose names end with `_stag`. The diagnostics only care which
//! canonical axis a dimension belongs to and whether it is staggered,
//! so that mapping is done once here when a field is read.

use std::fmt;

/// Canonical axes of WRF gridded data.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Axis {
    Time,
    BottomTop,
    SouthNorth,
    WestEast,
}

impl Axis {
    /// Name of the unstaggered dimension in WRF files.
    pub fn wrf_name(self) -> &'static str {
        match self {
            Axis::Time => "Time",
            Axis::BottomTop => "bottom_top",
            Axis::SouthNorth => "south_north",
            Axis::WestEast => "west_east",
        }
    }
}

/// Dimension of a field after mapping its raw name.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Dimension {
    Grid { axis: Axis, staggered: bool },
    Other(String),
}

impl Dimension {
    pub fn axis(&self) -> Option<Axis> {
        match self {
            Dimension::Grid { axis, .. } => Some(*axis),
            Dimension::Other(_) => None,
        }
    }

    pub fn is_staggered(&self) -> bool {
        matches!(self, Dimension::Grid { staggered: true, .. })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Grid {
                axis,
                staggered: false,
            } => write!(f, "{}", axis.wrf_name()),
            Dimension::Grid {
                axis,
                staggered: true,
            } => write!(f, "{}_stag", axis.wrf_name()),
            Dimension::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Maps raw dimension name to the canonical axis.
///
/// Unknown names (eg. `DateStrLen`, `soil_layers`) are kept as they are.
pub fn canonical_dimension(raw: &str) -> Dimension {
    let (base, staggered) = match raw.strip_suffix("_stag") {
        Some(base) => (base, true),
        None => (raw, false),
    };

    let axis = match base {
        "Time" => Axis::Time,
        "bottom_top" => Axis::BottomTop,
        "south_north" => Axis::SouthNorth,
        "west_east" => Axis::WestEast,
        _ => return Dimension::Other(raw.to_string()),
    };

    Dimension::Grid { axis, staggered }
}
