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

//! Module containg methods for conducting
//! binary search (bisection) of grid rows and columns
//! bounding searched coordinates.
//!
//! All searched arrays are expected to be sorted ascendingly,
//! which holds for WRF latitudes (south to north), longitudes
//! (west to east) and pressure profiles after reversal.

use crate::errors::SearchError;

/// Core bisection function, an implementation of binary search
/// returning the first index at which `pred` stops holding.
///
/// `pred` must be true for a (possibly empty) prefix of the array
/// and false for the rest.
fn partition_point<T, F>(array: &[T], pred: F) -> Result<usize, SearchError>
where
    F: Fn(&T) -> bool,
{
    if array.is_empty() {
        return Err(SearchError::EmptyArray);
    }

    let mut lo = 0;
    let mut hi = array.len();

    while lo < hi {
        let mid = (lo + hi) / 2;

        if pred(&array[mid]) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    Ok(lo)
}

/// Index of the first element not smaller than `x`
/// (equal to array length when all elements are smaller).
pub fn lower_bound<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    partition_point(array, |v| v < x)
}

/// Index of the first element greater than `x`
/// (equal to array length when no element is greater).
pub fn upper_bound<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    partition_point(array, |v| v <= x)
}

/// Index `k` such that `array[k] <= x < array[k + 1]`.
///
/// Fails when `x` is outside `[array[0], array[last])`.
pub fn find_bracket<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let upper = upper_bound(array, x)?;

    if upper == 0 || upper == array.len() {
        return Err(SearchError::OutOfBounds);
    }

    Ok(upper - 1)
}

/// Last index whose value is smaller or equal to `x`.
pub fn last_not_above<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let upper = upper_bound(array, x)?;

    if upper == 0 {
        return Err(SearchError::OutOfBounds);
    }

    Ok(upper - 1)
}

/// First index whose value is greater than `x`.
pub fn first_above<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let upper = upper_bound(array, x)?;

    if upper == array.len() {
        return Err(SearchError::OutOfBounds);
    }

    Ok(upper)
}

/// First index whose value is greater or equal to `x`.
pub fn first_not_below<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let lower = lower_bound(array, x)?;

    if lower == array.len() {
        return Err(SearchError::OutOfBounds);
    }

    Ok(lower)
}
