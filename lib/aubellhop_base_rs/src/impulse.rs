// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

use num_complex::Complex64;

use crate::errors::BellhopError;
use crate::results::Arrival;

/// Sample the arrivals at one receiver into a complex impulse response.
///
/// Each arrival's amplitude is added at the sample nearest its arrival time.
/// Time zero is the first arrival unless `abs_time` is set, in which case the
/// response starts at t = 0 s.
pub fn arrivals_to_impulse_response(arrivals: &[Arrival], fs: f64, abs_time: bool) -> Result<Vec<Complex64>, BellhopError> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(BellhopError::config(format!("sampling rate must be positive, found {} Hz", fs)));
    }
    if arrivals.is_empty() {
        return Err(BellhopError::config("no arrivals to build an impulse response from"));
    }

    let first = arrivals.iter().map(|a| a.time_of_arrival).fold(f64::INFINITY, f64::min);
    let last = arrivals.iter().map(|a| a.time_of_arrival).fold(f64::NEG_INFINITY, f64::max);
    let t0 = if abs_time { 0.0 } else { first };
    if t0 > first {
        return Err(BellhopError::config("arrival times cannot be negative"));
    }

    let len = ((last - t0) * fs).ceil() as usize + 1;
    let mut ir = vec![Complex64::new(0.0, 0.0); len];
    for a in arrivals {
        let index = ((a.time_of_arrival - t0) * fs).round() as usize;
        ir[index.min(len - 1)] += a.amplitude;
    }
    Ok(ir)
}
