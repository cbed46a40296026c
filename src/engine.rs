// ap_demod - Amplitude demodulation via alternating projections
// Copyright (C) 2026 The ap_demod developers

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Engine entry point

use crate::algorithms::{cutoff_indices, ApSolver, Readout};
use crate::dft::RealDft;
use crate::error::{self, DemodError};
use crate::params::{Algorithm, Parameters};
use crate::prepare;
use crate::validation;

/// Recovers the modulator of `signal` with the alternating-projection
/// algorithm selected in `params`.
///
/// Inputs:
/// * `signal` holds the samples in natural order (axis 0 fastest). In
///   coordinate mode this is the flat list of scattered samples.
/// * `upper_bound` is an optional pointwise upper bound on the
///   modulator, same layout and length as `signal`. It must dominate
///   `|signal|`.
/// * `coords` are optional sampling coordinates for non-uniformly
///   sampled signals, column-major with one column of `ns` entries per
///   dimension. When given, the signal is first gridded onto the
///   refined uniform grid of sizes `params.nr`.
///
/// Outputs, both caller-allocated:
/// * `modulator_out` receives one modulator estimate of `ns` samples
///   (in the layout of `signal`) per entry of `params.im`,
///   concatenated.
/// * `error_out` receives one infeasibility error, in original signal
///   units, per entry of `params.ie`.
///
/// Returns the number of iterations performed, or the error kind of
/// the first contract violation or backend failure. Under the
/// [`set_exit_on_error`](crate::set_exit_on_error) policy an error is
/// instead logged and terminates the process with
/// [`DemodError::code`] as the exit status.
///
/// The caller's buffers are never mutated beyond the two output
/// slices; compression operates on private copies.
pub fn demodulate(
    signal: &[f64],
    params: &Parameters,
    upper_bound: Option<&[f64]>,
    coords: Option<&[f64]>,
    modulator_out: &mut [f64],
    error_out: &mut [f64],
) -> Result<usize, DemodError> {
    let result = run(signal, params, upper_bound, coords, modulator_out, error_out);
    if let Err(err) = &result {
        if error::exit_on_error() {
            log::error!("demodulation failed: {}", err);
            std::process::exit(err.code());
        }
    }
    result
}

fn run(
    signal: &[f64],
    params: &Parameters,
    upper_bound: Option<&[f64]>,
    coords: Option<&[f64]>,
    modulator_out: &mut [f64],
    error_out: &mut [f64],
) -> Result<usize, DemodError> {
    validation::validate_inputs(
        signal,
        params,
        upper_bound,
        coords,
        modulator_out.len(),
        error_out.len(),
    )?;

    let dims: &[usize] = if coords.is_some() {
        &params.nr
    } else {
        &params.ns
    };
    let ns = validation::total_samples(params, coords.is_some())?;

    log::debug!(
        "demodulating {} samples on a {:?} grid with {:?}",
        ns,
        dims,
        params.algorithm
    );

    // Private copies so that in-place compression never touches the
    // caller's signal and upper bound.
    let mut s = signal.to_vec();
    let mut ub = upper_bound.map(<[f64]>::to_vec);
    if params.cp > 1.0 {
        prepare::compress(&mut s, 1.0 / params.cp);
        if let Some(ub) = ub.as_deref_mut() {
            prepare::compress(ub, 1.0 / params.cp);
        }
    }

    let (s, ub, mut ix_map) = match coords {
        Some(t) => prepare::interpolate(&s, ub.as_deref(), t, dims),
        None => (s, ub, (0..ns).collect()),
    };
    let (mut s, ub) = prepare::remap_to_dft_layout(&s, ub.as_deref(), &mut ix_map, dims);

    let dft = RealDft::new(dims)?;
    let nx_pad = dft.padded_len();
    let nx_real = dft.real_len() as f64;

    let mut s_abs = vec![0.0; nx_pad];
    let max_abs = prepare::abs_scaled_max(&s, &mut s_abs);

    let (il, ir) = cutoff_indices(&params.fs, &params.fc, dims);
    let err_norm = match params.algorithm {
        Algorithm::Projected => 2.0 * nx_real,
        _ => nx_real,
    };
    let mut readout = Readout::new(
        &params.im,
        &params.ie,
        modulator_out,
        error_out,
        &ix_map,
        params.ni,
        max_abs,
        err_norm,
    );

    let mut solver = ApSolver {
        dft,
        il,
        ir,
        s_abs,
        ub: ub.unwrap_or_else(|| vec![f64::INFINITY; nx_pad]),
        et: params.et,
        max_abs,
        ni: params.ni,
    };

    let iterations = match params.algorithm {
        Algorithm::Basic => solver.run_basic(&mut s, &mut readout),
        Algorithm::Accelerated => solver.run_accelerated(&mut s, params.br, &mut readout),
        Algorithm::Projected => solver.run_projected(&mut s, &mut readout),
    }?;

    if params.cp > 1.0 {
        prepare::compress(&mut modulator_out[..params.im.len() * ns], params.cp);
    }

    log::debug!("finished after {} iterations", iterations);
    Ok(iterations)
}
