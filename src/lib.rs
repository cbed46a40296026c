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

//! This crate recovers the non-negative, band-limited envelope (the
//! *modulator*) of a real-valued signal whose remaining factor is an
//! unknown wideband, zero-mean *carrier*. Signals sampled on 1-, 2-,
//! or 3-dimensional grids are supported, uniformly sampled or given as
//! scattered samples with coordinates, with an optional pointwise
//! upper bound on the envelope.
//!
//! Demodulation runs as a convex feasibility problem: the estimate is
//! projected back and forth between the subspace of band-limited
//! arrays (realized through a real DFT) and the half-space of arrays
//! dominating the absolute signal, in one of three variants
//! ([`Algorithm::Basic`], [`Algorithm::Accelerated`],
//! [`Algorithm::Projected`]).
//!
//! Usage
//! -----
//!
//! ```
//! use ap_demod::{demodulate, Algorithm, Parameters};
//!
//! // a slow envelope over a fast carrier, sampled at 1 kHz
//! let n = 256;
//! let signal: Vec<f64> = (0..n)
//!     .map(|i| {
//!         let t = i as f64 / 1000.0;
//!         let envelope = 1.1 + (2.0 * std::f64::consts::PI * 5.0 * t).cos();
//!         let carrier = (2.0 * std::f64::consts::PI * 250.0 * t).cos();
//!         envelope * carrier
//!     })
//!     .collect();
//!
//! // AP-Basic, envelope band-limited to 20 Hz, 30 iterations
//! let params = Parameters::new(
//!     Algorithm::Basic, 1, vec![1000.0], vec![20.0], -1.0, 30, vec![n],
//! );
//! let mut modulator = vec![0.0; n];
//! let mut error = vec![0.0; 1];
//! let iterations = demodulate(&signal, &params, None, None, &mut modulator, &mut error)?;
//! assert_eq!(iterations, 30);
//! assert!(modulator.iter().zip(&signal).all(|(m, s)| *m >= s.abs() - 1e-9));
//! # Ok::<(), ap_demod::DemodError>(())
//! ```

mod algorithms;
mod dft;
mod engine;
mod error;
mod params;
mod prepare;
mod validation;

pub use engine::demodulate;
pub use dft::RealDft;
pub use error::{set_exit_on_error, DemodError};
pub use params::{Algorithm, Parameters};
