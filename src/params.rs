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

//! Demodulation parameter bundle

/// Alternating-projection algorithm variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Plain alternating projections between the band-limited set and
    /// the pointwise half-space.
    Basic,
    /// Alternating projections with the λ momentum factor. Converges in
    /// fewer iterations than [`Algorithm::Basic`] but can turn
    /// numerically unstable, signalled by λ dropping below one.
    Accelerated,
    /// Dykstra-style projections with an auxiliary correction term.
    Projected,
}

/// Parameters of one demodulation call.
///
/// The engine never mutates the bundle; the working grid geometry is
/// derived internally from `ns` (uniform sampling) or `nr` (coordinate
/// mode).
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Demodulation algorithm.
    pub algorithm: Algorithm,
    /// Number of signal dimensions. Signals of up to 3 dimensions are
    /// supported.
    pub dimension: usize,
    /// Sampling frequency per dimension (`dimension` elements).
    pub fs: Vec<f64>,
    /// Modulator cutoff frequency per dimension (`dimension` elements).
    /// Each entry must lie in `(0, fs/2]`.
    pub fc: Vec<f64>,
    /// Infeasibility error tolerance in original signal units. The
    /// iteration stops once the error drops to this level or below; a
    /// non-positive value runs all `ni` iterations.
    pub et: f64,
    /// Maximum number of iterations.
    pub ni: usize,
    /// Sample counts of the supplied signal: one entry per dimension
    /// for uniformly sampled signals, or the total sample count in
    /// `ns[0]` when sampling coordinates are given.
    pub ns: Vec<usize>,
    /// Refined uniform grid sizes per dimension. Consulted only in
    /// coordinate mode and ignored otherwise.
    pub nr: Vec<usize>,
    /// Compression exponent. Values above 1 demodulate the compressed
    /// signal `sign(s)·|s|^(1/cp)` and decompress the resulting
    /// modulator estimates; 1 disables compression.
    pub cp: f64,
    /// Stop [`Algorithm::Accelerated`] as soon as the λ factor drops
    /// below one (recommended). Ignored by the other variants.
    pub br: bool,
    /// Iteration indices at which modulator estimates are recorded,
    /// strictly increasing. Index 0 requests the initial estimate.
    pub im: Vec<usize>,
    /// Iteration indices at which infeasibility errors are recorded,
    /// same contract as `im`.
    pub ie: Vec<usize>,
}

impl Parameters {
    /// Create a parameter bundle for a uniformly sampled signal.
    ///
    /// Compression is off, the accelerated variant stops on numerical
    /// instability, and one modulator estimate plus one error value are
    /// recorded at the last iteration.
    pub fn new(
        algorithm: Algorithm,
        dimension: usize,
        fs: Vec<f64>,
        fc: Vec<f64>,
        et: f64,
        ni: usize,
        ns: Vec<usize>,
    ) -> Self {
        Self {
            algorithm,
            dimension,
            fs,
            fc,
            et,
            ni,
            ns,
            nr: Vec::new(),
            cp: 1.0,
            br: true,
            im: vec![ni],
            ie: vec![ni],
        }
    }
}
