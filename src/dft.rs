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

//! Real DFT over a 1-, 2-, or 3-dimensional grid in the packed
//! conjugate-even layout
//!
//! The working buffer stores the grid with the last axis padded to
//! `2 * (n_last / 2 + 1)` real slots per line. The real samples of a
//! line occupy its first `n_last` slots; after a forward transform the
//! same line holds the `n_last / 2 + 1` half-spectrum bins of that line
//! as interleaved (re, im) pairs. Along the remaining axes the spectrum
//! is a plain complex grid, so forward and backward transforms compose
//! a real↔half-complex pass over the last axis with one complex pass
//! per leading axis.

use std::sync::Arc;

use num_complex::Complex64;
use num_traits::Zero;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::DemodError;

/// Committed transform descriptor for one grid shape.
///
/// All plans and scratch buffers are allocated up front; `forward`,
/// `backward` and `project_lowpass` run in place on a caller buffer of
/// exactly [`RealDft::padded_len`] elements.
pub struct RealDft {
    dims: Vec<usize>,
    n_real: usize,
    n_pad: usize,
    line_len: usize,
    line_pad: usize,
    bins: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    axis_fwd: Vec<Arc<dyn Fft<f64>>>,
    axis_inv: Vec<Arc<dyn Fft<f64>>>,
    line_re: Vec<f64>,
    line_cx: Vec<Complex64>,
    r2c_scratch: Vec<Complex64>,
    c2r_scratch: Vec<Complex64>,
    axis_cx: Vec<Complex64>,
    axis_scratch: Vec<Complex64>,
}

impl RealDft {
    /// Plan transforms for a grid of the given axis sizes (2 or more
    /// points per axis, up to 3 axes).
    pub fn new(dims: &[usize]) -> Result<Self, DemodError> {
        if dims.is_empty() || dims.len() > 3 || dims.iter().any(|&n| n < 2) {
            return Err(DemodError::DftCreate);
        }
        let n_real = dims
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or(DemodError::DftCreate)?;
        let line_len = *dims.last().unwrap();
        let bins = line_len / 2 + 1;
        let line_pad = 2 * bins;
        let n_pad = (n_real / line_len)
            .checked_mul(line_pad)
            .ok_or(DemodError::DftCreate)?;

        let mut real_planner = RealFftPlanner::<f64>::new();
        let r2c = real_planner.plan_fft_forward(line_len);
        let c2r = real_planner.plan_fft_inverse(line_len);
        let r2c_scratch = r2c.make_scratch_vec();
        let c2r_scratch = c2r.make_scratch_vec();

        let mut planner = FftPlanner::new();
        let mut axis_fwd = Vec::new();
        let mut axis_inv = Vec::new();
        for &n in &dims[..dims.len() - 1] {
            axis_fwd.push(planner.plan_fft_forward(n));
            axis_inv.push(planner.plan_fft_inverse(n));
        }
        let axis_len = dims[..dims.len() - 1].iter().copied().max().unwrap_or(0);
        let scratch_len = axis_fwd
            .iter()
            .chain(&axis_inv)
            .map(|fft| fft.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Ok(Self {
            dims: dims.to_vec(),
            n_real,
            n_pad,
            line_len,
            line_pad,
            bins,
            r2c,
            c2r,
            axis_fwd,
            axis_inv,
            line_re: vec![0.0; line_len],
            line_cx: vec![Complex64::zero(); bins],
            r2c_scratch,
            c2r_scratch,
            axis_cx: vec![Complex64::zero(); axis_len],
            axis_scratch: vec![Complex64::zero(); scratch_len],
        })
    }

    /// Number of real grid points, `∏ dims`.
    pub fn real_len(&self) -> usize {
        self.n_real
    }

    /// Length of the padded working buffer.
    pub fn padded_len(&self) -> usize {
        self.n_pad
    }

    /// Half-spectrum bins per last-axis line.
    pub fn bins(&self) -> usize {
        self.bins
    }

    fn check(&self, buf: &[f64]) -> Result<(), DemodError> {
        if buf.len() != self.n_pad {
            return Err(DemodError::DftCommit);
        }
        Ok(())
    }

    /// In-place real → half-complex transform of the whole grid.
    pub fn forward(&mut self, buf: &mut [f64]) -> Result<(), DemodError> {
        self.check(buf)?;
        for line in buf.chunks_exact_mut(self.line_pad) {
            self.line_re.copy_from_slice(&line[..self.line_len]);
            self.r2c
                .process_with_scratch(&mut self.line_re, &mut self.line_cx, &mut self.r2c_scratch)
                .map_err(|_| DemodError::DftCompute)?;
            for (k, c) in self.line_cx.iter().enumerate() {
                line[2 * k] = c.re;
                line[2 * k + 1] = c.im;
            }
        }
        for axis in 0..self.dims.len() - 1 {
            self.axis_pass(buf, axis, false);
        }
        Ok(())
    }

    /// In-place half-complex → real transform, scaled by `1 / ∏ dims`
    /// so that `backward(forward(x)) == x` up to rounding. The padding
    /// slots of each line are left as scratch.
    pub fn backward(&mut self, buf: &mut [f64]) -> Result<(), DemodError> {
        self.check(buf)?;
        for axis in (0..self.dims.len() - 1).rev() {
            self.axis_pass(buf, axis, true);
        }
        let scale = 1.0 / self.n_real as f64;
        for line in buf.chunks_exact_mut(self.line_pad) {
            for (k, c) in self.line_cx.iter_mut().enumerate() {
                *c = Complex64::new(line[2 * k], line[2 * k + 1]);
            }
            // After the leading-axis passes each line is the spectrum of
            // a real sequence again; the half-complex inverse requires
            // its DC (and Nyquist) bins to be exactly real.
            self.line_cx[0].im = 0.0;
            if self.line_len % 2 == 0 {
                self.line_cx[self.bins - 1].im = 0.0;
            }
            self.c2r
                .process_with_scratch(&mut self.line_cx, &mut self.line_re, &mut self.c2r_scratch)
                .map_err(|_| DemodError::DftCompute)?;
            for (dst, &v) in line[..self.line_len].iter_mut().zip(&self.line_re) {
                *dst = v * scale;
            }
        }
        Ok(())
    }

    /// Projection onto the band-limited set: forward transform, zero
    /// every frequency bin outside the axis-aligned low-pass box given
    /// by the cutoff index pairs, backward transform.
    ///
    /// Along the packed last axis the stop band starts at bin
    /// `il[last]` and runs through the padded end of each line; along
    /// every leading axis the retained band is `[0, il) ∪ (ir, n)`, so
    /// lines whose axis index falls in `[il, ir]` are cleared whole.
    pub fn project_lowpass(
        &mut self,
        buf: &mut [f64],
        il: &[usize],
        ir: &[usize],
    ) -> Result<(), DemodError> {
        let d = self.dims.len();
        if il.len() != d || ir.len() != d {
            return Err(DemodError::DftSet);
        }
        self.forward(buf)?;
        let kill_from = 2 * il[d - 1].min(self.bins);
        match d {
            1 => {
                for x in &mut buf[kill_from..] {
                    *x = 0.0;
                }
            }
            2 => {
                for (i0, line) in buf.chunks_exact_mut(self.line_pad).enumerate() {
                    let from = if i0 >= il[0] && i0 <= ir[0] { 0 } else { kill_from };
                    for x in &mut line[from..] {
                        *x = 0.0;
                    }
                }
            }
            _ => {
                let n1 = self.dims[1];
                for (li, line) in buf.chunks_exact_mut(self.line_pad).enumerate() {
                    let (i0, i1) = (li / n1, li % n1);
                    let mid = (i0 >= il[0] && i0 <= ir[0]) || (i1 >= il[1] && i1 <= ir[1]);
                    let from = if mid { 0 } else { kill_from };
                    for x in &mut line[from..] {
                        *x = 0.0;
                    }
                }
            }
        }
        self.backward(buf)
    }

    /// One complex transform along a leading axis, applied to every
    /// strided column of the packed spectrum.
    fn axis_pass(&mut self, buf: &mut [f64], axis: usize, inverse: bool) {
        let fft = if inverse {
            self.axis_inv[axis].clone()
        } else {
            self.axis_fwd[axis].clone()
        };
        let len = self.dims[axis];
        let stride: usize =
            self.dims[axis + 1..self.dims.len() - 1].iter().product::<usize>() * self.bins;
        let n_cx = self.n_pad / 2;
        let column = &mut self.axis_cx[..len];
        let scratch = &mut self.axis_scratch[..fft.get_inplace_scratch_len()];
        for base in (0..n_cx).step_by(len * stride) {
            for off in 0..stride {
                let start = base + off;
                for (i, c) in column.iter_mut().enumerate() {
                    let p = 2 * (start + i * stride);
                    *c = Complex64::new(buf[p], buf[p + 1]);
                }
                fft.process_with_scratch(column, scratch);
                for (i, c) in column.iter().enumerate() {
                    let p = 2 * (start + i * stride);
                    buf[p] = c.re;
                    buf[p + 1] = c.im;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Fill the real cells of a padded buffer with uniform noise,
    /// leaving the padding slots at zero.
    fn random_grid(dims: &[usize], seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let dft = RealDft::new(dims).unwrap();
        let line_len = *dims.last().unwrap();
        let line_pad = 2 * (line_len / 2 + 1);
        let mut buf = vec![0.0; dft.padded_len()];
        for line in buf.chunks_exact_mut(line_pad) {
            for x in &mut line[..line_len] {
                *x = rng.gen_range(-1.0..1.0);
            }
        }
        buf
    }

    fn max_real_cell_diff(a: &[f64], b: &[f64], dims: &[usize]) -> f64 {
        let line_len = *dims.last().unwrap();
        let line_pad = 2 * (line_len / 2 + 1);
        a.chunks_exact(line_pad)
            .zip(b.chunks_exact(line_pad))
            .flat_map(|(la, lb)| la[..line_len].iter().zip(&lb[..line_len]))
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    fn roundtrip(dims: &[usize], seed: u64) {
        let mut dft = RealDft::new(dims).unwrap();
        let reference = random_grid(dims, seed);
        let mut buf = reference.clone();
        dft.forward(&mut buf).unwrap();
        dft.backward(&mut buf).unwrap();
        assert!(max_real_cell_diff(&reference, &buf, dims) < 1e-10);
    }

    #[test]
    fn roundtrip_1d_small() {
        roundtrip(&[8], 1);
    }

    #[test]
    fn roundtrip_1d_large() {
        roundtrip(&[16384], 2);
    }

    #[test]
    fn roundtrip_2d() {
        roundtrip(&[201, 201], 3);
    }

    #[test]
    fn roundtrip_3d() {
        roundtrip(&[32, 32, 32], 4);
    }

    #[test]
    fn roundtrip_odd_last_axis() {
        roundtrip(&[15], 5);
        roundtrip(&[6, 9], 6);
    }

    #[test]
    fn lowpass_projection_is_idempotent() {
        let dims = [32, 16];
        let il = [3, 4];
        let ir = [32 - 3, 16 - 4];
        let mut dft = RealDft::new(&dims).unwrap();
        let mut once = random_grid(&dims, 7);
        dft.project_lowpass(&mut once, &il, &ir).unwrap();
        let mut twice = once.clone();
        dft.project_lowpass(&mut twice, &il, &ir).unwrap();
        let diff = once
            .iter()
            .zip(&twice)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max);
        assert!(diff < 1e-10);
    }

    #[test]
    fn full_band_projection_is_identity() {
        // il at or beyond the bin count retains the entire spectrum
        let dims = [16];
        let mut dft = RealDft::new(&dims).unwrap();
        let reference = random_grid(&dims, 8);
        let mut buf = reference.clone();
        dft.project_lowpass(&mut buf, &[9], &[7]).unwrap();
        assert!(max_real_cell_diff(&reference, &buf, &dims) < 1e-10);
    }

    #[test]
    fn rejects_bad_grids_and_buffers() {
        assert_eq!(RealDft::new(&[]).err(), Some(DemodError::DftCreate));
        assert_eq!(RealDft::new(&[8, 1]).err(), Some(DemodError::DftCreate));
        assert_eq!(
            RealDft::new(&[2, 2, 2, 2]).err(),
            Some(DemodError::DftCreate)
        );

        let mut dft = RealDft::new(&[8]).unwrap();
        let mut short = vec![0.0; 8];
        assert_eq!(dft.forward(&mut short), Err(DemodError::DftCommit));
        let mut buf = vec![0.0; dft.padded_len()];
        assert_eq!(
            dft.project_lowpass(&mut buf, &[1, 1], &[7, 7]),
            Err(DemodError::DftSet)
        );
    }
}
