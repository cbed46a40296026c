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

//! The three alternating-projection loop bodies and their shared
//! snapshot machinery
//!
//! All variants iterate between the band-limited subspace (projection
//! through [`RealDft::project_lowpass`]) and the pointwise half-space
//! `s_abs[i] ≤ m[i] ≤ ub[i]`, tracking the squared infeasibility error
//! of each sweep.

use itertools::izip;

use crate::dft::RealDft;
use crate::error::DemodError;

/// Cutoff index pairs `il[k] = 1 + ⌈fc[k] / (fs[k] / n[k])⌉` and
/// `ir[k] = n[k] - il[k]` for every axis.
pub(crate) fn cutoff_indices(fs: &[f64], fc: &[f64], dims: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut il = Vec::with_capacity(dims.len());
    let mut ir = Vec::with_capacity(dims.len());
    for ((&fs, &fc), &n) in fs.iter().zip(fc).zip(dims) {
        let l = 1 + (fc / (fs / n as f64)).ceil() as usize;
        il.push(l);
        ir.push(n - l);
    }
    (il, ir)
}

/// Scheduled read-out of modulator and infeasibility error snapshots.
///
/// Snapshots are descaled by the signal peak and, for the modulator,
/// un-scattered through the sample index map into original sample
/// order. A singleton schedule pointing at the last iteration also
/// fires when the loop converges early, so the final iterate is always
/// recorded; schedules with several entries never synthesize entries
/// for iterations that were skipped.
pub(crate) struct Readout<'a> {
    im: &'a [usize],
    ie: &'a [usize],
    m_out: &'a mut [f64],
    e_out: &'a mut [f64],
    ix_map: &'a [usize],
    ni: usize,
    max_abs: f64,
    err_norm: f64,
    next_m: usize,
    next_e: usize,
}

impl<'a> Readout<'a> {
    pub(crate) fn new(
        im: &'a [usize],
        ie: &'a [usize],
        m_out: &'a mut [f64],
        e_out: &'a mut [f64],
        ix_map: &'a [usize],
        ni: usize,
        max_abs: f64,
        err_norm: f64,
    ) -> Self {
        Self {
            im,
            ie,
            m_out,
            e_out,
            ix_map,
            ni,
            max_abs,
            err_norm,
            next_m: 0,
            next_e: 0,
        }
    }

    fn scaled_error(&self, e: f64) -> f64 {
        self.max_abs * (e / self.err_norm).sqrt()
    }

    fn write_modulator(&mut self, m: &[f64]) {
        let ns = self.ix_map.len();
        let base = self.next_m * ns;
        for (dst, &ix) in self.m_out[base..base + ns].iter_mut().zip(self.ix_map) {
            *dst = m[ix] * self.max_abs;
        }
        self.next_m += 1;
    }

    /// Honors index 0 in either schedule before the first iteration.
    pub(crate) fn record_initial(&mut self, m: &[f64], e: f64) {
        if self.im[0] == 0 {
            self.write_modulator(m);
        }
        if self.ie[0] == 0 {
            self.e_out[0] = self.scaled_error(e);
            self.next_e = 1;
        }
    }

    /// Records whatever falls due at the end of iteration `iter`.
    pub(crate) fn record(&mut self, iter: usize, e: f64, converged: bool, m: &[f64]) {
        if self.next_m < self.im.len()
            && (self.im[self.next_m] == iter
                || (converged && self.im.len() == 1 && self.im[0] == self.ni))
        {
            self.write_modulator(m);
        }
        if self.next_e < self.ie.len()
            && (self.ie[self.next_e] == iter
                || (converged && self.ie.len() == 1 && self.ie[0] == self.ni))
        {
            self.e_out[self.next_e] = self.scaled_error(e);
            self.next_e += 1;
        }
    }

    /// Emits the kept iterate when the accelerated variant stops on a
    /// λ drop, so a singleton last-iteration schedule still yields a
    /// result.
    pub(crate) fn record_kept(&mut self, e: f64, m: &[f64]) {
        if self.next_m < self.im.len() && self.im.len() == 1 && self.im[0] == self.ni {
            self.write_modulator(m);
        }
        if self.next_e < self.ie.len() && self.ie.len() == 1 && self.ie[0] == self.ni {
            self.e_out[self.next_e] = self.scaled_error(e);
            self.next_e += 1;
        }
    }
}

/// Shared state of one demodulation run: the committed transform, the
/// cutoff indices, the normalized absolute signal, and the pointwise
/// bounds. The working arrays of the individual variants live in their
/// loop bodies.
pub(crate) struct ApSolver {
    pub(crate) dft: RealDft,
    pub(crate) il: Vec<usize>,
    pub(crate) ir: Vec<usize>,
    pub(crate) s_abs: Vec<f64>,
    pub(crate) ub: Vec<f64>,
    pub(crate) et: f64,
    pub(crate) max_abs: f64,
    pub(crate) ni: usize,
}

impl ApSolver {
    /// Termination threshold on the squared infeasibility error, in
    /// normalized units. Non-positive tolerances are passed through as
    /// sentinels so the loop runs to the iteration limit.
    fn etol(&self, norm_factor: f64) -> f64 {
        if self.et > 0.0 {
            let scaled = self.et / self.max_abs;
            scaled * scaled * self.dft.real_len() as f64 * norm_factor
        } else {
            self.et
        }
    }

    /// AP-Basic: alternately projects the iterate onto the band-limited
    /// set and clamps it back into the half-space.
    pub(crate) fn run_basic(
        &mut self,
        s: &mut [f64],
        readout: &mut Readout,
    ) -> Result<usize, DemodError> {
        let etol = self.etol(1.0);

        let mut e = 0.0;
        for (s, &sa) in s.iter_mut().zip(&self.s_abs) {
            *s = sa;
            e += sa * sa;
        }
        readout.record_initial(s, e);

        let mut iter = 0;
        while e > etol && iter < self.ni {
            iter += 1;
            self.dft.project_lowpass(s, &self.il, &self.ir)?;
            e = 0.0;
            for (s, &lo, &hi) in izip!(s.iter_mut(), &self.s_abs, &self.ub) {
                let s_old = *s;
                if *s < lo {
                    *s = lo;
                } else if *s > hi {
                    *s = hi;
                }
                let d = *s - s_old;
                e += d * d;
            }
            readout.record(iter, e, e <= etol, s);
        }
        Ok(iter)
    }

    /// AP-Accelerated: Polyak momentum on the projection step. With
    /// `br` set the loop stops as soon as λ drops below one, keeping
    /// the last numerically valid iterate.
    pub(crate) fn run_accelerated(
        &mut self,
        s: &mut [f64],
        br: bool,
        readout: &mut Readout,
    ) -> Result<usize, DemodError> {
        let etol = self.etol(1.0);

        let mut a = vec![0.0; s.len()];
        let mut b = self.s_abs.clone();
        s.copy_from_slice(&self.s_abs);
        let mut nom: f64 = b.iter().map(|v| v * v).sum();
        let mut e = nom;
        readout.record_initial(&self.s_abs, e);

        let mut iter = 0;
        while e > etol && iter < self.ni {
            iter += 1;
            self.dft.project_lowpass(&mut b, &self.il, &self.ir)?;

            let denom: f64 = b.iter().map(|v| v * v).sum();
            let lambda = if denom != 0.0 { nom / denom } else { 1.0 };
            if br && lambda < 1.0 {
                log::debug!("λ = {} after {} iterations, stopping early", lambda, iter);
                readout.record_kept(e, s);
                break;
            }

            nom = 0.0;
            for (a, b, s, &lo, &hi) in
                izip!(a.iter_mut(), b.iter_mut(), s.iter_mut(), &self.s_abs, &self.ub)
            {
                *a += lambda * *b;
                let mut v = *a;
                if v < lo {
                    v = lo;
                } else if v > hi {
                    v = hi;
                }
                *s = v;
                *b = v - *a;
                nom += *b * *b;
            }
            e = nom;
            readout.record(iter, e, e <= etol, s);
        }
        Ok(iter)
    }

    /// AP-Projected: Dykstra's projections with the auxiliary
    /// correction `c` removing the bias of plain alternation, hence
    /// two residual terms per cell in the error.
    pub(crate) fn run_projected(
        &mut self,
        s: &mut [f64],
        readout: &mut Readout,
    ) -> Result<usize, DemodError> {
        let etol = self.etol(2.0);

        let mut a = self.s_abs.clone();
        let mut c = self.s_abs.clone();
        let mut e = 0.0;
        for (s, &sa) in s.iter_mut().zip(&self.s_abs) {
            *s = sa;
            e += sa * sa;
        }
        readout.record_initial(s, e);

        let mut iter = 0;
        while e > etol && iter < self.ni {
            iter += 1;
            self.dft.project_lowpass(&mut a, &self.il, &self.ir)?;
            e = 0.0;
            for (s, a, c, &lo, &hi) in
                izip!(s.iter_mut(), a.iter_mut(), c.iter_mut(), &self.s_abs, &self.ub)
            {
                let aux = *s - *a;
                let mut v = *a - *c;
                if v < lo {
                    v = lo;
                } else if v > hi {
                    v = hi;
                }
                *s = v;
                let aux2 = *s - *a;
                *c += aux2;
                *a = *s;
                e += aux * aux + aux2 * aux2;
            }
            readout.record(iter, e, e <= etol, s);
        }
        Ok(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_indices_follow_the_grid_resolution() {
        let (il, ir) = cutoff_indices(&[16.0], &[4.0], &[16]);
        assert_eq!(il, vec![5]);
        assert_eq!(ir, vec![11]);

        // at the Nyquist limit the retained band covers the whole
        // half-spectrum and the mid band vanishes
        let (il, ir) = cutoff_indices(&[16.0], &[8.0], &[16]);
        assert_eq!(il, vec![9]);
        assert_eq!(ir, vec![7]);
    }

    fn snapshot_fixture<'a>(
        im: &'a [usize],
        ie: &'a [usize],
        m_out: &'a mut [f64],
        e_out: &'a mut [f64],
        ix_map: &'a [usize],
    ) -> Readout<'a> {
        Readout::new(im, ie, m_out, e_out, ix_map, 10, 2.0, 4.0)
    }

    #[test]
    fn index_zero_requests_the_initial_estimate() {
        let ix_map = [0, 1];
        let mut m_out = [0.0; 2];
        let mut e_out = [0.0; 1];
        let mut r = snapshot_fixture(&[0], &[0], &mut m_out, &mut e_out, &ix_map);
        r.record_initial(&[0.5, 0.25], 1.0);
        // later iterations have nowhere left to write
        r.record(1, 0.5, false, &[9.0, 9.0]);
        assert_eq!(m_out, [1.0, 0.5]);
        assert_eq!(e_out, [2.0 * 0.5]);
    }

    #[test]
    fn singleton_schedule_fires_on_early_convergence() {
        let ix_map = [0, 1];
        let mut m_out = [0.0; 2];
        let mut e_out = [0.0; 1];
        let mut r = snapshot_fixture(&[10], &[10], &mut m_out, &mut e_out, &ix_map);
        r.record_initial(&[0.5, 0.25], 1.0);
        r.record(3, 0.0, true, &[0.5, 0.25]);
        assert_eq!(m_out, [1.0, 0.5]);
        assert_eq!(e_out, [0.0]);
    }

    #[test]
    fn multi_entry_schedules_never_synthesize_entries() {
        let ix_map = [0, 1];
        let mut m_out = [0.0; 4];
        let mut e_out = [0.0; 2];
        let mut r = snapshot_fixture(&[2, 10], &[2, 10], &mut m_out, &mut e_out, &ix_map);
        r.record(2, 1.0, false, &[0.5, 0.25]);
        r.record(3, 0.0, true, &[0.75, 0.125]);
        assert_eq!(m_out, [1.0, 0.5, 0.0, 0.0]);
        assert_eq!(e_out, [1.0, 0.0]);
    }

    #[test]
    fn modulator_snapshots_unscatter_through_the_index_map() {
        let ix_map = [2, 0];
        let mut m_out = [0.0; 2];
        let mut e_out = [0.0; 1];
        let mut r = snapshot_fixture(&[1], &[1], &mut m_out, &mut e_out, &ix_map);
        r.record(1, 0.25, false, &[0.1, 0.9, 0.3]);
        assert_eq!(m_out, [0.6, 0.2]);
    }
}
