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

//! Structural validation of the parameter bundle and the input arrays

use crate::error::DemodError;
use crate::params::Parameters;

fn strictly_increasing(schedule: &[usize]) -> bool {
    schedule.windows(2).all(|w| w[0] < w[1])
}

/// Total number of sample points of the original signal.
pub(crate) fn total_samples(par: &Parameters, coord_mode: bool) -> Result<usize, DemodError> {
    if coord_mode {
        Ok(par.ns[0])
    } else {
        par.ns
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or(DemodError::BadNs)
    }
}

/// Checks every contract of the demodulation call that the type system
/// does not already enforce. `m_out_len` and `e_out_len` are the
/// capacities of the caller-allocated snapshot buffers.
pub(crate) fn validate_inputs(
    signal: &[f64],
    par: &Parameters,
    upper_bound: Option<&[f64]>,
    coords: Option<&[f64]>,
    m_out_len: usize,
    e_out_len: usize,
) -> Result<(), DemodError> {
    let d = par.dimension;

    if d < 1 || d > 3 {
        return Err(DemodError::BadDimension);
    }
    if par.fs.len() != d || par.fs.iter().any(|f| !f.is_finite() || *f <= 0.0) {
        return Err(DemodError::BadFs);
    }
    if par.fc.len() != d || par.fc.iter().any(|f| !f.is_finite() || *f <= 0.0) {
        return Err(DemodError::BadFc);
    }
    if par.fc.iter().zip(&par.fs).any(|(fc, fs)| fc / fs > 0.5) {
        return Err(DemodError::BadFcRange);
    }
    if !par.et.is_finite() {
        return Err(DemodError::BadEt);
    }
    if par.ni == 0 {
        return Err(DemodError::BadNi);
    }
    if coords.is_some() {
        if par.ns.is_empty() || par.ns[0] <= 1 {
            return Err(DemodError::BadNs);
        }
        if par.nr.len() != d || par.nr.iter().any(|&n| n <= 1) {
            return Err(DemodError::BadNr);
        }
    } else if par.ns.len() != d || par.ns.iter().any(|&n| n <= 1) {
        return Err(DemodError::BadNs);
    }
    if !par.cp.is_finite() || par.cp < 1.0 {
        return Err(DemodError::BadCp);
    }
    if par.ie.is_empty() {
        return Err(DemodError::BadIeCount);
    }
    if par.im.is_empty() {
        return Err(DemodError::BadImCount);
    }
    if !strictly_increasing(&par.ie) {
        return Err(DemodError::BadIeOrder);
    }
    if !strictly_increasing(&par.im) {
        return Err(DemodError::BadImOrder);
    }

    let ns = total_samples(par, coords.is_some())?;

    if e_out_len < par.ie.len() {
        return Err(DemodError::BadIeCount);
    }
    let m_needed = par.im.len().checked_mul(ns).ok_or(DemodError::BadImCount)?;
    if m_out_len < m_needed {
        return Err(DemodError::BadImCount);
    }

    if signal.len() != ns || signal.iter().any(|s| !s.is_finite()) {
        return Err(DemodError::BadSignal);
    }
    if let Some(ub) = upper_bound {
        if ub.len() != ns {
            return Err(DemodError::BadUpperBound);
        }
        if ub
            .iter()
            .zip(signal)
            .any(|(u, s)| !u.is_finite() || *u < s.abs())
        {
            return Err(DemodError::BadUpperBound);
        }
    }
    if let Some(t) = coords {
        let nt = ns.checked_mul(d).ok_or(DemodError::BadCoords)?;
        if t.len() != nt || t.iter().any(|c| !c.is_finite()) {
            return Err(DemodError::BadCoords);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Algorithm;

    fn base() -> (Vec<f64>, Parameters) {
        let signal = vec![1.0, -0.5, 0.25, -0.125];
        let par = Parameters::new(
            Algorithm::Basic,
            1,
            vec![4.0],
            vec![1.0],
            1e-6,
            10,
            vec![4],
        );
        (signal, par)
    }

    fn check(signal: &[f64], par: &Parameters) -> Result<(), DemodError> {
        validate_inputs(signal, par, None, None, par.im.len() * signal.len(), par.ie.len())
    }

    #[test]
    fn accepts_valid_bundle() {
        let (signal, par) = base();
        assert_eq!(check(&signal, &par), Ok(()));
    }

    #[test]
    fn rejects_bad_dimension() {
        let (signal, mut par) = base();
        par.dimension = 4;
        assert_eq!(check(&signal, &par), Err(DemodError::BadDimension));
    }

    #[test]
    fn rejects_bad_fs() {
        let (signal, mut par) = base();
        par.fs[0] = 0.0;
        assert_eq!(check(&signal, &par), Err(DemodError::BadFs));
        par.fs[0] = f64::NAN;
        assert_eq!(check(&signal, &par), Err(DemodError::BadFs));
        par.fs = vec![];
        assert_eq!(check(&signal, &par), Err(DemodError::BadFs));
    }

    #[test]
    fn rejects_bad_fc() {
        let (signal, mut par) = base();
        par.fc[0] = -1.0;
        assert_eq!(check(&signal, &par), Err(DemodError::BadFc));
    }

    #[test]
    fn rejects_fc_beyond_nyquist() {
        let (signal, mut par) = base();
        par.fc[0] = 2.5;
        assert_eq!(check(&signal, &par), Err(DemodError::BadFcRange));
    }

    #[test]
    fn accepts_fc_at_nyquist() {
        let (signal, mut par) = base();
        par.fc[0] = 2.0;
        assert_eq!(check(&signal, &par), Ok(()));
    }

    #[test]
    fn rejects_bad_et() {
        let (signal, mut par) = base();
        par.et = f64::INFINITY;
        assert_eq!(check(&signal, &par), Err(DemodError::BadEt));
    }

    #[test]
    fn rejects_zero_iterations() {
        let (signal, mut par) = base();
        par.ni = 0;
        assert_eq!(check(&signal, &par), Err(DemodError::BadNi));
    }

    #[test]
    fn rejects_degenerate_sample_counts() {
        let (signal, mut par) = base();
        par.ns = vec![1];
        assert_eq!(check(&signal, &par), Err(DemodError::BadNs));
    }

    #[test]
    fn rejects_degenerate_refined_grid() {
        let (signal, mut par) = base();
        par.ns = vec![4];
        par.nr = vec![1];
        let t = vec![0.0, 1.0, 2.0, 3.0];
        let r = validate_inputs(&signal, &par, None, Some(&t), 4, 1);
        assert_eq!(r, Err(DemodError::BadNr));
    }

    #[test]
    fn rejects_bad_compression() {
        let (signal, mut par) = base();
        par.cp = 0.5;
        assert_eq!(check(&signal, &par), Err(DemodError::BadCp));
    }

    #[test]
    fn rejects_empty_schedules() {
        let (signal, mut par) = base();
        par.ie = vec![];
        assert_eq!(check(&signal, &par), Err(DemodError::BadIeCount));
        let (signal, mut par) = base();
        par.im = vec![];
        assert_eq!(
            validate_inputs(&signal, &par, None, None, 4, 1),
            Err(DemodError::BadImCount)
        );
    }

    #[test]
    fn checks_schedule_counts_before_order() {
        let (signal, mut par) = base();
        par.ie = vec![5, 5];
        par.im = vec![];
        assert_eq!(
            validate_inputs(&signal, &par, None, None, 4, 2),
            Err(DemodError::BadImCount)
        );
    }

    #[test]
    fn rejects_unordered_schedules() {
        let (signal, mut par) = base();
        par.ie = vec![5, 5];
        assert_eq!(check(&signal, &par), Err(DemodError::BadIeOrder));
        let (signal, mut par) = base();
        par.im = vec![3, 2];
        assert_eq!(check(&signal, &par), Err(DemodError::BadImOrder));
    }

    #[test]
    fn rejects_undersized_outputs() {
        let (signal, par) = base();
        assert_eq!(
            validate_inputs(&signal, &par, None, None, 3, 1),
            Err(DemodError::BadImCount)
        );
        assert_eq!(
            validate_inputs(&signal, &par, None, None, 4, 0),
            Err(DemodError::BadIeCount)
        );
    }

    #[test]
    fn rejects_non_finite_signal() {
        let (mut signal, par) = base();
        signal[2] = f64::NAN;
        assert_eq!(check(&signal, &par), Err(DemodError::BadSignal));
    }

    #[test]
    fn rejects_dominated_upper_bound() {
        let (signal, par) = base();
        let ub = vec![1.0, 0.4, 0.25, 0.125];
        let r = validate_inputs(&signal, &par, Some(&ub), None, 4, 1);
        assert_eq!(r, Err(DemodError::BadUpperBound));
    }

    #[test]
    fn rejects_non_finite_coords() {
        let (signal, mut par) = base();
        par.nr = vec![8];
        let t = vec![0.0, 1.0, f64::NAN, 3.0];
        let r = validate_inputs(&signal, &par, None, Some(&t), 4, 1);
        assert_eq!(r, Err(DemodError::BadCoords));
    }
}
