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

//! Signal preparation: power-law compression, gridding of non-uniform
//! samples, remapping into the padded DFT layout, and normalization

/// Power-law compression `x ↦ sign(x) · |x|^p`, in place.
///
/// Demodulation compresses with `p = 1/cp` and decompresses the
/// modulator snapshots with `p = cp`, so the two calls cancel on any
/// fixed sign pattern.
pub(crate) fn compress(x: &mut [f64], p: f64) {
    for v in x.iter_mut() {
        *v = v.signum() * v.abs().powf(p);
    }
}

/// Writes `|src| / max|src|` into `dst` and returns `max|src|`.
pub(crate) fn abs_scaled_max(src: &[f64], dst: &mut [f64]) -> f64 {
    let mut max = 0.0f64;
    for (d, s) in dst.iter_mut().zip(src) {
        *d = s.abs();
        if *d > max {
            max = *d;
        }
    }
    for d in dst.iter_mut() {
        *d /= max;
    }
    max
}

fn axis_minmax(column: &[f64]) -> (f64, f64) {
    let mut min = column[0];
    let mut max = column[0];
    for &v in &column[1..] {
        if v < min {
            min = v;
        } else if v > max {
            max = v;
        }
    }
    (min, max)
}

/// Nearest-node gridding of `ns` scattered samples onto the refined
/// uniform grid of sizes `nr`.
///
/// Coordinates are column-major: `coords[i + k * ns]` is the `k`-th
/// coordinate of sample `i`. Every sample snaps to its nearest grid
/// node; when several samples share a node, the one with the smallest
/// squared distance supplies the node value and the others are
/// shadowed. Shadowed samples still map to their node in the returned
/// index map. Nodes touched by no sample hold 0 for the signal and +∞
/// for the upper bound, which leaves them constrained by
/// band-limitedness alone.
pub(crate) fn interpolate(
    s: &[f64],
    ub: Option<&[f64]>,
    coords: &[f64],
    nr: &[usize],
) -> (Vec<f64>, Option<Vec<f64>>, Vec<usize>) {
    let ns = s.len();
    let d = nr.len();
    let nr_total: usize = nr.iter().product();

    let mut grid_s = vec![0.0; nr_total];
    let mut grid_ub = ub.map(|_| vec![f64::INFINITY; nr_total]);
    let mut ix_map = vec![0usize; ns];

    let mut tmin = vec![0.0; d];
    let mut dt = vec![0.0; d];
    for k in 0..d {
        let (lo, hi) = axis_minmax(&coords[k * ns..(k + 1) * ns]);
        tmin[k] = lo;
        dt[k] = (hi - lo) / (nr[k] - 1) as f64;
    }

    // Ownership record per node: winning sample and its squared
    // distance.
    let mut owner = vec![usize::MAX; nr_total];
    let mut best_r2 = vec![0.0f64; nr_total];

    for i in 0..ns {
        let mut node = 0usize;
        let mut stride = 1usize;
        let mut r2 = 0.0;
        for k in 0..d {
            let tv = coords[i + k * ns];
            let ik = ((tv - tmin[k]) / dt[k]).round() as usize;
            let off = tv - tmin[k] - ik as f64 * dt[k];
            r2 += off * off;
            node += ik * stride;
            stride *= nr[k];
        }
        ix_map[i] = node;
        if owner[node] == usize::MAX || r2 < best_r2[node] {
            grid_s[node] = s[i];
            if let (Some(grid_ub), Some(ub)) = (grid_ub.as_mut(), ub) {
                grid_ub[node] = ub[i];
            }
            owner[node] = i;
            best_r2[node] = r2;
        }
    }

    (grid_s, grid_ub, ix_map)
}

/// Re-indexes a naturally ordered grid (axis 0 fastest) into the padded
/// DFT layout (last axis fastest, padded to `2 * (n / 2 + 1)` real
/// slots per line), and rewrites `ix_map` to point into the new
/// layout. Cells with no upper bound default to +∞, and the padding
/// slots start at zero.
pub(crate) fn remap_to_dft_layout(
    s: &[f64],
    ub: Option<&[f64]>,
    ix_map: &mut [usize],
    dims: &[usize],
) -> (Vec<f64>, Option<Vec<f64>>) {
    let d = dims.len();
    let n: usize = dims.iter().product();
    let line_len = dims[d - 1];
    let line_pad = 2 * (line_len / 2 + 1);
    let n_pad = n / line_len * line_pad;

    let mut out_s = vec![0.0; n_pad];
    let mut out_ub = ub.map(|_| vec![f64::INFINITY; n_pad]);

    if d == 1 {
        out_s[..n].copy_from_slice(s);
        if let (Some(out_ub), Some(ub)) = (out_ub.as_mut(), ub) {
            out_ub[..n].copy_from_slice(ub);
        }
        return (out_s, out_ub);
    }

    // DFT-layout strides per axis; the natural layout has axis 0
    // contiguous, stride dims[0] on axis 1, and so on.
    let mut strides = vec![1usize; d];
    strides[d - 2] = line_pad;
    if d == 3 {
        strides[0] = dims[1] * line_pad;
    }

    let mut nat_to_dft = vec![0usize; n];
    for (nat, &value) in s.iter().enumerate() {
        let i0 = nat % dims[0];
        let rest = nat / dims[0];
        let mut dft = i0 * strides[0];
        if d == 2 {
            dft += rest * strides[1];
        } else {
            dft += (rest % dims[1]) * strides[1] + (rest / dims[1]) * strides[2];
        }
        nat_to_dft[nat] = dft;
        out_s[dft] = value;
        if let (Some(out_ub), Some(ub)) = (out_ub.as_mut(), ub) {
            out_ub[dft] = ub[nat];
        }
    }
    for ix in ix_map.iter_mut() {
        *ix = nat_to_dft[*ix];
    }

    (out_s, out_ub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn compression_is_an_involution() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let reference: Vec<f64> = (0..256).map(|_| rng.gen_range(-2.0..2.0)).collect();
        for &cp in &[1.0, 1.5, 2.7] {
            let mut x = reference.clone();
            compress(&mut x, 1.0 / cp);
            compress(&mut x, cp);
            for (a, b) in x.iter().zip(&reference) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn compression_keeps_signs() {
        let mut x = vec![-4.0, 0.0, 0.25];
        compress(&mut x, 0.5);
        assert_eq!(x, vec![-2.0, 0.0, 0.5]);
    }

    #[test]
    fn normalization_returns_peak() {
        let src = vec![0.5, -2.0, 1.0, 0.0];
        let mut dst = vec![0.0; 4];
        let max = abs_scaled_max(&src, &mut dst);
        assert_eq!(max, 2.0);
        assert_eq!(dst, vec![0.25, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn interpolation_snaps_to_nearest_node() {
        // nodes at 0, 31/30, 62/30, 3.1; samples 1 and 2 share the last
        // node and the closer one wins
        let s = vec![1.0, 2.0, 3.0];
        let ub = vec![1.5, 2.5, 3.5];
        let coords = vec![0.0, 3.0, 3.1];
        let (grid_s, grid_ub, ix_map) = interpolate(&s, Some(&ub), &coords, &[4]);
        assert_eq!(ix_map, vec![0, 3, 3]);
        assert_eq!(grid_s, vec![1.0, 0.0, 0.0, 3.0]);
        let grid_ub = grid_ub.unwrap();
        assert_eq!(grid_ub[0], 1.5);
        assert!(grid_ub[1].is_infinite() && grid_ub[2].is_infinite());
        assert_eq!(grid_ub[3], 3.5);
    }

    #[test]
    fn interpolation_keeps_closer_sample_regardless_of_order() {
        let s = vec![1.0, 2.0];
        let coords = vec![0.95, 0.0];
        let (grid_s, _, ix_map) = interpolate(&s, None, &coords, &[2]);
        assert_eq!(ix_map, vec![1, 0]);
        assert_eq!(grid_s, vec![2.0, 1.0]);

        // shared node: the later but closer sample replaces the earlier
        let s = vec![4.0, 5.0, 6.0];
        let coords = vec![0.0, 0.8, 1.0];
        let (grid_s, _, ix_map) = interpolate(&s, None, &coords, &[2]);
        assert_eq!(ix_map, vec![0, 1, 1]);
        assert_eq!(grid_s, vec![4.0, 6.0]);
    }

    #[test]
    fn remap_1d_is_a_straight_copy() {
        let s = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut ix = vec![0, 2, 4];
        let (out, _) = remap_to_dft_layout(&s, None, &mut ix, &[5]);
        assert_eq!(out.len(), 6);
        assert_eq!(&out[..5], &s[..]);
        assert_eq!(out[5], 0.0);
        assert_eq!(ix, vec![0, 2, 4]);
    }

    #[test]
    fn remap_2d_pads_the_last_axis() {
        // dims (3, 4): natural index i0 + 3*i1, padded line of 6 slots
        let dims = [3, 4];
        let s: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let ub: Vec<f64> = (0..12).map(|v| v as f64 + 0.5).collect();
        let mut ix = vec![0, 7, 11];
        let (out_s, out_ub) = remap_to_dft_layout(&s, Some(&ub), &mut ix, &dims);
        assert_eq!(out_s.len(), 18);
        // cell (i0=1, i1=2): natural 1 + 3*2 = 7, layout 1*6 + 2 = 8
        assert_eq!(out_s[8], 7.0);
        assert_eq!(out_ub.as_ref().unwrap()[8], 7.5);
        // cell (i0=2, i1=3): natural 11, layout 2*6 + 3 = 15
        assert_eq!(ix, vec![0, 8, 15]);
        // padding slots stay zero / unbounded
        assert_eq!(out_s[4], 0.0);
        assert!(out_ub.unwrap()[4].is_infinite());
    }

    #[test]
    fn remap_3d_strides() {
        // dims (2, 3, 4): cell (1, 2, 3) sits at natural 23 and at
        // 1*18 + 2*6 + 3 = 33 in the padded layout
        let dims = [2, 3, 4];
        let s: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let mut ix = vec![23];
        let (out, _) = remap_to_dft_layout(&s, None, &mut ix, &dims);
        assert_eq!(out.len(), 36);
        assert_eq!(out[33], 23.0);
        assert_eq!(ix, vec![33]);
    }
}
