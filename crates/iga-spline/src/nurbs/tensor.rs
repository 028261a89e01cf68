//! Tensor-product evaluation shared by surfaces and volumes.
//!
//! Coefficients are stored homogeneously with the first parameter direction
//! running fastest. A rational object carries `dim + 1` channels per
//! coefficient, `(w*x_1, .., w*x_dim, w)`.

use crate::basis::BsplineBasis;

/// Evaluate position and (optionally) first partials at `params`.
///
/// Returns `params.len() + 1` vectors when `derivs` is set (value first,
/// then one partial per direction), otherwise only the value.
pub fn evaluate(
    bases: &[&BsplineBasis],
    coefs: &[f64],
    dim: usize,
    rational: bool,
    params: &[f64],
    derivs: bool,
) -> Vec<Vec<f64>> {
    let nvar = bases.len();
    let stride = dim + rational as usize;

    let local: Vec<(usize, Vec<f64>, Vec<f64>)> = bases
        .iter()
        .zip(params)
        .map(|(b, &t)| {
            if derivs {
                let (span, v, d) = b.evaluate_derivs(t);
                (span - b.degree(), v, d)
            } else {
                let (span, v) = b.evaluate(t);
                (span - b.degree(), v, Vec::new())
            }
        })
        .collect();

    let mut coef_strides = vec![1usize; nvar];
    for a in 1..nvar {
        coef_strides[a] = coef_strides[a - 1] * bases[a - 1].num_coefs();
    }

    let nout = if derivs { nvar + 1 } else { 1 };
    let mut homogeneous = vec![vec![0.0; stride]; nout];

    // Walk the local tensor of non-zero functions
    let orders: Vec<usize> = bases.iter().map(|b| b.order()).collect();
    let mut counter = vec![0usize; nvar];
    loop {
        let mut index = 0;
        for a in 0..nvar {
            index += (local[a].0 + counter[a]) * coef_strides[a];
        }
        let c = &coefs[index * stride..(index + 1) * stride];

        let value: f64 = (0..nvar).map(|a| local[a].1[counter[a]]).product();
        for (h, &x) in homogeneous[0].iter_mut().zip(c) {
            *h += value * x;
        }
        if derivs {
            for d in 0..nvar {
                let factor: f64 = (0..nvar)
                    .map(|a| {
                        if a == d {
                            local[a].2[counter[a]]
                        } else {
                            local[a].1[counter[a]]
                        }
                    })
                    .product();
                for (h, &x) in homogeneous[d + 1].iter_mut().zip(c) {
                    *h += factor * x;
                }
            }
        }

        // Advance the multi-index, first direction fastest
        let mut a = 0;
        loop {
            counter[a] += 1;
            if counter[a] < orders[a] {
                break;
            }
            counter[a] = 0;
            a += 1;
            if a == nvar {
                return dehomogenize(homogeneous, dim, rational);
            }
        }
    }
}

fn dehomogenize(mut homogeneous: Vec<Vec<f64>>, dim: usize, rational: bool) -> Vec<Vec<f64>> {
    if !rational {
        return homogeneous;
    }
    let w = homogeneous[0][dim];
    if w.abs() < 1e-15 {
        for h in &mut homogeneous {
            h.truncate(dim);
        }
        return homogeneous;
    }
    let value: Vec<f64> = homogeneous[0][..dim].iter().map(|x| x / w).collect();
    let mut out = Vec::with_capacity(homogeneous.len());
    out.push(value.clone());
    for h in &homogeneous[1..] {
        let dw = h[dim];
        out.push(
            (0..dim)
                .map(|i| (h[i] - dw * value[i]) / w)
                .collect(),
        );
    }
    out
}

/// Apply a `(new x old)` coefficient map along direction `axis` of a
/// tensor coefficient array with direction sizes `sizes`.
///
/// Returns the new coefficient array; `sizes[axis]` becomes `map.nrows()`.
pub fn apply_axis_map(
    coefs: &[f64],
    sizes: &[usize],
    stride: usize,
    axis: usize,
    map: &nalgebra::DMatrix<f64>,
) -> Vec<f64> {
    let inner: usize = sizes[..axis].iter().product::<usize>() * stride;
    let outer: usize = sizes[axis + 1..].iter().product();
    let n_old = sizes[axis];
    let n_new = map.nrows();

    let mut out = vec![0.0; inner * n_new * outer];
    for o in 0..outer {
        for r in 0..n_new {
            let dst = (o * n_new + r) * inner;
            for c in 0..n_old {
                let factor = map[(r, c)];
                if factor == 0.0 {
                    continue;
                }
                let src = (o * n_old + c) * inner;
                for x in 0..inner {
                    out[dst + x] += factor * coefs[src + x];
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bilinear_patch() {
        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        // (0,0), (1,0), (0,1), (1,1) mapped to z = x + 2y
        let coefs = [0.0, 1.0, 2.0, 3.0];
        let out = evaluate(&[&b, &b], &coefs, 1, false, &[0.25, 0.5], true);
        assert_abs_diff_eq!(out[0][0], 1.25, epsilon = 1e-14);
        assert_abs_diff_eq!(out[1][0], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(out[2][0], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_rational_unit_weights_match_polynomial() {
        let b = BsplineBasis::bezier(2, 0.0, 1.0).unwrap();
        let plain = [0.0, 2.0, 1.0];
        let homog = [0.0, 1.0, 2.0, 1.0, 1.0, 1.0];
        let a = evaluate(&[&b], &plain, 1, false, &[0.3], true);
        let r = evaluate(&[&b], &homog, 1, true, &[0.3], true);
        assert_abs_diff_eq!(a[0][0], r[0][0], epsilon = 1e-14);
        assert_abs_diff_eq!(a[1][0], r[1][0], epsilon = 1e-14);
    }

    #[test]
    fn test_apply_axis_map_second_direction() {
        // 2 x 2 array, duplicate the second direction into 3 rows
        let coefs = [1.0, 2.0, 3.0, 4.0];
        let map = nalgebra::DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.5, 0.5, 0.0, 1.0]);
        let out = apply_axis_map(&coefs, &[2, 2], 1, 1, &map);
        assert_eq!(out, vec![1.0, 2.0, 2.0, 3.0, 3.0, 4.0]);
    }
}
