//! Knot vector utilities: span lookup and basis function evaluation.

/// Find the knot span index for parameter `t` in a clamped knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`, clamped to
/// `degree..=n` so that the right end of the domain belongs to the last
/// non-empty span.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of coefficients minus 1
/// * `t` - Parameter value
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        // Step back over repeated end knots so the span is non-empty.
        let mut span = n;
        while span > degree && knots[span] >= knots[n + 1] {
            span -= 1;
        }
        return span;
    }
    if t <= knots[degree] {
        let mut span = degree;
        while span < n && knots[span + 1] <= knots[degree] {
            span += 1;
        }
        return span;
    }

    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}

/// Compute the `degree + 1` non-vanishing basis functions at parameter `t`.
///
/// Entry `r` of the result is `N_{span-degree+r,degree}(t)`.
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute basis functions and their first derivatives at parameter `t`.
///
/// The derivatives come from the degree-lowered basis:
/// `N'_{i,p} = p/(t_{i+p}-t_i) N_{i,p-1} - p/(t_{i+p+1}-t_{i+1}) N_{i+1,p-1}`.
pub fn basis_functions_derivs(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
) -> (Vec<f64>, Vec<f64>) {
    let values = basis_functions(degree, knots, span, t);
    let mut derivs = vec![0.0; degree + 1];
    if degree == 0 {
        return (values, derivs);
    }

    // lower[r] = N_{span-degree+1+r, degree-1}(t), r in 0..degree
    let lower = basis_functions(degree - 1, knots, span, t);
    let p = degree as f64;

    for (r, d) in derivs.iter_mut().enumerate() {
        let i = span - degree + r;
        let mut value = 0.0;
        if r >= 1 {
            let denom = knots[i + degree] - knots[i];
            if denom > 0.0 {
                value += p * lower[r - 1] / denom;
            }
        }
        if r < degree {
            let denom = knots[i + degree + 1] - knots[i + 1];
            if denom > 0.0 {
                value -= p * lower[r] / denom;
            }
        }
        *d = value;
    }

    (values, derivs)
}
