//! Univariate B-spline basis with refinement operators.
//!
//! Refinements (knot insertion, order raising) return the refined basis
//! together with the linear map taking coefficients of the old basis to
//! coefficients of the new one. Volumes and surfaces apply that map along
//! one parameter direction of their coefficient array.

use iga_core::{IgaError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::nurbs::{basis_functions, basis_functions_derivs, find_span};

/// A clamped (open) B-spline basis: `order` = degree + 1, the first and last
/// knots repeated `order` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BsplineBasis {
    order: usize,
    knots: Vec<f64>,
}

impl BsplineBasis {
    pub fn new(order: usize, knots: Vec<f64>) -> Result<Self> {
        if order == 0 {
            return Err(IgaError::Geometry("B-spline order must be at least 1".into()));
        }
        if knots.len() < 2 * order {
            return Err(IgaError::Geometry(format!(
                "Knot vector of length {} too short for order {}",
                knots.len(),
                order
            )));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(IgaError::Geometry("Knot vector is decreasing".into()));
        }
        let start = knots[0];
        let end = knots[knots.len() - 1];
        if end <= start {
            return Err(IgaError::Geometry("Empty parameter domain".into()));
        }
        let basis = Self { order, knots };
        if basis.knot_multiplicity(start) != order || basis.knot_multiplicity(end) != order {
            return Err(IgaError::Geometry(
                "Knot vector must be clamped (end multiplicity equal to order)".into(),
            ));
        }
        if basis
            .knots_simple()
            .iter()
            .any(|&k| basis.knot_multiplicity(k) > order)
        {
            return Err(IgaError::Geometry(
                "Knot multiplicity exceeds basis order".into(),
            ));
        }
        Ok(basis)
    }

    /// Single-span basis of the given degree on `[start, end]`.
    pub fn bezier(degree: usize, start: f64, end: f64) -> Result<Self> {
        Self::uniform(degree, 1, start, end)
    }

    /// Basis of the given degree with `spans` equal, maximally smooth spans.
    pub fn uniform(degree: usize, spans: usize, start: f64, end: f64) -> Result<Self> {
        let order = degree + 1;
        let spans = spans.max(1);
        let mut knots = vec![start; order];
        for i in 1..spans {
            knots.push(start + (end - start) * i as f64 / spans as f64);
        }
        knots.extend(std::iter::repeat(end).take(order));
        Self::new(order, knots)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn num_coefs(&self) -> usize {
        self.knots.len() - self.order
    }

    pub fn start_param(&self) -> f64 {
        self.knots[self.order - 1]
    }

    pub fn end_param(&self) -> f64 {
        self.knots[self.num_coefs()]
    }

    /// Number of times `t` occurs in the knot vector.
    pub fn knot_multiplicity(&self, t: f64) -> usize {
        self.knots.iter().filter(|&&k| k == t).count()
    }

    /// Distinct knot values in increasing order.
    pub fn knots_simple(&self) -> Vec<f64> {
        let mut simple: Vec<f64> = Vec::with_capacity(self.knots.len());
        for &k in &self.knots {
            if simple.last() != Some(&k) {
                simple.push(k);
            }
        }
        simple
    }

    /// Greville abscissa of coefficient `i`.
    pub fn greville(&self, i: usize) -> f64 {
        let p = self.degree();
        if p == 0 {
            return 0.5 * (self.knots[i] + self.knots[i + 1]);
        }
        self.knots[i + 1..=i + p].iter().sum::<f64>() / p as f64
    }

    /// Span index and the `order` non-zero basis values at `t`.
    ///
    /// The first non-zero function has index `span - degree`.
    pub fn evaluate(&self, t: f64) -> (usize, Vec<f64>) {
        let span = find_span(self.degree(), &self.knots, self.num_coefs() - 1, t);
        (span, basis_functions(self.degree(), &self.knots, span, t))
    }

    /// Span index, basis values and first derivatives at `t`.
    pub fn evaluate_derivs(&self, t: f64) -> (usize, Vec<f64>, Vec<f64>) {
        let span = find_span(self.degree(), &self.knots, self.num_coefs() - 1, t);
        let (values, derivs) = basis_functions_derivs(self.degree(), &self.knots, span, t);
        (span, values, derivs)
    }

    /// Insert `new_knots` (in any order) into the basis.
    ///
    /// Returns the refined basis and the `(new x old)` coefficient map.
    /// Knots must lie strictly inside the domain and may not push a
    /// multiplicity above the order.
    pub fn insert_knots(&self, new_knots: &[f64]) -> Result<(Self, DMatrix<f64>)> {
        let n_old = self.num_coefs();
        let mut rows: Vec<Vec<f64>> = (0..n_old)
            .map(|i| {
                let mut row = vec![0.0; n_old];
                row[i] = 1.0;
                row
            })
            .collect();
        let mut knots = self.knots.clone();
        let p = self.degree();

        let mut sorted = new_knots.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        for &t in &sorted {
            if !(t > self.start_param() && t < self.end_param()) {
                return Err(IgaError::Geometry(format!(
                    "Knot {} outside the open domain ({}, {})",
                    t,
                    self.start_param(),
                    self.end_param()
                )));
            }
            let n = rows.len();
            let k = find_span(p, &knots, n - 1, t);

            // Boehm: Q_i = a_i P_i + (1 - a_i) P_{i-1} on the affected range
            let mut next = Vec::with_capacity(n + 1);
            for i in 0..=n {
                let row = if i + p <= k {
                    rows[i].clone()
                } else if i > k {
                    rows[i - 1].clone()
                } else {
                    let alpha = (t - knots[i]) / (knots[i + p] - knots[i]);
                    rows[i]
                        .iter()
                        .zip(&rows[i - 1])
                        .map(|(a, b)| alpha * a + (1.0 - alpha) * b)
                        .collect()
                };
                next.push(row);
            }
            rows = next;
            knots.insert(k + 1, t);
        }

        let refined = Self::new(self.order, knots)?;
        let map = DMatrix::from_fn(rows.len(), n_old, |r, c| rows[r][c]);
        Ok((refined, map))
    }

    /// Raise the order by `raise`, keeping the continuity at every knot.
    ///
    /// Every distinct knot gains `raise` in multiplicity. The coefficient map
    /// is found by collocation at the Greville points of the raised basis,
    /// which reproduces the old space exactly.
    pub fn raise_order(&self, raise: usize) -> Result<(Self, DMatrix<f64>)> {
        let n_old = self.num_coefs();
        if raise == 0 {
            return Ok((self.clone(), DMatrix::identity(n_old, n_old)));
        }

        let order = self.order + raise;
        let mut knots = Vec::with_capacity(self.knots.len() + raise * self.knots_simple().len());
        for k in self.knots_simple() {
            let mult = self.knot_multiplicity(k) + raise;
            knots.extend(std::iter::repeat(k).take(mult));
        }
        let raised = Self::new(order, knots)?;
        let n_new = raised.num_coefs();

        let mut collocation = DMatrix::<f64>::zeros(n_new, n_new);
        let mut old_values = DMatrix::<f64>::zeros(n_new, n_old);
        for j in 0..n_new {
            let tau = raised.greville(j);
            let (span, values) = raised.evaluate(tau);
            for (r, v) in values.iter().enumerate() {
                collocation[(j, span - raised.degree() + r)] = *v;
            }
            let (span, values) = self.evaluate(tau);
            for (r, v) in values.iter().enumerate() {
                old_values[(j, span - self.degree() + r)] = *v;
            }
        }

        let map = collocation.lu().solve(&old_values).ok_or_else(|| {
            IgaError::Geometry(format!(
                "Singular collocation system raising order {} by {}",
                self.order, raise
            ))
        })?;
        Ok((raised, map))
    }
}
