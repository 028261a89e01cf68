//! Refinement of a block's geometry, propagated to its solution spaces.
//!
//! The geometry is always refined before the solution spaces. A failure in
//! the middle can leave the solution spaces behind the geometry but never
//! ahead of it; there is no rollback.

use iga_core::{check_axis, Result};
use iga_spline::BsplineBasis;

use crate::block::VolumeBlock;

impl VolumeBlock {
    /// Insert `knots` on `axis` into the geometry and then into every
    /// solution space.
    pub fn refine_geometry(&mut self, knots: &[f64], axis: usize) -> Result<()> {
        check_axis(axis)?;
        if knots.is_empty() {
            return Ok(());
        }
        log::debug!(
            "block {}: inserting {} knot(s) along direction {}",
            self.index(),
            knots.len(),
            axis
        );
        self.geometry.insert_knots(axis, knots)?;
        for space in &mut self.solution_spaces {
            space.insert_knots(knots, axis)?;
        }
        Ok(())
    }

    /// Refine along `axis` until the geometry basis contains `target`: at
    /// least its order, and every interior knot of `target` with at least
    /// its multiplicity plus the amount by which the geometry order exceeds
    /// the target order.
    ///
    /// An order raise is propagated to the solution spaces as an absolute
    /// degree, so spaces already at that degree are left alone.
    pub fn refine_to_basis(&mut self, target: &BsplineBasis, axis: usize) -> Result<()> {
        check_axis(axis)?;

        let current_order = self.geometry.order(axis);
        if target.order() > current_order {
            self.raise_geometry_degree(target.degree(), axis)?;
        }

        let basis = self.geometry.basis(axis);
        let order = basis.order();
        let order_diff = order.saturating_sub(target.order());
        let (start, end) = (basis.start_param(), basis.end_param());
        let mut knots = Vec::new();
        for k in target.knots_simple() {
            if k <= start || k >= end {
                continue;
            }
            let have = basis.knot_multiplicity(k);
            let need = (target.knot_multiplicity(k) + order_diff).min(order);
            knots.extend(std::iter::repeat(k).take(need.saturating_sub(have)));
        }

        if knots.is_empty() {
            return Ok(());
        }
        self.refine_geometry(&knots, axis)
    }

    /// Raise the geometry degree along `axis` to `new_degree` and bring every
    /// solution space to at least that degree. No-op if the geometry is
    /// already there.
    pub fn raise_geometry_degree(&mut self, new_degree: usize, axis: usize) -> Result<()> {
        check_axis(axis)?;
        let current = self.geometry.basis(axis).degree();
        if current >= new_degree {
            return Ok(());
        }
        log::debug!(
            "block {}: raising degree {} -> {} along direction {}",
            self.index(),
            current,
            new_degree,
            axis
        );
        let mut raise = [0; 3];
        raise[axis] = new_degree - current;
        self.geometry.raise_order(raise)?;
        for space in &mut self.solution_spaces {
            space.increase_degree(new_degree, axis)?;
        }
        self.sync_solution_knots(axis)
    }

    /// Insert into each solution space the geometry knots it holds with a
    /// lower multiplicity. Only spaces whose degree was already above the
    /// geometry's can fall behind this way.
    fn sync_solution_knots(&mut self, axis: usize) -> Result<()> {
        let geometry = self.geometry.basis(axis);
        let (start, end) = (geometry.start_param(), geometry.end_param());
        let interior: Vec<f64> = geometry
            .knots_simple()
            .into_iter()
            .filter(|&k| k > start && k < end)
            .collect();

        for (field, space) in self.solution_spaces.iter_mut().enumerate() {
            let basis = space.space().basis(axis);
            let missing: Vec<f64> = interior
                .iter()
                .flat_map(|&k| {
                    let need = geometry.knot_multiplicity(k).min(basis.order());
                    std::iter::repeat(k).take(need.saturating_sub(basis.knot_multiplicity(k)))
                })
                .collect();
            if missing.is_empty() {
                continue;
            }
            log::trace!(
                "field {}: matching {} geometry knot(s) along direction {}",
                field,
                missing.len(),
                axis
            );
            space.insert_knots(&missing, axis)?;
        }
        Ok(())
    }
}
