use iga_core::{IgaError, Result, Tolerance};
use iga_spline::{Face, SplineVolume};
use slotmap::SlotMap;

use crate::block::VolumeBlock;
use crate::types::{BlockId, FaceMatch};

/// Arena of volume blocks and the links between their faces.
///
/// Block indices follow insertion order and are never reused. Removing a
/// block leaves links that point at it in place; [`Validate`] reports them.
///
/// [`Validate`]: iga_core::traits::Validate
#[derive(Debug, Clone)]
pub struct VolumeModel {
    pub(crate) blocks: SlotMap<BlockId, VolumeBlock>,
    tolerance: Tolerance,
    next_index: usize,
}

impl VolumeModel {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            blocks: SlotMap::with_key(),
            tolerance,
            next_index: 0,
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Create a block over `geometry` with one field per entry of
    /// `field_dimensions`.
    pub fn add_block(&mut self, geometry: SplineVolume, field_dimensions: &[usize]) -> Result<BlockId> {
        let block = VolumeBlock::new(geometry, field_dimensions, self.next_index)?
            .with_tolerance(self.tolerance);
        self.next_index += 1;
        Ok(self.blocks.insert(block))
    }

    pub fn block(&self, id: BlockId) -> Option<&VolumeBlock> {
        self.blocks.get(id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut VolumeBlock> {
        self.blocks.get_mut(id)
    }

    pub fn remove_block(&mut self, id: BlockId) -> Option<VolumeBlock> {
        self.blocks.remove(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &VolumeBlock)> {
        self.blocks.iter()
    }

    fn require(&self, id: BlockId) -> Result<&VolumeBlock> {
        self.blocks
            .get(id)
            .ok_or_else(|| IgaError::NotFound(format!("Block {:?} not found", id)))
    }

    /// Register `a.face_a <-> b.face_b` in both directions with the same
    /// orientation code. The faces are not checked for coincidence.
    pub fn link(
        &mut self,
        a: BlockId,
        face_a: Face,
        b: BlockId,
        face_b: Face,
        orientation: i32,
    ) -> Result<()> {
        self.require(a)?;
        self.require(b)?;
        if let Some(block) = self.blocks.get_mut(a) {
            block.add_neighbour(face_a, b, orientation);
        }
        if let Some(block) = self.blocks.get_mut(b) {
            block.add_neighbour(face_b, a, orientation);
        }
        Ok(())
    }

    /// Find the face of `b` that `a`'s `face_a` lies on and link the two.
    ///
    /// Each side stores the code of its own face surface matched against the
    /// other block. Returns the match found on `b`.
    pub fn stitch(&mut self, a: BlockId, face_a: Face, b: BlockId) -> Result<FaceMatch> {
        let tol = self.tolerance.neighbour;
        let block_a = self.require(a)?;
        let block_b = self.require(b)?;

        let on_b = block_b.face_orientation(&block_a.boundary_surface(face_a)?, tol)?;
        let on_a = block_a.face_orientation(&block_b.boundary_surface(on_b.face)?, tol)?;
        if on_a.face != face_a {
            return Err(IgaError::Topology(format!(
                "face {} of block {} matches {} of block {}, which maps back to {}",
                face_a,
                block_a.index(),
                on_b.face,
                block_b.index(),
                on_a.face
            )));
        }
        log::debug!(
            "stitched block {} {} <-> block {} {} (codes {}, {})",
            block_a.index(),
            face_a,
            block_b.index(),
            on_b.face,
            on_b.code(),
            on_a.code()
        );

        if let Some(block) = self.blocks.get_mut(a) {
            block.add_neighbour(face_a, b, on_b.code());
        }
        if let Some(block) = self.blocks.get_mut(b) {
            block.add_neighbour(on_b.face, a, on_a.code());
        }
        Ok(on_b)
    }
}

impl Default for VolumeModel {
    fn default() -> Self {
        Self::new(Tolerance::default())
    }
}
