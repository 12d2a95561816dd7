use super::error::DispatchError;
use crate::core::geometry::Real;
use crate::core::params::LkBallTypeParams;
use crate::core::potentials::lk_ball::MAX_WATER;
use crate::core::topology::bond_separation::BondSeparation;
use nalgebra::Point3;
use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayView5};
use tracing::trace;

/// Atoms per tile of a block type's polar/occluder layout.
pub const TILE_SIZE: usize = 32;

/// Per-pose geometry and connectivity of a batch of poses.
#[derive(Debug, Clone, Copy)]
pub struct PoseStackView<'a, T: Real> {
    /// `[n_poses, max_n_atoms]`
    pub coords: ArrayView2<'a, Point3<T>>,
    /// `[n_poses, max_n_atoms, MAX_WATER]`; non-finite slots are absent waters.
    pub waters: ArrayView3<'a, Point3<T>>,
    /// `[n_poses, max_n_blocks]`
    pub block_coord_offset: ArrayView2<'a, i32>,
    /// `[n_poses, max_n_blocks]`; `-1` marks an empty block slot.
    pub block_type: ArrayView2<'a, i32>,
    /// `[n_poses, max_n_blocks, max_n_conn]` of `(partner block, partner connection)`.
    pub inter_residue_connections: ArrayView3<'a, [i32; 2]>,
    /// `[n_poses, max_n_blocks, max_n_blocks]`
    pub min_bond_separation: ArrayView3<'a, i32>,
    /// `[n_poses, max_n_blocks, max_n_blocks, max_n_conn, max_n_conn]`
    pub inter_block_bondsep: ArrayView5<'a, i32>,
}

/// Per-block-type tables shared by every pose.
#[derive(Debug, Clone, Copy)]
pub struct BlockTypeTables<'a, T: Real> {
    /// `[n_types]`
    pub n_atoms: ArrayView1<'a, i32>,
    /// `[n_types]`
    pub n_interblock_bonds: ArrayView1<'a, i32>,
    /// `[n_types, max_n_conn]`
    pub atoms_forming_chemical_bonds: ArrayView2<'a, i32>,
    /// `[n_types, max_n_tiles]`
    pub tile_n_polar: ArrayView2<'a, i32>,
    /// `[n_types, max_n_tiles]`
    pub tile_n_occluder: ArrayView2<'a, i32>,
    /// `[n_types, max_n_tiles, TILE_SIZE]`: tile-local indices of the polar
    /// atoms followed by those of the occluders.
    pub tile_pol_occ_inds: ArrayView3<'a, i32>,
    /// `[n_types, max_n_tiles, TILE_SIZE]`, aligned with `tile_pol_occ_inds`.
    pub tile_params: ArrayView3<'a, LkBallTypeParams<T>>,
    /// `[n_types, max_n_atoms_per_type, max_n_atoms_per_type]`
    pub path_distance: ArrayView3<'a, i32>,
}

/// Extents of a validated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub n_poses: usize,
    pub max_n_atoms: usize,
    pub max_n_blocks: usize,
    pub max_n_conn: usize,
    pub n_types: usize,
    pub max_n_tiles: usize,
    pub max_n_type_atoms: usize,
}

/// A real block of one pose: its type and the first of its atom slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBlock {
    pub block_type: usize,
    pub offset: usize,
    pub n_atoms: usize,
}

fn check_shape(tensor: &'static str, found: &[usize], expected: &[usize]) -> Result<(), DispatchError> {
    if found == expected {
        Ok(())
    } else {
        Err(DispatchError::ShapeMismatch {
            tensor,
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}

impl<'a, T: Real> BlockTypeTables<'a, T> {
    fn validate(&self) -> Result<(usize, usize, usize, usize), DispatchError> {
        let n_types = self.n_atoms.len();
        let max_n_conn = self.atoms_forming_chemical_bonds.ncols();
        let max_n_tiles = self.tile_n_polar.ncols();
        let max_n_type_atoms = self.path_distance.dim().1;

        check_shape("n_interblock_bonds", self.n_interblock_bonds.shape(), &[n_types])?;
        check_shape(
            "atoms_forming_chemical_bonds",
            self.atoms_forming_chemical_bonds.shape(),
            &[n_types, max_n_conn],
        )?;
        check_shape("tile_n_polar", self.tile_n_polar.shape(), &[n_types, max_n_tiles])?;
        check_shape("tile_n_occluder", self.tile_n_occluder.shape(), &[n_types, max_n_tiles])?;
        check_shape(
            "tile_pol_occ_inds",
            self.tile_pol_occ_inds.shape(),
            &[n_types, max_n_tiles, TILE_SIZE],
        )?;
        check_shape(
            "tile_params",
            self.tile_params.shape(),
            &[n_types, max_n_tiles, TILE_SIZE],
        )?;
        check_shape(
            "path_distance",
            self.path_distance.shape(),
            &[n_types, max_n_type_atoms, max_n_type_atoms],
        )?;

        for block_type in 0..n_types {
            self.validate_type(block_type, max_n_conn, max_n_tiles, max_n_type_atoms)?;
        }
        Ok((n_types, max_n_conn, max_n_tiles, max_n_type_atoms))
    }

    fn validate_type(
        &self,
        block_type: usize,
        max_n_conn: usize,
        max_n_tiles: usize,
        max_n_type_atoms: usize,
    ) -> Result<(), DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidBlockType { block_type, reason };

        let n_atoms = self.n_atoms[block_type];
        if n_atoms < 0 || n_atoms as usize > max_n_type_atoms {
            return Err(invalid(format!(
                "atom count {n_atoms} outside [0, {max_n_type_atoms}]"
            )));
        }
        if n_atoms as usize > max_n_tiles * TILE_SIZE {
            return Err(invalid(format!(
                "atom count {n_atoms} exceeds {max_n_tiles} tiles of {TILE_SIZE}"
            )));
        }

        let n_bonds = self.n_interblock_bonds[block_type];
        if n_bonds < 0 || n_bonds as usize > max_n_conn {
            return Err(invalid(format!(
                "inter-block bond count {n_bonds} outside [0, {max_n_conn}]"
            )));
        }
        for conn in 0..n_bonds as usize {
            let atom = self.atoms_forming_chemical_bonds[[block_type, conn]];
            if atom < 0 || atom >= n_atoms {
                return Err(invalid(format!(
                    "connection {conn} bonds through atom {atom} of {n_atoms}"
                )));
            }
        }

        for tile in 0..max_n_tiles {
            let n_polar = self.tile_n_polar[[block_type, tile]];
            let n_occluder = self.tile_n_occluder[[block_type, tile]];
            if n_polar < 0 || n_occluder < 0 || (n_polar + n_occluder) as usize > TILE_SIZE {
                return Err(DispatchError::TileOverflow {
                    block_type,
                    tile,
                    n_polar,
                    n_occluder,
                    tile_size: TILE_SIZE,
                });
            }
            for slot in 0..(n_polar + n_occluder) as usize {
                let local = self.tile_pol_occ_inds[[block_type, tile, slot]];
                let atom = (tile * TILE_SIZE) as i64 + local as i64;
                if local < 0 || local as usize >= TILE_SIZE || atom >= n_atoms as i64 {
                    return Err(invalid(format!(
                        "tile {tile} slot {slot} names atom {atom} of {n_atoms}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<'a, T: Real> PoseStackView<'a, T> {
    /// Checks every shape and topology precondition of a batched call.
    pub fn validate(&self, types: &BlockTypeTables<'_, T>) -> Result<Dims, DispatchError> {
        let (n_types, max_n_conn, max_n_tiles, max_n_type_atoms) = types.validate()?;
        let (n_poses, max_n_atoms) = self.coords.dim();
        let max_n_blocks = self.block_type.ncols();

        check_shape("waters", self.waters.shape(), &[n_poses, max_n_atoms, MAX_WATER])?;
        check_shape("block_type", self.block_type.shape(), &[n_poses, max_n_blocks])?;
        check_shape(
            "block_coord_offset",
            self.block_coord_offset.shape(),
            &[n_poses, max_n_blocks],
        )?;
        check_shape(
            "inter_residue_connections",
            self.inter_residue_connections.shape(),
            &[n_poses, max_n_blocks, max_n_conn],
        )?;
        check_shape(
            "min_bond_separation",
            self.min_bond_separation.shape(),
            &[n_poses, max_n_blocks, max_n_blocks],
        )?;
        check_shape(
            "inter_block_bondsep",
            self.inter_block_bondsep.shape(),
            &[n_poses, max_n_blocks, max_n_blocks, max_n_conn, max_n_conn],
        )?;

        for pose in 0..n_poses {
            for block in 0..max_n_blocks {
                let block_type = self.block_type[[pose, block]];
                if block_type < -1 || block_type >= n_types as i32 {
                    return Err(DispatchError::BlockTypeOutOfRange {
                        pose,
                        block,
                        block_type,
                        n_types,
                    });
                }
                if block_type < 0 {
                    continue;
                }

                let offset = self.block_coord_offset[[pose, block]];
                let end = offset as i64 + types.n_atoms[block_type as usize] as i64;
                if offset < 0 || end > max_n_atoms as i64 {
                    return Err(DispatchError::AtomRangeOverflow {
                        pose,
                        block,
                        offset,
                        end,
                        max_n_atoms,
                    });
                }

                for connection in 0..max_n_conn {
                    let [partner, partner_conn] =
                        self.inter_residue_connections[[pose, block, connection]];
                    let partner_ok = partner >= -1 && partner < max_n_blocks as i32;
                    let conn_ok = partner_conn >= -1 && partner_conn < max_n_conn as i32;
                    if !partner_ok || !conn_ok {
                        return Err(DispatchError::ConnectionOutOfRange {
                            pose,
                            block,
                            connection,
                            partner,
                        });
                    }
                }
            }
        }

        let dims = Dims {
            n_poses,
            max_n_atoms,
            max_n_blocks,
            max_n_conn,
            n_types,
            max_n_tiles,
            max_n_type_atoms,
        };
        trace!(?dims, "Pose stack validated");
        Ok(dims)
    }

    /// The real block in slot `block` of `pose`, or `None` for an empty slot.
    #[inline]
    pub fn placed_block(
        &self,
        types: &BlockTypeTables<'_, T>,
        pose: usize,
        block: usize,
    ) -> Option<PlacedBlock> {
        let block_type = usize::try_from(self.block_type[[pose, block]]).ok()?;
        Some(PlacedBlock {
            block_type,
            offset: self.block_coord_offset[[pose, block]] as usize,
            n_atoms: types.n_atoms[block_type] as usize,
        })
    }

    /// Selector over the topology tables of the stack and its block types.
    ///
    /// The views are reborrowed, so the stack and the tables may come from
    /// unrelated owners.
    pub fn bond_separation<'s>(&'s self, types: &'s BlockTypeTables<'_, T>) -> BondSeparation<'s> {
        BondSeparation {
            block_type: self.block_type.view(),
            inter_residue_connections: self.inter_residue_connections.view(),
            min_bond_separation: self.min_bond_separation.view(),
            inter_block_bondsep: self.inter_block_bondsep.view(),
            n_interblock_bonds: types.n_interblock_bonds.view(),
            atoms_forming_chemical_bonds: types.atoms_forming_chemical_bonds.view(),
            path_distance: types.path_distance.view(),
        }
    }
}
