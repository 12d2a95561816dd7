use itertools::iproduct;
use ndarray::{ArrayView1, ArrayView2, ArrayView3, ArrayView5};

/// Separations above this value are treated as non-bonded by every potential,
/// so the exact per-atom lookup is skipped.
pub const MAX_IMPORTANT_BOND_SEPARATION: i32 = 4;

/// Read-only topology tables of a pose stack, indexed as documented on each
/// field. Indices are assumed to have been validated by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BondSeparation<'a> {
    /// `[n_poses, max_n_blocks]`; `-1` marks an empty block slot.
    pub block_type: ArrayView2<'a, i32>,
    /// `[n_poses, max_n_blocks, max_n_conn]`; `(partner block, partner connection)`.
    pub inter_residue_connections: ArrayView3<'a, [i32; 2]>,
    /// `[n_poses, max_n_blocks, max_n_blocks]`
    pub min_bond_separation: ArrayView3<'a, i32>,
    /// `[n_poses, max_n_blocks, max_n_blocks, max_n_conn, max_n_conn]`
    pub inter_block_bondsep: ArrayView5<'a, i32>,
    /// `[n_types]`
    pub n_interblock_bonds: ArrayView1<'a, i32>,
    /// `[n_types, max_n_conn]`
    pub atoms_forming_chemical_bonds: ArrayView2<'a, i32>,
    /// `[n_types, max_n_atoms_per_type, max_n_atoms_per_type]`
    pub path_distance: ArrayView3<'a, i32>,
}

impl<'a> BondSeparation<'a> {
    /// Lower bound on the separation of any atom of `block_a` from any atom of `block_b`.
    #[inline]
    pub fn block_separation(&self, pose: usize, block_a: usize, block_b: usize) -> i32 {
        self.min_bond_separation[[pose, block_a, block_b]]
    }

    /// Bonded-path length between two atoms, given by block-local indices.
    ///
    /// Pairs whose blocks are coarsely separated by more than
    /// [`MAX_IMPORTANT_BOND_SEPARATION`] bonds get the coarse value without
    /// touching the exact tables.
    pub fn separation(
        &self,
        pose: usize,
        block_a: usize,
        atom_a: usize,
        block_b: usize,
        atom_b: usize,
    ) -> i32 {
        let coarse = self.block_separation(pose, block_a, block_b);
        if coarse > MAX_IMPORTANT_BOND_SEPARATION {
            return coarse;
        }

        let type_a = self.block_type[[pose, block_a]] as usize;
        if block_a == block_b {
            return self.path_distance[[type_a, atom_a, atom_b]];
        }
        let type_b = self.block_type[[pose, block_b]] as usize;

        let connected = |block: usize, n_conn: i32| {
            (0..n_conn as usize)
                .filter(move |&conn| self.inter_residue_connections[[pose, block, conn]][0] >= 0)
        };
        let conns_a = connected(block_a, self.n_interblock_bonds[type_a]);
        let conns_b = connected(block_b, self.n_interblock_bonds[type_b]).collect::<Vec<_>>();

        iproduct!(conns_a, conns_b)
            .map(|(conn_a, conn_b)| {
                let bond_atom_a = self.atoms_forming_chemical_bonds[[type_a, conn_a]] as usize;
                let bond_atom_b = self.atoms_forming_chemical_bonds[[type_b, conn_b]] as usize;
                // Tables may mark unreachable pairs with i32::MAX.
                self.path_distance[[type_a, atom_a, bond_atom_a]]
                    .saturating_add(self.inter_block_bondsep[[pose, block_a, block_b, conn_a, conn_b]])
                    .saturating_add(self.path_distance[[type_b, bond_atom_b, atom_b]])
            })
            .min()
            .unwrap_or(coarse)
    }
}
