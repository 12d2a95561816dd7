//! Batched LK-ball scoring of pose stacks.
//!
//! The forward pass decides which ordered block pairs of each pose can
//! interact, logs them in a [`BlockNeighbors`] table and sums the four
//! LK-ball terms per pose. The backward pass replays that log, so both
//! passes always see the same pair set.

use super::error::DispatchError;
use super::executor::Executor;
use super::neighbors::{BlockNeighbors, block_spheres};
use super::pose_stack::{BlockTypeTables, Dims, PlacedBlock, PoseStackView, TILE_SIZE};
use crate::core::geometry::{Real, real};
use crate::core::params::{LkBallGlobalParams, LkBallTypeParams};
use crate::core::potentials::lk_ball::{
    LkBallAtom, MAX_WATER, Waters, lk_ball_score, lk_ball_score_with_grad,
};
use crate::core::term::{LkBallTerms, N_TERMS};
use crate::core::topology::bond_separation::BondSeparation;
use nalgebra::{Point3, Vector3};
use ndarray::{Array1, Array2, Array3, ArrayView2};
use tracing::{debug, instrument, trace};

/// One scored (polar atom, occluder atom) pair, with pose-level atom indices.
struct AtomPair<T: Real> {
    polar: usize,
    occluder: usize,
    polar_params: LkBallTypeParams<T>,
    occluder_params: LkBallTypeParams<T>,
    separation: i32,
}

/// The block pair currently being walked.
struct BlockPair {
    pose: usize,
    block_a: usize,
    a: PlacedBlock,
    block_b: usize,
    b: PlacedBlock,
}

/// Calls `visit` for every polar atom of block A against every occluder of block B.
fn for_each_atom_pair<T, F>(
    types: &BlockTypeTables<'_, T>,
    selector: &BondSeparation<'_>,
    pair: &BlockPair,
    mut visit: F,
) where
    T: Real,
    F: FnMut(AtomPair<T>),
{
    let n_tiles = types.tile_n_polar.ncols();
    let tiles = |n_atoms: usize| (0..n_tiles).take_while(move |tile| tile * TILE_SIZE < n_atoms);
    let (type_a, type_b) = (pair.a.block_type, pair.b.block_type);

    for tile_a in tiles(pair.a.n_atoms) {
        let n_polar = types.tile_n_polar[[type_a, tile_a]] as usize;
        for polar_slot in 0..n_polar {
            let polar_local = tile_a * TILE_SIZE + types.tile_pol_occ_inds[[type_a, tile_a, polar_slot]] as usize;
            let polar_params = types.tile_params[[type_a, tile_a, polar_slot]];

            for tile_b in tiles(pair.b.n_atoms) {
                let first_occluder = types.tile_n_polar[[type_b, tile_b]] as usize;
                let n_occluder = types.tile_n_occluder[[type_b, tile_b]] as usize;
                for occluder_slot in first_occluder..first_occluder + n_occluder {
                    let occluder_local =
                        tile_b * TILE_SIZE + types.tile_pol_occ_inds[[type_b, tile_b, occluder_slot]] as usize;
                    if pair.block_a == pair.block_b && polar_local == occluder_local {
                        continue;
                    }
                    visit(AtomPair {
                        polar: pair.a.offset + polar_local,
                        occluder: pair.b.offset + occluder_local,
                        polar_params,
                        occluder_params: types.tile_params[[type_b, tile_b, occluder_slot]],
                        separation: selector.separation(
                            pair.pose,
                            pair.block_a,
                            polar_local,
                            pair.block_b,
                            occluder_local,
                        ),
                    });
                }
            }
        }
    }
}

#[inline]
fn waters_of<T: Real>(stack: &PoseStackView<'_, T>, pose: usize, atom: usize) -> Waters<T> {
    std::array::from_fn(|slot| stack.waters[[pose, atom, slot]])
}

/// Coordinates and waters of both atoms of a pair.
struct PairPoints<T: Real> {
    polar: Point3<T>,
    occluder: Point3<T>,
    polar_waters: Waters<T>,
    occluder_waters: Waters<T>,
}

impl<T: Real> PairPoints<T> {
    fn gather(stack: &PoseStackView<'_, T>, pose: usize, pair: &AtomPair<T>) -> Self {
        Self {
            polar: stack.coords[[pose, pair.polar]],
            occluder: stack.coords[[pose, pair.occluder]],
            polar_waters: waters_of(stack, pose, pair.polar),
            occluder_waters: waters_of(stack, pose, pair.occluder),
        }
    }

    fn atoms<'s>(&'s self, pair: &'s AtomPair<T>) -> (LkBallAtom<'s, T>, LkBallAtom<'s, T>) {
        (
            LkBallAtom {
                coord: &self.polar,
                waters: &self.polar_waters,
                params: &pair.polar_params,
            },
            LkBallAtom {
                coord: &self.occluder,
                waters: &self.occluder_waters,
                params: &pair.occluder_params,
            },
        )
    }
}

fn check_dtdv<T: Real>(dtdv: &ArrayView2<'_, T>, dims: &Dims) -> Result<(), DispatchError> {
    let expected = [N_TERMS, dims.n_poses];
    if dtdv.shape() == expected {
        Ok(())
    } else {
        Err(DispatchError::ShapeMismatch {
            tensor: "dtdv",
            expected: expected.to_vec(),
            found: dtdv.shape().to_vec(),
        })
    }
}

/// Per-pose LK-ball energies, `[N_TERMS, n_poses]`, and the interacting block pairs.
///
/// Block pairs are screened with bounding spheres padded by `max_dis`. A
/// block is always paired with itself.
#[instrument(skip_all, name = "lk_ball_forward")]
pub fn forward<T: Real, E: Executor>(
    stack: &PoseStackView<'_, T>,
    types: &BlockTypeTables<'_, T>,
    globals: &LkBallGlobalParams<T>,
    executor: &E,
) -> Result<(Array2<T>, BlockNeighbors), DispatchError> {
    let dims = stack.validate(types)?;
    let n_blocks = dims.max_n_blocks;
    debug!(
        n_poses = dims.n_poses,
        max_n_blocks = n_blocks,
        max_n_atoms = dims.max_n_atoms,
        "Scoring LK-ball forward pass"
    );

    let spheres = block_spheres(stack, types, &dims);
    let selector = stack.bond_separation(types);
    let zero_terms = || LkBallTerms::new(real(0.0), real(0.0), real(0.0), real(0.0));

    let partials = executor.map(dims.n_poses * n_blocks, |unit| {
        let (pose, block_a) = (unit / n_blocks, unit % n_blocks);
        let mut terms: LkBallTerms<T> = zero_terms();
        let mut row = Array1::<i32>::zeros(n_blocks);

        let (Some(a), Some(sphere_a)) = (stack.placed_block(types, pose, block_a), spheres[[pose, block_a]])
        else {
            return (terms, row);
        };

        for block_b in 0..n_blocks {
            let (Some(b), Some(sphere_b)) = (stack.placed_block(types, pose, block_b), spheres[[pose, block_b]])
            else {
                continue;
            };
            if !sphere_a.within(&sphere_b, globals.max_dis) {
                continue;
            }
            row[block_b] = 1;

            let pair = BlockPair {
                pose,
                block_a,
                a,
                block_b,
                b,
            };
            for_each_atom_pair(types, &selector, &pair, |atom_pair| {
                let points = PairPoints::gather(stack, pose, &atom_pair);
                let (i, j) = points.atoms(&atom_pair);
                terms += lk_ball_score(&i, &j, atom_pair.separation, globals);
            });
        }
        (terms, row)
    });

    let mut energies = Array2::<T>::zeros((N_TERMS, dims.n_poses));
    let mut neighbors = BlockNeighbors::empty(dims.n_poses, n_blocks);
    for (unit, (terms, row)) in partials.into_iter().enumerate() {
        let (pose, block_a) = (unit / n_blocks, unit % n_blocks);
        for (term, value) in terms.into_array().into_iter().enumerate() {
            energies[[term, pose]] += value;
        }
        neighbors.set_row(pose, block_a, row.view());
    }

    for pose in 0..dims.n_poses {
        trace!(pose, energies = ?energies.column(pose).to_vec(), "Pose LK-ball terms");
    }
    debug!(n_block_pairs = neighbors.count(), "LK-ball forward pass complete");
    Ok((energies, neighbors))
}

/// Private gradient accumulator of one pose.
struct PoseGradient<T: Real> {
    d_coords: Array1<Vector3<T>>,
    d_waters: Array2<Vector3<T>>,
}

impl<T: Real> PoseGradient<T> {
    fn zeros(max_n_atoms: usize) -> Self {
        Self {
            d_coords: Array1::from_elem(max_n_atoms, Vector3::zeros()),
            d_waters: Array2::from_elem((max_n_atoms, MAX_WATER), Vector3::zeros()),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.d_coords += &other.d_coords;
        self.d_waters += &other.d_waters;
        self
    }
}

/// Gradients of `sum(dtdv * energies)` with respect to atom and water coordinates.
///
/// Only the block pairs recorded in `neighbors` are revisited. The output
/// arrays match the shapes of `stack.coords` and `stack.waters`; absent
/// waters and padding atoms receive zero gradients.
#[instrument(skip_all, name = "lk_ball_backward")]
pub fn backward<T: Real, E: Executor>(
    stack: &PoseStackView<'_, T>,
    types: &BlockTypeTables<'_, T>,
    globals: &LkBallGlobalParams<T>,
    neighbors: &BlockNeighbors,
    dtdv: ArrayView2<'_, T>,
    executor: &E,
) -> Result<(Array2<Vector3<T>>, Array3<Vector3<T>>), DispatchError> {
    let dims = stack.validate(types)?;
    neighbors.check_shape(&dims)?;
    check_dtdv(&dtdv, &dims)?;
    let n_blocks = dims.max_n_blocks;
    debug!(
        n_poses = dims.n_poses,
        n_block_pairs = neighbors.count(),
        "Replaying LK-ball backward pass"
    );

    let selector = stack.bond_separation(types);

    let per_pose = executor.map(dims.n_poses, |pose| {
        let scales = dtdv.column(pose);
        executor.fold_reduce(
            n_blocks,
            || PoseGradient::zeros(dims.max_n_atoms),
            |mut grad, block_a| {
                let Some(a) = stack.placed_block(types, pose, block_a) else {
                    return grad;
                };
                for block_b in 0..n_blocks {
                    if !neighbors.contains(pose, block_a, block_b) {
                        continue;
                    }
                    let Some(b) = stack.placed_block(types, pose, block_b) else {
                        continue;
                    };

                    let pair = BlockPair {
                        pose,
                        block_a,
                        a,
                        block_b,
                        b,
                    };
                    for_each_atom_pair(types, &selector, &pair, |atom_pair| {
                        let points = PairPoints::gather(stack, pose, &atom_pair);
                        let (i, j) = points.atoms(&atom_pair);
                        let scored = lk_ball_score_with_grad(&i, &j, atom_pair.separation, globals);

                        for (term_grad, &scale) in scored.grad.into_array().iter().zip(scales.iter()) {
                            grad.d_coords[atom_pair.polar] += term_grad.d_i * scale;
                            grad.d_coords[atom_pair.occluder] += term_grad.d_j * scale;
                            for slot in 0..MAX_WATER {
                                grad.d_waters[[atom_pair.polar, slot]] += term_grad.d_waters_i[slot] * scale;
                                grad.d_waters[[atom_pair.occluder, slot]] +=
                                    term_grad.d_waters_j[slot] * scale;
                            }
                        }
                    });
                }
                grad
            },
            PoseGradient::merge,
        )
    });

    let mut d_coords = Array2::from_elem((dims.n_poses, dims.max_n_atoms), Vector3::zeros());
    let mut d_waters = Array3::from_elem((dims.n_poses, dims.max_n_atoms, MAX_WATER), Vector3::zeros());
    for (pose, grad) in per_pose.into_iter().enumerate() {
        d_coords.row_mut(pose).assign(&grad.d_coords);
        d_waters
            .index_axis_mut(ndarray::Axis(0), pose)
            .assign(&grad.d_waters);
    }

    debug!("LK-ball backward pass complete");
    Ok((d_coords, d_waters))
}
