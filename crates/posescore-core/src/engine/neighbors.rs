use super::error::DispatchError;
use super::pose_stack::{BlockTypeTables, Dims, PoseStackView};
use crate::core::geometry::{Real, distance, real};
use nalgebra::{Point3, Vector3};
use ndarray::{Array2, Array3, ArrayView1};

/// Smallest sphere around a block's centroid enclosing all of its atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSphere<T: Real> {
    pub center: Point3<T>,
    pub radius: T,
}

impl<T: Real> BlockSphere<T> {
    /// Sphere of a set of atoms; `None` when the set is empty.
    pub fn enclosing<'p, I>(atoms: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'p Point3<T>> + Clone,
        T: 'p,
    {
        let (sum, count) = atoms
            .clone()
            .into_iter()
            .fold((Vector3::<T>::zeros(), 0usize), |(sum, count), atom| {
                (sum + atom.coords, count + 1)
            });
        if count == 0 {
            return None;
        }

        let center = Point3::from(sum / real::<T>(count as f64));
        let radius = atoms
            .into_iter()
            .map(|atom| distance(&center, atom))
            .fold(real::<T>(0.0), |acc, d| acc.max(d));
        Some(Self { center, radius })
    }

    /// Whether any atom pair of the two blocks can lie within `cutoff`.
    #[inline]
    pub fn within(&self, other: &Self, cutoff: T) -> bool {
        distance(&self.center, &other.center) <= self.radius + other.radius + cutoff
    }
}

/// Bounding spheres of every block slot of a batch, `None` for empty slots.
pub fn block_spheres<T: Real>(
    stack: &PoseStackView<'_, T>,
    types: &BlockTypeTables<'_, T>,
    dims: &Dims,
) -> Array2<Option<BlockSphere<T>>> {
    Array2::from_shape_fn((dims.n_poses, dims.max_n_blocks), |(pose, block)| {
        let placed = stack.placed_block(types, pose, block)?;
        let atoms = stack
            .coords
            .row(pose)
            .slice_move(ndarray::s![placed.offset..placed.offset + placed.n_atoms]);
        BlockSphere::enclosing(atoms)
    })
}

/// Record of which ordered block pairs of each pose were scored.
///
/// `[n_poses, max_n_blocks, max_n_blocks]`, 1 for an interacting pair. The
/// backward pass replays exactly these pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNeighbors(Array3<i32>);

impl BlockNeighbors {
    pub fn empty(n_poses: usize, max_n_blocks: usize) -> Self {
        Self(Array3::zeros((n_poses, max_n_blocks, max_n_blocks)))
    }

    #[inline]
    pub fn contains(&self, pose: usize, block_a: usize, block_b: usize) -> bool {
        self.0[[pose, block_a, block_b]] != 0
    }

    /// Interacting block pairs over the whole batch.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&flag| flag != 0).count()
    }

    pub(crate) fn set_row(&mut self, pose: usize, block_a: usize, row: ArrayView1<'_, i32>) {
        self.0
            .slice_mut(ndarray::s![pose, block_a, ..])
            .assign(&row);
    }

    pub(crate) fn check_shape(&self, dims: &Dims) -> Result<(), DispatchError> {
        let expected = [dims.n_poses, dims.max_n_blocks, dims.max_n_blocks];
        if self.0.shape() == expected {
            Ok(())
        } else {
            Err(DispatchError::ShapeMismatch {
                tensor: "block_neighbors",
                expected: expected.to_vec(),
                found: self.0.shape().to_vec(),
            })
        }
    }
}
