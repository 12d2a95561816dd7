use crate::core::geometry::{Real, real};
use crate::core::params::ScoreParams;
use crate::core::term::{LkBallTerms, N_TERMS};
use crate::engine::error::DispatchError;
use crate::engine::executor::{DefaultExecutor, Executor};
use crate::engine::lk_ball;
use crate::engine::neighbors::BlockNeighbors;
use crate::engine::pose_stack::{BlockTypeTables, PoseStackView};
use nalgebra::Vector3;
use ndarray::{Array1, Array2, Array3, ArrayView2};
use tracing::{debug, info, instrument};

/// What a scoring call should compute beyond the forward energies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreRequest<'a, T: Real> {
    /// Run the backward pass as well.
    pub gradients: bool,
    /// Upstream gradient, `[N_TERMS, n_poses]`. Defaults to all ones.
    pub dtdv: Option<ArrayView2<'a, T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGradients<T: Real> {
    /// `[n_poses, max_n_atoms]`
    pub d_coords: Array2<Vector3<T>>,
    /// `[n_poses, max_n_atoms, MAX_WATER]`
    pub d_waters: Array3<Vector3<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport<T: Real> {
    /// `[N_TERMS, n_poses]`
    pub energies: Array2<T>,
    pub neighbors: BlockNeighbors,
    pub gradients: Option<ScoreGradients<T>>,
}

impl<T: Real> ScoreReport<T> {
    pub fn n_poses(&self) -> usize {
        self.energies.ncols()
    }

    pub fn pose_terms(&self, pose: usize) -> LkBallTerms<T> {
        let column = self.energies.column(pose);
        LkBallTerms::new(column[0], column[1], column[2], column[3])
    }

    /// Sum of the four terms for every pose.
    pub fn totals(&self) -> Array1<T> {
        self.energies.sum_axis(ndarray::Axis(0))
    }
}

/// Scores a batch with the default executor.
pub fn run<T: Real>(
    stack: &PoseStackView<'_, T>,
    types: &BlockTypeTables<'_, T>,
    params: &ScoreParams<T>,
    request: &ScoreRequest<'_, T>,
) -> Result<ScoreReport<T>, DispatchError> {
    run_with(stack, types, params, request, &DefaultExecutor::default())
}

#[instrument(skip_all, name = "score_workflow")]
pub fn run_with<T: Real, E: Executor>(
    stack: &PoseStackView<'_, T>,
    types: &BlockTypeTables<'_, T>,
    params: &ScoreParams<T>,
    request: &ScoreRequest<'_, T>,
    executor: &E,
) -> Result<ScoreReport<T>, DispatchError> {
    let (energies, neighbors) = lk_ball::forward(stack, types, &params.lk_ball, executor)?;
    let n_poses = energies.ncols();
    info!(
        n_poses,
        n_block_pairs = neighbors.count(),
        "Computed LK-ball energies."
    );

    let gradients = if request.gradients {
        let unit_dtdv;
        let dtdv = match &request.dtdv {
            Some(dtdv) => dtdv.view(),
            None => {
                unit_dtdv = Array2::from_elem((N_TERMS, n_poses), real::<T>(1.0));
                unit_dtdv.view()
            }
        };
        let (d_coords, d_waters) =
            lk_ball::backward(stack, types, &params.lk_ball, &neighbors, dtdv, executor)?;
        info!("Computed LK-ball coordinate gradients.");
        Some(ScoreGradients { d_coords, d_waters })
    } else {
        None
    };

    let report = ScoreReport {
        energies,
        neighbors,
        gradients,
    };
    for (pose, total) in report.totals().iter().enumerate() {
        debug!(pose, total = %total, "Pose LK-ball total");
    }
    Ok(report)
}
