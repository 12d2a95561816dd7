use crate::core::geometry::{Real, real};
use crate::core::params::{HBondPairParams, ScoreParams};
use crate::core::potentials::hbond::{HBondAtoms, HBondGrad, hbond_score, hbond_score_with_grad};
use crate::engine::executor::{DefaultExecutor, Executor};
use tracing::{debug, info, instrument};

/// One donor-acceptor pair and the parameters of its type pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HBondPair<T: Real> {
    pub atoms: HBondAtoms<T>,
    pub params: HBondPairParams<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HBondReport<T: Real> {
    /// One score per pair, in input order.
    pub energies: Vec<T>,
    /// Per-pair gradients on the five atoms, when requested.
    pub gradients: Option<Vec<HBondGrad<T>>>,
}

impl<T: Real> HBondReport<T> {
    pub fn total(&self) -> T {
        self.energies.iter().fold(real(0.0), |acc, &e| acc + e)
    }

    /// Pairs whose score was not clamped to zero.
    pub fn n_bonded(&self) -> usize {
        self.energies.iter().filter(|&&e| e < real(0.0)).count()
    }
}

/// Scores every pair with the default executor.
pub fn run<T: Real>(pairs: &[HBondPair<T>], params: &ScoreParams<T>, gradients: bool) -> HBondReport<T> {
    run_with(pairs, params, gradients, &DefaultExecutor::default())
}

#[instrument(skip_all, name = "hbond_workflow")]
pub fn run_with<T: Real, E: Executor>(
    pairs: &[HBondPair<T>],
    params: &ScoreParams<T>,
    gradients: bool,
    executor: &E,
) -> HBondReport<T> {
    let globals = &params.hbond;
    let report = if gradients {
        let grads = executor.map(pairs.len(), |index| {
            let pair = &pairs[index];
            hbond_score_with_grad(&pair.atoms, &pair.params, globals)
        });
        HBondReport {
            energies: grads.iter().map(|grad| grad.value).collect(),
            gradients: Some(grads),
        }
    } else {
        HBondReport {
            energies: executor.map(pairs.len(), |index| {
                let pair = &pairs[index];
                hbond_score(&pair.atoms, &pair.params, globals)
            }),
            gradients: None,
        }
    };

    info!(
        n_pairs = pairs.len(),
        n_bonded = report.n_bonded(),
        "Computed hydrogen bond scores."
    );
    debug!(total = %report.total(), "Hydrogen bond total");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::AcceptorClass;
    use crate::core::potentials::hbond::tests::{bonded_atoms, pair_params};
    use crate::engine::executor::SerialExecutor;
    use nalgebra::Point3;

    fn pairs() -> Vec<HBondPair<f64>> {
        // Acceptor behind the donor: no term is negative, so the score clamps.
        let mut far = bonded_atoms();
        far.a = Point3::new(-5.0, 0.3, 0.1);
        far.b = Point3::new(-4.0, 0.3, 0.1);
        far.b0 = Point3::new(-4.0, 0.5, 0.1);
        vec![
            HBondPair {
                atoms: bonded_atoms(),
                params: pair_params(AcceptorClass::Sp2),
            },
            HBondPair {
                atoms: bonded_atoms(),
                params: pair_params(AcceptorClass::Sp3),
            },
            HBondPair {
                atoms: far,
                params: pair_params(AcceptorClass::Ring),
            },
        ]
    }

    #[test]
    fn energies_follow_input_order() {
        let pairs = pairs();
        let params = ScoreParams::default();
        let report = run_with(&pairs, &params, false, &SerialExecutor);
        assert!(report.gradients.is_none());
        for (pair, energy) in pairs.iter().zip(&report.energies) {
            assert_eq!(*energy, hbond_score(&pair.atoms, &pair.params, &params.hbond));
        }
        assert_eq!(report.energies[2], 0.0);
        assert_eq!(report.n_bonded(), 2);
    }

    #[test]
    fn gradient_request_returns_per_pair_gradients() {
        let pairs = pairs();
        let params = ScoreParams::default();
        let report = run_with(&pairs, &params, true, &SerialExecutor);
        let grads = report.gradients.as_ref().unwrap();
        assert_eq!(grads.len(), pairs.len());
        assert_eq!(grads[0], hbond_score_with_grad(&pairs[0].atoms, &pairs[0].params, &params.hbond));
        assert!((report.total() - report.energies.iter().sum::<f64>()).abs() < 1e-12);
    }

    #[test]
    fn global_hbond_parameters_are_applied() {
        let pairs = pairs();
        let mut params = ScoreParams::default();
        let baseline = run_with(&pairs, &params, false, &SerialExecutor);
        params.hbond.hb_sp3_softmax_fade = 0.5;
        let softened = run_with(&pairs, &params, false, &SerialExecutor);
        assert_eq!(baseline.energies[0], softened.energies[0]);
        assert_ne!(baseline.energies[1], softened.energies[1]);
    }

    #[test]
    fn empty_pair_list_scores_nothing() {
        let report = run::<f64>(&[], &ScoreParams::default(), true);
        assert!(report.energies.is_empty());
        assert_eq!(report.total(), 0.0);
        assert_eq!(report.gradients, Some(Vec::new()));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn rayon_executor_agrees_with_serial() {
        use crate::engine::executor::RayonExecutor;
        let pairs: Vec<_> = pairs().into_iter().cycle().take(60).collect();
        let params = ScoreParams::default();
        assert_eq!(
            run_with(&pairs, &params, true, &SerialExecutor),
            run_with(&pairs, &params, true, &RayonExecutor)
        );
    }
}
