pub mod hbond;
pub mod score;

use crate::error::Result;
use posescore::core::params::ScoreParams;
use std::path::Path;
use tracing::info;

/// Parameters from `path`, or the built-in defaults.
fn load_params(path: Option<&Path>) -> Result<ScoreParams<f64>> {
    match path {
        Some(path) => {
            info!("Loading potential parameters from {:?}", path);
            Ok(ScoreParams::load(path)?)
        }
        None => Ok(ScoreParams::default()),
    }
}
