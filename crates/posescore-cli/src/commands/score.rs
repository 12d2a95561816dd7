use crate::cli::ScoreArgs;
use crate::error::{CliError, Result};
use crate::input::LoadedBatch;
use nalgebra::Vector3;
use posescore::workflows::score::{self, ScoreGradients, ScoreReport, ScoreRequest};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Gradients as nested JSON arrays, mirroring the input layout.
#[derive(Debug, Serialize)]
struct GradientFile {
    d_coords: Vec<Vec<[f64; 3]>>,
    d_waters: Vec<Vec<Vec<[f64; 3]>>>,
}

impl From<&ScoreGradients<f64>> for GradientFile {
    fn from(gradients: &ScoreGradients<f64>) -> Self {
        let xyz = |v: &Vector3<f64>| [v.x, v.y, v.z];
        Self {
            d_coords: gradients
                .d_coords
                .outer_iter()
                .map(|pose| pose.iter().map(xyz).collect())
                .collect(),
            d_waters: gradients
                .d_waters
                .outer_iter()
                .map(|pose| {
                    pose.outer_iter()
                        .map(|atom| atom.iter().map(xyz).collect())
                        .collect()
                })
                .collect(),
        }
    }
}

pub fn run(args: ScoreArgs) -> Result<()> {
    let params = super::load_params(args.params.as_deref())?;

    info!("Loading pose stack from {:?}", &args.stack);
    let batch = LoadedBatch::read_from_path(&args.stack)?;

    let request = ScoreRequest {
        gradients: args.gradients.is_some(),
        dtdv: None,
    };
    info!("Invoking the scoring workflow...");
    let report = score::run(&batch.stack(), &batch.types(), &params, &request)?;

    print!("{}", format_energy_table(&report)?);

    if let (Some(path), Some(gradients)) = (&args.gradients, &report.gradients) {
        write_gradients(path, gradients)?;
        println!("Gradients written to: {}", path.display());
    }
    Ok(())
}

fn format_energy_table(report: &ScoreReport<f64>) -> Result<String> {
    let mut table = format!(
        "{:>6} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "pose", "lk_iso", "lk_ball", "bridge", "bridge_uncpl", "total"
    );
    for pose in 0..report.n_poses() {
        let terms = report.pose_terms(pose);
        writeln!(
            table,
            "{:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            pose,
            terms.iso,
            terms.ball,
            terms.bridge,
            terms.bridge_uncpl,
            terms.total()
        )
        .map_err(|e| anyhow::Error::new(e).context("Failed to format the energy table"))?;
    }
    Ok(table)
}

fn write_gradients(path: &Path, gradients: &ScoreGradients<f64>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &GradientFile::from(gradients))
        .map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::one_block_json;
    use posescore::core::params::ScoreParams;

    fn write_stack(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("stack.json");
        std::fs::write(&path, one_block_json().to_string()).unwrap();
        path
    }

    #[test]
    fn score_writes_gradients_matching_the_stack_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let grad_path = temp_dir.path().join("grad.json");
        let args = ScoreArgs {
            stack: write_stack(temp_dir.path()),
            params: None,
            gradients: Some(grad_path.clone()),
        };

        run(args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(grad_path).unwrap()).unwrap();
        let d_coords = written["d_coords"].as_array().unwrap();
        assert_eq!(d_coords.len(), 1);
        assert_eq!(d_coords[0].as_array().unwrap().len(), 2);
        assert_eq!(written["d_waters"][0][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn parameter_file_is_applied() {
        let temp_dir = tempfile::tempdir().unwrap();
        let params_path = temp_dir.path().join("params.toml");
        std::fs::write(&params_path, "[lk_ball]\nmax_dis = 7.0\n").unwrap();
        let args = ScoreArgs {
            stack: write_stack(temp_dir.path()),
            params: Some(params_path),
            gradients: None,
        };
        assert!(run(args).is_ok());
    }

    #[test]
    fn invalid_parameter_file_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let params_path = temp_dir.path().join("params.toml");
        std::fs::write(&params_path, "[lk_ball]\nnot_a_key = 1.0\n").unwrap();
        let args = ScoreArgs {
            stack: write_stack(temp_dir.path()),
            params: Some(params_path),
            gradients: None,
        };
        assert!(matches!(run(args), Err(CliError::Params(_))));
    }

    #[test]
    fn energy_table_has_a_row_per_pose() {
        let batch = LoadedBatch::from_file(serde_json::from_value(one_block_json()).unwrap())
            .unwrap();
        let report = score::run(
            &batch.stack(),
            &batch.types(),
            &ScoreParams::default(),
            &ScoreRequest::default(),
        )
        .unwrap();
        let table = format_energy_table(&report).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("bridge_uncpl"));
        assert!(lines[1].trim_start().starts_with('0'));
    }
}
