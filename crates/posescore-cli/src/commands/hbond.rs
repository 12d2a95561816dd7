use crate::cli::HBondArgs;
use crate::error::{CliError, Result};
use crate::input;
use nalgebra::Vector3;
use posescore::core::potentials::hbond::HBondGrad;
use posescore::workflows::hbond::{self, HBondReport};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Per-pair gradients on the five atoms of each hydrogen bond.
#[derive(Debug, Serialize)]
struct PairGradient {
    energy: f64,
    d_d: [f64; 3],
    d_h: [f64; 3],
    d_a: [f64; 3],
    d_b: [f64; 3],
    d_b0: [f64; 3],
}

impl From<&HBondGrad<f64>> for PairGradient {
    fn from(grad: &HBondGrad<f64>) -> Self {
        let xyz = |v: &Vector3<f64>| [v.x, v.y, v.z];
        Self {
            energy: grad.value,
            d_d: xyz(&grad.d_d),
            d_h: xyz(&grad.d_h),
            d_a: xyz(&grad.d_a),
            d_b: xyz(&grad.d_b),
            d_b0: xyz(&grad.d_b0),
        }
    }
}

pub fn run(args: HBondArgs) -> Result<()> {
    let params = super::load_params(args.params.as_deref())?;

    info!("Loading donor-acceptor pairs from {:?}", &args.pairs);
    let pairs = input::read_hbond_pairs(&args.pairs)?;

    info!("Invoking the hydrogen bond workflow...");
    let report = hbond::run(&pairs, &params, args.gradients.is_some());

    print!("{}", format_pair_table(&report)?);

    if let (Some(path), Some(gradients)) = (&args.gradients, &report.gradients) {
        write_gradients(path, gradients)?;
        println!("Gradients written to: {}", path.display());
    }
    Ok(())
}

fn format_pair_table(report: &HBondReport<f64>) -> Result<String> {
    let mut table = format!("{:>6} {:>12}\n", "pair", "hbond");
    for (pair, energy) in report.energies.iter().enumerate() {
        writeln!(table, "{:>6} {:>12.4}", pair, energy)
            .map_err(|e| anyhow::Error::new(e).context("Failed to format the pair table"))?;
    }
    writeln!(table, "{:>6} {:>12.4}", "total", report.total())
        .map_err(|e| anyhow::Error::new(e).context("Failed to format the pair table"))?;
    Ok(table)
}

fn write_gradients(path: &Path, gradients: &[HBondGrad<f64>]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let rows: Vec<PairGradient> = gradients.iter().map(PairGradient::from).collect();
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &rows).map_err(|e| {
        CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        }
    })
}
