use crate::error::{CliError, Result};
use nalgebra::Point3;
use ndarray::{Array, Array1, Array2, Array3, Array5, ArrayD, Dimension, IxDyn};
use posescore::core::params::{HBondPairParams, LkBallTypeParams};
use posescore::core::potentials::hbond::HBondAtoms;
use posescore::engine::pose_stack::{BlockTypeTables, PoseStackView};
use posescore::workflows::hbond::HBondPair;
use serde::Deserialize;
use std::path::Path;

type Nested<A> = (Vec<usize>, Vec<A>);

/// Pose stack and block-type tables as nested JSON arrays.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    pub coords: Vec<Vec<[f64; 3]>>,
    /// `null` marks an absent water.
    pub waters: Vec<Vec<Vec<Option<[f64; 3]>>>>,
    pub block_coord_offset: Vec<Vec<i32>>,
    pub block_type: Vec<Vec<i32>>,
    pub inter_residue_connections: Vec<Vec<Vec<[i32; 2]>>>,
    pub min_bond_separation: Vec<Vec<Vec<i32>>>,
    pub inter_block_bondsep: Vec<Vec<Vec<Vec<Vec<i32>>>>>,
    pub block_types: BlockTypesFile,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockTypesFile {
    pub n_atoms: Vec<i32>,
    pub n_interblock_bonds: Vec<i32>,
    pub atoms_forming_chemical_bonds: Vec<Vec<i32>>,
    pub tile_n_polar: Vec<Vec<i32>>,
    pub tile_n_occluder: Vec<Vec<i32>>,
    pub tile_pol_occ_inds: Vec<Vec<Vec<i32>>>,
    /// `null` for unused tile slots.
    pub tile_params: Vec<Vec<Vec<Option<LkBallTypeParams<f64>>>>>,
    pub path_distance: Vec<Vec<Vec<i32>>>,
}

/// Owned arrays backing the views handed to the scoring workflow.
#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub coords: Array2<Point3<f64>>,
    pub waters: Array3<Point3<f64>>,
    pub block_coord_offset: Array2<i32>,
    pub block_type: Array2<i32>,
    pub inter_residue_connections: Array3<[i32; 2]>,
    pub min_bond_separation: Array3<i32>,
    pub inter_block_bondsep: Array5<i32>,
    pub n_atoms: Array1<i32>,
    pub n_interblock_bonds: Array1<i32>,
    pub atoms_forming_chemical_bonds: Array2<i32>,
    pub tile_n_polar: Array2<i32>,
    pub tile_n_occluder: Array2<i32>,
    pub tile_pol_occ_inds: Array3<i32>,
    pub tile_params: Array3<LkBallTypeParams<f64>>,
    pub path_distance: Array3<i32>,
}

impl LoadedBatch {
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: StackFile =
            serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        Self::from_file(file)
    }

    pub fn from_file(file: StackFile) -> Result<Self> {
        let absent = Point3::new(f64::NAN, f64::NAN, f64::NAN);
        let types = file.block_types;

        Ok(Self {
            coords: shaped(
                "coords",
                nest("coords", file.coords, |atoms: Vec<[f64; 3]>| {
                    leaf(atoms.into_iter().map(Point3::from).collect())
                })?,
            )?,
            waters: shaped(
                "waters",
                nest("waters", file.waters, |atoms| {
                    nest("waters", atoms, |slots: Vec<Option<[f64; 3]>>| {
                        leaf(
                            slots
                                .into_iter()
                                .map(|slot| slot.map_or(absent, Point3::from))
                                .collect(),
                        )
                    })
                })?,
            )?,
            block_coord_offset: shaped(
                "block_coord_offset",
                nest("block_coord_offset", file.block_coord_offset, leaf)?,
            )?,
            block_type: shaped("block_type", nest("block_type", file.block_type, leaf)?)?,
            inter_residue_connections: shaped(
                "inter_residue_connections",
                nest("inter_residue_connections", file.inter_residue_connections, |blocks| {
                    nest("inter_residue_connections", blocks, leaf)
                })?,
            )?,
            min_bond_separation: shaped(
                "min_bond_separation",
                nest("min_bond_separation", file.min_bond_separation, |blocks| {
                    nest("min_bond_separation", blocks, leaf)
                })?,
            )?,
            inter_block_bondsep: shaped(
                "inter_block_bondsep",
                nest("inter_block_bondsep", file.inter_block_bondsep, |a| {
                    nest("inter_block_bondsep", a, |b| {
                        nest("inter_block_bondsep", b, |c| {
                            nest("inter_block_bondsep", c, leaf)
                        })
                    })
                })?,
            )?,
            n_atoms: shaped("n_atoms", leaf(types.n_atoms)?)?,
            n_interblock_bonds: shaped("n_interblock_bonds", leaf(types.n_interblock_bonds)?)?,
            atoms_forming_chemical_bonds: shaped(
                "atoms_forming_chemical_bonds",
                nest(
                    "atoms_forming_chemical_bonds",
                    types.atoms_forming_chemical_bonds,
                    leaf,
                )?,
            )?,
            tile_n_polar: shaped("tile_n_polar", nest("tile_n_polar", types.tile_n_polar, leaf)?)?,
            tile_n_occluder: shaped(
                "tile_n_occluder",
                nest("tile_n_occluder", types.tile_n_occluder, leaf)?,
            )?,
            tile_pol_occ_inds: shaped(
                "tile_pol_occ_inds",
                nest("tile_pol_occ_inds", types.tile_pol_occ_inds, |tiles| {
                    nest("tile_pol_occ_inds", tiles, leaf)
                })?,
            )?,
            tile_params: shaped(
                "tile_params",
                nest("tile_params", types.tile_params, |tiles| {
                    nest(
                        "tile_params",
                        tiles,
                        |slots: Vec<Option<LkBallTypeParams<f64>>>| {
                            leaf(slots.into_iter().map(Option::unwrap_or_default).collect())
                        },
                    )
                })?,
            )?,
            path_distance: shaped(
                "path_distance",
                nest("path_distance", types.path_distance, |rows| {
                    nest("path_distance", rows, leaf)
                })?,
            )?,
        })
    }

    pub fn stack(&self) -> PoseStackView<'_, f64> {
        PoseStackView {
            coords: self.coords.view(),
            waters: self.waters.view(),
            block_coord_offset: self.block_coord_offset.view(),
            block_type: self.block_type.view(),
            inter_residue_connections: self.inter_residue_connections.view(),
            min_bond_separation: self.min_bond_separation.view(),
            inter_block_bondsep: self.inter_block_bondsep.view(),
        }
    }

    pub fn types(&self) -> BlockTypeTables<'_, f64> {
        BlockTypeTables {
            n_atoms: self.n_atoms.view(),
            n_interblock_bonds: self.n_interblock_bonds.view(),
            atoms_forming_chemical_bonds: self.atoms_forming_chemical_bonds.view(),
            tile_n_polar: self.tile_n_polar.view(),
            tile_n_occluder: self.tile_n_occluder.view(),
            tile_pol_occ_inds: self.tile_pol_occ_inds.view(),
            tile_params: self.tile_params.view(),
            path_distance: self.path_distance.view(),
        }
    }
}

/// Donor-acceptor pairs for the hydrogen bond workflow.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HBondPairsFile {
    pub pairs: Vec<HBondPairEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HBondPairEntry {
    pub d: [f64; 3],
    pub h: [f64; 3],
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub b0: [f64; 3],
    pub params: HBondPairParams<f64>,
}

impl From<HBondPairEntry> for HBondPair<f64> {
    fn from(entry: HBondPairEntry) -> Self {
        Self {
            atoms: HBondAtoms {
                d: Point3::from(entry.d),
                h: Point3::from(entry.h),
                a: Point3::from(entry.a),
                b: Point3::from(entry.b),
                b0: Point3::from(entry.b0),
            },
            params: entry.params,
        }
    }
}

pub fn read_hbond_pairs(path: &Path) -> Result<Vec<HBondPair<f64>>> {
    let content = std::fs::read_to_string(path)?;
    let file: HBondPairsFile = serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    Ok(file.pairs.into_iter().map(HBondPair::from).collect())
}

fn leaf<A>(values: Vec<A>) -> Result<Nested<A>> {
    Ok((vec![values.len()], values))
}

/// Flattens one nesting level, requiring every item to share a shape.
fn nest<A, B, F>(field: &'static str, items: Vec<B>, inner: F) -> Result<Nested<A>>
where
    F: Fn(B) -> Result<Nested<A>>,
{
    let n = items.len();
    let mut inner_shape: Option<Vec<usize>> = None;
    let mut data = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let (shape, values) = inner(item)?;
        match &inner_shape {
            Some(expected) if *expected != shape => {
                return Err(CliError::Input {
                    field,
                    reason: format!(
                        "ragged array: entry {} has shape {:?}, expected {:?}",
                        index, shape, expected
                    ),
                });
            }
            Some(_) => {}
            None => inner_shape = Some(shape),
        }
        data.extend(values);
    }

    let mut shape = vec![n];
    shape.extend(inner_shape.unwrap_or_default());
    Ok((shape, data))
}

/// Empty outer axes leave inner extents unknown; those become zero.
fn shaped<A, D: Dimension>(field: &'static str, (mut shape, data): Nested<A>) -> Result<Array<A, D>> {
    if let Some(ndim) = D::NDIM {
        shape.resize(ndim, 0);
    }
    let to_input_error = |e: ndarray::ShapeError| CliError::Input {
        field,
        reason: e.to_string(),
    };
    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(to_input_error)?
        .into_dimensionality::<D>()
        .map_err(to_input_error)
}
