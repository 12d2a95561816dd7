use crate::core::geometry::{Real, real};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Per-atom LK-ball parameters, stored per tile slot of a block type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LkBallTypeParams<T: Real> {
    pub lj_radius: T,
    pub lk_dgfree: T,
    pub lk_lambda: T,
    pub lk_volume: T,
    #[serde(default)]
    pub is_donor: bool,
    #[serde(default)]
    pub is_hydroxyl: bool,
    #[serde(default)]
    pub is_polarh: bool,
    #[serde(default)]
    pub is_acceptor: bool,
}

impl<T: Real> LkBallTypeParams<T> {
    /// Donors and acceptors carry waters and take part in bridging.
    #[inline]
    pub fn is_polar(&self) -> bool {
        self.is_donor || self.is_acceptor
    }
}

impl<T: Real> Default for LkBallTypeParams<T> {
    fn default() -> Self {
        Self {
            lj_radius: real(0.0),
            lk_dgfree: real(0.0),
            lk_lambda: real(1.0),
            lk_volume: real(0.0),
            is_donor: false,
            is_hydroxyl: false,
            is_polarh: false,
            is_acceptor: false,
        }
    }
}

/// Coefficients of the LK-ball potential shared by a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LkBallGlobalParams<T: Real> {
    pub lj_hbond_dis: T,
    pub lj_hbond_oh_donor_dis: T,
    pub lj_hbond_hdis: T,
    pub lk_min_dis2sigma: T,
    pub lkb_water_dist: T,
    pub water_radius: T,
    pub lk_ball_overlap_gap: T,
    pub lk_ball_overlap_width_a2: T,
    pub lk_ball_ramp_width_a2: T,
    pub lk_ball_bridge_angle_widthscale: T,
    pub far_dmin: T,
    pub max_dis: T,
}

impl<T: Real> Default for LkBallGlobalParams<T> {
    fn default() -> Self {
        Self {
            lj_hbond_dis: real(3.0),
            lj_hbond_oh_donor_dis: real(2.6),
            lj_hbond_hdis: real(1.75),
            lk_min_dis2sigma: real(0.89),
            lkb_water_dist: real(2.65),
            water_radius: real(1.4),
            lk_ball_overlap_gap: real(0.0),
            lk_ball_overlap_width_a2: real(5.0),
            lk_ball_ramp_width_a2: real(3.709),
            lk_ball_bridge_angle_widthscale: real(0.0),
            far_dmin: real(4.5),
            max_dis: real(6.0),
        }
    }
}

/// Acceptor hybridization, which selects the base-angle sub-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorClass {
    Sp2,
    Sp3,
    Ring,
}

/// A bounded polynomial: `bound[0]` below `range[0]`, `bound[1]` above `range[1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HBondPolynomial<T: Real> {
    pub coeffs: [T; 11],
    pub range: [T; 2],
    pub bound: [T; 2],
}

/// Parameters of one donor-type/acceptor-type pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HBondPairParams<T: Real> {
    pub acceptor_class: AcceptorClass,
    pub acceptor_weight: T,
    pub donor_weight: T,
    pub ah_dist: HBondPolynomial<T>,
    pub cos_bah: HBondPolynomial<T>,
    pub ahd: HBondPolynomial<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HBondGlobalParams<T: Real> {
    pub hb_sp2_range_span: T,
    pub hb_sp2_bah180_rise: T,
    pub hb_sp2_outer_width: T,
    pub hb_sp3_softmax_fade: T,
}

impl<T: Real> Default for HBondGlobalParams<T> {
    fn default() -> Self {
        Self {
            hb_sp2_range_span: real(1.6),
            hb_sp2_bah180_rise: real(0.75),
            hb_sp2_outer_width: real(0.357),
            hb_sp3_softmax_fade: real(2.5),
        }
    }
}

/// Every global coefficient a scoring call needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreParams<T: Real> {
    pub lk_ball: LkBallGlobalParams<T>,
    pub hbond: HBondGlobalParams<T>,
}

impl<T: Real> Default for ScoreParams<T> {
    fn default() -> Self {
        Self {
            lk_ball: LkBallGlobalParams::default(),
            hbond: HBondGlobalParams::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameter '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl<T: Real + DeserializeOwned> ScoreParams<T> {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let params: Self = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParamLoadError> {
        let params: Self = toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;
        params.validate()?;
        Ok(params)
    }
}

impl<T: Real> ScoreParams<T> {
    pub fn validate(&self) -> Result<(), ParamLoadError> {
        let lk = &self.lk_ball;
        let positive = [
            ("lk_ball.lk_ball_ramp_width_a2", lk.lk_ball_ramp_width_a2),
            ("lk_ball.lk_ball_overlap_width_a2", lk.lk_ball_overlap_width_a2),
            ("lk_ball.lkb_water_dist", lk.lkb_water_dist),
            ("hbond.hb_sp2_outer_width", self.hbond.hb_sp2_outer_width),
            ("hbond.hb_sp3_softmax_fade", self.hbond.hb_sp3_softmax_fade),
        ];
        for (field, value) in positive {
            if value <= real(0.0) {
                return Err(ParamLoadError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        if lk.lk_ball_bridge_angle_widthscale < real(0.0) {
            return Err(ParamLoadError::Invalid {
                field: "lk_ball.lk_ball_bridge_angle_widthscale",
                reason: "must not be negative".to_string(),
            });
        }
        if lk.max_dis <= lk.far_dmin {
            return Err(ParamLoadError::Invalid {
                field: "lk_ball.max_dis",
                reason: format!(
                    "must exceed far_dmin ({}), got {}",
                    lk.far_dmin, lk.max_dis
                ),
            });
        }
        Ok(())
    }
}
