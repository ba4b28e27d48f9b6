//! MR scan-parameter range rows.

use serde::Serialize;
use sqlx::FromRow;
use nidb_core::mr_qa::{Range, ScanParamRange};
use nidb_core::types::DbId;

/// A row from `mr_scanparams`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanParamRow {
    pub mrscanparam_id: DbId,
    pub project_id: DbId,
    pub protocol_name: String,
    pub sequence_name: String,
    pub tr_min: f64,
    pub tr_max: f64,
    pub te_min: f64,
    pub te_max: f64,
    pub ti_min: f64,
    pub ti_max: f64,
    pub flip_min: f64,
    pub flip_max: f64,
    pub xdim_min: f64,
    pub xdim_max: f64,
    pub ydim_min: f64,
    pub ydim_max: f64,
    pub zdim_min: f64,
    pub zdim_max: f64,
    pub tdim_min: f64,
    pub tdim_max: f64,
    pub slicethickness_min: f64,
    pub slicethickness_max: f64,
    pub slicespacing_min: f64,
    pub slicespacing_max: f64,
    pub bandwidth_min: f64,
    pub bandwidth_max: f64,
}

impl ScanParamRow {
    pub fn to_range(&self) -> ScanParamRange {
        let r = |min, max| Range { min, max };
        ScanParamRange {
            protocol: self.protocol_name.clone(),
            sequence: self.sequence_name.clone(),
            tr: r(self.tr_min, self.tr_max),
            te: r(self.te_min, self.te_max),
            ti: r(self.ti_min, self.ti_max),
            flip: r(self.flip_min, self.flip_max),
            xdim: r(self.xdim_min, self.xdim_max),
            ydim: r(self.ydim_min, self.ydim_max),
            zdim: r(self.zdim_min, self.zdim_max),
            tdim: r(self.tdim_min, self.tdim_max),
            slice_thickness: r(self.slicethickness_min, self.slicethickness_max),
            slice_spacing: r(self.slicespacing_min, self.slicespacing_max),
            bandwidth: r(self.bandwidth_min, self.bandwidth_max),
        }
    }
}
