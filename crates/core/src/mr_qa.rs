//! MR scan-parameter QA.
//!
//! A project lists the acquisition parameter ranges its MR series are
//! allowed to have. A series passes when at least one range row accepts
//! every field. When none does, the rows with the fewest failing fields
//! are reported as the nearest candidates.
//!
//! All numeric comparisons happen on values rounded to three decimals.

use serde::Serialize;

use crate::types::{parse_db_id, DbId};

/// Decimal places kept for every scan parameter.
pub const PARAM_DECIMALS: i32 = 3;

/// Round to [`PARAM_DECIMALS`] places.
pub fn round_param(value: f64) -> f64 {
    let scale = 10f64.powi(PARAM_DECIMALS);
    (value * scale).round() / scale
}

/// Fixed-point form used for comparisons, so `2.5` typed in the editor and
/// `2.5000001` read from a header compare equal.
fn fixed(value: f64) -> i64 {
    (value * 10f64.powi(PARAM_DECIMALS)).round() as i64
}

/// Parse an editor cell. Blank or unparseable text is zero.
pub fn parse_param(cell: &str) -> f64 {
    round_param(cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0))
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// The numeric acquisition parameters checked by QA, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanParam {
    Tr,
    Te,
    Ti,
    Flip,
    XDim,
    YDim,
    ZDim,
    TDim,
    SliceThickness,
    SliceSpacing,
    Bandwidth,
}

impl ScanParam {
    pub const ALL: [ScanParam; 11] = [
        Self::Tr,
        Self::Te,
        Self::Ti,
        Self::Flip,
        Self::XDim,
        Self::YDim,
        Self::ZDim,
        Self::TDim,
        Self::SliceThickness,
        Self::SliceSpacing,
        Self::Bandwidth,
    ];

    /// Column stem in `mr_scanparams` (`{stem}_min`, `{stem}_max`).
    pub fn column_stem(self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::Te => "te",
            Self::Ti => "ti",
            Self::Flip => "flip",
            Self::XDim => "xdim",
            Self::YDim => "ydim",
            Self::ZDim => "zdim",
            Self::TDim => "tdim",
            Self::SliceThickness => "slicethickness",
            Self::SliceSpacing => "slicespacing",
            Self::Bandwidth => "bandwidth",
        }
    }
}

/// Measured values of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScanValues {
    pub tr: f64,
    pub te: f64,
    pub ti: f64,
    pub flip: f64,
    pub xdim: f64,
    pub ydim: f64,
    pub zdim: f64,
    pub tdim: f64,
    pub slice_thickness: f64,
    pub slice_spacing: f64,
    pub bandwidth: f64,
}

impl ScanValues {
    pub fn get(&self, param: ScanParam) -> f64 {
        match param {
            ScanParam::Tr => self.tr,
            ScanParam::Te => self.te,
            ScanParam::Ti => self.ti,
            ScanParam::Flip => self.flip,
            ScanParam::XDim => self.xdim,
            ScanParam::YDim => self.ydim,
            ScanParam::ZDim => self.zdim,
            ScanParam::TDim => self.tdim,
            ScanParam::SliceThickness => self.slice_thickness,
            ScanParam::SliceSpacing => self.slice_spacing,
            ScanParam::Bandwidth => self.bandwidth,
        }
    }

    fn get_mut(&mut self, param: ScanParam) -> &mut f64 {
        match param {
            ScanParam::Tr => &mut self.tr,
            ScanParam::Te => &mut self.te,
            ScanParam::Ti => &mut self.ti,
            ScanParam::Flip => &mut self.flip,
            ScanParam::XDim => &mut self.xdim,
            ScanParam::YDim => &mut self.ydim,
            ScanParam::ZDim => &mut self.zdim,
            ScanParam::TDim => &mut self.tdim,
            ScanParam::SliceThickness => &mut self.slice_thickness,
            ScanParam::SliceSpacing => &mut self.slice_spacing,
            ScanParam::Bandwidth => &mut self.bandwidth,
        }
    }

    /// Copy with every value rounded to three decimals.
    pub fn rounded(&self) -> Self {
        let mut out = *self;
        for p in ScanParam::ALL {
            let v = out.get_mut(p);
            *v = round_param(*v);
        }
        out
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn exact(value: f64) -> Self {
        let v = round_param(value);
        Self { min: v, max: v }
    }

    pub fn contains(&self, value: f64) -> bool {
        let v = fixed(value);
        fixed(self.min) <= v && v <= fixed(self.max)
    }
}

// ---------------------------------------------------------------------------
// Range rows and series
// ---------------------------------------------------------------------------

/// One row of a project's allowed-parameter table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanParamRange {
    pub protocol: String,
    pub sequence: String,
    pub tr: Range,
    pub te: Range,
    pub ti: Range,
    pub flip: Range,
    pub xdim: Range,
    pub ydim: Range,
    pub zdim: Range,
    pub tdim: Range,
    pub slice_thickness: Range,
    pub slice_spacing: Range,
    pub bandwidth: Range,
}

impl ScanParamRange {
    /// A row with every field at its default (all ranges `[0, 0]`).
    pub fn empty(protocol: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            sequence: sequence.into(),
            tr: Range::default(),
            te: Range::default(),
            ti: Range::default(),
            flip: Range::default(),
            xdim: Range::default(),
            ydim: Range::default(),
            zdim: Range::default(),
            tdim: Range::default(),
            slice_thickness: Range::default(),
            slice_spacing: Range::default(),
            bandwidth: Range::default(),
        }
    }

    pub fn range(&self, param: ScanParam) -> Range {
        *self.range_ref(param)
    }

    pub fn set_range(&mut self, param: ScanParam, range: Range) {
        *self.range_mut(param) = range;
    }

    fn range_ref(&self, param: ScanParam) -> &Range {
        match param {
            ScanParam::Tr => &self.tr,
            ScanParam::Te => &self.te,
            ScanParam::Ti => &self.ti,
            ScanParam::Flip => &self.flip,
            ScanParam::XDim => &self.xdim,
            ScanParam::YDim => &self.ydim,
            ScanParam::ZDim => &self.zdim,
            ScanParam::TDim => &self.tdim,
            ScanParam::SliceThickness => &self.slice_thickness,
            ScanParam::SliceSpacing => &self.slice_spacing,
            ScanParam::Bandwidth => &self.bandwidth,
        }
    }

    fn range_mut(&mut self, param: ScanParam) -> &mut Range {
        match param {
            ScanParam::Tr => &mut self.tr,
            ScanParam::Te => &mut self.te,
            ScanParam::Ti => &mut self.ti,
            ScanParam::Flip => &mut self.flip,
            ScanParam::XDim => &mut self.xdim,
            ScanParam::YDim => &mut self.ydim,
            ScanParam::ZDim => &mut self.zdim,
            ScanParam::TDim => &mut self.tdim,
            ScanParam::SliceThickness => &mut self.slice_thickness,
            ScanParam::SliceSpacing => &mut self.slice_spacing,
            ScanParam::Bandwidth => &mut self.bandwidth,
        }
    }

    /// A row that accepts exactly the given series.
    ///
    /// The protocol is the series description, or the protocol name when
    /// the description is empty.
    pub fn exact_from(series: &SeriesAcquisition) -> Self {
        let protocol = if series.description.is_empty() {
            &series.protocol
        } else {
            &series.description
        };
        let mut row = Self::empty(protocol.clone(), series.sequence.clone());
        for p in ScanParam::ALL {
            row.set_range(p, Range::exact(series.values.get(p)));
        }
        row
    }
}

/// Acquisition parameters of one MR series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesAcquisition {
    pub series_num: i32,
    pub description: String,
    pub protocol: String,
    pub sequence: String,
    pub values: ScanValues,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Names of the fields that fall outside `range`.
///
/// `protocol` fails only when neither the description nor the protocol name
/// equals the row's protocol.
pub fn mismatched_fields(series: &SeriesAcquisition, range: &ScanParamRange) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if series.description != range.protocol && series.protocol != range.protocol {
        fields.push("protocol");
    }
    if series.sequence != range.sequence {
        fields.push("sequence");
    }
    for p in ScanParam::ALL {
        if !range.range(p).contains(series.values.get(p)) {
            fields.push(p.column_stem());
        }
    }
    fields
}

/// Number of failing fields of `series` against `range`.
pub fn mismatch_count(series: &SeriesAcquisition, range: &ScanParamRange) -> u32 {
    mismatched_fields(series, range).len() as u32
}

/// Result of checking one series against a project's range table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QaOutcome {
    /// The project has no range rows.
    NoRanges,
    /// Index of the first row that accepts every field.
    Matched { row: usize },
    /// No row matched; `nearest` lists every row with the fewest failures,
    /// in table order.
    Unmatched { min_mismatches: u32, nearest: Vec<usize> },
}

/// Check `series` against `ranges` in table order.
pub fn evaluate(series: &SeriesAcquisition, ranges: &[ScanParamRange]) -> QaOutcome {
    if ranges.is_empty() {
        return QaOutcome::NoRanges;
    }

    let mut counts = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        let n = mismatch_count(series, range);
        if n == 0 {
            return QaOutcome::Matched { row: i };
        }
        counts.push(n);
    }

    let min_mismatches = counts.iter().copied().min().unwrap_or(0);
    let nearest = counts
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n == min_mismatches)
        .map(|(i, _)| i)
        .collect();
    QaOutcome::Unmatched {
        min_mismatches,
        nearest,
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// One line of the range editor as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanParamFormRow {
    pub row_id: String,
    pub protocol: String,
    pub sequence: String,
    /// `(min, max)` cells in [`ScanParam::ALL`] order.
    pub bounds: Vec<(String, String)>,
}

/// Change derived from one editor line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScanParamEdit {
    Insert { range: ScanParamRange },
    Update { id: DbId, range: ScanParamRange },
    Delete { id: DbId },
}

impl ScanParamFormRow {
    /// Decide what this line does.
    ///
    /// A protocol without a row ID inserts, a protocol with a row ID
    /// updates, a row ID without a protocol deletes. Anything else,
    /// including a non-numeric row ID, is ignored.
    pub fn plan(&self) -> Option<ScanParamEdit> {
        let protocol = self.protocol.trim();
        let row_id = self.row_id.trim();

        if protocol.is_empty() {
            return parse_db_id(row_id).map(|id| ScanParamEdit::Delete { id });
        }

        let mut range = ScanParamRange::empty(protocol, self.sequence.trim());
        for (i, p) in ScanParam::ALL.into_iter().enumerate() {
            let (min, max) = self
                .bounds
                .get(i)
                .map(|(lo, hi)| (parse_param(lo), parse_param(hi)))
                .unwrap_or_default();
            range.set_range(p, Range { min, max });
        }

        if row_id.is_empty() {
            Some(ScanParamEdit::Insert { range })
        } else {
            parse_db_id(row_id).map(|id| ScanParamEdit::Update { id, range })
        }
    }
}

/// Plan every editor line, dropping the ones that do nothing.
pub fn plan_edits(rows: &[ScanParamFormRow]) -> Vec<ScanParamEdit> {
    rows.iter().filter_map(ScanParamFormRow::plan).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn series() -> SeriesAcquisition {
        SeriesAcquisition {
            series_num: 3,
            description: "T1w MPRAGE".into(),
            protocol: "t1_mprage".into(),
            sequence: "tfl3d1".into(),
            values: ScanValues {
                tr: 2300.0,
                te: 2.98,
                ti: 900.0,
                flip: 9.0,
                xdim: 256.0,
                ydim: 240.0,
                zdim: 176.0,
                tdim: 1.0,
                slice_thickness: 1.0,
                slice_spacing: 0.0,
                bandwidth: 240.0004,
            },
        }
    }

    #[test]
    fn exact_row_matches_its_series() {
        let s = series();
        let row = ScanParamRange::exact_from(&s);
        assert_eq!(row.protocol, "T1w MPRAGE");
        assert_eq!(row.bandwidth, Range { min: 240.0, max: 240.0 });
        assert_eq!(mismatch_count(&s, &row), 0);
        assert_eq!(evaluate(&s, &[row]), QaOutcome::Matched { row: 0 });
    }

    #[test]
    fn exact_row_uses_protocol_without_description() {
        let mut s = series();
        s.description.clear();
        assert_eq!(ScanParamRange::exact_from(&s).protocol, "t1_mprage");
    }

    #[test]
    fn protocol_matches_either_name() {
        let s = series();
        let mut row = ScanParamRange::exact_from(&s);
        row.protocol = "t1_mprage".into();
        assert_eq!(mismatch_count(&s, &row), 0);
        row.protocol = "other".into();
        assert_eq!(mismatched_fields(&s, &row), vec!["protocol"]);
    }

    #[test]
    fn dimensions_are_checked_independently() {
        let s = series();
        let mut row = ScanParamRange::exact_from(&s);
        row.ydim = Range { min: 256.0, max: 256.0 };
        row.tdim = Range { min: 2.0, max: 10.0 };
        assert_eq!(mismatched_fields(&s, &row), vec!["ydim", "tdim"]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let r = Range { min: 2.0, max: 3.0 };
        assert!(r.contains(2.0));
        assert!(r.contains(3.0));
        assert!(r.contains(3.0004));
        assert!(!r.contains(3.001));
    }

    #[test]
    fn first_matching_row_wins() {
        let s = series();
        let mut wrong = ScanParamRange::exact_from(&s);
        wrong.sequence = "epfid2d1".into();
        let right = ScanParamRange::exact_from(&s);
        assert_eq!(
            evaluate(&s, &[wrong, right.clone(), right]),
            QaOutcome::Matched { row: 1 }
        );
    }

    #[test]
    fn unmatched_reports_all_nearest_rows() {
        let s = series();
        let mut a = ScanParamRange::exact_from(&s);
        a.sequence = "x".into();
        a.flip = Range { min: 0.0, max: 1.0 };
        let mut b = ScanParamRange::exact_from(&s);
        b.tr = Range { min: 0.0, max: 1.0 };
        let mut c = ScanParamRange::exact_from(&s);
        c.te = Range { min: 0.0, max: 1.0 };

        assert_matches!(
            evaluate(&s, &[a, b, c]),
            QaOutcome::Unmatched { min_mismatches: 1, nearest } if nearest == vec![1, 2]
        );
    }

    #[test]
    fn no_ranges() {
        assert_eq!(evaluate(&series(), &[]), QaOutcome::NoRanges);
    }

    #[test]
    fn params_parse_to_three_decimals() {
        assert_eq!(parse_param(" 2.34567 "), 2.346);
        assert_eq!(parse_param(""), 0.0);
        assert_eq!(parse_param("abc"), 0.0);
    }

    fn form_row(id: &str, protocol: &str) -> ScanParamFormRow {
        ScanParamFormRow {
            row_id: id.into(),
            protocol: protocol.into(),
            sequence: " ep2d ".into(),
            bounds: vec![("2000".into(), "2100.5".into())],
        }
    }

    #[test]
    fn editor_lines_plan_insert_update_delete() {
        let edits = plan_edits(&[
            form_row("", "rest"),
            form_row("7", "rest"),
            form_row("8", " "),
            form_row("", ""),
            form_row("x", "rest"),
        ]);
        assert_eq!(edits.len(), 3);
        assert_matches!(&edits[0], ScanParamEdit::Insert { range } if range.sequence == "ep2d");
        assert_matches!(&edits[1], ScanParamEdit::Update { id: 7, range }
            if range.tr.min == 2000.0 && range.tr.max == 2100.5 && range.te.max == 0.0);
        assert_matches!(&edits[2], ScanParamEdit::Delete { id: 8 });
    }
}
