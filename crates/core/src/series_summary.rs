//! Series-name summaries.
//!
//! Scanners name series inconsistently across sites and software versions.
//! Projects assign each raw name an alternate (canonical) name; these
//! summaries list the raw names to be mapped and count the mapped names per
//! subject.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Unique series names
// ---------------------------------------------------------------------------

/// Name fields of one series row, from any modality table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesNameRecord {
    pub modality: String,
    pub description: String,
    pub protocol: String,
    pub altdesc: String,
}

impl SeriesNameRecord {
    /// Description, or protocol when the description is empty.
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() {
            &self.protocol
        } else {
            &self.description
        }
    }
}

/// One distinct series name with its usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueSeriesEntry {
    pub modality: String,
    pub name: String,
    pub count: u32,
    /// Alternate name currently stored for this name (last one seen).
    pub altdesc: String,
}

/// Count distinct series names per modality.
///
/// Modalities are sorted; names within a modality use natural order so
/// `run2` sorts before `run10`. Series without any name are skipped.
pub fn unique_series(records: &[SeriesNameRecord]) -> Vec<UniqueSeriesEntry> {
    let mut counts: BTreeMap<&str, HashMap<&str, (u32, &str)>> = BTreeMap::new();
    for r in records {
        let name = r.display_name();
        if name.is_empty() {
            continue;
        }
        let slot = counts
            .entry(r.modality.as_str())
            .or_default()
            .entry(name)
            .or_insert((0, ""));
        slot.0 += 1;
        slot.1 = r.altdesc.as_str();
    }

    let mut out = Vec::new();
    for (modality, names) in counts {
        let mut names: Vec<_> = names.into_iter().collect();
        names.sort_by(|a, b| natural_cmp(a.0, b.0));
        out.extend(names.into_iter().map(|(name, (count, altdesc))| UniqueSeriesEntry {
            modality: modality.to_string(),
            name: name.to_string(),
            count,
            altdesc: altdesc.to_string(),
        }));
    }
    out
}

/// Compare strings treating digit runs as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut a);
                let nb = take_digits(&mut b);
                let ord = na
                    .trim_start_matches('0')
                    .len()
                    .cmp(&nb.trim_start_matches('0').len())
                    .then_with(|| na.trim_start_matches('0').cmp(nb.trim_start_matches('0')))
                    .then_with(|| na.len().cmp(&nb.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut s = String::new();
    while let Some(c) = it.peek().copied().filter(char::is_ascii_digit) {
        s.push(c);
        it.next();
    }
    s
}

// ---------------------------------------------------------------------------
// Alternate-name counts per subject
// ---------------------------------------------------------------------------

/// A series of a subject that carries an alternate name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSeriesName {
    pub uid: String,
    pub modality: String,
    pub altdesc: String,
}

/// One column of the summary: a modality/alternate-name pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltSeriesColumn {
    pub modality: String,
    pub altdesc: String,
    pub total: u32,
}

/// Counts for one subject, aligned with the summary columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltSeriesRow {
    pub uid: String,
    pub counts: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AltSeriesSummary {
    pub columns: Vec<AltSeriesColumn>,
    pub rows: Vec<AltSeriesRow>,
}

/// Build the per-subject alternate-name table.
///
/// Entries with an empty alternate name are ignored; the caller is
/// expected to have excluded hidden series already.
pub fn alt_series_summary(names: &[SubjectSeriesName]) -> AltSeriesSummary {
    let mut totals: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    let mut per_uid: BTreeMap<&str, HashMap<(&str, &str), u32>> = BTreeMap::new();

    for n in names.iter().filter(|n| !n.altdesc.is_empty()) {
        let key = (n.modality.as_str(), n.altdesc.as_str());
        *totals.entry(key).or_default() += 1;
        *per_uid.entry(n.uid.as_str()).or_default().entry(key).or_default() += 1;
    }

    let keys: Vec<(&str, &str)> = totals.keys().copied().collect();
    let columns = totals
        .iter()
        .map(|(&(modality, altdesc), &total)| AltSeriesColumn {
            modality: modality.to_string(),
            altdesc: altdesc.to_string(),
            total,
        })
        .collect();
    let rows = per_uid
        .into_iter()
        .map(|(uid, counts)| AltSeriesRow {
            uid: uid.to_string(),
            counts: keys
                .iter()
                .map(|k| counts.get(k).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    AltSeriesSummary { columns, rows }
}

// ---------------------------------------------------------------------------
// Instance summary
// ---------------------------------------------------------------------------

/// Subject details shown next to the counts in the instance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSubject {
    pub uid: String,
    pub subject_id: DbId,
    pub age_at_scan: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub primary_altuid: Option<String>,
    pub project_name: String,
}

/// A measure value is text or a number depending on the measure's type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Text(String),
    Number(f64),
}

impl MeasureValue {
    /// Pick the value column by the stored type flag (`s` is text).
    pub fn from_columns(measure_type: &str, text: Option<String>, number: Option<f64>) -> Self {
        if measure_type == "s" {
            Self::Text(text.unwrap_or_default())
        } else {
            Self::Number(number.unwrap_or(0.0))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMeasure {
    pub uid: String,
    pub instrument: String,
    pub measure: String,
    pub value: MeasureValue,
}

impl SubjectMeasure {
    /// Column header: `[instrument] - measure`.
    pub fn label(&self) -> String {
        format!("[{}] - {}", self.instrument, self.measure)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSummaryRow {
    #[serde(flatten)]
    pub subject: InstanceSubject,
    pub counts: Vec<u32>,
    pub measures: BTreeMap<String, MeasureValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceSummary {
    pub columns: Vec<AltSeriesColumn>,
    pub measure_columns: Vec<String>,
    pub rows: Vec<InstanceSummaryRow>,
}

/// Alternate-name counts across an instance, with subject details and
/// measures.
///
/// Only subjects with at least one named series get a row. The first
/// details record seen for a UID wins.
pub fn instance_summary(
    subjects: &[InstanceSubject],
    names: &[SubjectSeriesName],
    measures: &[SubjectMeasure],
) -> InstanceSummary {
    let alt = alt_series_summary(names);

    let mut details: HashMap<&str, &InstanceSubject> = HashMap::new();
    for s in subjects {
        details.entry(s.uid.as_str()).or_insert(s);
    }

    let mut measure_columns = BTreeSet::new();
    let mut rows = Vec::new();
    for row in alt.rows {
        let Some(subject) = details.get(row.uid.as_str()) else {
            continue;
        };
        let subject_measures: BTreeMap<String, MeasureValue> = measures
            .iter()
            .filter(|m| m.uid == row.uid)
            .map(|m| (m.label(), m.value.clone()))
            .collect();
        measure_columns.extend(subject_measures.keys().cloned());
        rows.push(InstanceSummaryRow {
            subject: (*subject).clone(),
            counts: row.counts,
            measures: subject_measures,
        });
    }

    InstanceSummary {
        columns: alt.columns,
        measure_columns: measure_columns.into_iter().collect(),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Renames
// ---------------------------------------------------------------------------

/// Set `new_name` as the alternate name of every series named `old_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternateNameChange {
    pub modality: String,
    pub old_name: String,
    pub new_name: String,
}

/// Zip the rename form's arrays. Rows with any empty field are dropped.
pub fn alternate_name_changes(
    modalities: &[String],
    old_names: &[String],
    new_names: &[String],
) -> Vec<AlternateNameChange> {
    modalities
        .iter()
        .enumerate()
        .filter_map(|(i, modality)| {
            let modality = modality.trim();
            let old_name = old_names.get(i).map(|s| s.as_str()).unwrap_or("");
            let new_name = new_names.get(i).map(|s| s.trim()).unwrap_or("");
            if modality.is_empty() || old_name.is_empty() || new_name.is_empty() {
                return None;
            }
            Some(AlternateNameChange {
                modality: modality.to_lowercase(),
                old_name: old_name.to_string(),
                new_name: new_name.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(modality: &str, desc: &str, protocol: &str, alt: &str) -> SeriesNameRecord {
        SeriesNameRecord {
            modality: modality.into(),
            description: desc.into(),
            protocol: protocol.into(),
            altdesc: alt.into(),
        }
    }

    fn named(uid: &str, modality: &str, alt: &str) -> SubjectSeriesName {
        SubjectSeriesName {
            uid: uid.into(),
            modality: modality.into(),
            altdesc: alt.into(),
        }
    }

    #[test]
    fn natural_order() {
        let mut v = vec!["run10", "run2", "Run1", "run02"];
        v.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(v, vec!["Run1", "run2", "run02", "run10"]);
    }

    #[test]
    fn unique_names_fall_back_to_protocol() {
        let out = unique_series(&[
            rec("mr", "rest", "ep2d", "REST"),
            rec("mr", "", "ep2d", ""),
            rec("mr", "rest", "x", "REST"),
            rec("mr", "", "", ""),
            rec("eeg", "task", "", ""),
        ]);
        let got: Vec<_> = out
            .iter()
            .map(|e| (e.modality.as_str(), e.name.as_str(), e.count))
            .collect();
        assert_eq!(got, vec![("eeg", "task", 1), ("mr", "ep2d", 1), ("mr", "rest", 2)]);
        assert_eq!(out[2].altdesc, "REST");
    }

    #[test]
    fn alt_summary_counts_per_subject() {
        let s = alt_series_summary(&[
            named("S1", "mr", "T1"),
            named("S1", "mr", "T1"),
            named("S2", "mr", "REST"),
            named("S2", "mr", ""),
        ]);
        assert_eq!(s.columns.len(), 2);
        assert_eq!((s.columns[0].altdesc.as_str(), s.columns[0].total), ("REST", 1));
        assert_eq!((s.columns[1].altdesc.as_str(), s.columns[1].total), ("T1", 2));
        assert_eq!(s.rows[0].uid, "S1");
        assert_eq!(s.rows[0].counts, vec![0, 2]);
        assert_eq!(s.rows[1].counts, vec![1, 0]);
    }

    #[test]
    fn instance_summary_joins_details_and_measures() {
        let subject = InstanceSubject {
            uid: "S1".into(),
            subject_id: 1,
            age_at_scan: Some(30.0),
            birthdate: None,
            primary_altuid: Some("A1".into()),
            project_name: "Study A".into(),
        };
        let unnamed = InstanceSubject {
            uid: "S2".into(),
            ..subject.clone()
        };
        let measures = vec![
            SubjectMeasure {
                uid: "S1".into(),
                instrument: "PANSS".into(),
                measure: "total".into(),
                value: MeasureValue::Number(54.0),
            },
            SubjectMeasure {
                uid: "S2".into(),
                instrument: "PANSS".into(),
                measure: "notes".into(),
                value: MeasureValue::Text("n/a".into()),
            },
        ];

        let out = instance_summary(
            &[subject, unnamed],
            &[named("S1", "mr", "T1")],
            &measures,
        );
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].subject.project_name, "Study A");
        assert_eq!(out.measure_columns, vec!["[PANSS] - total"]);
        assert_eq!(
            out.rows[0].measures.get("[PANSS] - total"),
            Some(&MeasureValue::Number(54.0))
        );
    }

    #[test]
    fn measure_value_by_type() {
        assert_eq!(
            MeasureValue::from_columns("s", Some("yes".into()), Some(1.0)),
            MeasureValue::Text("yes".into())
        );
        assert_eq!(
            MeasureValue::from_columns("n", None, Some(2.5)),
            MeasureValue::Number(2.5)
        );
    }

    #[test]
    fn renames_drop_incomplete_rows() {
        let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        let changes = alternate_name_changes(
            &s(&["MR", "mr", ""]),
            &s(&["rest", "", "t1"]),
            &s(&["REST", "X", "T1"]),
        );
        assert_eq!(
            changes,
            vec![AlternateNameChange {
                modality: "mr".into(),
                old_name: "rest".into(),
                new_name: "REST".into(),
            }]
        );
    }
}
