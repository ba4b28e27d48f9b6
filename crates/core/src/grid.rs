//! Bulk-edit grids.
//!
//! The subject and study editors post their whole table back as CSV text:
//! one header line followed by one row per record. Rows with the wrong
//! column count are skipped without comment; rows with bad identifiers are
//! skipped with a notice.

use serde::Serialize;

use crate::demographics::{
    normalize_smoking_status, parse_birthdate, CodeTable, Education, Ethnicity1, Ethnicity2,
    Handedness, MaritalStatus, Sex, SubjectUpdates,
};
use crate::types::{parse_db_id, DbId};

/// Column count of the subject editor export.
pub const SUBJECT_GRID_COLUMNS: usize = 15;

/// Column counts accepted from the study editor (with and without the
/// optional extra column before the site).
pub const STUDY_GRID_COLUMNS: [usize; 2] = [16, 15];

// ---------------------------------------------------------------------------
// Parse results
// ---------------------------------------------------------------------------

/// Rows accepted from a grid plus the notices raised while reading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridParse<T> {
    pub rows: Vec<T>,
    pub notices: Vec<String>,
}

impl<T> Default for GridParse<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            notices: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subject grid
// ---------------------------------------------------------------------------

/// One row of the subject editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectGridRow {
    pub subject_id: DbId,
    pub uid: String,
    pub primary_altuid: String,
    pub altuids: String,
    pub guid: String,
    pub birthdate: String,
    pub sex: String,
    pub ethnicity1: String,
    pub ethnicity2: String,
    pub education: String,
    pub handedness: String,
    pub marital_status: String,
    pub smoking_status: String,
    pub enroll_group: String,
}

impl SubjectGridRow {
    /// Columns to write for this subject.
    ///
    /// Only values that are present and valid produce an update; anything
    /// else keeps the stored value.
    pub fn updates(&self) -> SubjectUpdates {
        SubjectUpdates {
            guid: non_empty(&self.guid),
            birthdate: parse_birthdate(&self.birthdate),
            sex: Sex::from_grid_code(&self.sex).map(|s| s.code().to_string()),
            ethnicity1: canonical::<Ethnicity1>(&self.ethnicity1),
            ethnicity2: canonical::<Ethnicity2>(&self.ethnicity2),
            education: canonical::<Education>(&self.education),
            handedness: canonical::<Handedness>(&self.handedness),
            marital_status: canonical::<MaritalStatus>(&self.marital_status),
            smoking_status: normalize_smoking_status(&self.smoking_status),
        }
    }
}

/// Parse the subject editor's CSV export.
pub fn parse_subject_grid(text: &str) -> GridParse<SubjectGridRow> {
    let mut out = GridParse::default();

    for fields in data_rows(text) {
        if fields.len() != SUBJECT_GRID_COLUMNS {
            continue;
        }
        let Some(subject_id) = parse_db_id(&fields[0]) else {
            out.notices
                .push(format!("SubjectID [{}] is not an integer", fields[0]));
            continue;
        };
        out.rows.push(SubjectGridRow {
            subject_id,
            uid: fields[1].clone(),
            primary_altuid: fields[2].clone(),
            altuids: fields[3].clone(),
            guid: fields[4].clone(),
            birthdate: fields[5].clone(),
            sex: fields[6].to_uppercase(),
            ethnicity1: fields[7].clone(),
            ethnicity2: fields[8].clone(),
            education: fields[9].clone(),
            handedness: fields[10].clone(),
            marital_status: fields[11].clone(),
            smoking_status: fields[12].to_lowercase(),
            enroll_group: fields[13].clone(),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Study grid
// ---------------------------------------------------------------------------

/// Visit-level values written to the study when the age is numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyVisitUpdate {
    pub age_at_scan: f64,
    pub visit: String,
    pub site: String,
}

/// One row of the study editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyGridRow {
    pub study_id: DbId,
    pub subject_id: DbId,
    pub uid: String,
    /// Sex code, present only when it is one of `F M O U`.
    pub sex: Option<String>,
    pub altuids: String,
    /// `None` when the age-at-scan cell is not a number.
    pub visit_update: Option<StudyVisitUpdate>,
}

/// Parse the study editor's CSV export.
pub fn parse_study_grid(text: &str) -> GridParse<StudyGridRow> {
    let mut out = GridParse::default();

    for fields in data_rows(text) {
        let site_col = match fields.len() {
            16 => 14,
            15 => 13,
            _ => continue,
        };
        let Some(study_id) = parse_db_id(&fields[0]) else {
            out.notices
                .push(format!("StudyID [{}] is not an integer", fields[0]));
            continue;
        };
        let Some(subject_id) = parse_db_id(&fields[1]) else {
            out.notices
                .push(format!("SubjectID [{}] is not an integer", fields[1]));
            continue;
        };

        let visit_update = match parse_number(&fields[9]) {
            Some(age_at_scan) => Some(StudyVisitUpdate {
                age_at_scan,
                visit: fields[6].clone(),
                site: fields[site_col].clone(),
            }),
            None => {
                out.notices
                    .push(format!("Age-at-scan [{}] is not a number", fields[9]));
                None
            }
        };

        out.rows.push(StudyGridRow {
            study_id,
            subject_id,
            uid: fields[2].clone(),
            sex: Sex::from_study_grid_code(&fields[3]).map(|s| s.code().to_string()),
            altuids: fields[4].clone(),
            visit_update,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split grid text into trimmed fields, dropping the header and blank lines.
fn data_rows(text: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    text.split('\n')
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            parse_csv_line(line.trim_end_matches('\r'))
                .into_iter()
                .map(|f| f.trim().to_string())
                .collect()
        })
}

/// Parse a single CSV line, honouring double-quoted fields.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => result.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
    }
    result.push(current);
    result
}

/// Numeric cells: plain decimal or exponent notation, finite only.
fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn canonical<T: CodeTable>(value: &str) -> Option<String> {
    T::parse_lenient(value).map(|m| m.code().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT_HEADER: &str = "SubjectID,UID,PrimaryID,AltUIDs,GUID,DOB,Sex,Eth1,Eth2,Edu,Hand,Marital,Smoking,Group,Extra";

    #[test]
    fn csv_quotes_and_commas() {
        assert_eq!(
            parse_csv_line(r#"1,"a, b","say ""hi""",,x"#),
            vec!["1", "a, b", r#"say "hi""#, "", "x"]
        );
    }

    #[test]
    fn subject_grid_maps_columns() {
        let text = format!(
            "{SUBJECT_HEADER}\n42,S1234ABC,P1,\"*P1, P2\",G-1,1990-05-01,f,Not Hispanic,black,3,right,civil union,Never,grpA,\n"
        );
        let parsed = parse_subject_grid(&text);
        assert!(parsed.notices.is_empty());
        assert_eq!(parsed.rows.len(), 1);

        let row = &parsed.rows[0];
        assert_eq!(row.subject_id, 42);
        assert_eq!(row.altuids, "*P1, P2");
        assert_eq!(row.sex, "F");
        assert_eq!(row.enroll_group, "grpA");

        let updates = row.updates();
        assert_eq!(updates.guid.as_deref(), Some("G-1"));
        assert_eq!(updates.birthdate, chrono::NaiveDate::from_ymd_opt(1990, 5, 1));
        assert_eq!(updates.sex.as_deref(), Some("F"));
        assert_eq!(updates.ethnicity1.as_deref(), Some("nothispanic"));
        assert_eq!(updates.ethnicity2.as_deref(), Some("black"));
        assert_eq!(updates.education.as_deref(), Some("3"));
        assert_eq!(updates.handedness.as_deref(), Some("R"));
        assert_eq!(updates.marital_status.as_deref(), Some("civilunion"));
        assert_eq!(updates.smoking_status.as_deref(), Some("never"));
    }

    #[test]
    fn subject_grid_skips_bad_rows() {
        let text = format!(
            "{SUBJECT_HEADER}\n\
             x1,S1,,,,,,,,,,,,,\n\
             1,S1,,,too,few\n\
             \n\
             7,S7,,,,,,,,,,,,,\n"
        );
        let parsed = parse_subject_grid(&text);
        assert_eq!(parsed.notices, vec!["SubjectID [x1] is not an integer"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].subject_id, 7);
        assert!(parsed.rows[0].updates().is_empty());
    }

    #[test]
    fn subject_grid_ignores_invalid_values() {
        let text = format!("{SUBJECT_HEADER}\n3,S3,,,,notadate,Z,maybe,purple,9,X,engaged,,,\n");
        let parsed = parse_subject_grid(&text);
        assert!(parsed.rows[0].updates().is_empty());
    }

    #[test]
    fn header_only_is_empty() {
        let parsed = parse_subject_grid(SUBJECT_HEADER);
        assert!(parsed.rows.is_empty());
        assert!(parsed.notices.is_empty());
    }

    #[test]
    fn study_grid_sixteen_columns() {
        let text = "h\n10,20,S1234ABC,m,A1,x,visit1,x,x,34.5,x,x,x,x,SITE-A,x\n";
        let parsed = parse_study_grid(text);
        assert!(parsed.notices.is_empty());
        let row = &parsed.rows[0];
        assert_eq!((row.study_id, row.subject_id), (10, 20));
        assert_eq!(row.sex.as_deref(), Some("M"));
        assert_eq!(
            row.visit_update,
            Some(StudyVisitUpdate {
                age_at_scan: 34.5,
                visit: "visit1".into(),
                site: "SITE-A".into(),
            })
        );
    }

    #[test]
    fn study_grid_fifteen_columns_uses_earlier_site() {
        let text = "h\r\n10,20,S1,T,,x,v2,x,x,40,x,x,x,SITE-B,x\r\n";
        let parsed = parse_study_grid(text);
        let row = &parsed.rows[0];
        assert_eq!(row.sex, None);
        assert_eq!(row.visit_update.as_ref().map(|v| v.site.as_str()), Some("SITE-B"));
    }

    #[test]
    fn study_grid_non_numeric_age_keeps_row() {
        let text = "h\n10,20,S1,F,*A1,x,v,x,x,abc,x,x,x,x,s,x\n";
        let parsed = parse_study_grid(text);
        assert_eq!(parsed.notices, vec!["Age-at-scan [abc] is not a number"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].visit_update, None);
        assert_eq!(parsed.rows[0].sex.as_deref(), Some("F"));
    }

    #[test]
    fn study_grid_rejects_bad_ids() {
        let text = "h\n1a,20,S1,F,,x,v,x,x,1,x,x,x,x,s,x\n10,2b,S1,F,,x,v,x,x,1,x,x,x,x,s,x\n";
        let parsed = parse_study_grid(text);
        assert!(parsed.rows.is_empty());
        assert_eq!(
            parsed.notices,
            vec![
                "StudyID [1a] is not an integer",
                "SubjectID [2b] is not an integer"
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number(" 12 "), Some(12.0));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }
}
