//! The subject demographics form.
//!
//! The form posts one array per column; element `i` of every array belongs
//! to the same subject. Unlike the grid editor, every listed column is
//! written: a blank birth date clears the stored one, and the alternate ID
//! list replaces the stored one even when empty. A birth date that does not
//! parse rejects that subject's row with a notice.

use chrono::NaiveDate;
use serde::Serialize;

use crate::demographics::{
    parse_birthdate, CodeTable, Education, Ethnicity1, Ethnicity2, MaritalStatus, Sex,
    SubjectUpdates,
};
use crate::error::CoreError;
use crate::grid::GridParse;
use crate::types::{parse_db_id, DbId};

/// The eleven parallel arrays of the demographics form.
#[derive(Debug, Clone, Default)]
pub struct DemographicsForm {
    pub subject_ids: Vec<String>,
    pub altuids: Vec<String>,
    pub guids: Vec<String>,
    pub birthdates: Vec<String>,
    pub sexes: Vec<String>,
    pub ethnicity1s: Vec<String>,
    pub ethnicity2s: Vec<String>,
    pub educations: Vec<String>,
    pub marital_statuses: Vec<String>,
    pub smoking_statuses: Vec<String>,
    pub enroll_groups: Vec<String>,
}

/// One subject's worth of form values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicsRow {
    pub subject_id: DbId,
    pub altuids: String,
    /// Written as-is; `None` clears the column.
    pub birthdate: Option<NaiveDate>,
    /// Every other column. `updates.birthdate` is always `None`.
    pub updates: SubjectUpdates,
    pub enroll_group: String,
}

impl DemographicsForm {
    /// Zip the arrays into rows.
    ///
    /// Fails when any array length differs from the others. Elements whose
    /// subject ID is not all digits are skipped.
    pub fn rows(&self) -> Result<GridParse<DemographicsRow>, CoreError> {
        let n = self.subject_ids.len();
        let lengths = [
            self.altuids.len(),
            self.guids.len(),
            self.birthdates.len(),
            self.sexes.len(),
            self.ethnicity1s.len(),
            self.ethnicity2s.len(),
            self.educations.len(),
            self.marital_statuses.len(),
            self.smoking_statuses.len(),
            self.enroll_groups.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(CoreError::ItemCountMismatch);
        }

        let mut out = GridParse::default();
        for i in 0..n {
            let Some(subject_id) = parse_db_id(self.subject_ids[i].trim()) else {
                continue;
            };

            let raw_birthdate = self.birthdates[i].trim();
            let birthdate = if raw_birthdate.is_empty() {
                None
            } else if let Some(date) = parse_birthdate(raw_birthdate) {
                Some(date)
            } else {
                out.notices.push(format!(
                    "Birthdate [{raw_birthdate}] for SubjectID [{subject_id}] is not a valid date"
                ));
                continue;
            };

            out.rows.push(DemographicsRow {
                subject_id,
                altuids: self.altuids[i].clone(),
                birthdate,
                updates: SubjectUpdates {
                    guid: Some(self.guids[i].trim().to_string()),
                    birthdate: None,
                    sex: Some(code_or_raw::<Sex>(&self.sexes[i])),
                    ethnicity1: Some(code_or_raw::<Ethnicity1>(&self.ethnicity1s[i])),
                    ethnicity2: Some(code_or_raw::<Ethnicity2>(&self.ethnicity2s[i])),
                    education: Some(code_or_raw::<Education>(&self.educations[i])),
                    handedness: None,
                    marital_status: Some(code_or_raw::<MaritalStatus>(&self.marital_statuses[i])),
                    smoking_status: Some(self.smoking_statuses[i].trim().to_lowercase()),
                },
                enroll_group: self.enroll_groups[i].trim().to_string(),
            });
        }
        Ok(out)
    }
}

/// The canonical code when recognised, else the submitted text as-is.
fn code_or_raw<T: CodeTable>(value: &str) -> String {
    T::parse_lenient(value)
        .map(|m| m.code().to_string())
        .unwrap_or_else(|| value.trim().to_string())
}
