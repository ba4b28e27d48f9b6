//! Project statistics shown on the project info page.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Days per year used for age calculation.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Summary statistics over a set of ages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AgeStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation; 0 with fewer than two values.
    pub stdev: f64,
}

impl AgeStats {
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self::default();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n as f64;
        let stdev = if n < 2 {
            0.0
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };
        Self {
            n,
            min,
            max,
            mean,
            stdev,
        }
    }
}

/// Age of the subject at a study.
///
/// A stored age greater than zero wins; otherwise the age is computed from
/// the birth date and study date. `None` when neither is available.
pub fn age_at_study(
    stored_age: Option<f64>,
    birthdate: Option<NaiveDate>,
    study_datetime: Option<NaiveDateTime>,
) -> Option<f64> {
    if let Some(age) = stored_age.filter(|a| *a > 0.0) {
        return Some(age);
    }
    let days = (study_datetime?.date() - birthdate?).num_days();
    Some(days as f64 / DAYS_PER_YEAR)
}

/// Study fields the statistics are computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyStatsInput {
    pub uid: String,
    pub sex: String,
    pub study_datetime: Option<NaiveDateTime>,
    pub stored_age: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub site_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SexStats {
    pub sex: String,
    /// Number of studies of subjects with this sex.
    pub studies: usize,
    pub ages: AgeStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectStats {
    pub num_studies: usize,
    pub num_subjects: usize,
    pub ages: AgeStats,
    pub by_sex: Vec<SexStats>,
    pub first_study: Option<NaiveDateTime>,
    pub last_study: Option<NaiveDateTime>,
    pub site_ids: Vec<i64>,
}

impl ProjectStats {
    pub fn compute(studies: &[StudyStatsInput]) -> Self {
        let mut ages = Vec::new();
        let mut by_sex: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
        let mut uids = BTreeSet::new();
        let mut sites = BTreeSet::new();

        for s in studies {
            uids.insert(s.uid.as_str());
            if let Some(site) = s.site_id {
                sites.insert(site);
            }
            let entry = by_sex.entry(s.sex.as_str()).or_default();
            entry.0 += 1;
            if let Some(age) = age_at_study(s.stored_age, s.birthdate, s.study_datetime) {
                ages.push(age);
                entry.1.push(age);
            }
        }

        let dates = studies.iter().filter_map(|s| s.study_datetime);
        Self {
            num_studies: studies.len(),
            num_subjects: uids.len(),
            ages: AgeStats::from_values(&ages),
            by_sex: by_sex
                .into_iter()
                .map(|(sex, (count, ages))| SexStats {
                    sex: sex.to_string(),
                    studies: count,
                    ages: AgeStats::from_values(&ages),
                })
                .collect(),
            first_study: dates.clone().min(),
            last_study: dates.max(),
            site_ids: sites.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn sample_stdev() {
        let s = AgeStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.n, 8);
        assert_eq!((s.min, s.max, s.mean), (2.0, 9.0, 5.0));
        assert!((s.stdev - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(AgeStats::from_values(&[]), AgeStats::default());
        let one = AgeStats::from_values(&[30.0]);
        assert_eq!((one.n, one.mean, one.stdev), (1, 30.0, 0.0));
    }

    #[test]
    fn stored_age_wins_when_positive() {
        let bd = NaiveDate::from_ymd_opt(2000, 1, 1);
        assert_eq!(age_at_study(Some(21.5), bd, Some(dt(2010, 1, 1))), Some(21.5));
        let computed = age_at_study(Some(0.0), bd, Some(dt(2010, 1, 1))).unwrap();
        assert!((computed - 3653.0 / DAYS_PER_YEAR).abs() < 1e-9);
        assert_eq!(age_at_study(None, None, Some(dt(2010, 1, 1))), None);
    }

    #[test]
    fn project_stats() {
        let study = |uid: &str, sex: &str, age: f64, date: NaiveDateTime, site: i64| StudyStatsInput {
            uid: uid.into(),
            sex: sex.into(),
            study_datetime: Some(date),
            stored_age: Some(age),
            birthdate: None,
            site_id: Some(site),
        };
        let stats = ProjectStats::compute(&[
            study("S1", "F", 20.0, dt(2019, 5, 1), 2),
            study("S1", "F", 22.0, dt(2021, 5, 1), 2),
            study("S2", "M", 30.0, dt(2018, 1, 1), 1),
        ]);
        assert_eq!(stats.num_studies, 3);
        assert_eq!(stats.num_subjects, 2);
        assert_eq!(stats.ages.mean, 24.0);
        assert_eq!(stats.by_sex[0].sex, "F");
        assert_eq!(stats.by_sex[0].studies, 2);
        assert_eq!(stats.by_sex[0].ages.mean, 21.0);
        assert_eq!(stats.first_study, Some(dt(2018, 1, 1)));
        assert_eq!(stats.last_study, Some(dt(2021, 5, 1)));
        assert_eq!(stats.site_ids, vec![1, 2]);
    }
}
