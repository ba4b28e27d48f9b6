//! Study references of the form `{UID}{study number}`, e.g. `S1234ABC5`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

/// Subject UIDs are always eight characters.
pub const UID_LEN: usize = 8;

const STUDY_REF_PATTERN: &str = r"^([A-Za-z0-9]{8})([0-9]+)$";

static STUDY_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STUDY_REF_PATTERN).expect("valid regex"));

/// A subject UID plus a study number within that subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StudyRef {
    pub uid: String,
    pub study_num: i32,
}

impl StudyRef {
    /// Split `S1234ABC5` into UID `S1234ABC` and study number `5`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();
        let invalid = || CoreError::InvalidInput(format!("Invalid study ID [{input}]"));

        let caps = STUDY_REF_RE.captures(input).ok_or_else(invalid)?;
        let study_num: i32 = caps[2].parse().map_err(|_| invalid())?;
        if study_num < 1 {
            return Err(invalid());
        }
        Ok(Self {
            uid: caps[1].to_string(),
            study_num,
        })
    }
}

impl fmt::Display for StudyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.uid, self.study_num)
    }
}
