//! Per-modality series tables.
//!
//! Series live in one table per modality (`mr_series`, `ct_series`, ...).
//! Table and key names are built from the study's modality string, so the
//! string is checked before it goes anywhere near SQL.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

const MODALITY_PATTERN: &str = r"^[a-z][a-z0-9]{0,15}$";

static MODALITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MODALITY_PATTERN).expect("valid regex"));

/// A modality name that is safe to splice into an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Modality(String);

impl Modality {
    /// Lower-case and validate a modality string.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let lowered = raw.trim().to_lowercase();
        if MODALITY_RE.is_match(&lowered) {
            Ok(Self(lowered))
        } else {
            Err(CoreError::InvalidInput(format!("Invalid modality [{raw}]")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `mr` -> `mr_series`.
    pub fn series_table(&self) -> String {
        format!("{}_series", self.0)
    }

    /// `mr` -> `mrseries_id`.
    pub fn series_id_column(&self) -> String {
        format!("{}series_id", self.0)
    }

    pub fn is_mr(&self) -> bool {
        self.0 == "mr"
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_names() {
        let m = Modality::parse(" MR ").unwrap();
        assert_eq!(m.series_table(), "mr_series");
        assert_eq!(m.series_id_column(), "mrseries_id");
        assert!(m.is_mr());
    }

    #[test]
    fn rejects_injection() {
        assert!(Modality::parse("mr; drop table subjects").is_err());
        assert!(Modality::parse("").is_err());
        assert!(Modality::parse("1mr").is_err());
        assert!(Modality::parse("abcdefghijklmnopq").is_err());
        assert!(Modality::parse("eeg").is_ok());
    }
}
