//! Demographic code tables.
//!
//! Subjects store short codes (`F`, `hispanic`, `3`, ...). The editing grid
//! and forms may submit either the code or its human-readable label, in any
//! case. Each table parses leniently and falls back to "leave unchanged"
//! (`None`) when the input is not recognised.

use serde::{Deserialize, Serialize};

/// Shown in listings for an empty stored value.
pub const EMPTY_DISPLAY: &str = "-";

/// Shared behaviour of every demographic code table.
pub trait CodeTable: Sized + Copy + 'static {
    /// All members in display order.
    const ALL: &'static [Self];

    /// Code stored in the database.
    fn code(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;

    /// Extra spellings accepted on input besides code and label.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Parse user input (code, label or alias), case-insensitively.
    fn parse_lenient(input: &str) -> Option<Self> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|member| {
            member.code().to_lowercase() == needle
                || member.label().to_lowercase() == needle
                || member.aliases().iter().any(|a| *a == needle)
        })
    }

    /// Look up a stored code exactly.
    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }
}

/// Render a stored code for listings: `-` when empty, the label when the
/// code is known, otherwise the raw stored value.
pub fn display_label<T: CodeTable>(stored: &str) -> String {
    if stored.is_empty() {
        return EMPTY_DISPLAY.to_string();
    }
    T::from_code(stored)
        .map(|m| m.label().to_string())
        .unwrap_or_else(|| stored.to_string())
}

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "O")]
    Other,
    #[serde(rename = "U")]
    Unknown,
    #[serde(rename = "T")]
    Transgender,
}

impl CodeTable for Sex {
    const ALL: &'static [Self] = &[
        Self::Female,
        Self::Male,
        Self::Other,
        Self::Unknown,
        Self::Transgender,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::Female => "F",
            Self::Male => "M",
            Self::Other => "O",
            Self::Unknown => "U",
            Self::Transgender => "T",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
            Self::Transgender => "Transgender",
        }
    }
}

impl Sex {
    /// The subject grid accepts only the single-letter codes.
    pub fn from_grid_code(input: &str) -> Option<Self> {
        Self::from_code(&input.trim().to_uppercase())
    }

    /// The study grid accepts only `F`, `M`, `O` and `U`.
    pub fn from_study_grid_code(input: &str) -> Option<Self> {
        Self::from_grid_code(input).filter(|s| *s != Self::Transgender)
    }
}

// ---------------------------------------------------------------------------
// Ethnicity
// ---------------------------------------------------------------------------

/// Hispanic/Latino origin (`ethnicity1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ethnicity1 {
    Hispanic,
    NotHispanic,
}

impl CodeTable for Ethnicity1 {
    const ALL: &'static [Self] = &[Self::Hispanic, Self::NotHispanic];

    fn code(self) -> &'static str {
        match self {
            Self::Hispanic => "hispanic",
            Self::NotHispanic => "nothispanic",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Hispanic => "Hispanic/Latino",
            Self::NotHispanic => "Not hispanic/Latino",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Hispanic => &[],
            Self::NotHispanic => &["not hispanic"],
        }
    }
}

/// Race (`ethnicity2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ethnicity2 {
    Indian,
    Asian,
    Black,
    Islander,
    White,
}

impl CodeTable for Ethnicity2 {
    const ALL: &'static [Self] = &[
        Self::Indian,
        Self::Asian,
        Self::Black,
        Self::Islander,
        Self::White,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::Indian => "indian",
            Self::Asian => "asian",
            Self::Black => "black",
            Self::Islander => "islander",
            Self::White => "white",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Indian => "American Indian/Alaska Native",
            Self::Asian => "Asian",
            Self::Black => "Black/African American",
            Self::Islander => "Hawaiian/Pacific Islander",
            Self::White => "White",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Indian => &["american indian/alaskan native"],
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Education
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Education {
    Unknown,
    GradeSchool,
    MiddleSchool,
    HighSchool,
    TradeSchool,
    Associates,
    Bachelors,
    Masters,
    Doctoral,
}

impl CodeTable for Education {
    const ALL: &'static [Self] = &[
        Self::Unknown,
        Self::GradeSchool,
        Self::MiddleSchool,
        Self::HighSchool,
        Self::TradeSchool,
        Self::Associates,
        Self::Bachelors,
        Self::Masters,
        Self::Doctoral,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::Unknown => "0",
            Self::GradeSchool => "1",
            Self::MiddleSchool => "2",
            Self::HighSchool => "3",
            Self::TradeSchool => "4",
            Self::Associates => "5",
            Self::Bachelors => "6",
            Self::Masters => "7",
            Self::Doctoral => "8",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::GradeSchool => "Grade School",
            Self::MiddleSchool => "Middle School",
            Self::HighSchool => "High School/GED",
            Self::TradeSchool => "Trade School",
            Self::Associates => "Associates Degree",
            Self::Bachelors => "Bachelors Degree",
            Self::Masters => "Masters Degree",
            Self::Doctoral => "Doctoral Degree",
        }
    }
}

// ---------------------------------------------------------------------------
// Handedness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "A")]
    Ambidextrous,
    #[serde(rename = "U")]
    Unknown,
}

impl CodeTable for Handedness {
    const ALL: &'static [Self] = &[Self::Right, Self::Left, Self::Ambidextrous, Self::Unknown];

    fn code(self) -> &'static str {
        match self {
            Self::Right => "R",
            Self::Left => "L",
            Self::Ambidextrous => "A",
            Self::Unknown => "U",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Right => "Right",
            Self::Left => "Left",
            Self::Ambidextrous => "Ambidextrous",
            Self::Unknown => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Marital status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Unknown,
    Single,
    Married,
    Divorced,
    Separated,
    CivilUnion,
    Cohabitating,
    Widowed,
}

impl CodeTable for MaritalStatus {
    const ALL: &'static [Self] = &[
        Self::Unknown,
        Self::Single,
        Self::Married,
        Self::Divorced,
        Self::Separated,
        Self::CivilUnion,
        Self::Cohabitating,
        Self::Widowed,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Single => "single",
            Self::Married => "married",
            Self::Divorced => "divorced",
            Self::Separated => "separated",
            Self::CivilUnion => "civilunion",
            Self::Cohabitating => "cohabitating",
            Self::Widowed => "widowed",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Single => "Single",
            Self::Married => "Married",
            Self::Divorced => "Divorced",
            Self::Separated => "Separated",
            Self::CivilUnion => "Civil union",
            Self::Cohabitating => "Cohabitating",
            Self::Widowed => "Widowed",
        }
    }
}

// ---------------------------------------------------------------------------
// Column updates
// ---------------------------------------------------------------------------

/// Demographic columns to write for one subject.
///
/// `None` leaves the stored column unchanged. Values are the stored codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectUpdates {
    pub guid: Option<String>,
    pub birthdate: Option<chrono::NaiveDate>,
    pub sex: Option<String>,
    pub ethnicity1: Option<String>,
    pub ethnicity2: Option<String>,
    pub education: Option<String>,
    pub handedness: Option<String>,
    pub marital_status: Option<String>,
    pub smoking_status: Option<String>,
}

impl SubjectUpdates {
    /// `true` when no column would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse a birth date in the formats the editors produce.
pub fn parse_birthdate(input: &str) -> Option<chrono::NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y-%m-%d %H:%M:%S"];
    let input = input.trim();
    FORMATS.iter().find_map(|fmt| {
        chrono::NaiveDate::parse_from_str(input, fmt)
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(input, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

/// Smoking status is free text; only normalised to lower case.
///
/// Returns `None` for blank input, which leaves the stored value alone.
pub fn normalize_smoking_status(input: &str) -> Option<String> {
    let value = input.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}
