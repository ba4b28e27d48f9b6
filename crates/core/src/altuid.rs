//! Alternate subject identifiers.
//!
//! Editors submit alternate IDs as one comma-separated cell. An ID marked
//! with `*` anywhere in the token is the subject's primary alternate ID.

use serde::Serialize;

/// One alternate ID as stored in `subject_altuid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltUid {
    pub altuid: String,
    pub is_primary: bool,
}

/// Parse a comma-separated alternate ID list.
///
/// Tokens are trimmed; `*` marks a primary ID and is removed from the
/// stored value. Tokens that end up empty are dropped.
pub fn parse_altuid_list(input: &str) -> Vec<AltUid> {
    input
        .split(',')
        .filter_map(|token| {
            let token = token.trim();
            let is_primary = token.contains('*');
            let altuid = token.replace('*', "").trim().to_string();
            (!altuid.is_empty()).then_some(AltUid { altuid, is_primary })
        })
        .collect()
}

/// `true` when a grid cell carries no alternate IDs.
///
/// An empty cell or a lone `*` (the marker the listing shows for a subject
/// with no IDs) leaves the stored IDs untouched.
pub fn is_blank_list(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.is_empty() || trimmed == "*"
}

/// Render IDs for listings: primary IDs first, each prefixed with `*`.
pub fn format_altuids(altuids: &[AltUid]) -> String {
    let primary = altuids
        .iter()
        .filter(|a| a.is_primary)
        .map(|a| format!("*{}", a.altuid));
    let others = altuids
        .iter()
        .filter(|a| !a.is_primary)
        .map(|a| a.altuid.clone());
    primary.chain(others).collect::<Vec<_>>().join(", ")
}

/// Render IDs for the tab-separated series export: stored order, plain
/// comma join, no primary marker.
pub fn export_altuids(altuids: &[AltUid]) -> String {
    altuids
        .iter()
        .map(|a| a.altuid.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// The ID shown in the "primary alternate ID" column.
///
/// This is the first entry of [`format_altuids`] without its marker, or
/// `None` if the subject has no alternate IDs.
pub fn primary_altuid(altuids: &[AltUid]) -> Option<String> {
    altuids
        .iter()
        .find(|a| a.is_primary)
        .or_else(|| altuids.first())
        .map(|a| a.altuid.clone())
}
