//! HTTP handlers.
//!
//! [`projects`] owns the request parameters and the action dispatcher; the
//! other modules hold one area of the page each (mutations plus the views
//! they end on).

pub mod fileio;
pub mod mr_params;
pub mod project_info;
pub mod project_list;
pub mod projects;
pub mod series_lists;
pub mod series_names;
pub mod studies;
pub mod subjects;
