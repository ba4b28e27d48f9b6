//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct per row shape
//! a query returns, plus `Deserialize` create DTOs where rows are inserted.

pub mod fileio;
pub mod measure;
pub mod project;
pub mod rdoc;
pub mod scan_param;
pub mod series;
pub mod study;
pub mod subject;
