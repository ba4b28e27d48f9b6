pub mod action;
pub mod altuid;
pub mod audit;
pub mod demographics;
pub mod demographics_form;
pub mod error;
pub mod fileio;
pub mod grid;
pub mod modality;
pub mod mr_qa;
pub mod series_list;
pub mod series_summary;
pub mod stats;
pub mod study_ref;
pub mod types;
