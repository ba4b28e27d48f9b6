//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod altuid_repo;
pub mod enrollment_repo;
pub mod fileio_repo;
pub mod instance_repo;
pub mod measure_repo;
pub mod project_repo;
pub mod qa_repo;
pub mod rdoc_repo;
pub mod scan_param_repo;
pub mod series_repo;
pub mod study_repo;
pub mod subject_repo;
pub mod tag_repo;
pub mod user_repo;

pub use altuid_repo::AltUidRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use fileio_repo::FileIoRepo;
pub use instance_repo::InstanceRepo;
pub use measure_repo::MeasureRepo;
pub use project_repo::ProjectRepo;
pub use qa_repo::QaRepo;
pub use rdoc_repo::RdocRepo;
pub use scan_param_repo::ScanParamRepo;
pub use series_repo::SeriesRepo;
pub use study_repo::StudyRepo;
pub use subject_repo::SubjectRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
