pub mod classifier;
pub mod enrollment;
pub mod exporter;
pub mod report_writer;

pub use classifier::{classify, Classification};
pub use enrollment::{enroll_references, EnrollmentReport};
pub use exporter::{ExportReport, FolderExporter};
pub use report_writer::ReportWriter;
