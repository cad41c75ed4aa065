pub mod enums;
pub mod error;
pub mod filing;
pub mod organization;

// Re-export the core types to provide a clean public API.
pub use enums::FilingField;
pub use error::CoreError;
pub use filing::FilingRecord;
pub use organization::{Organization, OrganizationSummary, SearchResults};
