pub mod cache;
pub mod errors;
pub mod library;
pub mod load;
pub mod source;

pub use cache::{DescriptorCache, Fetched};
pub use errors::{DescriptorError, LibraryError, LoadError};
pub use library::{LibraryEntry, candidate_models, models_for, scan_library, side_marker};
pub use load::{load_descriptor, save_descriptor, validate_descriptor};
pub use source::{DescriptorSource, DirectorySource, InMemorySource};
