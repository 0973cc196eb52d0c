//! Offline classifiers for job titles and locations.

pub mod region;
pub mod title;

pub use region::region_from_location;
pub use title::{categorize, TitleClassifier};
