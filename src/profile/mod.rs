pub mod age;
pub mod patch;
pub mod reconciler;

pub use patch::{Patch, ProfileUpdate};
pub use reconciler::{ProfileDiff, ProfileReconciler, UpdateOutcome};
