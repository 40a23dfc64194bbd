pub mod ledger;
pub mod repository;
pub mod submission;

pub use ledger::ReviewLedger;
pub use submission::{RatingInput, ReviewSubmission};
