//! Client side of the service: typed API calls plus the cached session the
//! UI renders from.

pub mod api;
pub mod session;
pub mod sync;
pub mod validation;

pub use api::{ApiClient, ClientError};
pub use session::{Backing, SessionData, SessionStore};
pub use sync::{SaveOutcome, Session};
pub use validation::{validate_profile_form, FieldError, ProfileForm};
