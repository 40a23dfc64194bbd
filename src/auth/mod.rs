pub mod credentials;
pub mod password;
pub mod token;

pub use credentials::{CredentialStore, Login, LoginRequest, RegisterRequest, Registration};
pub use token::{Claims, TokenIssuer};
