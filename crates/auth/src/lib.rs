pub mod email;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod service;

// Re-export key items for convenience
pub use email::{LogMailer, MailDispatch};
pub use jwt::{Claims, JwtService};
pub use password::{hash_password, verify_password};
pub use reset::ResetTokens;
pub use service::{AuthService, AuthServiceTrait};
