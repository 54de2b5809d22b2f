// Public API - what other modules can use
pub use generators::{CodeGenerator, FixedCodeGenerator, RandomCodeGenerator};
pub use handlers::{request_code, verify_code};
pub use middleware::jwt_auth;
pub use service::AuthService;
pub use token::TokenConfig;
pub use types::{AuthResponse, SessionClaims};
pub use verifier::{IdentityCredential, InMemoryPhoneVerifier, PendingVerification, PhoneVerifier};

// Internal modules
mod generators;
mod handlers;
mod middleware;
mod service;
mod token;
pub mod types;
mod verifier;
