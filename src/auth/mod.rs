//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permission;

pub use jwt::{Claims, ClaimsPayload, TokenCodec, TokenKind, TokenPair};
pub use middleware::{extract_token, jwt_auth_middleware, require_access, Authenticator};
pub use password::PasswordHasher;
pub use permission::{evaluate, AccessGuard, Action, Decision, DenyReason};
