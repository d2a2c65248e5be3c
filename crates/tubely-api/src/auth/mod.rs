pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtService, TOKEN_ISSUER};
pub use middleware::{auth_middleware, AuthState};
pub use models::{JwtClaims, UserContext};
