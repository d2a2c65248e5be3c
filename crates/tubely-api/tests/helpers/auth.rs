use chrono::Duration;
use tubely_api::auth::JwtService;
use uuid::Uuid;

/// Must match the secret the test router is built with.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

pub fn bearer_for(user_id: Uuid) -> String {
    let token = JwtService::new(TEST_JWT_SECRET)
        .issue_token(user_id, Duration::hours(1))
        .expect("issue token");
    format!("Bearer {}", token)
}
