pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Generates a JWT and its expiry timestamp (RFC 3339) for a given user.
pub fn generate_jwt(user_id: &str) -> (String, String) {
    let jwt_secret = config::jwt_secret();
    let duration_minutes = config::jwt_duration_minutes() as i64;

    let expiry = Utc::now() + Duration::minutes(duration_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}
