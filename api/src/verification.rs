//! Simulated face-recognition check.
//!
//! Stands in for a real biometric service; only the contract matters to
//! the rest of the system. The simulated call sleeps for a configurable
//! delay and reports a random confidence in [0.92, 0.99].

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use util::config;

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub success: bool,
    pub confidence: f64,
    pub matched_id: String,
    pub liveness_check: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("face verification failed")]
    Rejected,
    #[error("face verification timed out")]
    Timeout,
}

async fn simulate_face_recognition(student_id: &str) -> VerificationResult {
    tokio::time::sleep(Duration::from_millis(config::verification_delay_ms())).await;

    let confidence = (rand::thread_rng().gen_range(0.92_f64..=0.99) * 100.0).round() / 100.0;
    VerificationResult {
        success: true,
        confidence,
        matched_id: student_id.to_string(),
        liveness_check: true,
    }
}

/// Run the simulated check under the configured timeout. A timeout and a
/// rejection are equivalent to the caller; neither is retried.
pub async fn verify(student_id: &str) -> Result<VerificationResult, VerificationError> {
    let bound = Duration::from_millis(config::verification_timeout_ms());
    let result = tokio::time::timeout(bound, simulate_face_recognition(student_id))
        .await
        .map_err(|_| VerificationError::Timeout)?;

    if !result.success {
        return Err(VerificationError::Rejected);
    }
    Ok(result)
}
