//! AI-powered attendance insights via the OpenRouter chat-completions API.
//!
//! Degrades to a fixed fallback string on any failure; callers never see
//! an error from this module.

use serde::Serialize;
use util::config;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const MODEL: &str = "deepseek/deepseek-chat-v3.1:free";

pub const FALLBACK_NO_KEY: &str = "AI insights unavailable - API key not configured";
pub const FALLBACK_UNAVAILABLE: &str = "AI insights temporarily unavailable";

/// Per-session attendance summary fed into the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStat {
    pub session_id: String,
    pub course_code: String,
    pub attendance_count: u64,
    pub attendance_rate: f64,
}

/// Summarize `stats` through the LLM. Missing key or any HTTP/parse
/// failure yields a fallback string instead of an error.
pub async fn attendance_insights(stats: &[SessionStat]) -> String {
    let api_key = config::openrouter_api_key();
    if api_key.is_empty() {
        return FALLBACK_NO_KEY.to_string();
    }

    let total_sessions = stats.len();
    let avg_rate = if total_sessions > 0 {
        stats.iter().map(|s| s.attendance_rate).sum::<f64>() / total_sessions as f64
    } else {
        0.0
    };

    let prompt = format!(
        "Analyze this attendance data and provide brief insights:\n\
         Total Sessions: {total_sessions}\n\
         Average Attendance Rate: {avg_rate:.1}%\n\n\
         Provide 3-4 bullet points with actionable insights about attendance \
         patterns and recommendations."
    );

    let body = serde_json::json!({
        "model": MODEL,
        "messages": [{ "role": "user", "content": prompt }],
    });

    let client = reqwest::Client::new();
    let response = match client
        .post(OPENROUTER_URL)
        .bearer_auth(&api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(error = %e, "AI insights request failed");
            return FALLBACK_UNAVAILABLE.to_string();
        }
    };

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "AI insights non-success response");
        return FALLBACK_UNAVAILABLE.to_string();
    }

    match response.json::<serde_json::Value>().await {
        Ok(data) => data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_UNAVAILABLE.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "AI insights response parse failed");
            FALLBACK_UNAVAILABLE.to_string()
        }
    }
}
