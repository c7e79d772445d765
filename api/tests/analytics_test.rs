mod helpers;

use axum::http::StatusCode;
use chrono::Utc;
use helpers::app::{get, make_test_app, post_json, seed_user};
use serde_json::json;
use serial_test::serial;

use db::models::user::Role;
use util::config::AppConfig;

fn fast_verification() {
    AppConfig::set_verification_delay_ms(0);
    AppConfig::set_verification_timeout_ms(5_000);
}

#[tokio::test]
#[serial]
async fn student_overview_reports_rate_and_recent_marks() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token) = seed_user(
        &state,
        "prof@example.com",
        "Prof",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;
    let (_student, token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    // Two sessions in the student's department; they attend one, then
    // both get ended so they count towards the denominator.
    let mut session_ids = Vec::new();
    for (name, code) in [("Calculus I", "MATH101"), ("Calculus II", "MATH102")] {
        let (_, body) = post_json(
            &app,
            "/api/sessions",
            &prof_token,
            json!({ "course_name": name, "course_code": code, "department": "Math" }),
        )
        .await;
        session_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (status, _) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": session_ids[0] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for id in &session_ids {
        post_json(&app, &format!("/api/sessions/{id}/end"), &prof_token, json!({})).await;
    }

    let (status, body) = get(&app, "/api/analytics/overview", &token).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_sessions"], 2);
    assert_eq!(data["attended_sessions"], 1);
    assert_eq!(data["attendance_rate"], 50.0);
    assert_eq!(data["recent_attendance"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn faculty_overview_splits_active_and_completed() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, token) = seed_user(
        &state,
        "prof@example.com",
        "Prof",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/api/sessions",
        &token,
        json!({ "course_name": "Calculus I", "course_code": "MATH101", "department": "Math" }),
    )
    .await;
    let ended_id = body["data"]["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/sessions",
        &token,
        json!({ "course_name": "Calculus II", "course_code": "MATH102", "department": "Math" }),
    )
    .await;

    post_json(&app, &format!("/api/sessions/{ended_id}/end"), &token, json!({})).await;

    let (status, body) = get(&app, "/api/analytics/overview", &token).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_sessions"], 2);
    assert_eq!(data["active_sessions"], 1);
    assert_eq!(data["completed_sessions"], 1);
    // No session has a known head count, so no rate contributes.
    assert_eq!(data["average_attendance_rate"], 0.0);
}

#[tokio::test]
#[serial]
async fn admin_overview_counts_the_whole_system() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token) = seed_user(
        &state,
        "prof@example.com",
        "Prof",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;
    let (_student, student_token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;
    let (_admin, admin_token) = seed_user(
        &state,
        "root@example.com",
        "Admin",
        Role::Admin,
        None,
        None,
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/api/sessions",
        &prof_token,
        json!({ "course_name": "Calculus I", "course_code": "MATH101", "department": "Math" }),
    )
    .await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/attendance",
        &student_token,
        json!({ "session_id": session_id }),
    )
    .await;

    let (status, body) = get(&app, "/api/analytics/overview", &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_users"], 3);
    assert_eq!(data["total_students"], 1);
    assert_eq!(data["total_faculty"], 1);
    assert_eq!(data["total_sessions"], 1);
    assert_eq!(data["total_attendance_records"], 1);
}

#[tokio::test]
#[serial]
async fn trends_group_recent_marks_by_day() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token) = seed_user(
        &state,
        "prof@example.com",
        "Prof",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;
    let (_student, student_token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    let (_, body) = post_json(
        &app,
        "/api/sessions",
        &prof_token,
        json!({ "course_name": "Calculus I", "course_code": "MATH101", "department": "Math" }),
    )
    .await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/attendance",
        &student_token,
        json!({ "session_id": session_id }),
    )
    .await;

    let today = Utc::now().format("%Y-%m-%d").to_string();
    for token in [&student_token, &prof_token] {
        let (status, body) = get(&app, "/api/analytics/trends", token).await;
        assert_eq!(status, StatusCode::OK);
        let trends = body["data"]["trends"].as_array().unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0]["date"], today.as_str());
        assert_eq!(trends[0]["count"], 1);
    }
}

#[tokio::test]
#[serial]
async fn ai_insights_rejects_students_and_degrades_without_a_key() {
    fast_verification();
    AppConfig::set_openrouter_api_key("");
    let (app, state) = make_test_app().await;
    let (_prof, prof_token) = seed_user(
        &state,
        "prof@example.com",
        "Prof",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;
    let (_student, student_token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    let (status, body) = get(&app, "/api/analytics/ai-insights", &student_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, body) = get(&app, "/api/analytics/ai-insights", &prof_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["insights"],
        "AI insights unavailable - API key not configured"
    );
}
