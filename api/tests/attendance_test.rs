mod helpers;

use axum::http::StatusCode;
use helpers::app::{get, make_test_app, post_json, seed_user};
use serde_json::{Value, json};
use serial_test::serial;

use db::models::user::{Model as UserModel, Role};
use util::config::AppConfig;
use util::state::AppState;
use util::ws::topics;

fn fast_verification() {
    AppConfig::set_verification_delay_ms(0);
    AppConfig::set_verification_timeout_ms(5_000);
}

async fn seed_faculty_with_session(
    app: &axum::Router,
    state: &AppState,
) -> (UserModel, String, String) {
    let (prof, token) = seed_user(
        state,
        "prof@example.com",
        "Prof Stone",
        Role::Faculty,
        Some("Math"),
        None,
    )
    .await;

    let (_, body) = post_json(
        app,
        "/api/sessions",
        &token,
        json!({ "course_name": "Calculus I", "course_code": "MATH101", "department": "Math" }),
    )
    .await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    (prof, token, session_id)
}

#[tokio::test]
#[serial]
async fn student_marks_attendance_and_events_fan_out() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (prof, _prof_token, session_id) = seed_faculty_with_session(&app, &state).await;
    let (student, token) = seed_user(
        &state,
        "s@example.com",
        "Student One",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    let mut session_feed = state.ws().subscribe(&topics::session_topic(&session_id)).await;
    let mut faculty_feed = state.ws().subscribe(&topics::user_topic(&prof.id)).await;
    let mut unrelated_feed = state
        .ws()
        .subscribe(&topics::session_topic("some-other-session"))
        .await;

    let (status, body) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": session_id, "location": "Room 2.41" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let record = &body["data"];
    assert_eq!(record["session_id"], session_id.as_str());
    assert_eq!(record["student_id"], student.id.as_str());
    assert_eq!(record["student_name"], "Student One");
    assert_eq!(record["verification_method"], "face");
    assert_eq!(record["location"], "Room 2.41");
    let confidence = record["confidence_score"].as_f64().unwrap();
    assert!((0.92..=0.99).contains(&confidence));

    // The session row reflects the recomputed count.
    let (_, body) = get(&app, &format!("/api/sessions/{session_id}"), &token).await;
    assert_eq!(body["data"]["present_count"], 1);

    // Both the session feed and the owning faculty member hear about it;
    // unrelated session feeds stay silent.
    for feed in [&mut session_feed, &mut faculty_feed] {
        let raw = feed.try_recv().expect("expected an attendance_marked event");
        let event: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(event["type"], "attendance_marked");
        assert_eq!(event["payload"]["session_id"], session_id.as_str());
        assert_eq!(event["payload"]["present_count"], 1);
    }
    assert!(unrelated_feed.try_recv().is_err());
}

#[tokio::test]
#[serial]
async fn marking_twice_conflicts() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, _prof_token, session_id) = seed_faculty_with_session(&app, &state).await;
    let (_student, token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Attendance already marked for this session");
}

#[tokio::test]
#[serial]
async fn marking_unknown_or_ended_sessions_fails() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token, session_id) = seed_faculty_with_session(&app, &state).await;
    let (_student, token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": "missing-id" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");

    post_json(
        &app,
        &format!("/api/sessions/{session_id}/end"),
        &prof_token,
        json!({}),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/attendance",
        &token,
        json!({ "session_id": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Session is not active");
}

#[tokio::test]
#[serial]
async fn only_students_can_mark_attendance() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token, session_id) = seed_faculty_with_session(&app, &state).await;

    let (status, body) = post_json(
        &app,
        "/api/attendance",
        &prof_token,
        json!({ "session_id": session_id }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only students can perform this action");
}

#[tokio::test]
#[serial]
async fn my_history_lists_own_marks_newest_first() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token, first_session) = seed_faculty_with_session(&app, &state).await;
    let (_, body) = post_json(
        &app,
        "/api/sessions",
        &prof_token,
        json!({ "course_name": "Calculus II", "course_code": "MATH102", "department": "Math" }),
    )
    .await;
    let second_session = body["data"]["id"].as_str().unwrap().to_string();

    let (_student, token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;

    for session_id in [&first_session, &second_session] {
        let (status, _) = post_json(
            &app,
            "/api/attendance",
            &token,
            json!({ "session_id": session_id }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(&app, "/api/attendance/my-history", &token).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);

    // Faculty have no personal history endpoint.
    let (status, _) = get(&app, "/api/attendance/my-history", &prof_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn session_attendance_is_owner_or_admin_only() {
    fast_verification();
    let (app, state) = make_test_app().await;
    let (_prof, prof_token, session_id) = seed_faculty_with_session(&app, &state).await;
    let (_student, student_token) = seed_user(
        &state,
        "s@example.com",
        "Student",
        Role::Student,
        Some("Math"),
        Some("M-1"),
    )
    .await;
    let (_other, other_token) = seed_user(
        &state,
        "other@example.com",
        "Other Prof",
        Role::Faculty,
        Some("Math"),
        None,
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

    post_json(
        &app,
        "/api/attendance",
        &student_token,
        json!({ "session_id": session_id }),
    )
    .await;

    let (status, body) = get(
        &app,
        &format!("/api/attendance/session/{session_id}"),
        &prof_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = get(
        &app,
        &format!("/api/attendance/session/{session_id}"),
        &admin_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for token in [&student_token, &other_token] {
        let (status, body) = get(
            &app,
            &format!("/api/attendance/session/{session_id}"),
            token,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["message"],
            "Not authorized to view this session's attendance"
        );
    }

    let (status, _) = get(&app, "/api/attendance/session/missing-id", &admin_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
