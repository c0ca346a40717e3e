use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use cold_solutions::{AppState, Config, Storage, app_router};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app() -> Router {
    let storage = Storage::connect("sqlite::memory:")
        .await
        .expect("in-memory storage");
    let state = AppState::new(storage, Config::default()).expect("state");
    app_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.clone().oneshot(request).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body was not JSON")
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn malformed_json_gets_uniform_400() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/leads")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .expect("failed to build request");
    let resp = app.oneshot(request).await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn non_numeric_path_id_gets_uniform_400() {
    let app = test_app().await;
    for (method, uri) in [
        ("GET", "/api/leads/abc"),
        ("GET", "/api/business-intelligence/leads/abc"),
        ("DELETE", "/api/voice-ai/campaigns/abc"),
        ("POST", "/api/voice-ai/campaigns/abc/start"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|e| e.contains("abc")));
    }
}

#[tokio::test]
async fn lead_crud_round_trip() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/leads",
        Some(json!({ "business_name": "Acme Roofing", "phone": "+44 113 000", "city": "Leeds" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "New");
    assert_eq!(body["data"]["source"], "Other");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/leads/{id}"),
        Some(json!({ "status": "Not Interested", "notes": "call back in spring" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Not Interested");
    // untouched fields survive a partial update
    assert_eq!(body["data"]["city"], "Leeds");

    let (_, body) = send(&app, "GET", "/api/leads?search=acme", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = send(&app, "GET", "/api/leads?status=New", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "DELETE", &format!("/api/leads/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", &format!("/api/leads/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn blank_business_name_is_rejected() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/leads",
        Some(json!({ "business_name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Business name is required");
}

#[tokio::test]
async fn lead_lists_group_leads() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/lead-lists",
        Some(json!({ "name": "Leeds trades" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let list_id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/api/leads",
        Some(json!({ "business_name": "Acme", "list_id": list_id })),
    )
    .await;
    send(&app, "POST", "/api/leads", Some(json!({ "business_name": "Other Co" }))).await;

    let (_, body) = send(&app, "GET", &format!("/api/lead-lists/{list_id}/leads"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = send(&app, "GET", "/api/lead-lists", None).await;
    assert_eq!(body["data"][0]["lead_count"], 1);

    let (status, _) = send(
        &app,
        "POST",
        "/api/lead-lists",
        Some(json!({ "name": "Leeds trades" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/lead-lists/{list_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/leads", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn make_webhook_maps_source() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/webhooks/make",
        Some(json!({ "name": "Bright Smiles", "phone": "+1555", "source": "Website form" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["business_name"], "Bright Smiles");
    assert_eq!(body["data"]["source"], "Website");
}

#[tokio::test]
async fn calls_feed_stats_and_activity() {
    let app = test_app().await;
    for (outcome, secs) in [("Booked", 120), ("No Answer", 0), ("Wrong Number", 30)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/calls",
            Some(json!({ "phone": "+1555", "business_name": "Acme", "outcome": outcome, "duration_seconds": secs })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", "/api/calls?outcome=Booked", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/calls/stats?period=today", None).await;
    assert_eq!(status, StatusCode::OK);
    let combined = &body["data"]["combined"];
    assert_eq!(combined["totalCalls"], 3);
    assert_eq!(combined["successful"], 1);
    assert_eq!(combined["pending"], 1);
    assert_eq!(combined["unsuccessful"], 1);
    assert_eq!(combined["averageCallDuration"], 50.0);
    assert!(body["data"]["sources"]["notion"].is_null());
    assert!(body["data"].get("notionError").is_none());

    let (status, _) = send(&app, "GET", "/api/calls/stats?period=fortnight", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/activity?limit=2", None).await;
    let feed = body["data"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["kind"], "call");

    let (_, body) = send(&app, "GET", "/api/operations/overview", None).await;
    assert_eq!(body["data"]["callsToday"], 3);
    assert_eq!(body["data"]["totalLeads"], 0);
}

#[tokio::test]
async fn call_for_unknown_lead_is_404() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/calls",
        Some(json!({ "phone": "+1555", "outcome": "Booked", "lead_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unconfigured_integrations_answer_503() {
    let app = test_app().await;
    let cases = [
        ("GET", "/api/notion/leads", None),
        ("GET", "/api/retell/agents", None),
        (
            "POST",
            "/api/email/send",
            Some(json!({ "to": "a@b.test", "subject": "Hi", "body": "Hello" })),
        ),
        ("POST", "/api/business-intelligence/analyze", Some(json!({}))),
        ("POST", "/api/voice-ai/queue/dispatch", Some(json!({}))),
    ];
    for (method, uri, body) in cases {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn email_settings_fall_back_to_config_then_persist() {
    let app = test_app().await;
    let (_, body) = send(&app, "GET", "/api/email/settings", None).await;
    assert_eq!(body["data"]["smtp_port"], 587);
    assert_eq!(body["data"]["from_name"], "Cold Solutions");
    assert_eq!(body["data"]["daily_limit"], 200);

    let settings = json!({
        "smtp_host": "smtp.example.com",
        "smtp_port": 465,
        "smtp_username": "team",
        "from_name": "Team",
        "from_address": "team@example.com",
        "imap_host": null,
        "imap_port": null,
        "daily_limit": 50,
        "signature": "-- Team"
    });
    let (status, _) = send(&app, "PUT", "/api/email/settings", Some(settings)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/email/settings", None).await;
    assert_eq!(body["data"]["smtp_port"], 465);
    assert_eq!(body["data"]["daily_limit"], 50);

    let (_, body) = send(&app, "GET", "/api/email/logs", None).await;
    assert_eq!(body["data"]["demo"], false);
    assert!(body["data"]["logs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn business_import_reports_rows() {
    let app = test_app().await;
    let rows = json!({ "rows": [
        { "business_name": "Acme", "city": "Leeds", "country": "UK" },
        { "business_name": "acme", "city": "LEEDS", "country": "UK" },
        { "business_name": "No City", "country": "UK" }
    ]});
    let (status, body) = send(&app, "POST", "/api/business-intelligence/import", Some(rows)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["imported"], 1);
    assert_eq!(body["data"]["duplicates"], 1);
    assert_eq!(
        body["data"]["errors"][0],
        "Row 3: missing required field(s): city"
    );

    let id = body["data"]["lead_ids"][0].as_i64().unwrap();
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/business-intelligence/leads/{id}"),
        None,
    )
    .await;
    assert_eq!(body["data"]["analysis_status"], "Pending");
    assert!(body["data"]["analysis"].is_null());

    // not analyzed yet, so nothing converts
    let (_, body) = send(
        &app,
        "POST",
        "/api/business-intelligence/push-to-caller",
        Some(json!({ "ids": [id] })),
    )
    .await;
    assert_eq!(body["data"]["pushed"], 0);
    assert_eq!(body["data"]["skipped"], 1);
}

#[tokio::test]
async fn voice_campaign_start_queues_leads() {
    let app = test_app().await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/voice-ai/campaigns",
        Some(json!({ "name": "Dentists", "agent_id": "agent_1" })),
    )
    .await;
    let campaign_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "Draft");
    assert_eq!(body["data"]["max_attempts"], 3);

    for phone in ["+15550001", "+15550002"] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/voice-ai/leads",
            Some(json!({ "name": "Owner", "phone": phone, "campaign_id": campaign_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/voice-ai/campaigns/{campaign_id}/start"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/voice-ai/queue?status=Queued", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let (_, body) = send(&app, "GET", "/api/operations/overview", None).await;
    assert_eq!(body["data"]["activeCampaigns"], 1);
    assert_eq!(body["data"]["queuedCalls"], 2);

    send(
        &app,
        "PUT",
        &format!("/api/voice-ai/campaigns/{campaign_id}"),
        Some(json!({ "status": "Completed" })),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/voice-ai/campaigns/{campaign_id}/start"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn voice_settings_default_and_validate() {
    let app = test_app().await;
    let (_, body) = send(&app, "GET", "/api/voice-ai/settings", None).await;
    assert_eq!(body["data"]["max_concurrent_calls"], 5);
    assert_eq!(body["data"]["call_window_start"], "09:00");

    let bad = json!({
        "retell_agent_id": null,
        "from_number": "+15559990000",
        "max_concurrent_calls": 2,
        "call_window_start": "9am",
        "call_window_end": "17:00",
        "timezone": "Europe/London"
    });
    let (status, _) = send(&app, "PUT", "/api/voice-ai/settings", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn retell_webhook_acks_unknown_calls() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/retell/webhook",
        Some(json!({ "event": "call_ended", "call": { "call_id": "nobody" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["received"], true);
    assert!(body["data"]["call_log_id"].is_null());
}
