mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestClient, activated_client, spawn_app};
use serde_json::{Value, json};

fn gig(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Four hours of background music",
        "payment": 250.0,
        "location": "Maribor",
    })
}

async fn create_gig(client: &mut TestClient, title: &str) -> String {
    let response = client.post("/api/gigs", gig(title)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["data"]["slug"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_employer_creates_gigs_with_distinct_slugs() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "hotel_union", "union@example.com", "employer").await;

    let first = create_gig(&mut employer, "Jazz Night at the Bar").await;
    assert_eq!(
        employer.flashes().await,
        vec!["The new gig has been added. \"Jazz Night at the Bar\""]
    );
    let second = create_gig(&mut employer, "Jazz Night at the Bar").await;

    assert_ne!(first, second);
    assert!(first.starts_with("jazz-night-at-the-bar-"));
    assert!(second.starts_with("jazz-night-at-the-bar-"));

    let mine = employer.get("/api/gigs/mine").await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_gig_form_errors() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "strict_hall", "hall@example.com", "employer").await;

    let response = employer
        .post(
            "/api/gigs",
            json!({ "title": "Gig", "description": "short", "payment": -5.0, "location": "X" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    for field in ["title", "description", "payment", "location"] {
        assert!(response.body["fields"][field].is_array(), "{field}");
    }
}

#[tokio::test]
async fn test_musician_cannot_create_gig() {
    let app = spawn_app().await;
    let mut musician = activated_client(&app, "cellist", "cellist@example.com", "musician").await;

    let response = musician.post("/api/gigs", gig("My Own Concert")).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/api/home"));
    assert_eq!(
        musician.flashes().await,
        vec!["You are not authorized to access this page"]
    );
}

#[tokio::test]
async fn test_unactivated_employer_cannot_create_gig() {
    let app = spawn_app().await;
    let mut employer = app.client();
    employer.register("new_venue", "venue@example.com", "employer").await;
    employer.flashes().await;

    let response = employer.post("/api/gigs", gig("Opening Night")).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        employer.flashes().await,
        vec!["Only activated users have access to this page"]
    );
}

#[tokio::test]
async fn test_only_owner_edits_gig() {
    let app = spawn_app().await;
    let mut owner = activated_client(&app, "owner_co", "owner@example.com", "employer").await;
    let mut rival = activated_client(&app, "rival_co", "rival@example.com", "employer").await;

    let slug = create_gig(&mut owner, "Summer Festival").await;
    owner.flashes().await;

    let response = rival
        .put(&format!("/api/gigs/{slug}"), gig("Stolen Festival"))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/api/home"));
    assert_eq!(
        rival.flashes().await,
        vec!["You are not the owner of that gig."]
    );

    let response = rival.delete(&format!("/api/gigs/{slug}")).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    // Same title keeps the slug.
    let mut same_title = gig("Summer Festival");
    same_title["location"] = json!("Koper");
    let response = owner.put(&format!("/api/gigs/{slug}"), same_title).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["slug"], json!(slug));
    assert_eq!(response.body["data"]["location"], json!("Koper"));
    assert_eq!(owner.flashes().await, vec!["The gig is updated."]);

    // A new title gets a new slug and the old one is gone.
    let response = owner
        .put(&format!("/api/gigs/{slug}"), gig("Autumn Festival"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let new_slug = response.body["data"]["slug"].as_str().unwrap().to_string();
    assert!(new_slug.starts_with("autumn-festival-"));

    let response = owner.get(&format!("/api/gigs/{slug}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = owner.delete(&format!("/api/gigs/{new_slug}")).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = owner.get(&format!("/api/gigs/{new_slug}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "wedding_co", "wedding@example.com", "employer").await;
    let mut musician = activated_client(&app, "harpist", "harpist@example.com", "musician").await;

    let slug = create_gig(&mut employer, "Garden Wedding").await;

    let uri = format!("/api/gigs/{slug}/apply");
    let response = musician.post(&uri, json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["applied"], json!(true));
    assert_eq!(
        musician.flashes().await,
        vec!["You just applied to the gig: \"Garden Wedding\"."]
    );

    let response = musician.post(&uri, json!({})).await;
    assert_eq!(response.status, StatusCode::OK);

    let details = musician.get(&format!("/api/gigs/{slug}")).await;
    assert_eq!(details.status, StatusCode::OK);
    assert_eq!(details.body["data"]["applicants"].as_array().unwrap().len(), 1);
    assert_eq!(details.body["data"]["applied"], json!(true));

    // Employers see applicants but no applied flag.
    let details = employer.get(&format!("/api/gigs/{slug}")).await;
    assert_eq!(details.body["data"]["applicants"][0]["username"], json!("harpist"));
    assert!(details.body["data"].get("applied").is_none());

    let mine = musician.get("/api/gigs/mine").await;
    assert_eq!(mine.body["data"][0]["slug"], json!(slug));

    let response = musician.delete(&uri).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["applied"], json!(false));

    let mine = musician.get("/api/gigs/mine").await;
    assert_eq!(mine.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_employer_cannot_apply() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "agency_one", "agency@example.com", "employer").await;
    let slug = create_gig(&mut employer, "Corporate Party").await;

    let response = employer
        .post(&format!("/api/gigs/{slug}/apply"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_missing_gig_is_not_found() {
    let app = spawn_app().await;
    let mut musician = activated_client(&app, "drummer", "drummer@example.com", "musician").await;

    let response = musician.get("/api/gigs/no-such-gig-abc123").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = musician
        .post("/api/gigs/no-such-gig-abc123/apply", json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_feed_by_role() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "club_owner", "club@example.com", "employer").await;
    let mut musician = activated_client(&app, "bassist", "bassist@example.com", "musician").await;
    create_gig(&mut employer, "Late Night Session").await;

    let home = musician.get("/api/home").await;
    assert_eq!(home.status, StatusCode::OK);
    assert_eq!(home.body["data"]["gigs"].as_array().unwrap().len(), 1);
    assert!(home.body["data"].get("musicians").is_none());

    let home = employer.get("/api/home").await;
    assert_eq!(home.body["data"]["musicians"][0]["username"], json!("bassist"));
    assert!(home.body["data"]["musicians"][0].get("email").is_none());
    assert!(home.body["data"].get("gigs").is_none());

    let home = app.client().get("/api/home").await;
    assert_eq!(home.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profiles() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "theatre", "theatre@example.com", "employer").await;
    let mut musician = activated_client(&app, "oboist", "oboist@example.com", "musician").await;
    create_gig(&mut employer, "Matinee Orchestra").await;

    let own = employer.get("/api/users/theatre").await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["user"]["email"], json!("theatre@example.com"));
    assert_eq!(own.body["data"]["gigs"].as_array().unwrap().len(), 1);

    let other = musician.get("/api/users/theatre").await;
    assert!(other.body["data"]["user"].get("email").is_none());

    let missing = musician.get("/api/users/nobody_here").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let response = musician
        .put(
            "/api/users/me",
            json!({ "location": "Celje", "description": "Oboe and cor anglais" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["location"], json!("Celje"));
    assert_eq!(
        musician.flashes().await,
        vec!["Your account has been updated"]
    );

    let response = musician
        .put("/api/users/me", json!({ "location": "X", "description": "" }))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_account_deletion_cascades() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "closing_bar", "closing@example.com", "employer").await;
    let mut musician = activated_client(&app, "trumpeter", "trumpet@example.com", "musician").await;

    let slug = create_gig(&mut employer, "Last Call Jam").await;
    musician
        .post(&format!("/api/gigs/{slug}/apply"), json!({}))
        .await;

    let response = employer.login("closing@example.com", PASSWORD, true).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = employer.delete("/api/users/me").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!employer.cookies.contains_key("remember_token"));
    assert_eq!(
        employer.flashes().await,
        vec!["Your account has been deleted"]
    );

    let me = employer.get("/api/auth/me").await;
    assert_eq!(me.body["data"]["authenticated"], json!(false));

    let response = musician.get(&format!("/api/gigs/{slug}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let mine = musician.get("/api/gigs/mine").await;
    assert_eq!(mine.body["data"].as_array().unwrap().len(), 0);

    let response = employer.login("closing@example.com", PASSWORD, false).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_guards_run_before_body_is_parsed() {
    let app = spawn_app().await;
    let mut anonymous = app.client();

    for content_type in [Some("application/json"), None] {
        let response = anonymous
            .raw(Method::POST, "/api/gigs", content_type, "{not json".to_string())
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{content_type:?}");
        assert_eq!(response.location(), Some("/api/auth/login"));
    }

    let mut musician = activated_client(&app, "drummer", "drummer@example.com", "musician").await;
    let response = musician
        .raw(Method::POST, "/api/gigs", None, String::new())
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/api/home"));
}

#[tokio::test]
async fn test_malformed_body_after_guards() {
    let app = spawn_app().await;
    let mut employer = activated_client(&app, "jazz_club", "club@example.com", "employer").await;

    let response = employer
        .raw(
            Method::POST,
            "/api/gigs",
            Some("application/json"),
            "{not json".to_string(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));
    assert!(response.body["error"].is_string());

    let response = employer
        .raw(Method::POST, "/api/gigs", None, gig("Quiet Set").to_string())
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}
