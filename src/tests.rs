//! Integration tests for the ResQ-Link backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::notify::NotificationDispatcher;
use crate::{create_router, AppState};

const TEST_ADMIN_EMAIL: &str = "admin@resqlink.com";
const TEST_ADMIN_PASSWORD: &str = "admin#123";
const TEST_ADMIN_TOKEN: &str = "admin-test-token";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Start the notification worker
        let notifier = NotificationDispatcher::spawn(repo.clone());

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            admin_email: TEST_ADMIN_EMAIL.to_string(),
            admin_password: TEST_ADMIN_PASSWORD.to_string(),
            admin_token: TEST_ADMIN_TOKEN.to_string(),
        };

        let state = AppState {
            repo,
            notifier,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user and return (id, token).
    async fn register(&self, name: &str, email: &str, role: &str) -> (String, String) {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "fullName": name,
                "email": email,
                "phone": "555-0100",
                "password": "secret123",
                "role": role
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "registration failed for {}", email);
        let body: Value = resp.json().await.unwrap();
        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    /// Create an SOS as the given user and return its id.
    async fn create_sos(&self, token: &str, sos_type: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/sos"))
            .bearer_auth(token)
            .json(&json!({
                "emergencyType": sos_type,
                "description": "test incident",
                "location": { "lat": 12.9, "lng": 77.6, "accuracy": 5.0 }
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Add an inventory item as admin and return its id.
    async fn add_inventory(&self, name: &str, category: &str, quantity: i64) -> String {
        let resp = self
            .client
            .post(self.url("/api/inventory"))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .json(&json!({
                "itemName": name,
                "category": category,
                "quantity": quantity,
                "unit": "kg"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a resource request and return its id.
    async fn create_resource(&self, token: &str, body: Value) -> String {
        let resp = self
            .client
            .post(self.url("/api/resources"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

// ==================== AUTH ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/sos"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_route_rejects_bad_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/sos"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_register_and_login() {
    let fixture = TestFixture::new().await;

    let (id, _token) = fixture
        .register("Asha Rao", "asha@example.com", "victim")
        .await;
    assert!(!id.is_empty());

    // Duplicate email is a conflict
    let dup = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "fullName": "Asha Again",
            "email": "asha@example.com",
            "phone": "555-0101",
            "password": "secret123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 409);

    // Login with the right password
    let login = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "asha@example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);
    let body: Value = login.json().await.unwrap();
    assert_eq!(body["data"]["role"], "victim");

    // Wrong password is unauthorized
    let bad = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "asha@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 401);
}

#[tokio::test]
async fn test_login_switches_role() {
    let fixture = TestFixture::new().await;
    fixture
        .register("Ravi Kumar", "ravi@example.com", "victim")
        .await;

    let login = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({
            "email": "ravi@example.com",
            "password": "secret123",
            "role": "volunteer"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);
    let body: Value = login.json().await.unwrap();
    assert_eq!(body["data"]["role"], "volunteer");
}

#[tokio::test]
async fn test_register_as_admin_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "fullName": "Sneaky",
            "email": "sneaky@example.com",
            "phone": "555-0102",
            "password": "secret123",
            "role": "admin"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_admin_login_and_superuser_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/admin-login"))
        .json(&json!({ "email": TEST_ADMIN_EMAIL, "password": TEST_ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["id"], "0000-ADMIN-ID");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The superuser token works on an admin-only route without a store user
    let users = fixture
        .client
        .get(fixture.url("/api/auth/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(users.status(), 200);

    // Wrong admin credentials are rejected
    let bad = fixture
        .client
        .post(fixture.url("/api/auth/admin-login"))
        .json(&json!({ "email": TEST_ADMIN_EMAIL, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 401);
}

#[tokio::test]
async fn test_admin_user_management() {
    let fixture = TestFixture::new().await;
    let (id, user_token) = fixture
        .register("Meera Iyer", "meera@example.com", "donor")
        .await;

    // Non-admin cannot list users
    let forbidden = fixture
        .client
        .get(fixture.url("/api/auth/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // Admin promotes the user to volunteer
    let promote = fixture
        .client
        .put(fixture.url(&format!("/api/auth/users/{}", id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "role": "volunteer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(promote.status(), 200);
    let body: Value = promote.json().await.unwrap();
    assert_eq!(body["data"]["role"], "volunteer");

    // Admin deletes the user; their session stops working
    let delete = fixture
        .client
        .delete(fixture.url(&format!("/api/auth/users/{}", id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), 200);

    let after = fixture
        .client
        .get(fixture.url("/api/sos"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), 401);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let fixture = TestFixture::new().await;
    fixture
        .register("Lina Das", "lina@example.com", "victim")
        .await;

    // Known and unknown emails answer identically
    for email in ["lina@example.com", "nobody@example.com"] {
        let resp = fixture
            .client
            .post(fixture.url("/api/auth/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // A bogus reset token is rejected
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/reset-password"))
        .json(&json!({ "token": "bogus", "password": "newpass123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ==================== INVENTORY ====================

#[tokio::test]
async fn test_inventory_crud_and_status_derivation() {
    let fixture = TestFixture::new().await;

    let id = fixture.add_inventory("Rice", "Food", 0).await;

    // Zero quantity derives Out of Stock
    let list = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    let body: Value = list.json().await.unwrap();
    let item = &body["data"][0];
    assert_eq!(item["itemName"], "Rice");
    assert_eq!(item["status"], "Out of Stock");

    // 5 derives Low Stock
    let update = fixture
        .client
        .put(fixture.url(&format!("/api/inventory/{}", id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .unwrap();
    let body: Value = update.json().await.unwrap();
    assert_eq!(body["data"]["status"], "Low Stock");

    // 10 derives In Stock
    let update = fixture
        .client
        .put(fixture.url(&format!("/api/inventory/{}", id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "quantity": 10 }))
        .send()
        .await
        .unwrap();
    let body: Value = update.json().await.unwrap();
    assert_eq!(body["data"]["status"], "In Stock");

    // Delta adjustment clamps at zero
    let adjust = fixture
        .client
        .put(fixture.url(&format!("/api/inventory/{}", id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "delta": -25 }))
        .send()
        .await
        .unwrap();
    let body: Value = adjust.json().await.unwrap();
    assert_eq!(body["data"]["quantity"], 0);
    assert_eq!(body["data"]["status"], "Out of Stock");

    // Delete is idempotent from the caller's perspective
    for _ in 0..2 {
        let del = fixture
            .client
            .delete(fixture.url(&format!("/api/inventory/{}", id)))
            .bearer_auth(TEST_ADMIN_TOKEN)
            .send()
            .await
            .unwrap();
        assert_eq!(del.status(), 200);
    }
}

#[tokio::test]
async fn test_inventory_validation_and_roles() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture
        .register("Dev Patel", "dev@example.com", "volunteer")
        .await;

    // Non-admin cannot add stock
    let forbidden = fixture
        .client
        .post(fixture.url("/api/inventory"))
        .bearer_auth(&token)
        .json(&json!({ "itemName": "Rice", "category": "Food", "quantity": 5, "unit": "kg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    // Category outside the enumerated set is a validation error
    let bad_category = fixture
        .client
        .post(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "itemName": "Fuel", "category": "Petrol", "quantity": 5, "unit": "liters" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_category.status(), 400);
    let body: Value = bad_category.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Negative quantity is a validation error
    let negative = fixture
        .client
        .post(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "itemName": "Water", "category": "Water", "quantity": -1, "unit": "liters" }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative.status(), 400);

    // Any authenticated caller may read the ledger
    let read = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(read.status(), 200);
}

// ==================== SOS LIFECYCLE ====================

#[tokio::test]
async fn test_create_sos_validation() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture
        .register("Nia Shah", "nia@example.com", "victim")
        .await;

    // Missing location
    let resp = fixture
        .client
        .post(fixture.url("/api/sos"))
        .bearer_auth(&token)
        .json(&json!({ "emergencyType": "Fire" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Missing type
    let resp = fixture
        .client
        .post(fixture.url("/api/sos"))
        .bearer_auth(&token)
        .json(&json!({ "location": { "lat": 12.9, "lng": 77.6 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_create_sos_round_trip() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture
        .register("Nia Shah", "nia2@example.com", "victim")
        .await;

    let id = fixture.create_sos(&token, "Fire").await;

    let mine = fixture
        .client
        .get(fixture.url("/api/sos/my"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(mine.status(), 200);
    let body: Value = mine.json().await.unwrap();
    let alerts = body["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], id.as_str());
    assert_eq!(alerts[0]["status"], "pending");
    assert!(alerts[0]["assignedVolunteer"].is_null());
    // Longitude-first coordinates
    assert_eq!(alerts[0]["location"]["coordinates"][0], 77.6);
    assert_eq!(alerts[0]["location"]["coordinates"][1], 12.9);
}

#[tokio::test]
async fn test_accept_task_is_at_most_once() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v1@example.com", "victim")
        .await;
    let (a_id, vol_a) = fixture
        .register("Volunteer A", "a@example.com", "volunteer")
        .await;
    let (_, vol_b) = fixture
        .register("Volunteer B", "b@example.com", "volunteer")
        .await;

    let sos_id = fixture.create_sos(&victim, "Fire").await;

    // Volunteer A wins
    let accept_a = fixture
        .client
        .put(fixture.url(&format!("/api/sos/{}/accept", sos_id)))
        .bearer_auth(&vol_a)
        .send()
        .await
        .unwrap();
    assert_eq!(accept_a.status(), 200);
    let body: Value = accept_a.json().await.unwrap();
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["assignedVolunteer"], a_id.as_str());

    // Volunteer B loses with a conflict
    let accept_b = fixture
        .client
        .put(fixture.url(&format!("/api/sos/{}/accept", sos_id)))
        .bearer_auth(&vol_b)
        .send()
        .await
        .unwrap();
    assert_eq!(accept_b.status(), 409);
    let body: Value = accept_b.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Accepting a non-existent mission is a 404
    let missing = fixture
        .client
        .put(fixture.url("/api/sos/ghost/accept"))
        .bearer_auth(&vol_b)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_status_update_links_and_clears_volunteer() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v2@example.com", "victim")
        .await;
    let (vol_id, vol) = fixture
        .register("Vol", "vol2@example.com", "volunteer")
        .await;

    let sos_id = fixture.create_sos(&victim, "Flood").await;

    // accepted links the acting user
    let accepted = fixture
        .client
        .put(fixture.url(&format!("/api/sos/{}/status", sos_id)))
        .bearer_auth(&vol)
        .json(&json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
    let body: Value = accepted.json().await.unwrap();
    assert_eq!(body["data"]["assignedVolunteer"], vol_id.as_str());

    // pending clears the assignment
    let pending = fixture
        .client
        .put(fixture.url(&format!("/api/sos/{}/status", sos_id)))
        .bearer_auth(&vol)
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    let body: Value = pending.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["assignedVolunteer"].is_null());
}

#[tokio::test]
async fn test_assign_task_and_volunteer_history() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v3@example.com", "victim")
        .await;
    let (vol_id, vol) = fixture
        .register("Vol", "vol3@example.com", "volunteer")
        .await;

    let sos_id = fixture.create_sos(&victim, "Collapse").await;

    // Only admins may assign
    let forbidden = fixture
        .client
        .put(fixture.url("/api/sos/assign"))
        .bearer_auth(&vol)
        .json(&json!({ "sosId": sos_id, "volunteerId": vol_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let assign = fixture
        .client
        .put(fixture.url("/api/sos/assign"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "sosId": sos_id, "volunteerId": vol_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(assign.status(), 200);
    let body: Value = assign.json().await.unwrap();
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["assignedVolunteer"], vol_id.as_str());

    let history = fixture
        .client
        .get(fixture.url("/api/sos/history"))
        .bearer_auth(&vol)
        .send()
        .await
        .unwrap();
    let body: Value = history.json().await.unwrap();
    let missions = body["data"].as_array().unwrap();
    assert_eq!(missions.len(), 1);
    assert_eq!(missions[0]["id"], sos_id.as_str());
}

#[tokio::test]
async fn test_list_open_excludes_resolved_and_is_idempotent() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v4@example.com", "victim")
        .await;

    let open_id = fixture.create_sos(&victim, "Fire").await;
    let resolved_id = fixture.create_sos(&victim, "Medical").await;
    let cancelled_id = fixture.create_sos(&victim, "Flood").await;

    for (id, status) in [(&resolved_id, "resolved"), (&cancelled_id, "cancelled")] {
        fixture
            .client
            .put(fixture.url(&format!("/api/sos/{}/status", id)))
            .bearer_auth(&victim)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
    }

    let mut seen: Vec<Vec<String>> = Vec::new();
    for _ in 0..2 {
        let resp = fixture
            .client
            .get(fixture.url("/api/sos"))
            .bearer_auth(&victim)
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        let mut ids: Vec<String> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        seen.push(ids);
    }

    // Identical sets across reads without mutation
    assert_eq!(seen[0], seen[1]);
    // Resolved is excluded; cancelled is still visible
    assert!(seen[0].contains(&open_id));
    assert!(seen[0].contains(&cancelled_id));
    assert!(!seen[0].contains(&resolved_id));

    // Analytics returns the full dataset regardless of status
    let analytics = fixture
        .client
        .get(fixture.url("/api/sos/analytics"))
        .bearer_auth(&victim)
        .send()
        .await
        .unwrap();
    let body: Value = analytics.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_linked_resources_are_live() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v5@example.com", "victim")
        .await;

    let sos_id = fixture.create_sos(&victim, "Flood").await;

    // One request linked before the first read, one after, one unlinked
    let linked_1 = fixture
        .create_resource(
            &victim,
            json!({
                "items": [{ "itemCategory": "Water", "quantity": "10" }],
                "urgency": "High",
                "sosId": sos_id
            }),
        )
        .await;

    let first = fixture
        .client
        .get(fixture.url("/api/sos/my"))
        .bearer_auth(&victim)
        .send()
        .await
        .unwrap();
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"][0]["linkedResources"].as_array().unwrap().len(), 1);

    let linked_2 = fixture
        .create_resource(
            &victim,
            json!({
                "items": [{ "itemCategory": "Blankets", "quantity": "3" }],
                "sosId": sos_id
            }),
        )
        .await;
    fixture
        .create_resource(
            &victim,
            json!({ "items": [{ "itemCategory": "Food", "quantity": "5" }] }),
        )
        .await;

    let second = fixture
        .client
        .get(fixture.url("/api/sos/my"))
        .bearer_auth(&victim)
        .send()
        .await
        .unwrap();
    let body: Value = second.json().await.unwrap();
    let linked = body["data"][0]["linkedResources"].as_array().unwrap();
    let mut ids: Vec<&str> = linked.iter().map(|r| r["id"].as_str().unwrap()).collect();
    ids.sort();
    let mut expected = vec![linked_1.as_str(), linked_2.as_str()];
    expected.sort();
    assert_eq!(ids, expected);
}

// ==================== RESOURCE LIFECYCLE ====================

#[tokio::test]
async fn test_create_resource_requires_items() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture
        .register("Victim", "v6@example.com", "victim")
        .await;

    let resp = fixture
        .client
        .post(fixture.url("/api/resources"))
        .bearer_auth(&token)
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_pending_list_orders_by_urgency() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture
        .register("Victim", "v7@example.com", "victim")
        .await;

    fixture
        .create_resource(
            &token,
            json!({
                "items": [{ "itemCategory": "Food", "quantity": "2" }],
                "urgency": "Low"
            }),
        )
        .await;
    let high_id = fixture
        .create_resource(
            &token,
            json!({
                "items": [{ "itemCategory": "Medical", "quantity": "1" }],
                "urgency": "High"
            }),
        )
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/resources"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0]["id"], high_id.as_str());
    assert_eq!(pending[0]["urgency"], "High");
    // Requester enrichment for the triage board
    assert_eq!(pending[0]["requester"]["fullName"], "Victim");
}

#[tokio::test]
async fn test_donor_fulfillment_and_logistics_flow() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v8@example.com", "victim")
        .await;
    let (donor_id, donor) = fixture
        .register("Donor", "d8@example.com", "donor")
        .await;

    let request_id = fixture
        .create_resource(
            &victim,
            json!({ "items": [{ "itemCategory": "Blankets", "quantity": "5" }] }),
        )
        .await;

    // Delivery before collection is blocked
    let too_soon = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/status", request_id)))
        .bearer_auth(&victim)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_soon.status(), 409);

    // Donor pledges
    let fulfill = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/fulfill", request_id)))
        .bearer_auth(&donor)
        .send()
        .await
        .unwrap();
    assert_eq!(fulfill.status(), 200);
    let body: Value = fulfill.json().await.unwrap();
    assert_eq!(body["data"]["status"], "fulfilled");
    assert_eq!(body["data"]["donorId"], donor_id.as_str());

    // A second pledge conflicts
    let again = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/fulfill", request_id)))
        .bearer_auth(&donor)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);

    // fulfilled -> collected -> delivered
    for status in ["collected", "delivered"] {
        let resp = fixture
            .client
            .put(fixture.url(&format!("/api/resources/{}/status", request_id)))
            .bearer_auth(&victim)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // The donor sees their pledge
    let donations = fixture
        .client
        .get(fixture.url("/api/resources/donations"))
        .bearer_auth(&donor)
        .send()
        .await
        .unwrap();
    let body: Value = donations.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // And the logistics queue saw the request past pending
    let logistics = fixture
        .client
        .get(fixture.url("/api/resources/logistics"))
        .bearer_auth(&victim)
        .send()
        .await
        .unwrap();
    let body: Value = logistics.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], request_id.as_str());
    assert_eq!(body["data"][0]["status"], "delivered");
}

#[tokio::test]
async fn test_approve_deducts_inventory() {
    let fixture = TestFixture::new().await;
    let (_, volunteer) = fixture
        .register("Vol", "vol9@example.com", "volunteer")
        .await;

    fixture.add_inventory("Rice", "Food", 50).await;

    // First restock of 20: 50 -> 30, still In Stock
    let first = fixture
        .create_resource(
            &volunteer,
            json!({
                "items": [{ "itemCategory": "Rice", "quantity": "20" }],
                "kind": "restock"
            }),
        )
        .await;

    let approve = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/approve", first)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(approve.status(), 200);
    let body: Value = approve.json().await.unwrap();
    assert_eq!(body["data"]["status"], "dispatched");

    let inventory: Value = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inventory["data"][0]["quantity"], 30);
    assert_eq!(inventory["data"][0]["status"], "In Stock");

    // Second identical restock: 30 -> 10, Low Stock boundary
    let second = fixture
        .create_resource(
            &volunteer,
            json!({
                "items": [{ "itemCategory": "rice", "quantity": "20" }],
                "kind": "restock"
            }),
        )
        .await;
    fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/approve", second)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();

    let inventory: Value = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inventory["data"][0]["quantity"], 10);

    // Third restock of 20 against 10 in stock clamps at zero
    let third = fixture
        .create_resource(
            &volunteer,
            json!({
                "items": [{ "itemCategory": "RICE", "quantity": "20" }],
                "kind": "restock"
            }),
        )
        .await;
    fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/approve", third)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();

    let inventory: Value = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inventory["data"][0]["quantity"], 0);
    assert_eq!(inventory["data"][0]["status"], "Out of Stock");
}

#[tokio::test]
async fn test_reject_then_approve_conflicts() {
    let fixture = TestFixture::new().await;
    let (_, volunteer) = fixture
        .register("Vol", "vol10@example.com", "volunteer")
        .await;

    let request_id = fixture
        .create_resource(
            &volunteer,
            json!({
                "items": [{ "itemCategory": "Rice", "quantity": "20" }],
                "kind": "restock"
            }),
        )
        .await;

    // Non-admin cannot reject or approve
    let forbidden = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/approve", request_id)))
        .bearer_auth(&volunteer)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let reject = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/reject", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(reject.status(), 200);
    let body: Value = reject.json().await.unwrap();
    assert_eq!(body["data"]["status"], "rejected");

    // Approving a rejected request must not silently double-process
    let approve = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/approve", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(approve.status(), 409);

    // Rejecting twice conflicts as well
    let again = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/reject", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);
}

#[tokio::test]
async fn test_absorb_donation_creates_missing_line() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v11@example.com", "victim")
        .await;
    let (_, donor) = fixture
        .register("Donor", "d11@example.com", "donor")
        .await;

    let request_id = fixture
        .create_resource(
            &victim,
            json!({ "items": [{ "itemCategory": "Blankets", "quantity": "5" }] }),
        )
        .await;

    // Absorbing before fulfillment conflicts
    let early = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/absorb", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(early.status(), 409);

    fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/fulfill", request_id)))
        .bearer_auth(&donor)
        .send()
        .await
        .unwrap();

    let absorb = fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/absorb", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(absorb.status(), 200);
    let body: Value = absorb.json().await.unwrap();
    assert_eq!(body["data"]["status"], "delivered");

    // A new line was created: quantity 5, category Other, Low Stock
    let inventory: Value = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let item = &inventory["data"][0];
    assert_eq!(item["itemName"], "Blankets");
    assert_eq!(item["quantity"], 5);
    assert_eq!(item["category"], "Other");
    assert_eq!(item["status"], "Low Stock");

    // The audit trail has the delivered record
    let history: Value = fixture
        .client
        .get(fixture.url("/api/resources/distribution-history"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["data"][0]["id"], request_id.as_str());
}

#[tokio::test]
async fn test_absorb_merges_case_insensitively() {
    let fixture = TestFixture::new().await;
    let (_, victim) = fixture
        .register("Victim", "v12@example.com", "victim")
        .await;
    let (_, donor) = fixture
        .register("Donor", "d12@example.com", "donor")
        .await;

    fixture.add_inventory("Blankets", "Clothing", 7).await;

    let request_id = fixture
        .create_resource(
            &victim,
            json!({ "items": [{ "itemCategory": "blankets", "quantity": "5" }] }),
        )
        .await;
    fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/fulfill", request_id)))
        .bearer_auth(&donor)
        .send()
        .await
        .unwrap();
    fixture
        .client
        .put(fixture.url(&format!("/api/resources/{}/absorb", request_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();

    let inventory: Value = fixture
        .client
        .get(fixture.url("/api/inventory"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = inventory["data"].as_array().unwrap();
    assert_eq!(items.len(), 1, "donation merged into the existing line");
    assert_eq!(items[0]["quantity"], 12);
    assert_eq!(items[0]["category"], "Clothing");
    assert_eq!(items[0]["status"], "In Stock");
}

// ==================== CONTACT ====================

#[tokio::test]
async fn test_contact_flow() {
    let fixture = TestFixture::new().await;

    // Public submission, no token
    let submit = fixture
        .client
        .post(fixture.url("/api/contact"))
        .json(&json!({
            "firstName": "Priya",
            "lastName": "Nair",
            "email": "priya@example.com",
            "message": "How can I help?"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status(), 200);
    let body: Value = submit.json().await.unwrap();
    let message_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["subject"], "General Inquiry");
    assert_eq!(body["data"]["status"], "new");

    // Missing required fields
    let invalid = fixture
        .client
        .post(fixture.url("/api/contact"))
        .json(&json!({ "firstName": "", "email": "", "message": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), 400);

    // Listing requires admin
    let anonymous = fixture
        .client
        .get(fixture.url("/api/contact"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    let list = fixture
        .client
        .get(fixture.url("/api/contact"))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(list.status(), 200);
    let body: Value = list.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Status triage
    let update = fixture
        .client
        .put(fixture.url(&format!("/api/contact/{}/status", message_id)))
        .bearer_auth(TEST_ADMIN_TOKEN)
        .json(&json!({ "status": "read" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), 200);
    let body: Value = update.json().await.unwrap();
    assert_eq!(body["data"]["status"], "read");
}
