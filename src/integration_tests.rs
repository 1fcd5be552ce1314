// ABOUTME: Integration tests for the REST API
// ABOUTME: Exercises request/response flows, status codes, and error bodies

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use serde_json::{Value, json};
    use serial_test::serial;
    use tempfile::TempDir;

    use crate::AppState;
    use crate::routes::api_router;
    use crate::storage::Storage;

    async fn create_test_app() -> (TestServer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        crate::uploads::ensure_upload_dirs(temp_dir.path()).await.unwrap();

        let storage = Storage::connect_in_memory().await.unwrap();
        storage.seed_default_tags().await.unwrap();

        let state = AppState {
            storage: Arc::new(storage),
            upload_dir: temp_dir.path().to_path_buf(),
        };

        let app = api_router(state);
        (TestServer::new(app).unwrap(), temp_dir)
    }

    async fn create_vehicle(server: &TestServer, vehicle_type: &str, make: &str, model: &str) -> i64 {
        let response = server
            .post("/api/vehicles")
            .json(&json!({
                "type": vehicle_type,
                "make": make,
                "model": model,
                "year": 2020,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_health_check() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_create_and_fetch() {
        let (server, _dir) = create_test_app().await;

        let id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server.get(&format!("/api/vehicles/{}", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["type"], "car");
        assert_eq!(body["make"], "Honda");
        assert_eq!(body["model"], "Civic");
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_create_validation() {
        let (server, _dir) = create_test_app().await;

        let response = server
            .post("/api/vehicles")
            .json(&json!({ "type": "car", "make": "", "model": "Civic" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Type, make, and model are required");
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_not_found_message() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/vehicles/999").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "Vehicle not found");
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicles_grouped_listing() {
        let (server, _dir) = create_test_app().await;

        create_vehicle(&server, "bike", "Trek", "FX 3").await;
        create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server.get("/api/vehicles").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["bike"].as_array().unwrap().len(), 1);
        assert_eq!(body["motorcycle"].as_array().unwrap().len(), 0);
        assert_eq!(body["car"].as_array().unwrap().len(), 1);
        assert_eq!(body["car"][0]["manual_count"], 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_patch_with_explicit_null() {
        let (server, _dir) = create_test_app().await;

        let id = create_vehicle(&server, "car", "Honda", "Civic").await;
        server
            .put(&format!("/api/vehicles/{}", id))
            .json(&json!({ "color": "red", "current_mileage": 10000 }))
            .await
            .assert_status_ok();

        // explicit null clears, omitted keeps
        let response = server
            .put(&format!("/api/vehicles/{}", id))
            .json(&json!({ "color": null }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["color"], Value::Null);
        assert_eq!(body["current_mileage"], 10000);
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_delete() {
        let (server, _dir) = create_test_app().await;

        let id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server.delete(&format!("/api/vehicles/{}", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Vehicle deleted successfully");

        server
            .get(&format!("/api/vehicles/{}", id))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicles_by_invalid_type() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/vehicles/type/boat").await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid vehicle type");
    }

    #[tokio::test]
    #[serial]
    async fn test_vehicle_search_requires_query() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/vehicles/search").await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        create_vehicle(&server, "car", "Honda", "Civic").await;
        let response = server.get("/api/vehicles/search").add_query_param("q", "civ").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_maintenance_log_lifecycle() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/maintenance/vehicle/{}", vehicle_id))
            .json(&json!({
                "date": "2024-05-01",
                "description": "Oil Change",
                "mileage": 42000,
                "cost": 59.99,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let log: Value = response.json();
        assert_eq!(log["description"], "Oil Change");
        assert_eq!(log["make"], "Honda");
        assert_eq!(log["tags"], json!([]));
        let log_id = log["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/maintenance/{}", log_id))
            .json(&json!({ "cost": null }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["cost"], Value::Null);

        let response = server.delete(&format!("/api/maintenance/{}", log_id)).await;
        response.assert_status_ok();

        let response = server.get(&format!("/api/maintenance/{}", log_id)).await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Maintenance log not found");
    }

    #[tokio::test]
    #[serial]
    async fn test_maintenance_requires_date_and_description() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/maintenance/vehicle/{}", vehicle_id))
            .json(&json!({ "description": "Oil Change" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Date and description are required"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_maintenance_for_missing_vehicle() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/maintenance/vehicle/999").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Vehicle not found");
    }

    #[tokio::test]
    #[serial]
    async fn test_date_range_requires_both_bounds() {
        let (server, _dir) = create_test_app().await;

        let response = server
            .get("/api/maintenance/date-range")
            .add_query_param("start_date", "2024-01-01")
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Start date and end date required"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_duplicate_tag_conflicts() {
        let (server, _dir) = create_test_app().await;

        let response = server
            .post("/api/maintenance/tags")
            .json(&json!({ "name": "Detailing" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/maintenance/tags")
            .json(&json!({ "name": "Detailing" }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "Tag name already exists");
    }

    #[tokio::test]
    #[serial]
    async fn test_tag_listing_includes_seeded_set() {
        let (server, _dir) = create_test_app().await;

        let response = server.get("/api/maintenance/tags").await;
        response.assert_status_ok();
        let tags: Value = response.json();
        assert_eq!(tags.as_array().unwrap().len(), 10);
        assert!(tags.as_array().unwrap().iter().any(|t| t["name"] == "Oil Change"));
    }

    #[tokio::test]
    #[serial]
    async fn test_quick_add() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "motorcycle", "Yamaha", "MT-07").await;

        let response = server
            .post(&format!("/api/maintenance/vehicle/{}/quick-add", vehicle_id))
            .json(&json!({ "type": "oil-change", "mileage": 9000 }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let log: Value = response.json();
        assert_eq!(log["description"], "Oil Change");
        assert_eq!(log["mileage"], 9000);
        assert_eq!(log["tags"][0]["name"], "Oil Change");

        let response = server
            .post(&format!("/api/maintenance/vehicle/{}/quick-add", vehicle_id))
            .json(&json!({ "type": "engine-swap" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid maintenance type");
    }

    #[tokio::test]
    #[serial]
    async fn test_cost_summary_endpoint() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;
        for (date, cost) in [("2024-01-01", json!(10.0)), ("2024-02-01", Value::Null)] {
            server
                .post(&format!("/api/maintenance/vehicle/{}", vehicle_id))
                .json(&json!({ "date": date, "description": "Service", "cost": cost }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = server.get("/api/maintenance/cost-summary").await;
        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["total_logs"], 2);
        assert_eq!(summary["total_cost"], 10.0);
    }

    #[tokio::test]
    #[serial]
    async fn test_last_oil_change_endpoint() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .get(&format!("/api/maintenance/vehicle/{}/last-oil-change", vehicle_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), Value::Null);

        server
            .post(&format!("/api/maintenance/vehicle/{}", vehicle_id))
            .json(&json!({ "date": "2024-05-01", "description": "Oil change" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .get(&format!("/api/maintenance/vehicle/{}/last-oil-change", vehicle_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["date"], "2024-05-01");
    }

    #[tokio::test]
    #[serial]
    async fn test_oil_status_report() {
        let (server, _dir) = create_test_app().await;

        // bikes never appear in the report
        create_vehicle(&server, "bike", "Trek", "FX 3").await;

        let response = server
            .post("/api/vehicles")
            .json(&json!({
                "type": "car",
                "make": "Honda",
                "model": "Civic",
                "current_mileage": 42000,
                "oil_change_interval_miles": 3000,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let car_id = response.json::<Value>()["id"].as_i64().unwrap();

        let today = chrono::Local::now().date_naive();
        server
            .post(&format!("/api/maintenance/vehicle/{}", car_id))
            .json(&json!({
                "date": today.to_string(),
                "description": "Oil change",
                "mileage": 42000,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server.get("/api/vehicles/oil-status").await;
        response.assert_status_ok();
        let report: Value = response.json();
        let entries = report.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["vehicle_id"], car_id);
        assert_eq!(entries[0]["status"], "ok");
        assert_eq!(entries[0]["next_due_miles"], 45000);
        assert_eq!(entries[0]["miles_remaining"], 3000);
    }

    #[tokio::test]
    #[serial]
    async fn test_manual_upload_and_delete() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/manuals/vehicle/{}", vehicle_id))
            .multipart(
                axum_test::multipart::MultipartForm::new()
                    .add_text("title", "Owner's Manual")
                    .add_part(
                        "manual",
                        axum_test::multipart::Part::bytes(b"%PDF-1.4 test".to_vec())
                            .file_name("owners.pdf")
                            .mime_type("application/pdf"),
                    ),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let manual: Value = response.json();
        assert_eq!(manual["title"], "Owner's Manual");
        assert!(manual["file_path"]
            .as_str()
            .unwrap()
            .starts_with("/uploads/manuals/"));
        let manual_id = manual["id"].as_i64().unwrap();

        let response = server.delete(&format!("/api/manuals/{}", manual_id)).await;
        response.assert_status_ok();

        server
            .get(&format!("/api/manuals/{}", manual_id))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_manual_upload_requires_file() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/manuals/vehicle/{}", vehicle_id))
            .multipart(axum_test::multipart::MultipartForm::new().add_text("title", "No file"))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Manual file required");
    }

    #[tokio::test]
    #[serial]
    async fn test_youtube_video_from_url() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/videos/vehicle/{}/youtube", vehicle_id))
            .multipart(
                axum_test::multipart::MultipartForm::new()
                    .add_text("title", "Brake job")
                    .add_text("youtube_url", "https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let video: Value = response.json();
        assert_eq!(video["type"], "youtube");
        assert_eq!(
            video["path_or_url"],
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(
            video["thumbnail_path"],
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_youtube_video_rejects_bad_url() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;

        let response = server
            .post(&format!("/api/videos/vehicle/{}/youtube", vehicle_id))
            .multipart(
                axum_test::multipart::MultipartForm::new()
                    .add_text("youtube_url", "https://example.com/not-youtube"),
            )
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid YouTube URL");
    }

    #[tokio::test]
    #[serial]
    async fn test_recent_listings_respect_limit() {
        let (server, _dir) = create_test_app().await;

        let vehicle_id = create_vehicle(&server, "car", "Honda", "Civic").await;
        for day in ["2024-01-01", "2024-02-01", "2024-03-01"] {
            server
                .post(&format!("/api/maintenance/vehicle/{}", vehicle_id))
                .json(&json!({ "date": day, "description": "Service" }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = server
            .get("/api/maintenance/recent")
            .add_query_param("limit", "2")
            .await;
        response.assert_status_ok();
        let logs = response.json::<Value>();
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["date"], "2024-03-01");
    }
}
