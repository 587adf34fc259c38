mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD};
use stockroom::config::RecoveryDelivery;

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Login ────────────────────────────────────────

#[tokio::test]
async fn first_account_bootstraps_with_lowercased_role() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .register(
            None,
            &json!({ "email": "a@b.com", "password": "secret1", "name": "Ana", "role": "Admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "admin");
    assert!(body.get("password_hash").is_none());

    let stored: String = sqlx::query_scalar("SELECT role FROM users WHERE email = 'a@b.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, "admin");

    let (login, status) = app.login("a@b.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["role"], "admin");
    assert_eq!(login["token_type"], "bearer");

    let token = login["access_token"].as_str().unwrap();
    let (verify, status) = app.get_auth("/api/v1/auth/verify", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify["valid"], true);
    assert_eq!(verify["sub"], "a@b.com");
    assert_eq!(verify["role"], "admin");

    common::cleanup(app).await;
}

#[tokio::test]
async fn later_registrations_need_an_admin() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, branch_token) = app.create_user(&admin, "branch@test.com", "Sucursal").await;

    let new_user = json!({ "email": "x@test.com", "password": "secret1", "name": "X" });

    let (_, status) = app.register(None, &new_user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.register(Some(&branch_token), &new_user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app.register(Some(&admin), &new_user).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "branch");

    let (_, status) = app.register(Some(&admin), &new_user).await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_validates_input() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .register(None, &json!({ "email": "a@b.com", "password": "abc", "name": "A" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .register(
            None,
            &json!({ "email": "a@b.com", "password": "secret1", "name": "A", "role": "manager" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn failed_login_is_logged_without_user() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.login(ADMIN_EMAIL, "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (user_id, detail): (Option<i64>, Option<String>) = sqlx::query_as(
        "SELECT user_id, detail FROM connection_logs WHERE event = 'login_failed'",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(user_id, None);
    assert_eq!(detail.as_deref(), Some("email=admin@test.com"));

    let (_, status) = app.login("nobody@test.com", ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn successful_login_is_logged_and_listed_for_admins() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, branch_token) = app.create_user(&admin, "branch@test.com", "branch").await;

    let (logs, status) = app.get_auth("/api/v1/logs?limit=10", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert!(!logs.is_empty());
    assert_eq!(logs[0]["event"], "login_success");

    let (_, status) = app.get_auth("/api/v1/logs", &branch_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn inactive_account_cannot_login() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (user_id, _) = app.create_user(&admin, "w@test.com", "warehouse").await;

    let (body, status) = app
        .put_auth(&format!("/api/v1/users/{user_id}"), &admin, &json!({ "active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (_, status) = app.login("w@test.com", "secret123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn repeated_failures_are_rate_limited() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    for _ in 0..5 {
        let (_, status) = app.login(ADMIN_EMAIL, "wrongpassword").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (_, status) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    common::cleanup(app).await;
}

// ── Guard ───────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_role_is_forbidden_bad_token_is_unauthorized() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, branch_token) = app.create_user(&admin, "branch@test.com", "branch").await;
    let product = json!({ "name": "Hammer", "sku": "H-1", "price": 5.0, "quantity": 1 });

    let (body, status) = app.post_auth("/api/v1/products", &branch_token, &product).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("branch"));

    let (_, status) = app.post_auth("/api/v1/products", "not-a-token", &product).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let resp = app
        .client
        .get(app.url("/api/v1/products"))
        .header("authorization", format!("bearer {admin}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.client.get(app.url("/api/v1/products")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/products", &branch_token).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_issues_a_working_token() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (body, status) = app.post_auth("/api/v1/auth/refresh", &admin, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    let fresh = body["access_token"].as_str().unwrap();

    let (_, status) = app.get_auth("/api/v1/users/me", fresh).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_auth("/api/v1/auth/refresh", "garbage", &json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Users ───────────────────────────────────────────────────────

#[tokio::test]
async fn users_edit_themselves_admins_edit_anyone() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (branch_id, branch_token) = app.create_user(&admin, "branch@test.com", "branch").await;
    let (warehouse_id, _) = app.create_user(&admin, "w@test.com", "warehouse").await;

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/users/{branch_id}"),
            &branch_token,
            &json!({ "name": "Renamed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/users/{warehouse_id}"),
            &branch_token,
            &json!({ "name": "Nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/users/{branch_id}"),
            &branch_token,
            &json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/users/{branch_id}"),
            &admin,
            &json!({ "role": "Bodega" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "warehouse");

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/users/{branch_id}"),
            &admin,
            &json!({ "email": "w@test.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let path = format!("/api/v1/users/{warehouse_id}");
    let (body, status) = app.put_auth(&path, &admin, &json!({ "branch_id": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["branch_id"], 1);

    let (body, status) = app.put_auth(&path, &admin, &json!({ "name": "Kept" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["branch_id"], 1);

    let (body, status) = app.put_auth(&path, &admin, &json!({ "branch_id": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["branch_id"].is_null());

    let (users, status) = app.get_auth("/api/v1/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);

    common::cleanup(app).await;
}

#[tokio::test]
async fn change_password_checks_current_password() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &admin,
            &json!({ "current_password": "wrong-one", "new_password": "newpass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &admin,
            &json!({ "current_password": ADMIN_PASSWORD, "new_password": "newpass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.login(ADMIN_EMAIL, "newpass1").await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_can_reset_a_password() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    app.create_user(&admin, "w@test.com", "warehouse").await;

    let (_, status) = app
        .post_auth(
            "/api/v1/users/reset-password",
            &admin,
            &json!({ "email": "w@test.com", "new_password": "reset123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.login("w@test.com", "reset123").await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_auth(
            "/api/v1/users/reset-password",
            &admin,
            &json!({ "email": "ghost@test.com", "new_password": "reset123" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Recovery ────────────────────────────────────────────────────

#[tokio::test]
async fn recovery_code_resets_password_once() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app
        .post_json("/api/v1/auth/recovery/request", &json!({ "email": ADMIN_EMAIL }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let (body, status) = app
        .post_json(
            "/api/v1/auth/recovery/validate",
            &json!({ "email": ADMIN_EMAIL, "code": wrong }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Incorrect"));

    let (_, status) = app
        .post_json(
            "/api/v1/auth/recovery/validate",
            &json!({ "email": ADMIN_EMAIL, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_json(
            "/api/v1/auth/recovery/reset",
            &json!({ "email": ADMIN_EMAIL, "code": code, "new_password": "recovered1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.login(ADMIN_EMAIL, "recovered1").await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_json(
            "/api/v1/auth/recovery/validate",
            &json!({ "email": ADMIN_EMAIL, "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No active"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn expired_recovery_code_leaves_password_unchanged() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, _) = app
        .post_json("/api/v1/auth/recovery/request", &json!({ "email": ADMIN_EMAIL }))
        .await;
    let code = body["code"].as_str().unwrap().to_string();

    // Issued eleven minutes ago.
    sqlx::query(
        "UPDATE users SET recovery_expires_at = now() - interval '1 minute' WHERE email = $1",
    )
    .bind(ADMIN_EMAIL)
    .execute(&app.pool)
    .await
    .unwrap();

    let (body, status) = app
        .post_json(
            "/api/v1/auth/recovery/reset",
            &json!({ "email": ADMIN_EMAIL, "code": code, "new_password": "too-late1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expired"));

    let (_, status) = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn recovery_for_unknown_email_is_not_found() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .post_json("/api/v1/auth/recovery/request", &json!({ "email": "ghost@test.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn email_recovery_without_smtp_stores_no_code() {
    let app = common::spawn_app_with(|config| {
        config.recovery_delivery = RecoveryDelivery::Email;
        config.smtp = None;
    })
    .await;
    app.bootstrap().await;

    let (body, status) = app
        .post_json("/api/v1/auth/recovery/request", &json!({ "email": ADMIN_EMAIL }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("code").is_none());

    let stored: Option<String> =
        sqlx::query_scalar("SELECT recovery_code FROM users WHERE email = $1")
            .bind(ADMIN_EMAIL)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(stored.is_none());

    common::cleanup(app).await;
}

// ── Products & Branches ─────────────────────────────────────────

#[tokio::test]
async fn products_crud() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, warehouse) = app.create_user(&admin, "w@test.com", "warehouse").await;

    let product = app.create_product(&warehouse, "SKU-1", 3).await;
    let id = product["id"].as_i64().unwrap();
    assert_eq!(product["status"], "active");
    assert_eq!(product["tax_rate"], 19.0);

    let (_, status) = app
        .post_auth(
            "/api/v1/products",
            &warehouse,
            &json!({ "name": "Dup", "sku": "SKU-1", "price": 1.0, "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/products/{id}"),
            &warehouse,
            &json!({ "quantity": 42 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 42);
    assert_eq!(body["sku"], "SKU-1");

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/products/{id}"),
            &warehouse,
            &json!({ "id": 99 }),
        )
        .await;
    assert!(status.is_client_error());

    let (recent, status) = app.get_auth("/api/v1/products/recent", &warehouse).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 1);

    let (schema, status) = app.get_auth("/api/v1/products/schema", &warehouse).await;
    assert_eq!(status, StatusCode::OK);
    assert!(schema.as_array().unwrap().iter().any(|c| c["name"] == "sku"));

    let (_, status) = app.delete_auth(&format!("/api/v1/products/{id}"), &warehouse).await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.get_auth(&format!("/api/v1/products/{id}"), &warehouse).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn branches_crud_and_inventory() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (branch, status) = app
        .post_auth(
            "/api/v1/branches",
            &admin,
            &json!({ "name": "North", "city": "Valparaíso" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let branch_id = branch["id"].as_i64().unwrap();
    assert_eq!(branch["status"], "active");

    let (_, status) = app
        .post_auth("/api/v1/branches", &admin, &json!({ "name": "North" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/branches/{branch_id}"),
            &admin,
            &json!({ "status": "closed" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_auth(
            "/api/v1/products",
            &admin,
            &json!({ "name": "Saw", "sku": "SAW", "price": 9.0, "quantity": 2, "branch_id": branch_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (inventory, status) = app
        .get_auth(&format!("/api/v1/branches/{branch_id}/inventory"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory["total_products"], 1);
    assert_eq!(inventory["inventory"][0]["sku"], "SAW");

    let (_, status) = app
        .delete_auth(&format!("/api/v1/branches/{branch_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (empty, _) = app
        .post_auth("/api/v1/branches", &admin, &json!({ "name": "South" }))
        .await;
    let (_, status) = app
        .delete_auth(&format!("/api/v1/branches/{}", empty["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn dashboard_metrics() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    app.create_product(&admin, "LOW", 2).await;
    app.create_product(&admin, "HIGH", 50).await;

    let (metrics, status) = app.get_auth("/api/v1/dashboard/metrics", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["low_stock"], 1);
    assert_eq!(metrics["total_products"], 2);
    assert_eq!(metrics["new_products"], 2);
    assert_eq!(metrics["active_branches"], 1);

    let (categories, _) = app.get_auth("/api/v1/dashboard/categories", &admin).await;
    assert_eq!(categories[0]["category"], "Tools");
    assert_eq!(categories[0]["count"], 2);

    let (branches, _) = app.get_auth("/api/v1/dashboard/branches/active", &admin).await;
    assert_eq!(branches[0]["name"], "Main");

    common::cleanup(app).await;
}

// ── Import / Export ─────────────────────────────────────────────

#[tokio::test]
async fn empty_export_is_a_valid_file() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (csv, status) = app.get_text("/api/v1/reports/export?format=csv", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        csv.trim_end(),
        "ID,Name,Classification,Type,Status,Tax,SKU,Brand,Price,Quantity,BranchID,CreationDate,\
         UnitNetCost,TotalNetCost,ReceivingDoc"
    );

    let (txt, status) = app.get_text("/api/v1/reports/export?format=txt", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(txt.trim_end(), "No products registered.");

    common::cleanup(app).await;
}

#[tokio::test]
async fn export_then_import_updates_every_row() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    for sku in ["A-1", "A-2"] {
        app.create_product(&admin, sku, 7).await;
    }
    let (costed, status) = app
        .post_auth(
            "/api/v1/products",
            &admin,
            &json!({
                "name": "Costed",
                "sku": "A-3",
                "price": 20.0,
                "quantity": 2,
                "brand": "Acme",
                "branch_id": 1,
                "unit_net_cost": 3.5,
                "total_net_cost": 7.0,
                "receiving_doc": "DOC-9",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{costed}");

    let (csv, status) = app.get_text("/api/v1/reports/export", &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (summary, status) = app.import_file(&admin, "products.csv", csv.as_bytes()).await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["inserted"], 0);
    assert_eq!(summary["updated"], 3);
    assert_eq!(summary["rejected"], 0);

    let (after, status) = app
        .get_auth(&format!("/api/v1/products/{}", costed["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["unit_net_cost"], 3.5);
    assert_eq!(after["total_net_cost"], 7.0);
    assert_eq!(after["receiving_doc"], "DOC-9");
    assert_eq!(after["brand"], "Acme");
    assert_eq!(after["quantity"], 2);

    let (txt, _) = app.get_text("/api/v1/reports/export?format=txt", &admin).await;
    assert_eq!(txt.lines().count(), 3);
    assert!(txt.starts_with("ID: "));

    common::cleanup(app).await;
}

#[tokio::test]
async fn import_rejects_bad_rows_and_keeps_good_ones() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, warehouse) = app.create_user(&admin, "w@test.com", "warehouse").await;

    let csv = "SKU,Name,Price,Quantity\n\
               N-1,Nail,0.1,1000\n\
               ,Nameless,1,1\n\
               N-2,Screw,0.2,500\n";
    let (summary, status) = app.import_file(&warehouse, "STOCK.CSV", csv.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["inserted"], 2);
    assert_eq!(summary["rejected"], 1);
    assert_eq!(summary["errors"][0]["line"], 3);

    let legacy = "codigo_sku,precio,cantidad\nSKU1,100,abc\n";
    let (summary, status) = app.import_file(&warehouse, "legacy.csv", legacy.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["inserted"], 0);
    assert_eq!(summary["updated"], 0);
    assert_eq!(summary["rejected"], 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE sku = 'SKU1'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn import_rejects_unsupported_files() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (_, branch_token) = app.create_user(&admin, "branch@test.com", "branch").await;

    let (_, status) = app.import_file(&admin, "stock.txt", b"SKU\nA\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (body, status) = app.import_file(&admin, "stock.csv", b"Name,Price\nA,1\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("SKU"));

    let (body, status) = app
        .import_file(&admin, "stock.csv", b"SKU,codigo_sku\nA,B\n")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("codigo_sku"));

    let (_, status) = app.import_file(&branch_token, "stock.csv", b"SKU\nA\n").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn latin1_row_does_not_sink_the_import() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let mut csv = b"SKU,Name,Price,Quantity\nL-1,Tornillo,1,10\nL-2,Tuerca ".to_vec();
    csv.extend_from_slice(&[0xF1, 0xE1]);
    csv.extend_from_slice(b",1,5\nL-3,Arandela,1,7\n");

    let (summary, status) = app.import_file(&admin, "latin1.csv", &csv).await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["inserted"], 2);
    assert_eq!(summary["rejected"], 1);
    assert_eq!(summary["errors"][0]["line"], 3);
    assert_eq!(summary["errors"][0]["sku"], "L-2");

    let skus: Vec<String> = sqlx::query_scalar("SELECT sku FROM products ORDER BY sku")
        .fetch_all(&app.pool)
        .await
        .unwrap();
    assert_eq!(skus, vec!["L-1".to_string(), "L-3".to_string()]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = common::spawn_app_with(|config| config.max_upload_size = 64).await;
    let admin = app.bootstrap().await;

    let mut csv = String::from("SKU,Name\n");
    for i in 0..50 {
        csv.push_str(&format!("S-{i},Item {i}\n"));
    }
    let (_, status) = app.import_file(&admin, "big.csv", csv.as_bytes()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    common::cleanup(app).await;
}
