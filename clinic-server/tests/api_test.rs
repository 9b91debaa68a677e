mod common;

use clinic_server::db::repository::{permission, role, user};
use clinic_server::normalize_route;
use clinic_server::rbac::seed_defaults;
use clinic_server::routes::ROUTE_MANIFEST;
use common::{TestApp, token_for};
use http::{Method, StatusCode};
use serde_json::json;
use shared::models::{HttpMethod, LegacyRole, RoleCreate, permission_token};

fn to_method(method: HttpMethod) -> Method {
    Method::from_bytes(method.as_str().as_bytes()).unwrap()
}

async fn seeded() -> TestApp {
    let app = TestApp::new().await;
    seed_defaults(app.pool(), &ROUTE_MANIFEST.routes())
        .await
        .unwrap();
    app
}

async fn role_id(app: &TestApp, name: &str) -> i64 {
    role::find_by_name(app.pool(), name).await.unwrap().unwrap().id
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = app
        .send(Method::GET, "/api/roles", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_every_manifest_route_is_gated() {
    let app = TestApp::new().await;
    let (_, token) = app.user("nobody", LegacyRole::Doctor, vec![]).await;

    for entry in ROUTE_MANIFEST.entries() {
        let uri = entry.pattern.replace("{id}", "1");
        for &method in entry.methods {
            let body = (method != HttpMethod::Get).then(|| json!({}));
            let (status, json) = app.send(to_method(method), &uri, Some(&token), body).await;
            assert_eq!(
                status,
                StatusCode::FORBIDDEN,
                "{method} {uri} should be denied"
            );
            assert_eq!(
                json["details"]["required_permission"],
                permission_token(&normalize_route(entry.pattern), method)
            );
            assert_eq!(json["message"], "user does not have required permission");
        }
    }
}

#[tokio::test]
async fn test_super_admin_seeds_and_lists_permissions() {
    let app = TestApp::new().await;
    let (_, token) = app.user("root", LegacyRole::SuperAdmin, vec![]).await;

    let (status, body) = app
        .send(Method::POST, "/api/rbac/seed", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["roles_created"].as_array().unwrap().len(), 4);

    let expected: usize = ROUTE_MANIFEST
        .routes()
        .iter()
        .map(|r| r.methods.len())
        .sum();
    let (status, body) = app
        .send(Method::GET, "/api/permissions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), expected);

    let (_, body) = app
        .send(Method::GET, "/api/permissions?category=profile", Some(&token), None)
        .await;
    let profile = body["data"].as_array().unwrap();
    assert_eq!(profile.len(), 1);
    assert_eq!(profile[0]["route"], "/api/access/me");

    // Seeding again changes nothing
    let (_, body) = app
        .send(Method::POST, "/api/rbac/seed", Some(&token), None)
        .await;
    assert_eq!(body["data"]["roles_created"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["permissions"]["created"], 0);
}

#[tokio::test]
async fn test_role_grants_only_its_routes() {
    let app = seeded().await;
    let client = role_id(&app, "Client").await;
    let (user_id, token) = app.user("patient", LegacyRole::Client, vec![client]).await;

    let (status, body) = app
        .send(Method::GET, "/api/access/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["roles"], json!(["client", "Client"]));
    assert_eq!(body["data"]["permissions"], json!(["/api/access/me:GET"]));
    assert_eq!(body["data"]["is_super_admin"], false);

    let (status, body) = app.send(Method::GET, "/api/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["details"]["required_permission"], "/api/roles:GET");
}

#[tokio::test]
async fn test_administrator_role_reaches_admin_api() {
    let app = seeded().await;
    let admin = role_id(&app, "Administrator").await;
    let (_, token) = app.user("office", LegacyRole::Doctor, vec![admin]).await;

    let (status, body) = app.send(Method::GET, "/api/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (status, _) = app
        .send(Method::GET, &format!("/api/roles/{admin}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, "/api/roles/9999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3101);
}

#[tokio::test]
async fn test_deactivated_permission_denies_immediately() {
    let app = seeded().await;
    let admin = role_id(&app, "Administrator").await;
    let (_, token) = app.user("office", LegacyRole::Admin, vec![admin]).await;

    let list_roles = permission::find_by_route_method(app.pool(), "/api/roles", HttpMethod::Get)
        .await
        .unwrap()
        .unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/permissions/{}/active", list_roles.id),
            Some(&token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = app.send(Method::GET, "/api/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_delete_policy_over_http() {
    let app = TestApp::new().await;
    let (_, root) = app.user("root", LegacyRole::SuperAdmin, vec![]).await;
    let (staff_id, _) = app.user("nurse", LegacyRole::Doctor, vec![]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/roles",
            Some(&root),
            Some(json!({ "name": "Night Shift", "description": "after hours" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let night = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/roles",
            Some(&root),
            Some(json!({ "name": "Night Shift" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{staff_id}/roles"),
            Some(&root),
            Some(json!({ "role_ids": [night] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_ids"], json!([night]));

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/roles/{night}"), Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3103);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/roles/{night}?force=true"),
            Some(&root),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(Method::GET, &format!("/api/users/{staff_id}"), Some(&root), None)
        .await;
    assert_eq!(body["data"]["role_ids"], json!([]));
}

#[tokio::test]
async fn test_system_role_cannot_be_deleted_or_renamed() {
    let app = seeded().await;
    let (_, root) = app.user("root", LegacyRole::SuperAdmin, vec![]).await;
    let front_desk = role_id(&app, "FrontDesk").await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/roles/{front_desk}"), Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3104);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/roles/{front_desk}"),
            Some(&root),
            Some(json!({ "name": "Reception" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/roles/{front_desk}"),
            Some(&root),
            Some(json!({ "description": "Reception desk" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Reception desk");

    // 原样回传名称和启用状态不算改名
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/roles/{front_desk}"),
            Some(&root),
            Some(json!({ "name": " FrontDesk ", "is_active": true, "description": "Front desk" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "FrontDesk");
    assert_eq!(body["data"]["description"], "Front desk");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/roles/{front_desk}"),
            Some(&root),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3104);
}

#[tokio::test]
async fn test_admin_check_endpoint() {
    let app = seeded().await;
    let custom = role::create(
        app.pool(),
        RoleCreate {
            name: "Auditor".into(),
            description: None,
            permission_ids: vec![],
        },
    )
    .await
    .unwrap();
    let (auditor_id, auditor_token) = app
        .user("auditor", LegacyRole::Doctor, vec![custom.id])
        .await;
    let (_, admin_token) = app.user("console", LegacyRole::Admin, vec![]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/access/check",
            Some(&admin_token),
            Some(json!({ "user_id": auditor_id.to_string(), "route": "/api/roles/42?x=1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowed"], false);
    assert_eq!(body["data"]["required_permission"], "/api/roles/42:GET");
    assert_eq!(body["data"]["user_roles"], json!(["doctor", "Auditor"]));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/access/check",
            Some(&admin_token),
            Some(json!({ "user_id": "ghost", "route": "/api/roles" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reason"], "user not found");

    // Legacy admin only; role grants do not open this endpoint
    let (status, body) = app
        .send(
            Method::POST,
            "/api/access/check",
            Some(&auditor_token),
            Some(json!({ "user_id": "1", "route": "/" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
}

#[tokio::test]
async fn test_admin_check_uses_stored_legacy_role() {
    let app = seeded().await;
    let (former_id, former_token) = app.user("former_admin", LegacyRole::Admin, vec![]).await;
    let check = json!({ "user_id": former_id.to_string(), "route": "/api/roles" });

    let (status, _) = app
        .send(Method::POST, "/api/access/check", Some(&former_token), Some(check.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    user::set_legacy_role(app.pool(), former_id, LegacyRole::Client)
        .await
        .unwrap();

    // 令牌仍声明 admin，但数据库已降级
    let (status, body) = app
        .send(Method::POST, "/api/access/check", Some(&former_token), Some(check.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let ghost = token_for("999", "ghost", LegacyRole::Admin);
    let (status, body) = app
        .send(Method::POST, "/api/access/check", Some(&ghost), Some(check))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
}

#[tokio::test]
async fn test_filesystem_scan_and_route_listing() {
    let app = TestApp::new().await;
    let (_, root) = app.user("root", LegacyRole::SuperAdmin, vec![]).await;

    let tree = app.dir.path().join("app");
    std::fs::create_dir_all(tree.join("dashboard/patients/[id]")).unwrap();
    std::fs::create_dir_all(tree.join("api/patients")).unwrap();
    std::fs::write(
        tree.join("dashboard/patients/[id]/page.tsx"),
        "export default function Page() {}",
    )
    .unwrap();
    std::fs::write(
        tree.join("api/patients/route.ts"),
        "export async function GET() {}\nexport async function POST() {}",
    )
    .unwrap();

    let (status, body) = app
        .send(
            Method::GET,
            "/api/permissions/routes",
            Some(&root),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api"][0]["path"], "/api/patients");
    assert_eq!(body["data"]["api"][0]["methods"], json!(["GET", "POST"]));
    assert_eq!(body["data"]["patients"][0]["path"], "/dashboard/patients/:id");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/permissions/scan",
            Some(&root),
            Some(json!({ "source": "filesystem" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["routes"], 2);
    assert_eq!(body["data"]["created"], 3);

    let created = permission::find_by_route_method(
        app.pool(),
        "/dashboard/patients/:id",
        HttpMethod::Get,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(created.name, "Dashboard Patients Id (GET)");
}

#[tokio::test]
async fn test_filesystem_prune_keeps_admin_console_open() {
    let app = seeded().await;
    let admin = role_id(&app, "Administrator").await;
    let (_, token) = app.user("office", LegacyRole::Admin, vec![admin]).await;

    let tree = app.dir.path().join("app/dashboard/patients");
    std::fs::create_dir_all(&tree).unwrap();
    std::fs::write(tree.join("page.tsx"), "export default function Page() {}").unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/permissions/scan",
            Some(&token),
            Some(json!({ "source": "filesystem", "deactivate_stale": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 1);
    assert_eq!(body["data"]["deactivated"], 0);

    let (status, body) = app
        .send(Method::GET, "/api/permissions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["is_active"] == true)
    );
}

#[tokio::test]
async fn test_scan_without_route_tree_fails() {
    let app = TestApp::new().await;
    let (_, root) = app.user("root", LegacyRole::SuperAdmin, vec![]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/permissions/scan",
            Some(&root),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 2102);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/permissions/scan",
            Some(&root),
            Some(json!({ "source": "manifest" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["created"].as_u64().unwrap() > 0);
}
