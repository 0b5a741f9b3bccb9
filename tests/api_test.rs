mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{get_request, json_request, read_json, test_state};
use school_backend::build_router;

fn app() -> Router {
    build_router(test_state())
}

async fn send(app: &Router, request: axum::http::Request<axum::body::Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

fn school_payload(admin_email: &str) -> Value {
    json!({
        "name": "Colégio Central",
        "email": "contato@central.edu.br",
        "principalName": "Dona Marta",
        "settings": {
            "academicYearStart": "2026-02-01",
            "academicYearEnd": "2026-12-15",
            "timezone": "America/Sao_Paulo"
        },
        "adminName": "Admin Central",
        "adminEmail": admin_email,
        "adminPassword": "senha123"
    })
}

/// Cadastra uma escola e devolve (schoolId, token do administrador).
async fn register_school(app: &Router, admin_email: &str) -> (String, String) {
    let response = send(app, json_request("POST", "/api/schools", None, school_payload(admin_email))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    let school_id = body["school"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["admin"]["tenantId"], json!(school_id));
    assert_eq!(body["admin"]["role"], json!("tenant_admin"));
    (school_id, body["token"].as_str().unwrap().to_string())
}

/// Cadastro público de um professor na escola; devolve o token dele.
async fn register_teacher(app: &Router, school_id: &str, email: &str) -> (String, String) {
    let payload = json!({
        "email": email,
        "password": "senha123",
        "name": "Prof. Ana",
        "role": "teacher",
        "tenantId": school_id
    });
    let response = send(app, json_request("POST", "/api/auth/register", None, payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_reports_the_store() {
    let app = app();
    let response = send(&app, get_request("/api/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn school_registration_returns_a_working_token() {
    let app = app();
    let (school_id, token) = register_school(&app, "admin@central.edu.br").await;

    let me = send(&app, get_request("/api/users/me", Some(&token))).await;
    assert_eq!(me.status(), StatusCode::OK);
    let body = read_json(me).await;
    assert_eq!(body["email"], "admin@central.edu.br");
    assert_eq!(body["tenantId"], json!(school_id));

    let school = send(&app, get_request("/api/schools/current", Some(&token))).await;
    assert_eq!(school.status(), StatusCode::OK);
    assert_eq!(read_json(school).await["adminUserId"], body["id"]);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();

    let response = send(&app, get_request("/api/users/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["code"], "invalid_token");

    let response = send(&app, get_request("/api/audit-logs", Some("nao-e-um-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_and_duplicate_email() {
    let app = app();
    register_school(&app, "admin@central.edu.br").await;

    let login = json!({ "email": "admin@central.edu.br", "password": "senha123" });
    let response = send(&app, json_request("POST", "/api/auth/login", None, login)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(read_json(response).await["token"].is_string());

    let wrong = json!({ "email": "admin@central.edu.br", "password": "errada123" });
    let response = send(&app, json_request("POST", "/api/auth/login", None, wrong)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Mesmo e-mail numa segunda escola
    let response = send(
        &app,
        json_request("POST", "/api/schools", None, school_payload("admin@central.edu.br")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn public_sign_up_needs_an_existing_school_and_no_admin_role() {
    let app = app();
    let (school_id, _) = register_school(&app, "admin@central.edu.br").await;

    let ghost = json!({
        "email": "prof@central.edu.br", "password": "senha123", "name": "Prof",
        "role": "teacher", "tenantId": "school_inexistente"
    });
    let response = send(&app, json_request("POST", "/api/auth/register", None, ghost)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let admin = json!({
        "email": "outro@central.edu.br", "password": "senha123", "name": "Outro",
        "role": "tenant_admin", "tenantId": school_id
    });
    let response = send(&app, json_request("POST", "/api/auth/register", None, admin)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let invalid = json!({
        "email": "sem-arroba", "password": "123", "name": "",
        "role": "teacher", "tenantId": school_id
    });
    let response = send(&app, json_request("POST", "/api/auth/register", None, invalid)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "validation");
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn records_follow_role_permissions() {
    let app = app();
    let (school_id, admin) = register_school(&app, "admin@central.edu.br").await;
    let (_, teacher) = register_teacher(&app, &school_id, "prof@central.edu.br").await;

    // Administrador cria turma e aluno
    let response = send(
        &app,
        json_request("POST", "/api/records/classes", Some(&admin), json!({ "name": "9º A" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let class = read_json(response).await;
    let class_id = class["id"].as_str().unwrap().to_string();
    assert_eq!(class["tenantId"], json!(school_id));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/records/students",
            Some(&admin),
            json!({ "name": "Bia", "classId": class_id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let student_id = read_json(response).await["id"].as_str().unwrap().to_string();

    // Professor lê alunos da turma...
    let response = send(
        &app,
        get_request(&format!("/api/classes/{class_id}/students"), Some(&teacher)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await.as_array().unwrap().len(), 1);

    // ...mas não apaga
    let response = send(
        &app,
        json_request("DELETE", &format!("/api/records/students/{student_id}"), Some(&teacher), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["code"], "forbidden");

    // E o aluno continua lá
    let response = send(
        &app,
        get_request(&format!("/api/records/students/{student_id}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn other_schools_are_invisible_and_untouchable() {
    let app = app();
    let (_, admin_a) = register_school(&app, "admin@a.edu.br").await;
    let (school_b, admin_b) = register_school(&app, "admin@b.edu.br").await;

    let response = send(
        &app,
        json_request("POST", "/api/records/classes", Some(&admin_a), json!({ "name": "Turma A" })),
    )
    .await;
    let class_a = read_json(response).await["id"].as_str().unwrap().to_string();

    let response = send(&app, get_request(&format!("/api/records/classes/{class_a}"), Some(&admin_b))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["code"], "access_denied");

    let response = send(&app, get_request("/api/records/classes", Some(&admin_b))).await;
    assert!(read_json(response).await.as_array().unwrap().is_empty());

    // Cabeçalho de escola que não é a do token
    let mut request = get_request("/api/records/classes", Some(&admin_a));
    request
        .headers_mut()
        .insert("x-tenant-id", school_b.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mutations_show_up_in_the_audit_trail() {
    let app = app();
    let (_, admin) = register_school(&app, "admin@central.edu.br").await;

    send(
        &app,
        json_request("POST", "/api/records/classes", Some(&admin), json!({ "name": "9º A" })),
    )
    .await;

    let response = send(&app, get_request("/api/audit-logs?module=classes", Some(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let entries = read_json(response).await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "create_class");
    assert_eq!(entries[0]["actorName"], "Admin Central");
    assert_eq!(entries[0]["changes"]["created"]["name"], "9º A");

    let response = send(
        &app,
        get_request(
            "/api/audit-logs?startDate=2030-01-02T00:00:00Z&endDate=2030-01-01T00:00:00Z",
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn teachers_cannot_read_the_audit_trail_or_edit_permissions() {
    let app = app();
    let (school_id, _) = register_school(&app, "admin@central.edu.br").await;
    let (teacher_id, teacher) = register_teacher(&app, &school_id, "prof@central.edu.br").await;

    let response = send(&app, get_request("/api/audit-logs", Some(&teacher))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/permissions/users/{teacher_id}"),
            Some(&teacher),
            json!({ "permissions": [{ "module": "settings", "actions": ["update"] }] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_customizes_and_resets_a_teacher() {
    let app = app();
    let (school_id, admin) = register_school(&app, "admin@central.edu.br").await;
    let (teacher_id, teacher) = register_teacher(&app, &school_id, "prof@central.edu.br").await;
    let uri = format!("/api/permissions/users/{teacher_id}");

    let response = send(&app, get_request(&uri, Some(&admin))).await;
    assert_eq!(read_json(response).await["custom"], false);

    let grants = json!({ "permissions": [{ "module": "students", "actions": ["read", "delete"] }] });
    let response = send(&app, json_request("PUT", &uri, Some(&admin), grants)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["custom"], true);
    assert_eq!(body["permissions"].as_array().unwrap().len(), 1);

    // O token do professor continua valendo e já enxerga a nova regra
    let check = "/api/permissions/check?module=students&action=delete";
    let response = send(&app, get_request(check, Some(&teacher))).await;
    assert_eq!(read_json(response).await["allowed"], true);
    let response = send(
        &app,
        get_request("/api/permissions/check?module=grades&action=read", Some(&teacher)),
    )
    .await;
    assert_eq!(read_json(response).await["allowed"], false);

    let response = send(
        &app,
        get_request("/api/audit-logs?module=settings", Some(&admin)),
    )
    .await;
    let entries = read_json(response).await;
    assert_eq!(entries[0]["action"], "update_permissions");
    assert_eq!(entries[0]["targetId"], json!(teacher_id));

    // Fora do catálogo
    let bad = json!({ "permissions": [{ "module": "library", "actions": ["read"] }] });
    let response = send(&app, json_request("PUT", &uri, Some(&admin), bad)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "invalid_permission");

    let response = send(&app, json_request("DELETE", &uri, Some(&admin), json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["custom"], false);

    let response = send(&app, get_request(check, Some(&teacher))).await;
    assert_eq!(read_json(response).await["allowed"], false);
}

#[tokio::test]
async fn toggle_is_a_preview_and_self_inverse() {
    let app = app();
    let (_, admin) = register_school(&app, "admin@central.edu.br").await;

    let table = json!([{ "module": "grades", "actions": ["read"] }]);
    let payload = json!({ "permissions": table, "module": "grades", "action": "update" });
    let response = send(&app, json_request("POST", "/api/permissions/toggle", Some(&admin), payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let once = read_json(response).await;
    assert_eq!(once[0]["actions"], json!(["read", "update"]));

    let payload = json!({ "permissions": once, "module": "grades", "action": "update" });
    let response = send(&app, json_request("POST", "/api/permissions/toggle", Some(&admin), payload)).await;
    assert_eq!(read_json(response).await, table);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = app();
    let (_, token) = register_school(&app, "admin@central.edu.br").await;

    let response = send(&app, json_request("POST", "/api/auth/logout", Some(&token), json!({}))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get_request("/api/users/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let app = app();

    let mut request = get_request("/api/users/me", None);
    request
        .headers_mut()
        .insert("accept-language", "pt-BR,pt;q=0.9".parse().unwrap());
    let pt = read_json(send(&app, request).await).await;

    let en = read_json(send(&app, get_request("/api/users/me", None)).await).await;

    assert_eq!(pt["code"], en["code"]);
    assert_ne!(pt["error"], en["error"]);
}
