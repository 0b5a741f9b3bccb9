mod common;

use common::test_state;
use school_backend::common::error::AppError;
use school_backend::models::auth::{Identity, Role};
use school_backend::models::rbac::PermissionGrant;
use school_backend::services::auth::NewAccount;
use school_backend::services::permission_admin::{load_effective_permissions, toggle_action};
use school_backend::services::permission_model::default_permissions_for;
use school_backend::AppState;

async fn account(state: &AppState, email: &str, role: Role, tenant: &str) -> Identity {
    let account = NewAccount {
        email: email.into(),
        password: "senha123".into(),
        name: email.split('@').next().unwrap_or(email).into(),
        role,
    };
    state
        .auth_service
        .create_account(&account, tenant)
        .await
        .unwrap()
}

#[tokio::test]
async fn saved_grants_replace_role_defaults() {
    let state = test_state();
    let parent = account(&state, "mae@escola.com", Role::Parent, "school_1").await;

    // Padrão do perfil: comunicados liberados
    assert!(state.engine.is_allowed(Some(&parent), "announcements", "read"));

    state
        .permission_admin
        .save(&parent, vec![PermissionGrant::new("grades", ["read"])], "school_1")
        .await
        .unwrap();

    let reloaded = state.user_service.get(&parent.id, "school_1").await.unwrap();
    assert!(state.engine.is_allowed(Some(&reloaded), "grades", "read"));
    // Lista personalizada substitui o padrão por inteiro
    assert!(!state.engine.is_allowed(Some(&reloaded), "announcements", "read"));
    assert_eq!(load_effective_permissions(&reloaded).len(), 1);
}

#[tokio::test]
async fn saving_an_empty_list_means_role_defaults() {
    let state = test_state();
    let teacher = account(&state, "prof@escola.com", Role::Teacher, "school_1").await;

    let saved = state
        .permission_admin
        .save(&teacher, vec![PermissionGrant::new("grades", Vec::<String>::new())], "school_1")
        .await
        .unwrap();
    assert!(saved.is_empty());

    let reloaded = state.user_service.get(&teacher.id, "school_1").await.unwrap();
    assert_eq!(
        load_effective_permissions(&reloaded),
        default_permissions_for(Role::Teacher)
    );
}

#[tokio::test]
async fn unknown_module_or_action_is_rejected_without_writing() {
    let state = test_state();
    let teacher = account(&state, "prof@escola.com", Role::Teacher, "school_1").await;

    let err = state
        .permission_admin
        .save(&teacher, vec![PermissionGrant::new("library", ["read"])], "school_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPermission(_)), "{err:?}");

    // export só existe em relatórios
    let err = state
        .permission_admin
        .save(&teacher, vec![PermissionGrant::new("grades", ["export"])], "school_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPermission(_)), "{err:?}");

    let reloaded = state.user_service.get(&teacher.id, "school_1").await.unwrap();
    assert!(reloaded.permissions.is_none());
}

#[tokio::test]
async fn saving_for_a_user_of_another_school_is_access_denied() {
    let state = test_state();
    let teacher = account(&state, "prof@escola.com", Role::Teacher, "school_1").await;

    let err = state
        .permission_admin
        .save(&teacher, vec![PermissionGrant::new("grades", ["read"])], "school_2")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied { .. }), "{err:?}");

    let err = state.permission_admin.reset(&teacher, "school_2").await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied { .. }), "{err:?}");
}

#[tokio::test]
async fn reset_restores_role_defaults() {
    let state = test_state();
    let student = account(&state, "aluno@escola.com", Role::Student, "school_1").await;

    state
        .permission_admin
        .save(&student, vec![PermissionGrant::new("reports", ["read", "export"])], "school_1")
        .await
        .unwrap();
    let custom = state.user_service.get(&student.id, "school_1").await.unwrap();
    assert!(state.engine.is_allowed(Some(&custom), "reports", "export"));

    state.permission_admin.reset(&custom, "school_1").await.unwrap();

    let reloaded = state.user_service.get(&student.id, "school_1").await.unwrap();
    assert!(reloaded.custom_permissions().is_none());
    assert!(!state.engine.is_allowed(Some(&reloaded), "reports", "export"));
    assert!(state.engine.is_allowed(Some(&reloaded), "grades", "read"));
}

#[tokio::test]
async fn toggled_table_round_trips_through_save() {
    let state = test_state();
    let teacher = account(&state, "prof@escola.com", Role::Teacher, "school_1").await;

    let start = load_effective_permissions(&teacher);
    let edited = toggle_action(&start, "students", "update");
    let edited = toggle_action(&edited, "grades", "create");

    let saved = state
        .permission_admin
        .save(&teacher, edited, "school_1")
        .await
        .unwrap();
    let reloaded = state.user_service.get(&teacher.id, "school_1").await.unwrap();

    assert_eq!(load_effective_permissions(&reloaded), saved);
    assert!(state.engine.is_allowed(Some(&reloaded), "students", "update"));
    assert!(!state.engine.is_allowed(Some(&reloaded), "grades", "create"));
    assert!(state.engine.is_allowed(Some(&reloaded), "grades", "update"));
}
