mod common;

use std::sync::Arc;

use common::{test_config, test_state, StaleReadStore};
use school_backend::common::error::AppError;
use school_backend::db::Query;
use school_backend::models::auth::Role;
use school_backend::services::auth::NewAccount;
use school_backend::AppState;

fn account(email: &str, password: &str) -> NewAccount {
    NewAccount {
        email: email.into(),
        password: password.into(),
        name: "Prof. Ana".into(),
        role: Role::Teacher,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_sign_ups_with_one_email_leave_a_single_account() {
    let state = test_state();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let auth = state.auth_service.clone();
            let tenant = if i % 2 == 0 { "school_1" } else { "school_2" };
            let password = format!("senha-{i}");
            tokio::spawn(async move {
                let result = auth
                    .create_account(&account("Disputado@Escola.com", &password), tenant)
                    .await;
                (password, result)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        let (password, result) = task.await.unwrap();
        match result {
            Ok(identity) => winners.push((password, identity)),
            Err(AppError::EmailAlreadyExists) => {}
            Err(other) => panic!("erro inesperado: {other:?}"),
        }
    }
    assert_eq!(winners.len(), 1);
    let (password, winner) = &winners[0];

    // Os perdedores não deixam identidade órfã em nenhuma escola
    let users = state
        .store
        .query("users", &Query::new().where_eq("email", "disputado@escola.com"))
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, winner.id);

    // E a credencial aponta para o vencedor
    let signed_in = state
        .auth_service
        .sign_in("disputado@escola.com", password)
        .await
        .unwrap();
    assert_eq!(signed_in.user.id, winner.id);
}

#[tokio::test]
async fn sign_up_that_slips_past_the_email_check_is_rolled_back() {
    let state = AppState::with_store(test_config(), Arc::new(StaleReadStore::new("credentials")));

    state
        .auth_service
        .create_account(&account("ana@escola.com", "senha123"), "school_1")
        .await
        .unwrap();

    let err = state
        .auth_service
        .create_account(&account("ana@escola.com", "outra123"), "school_2")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailAlreadyExists), "{err:?}");

    assert!(state.user_service.list("school_2", None).await.unwrap().is_empty());
    assert_eq!(state.user_service.list("school_1", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reset_ticket_is_single_use() {
    let state = test_state();
    state
        .auth_service
        .create_account(&account("ana@escola.com", "senha123"), "school_1")
        .await
        .unwrap();

    let ticket = state
        .auth_service
        .request_password_reset("ana@escola.com")
        .await
        .unwrap()
        .unwrap();

    state
        .auth_service
        .confirm_password_reset(&ticket, "nova-senha")
        .await
        .unwrap();
    assert!(state
        .auth_service
        .confirm_password_reset(&ticket, "de-novo-123")
        .await
        .is_err());

    state
        .auth_service
        .sign_in("ana@escola.com", "nova-senha")
        .await
        .unwrap();
}
