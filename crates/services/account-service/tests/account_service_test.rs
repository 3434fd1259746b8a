//! Account service tests against a mocked user repository and an in-memory
//! token cache driven by a manual clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use mockall::predicate::eq;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use account_service_lib::infra::{ManualClock, MemoryTokenCache, RecoveryTokenCache};
use account_service_lib::repository::MockUserRepository;
use account_service_lib::service::{AccountManager, AccountService};
use common::AppError;
use domain::{NewUser, PasswordDigest, ProfilePatch, User, UserRole};

const SALT: &str = "test-salt";
const TTL_SECONDS: u64 = 600;

struct Harness {
    service: AccountManager,
    tokens: Arc<MemoryTokenCache>,
    clock: Arc<ManualClock>,
}

fn harness(repo: MockUserRepository) -> Harness {
    let clock = Arc::new(ManualClock::default());
    let tokens = Arc::new(MemoryTokenCache::with_clock(TTL_SECONDS, 100, clock.clone()));
    let service = AccountManager::new(Arc::new(repo), tokens.clone(), SALT);
    Harness {
        service,
        tokens,
        clock,
    }
}

fn digest(plain: &str) -> String {
    PasswordDigest::compute(plain, SALT).into_string()
}

fn stored_user(id: Uuid, username: &str, password: &str) -> User {
    User {
        id,
        username: username.to_string(),
        password: digest(password),
        email: format!("{}@example.com", username),
        phone: Some("13800000000".to_string()),
        question: Some("first pet".to_string()),
        answer: Some("rex".to_string()),
        role: UserRole::Customer,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn candidate(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "pw1".to_string(),
        email: email.to_string(),
        phone: None,
        question: Some("first pet".to_string()),
        answer: Some("rex".to_string()),
    }
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn test_login_success_clears_password() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username()
        .with(eq("alice"))
        .returning(|_| Ok(1));
    let expected = digest("pw1");
    repo.expect_find_by_credentials()
        .withf(move |username, password_digest| {
            username == "alice" && password_digest == expected
        })
        .returning(|username, _| Ok(Some(stored_user(Uuid::new_v4(), username, "pw1"))));

    let h = harness(repo);
    let reply = assert_ok!(h.service.login("alice", "pw1").await);

    assert_eq!(reply.message.as_deref(), Some("login succeeded"));
    let user = reply.data.unwrap();
    assert_eq!(user.username, "alice");
    assert!(user.password.is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_find_by_credentials().returning(|_, _| Ok(None));

    let h = harness(repo);
    let err = assert_err!(h.service.login("alice", "wrong").await);

    assert!(matches!(err, AppError::InvalidCredential(_)));
    assert_eq!(err.to_string(), "incorrect password");
}

#[tokio::test]
async fn test_login_unknown_username_skips_credential_lookup() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));
    repo.expect_find_by_credentials().never();

    let h = harness(repo);
    let err = assert_err!(h.service.login("bob", "x").await);

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "username does not exist");
}

// =============================================================================
// register / check_valid
// =============================================================================

#[tokio::test]
async fn test_register_success_stores_customer_with_digest() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));
    repo.expect_count_by_email().returning(|_| Ok(0));
    let expected = digest("pw1");
    repo.expect_insert()
        .withf(move |user: &User| {
            user.username == "alice"
                && user.role == UserRole::Customer
                && user.password == expected
        })
        .times(1)
        .returning(|_| Ok(1));

    let h = harness(repo);
    let reply = assert_ok!(h.service.register(candidate("alice", "alice@example.com")).await);

    assert_eq!(reply.message.as_deref(), Some("registration succeeded"));
    assert!(reply.data.is_none());
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_count_by_email().never();
    repo.expect_insert().never();

    let h = harness(repo);
    let err = assert_err!(h.service.register(candidate("alice", "new@example.com")).await);

    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(err.to_string(), "username already exists");
}

#[tokio::test]
async fn test_register_rejects_taken_email() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));
    repo.expect_count_by_email()
        .with(eq("alice@example.com"))
        .returning(|_| Ok(1));
    repo.expect_insert().never();

    let h = harness(repo);
    let err = assert_err!(h.service.register(candidate("carol", "alice@example.com")).await);

    assert_eq!(err.to_string(), "email already exists");
}

#[tokio::test]
async fn test_register_zero_rows_is_failure() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));
    repo.expect_count_by_email().returning(|_| Ok(0));
    repo.expect_insert().returning(|_| Ok(0));

    let h = harness(repo);
    let err = assert_err!(h.service.register(candidate("alice", "alice@example.com")).await);

    assert!(matches!(err, AppError::PersistenceFailure(_)));
    assert_eq!(err.to_string(), "registration failed");
}

#[tokio::test]
async fn test_registered_username_is_no_longer_valid() {
    let inserted = Arc::new(AtomicU64::new(0));

    let mut repo = MockUserRepository::new();
    let count = inserted.clone();
    repo.expect_count_by_username()
        .returning(move |_| Ok(count.load(Ordering::SeqCst)));
    repo.expect_count_by_email().returning(|_| Ok(0));
    let flag = inserted.clone();
    repo.expect_insert().returning(move |_| {
        flag.store(1, Ordering::SeqCst);
        Ok(1)
    });

    let h = harness(repo);
    assert_ok!(h.service.check_valid("alice", "username").await);
    assert_ok!(h.service.register(candidate("alice", "alice@example.com")).await);

    let err = assert_err!(h.service.check_valid("alice", "username").await);
    assert!(matches!(err, AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_check_valid_free_value() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_email().returning(|_| Ok(0));

    let h = harness(repo);
    let reply = assert_ok!(h.service.check_valid("new@example.com", "email").await);

    assert_eq!(
        reply.message.as_deref(),
        Some("validation passed, field does not exist")
    );
}

#[tokio::test]
async fn test_check_valid_rejects_unknown_field_type() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().never();
    repo.expect_count_by_email().never();

    let h = harness(repo);
    for field_type in ["", "  ", "phone"] {
        let err = assert_err!(h.service.check_valid("alice", field_type).await);
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "parameter error");
    }
}

// =============================================================================
// select_question / check_answer
// =============================================================================

#[tokio::test]
async fn test_select_question_unknown_user() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));
    repo.expect_find_recovery_question().never();

    let h = harness(repo);
    let err = assert_err!(h.service.select_question("bob").await);

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "username does not exist");
}

#[tokio::test]
async fn test_select_question_returns_question() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_find_recovery_question()
        .with(eq("alice"))
        .returning(|_| Ok(Some("first pet".to_string())));

    let h = harness(repo);
    let reply = assert_ok!(h.service.select_question("alice").await);

    assert_eq!(reply.data.as_deref(), Some("first pet"));
}

#[tokio::test]
async fn test_select_question_blank_question() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_find_recovery_question()
        .returning(|_| Ok(Some("   ".to_string())));

    let h = harness(repo);
    let reply = assert_ok!(h.service.select_question("alice").await);

    assert!(reply.data.is_none());
    assert_eq!(reply.message.as_deref(), Some("recovery question is empty"));
}

#[tokio::test]
async fn test_check_answer_wrong_answer() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_matching_answer().returning(|_, _, _| Ok(0));

    let h = harness(repo);
    let err = assert_err!(h.service.check_answer("alice", "first pet", "tom").await);

    assert!(matches!(err, AppError::InvalidCredential(_)));
    assert_eq!(err.to_string(), "incorrect answer to the question");
    assert!(h.tokens.is_empty());
}

#[tokio::test]
async fn test_check_answer_caches_fresh_token() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_matching_answer()
        .with(eq("alice"), eq("first pet"), eq("rex"))
        .returning(|_, _, _| Ok(1));

    let h = harness(repo);
    let first = assert_ok!(h.service.check_answer("alice", "first pet", "rex").await)
        .into_data()
        .unwrap();

    assert!(Uuid::parse_str(&first).is_ok());
    assert_eq!(h.tokens.get("token_alice").await.unwrap(), Some(first.clone()));

    let second = assert_ok!(h.service.check_answer("alice", "first pet", "rex").await)
        .into_data()
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(h.tokens.get("token_alice").await.unwrap(), Some(second));
}

// =============================================================================
// forget_reset_password
// =============================================================================

#[tokio::test]
async fn test_forget_reset_requires_token() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().never();

    let h = harness(repo);
    let err = assert_err!(h.service.forget_reset_password("alice", "new", " ").await);

    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "parameter error, token is required");
}

#[tokio::test]
async fn test_forget_reset_unknown_user() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(0));

    let h = harness(repo);
    let err = assert_err!(h.service.forget_reset_password("bob", "new", "tok").await);

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "user does not exist");
}

#[tokio::test]
async fn test_forget_reset_without_cached_token() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_update_password_by_username().never();

    let h = harness(repo);
    let err = assert_err!(h.service.forget_reset_password("alice", "new", "tok").await);

    assert!(matches!(err, AppError::InvalidCredential(_)));
    assert_eq!(err.to_string(), "token invalid or expired");
}

#[tokio::test]
async fn test_forget_reset_token_mismatch() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_update_password_by_username().never();

    let h = harness(repo);
    h.tokens.set("token_alice", "issued").await.unwrap();
    let err = assert_err!(h.service.forget_reset_password("alice", "new", "forged").await);

    assert_eq!(err.to_string(), "token incorrect, request a new reset token");
}

#[tokio::test]
async fn test_forget_reset_expired_token() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_update_password_by_username().never();

    let h = harness(repo);
    h.tokens.set("token_alice", "issued").await.unwrap();
    h.clock.advance(Duration::seconds(TTL_SECONDS as i64));

    let err = assert_err!(h.service.forget_reset_password("alice", "new", "issued").await);
    assert_eq!(err.to_string(), "token invalid or expired");
}

#[tokio::test]
async fn test_forget_reset_success_and_token_reuse() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_count_matching_answer().returning(|_, _, _| Ok(1));
    let expected = digest("new-pw");
    repo.expect_update_password_by_username()
        .withf(move |username, password_digest| {
            username == "alice" && password_digest == expected
        })
        .times(2)
        .returning(|_, _| Ok(1));

    let h = harness(repo);
    let token = assert_ok!(h.service.check_answer("alice", "first pet", "rex").await)
        .into_data()
        .unwrap();

    let reply = assert_ok!(h.service.forget_reset_password("alice", "new-pw", &token).await);
    assert_eq!(reply.message.as_deref(), Some("password reset succeeded"));

    // Tokens stay valid until they expire
    assert_ok!(h.service.forget_reset_password("alice", "new-pw", &token).await);
}

#[tokio::test]
async fn test_forget_reset_update_failure() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_by_username().returning(|_| Ok(1));
    repo.expect_update_password_by_username().returning(|_, _| Ok(0));

    let h = harness(repo);
    h.tokens.set("token_alice", "issued").await.unwrap();
    let err = assert_err!(h.service.forget_reset_password("alice", "new", "issued").await);

    assert!(matches!(err, AppError::PersistenceFailure(_)));
    assert_eq!(err.to_string(), "password update failed");
}

// =============================================================================
// reset_password
// =============================================================================

#[tokio::test]
async fn test_reset_password_wrong_old_password() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_verify_password_by_id().returning(|_, _| Ok(0));
    repo.expect_update_password_by_id().never();

    let h = harness(repo);
    let current = stored_user(user_id, "alice", "pw1");
    let err = assert_err!(h.service.reset_password("nope", "pw2", &current).await);

    assert!(matches!(err, AppError::InvalidCredential(_)));
    assert_eq!(err.to_string(), "old password incorrect");
}

#[tokio::test]
async fn test_reset_password_success() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    let old = digest("pw1");
    repo.expect_verify_password_by_id()
        .withf(move |password_digest, id| password_digest == old && *id == user_id)
        .returning(|_, _| Ok(1));
    let new = digest("pw2");
    repo.expect_update_password_by_id()
        .withf(move |id, password_digest| *id == user_id && password_digest == new)
        .times(1)
        .returning(|_, _| Ok(1));

    let h = harness(repo);
    let current = stored_user(user_id, "alice", "pw1");
    let reply = assert_ok!(h.service.reset_password("pw1", "pw2", &current).await);

    assert_eq!(reply.message.as_deref(), Some("password updated"));
}

#[tokio::test]
async fn test_reset_password_update_failure() {
    let mut repo = MockUserRepository::new();
    repo.expect_verify_password_by_id().returning(|_, _| Ok(1));
    repo.expect_update_password_by_id().returning(|_, _| Ok(0));

    let h = harness(repo);
    let current = stored_user(Uuid::new_v4(), "alice", "pw1");
    let err = assert_err!(h.service.reset_password("pw1", "pw2", &current).await);

    assert_eq!(err.to_string(), "password update failed");
}

// =============================================================================
// update_information / get_information
// =============================================================================

fn patch(id: Uuid, email: &str) -> ProfilePatch {
    ProfilePatch {
        id,
        email: email.to_string(),
        phone: Some("13900000000".to_string()),
        question: Some("favourite colour".to_string()),
        answer: Some("green".to_string()),
    }
}

#[tokio::test]
async fn test_update_information_email_taken_by_other_user() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_count_email_excluding_id()
        .with(eq("bob@example.com"), eq(user_id))
        .returning(|_, _| Ok(1));
    repo.expect_update_profile().never();

    let h = harness(repo);
    let err = assert_err!(
        h.service
            .update_information(patch(user_id, "bob@example.com"))
            .await
    );

    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(err.to_string(), "email already exists, use a different email");
}

#[tokio::test]
async fn test_update_information_keeps_own_email() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_count_email_excluding_id().returning(|_, _| Ok(0));
    repo.expect_update_profile()
        .withf(move |p: &ProfilePatch| p.id == user_id && p.email == "alice@example.com")
        .times(1)
        .returning(|_| Ok(1));

    let h = harness(repo);
    let reply = assert_ok!(
        h.service
            .update_information(patch(user_id, "alice@example.com"))
            .await
    );

    let view = reply.data.unwrap();
    assert_eq!(view.id, user_id);
    assert_eq!(view.answer.as_deref(), Some("green"));
}

#[tokio::test]
async fn test_update_information_zero_rows() {
    let mut repo = MockUserRepository::new();
    repo.expect_count_email_excluding_id().returning(|_, _| Ok(0));
    repo.expect_update_profile().returning(|_| Ok(0));

    let h = harness(repo);
    let err = assert_err!(
        h.service
            .update_information(patch(Uuid::new_v4(), "ghost@example.com"))
            .await
    );

    assert!(matches!(err, AppError::PersistenceFailure(_)));
    assert_eq!(err.to_string(), "profile update failed");
}

#[tokio::test]
async fn test_get_information_clears_password() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .with(eq(user_id))
        .returning(|id| Ok(Some(stored_user(id, "alice", "pw1"))));

    let h = harness(repo);
    let reply = assert_ok!(h.service.get_information(user_id).await);

    assert!(reply.message.is_none());
    let user = reply.data.unwrap();
    assert_eq!(user.id, user_id);
    assert!(user.password.is_empty());
}

#[tokio::test]
async fn test_get_information_not_found() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().returning(|_| Ok(None));

    let h = harness(repo);
    let err = assert_err!(h.service.get_information(Uuid::new_v4()).await);

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "user does not exist");
}
