use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use crate::domain::error::ErrorCode;
use crate::domain::password::{HasherParams, PasswordHasher};
use crate::domain::ports::{MockUserRepository, UserRepositoryError};
use crate::domain::tokens::{TokenConfig, TokenIssuer, TokenKind};
use crate::domain::user::{EmailAddress, User, UserDraft, UserId};

use super::{AuthService, NewUserRequest};

const PASSWORD: &str = "orange-battery-staple";

fn token_config() -> TokenConfig {
    TokenConfig::new(
        "access-secret-used-only-in-tests",
        "refresh-secret-used-only-in-tests",
        Algorithm::HS256,
        15,
        7,
    )
    .expect("valid config")
}

#[fixture]
fn hasher() -> PasswordHasher {
    PasswordHasher::new(HasherParams::default()).expect("valid params")
}

fn service(users: MockUserRepository, hasher: PasswordHasher) -> AuthService<MockUserRepository> {
    AuthService::new(
        Arc::new(users),
        hasher,
        TokenIssuer::new(&token_config()),
        Arc::new(DefaultClock),
    )
}

fn stored_user(hasher: &PasswordHasher, password: &str) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        email: EmailAddress::new("trader@example.com").expect("valid email"),
        email_verified: true,
        first_name: "Avery".into(),
        last_name: "Quinn".into(),
        password_hash: hasher.hash(password).expect("hashes"),
        created_at: Utc::now(),
    })
    .expect("valid user")
}

fn new_user_request() -> NewUserRequest {
    NewUserRequest {
        email: "trader@example.com".into(),
        password: PASSWORD.into(),
        first_name: "Avery".into(),
        last_name: "Quinn".into(),
    }
}

#[rstest]
#[tokio::test]
async fn create_user_stores_a_hashed_password(hasher: PasswordHasher) {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .withf(|user| {
            user.email().as_str() == "trader@example.com"
                && user.password_hash().starts_with("$argon2id$")
                && user.password_hash() != PASSWORD
                && !user.email_verified()
        })
        .once()
        .returning(|_| Ok(()));

    service(users, hasher)
        .create_user(new_user_request())
        .await
        .expect("creates");
}

#[rstest]
#[tokio::test]
async fn create_user_maps_duplicate_email_to_conflict(hasher: PasswordHasher) {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .once()
        .returning(|_| Err(UserRepositoryError::DuplicateEmail));

    let error = service(users, hasher)
        .create_user(new_user_request())
        .await
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case("not-an-email")]
#[case("missing@tld")]
#[case("")]
#[tokio::test]
async fn create_user_rejects_malformed_email(hasher: PasswordHasher, #[case] email: &str) {
    let error = service(MockUserRepository::new(), hasher)
        .create_user(NewUserRequest {
            email: email.into(),
            ..new_user_request()
        })
        .await
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::ValidationFailed);
}

#[rstest]
#[tokio::test]
async fn create_user_rejects_blank_password(hasher: PasswordHasher) {
    let error = service(MockUserRepository::new(), hasher)
        .create_user(NewUserRequest {
            password: "   ".into(),
            ..new_user_request()
        })
        .await
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::ValidationFailed);
}

#[rstest]
#[tokio::test]
async fn authenticate_returns_tokens_for_the_account(hasher: PasswordHasher) {
    let user = stored_user(&hasher, PASSWORD);
    let user_id = *user.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .once()
        .returning(move |_| Ok(Some(user.clone())));

    let pair = service(users, hasher)
        .authenticate("trader@example.com", PASSWORD)
        .await
        .expect("authenticates");

    let issuer = TokenIssuer::new(&token_config());
    assert_eq!(
        issuer
            .verify(&pair.access, TokenKind::Access)
            .expect("verifies"),
        user_id
    );
    assert_eq!(
        issuer
            .verify(&pair.refresh, TokenKind::Refresh)
            .expect("verifies"),
        user_id
    );
}

#[rstest]
#[tokio::test]
async fn authenticate_fails_for_unknown_email(hasher: PasswordHasher) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().once().returning(|_| Ok(None));

    let error = service(users, hasher)
        .authenticate("trader@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::AuthFailed);
    assert_eq!(error.message(), "unknown email address");
}

#[rstest]
#[tokio::test]
async fn authenticate_fails_for_wrong_password(hasher: PasswordHasher) {
    let user = stored_user(&hasher, PASSWORD);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .once()
        .returning(move |_| Ok(Some(user.clone())));

    let error = service(users, hasher)
        .authenticate("trader@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::AuthFailed);
    assert_eq!(error.message(), "incorrect password");
}

#[rstest]
#[tokio::test]
async fn refresh_mints_a_new_pair_for_the_same_subject(hasher: PasswordHasher) {
    let user_id = UserId::random();
    let issuer = TokenIssuer::new(&token_config());
    let refresh_token = issuer
        .issue(TokenKind::Refresh, user_id, Utc::now())
        .expect("issues");

    let svc = service(MockUserRepository::new(), hasher);
    let pair = svc.refresh(&refresh_token).expect("refreshes");

    assert_eq!(
        issuer
            .verify(&pair.access, TokenKind::Access)
            .expect("verifies"),
        user_id
    );
    // Rotation is stateless: the presented token stays valid.
    assert_eq!(
        issuer
            .verify(&refresh_token, TokenKind::Refresh)
            .expect("verifies"),
        user_id
    );
}

#[rstest]
#[tokio::test]
async fn refresh_rejects_an_access_token(hasher: PasswordHasher) {
    let issuer = TokenIssuer::new(&token_config());
    let access_token = issuer
        .issue(TokenKind::Access, UserId::random(), Utc::now())
        .expect("issues");

    let error = service(MockUserRepository::new(), hasher)
        .refresh(&access_token)
        .unwrap_err();
    assert_eq!(error.code(), ErrorCode::AuthFailed);
}

#[rstest]
#[tokio::test]
async fn current_principal_resolves_the_account(hasher: PasswordHasher) {
    let user = stored_user(&hasher, PASSWORD);
    let user_id = *user.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .once()
        .returning(move |_| Ok(Some(user.clone())));

    let svc = service(users, hasher);
    let issuer = TokenIssuer::new(&token_config());
    let access_token = issuer
        .issue(TokenKind::Access, user_id, Utc::now())
        .expect("issues");

    let principal = svc
        .current_principal(&access_token)
        .await
        .expect("resolves");
    assert_eq!(principal.user_id, user_id);
    assert_eq!(principal.email.as_str(), "trader@example.com");
    assert!(principal.email_verified);
}

#[rstest]
#[tokio::test]
async fn current_principal_fails_when_the_account_is_gone(hasher: PasswordHasher) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().once().returning(|_| Ok(None));

    let svc = service(users, hasher);
    let access_token = TokenIssuer::new(&token_config())
        .issue(TokenKind::Access, UserId::random(), Utc::now())
        .expect("issues");

    let error = svc.current_principal(&access_token).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::AuthFailed);
    assert_eq!(error.message(), "account no longer exists");
}
