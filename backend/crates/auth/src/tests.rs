//! Cross-module tests for the auth crate
//!
//! Exercises the credential, token, session, and login-payload paths
//! against the in-memory repository.

#[cfg(test)]
mod credential_tests {
    use std::sync::Arc;

    use crate::application::token::TokenService;
    use crate::application::verify::CredentialVerifier;
    use crate::domain::entity::user::User;
    use crate::domain::value_object::{
        email::Email, user_type::UserType, username::Username,
    };
    use crate::infra::memory::MemoryAuthRepository;

    fn verifier(repo: Arc<MemoryAuthRepository>) -> CredentialVerifier<MemoryAuthRepository> {
        CredentialVerifier::new(repo, Arc::new(TokenService::new("secret".to_string())))
    }

    fn local_user(username: &str, password: &str) -> User {
        let mut user = User::new(Username::new(username).unwrap(), UserType::User);
        user.password_digest = Some(platform::password::hash_password(password).unwrap());
        user
    }

    #[tokio::test]
    async fn test_local_login_roundtrip() {
        let repo = Arc::new(MemoryAuthRepository::new());
        repo.insert_user(local_user("alice", "hunter2"));

        let verifier = verifier(repo);

        assert!(verifier.verify_local("alice", "hunter2").await.is_approved());
        // Lookup is case-insensitive
        assert!(verifier.verify_local("ALICE", "hunter2").await.is_approved());
        assert!(!verifier.verify_local("alice", "wrong").await.is_approved());
        assert!(!verifier.verify_local("bob", "hunter2").await.is_approved());
    }

    #[tokio::test]
    async fn test_inactive_user_denied_everywhere() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut user = local_user("alice", "hunter2");
        user.email = Some(Email::new("alice@example.com").unwrap());
        user.is_active = false;
        repo.insert_user(user.clone());

        let tokens = Arc::new(TokenService::new("secret".to_string()));
        let verifier = CredentialVerifier::new(repo, tokens.clone());

        assert!(!verifier.verify_local("alice", "hunter2").await.is_approved());
        assert!(
            !verifier
                .verify_federated("alice@example.com")
                .await
                .is_approved()
        );

        // A validly signed bearer token does not help either
        let token = tokens.issue(&user).await.unwrap();
        assert!(!verifier.verify_token(&token).await.is_approved());
    }

    #[tokio::test]
    async fn test_passwordless_root() {
        let repo = Arc::new(MemoryAuthRepository::new());
        repo.insert_user(User::new(Username::new("root").unwrap(), UserType::Root));

        let verifier = verifier(repo);

        // Only the empty password works
        assert!(verifier.verify_local("root", "").await.is_approved());
        assert!(!verifier.verify_local("root", "guess").await.is_approved());
    }

    #[tokio::test]
    async fn test_root_with_password_requires_it() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut root = User::new(Username::new("root").unwrap(), UserType::Root);
        root.password_digest = Some(platform::password::hash_password("s3cret").unwrap());
        repo.insert_user(root);

        let verifier = verifier(repo);

        assert!(!verifier.verify_local("root", "").await.is_approved());
        assert!(verifier.verify_local("root", "s3cret").await.is_approved());
    }

    #[tokio::test]
    async fn test_non_root_without_digest_denied() {
        let repo = Arc::new(MemoryAuthRepository::new());
        repo.insert_user(User::new(Username::new("ghost").unwrap(), UserType::User));

        let verifier = verifier(repo);

        assert!(!verifier.verify_local("ghost", "").await.is_approved());
    }

    #[tokio::test]
    async fn test_federated_email_resolution() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut user = local_user("alice", "hunter2");
        user.email = Some(Email::new("alice@example.com").unwrap());
        repo.insert_user(user);

        let verifier = verifier(repo);

        let decision = verifier.verify_federated("Alice@Example.COM").await;
        let user = decision.into_user().unwrap();
        assert_eq!(user.username.as_str(), "alice");

        assert!(
            !verifier
                .verify_federated("nobody@example.com")
                .await
                .is_approved()
        );
    }
}

#[cfg(test)]
mod token_tests {
    use std::sync::Arc;

    use crate::application::token::TokenService;
    use crate::application::verify::CredentialVerifier;
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{user_type::UserType, username::Username};
    use crate::infra::memory::MemoryAuthRepository;

    #[tokio::test]
    async fn test_issue_validate_roundtrip() {
        let tokens = TokenService::new(TokenService::generate_secret());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);

        let token = tokens.issue(&user).await.unwrap();
        let claims = tokens.validate(&token).await.unwrap();

        assert_eq!(claims.user_id, *user.user_id.as_uuid());
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_validate_rejects_wrong_secret() {
        let tokens = TokenService::new("secret-a".to_string());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        let token = tokens.issue(&user).await.unwrap();

        let other = TokenService::new("secret-b".to_string());
        assert!(other.validate(&token).await.is_none());
        assert!(other.validate("not-a-jwt").await.is_none());
    }

    #[tokio::test]
    async fn test_rotation_reissues_all_tokens() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let tokens = TokenService::new("old-secret".to_string());

        let mut alice = User::new(Username::new("alice").unwrap(), UserType::User);
        let old_token = tokens.issue(&alice).await.unwrap();
        alice.set_token(old_token.clone());
        repo.insert_user(alice.clone());

        let mut bob = User::new(Username::new("bob").unwrap(), UserType::Admin);
        bob.set_token(tokens.issue(&bob).await.unwrap());
        repo.insert_user(bob);

        tokens
            .rotate(TokenService::generate_secret(), &*repo, &*repo)
            .await
            .unwrap();

        // Old token no longer verifies
        assert!(tokens.validate(&old_token).await.is_none());

        // Every stored token was reissued and verifies under the new secret
        for user in repo.all_users().await.unwrap() {
            let stored = user.token.clone().unwrap();
            assert_ne!(stored, old_token);
            let claims = tokens.validate(&stored).await.unwrap();
            assert_eq!(claims.username, user.username.as_str());
        }

        // The new secret is persisted in settings
        use crate::domain::repository::SettingsRepository;
        let settings = repo.load_settings().await.unwrap();
        assert!(settings.token_secret.is_some());
        assert_ne!(settings.token_secret.as_deref(), Some("old-secret"));
    }

    #[tokio::test]
    async fn test_initialize_prefers_env_override() {
        let repo = Arc::new(MemoryAuthRepository::new());
        repo.insert_user(User::new(Username::new("alice").unwrap(), UserType::User));

        let tokens = TokenService::initialize(Some("fixed-secret"), &*repo, &*repo)
            .await
            .unwrap();

        use crate::domain::repository::SettingsRepository;
        let settings = repo.load_settings().await.unwrap();
        assert_eq!(settings.token_secret.as_deref(), Some("fixed-secret"));

        // Tokens issued now verify, and the rotation already gave alice one
        let alice = repo
            .find_by_username(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(tokens.validate(alice.token.as_deref().unwrap()).await.is_some());
    }

    #[tokio::test]
    async fn test_bearer_check_survives_username_change() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let tokens = Arc::new(TokenService::new("secret".to_string()));

        let mut alice = User::new(Username::new("alice").unwrap(), UserType::User);
        let token = tokens.issue(&alice).await.unwrap();

        // The id claim is authoritative, not the username claim
        alice.username = Username::new("alice-renamed").unwrap();
        repo.insert_user(alice.clone());

        let verifier = CredentialVerifier::new(repo, tokens);
        let user = verifier.verify_token(&token).await.into_user().unwrap();
        assert_eq!(user.user_id, alice.user_id);
    }

    #[tokio::test]
    async fn test_rotated_token_passes_bearer_check() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let tokens = Arc::new(TokenService::new("old-secret".to_string()));

        let mut alice = User::new(Username::new("alice").unwrap(), UserType::User);
        alice.set_token(tokens.issue(&alice).await.unwrap());
        let old_token = alice.token.clone().unwrap();
        repo.insert_user(alice);

        tokens
            .rotate(TokenService::generate_secret(), &*repo, &*repo)
            .await
            .unwrap();

        let verifier = CredentialVerifier::new(repo.clone(), tokens.clone());
        assert!(!verifier.verify_token(&old_token).await.is_approved());

        let reissued = repo
            .find_by_username(&Username::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap()
            .token
            .unwrap();
        assert!(verifier.verify_token(&reissued).await.is_approved());
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::application::config::AuthConfig;
    use crate::application::session::SessionService;
    use crate::domain::entity::user::User;
    use crate::domain::repository::SessionRepository;
    use crate::domain::value_object::{user_type::UserType, username::Username};
    use crate::infra::memory::MemoryAuthRepository;

    fn service(
        repo: Arc<MemoryAuthRepository>,
        config: AuthConfig,
    ) -> SessionService<MemoryAuthRepository> {
        SessionService::new(repo, Arc::new(config))
    }

    #[tokio::test]
    async fn test_establish_resolve_destroy() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let sessions = service(repo.clone(), AuthConfig::development());

        let token = sessions.establish(&user).await.unwrap();
        assert_eq!(repo.session_count(), 1);

        let resolved = sessions.resolve(&token).await.unwrap().unwrap();
        assert_eq!(resolved.user_id, user.user_id);

        sessions.destroy(&token).await.unwrap();
        assert_eq!(repo.session_count(), 0);
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_tampered_token() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let sessions = service(repo.clone(), AuthConfig::development());
        let token = sessions.establish(&user).await.unwrap();

        // Signature from one secret does not verify under another
        let other = service(repo.clone(), AuthConfig::development());
        assert!(other.resolve(&token).await.unwrap().is_none());

        assert!(sessions.resolve("no-dot-here").await.unwrap().is_none());
        assert!(sessions.resolve("abc.!!!").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_deleted_on_resolve() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let config = AuthConfig {
            session_ttl: Duration::ZERO,
            ..AuthConfig::development()
        };
        let sessions = service(repo.clone(), config);

        let token = sessions.establish(&user).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(sessions.resolve(&token).await.unwrap().is_none());
        assert_eq!(repo.session_count(), 0);
    }

    #[tokio::test]
    async fn test_session_for_deleted_user_is_unauthenticated() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let sessions = service(repo.clone(), AuthConfig::development());
        let token = sessions.establish(&user).await.unwrap();

        repo.remove_user(&user.user_id);

        // Not an error, just no user
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_user_loses_session() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let sessions = service(repo.clone(), AuthConfig::development());
        let token = sessions.establish(&user).await.unwrap();

        user.is_active = false;
        repo.insert_user(user);

        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let expired = service(
            repo.clone(),
            AuthConfig {
                session_ttl: Duration::ZERO,
                ..AuthConfig::development()
            },
        );
        let live = service(repo.clone(), AuthConfig::development());

        expired.establish(&user).await.unwrap();
        live.establish(&user).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let deleted = repo.cleanup_expired_sessions().await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.session_count(), 1);
    }
}

#[cfg(test)]
mod payload_tests {
    use std::sync::Arc;

    use crate::application::login_payload::LoginPayloadBuilder;
    use crate::application::token::TokenService;
    use crate::domain::entity::server_settings::{EreaderDevice, ServerSettings};
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        user_id::{LibraryId, UserId},
        user_type::UserType,
        username::Username,
    };
    use crate::infra::memory::MemoryAuthRepository;

    fn builder(repo: Arc<MemoryAuthRepository>) -> LoginPayloadBuilder<MemoryAuthRepository> {
        LoginPayloadBuilder::new(repo, Arc::new(TokenService::new("secret".to_string())))
    }

    #[tokio::test]
    async fn test_payload_issues_fresh_token() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());

        let payload = builder(repo.clone()).build(user.clone()).await.unwrap();

        assert!(!payload.token.is_empty());
        assert_eq!(payload.user.token.as_deref(), Some(payload.token.as_str()));

        // The issued token was persisted
        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.token.as_deref(), Some(payload.token.as_str()));
    }

    #[tokio::test]
    async fn test_payload_replaces_stored_token() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut user = User::new(Username::new("alice").unwrap(), UserType::User);
        user.set_token("stale-token".to_string());
        repo.insert_user(user.clone());

        let payload = builder(repo.clone()).build(user.clone()).await.unwrap();
        assert_ne!(payload.token, "stale-token");

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.token.as_deref(), Some(payload.token.as_str()));
    }

    #[tokio::test]
    async fn test_payload_resolves_default_library() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let libraries = vec![LibraryId::new(), LibraryId::new()];
        repo.set_libraries(libraries.clone());

        // Stored preference no longer exists: falls back to the first
        let mut user = User::new(Username::new("alice").unwrap(), UserType::User);
        user.default_library_id = Some(LibraryId::new());
        repo.insert_user(user.clone());

        let payload = builder(repo).build(user).await.unwrap();
        assert_eq!(payload.default_library_id, Some(libraries[0]));
    }

    #[tokio::test]
    async fn test_payload_filters_ereader_devices() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let user = User::new(Username::new("alice").unwrap(), UserType::User);
        repo.insert_user(user.clone());
        repo.set_settings(ServerSettings {
            ereader_devices: vec![
                EreaderDevice {
                    name: "shared".to_string(),
                    available_user_ids: None,
                },
                EreaderDevice {
                    name: "someone-else".to_string(),
                    available_user_ids: Some(vec![UserId::new()]),
                },
            ],
            ..Default::default()
        });

        let payload = builder(repo).build(user).await.unwrap();
        assert_eq!(payload.ereader_devices.len(), 1);
        assert_eq!(payload.ereader_devices[0].name, "shared");
    }
}
