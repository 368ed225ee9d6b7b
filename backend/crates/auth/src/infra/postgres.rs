//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entity::server_settings::{
    EreaderDevice, GoogleOauthSettings, OpenidSettings, ServerSettings,
};
use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    LibraryRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::{
    auth_method::AuthMethod,
    email::Email,
    user_id::{LibraryId, UserId},
    user_type::UserType,
    username::Username,
};
use crate::error::AuthResult;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                username,
                email,
                password_digest,
                user_type,
                is_active,
                token,
                default_library_id,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                username,
                email,
                password_digest,
                user_type,
                is_active,
                token,
                default_library_id,
                created_at,
                updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                username,
                email,
                password_digest,
                user_type,
                is_active,
                token,
                default_library_id,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn all_users(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                username,
                email,
                password_digest,
                user_type,
                is_active,
                token,
                default_library_id,
                created_at,
                updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn update_token(&self, user_id: &UserId, token: &str) -> AuthResult<()> {
        sqlx::query("UPDATE users SET token = $2, updated_at = $3 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(token)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Settings Repository Implementation
// ============================================================================

impl SettingsRepository for PgAuthRepository {
    async fn load_settings(&self) -> AuthResult<ServerSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT
                token_secret,
                active_auth_methods,
                google,
                openid,
                ereader_devices
            FROM server_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SettingsRow::into_settings).unwrap_or_default())
    }

    async fn save_settings(&self, settings: &ServerSettings) -> AuthResult<()> {
        let methods: Vec<String> = settings
            .active_auth_methods
            .iter()
            .map(|m| m.code().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO server_settings (
                id,
                token_secret,
                active_auth_methods,
                google,
                openid,
                ereader_devices,
                updated_at
            ) VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                token_secret = EXCLUDED.token_secret,
                active_auth_methods = EXCLUDED.active_auth_methods,
                google = EXCLUDED.google,
                openid = EXCLUDED.openid,
                ereader_devices = EXCLUDED.ereader_devices,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(settings.token_secret.as_deref())
        .bind(&methods)
        .bind(settings.google.as_ref().map(Json))
        .bind(settings.openid.as_ref().map(Json))
        .bind(Json(&settings.ereader_devices))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                expires_at_ms,
                created_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Library Repository Implementation
// ============================================================================

impl LibraryRepository for PgAuthRepository {
    async fn library_ids(&self) -> AuthResult<Vec<LibraryId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT library_id FROM libraries ORDER BY display_order, created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(LibraryId::from_uuid).collect())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: Option<String>,
    password_digest: Option<String>,
    user_type: i16,
    is_active: bool,
    token: Option<String>,
    default_library_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            username: Username::from_db(self.username),
            email: self.email.map(Email::from_db),
            password_digest: self.password_digest,
            user_type: UserType::from_id(self.user_type).unwrap_or_default(),
            is_active: self.is_active,
            token: self.token,
            default_library_id: self.default_library_id.map(LibraryId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    token_secret: Option<String>,
    active_auth_methods: Vec<String>,
    google: Option<Json<GoogleOauthSettings>>,
    openid: Option<Json<OpenidSettings>>,
    ereader_devices: Json<Vec<EreaderDevice>>,
}

impl SettingsRow {
    fn into_settings(self) -> ServerSettings {
        // Codes no longer in the closed set are skipped
        let active_auth_methods = self
            .active_auth_methods
            .iter()
            .filter_map(|code| {
                let method = AuthMethod::from_code(code);
                if method.is_none() {
                    tracing::warn!(code = %code, "Unknown auth method code in settings");
                }
                method
            })
            .collect();

        ServerSettings {
            token_secret: self.token_secret,
            active_auth_methods,
            google: self.google.map(|Json(g)| g),
            openid: self.openid.map(|Json(o)| o),
            ereader_devices: self.ereader_devices.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}
