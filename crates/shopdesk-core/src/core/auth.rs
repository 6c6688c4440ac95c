//! Auth context: session user, login lockout and password flows.

use crate::api::client::ApiClient;
use crate::api::models::User;
use crate::core::forms::PasswordPolicy;
use crate::error::{ApiError, AppError, AuthError, CliError, ConfigError, ValidationError};
use crate::storage::config::SecurityConfig;
use crate::storage::session::{RestoredSession, Session};
use crate::utils::validation::{validate_email, validate_otp};
use chrono::{DateTime, Duration, TimeDelta, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const ADMIN: &str = "admin";

#[derive(Debug, Default)]
struct LoginGuard {
    attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct AuthContext {
    api: ApiClient,
    session: Session,
    security: SecurityConfig,
    password_policy: PasswordPolicy,
    guard: Mutex<LoginGuard>,
    user: Mutex<Option<User>>,
    /// Set when a stored session expired or was revoked by the backend.
    session_ended: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Re-tag an input check failure as a field error.
fn field_check(field: &str, result: crate::Result<()>) -> Result<(), ValidationError> {
    result.map_err(|e| match e {
        AppError::Cli(CliError::InvalidArguments(message)) => ValidationError::single(field, message),
        other => ValidationError::single(field, other.to_string()),
    })
}

/// `now + delta`, or a config error naming `field` when it does not fit.
fn offset_from(
    now: DateTime<Utc>,
    delta: Option<TimeDelta>,
    field: &str,
    value: u32,
) -> Result<DateTime<Utc>, ConfigError> {
    delta
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "duration out of range".to_string(),
        })
}

impl AuthContext {
    /// Uses the API client's session as the persisted session.
    pub fn new(api: ApiClient, security: SecurityConfig) -> Self {
        let session = api.session().clone();
        Self {
            api,
            session,
            security,
            password_policy: PasswordPolicy::default(),
            guard: Mutex::new(LoginGuard::default()),
            user: Mutex::new(None),
            session_ended: Mutex::new(false),
        }
    }

    /// Restore the signed-in user from the persisted session, if valid.
    pub fn init(&self) -> Option<User> {
        let restored = match self.session.restore(Utc::now()) {
            RestoredSession::Active { user } => Some(user),
            RestoredSession::Expired => {
                log::info!("Stored session expired");
                *lock(&self.session_ended) = true;
                None
            }
            RestoredSession::Corrupted | RestoredSession::Missing => None,
        };
        *lock(&self.user) = restored.clone();
        restored
    }

    /// The cached user, dropped once the persisted token is gone (e.g. after a 401).
    fn signed_in(&self) -> MutexGuard<'_, Option<User>> {
        let mut user = lock(&self.user);
        if user.is_some() && self.session.token().is_none() {
            log::info!("Session token revoked, signing out");
            *user = None;
            *lock(&self.session_ended) = true;
        }
        user
    }

    pub fn user(&self) -> Option<User> {
        self.signed_in().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.signed_in().is_some()
    }

    /// The signed-in user, or why there is none.
    pub fn require_user(&self) -> Result<User, AuthError> {
        match self.user() {
            Some(user) => Ok(user),
            None if *lock(&self.session_ended) => Err(AuthError::SessionExpired),
            None => Err(AuthError::NotAuthenticated),
        }
    }

    pub fn login_attempts(&self) -> u32 {
        lock(&self.guard).attempts
    }

    pub fn is_locked_out(&self) -> bool {
        self.lockout_remaining(Utc::now()).is_some()
    }

    fn lockout_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        lock(&self.guard)
            .locked_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    pub async fn login(&self, email: &str, password: &str) -> crate::Result<User> {
        if let Some(remaining) = self.lockout_remaining(Utc::now()) {
            // round up to whole minutes
            let minutes = (remaining.num_seconds() + 59) / 60;
            return Err(AuthError::LockedOut {
                remaining_minutes: minutes,
                message: format!("Account locked. Try again in {} minutes.", minutes),
            }
            .into());
        }

        field_check("email", validate_email(email))?;
        if password.is_empty() {
            return Err(ValidationError::single("password", "Password is required").into());
        }

        match self.api.login(email, password).await {
            Ok(data) => {
                let expires_at = match data.expires_at {
                    Some(at) => at,
                    None => {
                        let hours = self.security.session_timeout_hours;
                        offset_from(
                            Utc::now(),
                            TimeDelta::try_hours(i64::from(hours)),
                            "security.session_timeout_hours",
                            hours,
                        )?
                    }
                };
                self.session.persist(&data.token, &data.user, expires_at)?;
                *lock(&self.guard) = LoginGuard::default();
                *lock(&self.user) = Some(data.user.clone());
                *lock(&self.session_ended) = false;
                log::info!("Logged in as {}", data.user.email);
                Ok(data.user)
            }
            // rejected credentials: 401, other 4xx, or a success:false envelope
            Err(ApiError::Unauthorized { .. }) | Err(ApiError::Api { status: 200..=499, .. }) => {
                Err(self.record_failed_attempt()?.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_failed_attempt(&self) -> Result<AuthError, ConfigError> {
        let mut guard = lock(&self.guard);
        guard.attempts += 1;
        let max = self.security.max_login_attempts;
        if guard.attempts >= max {
            let minutes = self.security.lockout_minutes;
            guard.locked_until = Some(offset_from(
                Utc::now(),
                TimeDelta::try_minutes(i64::from(minutes)),
                "security.lockout_minutes",
                minutes,
            )?);
            log::warn!("Login locked for {} minutes after {} attempts", minutes, guard.attempts);
            Ok(AuthError::LockedOut {
                remaining_minutes: i64::from(minutes),
                message: format!(
                    "Too many failed attempts. Account locked for {} minutes.",
                    minutes
                ),
            })
        } else {
            Ok(AuthError::InvalidCredentials {
                remaining_attempts: max - guard.attempts,
            })
        }
    }

    /// Best-effort backend logout, then clear the local session.
    pub async fn logout(&self) -> crate::Result<()> {
        if self.session.token().is_some() {
            if let Err(e) = self.api.logout().await {
                log::warn!("Backend logout failed, clearing local session anyway: {}", e);
            }
        }
        *lock(&self.guard) = LoginGuard::default();
        *lock(&self.user) = None;
        *lock(&self.session_ended) = false;
        self.session.clear()?;
        Ok(())
    }

    /// Request an OTP mail. Returns the backend's message.
    pub async fn forgot_password(&self, email: &str) -> crate::Result<String> {
        field_check("email", validate_email(email))?;
        let envelope = self.api.forgot_password(email).await?;
        Ok(envelope.message_or("OTP sent to your email address"))
    }

    /// Exchange a 6-digit OTP for a password reset token.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> crate::Result<String> {
        field_check("email", validate_email(email))?;
        field_check("otp", validate_otp(otp))?;
        Ok(self.api.verify_otp(email, otp).await?)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> crate::Result<String> {
        if token.is_empty() {
            return Err(ValidationError::single("token", "Reset token is required").into());
        }
        self.validate_new_password(new_password)?;
        let envelope = self.api.reset_password(token, new_password).await?;
        Ok(envelope.message_or("Password reset successfully"))
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> crate::Result<String> {
        self.require_user()?;
        if current_password.is_empty() {
            return Err(
                ValidationError::single("currentPassword", "Current password is required").into(),
            );
        }
        self.validate_new_password(new_password)?;
        let envelope = self
            .api
            .change_password(current_password, new_password)
            .await?;
        Ok(envelope.message_or("Password changed successfully"))
    }

    fn validate_new_password(&self, password: &str) -> Result<(), AppError> {
        self.validate_password(password)
            .map_err(|message| ValidationError::single("newPassword", message).into())
    }

    /// First failing password rule, as a user-facing message.
    pub fn validate_password(&self, password: &str) -> Result<(), String> {
        self.password_policy.check(password)
    }

    /// Holders of the `admin` permission pass every check.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.signed_in().as_ref().is_some_and(|user| {
            user.permissions
                .iter()
                .any(|p| p == permission || p == ADMIN)
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.signed_in()
            .as_ref()
            .is_some_and(|user| user.role == role || user.role == ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> AuthContext {
        let api = ApiClient::new("http://127.0.0.1:9", Session::in_memory()).unwrap();
        AuthContext::new(api, SecurityConfig::default())
    }

    fn user(role: &str, permissions: &[&str]) -> User {
        serde_json::from_value(json!({
            "id": 2,
            "email": "staff@example.com",
            "name": "Staff",
            "role": role,
            "permissions": permissions,
        }))
        .unwrap()
    }

    #[test]
    fn test_init_restores_persisted_user() {
        let ctx = context();
        ctx.session
            .persist("tok", &user("editor", &["read"]), Utc::now() + Duration::hours(1))
            .unwrap();
        assert_eq!(ctx.init().map(|u| u.email), Some("staff@example.com".to_string()));
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_init_without_session() {
        let ctx = context();
        assert!(ctx.init().is_none());
        assert!(!ctx.is_authenticated());
        assert!(!ctx.has_permission("read"));
        assert!(!ctx.has_role("editor"));
    }

    fn sign_in(ctx: &AuthContext, user: User) {
        ctx.session
            .persist("tok", &user, Utc::now() + Duration::hours(1))
            .unwrap();
        *lock(&ctx.user) = Some(user);
    }

    #[test]
    fn test_permissions_and_roles() {
        let ctx = context();
        sign_in(&ctx, user("editor", &["read", "write"]));
        assert!(ctx.has_permission("write"));
        assert!(!ctx.has_permission("delete"));
        assert!(ctx.has_role("editor"));
        assert!(!ctx.has_role("manager"));

        sign_in(&ctx, user("admin", &["admin"]));
        assert!(ctx.has_permission("delete"));
        assert!(ctx.has_role("manager"));
    }

    #[test]
    fn test_failed_attempts_lock_out() {
        let ctx = context();
        for expected in (1..=4).rev() {
            assert_eq!(
                ctx.record_failed_attempt().unwrap(),
                AuthError::InvalidCredentials {
                    remaining_attempts: expected
                }
            );
        }
        let err = ctx.record_failed_attempt().unwrap();
        assert_eq!(
            err.to_string(),
            "Too many failed attempts. Account locked for 15 minutes."
        );
        assert!(ctx.is_locked_out());
        assert_eq!(ctx.login_attempts(), 5);
    }

    #[tokio::test]
    async fn test_login_rejected_while_locked_out() {
        let ctx = context();
        lock(&ctx.guard).locked_until = Some(Utc::now() + Duration::minutes(10));

        let err = ctx.login("admin@example.com", "Password@12").await.unwrap_err();
        match err {
            AppError::Auth(AuthError::LockedOut {
                remaining_minutes,
                message,
            }) => {
                assert_eq!(remaining_minutes, 10);
                assert_eq!(message, "Account locked. Try again in 10 minutes.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_validates_input_before_calling_backend() {
        let ctx = context();
        let err = ctx.login("not-an-email", "x").await.unwrap_err();
        match err {
            AppError::Validation(v) => assert!(v.message_for("email").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
        let err = ctx.login("admin@example.com", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(ctx.login_attempts(), 0);
    }

    #[tokio::test]
    async fn test_password_flows_validate_locally() {
        let ctx = context();
        let err = ctx.reset_password("reset-token", "weak").await.unwrap_err();
        assert_eq!(
            err.display_friendly(),
            "Password must be at least 8 characters long"
        );

        let err = ctx.verify_otp("user@example.com", "12ab56").await.unwrap_err();
        match err {
            AppError::Validation(v) => {
                assert_eq!(v.message_for("otp"), Some("OTP must be a 6-digit code"))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = ctx
            .change_password("old", "Password@12")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_revoked_token_signs_out() {
        let ctx = context();
        sign_in(&ctx, user("editor", &["read"]));
        assert!(ctx.is_authenticated());

        ctx.session.clear().unwrap();
        assert!(!ctx.is_authenticated());
        assert!(ctx.user().is_none());
        assert!(!ctx.has_permission("read"));
        assert_eq!(ctx.require_user(), Err(AuthError::SessionExpired));
    }

    #[test]
    fn test_expired_session_is_reported_as_expired() {
        let ctx = context();
        ctx.session
            .persist("tok", &user("editor", &[]), Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(ctx.init().is_none());
        assert_eq!(ctx.require_user(), Err(AuthError::SessionExpired));

        let fresh = context();
        assert_eq!(fresh.require_user(), Err(AuthError::NotAuthenticated));
    }

    #[test]
    fn test_expiry_overflow_is_a_config_error() {
        let api = ApiClient::new("http://127.0.0.1:9", Session::in_memory()).unwrap();
        let ctx = AuthContext::new(
            api,
            SecurityConfig {
                max_login_attempts: 1,
                lockout_minutes: u32::MAX,
                session_timeout_hours: 24,
            },
        );
        // u32::MAX minutes still fits a TimeDelta and a DateTime
        assert!(ctx.record_failed_attempt().is_ok());
        assert!(ctx.is_locked_out());

        let far = offset_from(
            Utc::now(),
            TimeDelta::try_hours(i64::from(u32::MAX)),
            "security.session_timeout_hours",
            u32::MAX,
        );
        assert!(matches!(far, Err(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn test_logout_clears_state_without_token() {
        let ctx = context();
        *lock(&ctx.user) = Some(user("editor", &[]));
        lock(&ctx.guard).attempts = 3;

        ctx.logout().await.unwrap();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.login_attempts(), 0);
    }
}
