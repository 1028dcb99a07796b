use ascend_core::{AppError, AppResult};
use ascend_domain::Principal;
use async_trait::async_trait;
use thiserror::Error;

/// Sign-in failures surfaced by the identity provider.
///
/// Retry is allowed for all of these; they never force sign-out because no
/// session exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The email is not syntactically valid.
    #[error("invalid email format")]
    InvalidEmail,
    /// No provider account exists for the email.
    #[error("user not found")]
    UserNotFound,
    /// The password does not match.
    #[error("wrong password")]
    WrongPassword,
    /// The provider throttled this account after repeated failures.
    #[error("too many attempts")]
    TooManyAttempts,
    /// Any other provider-reported failure, passed through.
    #[error("auth provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Returns the human-readable message shown on the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail => "Please enter a valid email address.".to_owned(),
            Self::UserNotFound => "No account exists for this email.".to_owned(),
            Self::WrongPassword => "Incorrect password. Please try again.".to_owned(),
            Self::TooManyAttempts => {
                "Too many failed attempts. Please wait a moment and try again.".to_owned()
            }
            Self::Provider(detail) => format!("Sign-in failed: {detail}"),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        AppError::Unauthorized(value.to_string())
    }
}

/// Boundary to the hosted identity provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Authenticates with email and password, yielding the session principal.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    /// Ends the provider session.
    ///
    /// Called on explicit logout and on forced sign-out after access
    /// revocation; must be safe to call more than once.
    async fn sign_out(&self) -> AppResult<()>;
}
