use std::collections::HashMap;

use ascend_application::{AuthError, AuthGateway};
use ascend_core::AppResult;
use ascend_domain::Principal;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Development auth gateway backed by a fixed credential table.
///
/// Mirrors the provider's observable behavior closely enough for the client
/// layer: distinct error codes for a malformed email, an unknown account, a
/// wrong password, and throttling after repeated failures on one account.
pub struct InMemoryAuthGateway {
    accounts: HashMap<String, String>,
    failures: RwLock<HashMap<String, u32>>,
    max_attempts: u32,
}

impl InMemoryAuthGateway {
    /// Creates a gateway with `(email, password)` accounts.
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
            failures: RwLock::new(HashMap::new()),
            max_attempts: 5,
        }
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') || !email.contains('.') {
            return Err(AuthError::InvalidEmail);
        }

        {
            let failures = self.failures.read().await;
            if failures.get(&email).copied().unwrap_or(0) >= self.max_attempts {
                return Err(AuthError::TooManyAttempts);
            }
        }

        let Some(stored) = self.accounts.get(&email) else {
            return Err(AuthError::UserNotFound);
        };

        if stored != password {
            let mut failures = self.failures.write().await;
            *failures.entry(email.clone()).or_insert(0) += 1;
            return Err(AuthError::WrongPassword);
        }

        self.failures.write().await.remove(&email);
        tracing::debug!(%email, "signed in");
        Ok(Principal::new(format!("auth|{email}"), email))
    }

    async fn sign_out(&self) -> AppResult<()> {
        tracing::debug!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ascend_application::{AuthError, AuthGateway};

    use super::InMemoryAuthGateway;

    fn gateway() -> InMemoryAuthGateway {
        InMemoryAuthGateway::new([("asha@example.com".to_owned(), "secret".to_owned())])
    }

    #[tokio::test]
    async fn valid_credentials_yield_a_principal() {
        let principal = gateway().sign_in("Asha@Example.com", "secret").await;
        assert_eq!(
            principal.map(|principal| principal.email().to_owned()),
            Ok("asha@example.com".to_owned())
        );
    }

    #[tokio::test]
    async fn error_codes_are_distinguished() {
        let gateway = gateway();
        assert_eq!(
            gateway.sign_in("not-an-email", "x").await.err(),
            Some(AuthError::InvalidEmail)
        );
        assert_eq!(
            gateway.sign_in("ghost@example.com", "x").await.err(),
            Some(AuthError::UserNotFound)
        );
        assert_eq!(
            gateway.sign_in("asha@example.com", "wrong").await.err(),
            Some(AuthError::WrongPassword)
        );
    }

    #[tokio::test]
    async fn repeated_failures_trip_the_throttle() {
        let gateway = gateway();
        for _ in 0..5 {
            let _ = gateway.sign_in("asha@example.com", "wrong").await;
        }
        assert_eq!(
            gateway.sign_in("asha@example.com", "secret").await.err(),
            Some(AuthError::TooManyAttempts)
        );
    }
}
