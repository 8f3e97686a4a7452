//! Primary → fallback → emergency generation chain.
//!
//! The chain never fails: any backend error is logged and the next stage
//! takes over, ending at a canned emergency reply. Errors here are a
//! recovery path, not a user-visible condition.

use rand::Rng;
use tracing::error;

use dobby_core::types::ContextMessage;

use crate::client::GenerationClient;
use crate::emergency::emergency_response;

/// Generate a reply, falling through the backend chain on failure.
///
/// `fallback` is `None` when no fallback API key is configured — the
/// chain then goes straight from primary to the emergency responses.
pub async fn generate<R: Rng + ?Sized>(
    primary: &dyn GenerationClient,
    fallback: Option<&dyn GenerationClient>,
    rng: &mut R,
    user_message: &str,
    history: &[ContextMessage],
) -> String {
    match primary.generate_response(user_message, history).await {
        Ok(response) => return response,
        Err(e) => {
            error!(backend = %primary.name(), err = %e, "generation failed, switching to fallback");
        }
    }

    if let Some(fallback) = fallback {
        match fallback.generate_response(user_message, history).await {
            Ok(response) => return response,
            Err(e) => {
                error!(backend = %fallback.name(), err = %e, "fallback generation also failed");
            }
        }
    }

    emergency_response(rng).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct AlwaysFail;

    #[async_trait]
    impl GenerationClient for AlwaysFail {
        fn name(&self) -> &str {
            "always-fail"
        }
        async fn generate_response(
            &self,
            _user_message: &str,
            _history: &[ContextMessage],
        ) -> Result<String, GenerationError> {
            Err(GenerationError::Parse("intentional failure".to_string()))
        }
        async fn test_connection(&self) -> bool {
            false
        }
    }

    struct AlwaysOk(&'static str);

    #[async_trait]
    impl GenerationClient for AlwaysOk {
        fn name(&self) -> &str {
            "always-ok"
        }
        async fn generate_response(
            &self,
            _user_message: &str,
            _history: &[ContextMessage],
        ) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
        async fn test_connection(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn primary_success_short_circuits() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = generate(&AlwaysOk("from primary"), None, &mut rng, "hi", &[]).await;
        assert_eq!(reply, "from primary");
    }

    #[tokio::test]
    async fn fallback_takes_over_when_primary_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let fallback = AlwaysOk("from fallback");
        let reply = generate(&AlwaysFail, Some(&fallback), &mut rng, "hi", &[]).await;
        assert_eq!(reply, "from fallback");
    }

    #[tokio::test]
    async fn emergency_reply_when_no_fallback_configured() {
        let mut expected_rng = StdRng::seed_from_u64(9);
        let expected = emergency_response(&mut expected_rng);

        let mut rng = StdRng::seed_from_u64(9);
        let reply = generate(&AlwaysFail, None, &mut rng, "hi", &[]).await;
        assert_eq!(reply, expected);
    }

    #[tokio::test]
    async fn emergency_reply_when_both_backends_fail() {
        let mut rng = StdRng::seed_from_u64(3);
        let reply = generate(&AlwaysFail, Some(&AlwaysFail), &mut rng, "hi", &[]).await;
        assert!(crate::emergency::EMERGENCY_RESPONSES.contains(&reply.as_str()));
    }
}
