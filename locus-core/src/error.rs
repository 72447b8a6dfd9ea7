use thiserror::Error;

/// Message shown when the user declines location access.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permissão para acessar localização foi negada.";

/// Message shown when a provider fails without saying why.
pub const POSITION_FALLBACK_MESSAGE: &str = "Não foi possível obter sua localização.";

/// Why a single fetch attempt failed. Both kinds end the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Permissão para acessar localização foi negada.")]
    PermissionDenied,

    #[error("{0}")]
    PositionUnavailable(String),
}

impl FetchError {
    /// Wrap a provider failure, keeping its description when it has one.
    pub fn position_unavailable(err: &anyhow::Error) -> Self {
        let description = format!("{err:#}");
        if description.trim().is_empty() {
            Self::PositionUnavailable(POSITION_FALLBACK_MESSAGE.to_string())
        } else {
            Self::PositionUnavailable(description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("Retry is only available from the error view (current view: {state}).")]
    RetryUnavailable { state: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn permission_denied_uses_fixed_sentence() {
        assert_eq!(FetchError::PermissionDenied.to_string(), PERMISSION_DENIED_MESSAGE);
    }

    #[test]
    fn provider_description_is_kept_with_context_chain() {
        let err = Err::<(), _>(anyhow!("timed out after 10s"))
            .context("ip-api request failed")
            .unwrap_err();

        let fetch = FetchError::position_unavailable(&err);
        assert_eq!(
            fetch,
            FetchError::PositionUnavailable("ip-api request failed: timed out after 10s".into())
        );
    }

    #[test]
    fn empty_description_falls_back_to_generic_sentence() {
        let err = anyhow!("  ");
        let fetch = FetchError::position_unavailable(&err);

        assert_eq!(fetch.to_string(), POSITION_FALLBACK_MESSAGE);
    }
}
