use anyhow::{Context, Result};
use async_trait::async_trait;
use inquire::{Confirm, InquireError};
use locus_core::{LocationProvider, LocationSample, PermissionResponse};

pub const CONSENT_QUESTION: &str = "Permitir que o locus acesse sua localização?";

/// Asks the user before letting the wrapped provider locate them.
#[derive(Debug)]
pub struct ConsentPrompt {
    inner: Box<dyn LocationProvider>,
}

impl ConsentPrompt {
    pub fn new(inner: Box<dyn LocationProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LocationProvider for ConsentPrompt {
    async fn request_permission(&self) -> Result<PermissionResponse> {
        if !ask(CONSENT_QUESTION).await? {
            return Ok(PermissionResponse::denied());
        }
        self.inner.request_permission().await
    }

    async fn current_position(&self) -> Result<LocationSample> {
        self.inner.current_position().await
    }
}

/// Yes/no prompt off the async runtime.
pub async fn ask(question: impl Into<String>) -> Result<bool> {
    let question = question.into();
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::new(&question).with_default(true).prompt()
    })
    .await
    .context("Prompt task panicked")?;

    interpret(answer)
}

/// Esc and a missing terminal both count as "no".
fn interpret(answer: Result<bool, InquireError>) -> Result<bool> {
    match answer {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled) => Ok(false),
        Err(InquireError::NotTTY) => {
            tracing::warn!("no terminal to answer on, assuming no (pass --yes to skip the prompt)");
            Ok(false)
        }
        Err(err) => Err(err).context("Failed to read answer from terminal"),
    }
}
