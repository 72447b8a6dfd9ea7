use anyhow::{Context, Result};
use async_trait::async_trait;
use locus_core::{
    LocationProvider, MapRenderer, ScreenController, ScreenState, View, view::ErrorView,
};

use crate::consent;

/// Decides whether to leave the error view by fetching again.
#[async_trait]
pub trait RetryPrompt {
    async fn should_retry(&mut self, error: &ErrorView) -> Result<bool>;
}

/// Asks on the terminal, labelled like the error view's retry control.
pub struct TerminalRetry;

#[async_trait]
impl RetryPrompt for TerminalRetry {
    async fn should_retry(&mut self, error: &ErrorView) -> Result<bool> {
        consent::ask(format!("{}?", error.retry_label)).await
    }
}

/// Mount the screen, draw every view it passes through and return the last state.
///
/// Loading is drawn before the first fetch is spawned, so it always precedes the
/// outcome and each settled state is drawn exactly once.
pub async fn run_screen<R, P>(
    provider: Box<dyn LocationProvider>,
    renderer: &mut R,
    prompt: &mut P,
) -> Result<ScreenState>
where
    R: MapRenderer,
    P: RetryPrompt,
{
    renderer.render(&View::from_state(&ScreenState::Loading))?;
    let (screen, first_fetch) = ScreenController::mount(provider);
    first_fetch.await.context("Location fetch task failed")?;

    loop {
        let state = screen.state();
        let view = View::from_state(&state);
        renderer.render(&view)?;

        let View::Error(error) = &view else {
            return Ok(state);
        };
        if !prompt.should_retry(error).await? {
            return Ok(state);
        }

        let retry = screen.retry()?;
        renderer.render(&View::from_state(&screen.state()))?;
        retry.await;
    }
}
