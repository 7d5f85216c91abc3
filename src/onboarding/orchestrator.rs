//! OnboardingOrchestrator — fetch, resolve, map, stage.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client_service::{ClientDataService, ClientLookup, is_empty_result};
use crate::error::OnboardingError;
use crate::store::ContextStore;

use super::flags::ClientFlags;
use super::navigation::{NavigationDecision, map_to_navigation};
use super::stage::resolve;

/// Drives one onboarding decision from a client lookup.
///
/// Holds no per-decision state; every call fetches its own snapshot.
#[derive(Clone)]
pub struct OnboardingOrchestrator {
    service: Arc<dyn ClientDataService>,
    store: Arc<dyn ContextStore>,
}

impl OnboardingOrchestrator {
    pub fn new(service: Arc<dyn ClientDataService>, store: Arc<dyn ContextStore>) -> Self {
        Self { service, store }
    }

    /// The staged-context store decisions write into.
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Fetch the client, resolve its stage, and stage context for the target
    /// screen. The caller performs the navigation.
    pub async fn decide(&self, lookup: ClientLookup) -> Result<NavigationDecision, OnboardingError> {
        self.decide_with_cancel(lookup, &CancellationToken::new())
            .await
    }

    /// Like [`decide`](Self::decide), but gives up as soon as `cancel` fires.
    ///
    /// A cancelled decision never writes staged context, so a screen that
    /// went away cannot clobber context staged by a newer decision.
    pub async fn decide_with_cancel(
        &self,
        lookup: ClientLookup,
        cancel: &CancellationToken,
    ) -> Result<NavigationDecision, OnboardingError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%lookup, "Decision cancelled during fetch");
                return Err(OnboardingError::Cancelled);
            }
            result = self.service.fetch_client(&lookup) => result,
        };

        let raw = match fetched {
            Ok(Some(raw)) if !is_empty_result(&raw) => raw,
            Ok(_) => {
                info!(%lookup, "No client found");
                return Err(OnboardingError::NoClientFound {
                    lookup: lookup.to_string(),
                });
            }
            Err(e) => {
                warn!(%lookup, error = %e, "Client fetch failed");
                return Err(OnboardingError::FetchFailed(e));
            }
        };

        let flags = ClientFlags::from_json(&raw).map_err(|reason| {
            warn!(%lookup, %reason, "Malformed client record");
            OnboardingError::MalformedFlags(reason)
        })?;

        let stage = resolve(&flags);
        let decision = map_to_navigation(stage, &flags);

        if cancel.is_cancelled() {
            debug!(client_id = %flags.id, "Decision cancelled before staging");
            return Err(OnboardingError::Cancelled);
        }

        if let Some(context) = &decision.staged_context {
            let entries = context.entries();
            if let Err(e) = self.store.set_many(&entries).await {
                warn!(client_id = %flags.id, error = %e, "Failed to stage context");
                // Never leave half of one decision next to half of another.
                for (key, _) in &entries {
                    if let Err(e) = self.store.remove(key).await {
                        warn!(key = %key, error = %e, "Failed to clear staged context");
                    }
                }
                return Err(OnboardingError::Store(e));
            }
        }

        info!(
            client_id = %decision.client_id,
            stage = %decision.stage,
            route = %decision.target,
            staged = decision.staged_context.is_some(),
            "Onboarding decision resolved"
        );
        Ok(decision)
    }

    /// Run a decision in the background, tied to a handle.
    ///
    /// Dropping the handle cancels the decision, which is what a screen does
    /// when it unmounts before the fetch completes.
    pub fn spawn_decide(&self, lookup: ClientLookup) -> DecisionHandle {
        let token = CancellationToken::new();
        let orchestrator = self.clone();
        let task_token = token.clone();
        let join = tokio::spawn(async move {
            orchestrator
                .decide_with_cancel(lookup, &task_token)
                .await
        });
        DecisionHandle { token, join }
    }
}

/// An in-flight decision. Cancelled on drop.
pub struct DecisionHandle {
    token: CancellationToken,
    join: JoinHandle<Result<NavigationDecision, OnboardingError>>,
}

impl DecisionHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the decision. A panicked or aborted task counts as cancelled.
    pub async fn outcome(mut self) -> Result<NavigationDecision, OnboardingError> {
        match (&mut self.join).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Decision task did not complete");
                Err(OnboardingError::Cancelled)
            }
        }
    }
}

impl Drop for DecisionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// What a screen should show for a decision result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Navigate to the decided route.
    Navigate { decision: NavigationDecision },
    /// The service answered but there is no client: "no client found".
    NoClient,
    /// The decision could not be made: error banner.
    Error { message: String },
    /// The decision was abandoned; nothing to show.
    Cancelled,
}

impl From<Result<NavigationDecision, OnboardingError>> for DecisionOutcome {
    fn from(result: Result<NavigationDecision, OnboardingError>) -> Self {
        match result {
            Ok(decision) => Self::Navigate { decision },
            Err(OnboardingError::NoClientFound { .. }) => Self::NoClient,
            Err(OnboardingError::Cancelled) => Self::Cancelled,
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }
}
