//! Best-effort persistence of storefront events.

use std::sync::Arc;

use analytics_core::{
    AnalyticsStore, IdentityContext, InteractionDraft, MenuItemActionDraft, MenuItemAnalytics,
    PageView, PageViewDraft, Result, StoreVisit, UserInteraction, VisitDraft, PLACEHOLDER_ID,
};
use chrono::Utc;
use telemetry::metrics;
use tracing::{debug, warn};
use validator::Validate;

use crate::enrichment::DeviceClassifier;

/// Records visits, page views, interactions and menu item actions.
///
/// The `record_*` methods never fail: a failed write is logged and answered
/// with a placeholder built from the input. The `try_*` methods expose the
/// underlying result.
#[derive(Clone)]
pub struct EventRecorder {
    store: Arc<dyn AnalyticsStore>,
    classifier: Arc<DeviceClassifier>,
}

impl EventRecorder {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            store,
            classifier: Arc::new(DeviceClassifier::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn AnalyticsStore> {
        &self.store
    }

    pub async fn record_visit(&self, draft: VisitDraft, identity: &IdentityContext) -> StoreVisit {
        let fallback = draft.clone();
        match self.try_record_visit(draft, identity).await {
            Ok(visit) => visit,
            Err(e) => {
                record_failure("visit", &fallback.store_id, &e);
                let mut visit = fallback.into_visit(identity, Utc::now());
                self.classifier.enrich(&mut visit);
                visit.id = PLACEHOLDER_ID.to_string();
                visit
            }
        }
    }

    pub async fn try_record_visit(
        &self,
        draft: VisitDraft,
        identity: &IdentityContext,
    ) -> Result<StoreVisit> {
        draft.validate()?;
        let mut visit = draft.into_visit(identity, Utc::now());
        self.classifier.enrich(&mut visit);

        let visit = self.store.insert_visit(visit).await?;
        record_success("visit", &visit.store_id, &visit.id);
        Ok(visit)
    }

    pub async fn record_page_view(&self, draft: PageViewDraft, identity: &IdentityContext) -> PageView {
        let fallback = draft.clone();
        match self.try_record_page_view(draft, identity).await {
            Ok(view) => view,
            Err(e) => {
                record_failure("page_view", &fallback.store_id, &e);
                let mut view = fallback.into_page_view(identity, Utc::now());
                view.id = PLACEHOLDER_ID.to_string();
                view
            }
        }
    }

    pub async fn try_record_page_view(
        &self,
        draft: PageViewDraft,
        identity: &IdentityContext,
    ) -> Result<PageView> {
        draft.validate()?;
        let view = self
            .store
            .insert_page_view(draft.into_page_view(identity, Utc::now()))
            .await?;
        record_success("page_view", &view.store_id, &view.id);
        Ok(view)
    }

    /// Records an interaction and, once it is stored, clears the session's
    /// bounce flag.
    pub async fn record_interaction(
        &self,
        draft: InteractionDraft,
        identity: &IdentityContext,
    ) -> UserInteraction {
        let fallback = draft.clone();
        match self.try_record_interaction(draft, identity).await {
            Ok(interaction) => interaction,
            Err(e) => {
                record_failure("interaction", &fallback.store_id, &e);
                let mut interaction = fallback.into_interaction(identity, Utc::now());
                interaction.id = PLACEHOLDER_ID.to_string();
                interaction
            }
        }
    }

    pub async fn try_record_interaction(
        &self,
        draft: InteractionDraft,
        identity: &IdentityContext,
    ) -> Result<UserInteraction> {
        draft.validate()?;
        let interaction = self
            .store
            .insert_interaction(draft.into_interaction(identity, Utc::now()))
            .await?;
        record_success("interaction", &interaction.store_id, &interaction.id);

        self.mark_session_engaged(&interaction.store_id, &interaction.session_id)
            .await;
        Ok(interaction)
    }

    pub async fn record_menu_item_action(
        &self,
        draft: MenuItemActionDraft,
        identity: &IdentityContext,
    ) -> MenuItemAnalytics {
        let fallback = draft.clone();
        match self.try_record_menu_item_action(draft, identity).await {
            Ok(action) => action,
            Err(e) => {
                record_failure("menu_item_action", &fallback.store_id, &e);
                let mut action = fallback.into_action(identity, Utc::now());
                action.id = PLACEHOLDER_ID.to_string();
                action
            }
        }
    }

    pub async fn try_record_menu_item_action(
        &self,
        draft: MenuItemActionDraft,
        identity: &IdentityContext,
    ) -> Result<MenuItemAnalytics> {
        draft.validate()?;
        let action = self
            .store
            .insert_menu_item_action(draft.into_action(identity, Utc::now()))
            .await?;
        record_success("menu_item_action", &action.store_id, &action.id);
        Ok(action)
    }

    /// Clears the bounce flag of a session. Failures are logged and counted.
    pub async fn mark_session_engaged(&self, store_id: &str, session_id: &str) {
        if let Err(e) = self.store.mark_session_engaged(store_id, session_id).await {
            metrics().bounce_update_failures.inc();
            warn!(
                store_id = store_id,
                session_id = session_id,
                error = %e,
                "Failed to clear bounce flag"
            );
        }
    }
}

fn record_success(kind: &'static str, store_id: &str, id: &str) {
    metrics().events_recorded.inc();
    debug!(kind = kind, store_id = store_id, id = id, "Recorded event");
}

fn record_failure(kind: &'static str, store_id: &str, error: &analytics_core::Error) {
    metrics().record_failures.inc();
    warn!(
        kind = kind,
        store_id = store_id,
        code = error.error_code().unwrap_or("-"),
        error = %error,
        "Failed to record event"
    );
}
