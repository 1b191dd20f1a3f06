//! Storefront-facing tracking API.

use analytics_core::{
    IdentityContext, InteractionDraft, InteractionType, MenuItemAction, MenuItemActionDraft,
    MenuItemAnalytics, PageView, PageViewDraft, StoreVisit, UserInteraction, VisitDraft,
};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::recorder::EventRecorder;

/// Tracking calls for one visitor session.
///
/// Holds the identity and request context so storefront code only names
/// what happened. The `spawn_*` variants run on the tokio runtime and are
/// not awaited by the caller.
#[derive(Clone)]
pub struct Tracker {
    recorder: EventRecorder,
    identity: IdentityContext,
    user_agent: Option<String>,
    referrer: Option<String>,
}

impl Tracker {
    pub fn new(recorder: EventRecorder, identity: IdentityContext) -> Self {
        Self {
            recorder,
            identity,
            user_agent: None,
            referrer: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub async fn track_store_visit(&self, store_id: &str) -> StoreVisit {
        let mut draft = VisitDraft::new(store_id);
        draft.user_agent = self.user_agent.clone();
        draft.referrer = self.referrer.clone();
        self.recorder.record_visit(draft, &self.identity).await
    }

    pub async fn track_page_view(&self, store_id: &str, page_type: &str) -> PageView {
        let draft = PageViewDraft::new(store_id, page_type);
        self.recorder.record_page_view(draft, &self.identity).await
    }

    pub async fn track_user_interaction(
        &self,
        store_id: &str,
        interaction_type: InteractionType,
        target_id: Option<&str>,
        data: Option<Value>,
    ) -> UserInteraction {
        let mut draft = InteractionDraft::new(store_id, interaction_type);
        draft.target_id = target_id.map(str::to_string);
        draft.data = data;
        self.recorder.record_interaction(draft, &self.identity).await
    }

    pub async fn track_menu_item_analytics(
        &self,
        store_id: &str,
        menu_item_id: &str,
        action: MenuItemAction,
        time_spent: Option<u32>,
    ) -> MenuItemAnalytics {
        let mut draft = MenuItemActionDraft::new(store_id, menu_item_id, action);
        draft.time_spent = time_spent;
        self.recorder.record_menu_item_action(draft, &self.identity).await
    }

    pub fn spawn_store_visit(&self, store_id: &str) -> JoinHandle<StoreVisit> {
        let tracker = self.clone();
        let store_id = store_id.to_string();
        tokio::spawn(async move { tracker.track_store_visit(&store_id).await })
    }

    pub fn spawn_page_view(&self, store_id: &str, page_type: &str) -> JoinHandle<PageView> {
        let tracker = self.clone();
        let (store_id, page_type) = (store_id.to_string(), page_type.to_string());
        tokio::spawn(async move { tracker.track_page_view(&store_id, &page_type).await })
    }

    pub fn spawn_user_interaction(
        &self,
        store_id: &str,
        interaction_type: InteractionType,
        target_id: Option<&str>,
        data: Option<Value>,
    ) -> JoinHandle<UserInteraction> {
        let tracker = self.clone();
        let store_id = store_id.to_string();
        let target_id = target_id.map(str::to_string);
        tokio::spawn(async move {
            tracker
                .track_user_interaction(&store_id, interaction_type, target_id.as_deref(), data)
                .await
        })
    }

    pub fn spawn_menu_item_analytics(
        &self,
        store_id: &str,
        menu_item_id: &str,
        action: MenuItemAction,
        time_spent: Option<u32>,
    ) -> JoinHandle<MenuItemAnalytics> {
        let tracker = self.clone();
        let (store_id, menu_item_id) = (store_id.to_string(), menu_item_id.to_string());
        tokio::spawn(async move {
            tracker
                .track_menu_item_analytics(&store_id, &menu_item_id, action, time_spent)
                .await
        })
    }
}
