//! Storefront tracking endpoints.
//!
//! Recording never fails once the request is well formed: a backend
//! outage yields a 200 carrying a placeholder whose id is `"error"`.

use analytics_core::{
    IdentityContext, InteractionDraft, MenuItemActionDraft, MenuItemAnalytics, PageView,
    PageViewDraft, StoreVisit, UserInteraction, VisitDraft,
};
use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::debug;

use crate::extractors::ClientContext;
use crate::response::ApiError;
use crate::state::AppState;

/// A tracking body: the client-held identity plus the event draft.
#[derive(Debug, Deserialize)]
pub struct TrackRequest<D> {
    pub visitor_id: String,
    pub session_id: String,
    #[serde(flatten)]
    pub event: D,
}

impl<D> TrackRequest<D> {
    fn into_parts(self) -> Result<(IdentityContext, D), ApiError> {
        let identity = IdentityContext::new(self.visitor_id, self.session_id)?;
        Ok((identity, self.event))
    }
}

/// POST /track/visit
pub async fn visit_handler(
    State(state): State<AppState>,
    client: ClientContext,
    Json(request): Json<TrackRequest<VisitDraft>>,
) -> Result<Json<StoreVisit>, ApiError> {
    let (identity, mut draft) = request.into_parts()?;
    if draft.user_agent.is_none() {
        draft.user_agent = client.user_agent;
    }
    if draft.referrer.is_none() {
        draft.referrer = client.referrer;
    }

    debug!(store_id = %draft.store_id, session_id = %identity.session_id, "Tracking visit");
    Ok(Json(state.recorder.record_visit(draft, &identity).await))
}

/// POST /track/page-view
pub async fn page_view_handler(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest<PageViewDraft>>,
) -> Result<Json<PageView>, ApiError> {
    let (identity, draft) = request.into_parts()?;
    Ok(Json(state.recorder.record_page_view(draft, &identity).await))
}

/// POST /track/interaction
pub async fn interaction_handler(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest<InteractionDraft>>,
) -> Result<Json<UserInteraction>, ApiError> {
    let (identity, draft) = request.into_parts()?;
    Ok(Json(state.recorder.record_interaction(draft, &identity).await))
}

/// POST /track/menu-item
pub async fn menu_item_handler(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest<MenuItemActionDraft>>,
) -> Result<Json<MenuItemAnalytics>, ApiError> {
    let (identity, draft) = request.into_parts()?;
    Ok(Json(state.recorder.record_menu_item_action(draft, &identity).await))
}
