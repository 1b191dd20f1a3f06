//! Folds daily rollups and raw event rows into report shapes.
//!
//! Everything here is pure; fetching happens in the reporting service.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::entities::{DailyAnalytics, MenuItemAction, MenuItemActionRecord, UserInteraction};
use crate::summary::{
    AnalyticsSummary, CategoryPerformance, DailyTrend, InteractionCount, MenuItemPerformance,
};

/// Number of interaction types reported in a summary.
pub const TOP_INTERACTIONS: usize = 5;

/// Counts keys and returns the `n` most frequent.
///
/// Ties keep first-encounter order.
pub fn rank_counts<K, I>(keys: I, n: usize) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, u64)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

/// Ranks interaction types by occurrence.
pub fn top_interactions(interactions: &[UserInteraction], n: usize) -> Vec<InteractionCount> {
    rank_counts(interactions.iter().map(|i| i.interaction_type), n)
        .into_iter()
        .map(|(t, count)| InteractionCount {
            interaction_type: t.as_str().to_string(),
            count,
        })
        .collect()
}

/// Folds daily rollups and the range's interactions into a summary.
pub fn summarize(daily: &[DailyAnalytics], interactions: &[UserInteraction]) -> AnalyticsSummary {
    let mut rows: Vec<&DailyAnalytics> = daily.iter().collect();
    rows.sort_by_key(|d| d.date);

    let mut summary = AnalyticsSummary::default();
    let mut bounced: u64 = 0;
    let mut duration_sum = 0.0;

    for day in &rows {
        let interactions = day.total_interactions();

        summary.total_visits += day.total_visits;
        summary.total_page_views += day.total_page_views;
        summary.total_interactions += interactions;
        duration_sum += day.avg_session_duration;
        bounced += day.bounced_sessions();

        summary.device_breakdown.mobile += day.mobile_visits;
        summary.device_breakdown.desktop += day.desktop_visits;
        summary.device_breakdown.tablet += day.tablet_visits;

        summary.daily_trends.push(DailyTrend {
            date: day.date,
            visits: day.total_visits,
            page_views: day.total_page_views,
            interactions,
        });
    }

    if !rows.is_empty() {
        summary.avg_session_duration = round1(duration_sum / rows.len() as f64);
    }
    summary.bounce_rate = percentage(bounced, summary.total_visits);
    summary.unique_visitors = summary.total_visits;
    summary.top_interactions = top_interactions(interactions, TOP_INTERACTIONS);

    summary
}

/// `(clicks + shares) / views * 100`, zero when there are no views.
pub fn engagement_rate(clicks: u64, shares: u64, views: u64) -> f64 {
    percentage(clicks + shares, views)
}

/// Percentage change from `previous` to `current`.
pub fn growth_rate(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return if current == 0 { 0.0 } else { 100.0 };
    }
    round1((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// Per-item engagement, highest engagement first.
pub fn menu_item_performance(rows: &[MenuItemActionRecord]) -> Vec<MenuItemPerformance> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut items: Vec<MenuItemPerformance> = Vec::new();

    for row in rows {
        let id = row.action.menu_item_id.as_str();
        let i = *index.entry(id).or_insert_with(|| {
            items.push(MenuItemPerformance {
                menu_item_id: id.to_string(),
                menu_item_name: row.menu_item_name.clone(),
                category_name: row.category_name.clone(),
                views: 0,
                clicks: 0,
                hover_time: 0,
                shares: 0,
                engagement_rate: 0.0,
            });
            items.len() - 1
        });

        let item = &mut items[i];
        match row.action.action_type {
            MenuItemAction::View => item.views += 1,
            MenuItemAction::Click => item.clicks += 1,
            MenuItemAction::Hover => {
                item.hover_time += u64::from(row.action.time_spent.unwrap_or(0))
            }
            MenuItemAction::Share => item.shares += 1,
        }
    }

    for item in &mut items {
        item.engagement_rate = engagement_rate(item.clicks, item.shares, item.views);
    }
    items.sort_by(|a, b| b.engagement_rate.total_cmp(&a.engagement_rate));
    items
}

/// Per-category engagement, highest engagement first.
///
/// Actions on items without a category are not attributed anywhere.
pub fn category_performance(rows: &[MenuItemActionRecord]) -> Vec<CategoryPerformance> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut categories: Vec<CategoryPerformance> = Vec::new();
    let mut items: Vec<HashSet<&str>> = Vec::new();

    for row in rows {
        let Some(category_id) = row.category_id.as_deref() else {
            continue;
        };
        let i = *index.entry(category_id).or_insert_with(|| {
            categories.push(CategoryPerformance {
                category_id: category_id.to_string(),
                category_name: row
                    .category_name
                    .clone()
                    .unwrap_or_else(|| category_id.to_string()),
                total_views: 0,
                total_clicks: 0,
                total_shares: 0,
                items_count: 0,
                engagement_rate: 0.0,
            });
            items.push(HashSet::new());
            categories.len() - 1
        });

        items[i].insert(row.action.menu_item_id.as_str());
        let category = &mut categories[i];
        match row.action.action_type {
            MenuItemAction::View => category.total_views += 1,
            MenuItemAction::Click => category.total_clicks += 1,
            MenuItemAction::Share => category.total_shares += 1,
            MenuItemAction::Hover => {}
        }
    }

    for (category, item_ids) in categories.iter_mut().zip(&items) {
        category.items_count = item_ids.len() as u64;
        category.engagement_rate = engagement_rate(
            category.total_clicks,
            category.total_shares,
            category.total_views,
        );
    }
    categories.sort_by(|a, b| b.engagement_rate.total_cmp(&a.engagement_rate));
    categories
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
