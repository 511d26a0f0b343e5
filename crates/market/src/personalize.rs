//! Personalized recommendations from client-supplied browsing hints.
//!
//! The resolver walks a fixed fallback chain — spotlight signal, most
//! recent viewed subtype, most recent viewed category, then the default
//! category — and returns the first step that yields any listings. Hints
//! are untrusted input: they only ever select which public, active
//! listings to show, and a failing store lookup on one step degrades to
//! the next step instead of failing the response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use medina_core::contracts::ListingStore;
use medina_core::filter::ListingFilter;
use medina_core::listing::Listing;
use medina_core::CoreError;

use crate::config::FeedPolicy;

/// A subtype the client recently viewed: one attribute pair scoped to a
/// category, e.g. `vehicles` / `make` = `toyota`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeView {
    pub category: String,
    pub type_key: String,
    pub type_value: String,
}

/// An explicit, strongest-priority interest signal (a tapped promo tile or
/// saved search).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotlightSignal {
    pub category: String,
    pub type_key: String,
    pub type_value: String,
}

/// Untrusted browsing hints from the client. Lists are ordered most recent
/// first; only the head of each list participates in resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowseHints {
    #[serde(default)]
    pub spotlight: Option<SpotlightSignal>,
    #[serde(default)]
    pub viewed_subtypes: Vec<SubtypeView>,
    #[serde(default)]
    pub viewed_categories: Vec<String>,
}

pub struct PersonalizationResolver {
    store: Arc<dyn ListingStore>,
    policy: FeedPolicy,
}

impl PersonalizationResolver {
    pub fn new(store: Arc<dyn ListingStore>, policy: FeedPolicy) -> Self {
        Self { store, policy }
    }

    /// Resolve up to `limit` recommended listings.
    ///
    /// Always returns `Ok`: exhausting the chain produces the default
    /// category's listings, and even that step degrades to empty on a
    /// store failure.
    pub async fn recommend(
        &self,
        hints: &BrowseHints,
        limit: usize,
    ) -> Result<Vec<Listing>, CoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(spotlight) = &hints.spotlight {
            let filter = ListingFilter::for_subtype(
                spotlight.category.clone(),
                spotlight.type_key.clone(),
                spotlight.type_value.clone(),
            );
            let items = self.try_source("spotlight", &filter, limit).await;
            if !items.is_empty() {
                return Ok(items);
            }
        }

        if let Some(view) = hints.viewed_subtypes.first() {
            let filter = ListingFilter::for_subtype(
                view.category.clone(),
                view.type_key.clone(),
                view.type_value.clone(),
            );
            let items = self.try_source("viewed-subtype", &filter, limit).await;
            if !items.is_empty() {
                return Ok(items);
            }
        }

        if let Some(category) = hints.viewed_categories.first() {
            let filter = ListingFilter::for_category(category.clone());
            let items = self.try_source("viewed-category", &filter, limit).await;
            if !items.is_empty() {
                return Ok(items);
            }
        }

        let filter = ListingFilter::for_category(self.policy.default_category.clone());
        Ok(self.try_source("default-category", &filter, limit).await)
    }

    async fn try_source(
        &self,
        source: &'static str,
        filter: &ListingFilter,
        limit: usize,
    ) -> Vec<Listing> {
        match self.store.query(filter, limit as i64, 0).await {
            Ok((items, _)) => items,
            Err(err) => {
                tracing::warn!(error = %err, source,
                    "Recommendation source failed; falling through");
                Vec::new()
            }
        }
    }
}
