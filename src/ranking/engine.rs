// engine.rs - Catalog embedding stage and the rank driver.
//
// Two stages:
// 1. `embed_catalog`: validate records, compose text, embed through the cache. Runs once
//    per catalog snapshot. Malformed records are skipped and reported.
// 2. `rank`: pure scoring. Cosine similarity + rule adjustments, stable sort descending.
//    Never touches the embedder, so a rank request costs one model call (the profile).

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::error::{RankError, Result};
use super::rules::apply_rules;
use super::similarity::cosine_similarity;
use super::types::{Opportunity, Profile, ScoreExplanation};
use crate::config;
use crate::embeddings::cache::EmbeddingCache;
use crate::embeddings::text_prep::{prepare_opportunity_text, prepare_profile_text};
use crate::embeddings::TextEmbedder;

/// A validated opportunity with its vector attached.
#[derive(Debug, Clone)]
pub struct EmbeddedOpportunity {
    pub opportunity: Opportunity,
    pub embedding: Vec<f32>,
    pub cache_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// One catalog snapshot, ready to rank.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCatalog {
    pub items: Vec<EmbeddedOpportunity>,
    pub skipped: Vec<SkippedRecord>,
    pub model_name: String,
}

impl EmbeddedCatalog {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose type the profile asked for, in catalog order.
    pub fn filter_by_type<'a>(&'a self, profile: &Profile) -> Vec<&'a EmbeddedOpportunity> {
        self.items
            .iter()
            .filter(|item| profile.wants(item.opportunity.kind))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RankedOpportunity<'a> {
    pub item: &'a EmbeddedOpportunity,
    pub score: f64,
    /// Unrounded cosine similarity (the explanation carries a rounded copy).
    pub similarity: f64,
    pub explanation: ScoreExplanation,
}

/// Validate and embed a catalog. Malformed records and duplicate ids are skipped;
/// an embedder failure aborts the whole snapshot.
pub fn embed_catalog(
    records: &[Value],
    embedder: &dyn TextEmbedder,
    cache: &mut EmbeddingCache,
) -> Result<EmbeddedCatalog> {
    let mut items = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let opportunity = match Opportunity::from_value(index, record) {
            Ok(o) => o,
            Err(RankError::MalformedOpportunity { index, reason }) => {
                log::warn!("Skipping catalog record #{}: {}", index, reason);
                skipped.push(SkippedRecord { index, reason });
                continue;
            }
            Err(e) => return Err(e),
        };

        if !seen_ids.insert(opportunity.id.clone()) {
            let reason = format!("duplicate id: {}", opportunity.id);
            log::warn!("Skipping catalog record #{}: {}", index, reason);
            skipped.push(SkippedRecord { index, reason });
            continue;
        }

        let text = prepare_opportunity_text(&opportunity);
        let embedding = cache.get_or_embed(embedder, &text)?;
        if embedding.len() != embedder.dimension() {
            return Err(RankError::DimensionMismatch {
                expected: embedder.dimension(),
                actual: embedding.len(),
            });
        }

        items.push(EmbeddedOpportunity {
            opportunity,
            embedding,
            cache_key: EmbeddingCache::key(embedder.model_name(), &text),
        });
    }

    let live: HashSet<String> = items.iter().map(|i| i.cache_key.clone()).collect();
    let evicted = cache.retain(&live);

    log::info!(
        "Embedded catalog: {} items, {} skipped, {} stale cache entries evicted",
        items.len(),
        skipped.len(),
        evicted
    );

    Ok(EmbeddedCatalog {
        items,
        skipped,
        model_name: embedder.model_name().to_string(),
    })
}

/// Score and order `items` for `profile`. Ties keep input order.
pub fn rank<'a, I>(profile: &Profile, profile_vec: &[f32], items: I) -> Result<Vec<RankedOpportunity<'a>>>
where
    I: IntoIterator<Item = &'a EmbeddedOpportunity>,
{
    let mut ranked = Vec::new();

    for item in items {
        let similarity = cosine_similarity(profile_vec, &item.embedding)?;

        let mut explanation = ScoreExplanation::default();
        explanation.push("similarity", round_for_display(similarity));
        let adjustments = apply_rules(&item.opportunity, profile, &mut explanation);

        ranked.push(RankedOpportunity {
            item,
            score: similarity + adjustments,
            similarity,
            explanation,
        });
    }

    // Vec::sort_by is stable.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(ranked)
}

/// Embed the profile and rank `items` against it.
///
/// Profile vectors are per-request and never enter the catalog cache.
pub fn rank_profile<'a, I>(
    profile: &Profile,
    items: I,
    embedder: &dyn TextEmbedder,
) -> Result<Vec<RankedOpportunity<'a>>>
where
    I: IntoIterator<Item = &'a EmbeddedOpportunity>,
{
    if let Err(e) = profile.validate() {
        log::warn!("Ranking best-effort: {}", e);
    }

    let text = prepare_profile_text(profile);
    let profile_vec = embedder.embed(&text)?;
    rank(profile, &profile_vec, items)
}

fn round_for_display(v: f64) -> f64 {
    let scale = 10f64.powi(config::scoring::SIMILARITY_DISPLAY_DECIMALS);
    (v * scale).round() / scale
}
