mod config;
mod embeddings;
mod logging;
mod native_messaging;
mod protocol;
mod ranking;

use std::io::{stdin, stdout};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde_json::Value;

use crate::embeddings::cache::EmbeddingCache;
use crate::embeddings::engine::EmbeddingEngine;
use crate::embeddings::hashing::HashEmbedder;
use crate::embeddings::TextEmbedder;
use crate::ranking::engine::{embed_catalog, rank_profile, EmbeddedCatalog};
use crate::ranking::error::RankError;
use crate::ranking::types::Profile;

/// Everything that lives for the duration of the host process.
struct HostState {
    embedder: Option<Box<dyn TextEmbedder>>,
    cache: EmbeddingCache,
    catalog: EmbeddedCatalog,
}

impl HostState {
    fn new() -> Self {
        Self {
            embedder: None,
            cache: EmbeddingCache::new(),
            catalog: EmbeddedCatalog::default(),
        }
    }
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("[opportunity-matcher] fatal error: {e:?}");
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    logging::init_logging()?;

    log::info!("=== Opportunity matcher host started ===");

    let mut state = HostState::new();
    let mut in_stream = stdin();
    let mut out_stream = stdout();

    let mut message_count: u64 = 0;
    loop {
        let req = match native_messaging::read_message(&mut in_stream) {
            Ok(Some(r)) => r,
            Ok(None) => {
                log::info!("No more messages after {} messages, exiting", message_count);
                break;
            }
            Err(e) => {
                log::error!("Error reading message: {:?}", e);
                break;
            }
        };

        message_count += 1;
        log::info!(
            "Processing message #{}: {} (id: {})",
            message_count,
            req.method,
            req.id
        );

        let resp = match handle_request(&mut state, &req.method, &req.params) {
            Ok(result) => protocol::ok(&req.id, result),
            Err(e) => {
                log::error!("Handler error: {:?}", e);
                protocol::err(&req.id, format!("{e:#}"))
            }
        };

        if let Err(e) = native_messaging::write_json(&mut out_stream, &resp) {
            log::error!("Error sending response: {:?}", e);
            break;
        }
    }

    log::info!("=== Opportunity matcher host stopped ===");
    Ok(())
}

fn handle_request(state: &mut HostState, method: &str, params: &Value) -> anyhow::Result<Value> {
    match method {
        "hello" => handle_hello(state, params),
        "init" => handle_init(state, params),
        "loadCatalog" => handle_load_catalog(state, params),
        "rank" => handle_rank(state, params),
        "stats" => handle_stats(state),
        "clear" => handle_clear(state),
        _ => bail!("Unknown method: {method}"),
    }
}

fn handle_hello(state: &HostState, params: &Value) -> anyhow::Result<Value> {
    let client_version = params.get("clientVersion").and_then(|v| v.as_str()).unwrap_or("unknown");
    log::info!(
        "Hello from client version {}, responding with host version {}",
        client_version,
        config::HOST_VERSION
    );

    Ok(serde_json::json!({
        "type": "hello-response",
        "hostVersion": config::HOST_VERSION,
        "clientVersion": client_version,
        "embedder": require_embedder(&state.embedder).ok().map(|e| e.model_name().to_string()),
    }))
}

fn handle_init(state: &mut HostState, params: &Value) -> anyhow::Result<Value> {
    let kind = params.get("embedder").and_then(|v| v.as_str()).unwrap_or("model");

    let embedder: Box<dyn TextEmbedder> = match kind {
        "hash" => Box::new(HashEmbedder::default()),
        "model" => Box::new(load_model_embedder(params)?),
        other => bail!("unknown embedder '{other}' (expected 'model' or 'hash')"),
    };

    let switched = state
        .embedder
        .as_ref()
        .map(|e| e.model_name() != embedder.model_name())
        .unwrap_or(true);
    if switched {
        // Vectors from another model are not comparable; drop the snapshot.
        state.catalog = EmbeddedCatalog::default();
        state.cache.clear();
    }

    log::info!("Embedder ready: {} ({} dims)", embedder.model_name(), embedder.dimension());
    let result = serde_json::json!({
        "ok": true,
        "embedder": embedder.model_name(),
        "dims": embedder.dimension(),
    });
    state.embedder = Some(embedder);
    Ok(result)
}

fn load_model_embedder(params: &Value) -> anyhow::Result<EmbeddingEngine> {
    let model_dir = match params.get("modelDir").and_then(|v| v.as_str()) {
        Some(p) => PathBuf::from(p),
        None => embeddings::download::default_model_dir()?,
    };

    let unavailable = |e: anyhow::Error| RankError::ModelUnavailable(format!("{e:#}"));
    let model_dir = embeddings::download::ensure_model_files(&model_dir).map_err(unavailable)?;
    let engine = EmbeddingEngine::load(&model_dir).map_err(unavailable)?;
    Ok(engine)
}

fn require_embedder(embedder: &Option<Box<dyn TextEmbedder>>) -> anyhow::Result<&dyn TextEmbedder> {
    embedder
        .as_deref()
        .context("Embedder not initialized. Call 'init' first.")
}

fn handle_load_catalog(state: &mut HostState, params: &Value) -> anyhow::Result<Value> {
    let records: Vec<Value> = if let Some(rows) = params.get("opportunities") {
        rows.as_array()
            .cloned()
            .context("'opportunities' must be an array")?
    } else if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
        read_catalog_file(Path::new(path))?
    } else {
        bail!("Missing required parameters: opportunities or path");
    };

    let embedder = require_embedder(&state.embedder)?;
    let catalog = embed_catalog(&records, embedder, &mut state.cache)?;
    if catalog.is_empty() {
        log::warn!("Catalog is empty after validation ({} records received)", records.len());
    }

    let stats = state.cache.stats();
    let result = serde_json::json!({
        "ok": true,
        "count": catalog.len(),
        "skipped": catalog.skipped,
        "cacheHits": stats.hits,
        "cacheMisses": stats.misses,
    });
    state.catalog = catalog;
    Ok(result)
}

fn read_catalog_file(path: &Path) -> anyhow::Result<Vec<Value>> {
    log::info!("Loading catalog from {}", path.display());
    let raw = std::fs::read_to_string(path).with_context(|| format!("read catalog {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&raw).with_context(|| format!("parse catalog {}", path.display()))?;
    match parsed {
        Value::Array(rows) => Ok(rows),
        _ => bail!("catalog {} must contain a JSON array", path.display()),
    }
}

fn handle_rank(state: &mut HostState, params: &Value) -> anyhow::Result<Value> {
    let profile: Profile = match params.get("profile") {
        Some(v) => serde_json::from_value(v.clone()).context("invalid profile")?,
        None => bail!("Missing required parameters: profile"),
    };
    let limit = params.get("limit").and_then(|v| v.as_u64()).map(|n| n as usize);
    let exclude_expired = params.get("excludeExpired").and_then(|v| v.as_bool()).unwrap_or(false);

    let embedder = require_embedder(&state.embedder)?;
    log::info!(
        "Ranking for '{}' (year {}, location_pref '{}', filter {:?})",
        profile.name,
        profile.year,
        profile.location_pref,
        profile.opportunity_filter
    );

    let today = chrono::Local::now().date_naive();
    let candidates: Vec<_> = state
        .catalog
        .filter_by_type(&profile)
        .into_iter()
        .filter(|item| !exclude_expired || !item.opportunity.is_expired(today))
        .collect();

    let mut ranked = rank_profile(&profile, candidates, embedder)?;
    let total = ranked.len();
    if let Some(n) = limit {
        ranked.truncate(n);
    }

    log::info!(
        "Ranked {} of {} catalog items (returning {})",
        total,
        state.catalog.len(),
        ranked.len()
    );

    let results: Vec<Value> = ranked
        .iter()
        .map(|r| {
            serde_json::json!({
                "opportunity": r.item.opportunity,
                "score": r.score,
                "similarity": r.similarity,
                "explanation": r.explanation,
                "expired": r.item.opportunity.is_expired(today),
                "embeddingDims": r.item.embedding.len(),
            })
        })
        .collect();

    Ok(Value::Array(results))
}

fn handle_stats(state: &HostState) -> anyhow::Result<Value> {
    let stats = state.cache.stats();
    Ok(serde_json::json!({
        "catalogSize": state.catalog.len(),
        "catalogModel": state.catalog.model_name,
        "skipped": state.catalog.skipped.len(),
        "cacheEntries": stats.entries,
        "cacheHits": stats.hits,
        "cacheMisses": stats.misses,
        "embedder": require_embedder(&state.embedder).ok().map(|e| e.model_name().to_string()),
    }))
}

fn handle_clear(state: &mut HostState) -> anyhow::Result<Value> {
    state.catalog = EmbeddedCatalog::default();
    state.cache.clear();
    log::info!("Catalog and embedding cache cleared");
    Ok(serde_json::json!({ "ok": true }))
}
