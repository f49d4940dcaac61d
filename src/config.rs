// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

// NOTE: HOST_VERSION must stay in sync with the `version` field in Cargo.toml.
pub const HOST_VERSION: &str = "0.1.0";

pub mod logging {
    pub const LOG_DIR_REL: &str = ".opportunity-matcher/logs";
    pub const LOG_FILE_NAME: &str = "opportunity_matcher";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}

pub mod native_messaging {
    pub const MAX_MESSAGE_SIZE_BYTES: u32 = 64 * 1024 * 1024;
}

pub mod embedding {
    pub const EMBEDDING_DIMS: usize = 384;
    pub const EMBEDDING_MODEL_NAME: &str = "all-MiniLM-L6-v2";

    // Max word-piece tokens for all-MiniLM-L6-v2 (model context limit is 256).
    pub const MAX_TOKENS: usize = 256;

    // Model files are fetched lazily from the Hugging Face mirror on first `init`.
    pub const MODEL_CDN_BASE: &str =
        "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

    // SHA256 hashes for integrity verification
    pub const MODEL_SAFETENSORS_SHA256: &str =
        "53aa51172d142c89d9012cce15ae4d6cc0ca6895895114379cacb4fab128d9db";
    pub const TOKENIZER_JSON_SHA256: &str =
        "be50c3628f2bf5bb5e3a7f17b1f74611b2561a3a27eeab05e5aa30f411572037";
    pub const CONFIG_JSON_SHA256: &str =
        "953f9c0d463486b10a6871cc2fd59f223b2c70184f49815e7efbcab5d8908b41";

    // Local model storage directory (relative to home)
    pub const MODEL_DIR_REL: &str = ".opportunity-matcher/models/all-MiniLM-L6-v2";

    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 90;

    // Offline feature-hashing backend.
    pub const HASH_EMBEDDER_NAME: &str = "feature-hash-v1";
    pub const HASH_SEED: &str = "opportunity-matcher/hash/v1";
}

pub mod scoring {
    // Rule deltas. These define the ranking behaviour and are asserted by tests;
    // changing any of them changes product output.
    pub const YEAR_IN_RANGE: f64 = 0.15;
    pub const YEAR_ADJACENT: f64 = 0.05;
    pub const YEAR_OUT_OF_RANGE: f64 = -0.10;

    pub const LOCATION_EXACT: f64 = 0.12;
    pub const LOCATION_FLEXIBLE: f64 = 0.05;
    pub const LOCATION_MISMATCH: f64 = -0.05;

    pub const STIPEND_MATCH: f64 = 0.10;
    pub const STIPEND_MISSING: f64 = -0.10;

    pub const INCLUSION_WOMEN: f64 = 0.20;
    pub const INCLUSION_LOW_INCOME: f64 = 0.15;
    pub const INCLUSION_ANY_FLAG: f64 = 0.03;

    pub const TAGS_MANY: f64 = 0.12;
    pub const TAGS_ONE: f64 = 0.05;
    pub const TAGS_MANY_THRESHOLD: usize = 2;

    pub const IRRELEVANCE_PENALTY: f64 = -0.05;

    pub const DEFAULT_YEAR_MIN: i64 = 1;
    pub const DEFAULT_YEAR_MAX: i64 = 4;

    pub const NO_PREFERENCE: &str = "no preference";
    pub const FLAG_WOMEN: &str = "women";
    pub const FLAG_LOW_INCOME: &str = "low-income";

    // Display rounding for the similarity entry in explanations.
    pub const SIMILARITY_DISPLAY_DECIMALS: i32 = 3;

    pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";
}
