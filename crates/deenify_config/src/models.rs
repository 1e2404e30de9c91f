// --- File: crates/deenify_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., DATABASE_URL loaded via DEENIFY_DATABASE__URL
}

// --- Firebase Config ---
// Holds non-secret FCM config. The service account key stays on disk and
// is referenced by path only.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub key_path: Option<String>,
    /// FCM API base, overridable for local testing.
    pub api_base_url: Option<String>,
}

// --- Prayer Times Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrayerConfig {
    /// Aladhan API base, e.g. "https://api.aladhan.com/v1".
    pub api_base_url: Option<String>,
    /// Calculation method passed through to the timings API.
    pub method: Option<u32>,
}

// --- Quran Text Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QuranConfig {
    /// alquran.cloud API base, e.g. "https://api.alquran.cloud/v1".
    pub api_base_url: Option<String>,
}

// --- Reverse Geocoding Config ---
// Holds non-secret LocationIQ config.
// Secret loaded directly from env var: LOCATIONIQ_API_KEY
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocationConfig {
    pub api_base_url: Option<String>,
}

// --- API Auth Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>, // Loaded via DEENIFY_AUTH__API_KEY
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_firebase: bool,
    #[serde(default)]
    pub use_prayer: bool,
    #[serde(default)]
    pub use_quran: bool,
    #[serde(default)]
    pub use_location: bool,
    #[serde(default)]
    pub use_events: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // Central DB config
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub prayer: Option<PrayerConfig>,
    #[serde(default)]
    pub quran: Option<QuranConfig>,
    #[serde(default)]
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}
