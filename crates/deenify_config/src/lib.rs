use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;

pub mod models;
pub use models::*;

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is loaded at most once per process. The path defaults to `.env`
/// and can be overridden with the `DOTENV_OVERRIDE` environment variable.
pub fn ensure_dotenv_loaded() {
    let dotenv_path =
        env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });
}

/// Resolves the directory holding the layered config files.
///
/// `DEENIFY_CONFIG_DIR` wins when set; otherwise the `config/` directory at
/// the workspace root is used.
fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("DEENIFY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2) // go from crates/deenify_config to the workspace root
        .unwrap_or(&manifest_dir)
        .join("config")
}

/// Loads the application configuration.
///
/// Sources are layered in ascending priority:
/// 1. `config/default.*`
/// 2. `config/{RUN_ENV}.*` (RUN_ENV defaults to "debug")
/// 3. environment variables prefixed with `DEENIFY`, `__`-separated
///    (e.g. `DEENIFY_SERVER__PORT=8086`)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let base = config_dir();

    let default_path = base.join("default");
    let env_path = base.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("DEENIFY").separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(raw_config)
}
