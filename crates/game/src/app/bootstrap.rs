use engine::{
    compile_town_defs, resolve_app_paths, ContentCompileError, LoopConfig, Scene, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::town::{load_tuning, TownScene, TuningError, TUNING_FILE_NAME};

const SEED_ENV_VAR: &str = "HAMLET_SEED";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error("{var} must be an unsigned integer, got {value:?}")]
    InvalidSeed { var: &'static str, value: String },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Hamlet Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        content_dir = %paths.base_content_dir.display(),
        "paths_resolved"
    );

    let mut tuning = load_tuning(&paths.base_content_dir.join(TUNING_FILE_NAME))?;
    if let Some(seed) = seed_from_env()? {
        info!(seed, "seed_override");
        tuning.seed = seed;
    }

    let defs = compile_town_defs(&paths.base_content_dir)?;
    info!(
        objects = defs.objects().len(),
        npcs = defs.npcs().len(),
        dialogues = defs.dialogues().len(),
        challenges = defs.challenges().len(),
        "content_compiled"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(TownScene::new(defs, tuning)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn seed_from_env() -> Result<Option<u64>, BootstrapError> {
    match std::env::var(SEED_ENV_VAR) {
        Ok(raw) => parse_seed(&raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_seed(raw: &str) -> Result<u64, BootstrapError> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| BootstrapError::InvalidSeed {
        var: SEED_ENV_VAR,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_accepts_decimal_and_hex() {
        assert_eq!(parse_seed("42").expect("decimal"), 42);
        assert_eq!(parse_seed(" 0x10 ").expect("hex"), 16);
    }

    #[test]
    fn seed_rejects_garbage() {
        let err = parse_seed("soon").expect_err("invalid");
        assert!(matches!(err, BootstrapError::InvalidSeed { .. }));
        assert!(err.to_string().contains("HAMLET_SEED"));
    }
}
