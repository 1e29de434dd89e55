//! strand - plucked strings and wavetable voices on the default output device
//!
//! Run with: cargo run --bin strand [config.toml]

mod app;

use std::path::PathBuf;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use strand_dsp::EngineConfig;

use app::Strand;

fn load_config(path: Option<PathBuf>) -> EyreResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&text)
        .wrap_err_with(|| format!("failed to load {}", path.display()))?;

    log::info!("loaded config from {}", path.display());
    Ok(config)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;

    Strand::new(config).strum_interval_ms(180).run()
}
