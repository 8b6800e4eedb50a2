use docembed_core::config::Config;
use docembed_core::pipeline;
use docembed_embed::get_default_embedder;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| { tracing::error!("Error loading config: {}", e); e })?;
    pipeline::run(&config, || get_default_embedder(&config))?;
    Ok(())
}
