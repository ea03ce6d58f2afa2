use clap::Parser;
use plugin_studio_cli::PluginStudioCli;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = PluginStudioCli::parse();
    let mut stdout = std::io::stdout().lock();
    plugin_studio_cli::run(cli, &mut stdout).await
}
