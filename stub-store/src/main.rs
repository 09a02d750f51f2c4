use anyhow::Context;
use clap::Parser;
use stub_store::{router, SharedStore};

#[derive(Parser, Debug)]
#[command(name = "stub-store")]
#[command(about = "In-memory data store answering the latency tester's procedures", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "STUB_STORE_BIND", default_value = "127.0.0.1:3013")]
    bind: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _g = rt.enter();
    rt.block_on(run_server(&args.bind))
}

async fn run_server(bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %bind, "stub store listening");
    axum::serve(listener, router(SharedStore::new()))
        .await
        .context("Server failed")
}
