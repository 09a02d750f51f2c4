use anyhow::Context;
use clap::Parser;
use latency_tester::{
    load_payload, render, report, BenchConfig, Cli, Orchestrator, Payload, RpcConnector,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn".into()),
        )
        .init();

    let config = BenchConfig::try_from(Cli::parse()).context("Invalid configuration")?;
    let payload = load_payload(&config.mocks_dir, config.payload).context("Failed to load payload")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_tests(config, payload))
}

async fn run_tests(config: BenchConfig, payload: Payload) -> anyhow::Result<()> {
    let connector = RpcConnector::new(config.address.clone(), config.connect);
    tracing::info!(
        addr = %config.address,
        tests = ?config.tests,
        payload_bytes = payload.len(),
        "latency tester starting"
    );
    for test in &config.tests {
        let results = Orchestrator::new(connector.clone())
            .shape(test.shape(config.save_in_cache))
            .call_timeout(config.call_timeout)
            .channel_capacity(config.channel_capacity)
            .run(config.workers, config.operations, payload.clone())
            .await
            .with_context(|| format!("Test {test} failed"))?;
        let name = test.to_string();
        match report(&results) {
            Ok(total) => println!("{}", render(&name, &results, Some(&total))),
            Err(e) => {
                tracing::warn!(test = %name, error = %e, "no total for test");
                println!("{}", render(&name, &results, None));
            }
        }
    }
    Ok(())
}
