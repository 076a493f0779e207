use backend_mock::{MockBackend, SnippetFixture};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let fixtures_path = env::var("FIXTURES_PATH").unwrap_or_else(|_| "./fixtures".to_string());
    let addr = env::var("BACKEND_MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let server = if let Ok(fixture_file) = fs::read_to_string(format!("{}/snippets.yaml", fixtures_path)) {
        tracing::info!("Loading snippets from {}/snippets.yaml", fixtures_path);
        MockBackend::with_fixture(SnippetFixture::from_yaml(&fixture_file)?)
    } else {
        tracing::info!("No fixture file found, using default test fixture");
        MockBackend::new()
    };

    server.serve(&addr).await?;

    Ok(())
}
