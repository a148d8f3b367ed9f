mod bootstrap;
mod config;
mod control_api;
mod keepalive;
mod query;
mod refresh;
mod state;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bootstrap::async_main().await
}
