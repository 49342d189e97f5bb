#[path = "notivm/app.rs"]
mod app;
#[path = "notivm/args.rs"]
mod args;
#[path = "notivm/logging.rs"]
mod logging;
#[path = "notivm/signals.rs"]
mod signals;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
