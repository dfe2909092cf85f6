//! Shot Monitor - Main Entry Point

use std::time::Duration;

use clap::Parser;
use runner::{build_monitor, init_logging, render, Args};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json)?;

    info!("=== Shot Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let monitor = build_monitor(&args)?;
    let mut updates = monitor.subscribe();
    monitor.start()?;

    let print_changes = async {
        let mut last = String::new();
        while updates.changed().await.is_ok() {
            let text = render(&updates.borrow_and_update());
            if text != last {
                println!("{}\n", text);
                last = text;
            }
        }
    };
    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = print_changes => {}
        _ = deadline => info!("Run duration elapsed"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    monitor.stop();
    info!("Shot monitor stopped");
    Ok(())
}
