#![warn(missing_debug_implementations)]

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;
use wgpu_context::WgpuContext;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::App;

#[tokio::main]
async fn main() {
    run().await.expect("failed to run");
}

mod app;
mod wgpu_context;

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // A machine without a usable adapter still gets a window with a static
    // background; only the backdrop is disabled.
    let ctx = match WgpuContext::new().await {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            error!(?err, "no usable render surface, backdrop disabled");
            None
        }
    };

    let mut app = App::new(ctx, Arc::new(Mutex::new(Default::default())));

    let event_loop =
        EventLoop::new().context("failed to initialize event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop
        .run_app(&mut app)
        .context("failed to run event loop")?;

    Ok(())
}
