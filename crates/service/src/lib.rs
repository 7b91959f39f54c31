//! This crate implements the pathfinder service: a single worker owning the
//! grids and the path finder, which applies requests received over the
//! message bus and publishes the path whenever it may have changed.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_std::prelude::FutureExt;
use pf_conf::Configuration;
use pf_messages::{Frame, FromPathfinder, ToPathfinder};
use tracing::{debug, info, warn};

pub use crate::messenger::Messenger;
pub use crate::task::PathfinderTask;

mod grids;
mod messenger;
mod task;

/// Maximum time between two path recomputation checks.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the pathfinder service until the message bus connection task
/// unexpectedly finishes.
pub async fn run(conf: Configuration) -> Result<()> {
    let mut task = PathfinderTask::load(&conf).await;

    let messenger_conf = conf.messenger();
    let messenger = Messenger::connect(
        messenger_conf.address(),
        messenger_conf.name().to_owned(),
        &ToPathfinder::NAMES,
    );
    info!("Pathfinder is running");

    loop {
        match messenger.recv().timeout(TICK_INTERVAL).await {
            Ok(Ok(frame)) => {
                if let Some(reply) = handle_frame(&mut task, &frame).await {
                    send(&messenger, reply).await?;
                }
            }
            Ok(Err(_)) => bail!("Message bus connection unexpectedly finished"),
            Err(_) => (),
        }

        if let Some(path) = task.tick() {
            send(&messenger, path).await?;
        }
    }
}

async fn handle_frame(task: &mut PathfinderTask, frame: &Frame) -> Option<FromPathfinder> {
    match ToPathfinder::decode(frame) {
        Ok(Some(message)) => task.handle(message).await,
        Ok(None) => {
            debug!("Message {} ignored", frame.name());
            None
        }
        Err(err) => {
            warn!("Malformed message {} dropped: {err}", frame.name());
            None
        }
    }
}

async fn send(messenger: &Messenger, message: FromPathfinder) -> Result<()> {
    let frame = match message.to_frame() {
        Ok(frame) => frame,
        Err(err) => {
            warn!("Failed to encode message {}: {err}", message.name());
            return Ok(());
        }
    };

    messenger
        .send(frame)
        .await
        .map_err(|_| anyhow!("Message bus connection unexpectedly finished"))
}
