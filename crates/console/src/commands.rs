//! Command execution against a [`ServiceStore`]. Everything here is generic
//! over the gateway and the output sink so it can run against an in-process
//! backend in tests.

use std::{future::Future, io::Write, time::Duration};

use aries_domain::{Service, ServiceGateway, ServiceId};
use aries_store::ServiceStore;
use thiserror::Error;
use tokio::{sync::broadcast::error::RecvError, time};
use tracing::{debug, info, warn};

use crate::cli::Command;

#[derive(Debug, Error)]
pub enum CommandError {
    /// The store surfaced an error message while running the command.
    #[error("{0}")]
    Store(String),
    #[error("service `{0}` is not registered")]
    NotFound(ServiceId),
    #[error("update payload has no `id`")]
    MissingId,
    #[error("invalid service payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub async fn execute<G, W, S>(
    store: &ServiceStore<G>,
    command: Command,
    out: &mut W,
    shutdown: S,
) -> Result<(), CommandError>
where
    G: ServiceGateway + ?Sized,
    W: Write,
    S: Future<Output = ()>,
{
    match command {
        Command::List => {
            store.fetch_services().await;
            surface_error(store)?;
            for service in store.all_services() {
                writeln!(out, "{}", serde_json::to_string(&service)?)?;
            }
        }
        Command::Show { id } => {
            let id = ServiceId::parse(&id);
            store.fetch_services().await;
            surface_error(store)?;
            let service = store.find_by_id(&id).ok_or(CommandError::NotFound(id))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&service)?)?;
        }
        Command::Add { payload } => {
            let service = parse_payload(&payload)?;
            store.submit_new_service(service).await;
            surface_error(store)?;
            writeln!(out, "added; {} service(s) cached", store.count())?;
        }
        Command::Update { payload } => {
            let service = parse_payload(&payload)?;
            let id = service.id().cloned().ok_or(CommandError::MissingId)?;

            // Load the registry first so the accepted record has a slot to land in.
            store.fetch_services().await;
            surface_error(store)?;
            store.submit_service_update(service.clone()).await;
            surface_error(store)?;

            if store.find_by_id(&id).as_ref() == Some(&service) {
                writeln!(out, "updated {id}")?;
            } else {
                writeln!(out, "update of {id} accepted, but it is not cached locally")?;
            }
        }
        Command::Watch { interval_secs } => {
            watch(store, Duration::from_secs(interval_secs.max(1)), out, shutdown).await?;
        }
    }

    Ok(())
}

/// Re-fetches on every tick and prints each store event as a JSON line until
/// `shutdown` resolves. Failures are reported through the event stream and
/// never end the loop.
async fn watch<G, W, S>(
    store: &ServiceStore<G>,
    period: Duration,
    out: &mut W,
    shutdown: S,
) -> Result<(), CommandError>
where
    G: ServiceGateway + ?Sized,
    W: Write,
    S: Future<Output = ()>,
{
    let mut events = store.subscribe();
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(period_secs = period.as_secs(), "watching service registry");
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("watch stopped");
                break;
            }
            _ = ticker.tick() => {
                debug!("heartbeat refresh");
                store.fetch_services().await;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    writeln!(out, "{}", serde_json::to_string(&event)?)?;
                    out.flush()?;
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "watch fell behind store events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

fn parse_payload(payload: &str) -> Result<Service, CommandError> {
    serde_json::from_str(payload).map_err(CommandError::InvalidPayload)
}

fn surface_error<G: ?Sized>(store: &ServiceStore<G>) -> Result<(), CommandError> {
    match store.error_message() {
        Some(message) => Err(CommandError::Store(message)),
        None => Ok(()),
    }
}
