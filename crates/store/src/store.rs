use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    time::Duration,
};

use aries_domain::{Service, ServiceGateway, ServiceId, StoreConfig};
use metrics::{counter, gauge};
use strum_macros::AsRefStr;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    clear::ClearScheduler,
    events::{EventBus, StoreEvent},
    state::{ErrorNotice, StoreSnapshot, StoreState, UpsertOutcome},
};

pub const FETCH_FAILED_PREFIX: &str = "Internal Error: ";
pub const UPDATE_FAILED_PREFIX: &str = "Update Failed: ";
pub const ADD_FAILED_PREFIX: &str = "Add Failed: ";

#[derive(Debug, Clone, Copy, AsRefStr)]
#[strum(serialize_all = "snake_case")]
enum StoreAction {
    FetchServices,
    SubmitServiceUpdate,
    SubmitNewService,
}

fn record_action(action: StoreAction, result: &'static str) {
    let operation = action.as_ref().to_owned();
    counter!("store_actions_total", "operation" => operation, "result" => result).increment(1);
}

struct StoreInner {
    state: RwLock<StoreState>,
    events: EventBus,
    clear: ClearScheduler,
    clear_after: Duration,
    fetch_ticket: AtomicU64,
}

impl StoreInner {
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire_error(&self, generation: u64) {
        let mut state = self.write();
        if state.expire_error(generation) {
            debug!(generation, "error message expired");
            self.events.publish(StoreEvent::ErrorChanged { message: None });
        }
    }
}

/// In-memory mirror of the registry's service collection.
///
/// The application root constructs one store and hands clones of the handle
/// to whatever renders it; clones share state. Reads are pull-based through
/// the accessors or push-based through [`ServiceStore::subscribe`].
///
/// Actions never return errors. Failures are folded into a user-facing
/// message that clears itself after the configured delay.
///
/// Successful updates and additions store the record the caller supplied,
/// not the server's echo, so server-assigned fields (such as an id generated
/// on creation) only show up after the next [`ServiceStore::fetch_services`].
pub struct ServiceStore<G: ?Sized> {
    inner: Arc<StoreInner>,
    gateway: Arc<G>,
}

impl<G: ?Sized> Clone for ServiceStore<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G> ServiceStore<G> {
    pub fn new(gateway: G, config: StoreConfig) -> Self {
        Self::with_shared_gateway(Arc::new(gateway), config)
    }
}

impl<G: ?Sized> ServiceStore<G> {
    pub fn with_shared_gateway(gateway: Arc<G>, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState::default()),
                events: EventBus::new(),
                clear: ClearScheduler::default(),
                clear_after: config.error_clear_delay(),
                fetch_ticket: AtomicU64::new(0),
            }),
            gateway,
        }
    }

    pub fn gateway(&self) -> &G {
        self.gateway.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn all_services(&self) -> Vec<Service> {
        self.inner.read().services.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner
            .read()
            .error
            .as_ref()
            .map(|notice| notice.message().to_owned())
    }

    pub fn error_notice(&self) -> Option<ErrorNotice> {
        self.inner.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().loading
    }

    pub fn find_by_id(&self, id: &ServiceId) -> Option<Service> {
        self.inner.read().find_by_id(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.inner.read().services.len()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().snapshot()
    }

    // Every mutation publishes its event before the write guard drops, so
    // subscribers see changes in the order they were applied.

    /// Replaces the whole collection. Replacing it with an equal list is not
    /// a change and publishes nothing.
    pub fn replace_all(&self, services: Vec<Service>) {
        let mut state = self.inner.write();
        let Some(count) = state.replace_all(services) else {
            return;
        };
        gauge!("store_services").set(count as f64);
        self.inner
            .events
            .publish(StoreEvent::ServicesReplaced { count });
    }

    /// Sets or clears the error message. A message arms the auto-clear timer,
    /// replacing any timer armed for an earlier message; clearing cancels it.
    pub fn set_error(&self, message: Option<String>) {
        let mut state = self.inner.write();
        match message {
            Some(text) => {
                let generation = state.raise_error(text.clone());
                let inner = Arc::downgrade(&self.inner);
                let armed = self.inner.clear.arm(self.inner.clear_after, move || {
                    if let Some(inner) = inner.upgrade() {
                        inner.expire_error(generation);
                    }
                });
                debug!(generation, armed, "error message raised");
                self.inner.events.publish(StoreEvent::ErrorChanged {
                    message: Some(text),
                });
            }
            None => {
                self.inner.clear.cancel();
                if state.error.take().is_some() {
                    self.inner
                        .events
                        .publish(StoreEvent::ErrorChanged { message: None });
                }
            }
        }
    }

    pub fn set_loading(&self, loading: bool) {
        let mut state = self.inner.write();
        if state.loading != loading {
            state.loading = loading;
            self.inner
                .events
                .publish(StoreEvent::LoadingChanged { loading });
        }
    }

    /// Replaces the first record with the same id in place. A record whose id
    /// is not cached is dropped rather than inserted.
    pub fn upsert_by_id(&self, service: Service) -> UpsertOutcome {
        let id = service.id().cloned();
        let mut state = self.inner.write();
        let outcome = state.upsert_by_id(service);
        match (outcome, id) {
            (UpsertOutcome::Replaced { index }, Some(id)) => {
                self.inner
                    .events
                    .publish(StoreEvent::ServiceUpdated { id, index });
            }
            (UpsertOutcome::Missing, id) => {
                warn!(?id, "updated service is not cached; dropping it");
            }
            (UpsertOutcome::Replaced { .. }, None) => {}
        }
        outcome
    }

    pub fn append(&self, service: Service) {
        let mut state = self.inner.write();
        let index = state.append(service);
        gauge!("store_services").set(state.services.len() as f64);
        self.inner.events.publish(StoreEvent::ServiceAdded { index });
    }
}

impl<G> ServiceStore<G>
where
    G: ServiceGateway + ?Sized,
{
    /// Reloads the whole collection. Only the most recently issued fetch may
    /// write its result; responses of superseded fetches are discarded.
    pub async fn fetch_services(&self) {
        let ticket = self.inner.fetch_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_loading(true);

        let result = self.gateway.list_services().await;

        if self.inner.fetch_ticket.load(Ordering::SeqCst) != ticket {
            record_action(StoreAction::FetchServices, "superseded");
            debug!(ticket, "discarding response of superseded fetch");
            return;
        }

        match result {
            Ok(services) => {
                info!(count = services.len(), "service list refreshed");
                self.replace_all(services);
                record_action(StoreAction::FetchServices, "ok");
            }
            Err(err) => {
                warn!(%err, "service list fetch failed");
                self.replace_all(Vec::new());
                self.set_error(Some(format!("{FETCH_FAILED_PREFIX}{}", err.detail())));
                record_action(StoreAction::FetchServices, "error");
            }
        }
        self.set_loading(false);
    }

    pub async fn submit_service_update(&self, service: Service) {
        match self.gateway.update_service(&service).await {
            Ok(()) => {
                self.upsert_by_id(service);
                record_action(StoreAction::SubmitServiceUpdate, "ok");
            }
            Err(err) => {
                warn!(%err, id = ?service.id(), "service update failed");
                self.set_error(Some(format!("{UPDATE_FAILED_PREFIX}{}", err.detail())));
                record_action(StoreAction::SubmitServiceUpdate, "error");
            }
        }
    }

    pub async fn submit_new_service(&self, service: Service) {
        match self.gateway.create_service(&service).await {
            Ok(()) => {
                self.append(service);
                record_action(StoreAction::SubmitNewService, "ok");
            }
            Err(err) => {
                warn!(%err, "service creation failed");
                self.set_error(Some(format!("{ADD_FAILED_PREFIX}{}", err.detail())));
                record_action(StoreAction::SubmitNewService, "error");
            }
        }
    }
}
