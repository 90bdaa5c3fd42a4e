use aries_domain::{Service, ServiceId};
use chrono::{DateTime, Utc};

/// One surfaced error. Every `set_error` with a message creates a fresh
/// notice, and only the clear task armed for that notice may remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    message: String,
    raised_at: DateTime<Utc>,
    generation: u64,
}

impl ErrorNotice {
    pub(crate) fn new(message: String, generation: u64) -> Self {
        Self {
            message,
            raised_at: Utc::now(),
            generation,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raised_at(&self) -> DateTime<Utc> {
        self.raised_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of replacing a record by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Replaced { index: usize },
    /// No record carried the id; the cache was left as it was.
    Missing,
}

/// Everything a view needs, read under a single lock.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub services: Vec<Service>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) services: Vec<Service>,
    pub(crate) error: Option<ErrorNotice>,
    pub(crate) loading: bool,
    pub(crate) error_generation: u64,
}

impl StoreState {
    /// Returns the new length, or `None` when the list was already equal.
    pub(crate) fn replace_all(&mut self, services: Vec<Service>) -> Option<usize> {
        if self.services == services {
            return None;
        }
        self.services = services;
        Some(self.services.len())
    }

    /// Replaces the first record whose id matches. Records without an id
    /// never match, so they are always reported missing.
    pub(crate) fn upsert_by_id(&mut self, service: Service) -> UpsertOutcome {
        let Some(id) = service.id() else {
            return UpsertOutcome::Missing;
        };
        match self.services.iter().position(|existing| existing.has_id(id)) {
            Some(index) => {
                self.services[index] = service;
                UpsertOutcome::Replaced { index }
            }
            None => UpsertOutcome::Missing,
        }
    }

    /// Appends unconditionally, duplicate ids included. Returns the new index.
    pub(crate) fn append(&mut self, service: Service) -> usize {
        self.services.push(service);
        self.services.len() - 1
    }

    pub(crate) fn find_by_id(&self, id: &ServiceId) -> Option<&Service> {
        self.services.iter().find(|service| service.has_id(id))
    }

    pub(crate) fn raise_error(&mut self, message: String) -> u64 {
        self.error_generation += 1;
        self.error = Some(ErrorNotice::new(message, self.error_generation));
        self.error_generation
    }

    /// Clears the error only if it is still the notice `generation` names.
    pub(crate) fn expire_error(&mut self, generation: u64) -> bool {
        match &self.error {
            Some(notice) if notice.generation == generation => {
                self.error = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            services: self.services.clone(),
            error: self.error.as_ref().map(|notice| notice.message.clone()),
            loading: self.loading,
        }
    }
}
