//! Application context shared by the store client and the presentation layer.

use crate::clock::{Clock, SystemClock};
use crate::decay::DecayModel;
use crate::error::StoreError;
use crate::event_bus::EventBus;
use crate::presentation::Presenter;
use crate::store::{HttpRecordStore, RecordStore};
use chrono::{DateTime, Utc};
use garden_rs_config::GardenConfig;
use std::sync::Arc;

/// Explicitly initialised dependencies of a running garden.
#[derive(Clone)]
pub struct GardenContext {
    config: Arc<GardenConfig>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl GardenContext {
    /// Build a context around an existing store, using the wall clock.
    pub fn new(config: GardenConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock: Arc::new(SystemClock),
            events: EventBus::default(),
        }
    }

    /// Build a context talking to the configured HTTP endpoint.
    pub fn from_config(config: GardenConfig) -> Result<Self, StoreError> {
        let store = HttpRecordStore::from_config(&config)?;
        Ok(Self::new(config, Arc::new(store)))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the event bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn decay(&self) -> DecayModel {
        DecayModel::from_config(&self.config.decay)
    }

    pub fn presenter(&self) -> Presenter {
        Presenter::new(self.decay(), self.config.assets.base.clone())
    }
}
