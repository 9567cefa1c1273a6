use std::pin::Pin;
use std::time::Duration;

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use btleplug::{Error, Result};
use futures::{Stream, StreamExt};

use crate::DeviceRequest;

#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Index of the Bluetooth adapter to use. The first found adapter is used by default.
    pub(crate) adapter_index: usize,
    /// The scan is stopped when timeout duration is reached.
    pub(crate) timeout: Option<Duration>,
}

impl ScanConfig {
    /// Index of bluetooth adapter to use
    pub fn adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Give up the device request after given duration
    pub fn stop_after_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub(crate) struct Session {
    pub(crate) _manager: Manager,
    pub(crate) adapter: Adapter,
}

impl Session {
    /// Opens the configured adapter. `None` if there is no adapter at that index.
    pub(crate) async fn open(config: &ScanConfig) -> Result<Option<Session>> {
        let manager = Manager::new().await?;
        let mut adapters = manager.adapters().await?;

        if config.adapter_index >= adapters.len() {
            return Ok(None);
        }

        let adapter = adapters.swap_remove(config.adapter_index);

        log::trace!("Using adapter: {:?}", adapter);

        Ok(Some(Session {
            _manager: manager,
            adapter,
        }))
    }
}

/// Picks the first advertising device that satisfies a [`DeviceRequest`].
pub(crate) struct Chooser<'a> {
    session: &'a Session,
    request: &'a DeviceRequest,
}

impl<'a> Chooser<'a> {
    pub(crate) fn new(session: &'a Session, request: &'a DeviceRequest) -> Self {
        Self { session, request }
    }

    pub(crate) async fn choose(&self, timeout: Option<Duration>) -> Result<Peripheral> {
        let events = self.session.adapter.events().await?;

        log::info!("Starting the scan");

        self.session
            .adapter
            .start_scan(ScanFilter {
                services: self.request.filter_services(),
            })
            .await?;

        let chosen = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.listen(events))
                .await
                .unwrap_or_else(|_| Err(Error::TimedOut(timeout))),
            None => self.listen(events).await,
        };

        if let Err(e) = self.session.adapter.stop_scan().await {
            log::warn!("Could not stop the scan: {:?}", e);
        }

        chosen
    }

    async fn listen(
        &self,
        mut events: Pin<Box<dyn Stream<Item = CentralEvent> + Send>>,
    ) -> Result<Peripheral> {
        while let Some(event) = events.next().await {
            match event {
                CentralEvent::DeviceDiscovered(peripheral_id)
                | CentralEvent::DeviceUpdated(peripheral_id) => {
                    if let Some(peripheral) = self.apply_filter(&peripheral_id).await {
                        return Ok(peripheral);
                    }
                }
                _ => {}
            }
        }

        Err(Error::DeviceNotFound)
    }

    async fn apply_filter(&self, peripheral_id: &PeripheralId) -> Option<Peripheral> {
        let peripheral = self.session.adapter.peripheral(peripheral_id).await.ok()?;

        log::trace!("Checking device: {:?}", peripheral);

        let filters = match self.request {
            DeviceRequest::AcceptAll { .. } => return Some(peripheral),
            DeviceRequest::Filtered { filters, .. } => filters,
        };

        // Properties may be missing until the device has advertised. It will come back as an update.
        let properties = peripheral.properties().await.ok().flatten()?;
        let name = properties.local_name.as_deref();

        if filters
            .iter()
            .any(|filter| filter.matches(name, &properties.services) == Some(true))
        {
            log::info!("Found device: {:?}", peripheral);
            Some(peripheral)
        } else {
            None
        }
    }
}
