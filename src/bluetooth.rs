use futures::future::try_join_all;

use crate::host::Host;
use crate::{BtleplugHost, Device, Error, NamePolicy, RequestOptions, Result, ScanConfig, Service};

/// Entry point for requesting devices from a [`Host`].
pub struct Bluetooth<H = BtleplugHost> {
    host: H,
    name_policy: NamePolicy,
}

impl Default for Bluetooth<BtleplugHost> {
    fn default() -> Self {
        Bluetooth::new(BtleplugHost::new(ScanConfig::default()))
    }
}

impl<H: Host> Bluetooth<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            name_policy: NamePolicy::default(),
        }
    }

    /// How to handle options that set both `name` and `name_prefix`
    pub fn name_policy(mut self, policy: NamePolicy) -> Self {
        self.name_policy = policy;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Whether the host has a usable Bluetooth capability.
    pub async fn is_ready(&self) -> Result<bool> {
        Ok(self.host.availability().await?)
    }

    /// Like [`request`](Self::request), with the options given as a JSON object.
    pub async fn request_with_value(&self, options: serde_json::Value) -> Result<Device> {
        self.request(RequestOptions::from_value(options)?).await
    }

    /// Request a device, connect to it and discover its services and characteristics.
    ///
    /// Without any name, name prefix or service criteria every device is accepted.
    pub async fn request(&self, options: RequestOptions) -> Result<Device> {
        let options = options.resolve(self.name_policy)?;

        if !self.is_ready().await? {
            return Err(Error::NotReady);
        }

        let request = options.into_request();
        log::debug!("Requesting device: {:?}", request);

        let chosen = self.host.request_device(&request).await?;
        log::debug!("Connecting to device {}", chosen.id);

        chosen.gatt.connect().await?;

        let services = try_join_all(
            chosen
                .gatt
                .primary_services(None)
                .await?
                .into_iter()
                .map(Service::discover),
        )
        .await?;

        log::info!(
            "Connected to device {} ({} services)",
            chosen.id,
            services.len()
        );

        Ok(Device::new(chosen.id, chosen.name, chosen.gatt, services))
    }
}

/// Whether the platform has a usable Bluetooth adapter.
pub async fn is_ready() -> Result<bool> {
    Bluetooth::default().is_ready().await
}

/// Request a device using the platform Bluetooth adapter.
///
/// See [`Bluetooth::request`].
pub async fn request(options: RequestOptions) -> Result<Device> {
    Bluetooth::default().request(options).await
}
