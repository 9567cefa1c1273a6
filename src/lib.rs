//! Request a nearby BLE device and talk to its GATT server with plain async calls.
//!
//! [`request`] picks a device matching the given [`RequestOptions`], connects to it and
//! discovers all of its primary services and their characteristics before returning. The
//! returned [`Device`] can then be navigated without further discovery.
//!
//! ## Usage
//!
//! Here is an example on how to request a device with the battery service and read
//! its battery level:
//!
//! ```rust,no_run
//! use ble_session::common::{characteristics::BATTERY_LEVEL, services::BATTERY};
//! use ble_session::{Error, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     pretty_env_logger::init();
//!
//!     // Accept only devices advertising the battery service
//!     let options = RequestOptions::new().services([BATTERY]);
//!
//!     let device = ble_session::request(options).await?;
//!     println!("{:?}", device);
//!
//!     // Read the battery level
//!     if let Some(battery_level) = device.characteristic(BATTERY_LEVEL) {
//!         println!("Battery level: {:?}", battery_level.read().await?);
//!     }
//!
//!     device.disconnect().await?;
//!
//!     Ok(())
//! }
//!```
//!
//! The platform adapter is used through [`BtleplugHost`]. Any other Bluetooth backend can be
//! used with [`Bluetooth`] by implementing the traits in [`host`].

#![warn(clippy::all, future_incompatible, nonstandard_style, rust_2018_idioms)]

pub use btleplug::api::{CharPropFlags, WriteType};

pub use bluetooth::{is_ready, request, Bluetooth};
pub use characteristic::{Characteristic, ValueStream};
pub use descriptor::Descriptor;
pub use device::Device;
pub use error::{Error, Result};
pub use options::{DeviceFilter, DeviceRequest, NamePolicy, RequestOptions};
pub use platform::BtleplugHost;
pub use scanner::ScanConfig;
pub use service::Service;

mod bluetooth;
mod device;
mod error;
mod options;
mod platform;
mod scanner;
mod service;
mod util;

mod characteristic;
mod descriptor;
pub mod common;
pub mod host;
