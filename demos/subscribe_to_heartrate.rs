//! This example requests the first BLE device that has the heart rate service,
//! connects to it and starts listening for heart rate values.

use ble_session::common::{characteristics::HEART_RATE_MEASUREMENT, services::HEART_RATE};
use ble_session::{Bluetooth, BtleplugHost, Error, RequestOptions, ScanConfig};
use futures::StreamExt;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    pretty_env_logger::init();

    let host = BtleplugHost::new(ScanConfig::default().stop_after_timeout(Duration::from_secs(30)));
    let bluetooth = Bluetooth::new(host);

    if !bluetooth.is_ready().await? {
        println!("No Bluetooth adapter available");
        return Ok(());
    }

    let device = bluetooth
        .request(RequestOptions::new().services([HEART_RATE]))
        .await?;

    for service in device.services() {
        println!("Service: {:?}", service);
    }

    let hr_measurement = device
        .characteristic(HEART_RATE_MEASUREMENT)
        .expect("Heart rate service without measurement characteristic");
    let mut hr_stream = hr_measurement.subscribe().await?;

    while let Some(hr) = hr_stream.next().await {
        println!("{:?}", hr);
    }

    Ok(())
}
