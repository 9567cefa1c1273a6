//! This example requests a device with the battery service
//! and reads the device's battery level.

use ble_session::common::{characteristics::BATTERY_LEVEL, services::BATTERY};
use ble_session::{Error, RequestOptions};

#[tokio::main]
async fn main() -> Result<(), Error> {
    pretty_env_logger::init();

    // Accept only devices advertising the battery service
    let options = RequestOptions::new().services([BATTERY]);

    let device = ble_session::request(options).await?;
    println!("{:?}", device);

    // Read the battery level
    match device.characteristic(BATTERY_LEVEL) {
        Some(battery_level) => println!("Battery level: {:?}", battery_level.read().await?),
        None => println!("No battery level characteristic"),
    }

    device.disconnect().await?;

    Ok(())
}
