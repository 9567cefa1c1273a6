//! This example connects to the first device found and prints its GATT tree.
//! Options can be given as a JSON object, e.g. `'{"namePrefix": "Polar"}'`.

use ble_session::{Bluetooth, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    pretty_env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(json) => serde_json::from_str(&json)?,
        None => serde_json::Value::Null,
    };

    let device = Bluetooth::default().request_with_value(options).await?;

    println!("{} ({:?})", device.id(), device.name());

    for service in device.services() {
        println!("Service {} (primary: {})", service.uuid(), service.is_primary());

        for characteristic in service.characteristics() {
            println!(
                "  Characteristic {} {:?}",
                characteristic.uuid(),
                characteristic.properties()
            );

            for descriptor in characteristic.descriptors().await? {
                println!("    Descriptor {}: {:?}", descriptor.uuid(), descriptor.read().await);
            }
        }
    }

    device.disconnect().await?;

    Ok(())
}
