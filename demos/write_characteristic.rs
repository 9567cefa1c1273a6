//! This example powers on a SteamVR base station.
//! The device name should be given as a command line argument.

use ble_session::{Error, RequestOptions};
use std::str::FromStr;
use uuid::Uuid;

const CONTROL_SERVICE_UUID: &str = "00001523-1212-efde-1523-785feabcd124";
const POWER_UUID: &str = "00001525-1212-efde-1523-785feabcd124";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let name = std::env::args().nth(1).expect("Expected device name");

    pretty_env_logger::init();

    let service = Uuid::from_str(CONTROL_SERVICE_UUID).unwrap();
    let options = RequestOptions::new()
        .name(name)
        .optional_services([service]);

    let device = ble_session::request(options).await?;

    let uuid = Uuid::from_str(POWER_UUID).unwrap();
    let power = device.characteristic(uuid).expect("No power characteristic");

    println!("Power: {:?}", power.read().await?);

    power.write_command(&[1]).await?;

    device.disconnect().await?;

    Ok(())
}
