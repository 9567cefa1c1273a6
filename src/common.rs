//! Assigned numbers of commonly used GATT attributes.

pub mod services {
    use btleplug::api::bleuuid::uuid_from_u16;
    use uuid::Uuid;

    pub const BATTERY: Uuid = uuid_from_u16(0x180F);
    pub const HEART_RATE: Uuid = uuid_from_u16(0x180D);
}

pub mod characteristics {
    use btleplug::api::bleuuid::uuid_from_u16;
    use uuid::Uuid;

    pub const HEART_RATE_MEASUREMENT: Uuid = uuid_from_u16(0x2A37);
    pub const BATTERY_LEVEL: Uuid = uuid_from_u16(0x2A19);
}

pub mod descriptors {
    use btleplug::api::bleuuid::uuid_from_u16;
    use uuid::Uuid;

    pub const CHARACTERISTIC_USER_DESCRIPTION: Uuid = uuid_from_u16(0x2901);
    pub const CLIENT_CHARACTERISTIC_CONFIGURATION: Uuid = uuid_from_u16(0x2902);
}
