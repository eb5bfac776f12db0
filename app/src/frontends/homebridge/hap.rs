use serde::{Deserialize, Serialize};

// https://github.com/homebridge/HAP-NodeJS/blob/latest/src/lib/definitions/ServiceDefinitions.ts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomekitService {
    InputSource,
    Lightbulb,
    Switch,
    Television,
}

// https://github.com/homebridge/HAP-NodeJS/blob/latest/src/lib/definitions/CharacteristicDefinitions.ts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomekitCharacteristic {
    Active,
    ActiveIdentifier,
    Brightness,
    ConfiguredName,
    CurrentVisibilityState,
    Identifier,
    InputSourceType,
    IsConfigured,
    On,
}

pub mod value {
    pub const IS_CONFIGURED: u8 = 1;
    pub const INPUT_SOURCE_TYPE_APPLICATION: u8 = 10;
    pub const VISIBILITY_SHOWN: u8 = 0;
}
