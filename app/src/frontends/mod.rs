pub mod homebridge;
