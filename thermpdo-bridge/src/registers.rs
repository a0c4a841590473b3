//! DS1621 command and register map (Maxim DS1621 datasheet).
//!
//! All commands are sent as SMBus byte/word transfers to the device's 7-bit
//! slave address. Commands that take no data (start/stop convert) are issued as
//! a byte write of `0` so they fit the register-bus interface.
//!
//! Key groups:
//! - **Conversion control** - 0xEE (start convert), 0x22 (stop convert)
//! - **Status/config** - 0xAC (DONE flag, one-shot bit)
//! - **Temperature** - 0xAA (2 bytes, 1/2 degree resolution)
//! - **Interpolation** - 0xA8 (count remain), 0xA9 (count per degree)
//! - **Thermostat** - 0xA1 (TH), 0xA2 (TL)

/// Stop continuous conversion.
pub const STOP_CONVERT: u8 = 0x22;
/// Thermostat high limit.
pub const ACCESS_TH: u8 = 0xA1;
/// Thermostat low limit.
pub const ACCESS_TL: u8 = 0xA2;
/// Counter value left at the end of the last conversion ("count remain").
pub const READ_COUNTER: u8 = 0xA8;
/// Counts per degree at the current temperature ("slope").
pub const READ_SLOPE: u8 = 0xA9;
/// Last converted temperature, MSB (integer degrees) then LSB (half degree).
pub const READ_TEMPERATURE: u8 = 0xAA;
/// Configuration/status register.
pub const ACCESS_CONFIG: u8 = 0xAC;
/// Begin a temperature conversion.
pub const START_CONVERT: u8 = 0xEE;

/// Config register: conversion complete.
pub const CONFIG_DONE: u8 = 0x80;
/// Config register: one-shot mode (a single conversion per start command).
pub const CONFIG_ONE_SHOT: u8 = 0x01;
