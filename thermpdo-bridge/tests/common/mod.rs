//! In-memory register and frame buses shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thermpdo_bridge::registers::{
    ACCESS_CONFIG, CONFIG_DONE, READ_COUNTER, READ_SLOPE, READ_TEMPERATURE, START_CONVERT,
};
use thermpdo_bridge::{Frame, FrameBus, FrameBusError, Payload, RegisterBus, SensorAddress};

/// A register transfer seen by the fake device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    ReadByte(u8),
    WriteByte(u8, u8),
    ReadWord(u8),
}

/// Simulated DS1621 state.
#[derive(Debug, Default)]
pub struct Device {
    pub config: u8,
    /// Status reads after a start command until DONE sets; `None` never sets.
    pub done_after: Option<u32>,
    pub word: u16,
    pub count: u8,
    pub slope: u8,
    /// Register whose transfers fail.
    pub fail_register: Option<u8>,
    pub ops: Vec<Op>,
    status_reads: u32,
}

impl Device {
    pub fn writes(&self) -> Vec<Op> {
        self.ops
            .iter()
            .copied()
            .filter(|op| matches!(op, Op::WriteByte(..)))
            .collect()
    }

    pub fn count_of(&self, op: Op) -> usize {
        self.ops.iter().filter(|seen| **seen == op).count()
    }
}

/// Register bus double answering for a single device address.
#[derive(Clone)]
pub struct FakeRegisterBus {
    pub address: SensorAddress,
    pub device: Arc<Mutex<Device>>,
}

impl FakeRegisterBus {
    /// A device that converts after `done_after` status reads and reports
    /// the given registers.
    pub fn converting(done_after: u32, word: u16, count: u8, slope: u8) -> Self {
        Self {
            address: SensorAddress::DEFAULT,
            device: Arc::new(Mutex::new(Device {
                done_after: Some(done_after),
                word,
                count,
                slope,
                ..Device::default()
            })),
        }
    }

    pub fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap()
    }

    fn transfer(
        &self,
        address: SensorAddress,
        op: Op,
        register: u8,
    ) -> io::Result<MutexGuard<'_, Device>> {
        let mut device = self.device();
        device.ops.push(op);

        if address != self.address {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no device at address"));
        }
        if device.fail_register == Some(register) {
            return Err(io::Error::new(io::ErrorKind::Other, "remote I/O error"));
        }
        Ok(device)
    }
}

impl RegisterBus for FakeRegisterBus {
    type Error = io::Error;

    fn read_byte(&mut self, address: SensorAddress, register: u8) -> io::Result<u8> {
        let mut device = self.transfer(address, Op::ReadByte(register), register)?;

        match register {
            ACCESS_CONFIG => {
                device.status_reads += 1;
                let done = device
                    .done_after
                    .is_some_and(|after| device.status_reads >= after);
                if done {
                    Ok(device.config | CONFIG_DONE)
                } else {
                    Ok(device.config & !CONFIG_DONE)
                }
            }
            READ_COUNTER => Ok(device.count),
            READ_SLOPE => Ok(device.slope),
            _ => Ok(0),
        }
    }

    fn write_byte(&mut self, address: SensorAddress, register: u8, value: u8) -> io::Result<()> {
        let mut device = self.transfer(address, Op::WriteByte(register, value), register)?;

        match register {
            START_CONVERT => device.status_reads = 0,
            ACCESS_CONFIG => device.config = value,
            _ => {}
        }
        Ok(())
    }

    fn read_word(&mut self, address: SensorAddress, register: u8) -> io::Result<u16> {
        let device = self.transfer(address, Op::ReadWord(register), register)?;

        match register {
            READ_TEMPERATURE => Ok(device.word),
            _ => Ok(0),
        }
    }
}

/// Everything the fake frame bus was asked to do.
#[derive(Debug, Default)]
pub struct FrameLog {
    pub started: Vec<(Frame, Duration)>,
    pub updates: Vec<Payload>,
    pub stops: u32,
    pub fail_updates: bool,
}

/// Frame bus double recording periodic sends.
#[derive(Clone, Default)]
pub struct FakeFrameBus {
    pub log: Arc<Mutex<FrameLog>>,
}

impl FakeFrameBus {
    pub fn log(&self) -> MutexGuard<'_, FrameLog> {
        self.log.lock().unwrap()
    }
}

#[derive(Debug)]
pub struct FakeHandle(usize);

impl FrameBus for FakeFrameBus {
    type Handle = FakeHandle;

    fn send_periodic(
        &mut self,
        frame: Frame,
        interval: Duration,
    ) -> Result<FakeHandle, FrameBusError> {
        let mut log = self.log();
        log.started.push((frame, interval));
        Ok(FakeHandle(log.started.len()))
    }

    fn update_payload(&mut self, _handle: &FakeHandle, data: Payload) -> Result<(), FrameBusError> {
        let mut log = self.log();
        if log.fail_updates {
            return Err(FrameBusError::Closed);
        }
        log.updates.push(data);
        Ok(())
    }

    fn stop(&mut self, _handle: FakeHandle) -> Result<(), FrameBusError> {
        self.log().stops += 1;
        Ok(())
    }
}
