//! DS1621 acquisition protocol against an in-memory device.

mod common;

use std::time::Duration;

use tokio::time::Instant;

use common::{FakeRegisterBus, Op};
use thermpdo_bridge::registers::{
    ACCESS_CONFIG, READ_COUNTER, READ_SLOPE, READ_TEMPERATURE, START_CONVERT,
};
use thermpdo_bridge::sensor::{MAX_POLLS, SIMULATION_STATUS};
use thermpdo_bridge::{AcquisitionOutcome, SensorAddress, SensorError, SensorReader};

const ADDRESS: SensorAddress = SensorAddress::DEFAULT;

#[tokio::test(start_paused = true)]
async fn test_acquire_reading() {
    let bus = FakeRegisterBus::converting(3, 0x0032, 0x4B, 0x59);
    let mut reader = SensorReader::new(bus.clone());

    let start = Instant::now();
    let outcome = reader.acquire(ADDRESS).await.unwrap();

    let AcquisitionOutcome::Reading(reading) = outcome else {
        panic!("Expected a reading, got {:?}", outcome);
    };
    assert_eq!(reading.lo_res_c, 50.0);
    assert_eq!(reading.hi_res_c, 50.0 - 0.25 + 14.0 / 89.0);
    assert_eq!(reading.hi_res_f, 32.0 + reading.hi_res_c * 9.0 / 5.0);
    assert_eq!(start.elapsed(), Duration::from_millis(300));

    let device = bus.device();
    assert_eq!(
        device.ops,
        vec![
            Op::WriteByte(START_CONVERT, 0),
            Op::ReadByte(ACCESS_CONFIG),
            Op::ReadByte(ACCESS_CONFIG),
            Op::ReadByte(ACCESS_CONFIG),
            Op::ReadWord(READ_TEMPERATURE),
            Op::ReadByte(READ_COUNTER),
            Op::ReadByte(READ_SLOPE),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_acquire_writes_only_start_convert() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    let mut reader = SensorReader::new(bus.clone());

    for _ in 0..3 {
        reader.acquire(ADDRESS).await.unwrap();
    }

    let device = bus.device();
    assert_eq!(device.writes(), vec![Op::WriteByte(START_CONVERT, 0); 3]);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_timeout_is_bounded() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().done_after = None;
    let mut reader = SensorReader::new(bus.clone());

    let start = Instant::now();
    let outcome = reader.acquire(ADDRESS).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome, AcquisitionOutcome::Timeout);
    assert!(
        elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(1510),
        "elapsed {:?}",
        elapsed
    );

    let device = bus.device();
    assert_eq!(device.count_of(Op::ReadByte(ACCESS_CONFIG)), MAX_POLLS as usize);
    assert_eq!(device.count_of(Op::ReadWord(READ_TEMPERATURE)), 0);
}

#[tokio::test(start_paused = true)]
async fn test_done_on_last_poll_is_a_reading() {
    let bus = FakeRegisterBus::converting(MAX_POLLS, 0x0019, 0x10, 0x10);
    let mut reader = SensorReader::new(bus);

    let outcome = reader.acquire(ADDRESS).await.unwrap();
    assert!(matches!(outcome, AcquisitionOutcome::Reading(_)));
}

#[tokio::test(start_paused = true)]
async fn test_simulated_reader() {
    let mut reader = SensorReader::<FakeRegisterBus>::simulated();
    assert!(reader.is_simulated());

    let start = Instant::now();
    for _ in 0..3 {
        let outcome = reader.acquire(ADDRESS).await.unwrap();
        assert_eq!(outcome, AcquisitionOutcome::SimulatedStatus(SIMULATION_STATUS));
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    // Nothing to configure without a bus.
    reader.enable_one_shot(ADDRESS).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_convert_failure() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().fail_register = Some(START_CONVERT);
    let mut reader = SensorReader::new(bus.clone());

    let err = reader.acquire(ADDRESS).await.unwrap_err();
    assert!(matches!(
        err,
        SensorError::Transport {
            register: START_CONVERT,
            ..
        }
    ));
    assert_eq!(bus.device().ops.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slope_read_failure() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().fail_register = Some(READ_SLOPE);
    let mut reader = SensorReader::new(bus);

    let err = reader.acquire(ADDRESS).await.unwrap_err();
    assert!(matches!(
        err,
        SensorError::Transport {
            register: READ_SLOPE,
            ..
        }
    ));
    assert!(err.to_string().contains("0xa9"));
}

#[tokio::test(start_paused = true)]
async fn test_wrong_address_is_a_transport_error() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    let mut reader = SensorReader::new(bus);

    let err = reader.acquire(SensorAddress(0x49)).await.unwrap_err();
    assert!(matches!(err, SensorError::Transport { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_zero_slope() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0);
    let mut reader = SensorReader::new(bus);

    let err = reader.acquire(ADDRESS).await.unwrap_err();
    assert!(matches!(err, SensorError::InvalidSlope));
}

#[tokio::test(start_paused = true)]
async fn test_enable_one_shot_sets_bit() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().config = 0x08;
    let mut reader = SensorReader::new(bus.clone());

    reader.enable_one_shot(ADDRESS).await.unwrap();

    let device = bus.device();
    assert_eq!(device.config, 0x09);
    assert_eq!(device.writes(), vec![Op::WriteByte(ACCESS_CONFIG, 0x09)]);
}

#[tokio::test(start_paused = true)]
async fn test_enable_one_shot_keeps_configured_device() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().config = 0x01;
    let mut reader = SensorReader::new(bus.clone());

    reader.enable_one_shot(ADDRESS).await.unwrap();

    assert!(bus.device().writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_enable_one_shot_failure() {
    let bus = FakeRegisterBus::converting(1, 0x0019, 0x10, 0x10);
    bus.device().fail_register = Some(ACCESS_CONFIG);
    let mut reader = SensorReader::new(bus);

    assert!(reader.enable_one_shot(ADDRESS).await.is_err());
}
