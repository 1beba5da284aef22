//! Cyclic transmission through the facade, scheduled on the simulated
//! hardware clock.
mod helpers;

use embedded_can::StandardId;
use helpers::{network, open_bus};
use korri_ixxat::{
    config::BusConfig,
    error::{BusError, VirtualBusError},
    transport::{
        frame::CanMessage,
        traits::{can_backend::CanBackend, cyclic_task::CyclicTask},
    },
};
use tokio::time::Duration;

fn heartbeat() -> CanMessage {
    CanMessage::new(StandardId::new(0x701).expect("valid id"), &[0x05]).expect("valid frame")
}

/// Drain every frame already waiting, returning their hardware timestamps in ms.
async fn drain(bus: &mut helpers::Bus<'_>) -> Vec<u128> {
    let mut stamps = Vec::new();
    while let Some(frame) = bus
        .recv(Some(Duration::ZERO))
        .await
        .expect("Receiving should succeed")
    {
        assert_eq!(frame, heartbeat());
        stamps.push(frame.timestamp().as_millis());
    }
    stamps
}

#[tokio::test]
async fn test_heartbeat_for_limited_duration() {
    for fd in [false, true] {
        let network = network();
        let mut producer = open_bus(&network, BusConfig::new().fd(fd));
        let mut consumer = open_bus(&network, BusConfig::new().fd(fd));

        // 1. Start a 100 ms heartbeat for 350 ms.
        let task = producer
            .send_periodic(
                &heartbeat(),
                Duration::from_millis(100),
                Some(Duration::from_millis(350)),
            )
            .expect("Starting the heartbeat should succeed");
        assert!(task.is_active());

        // 2. First occurrence goes out immediately.
        assert_eq!(drain(&mut consumer).await, [0]);

        // 3. Run the hardware clock past the end.
        network.advance(Duration::from_millis(500));
        assert_eq!(drain(&mut consumer).await, [100, 200, 300]);
        assert!(!task.is_active());
    }
}

#[tokio::test]
async fn test_heartbeat_stopped_explicitly() {
    let network = network();
    let mut producer = open_bus(&network, BusConfig::new().fd(true));
    let mut consumer = open_bus(&network, BusConfig::new().fd(true));

    let mut task = producer
        .send_periodic(&heartbeat(), Duration::from_millis(50), None)
        .expect("Starting the heartbeat should succeed");
    network.advance(Duration::from_millis(120));
    assert_eq!(drain(&mut consumer).await, [0, 50, 100]);

    task.stop().expect("Stopping should succeed");
    assert!(!task.is_active());
    network.advance(Duration::from_secs(1));
    assert!(drain(&mut consumer).await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_errors_are_wrapped() {
    let network = network();
    let mut classic = open_bus(&network, BusConfig::new());

    let result = classic.send_periodic(&heartbeat(), Duration::ZERO, None);
    assert!(matches!(
        result,
        Err(BusError::Classic(VirtualBusError::InvalidPeriod))
    ));

    classic.shutdown().expect("Shutdown should succeed");
    let result = classic.send_periodic(&heartbeat(), Duration::from_millis(10), None);
    assert!(matches!(
        result,
        Err(BusError::Classic(VirtualBusError::ChannelClosed))
    ));
}
