/// Test doubles and fixtures shared by the integration tests.
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use korri_ixxat::{
    bus::IxxatBus,
    config::BusConfig,
    simulation::{VirtualChannel, VirtualDriver, VirtualNetwork},
    transport::traits::bus_timer::BusTimer,
};
use tokio::time::{sleep, Duration};

/// Hardware id of the adapter registered by [`network`].
#[allow(dead_code)]
pub const ADAPTER_ID: u32 = 0x0000_1234;

#[derive(Clone, Copy)]
/// Timer based on `tokio::time::sleep` to drive timeouts in tests.
pub struct MockTimer;

impl BusTimer for MockTimer {
    async fn delay(&mut self, duration: Duration) {
        sleep(duration).await;
    }
}

pub type Network = VirtualNetwork<NoopRawMutex>;
pub type Channel<'a> = VirtualChannel<'a, NoopRawMutex, MockTimer>;
pub type Bus<'a> = IxxatBus<Channel<'a>, Channel<'a>>;

/// Network with one dual-channel, CAN-FD capable adapter.
pub fn network() -> Network {
    let network = Network::new();
    network.add_adapter(ADAPTER_ID, 2, true);
    network
}

/// Open a facade on `network`, channel 0.
pub fn open_bus(network: &Network, config: BusConfig) -> Bus<'_> {
    let driver = VirtualDriver::new(network, MockTimer);
    IxxatBus::open(&driver, 0, config).expect("Opening the bus should succeed")
}
