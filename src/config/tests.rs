//! Unit tests for configuration defaults and backend parameter resolution.
use super::*;

fn classic(params: BackendParams) -> ClassicParams {
    match params {
        BackendParams::Classic(params) => params,
        BackendParams::Fd(_) => panic!("expected classic parameters"),
    }
}

fn fd(params: BackendParams) -> FdParams {
    match params {
        BackendParams::Fd(params) => params,
        BackendParams::Classic(_) => panic!("expected CAN-FD parameters"),
    }
}

#[test]
fn test_defaults() {
    let config = BusConfig::default();
    assert!(config.extended);
    assert!(!config.fd);
    assert!(!config.receive_own_messages);
    assert_eq!(config.bitrate, 500_000);
    assert_eq!(config.data_bitrate, 2_000_000);
    assert!(config.filters.is_empty());
}

#[test]
/// Classic channels default to 16-frame FIFOs.
fn test_classic_fifo_defaults() {
    let params = classic(BusConfig::new().resolve(0));
    assert_eq!(params.rx_fifo_size, 16);
    assert_eq!(params.tx_fifo_size, 16);
}

#[test]
/// CAN-FD channels default to 1024 rx / 128 tx.
fn test_fd_fifo_defaults() {
    let params = fd(BusConfig::new().fd(true).resolve(0));
    assert_eq!(params.rx_fifo_size, 1024);
    assert_eq!(params.tx_fifo_size, 128);
}

#[test]
/// Explicit sizes win whatever the FD flag.
fn test_explicit_fifo_sizes() {
    let params = classic(BusConfig::new().rx_fifo_size(3).tx_fifo_size(5).resolve(0));
    assert_eq!((params.rx_fifo_size, params.tx_fifo_size), (3, 5));

    let params = fd(BusConfig::new().fd(true).rx_fifo_size(3).resolve(0));
    assert_eq!((params.rx_fifo_size, params.tx_fifo_size), (3, 128));

    let params = fd(BusConfig::new().fd(true).tx_fifo_size(7).resolve(0));
    assert_eq!((params.rx_fifo_size, params.tx_fifo_size), (1024, 7));
}

#[test]
/// Every configured value reaches the CAN-FD parameters unchanged.
fn test_fd_forwards_everything() {
    let filter = CanFilter::extended(0x1800_0000, 0x1F00_0000);
    let params = fd(BusConfig::new()
        .fd(true)
        .with_filter(filter)
        .receive_own_messages(true)
        .unique_hardware_id(0xBEEF)
        .extended(false)
        .bitrate(1_000_000)
        .data_bitrate(8_000_000)
        .sjw_abr(1)
        .tseg1_abr(2)
        .tseg2_abr(3)
        .sjw_dbr(4)
        .tseg1_dbr(5)
        .tseg2_dbr(6)
        .ssp_dbr(7)
        .resolve(2));

    assert_eq!(params.channel, 2);
    assert_eq!(params.filters, [filter]);
    assert!(params.receive_own_messages);
    assert_eq!(params.unique_hardware_id, Some(0xBEEF));
    assert!(!params.extended);
    assert_eq!(params.bitrate, 1_000_000);
    assert_eq!(params.data_bitrate, 8_000_000);
    assert_eq!(
        params.arbitration,
        TimingOverrides {
            sjw: Some(1),
            tseg1: Some(2),
            tseg2: Some(3),
            ssp: None,
        }
    );
    assert_eq!(
        params.data,
        TimingOverrides {
            sjw: Some(4),
            tseg1: Some(5),
            tseg2: Some(6),
            ssp: Some(7),
        }
    );
}

#[test]
/// The classic subset drops FD-only values but keeps the rest.
fn test_classic_subset() {
    let params = classic(
        BusConfig::new()
            .with_filters([CanFilter::new(0x10, 0x7F0)])
            .unique_hardware_id(7)
            .bitrate(250_000)
            .data_bitrate(4_000_000)
            .tseg1_dbr(99)
            .resolve(1),
    );
    assert_eq!(
        params,
        ClassicParams {
            channel: 1,
            filters: alloc::vec![CanFilter::new(0x10, 0x7F0)],
            receive_own_messages: false,
            unique_hardware_id: Some(7),
            extended: true,
            rx_fifo_size: 16,
            tx_fifo_size: 16,
            bitrate: 250_000,
        }
    );
}
