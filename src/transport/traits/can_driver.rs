//! Driver contract: the entry point that constructs either backend from its
//! resolved parameters. One implementation covers one driver library.
use crate::config::{ClassicParams, FdParams};
use crate::transport::traits::can_backend::CanBackend;

pub trait CanDriver {
    /// Backend driving a classic CAN controller.
    type Classic: CanBackend;
    /// Backend driving a CAN-FD controller.
    type Fd: CanBackend;

    /// Open a classic channel. Receives the non-FD parameter subset only.
    fn open_classic(
        &self,
        params: ClassicParams,
    ) -> Result<Self::Classic, <Self::Classic as CanBackend>::Error>;

    /// Open a CAN-FD channel with its arbitration and data phase timings.
    fn open_fd(&self, params: FdParams) -> Result<Self::Fd, <Self::Fd as CanBackend>::Error>;
}
