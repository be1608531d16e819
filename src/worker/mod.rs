mod bgp_worker;
mod command;
mod db_worker;
mod registry;
mod ripe_worker;

pub use bgp_worker::BgpWorkerHandle;
pub use command::{BgpQuery, BgpResponse, DbQuery, DbResponse};
pub use db_worker::DbWorkerHandle;
pub use registry::{wait_ready, WorkerRegistry};
pub use ripe_worker::RipeWorkerHandle;
