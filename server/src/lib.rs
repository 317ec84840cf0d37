pub mod routes;
pub mod server_state;

pub const ADDR_ENV: &str = "MOP_ADDR";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8050";
