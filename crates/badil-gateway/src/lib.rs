//! WebSocket gateway for Badil product analysis.

pub mod analysis;
pub mod connection;
pub mod server;
pub mod state;

pub use server::start_gateway;
pub use state::GatewayState;
