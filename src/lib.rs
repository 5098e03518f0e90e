//! Impostor server for the Minecraft Java protocol: relays server-list status
//! from a real upstream, echoes pings and turns every login away.
pub mod config;
pub mod error;
pub mod logging;
pub mod mirage;
pub mod session;
pub mod transport;
pub mod upstream;

pub use mirage::Mirage;
