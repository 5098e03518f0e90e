use std::{fmt::Display, net::SocketAddr, path::Path};

use log::{debug, error, info, warn};

use crate::{error::SessionError, session::Phase};

pub struct MirageLogger;

impl MirageLogger {
    pub fn preparing_socket(address: &str) {
        info!("Preparing socket {}", address);
    }

    pub fn tcp_nodelay_failed(err: &std::io::Error) {
        error!("Failed to set TCP_NODELAY: {err}");
    }

    pub fn accept_failed(err: &std::io::Error) {
        error!("Failed to accept connection: {err}");
    }

    pub fn connection_rejected(address: &SocketAddr) {
        debug!("Connection limit reached, rejecting {address}");
    }

    pub fn new_connection(address: &SocketAddr) {
        info!("[+] {}", address);
    }

    pub fn phase_changed(address: &SocketAddr, phase: Phase) {
        debug!("{address} entered {phase:?} phase");
    }

    pub fn packet_ignored(address: &SocketAddr, id: u8, phase: Phase) {
        debug!("Ignoring packet 0x{id:02x} from {address} in {phase:?} phase");
    }

    pub fn upstream_failure(upstream: &str, err: &dyn Display) {
        warn!("Upstream status from {upstream} failed: {err}");
    }

    pub fn message_unreadable(path: &Path, err: &std::io::Error) {
        warn!("Could not read {}: {err}, using fallback message", path.display());
    }

    pub fn connection_closed(address: &SocketAddr) {
        debug!("[-] {address}");
    }

    pub fn connection_error(address: &SocketAddr, err: &SessionError) {
        if dotenvy::var("DO_NOT_LOG_CONNECTION_ERROR").is_ok() {
            return;
        }
        error!("connection error@{address}: {err}");
    }

    pub fn shutting_down() {
        info!("Received signal, stopping...");
    }
}
