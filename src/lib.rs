pub mod compare;
pub mod pool;
pub mod server;

/// Service configuration -- can eventually be lazy_static parsed from a config
/// file
pub mod config {
    /// First port to try when binding the HTTP listener
    pub const START_PORT: u16 = 5001;

    /// Number of comparison worker threads
    pub const POOL_WORKERS: usize = 10;

    /// Default log filter when RUST_LOG is not set by the caller
    pub const RUST_LOG: &str = "info,actix_web=info";
}

/// Network utility functions
pub mod util {
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    const PROBE_TIMEOUT: Duration = Duration::from_millis(50);

    /// Probe ports upward from `start` and return the first one that is not
    /// accepting connections. Best-effort: another process can grab the port
    /// between the probe and the actual bind.
    pub fn find_free_port(start: u16) -> Option<u16> {
        (start..=u16::MAX).find(|port| !port_in_use(*port))
    }

    fn port_in_use(port: u16) -> bool {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok()
    }

}
