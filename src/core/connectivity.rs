//! Internet reachability check for plugins that need it

use airpi_core::{CONNECTIVITY_PROBE_URL, CONNECTIVITY_TIMEOUT};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Answers whether the internet is reachable
pub trait ConnectivityGate {
    fn is_online(&self) -> bool;
}

/// Probes a well-known URL over HTTP.
///
/// Any HTTP response, error statuses included, proves the network works;
/// only transport failures (DNS, refused, timeout) count as offline. The
/// answer is kept for the rest of startup.
pub struct HttpProbe {
    url: String,
    timeout: Duration,
    result: OnceCell<bool>,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            result: OnceCell::new(),
        }
    }

    fn probe(&self) -> bool {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        match agent.get(&self.url).call() {
            Ok(_) | Err(ureq::Error::Status(_, _)) => true,
            Err(e) => {
                log::info!("Internet check against {} failed: {}", self.url, e);
                false
            }
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(CONNECTIVITY_PROBE_URL, CONNECTIVITY_TIMEOUT)
    }
}

impl ConnectivityGate for HttpProbe {
    fn is_online(&self) -> bool {
        *self.result.get_or_init(|| self.probe())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Gate with a fixed answer that counts how often it was asked
    pub(crate) struct FixedGate {
        pub online: bool,
        pub asked: Cell<usize>,
    }

    impl FixedGate {
        pub(crate) fn new(online: bool) -> Self {
            Self {
                online,
                asked: Cell::new(0),
            }
        }
    }

    impl ConnectivityGate for FixedGate {
        fn is_online(&self) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.online
        }
    }

    #[test]
    fn test_error_status_still_counts_as_online() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf);
            socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let probe = HttpProbe::new(url, Duration::from_secs(2));
        assert!(probe.is_online());
        // memoised: the server only accepts once
        assert!(probe.is_online());
        server.join().unwrap();
    }

    #[test]
    fn test_refused_connection_is_offline() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = HttpProbe::new(format!("http://127.0.0.1:{}/", port), Duration::from_millis(500));
        assert!(!probe.is_online());
    }
}
