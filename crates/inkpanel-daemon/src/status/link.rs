//! Link state and reachability queries.

use std::ffi::CStr;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Host network queries used by the status probe.
pub trait LinkStatus {
    /// Returns true if the named interface is administratively up and has
    /// carrier. A missing interface is reported as down.
    fn interface_up(&self, interface: &str) -> io::Result<bool>;

    /// Opens and closes a TCP connection to `endpoint`, an "ip:port" literal.
    /// Host names are rejected; no lookup is made.
    fn reachable(&self, endpoint: &str, timeout: Duration) -> io::Result<()>;
}

/// Queries the running kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLink;

impl LinkStatus for SystemLink {
    fn interface_up(&self, interface: &str) -> io::Result<bool> {
        let wanted = (libc::IFF_UP | libc::IFF_RUNNING) as libc::c_uint;
        let mut up = false;

        // SAFETY: getifaddrs is a standard POSIX function. The list is only
        // read while it is alive and freed with freeifaddrs.
        unsafe {
            let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();
            if libc::getifaddrs(&mut ifaddrs) != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut current = ifaddrs;
            while !current.is_null() {
                let ifa = &*current;
                if !ifa.ifa_name.is_null()
                    && CStr::from_ptr(ifa.ifa_name).to_string_lossy() == interface
                    && ifa.ifa_flags & wanted == wanted
                {
                    up = true;
                    break;
                }
                current = ifa.ifa_next;
            }

            libc::freeifaddrs(ifaddrs);
        }

        Ok(up)
    }

    fn reachable(&self, endpoint: &str, timeout: Duration) -> io::Result<()> {
        let addr: SocketAddr = endpoint.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not an ip:port endpoint", endpoint),
            )
        })?;
        TcpStream::connect_timeout(&addr, timeout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_loopback_is_up() {
        assert!(SystemLink.interface_up("lo").unwrap());
    }

    #[test]
    fn test_unknown_interface_is_down() {
        assert!(!SystemLink.interface_up("inkpanel-none0").unwrap());
    }

    #[test]
    fn test_reachable_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        assert!(SystemLink
            .reachable(&endpoint, Duration::from_millis(500))
            .is_ok());
    }

    #[test]
    fn test_unreachable_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(SystemLink
            .reachable(&endpoint, Duration::from_millis(500))
            .is_err());
    }

    #[test]
    fn test_bad_endpoint() {
        assert!(SystemLink
            .reachable("not an endpoint", Duration::from_millis(100))
            .is_err());
    }

    #[test]
    fn test_hostname_endpoint_rejected_without_lookup() {
        let err = SystemLink
            .reachable("localhost:53", Duration::from_millis(100))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
