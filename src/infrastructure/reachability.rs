//! Reachability Probe
//!
//! Cheap TCP pre-check that runs before any protocol conversation.

use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Check whether a TCP port accepts connections within the timeout.
///
/// Used to skip the expensive protocol probe for backends that are not
/// even listening. Any outcome other than a completed connect, refusal,
/// DNS failure or timeout alike, counts as unreachable.
pub async fn port_open(host: &str, port: u16, timeout: Duration) -> bool {
    let addr = format!("{}:{}", host, port);
    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(mut stream)) => {
            let _ = stream.shutdown().await;
            true
        }
        Ok(Err(_)) => false,
        Err(_) => false,
    }
}

/// Extract the host from an endpoint URL.
///
/// Falls back to loopback when the URL does not parse, so a malformed
/// endpoint degrades to a failed check instead of a panic.
pub fn host_of(endpoint_url: &str) -> String {
    reqwest::Url::parse(endpoint_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_port_open_with_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept connection in background
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let open = port_open("127.0.0.1", port, Duration::from_secs(1)).await;
        assert!(open);
    }

    #[tokio::test]
    async fn test_port_closed_after_listener_drops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let open = port_open("127.0.0.1", port, Duration::from_secs(1)).await;
        assert!(!open);
    }

    #[tokio::test]
    async fn test_port_open_times_out() {
        // Non-routable address, the connect should hang until the timeout
        let open = port_open("10.255.255.1", 9999, Duration::from_millis(100)).await;
        assert!(!open);
    }

    #[test]
    fn test_host_of_plain_url() {
        assert_eq!(host_of("http://localhost:11434"), "localhost");
        assert_eq!(host_of("http://192.168.1.50:8080"), "192.168.1.50");
        assert_eq!(host_of("https://models.internal:1234/v1"), "models.internal");
    }

    #[test]
    fn test_host_of_malformed_url_falls_back() {
        assert_eq!(host_of("not a url"), "127.0.0.1");
        assert_eq!(host_of(""), "127.0.0.1");
    }
}
