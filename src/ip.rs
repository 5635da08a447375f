use crate::error::{Error, Result};
use crate::http::{Client, Request};
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

/// IP-echo services raced against each other
pub const DEFAULT_SERVICES: [&str; 3] = [
    "http://ip.3322.org",
    "http://whatismyip.akamai.com/",
    "http://checkip.amazonaws.com/",
];

/// Per-service request timeout (seconds)
pub const WORKER_TIMEOUT: u64 = 5;

/// Upper bound on the whole race (seconds)
pub const DISCOVERY_TIMEOUT: u64 = 10;

/// Echo services answer plain text to curl
const ECHO_USER_AGENT: &str = "curl/7.53";

static IPV4_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").expect("IPv4 pattern compiles"));

/// Where the public IP comes from
#[derive(Debug, Clone, PartialEq)]
pub enum IpSource {
    /// Address given on the command line
    Manual(String),
    /// Race the listed echo services
    Web {
        services: Vec<String>,
        worker_timeout: u64,
        deadline: Duration,
    },
}

impl Default for IpSource {
    fn default() -> Self {
        Self::Web {
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            worker_timeout: WORKER_TIMEOUT,
            deadline: Duration::from_secs(DISCOVERY_TIMEOUT),
        }
    }
}

/// Parse and validate a provided IPv4 address string
pub fn parse_ip(ip_str: &str) -> Result<Ipv4Addr> {
    ip_str
        .parse()
        .map_err(|e| Error::config(format!("'{}' is an invalid IPv4 address: {}", ip_str, e)))
}

/// First dotted-quad in `text` that is a real IPv4 address.
pub fn extract_ipv4(text: &str) -> Option<Ipv4Addr> {
    IPV4_PATTERN
        .find_iter(text)
        .find_map(|m| m.as_str().parse().ok())
}

/// Ask one echo service for our address
fn try_service(url: &str, timeout: u64) -> Result<Ipv4Addr> {
    let request = Request::get(url)
        .header("User-Agent", ECHO_USER_AGENT)
        .timeout(timeout);
    let response = Client::default().execute(request)?.ensure_success()?;
    let text = response.text();
    extract_ipv4(&text)
        .ok_or_else(|| Error::Discovery(format!("{} answered without an IPv4 address", url)))
}

/// Race every service on its own thread and return the first address found.
///
/// Workers report through a single-slot channel. Losing workers are left to
/// finish on their own; their sends fail once the receiver is gone. The wait
/// ends early when every worker has failed and never outlasts `deadline`.
pub fn discover(services: &[String], worker_timeout: u64, deadline: Duration) -> Result<Ipv4Addr> {
    if services.is_empty() {
        return Err(Error::Discovery("no IP services configured".to_string()));
    }

    let (tx, rx) = mpsc::sync_channel::<(String, std::result::Result<Ipv4Addr, String>)>(1);

    for (i, url) in services.iter().enumerate() {
        let tx = tx.clone();
        let url = url.clone();
        thread::Builder::new()
            .name(format!("getip-{}", i))
            .spawn(move || {
                let outcome = try_service(&url, worker_timeout).map_err(|e| e.to_string());
                let _ = tx.send((url, outcome));
            })?;
    }
    drop(tx);

    let expires = Instant::now() + deadline;
    let mut failures = Vec::new();

    loop {
        let remaining = expires.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((url, Ok(ip))) => {
                log::info!("getip() from {}: {}", url, ip);
                return Ok(ip);
            }
            Ok((url, Err(e))) => {
                log::debug!("Failed to get IP from {}: {}", url, e);
                failures.push(url);
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(Error::Discovery(format!(
                    "no answer from {} services within {}s",
                    services.len(),
                    deadline.as_secs()
                )));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::Discovery(format!(
                    "all services failed: {}",
                    failures.join(", ")
                )));
            }
        }
    }
}

/// Get the public IP using the configured source
pub fn get_ip(source: &IpSource) -> Result<Ipv4Addr> {
    match source {
        IpSource::Manual(ip_str) => parse_ip(ip_str),
        IpSource::Web {
            services,
            worker_timeout,
            deadline,
        } => discover(services, *worker_timeout, *deadline),
    }
}

/// Forward lookup of the domain being updated
pub trait Resolver {
    fn resolve(&self, domain: &str) -> Option<Ipv4Addr>;
}

/// The operating system's resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, domain: &str) -> Option<Ipv4Addr> {
        let addrs = match (domain, 0).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                log::debug!("Could not resolve {}: {}", domain, e);
                return None;
            }
        };
        addrs
            .map(|addr| addr.ip())
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
    }
}
