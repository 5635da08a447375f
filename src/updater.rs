use crate::clients::DnsClient;
use crate::domain::{self, SuffixList};
use crate::error::Result;
use crate::ip::{self, IpSource, Resolver};
use std::net::Ipv4Addr;

/// What a run did to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated(Ipv4Addr),
    /// The domain already resolves to this address; the provider was not contacted
    Unchanged(Ipv4Addr),
}

/// Discover the public IP and point `domain` at it.
///
/// The provider is only called when the resolver's answer differs from the
/// discovered address. A failed lookup counts as different.
pub fn run(
    client: &dyn DnsClient,
    domain: &str,
    source: &IpSource,
    resolver: &dyn Resolver,
    suffixes: &dyn SuffixList,
) -> Result<Outcome> {
    domain::validate(domain)?;
    let ip = ip::get_ip(source)?;

    match resolver.resolve(domain) {
        Some(current) if current == ip => {
            log::info!("{}: IP hasn't changed ({}), skipping update", domain, ip);
            return Ok(Outcome::Unchanged(ip));
        }
        Some(current) => log::info!("{}: resolves to {}, updating to {}", domain, current, ip),
        None => log::info!("{}: current address unknown, updating to {}", domain, ip),
    }

    let target = domain::split(domain, suffixes);
    log::debug!("{}: record {} in zone {}", domain, target.record, target.apex);

    client.update_record(&target, ip)?;
    log::info!("Successfully updated {} via {}", domain, client.provider_name());
    Ok(Outcome::Updated(ip))
}
