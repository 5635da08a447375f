use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://dns.api.gandi.net";

/// Gandi LiveDNS client, authenticated with `X-Api-Key`
pub struct GandiClient {
    http: Client,
    server: String,
    api_key: String,
}

impl GandiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require("key", "Gandi")?;

        Ok(GandiClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            api_key,
        })
    }

    /// UUID of the zone named `apex`
    fn get_zone_id(&self, apex: &str) -> Result<String> {
        let request = Request::get(format!("{}/api/v5/zones", self.server))
            .header("X-Api-Key", self.api_key.as_str());
        let body = self.http.execute(request)?.json()?;

        let zones = records(self.provider_name(), &body, "")?;
        let zone = first_match(zones, apex, apex, |z| field_is(z, "name", apex))?;
        id_of(self.provider_name(), zone, "uuid")
    }
}

impl DnsClient for GandiClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let zone_id = self.get_zone_id(&target.apex)?;
        log::info!("gandi domain={} to ip={} zone_id: {}", target.domain, ip, zone_id);

        let url = format!(
            "{}/api/v5/zones/{}/records/{}/A",
            self.server, zone_id, target.record
        );
        let body = json!({
            "rrset_ttl": 300,
            "rrset_values": [ip.to_string()],
        });
        let request = Request::put(url)
            .header("X-Api-Key", self.api_key.as_str())
            .json(body);
        let response = self.http.execute(request)?.ensure_success()?;

        log::info!(
            "gandi domain={} to ip={} info: {}",
            target.domain,
            ip,
            response.text().trim()
        );
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "Gandi"
    }
}
