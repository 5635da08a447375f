use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{Client, Request};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.cloudflare.com/client/v4";

/// Wrapper around every Cloudflare v4 response
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    result: Value,
}

/// Cloudflare client using the global API key (`X-Auth-Email` / `X-Auth-Key`)
pub struct CloudflareClient {
    http: Client,
    server: String,
    email: String,
    key: String,
}

impl CloudflareClient {
    pub fn new(config: &Config) -> Result<Self> {
        let email = config.require("email", "Cloudflare")?;
        let key = config.require("key", "Cloudflare")?;

        Ok(CloudflareClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            email,
            key,
        })
    }

    fn authed(&self, request: Request) -> Request {
        request
            .header("X-Auth-Email", self.email.as_str())
            .header("X-Auth-Key", self.key.as_str())
    }

    /// Send `request` and unwrap `result` from a successful envelope.
    fn call(&self, request: Request) -> Result<Value> {
        let body = self.http.execute(self.authed(request))?.json()?;
        let envelope: Envelope = serde_json::from_value(body)?;
        if envelope.success {
            Ok(envelope.result)
        } else {
            Err(Error::provider(self.provider_name(), envelope.errors.to_string()))
        }
    }

    fn get_zone_id(&self, zone: &str) -> Result<String> {
        let result = self.call(Request::get(format!("{}/zones", self.server)).param("name", zone))?;

        let zones = records(self.provider_name(), &result, "")?;
        let zone_entry = zones
            .first()
            .ok_or_else(|| Error::record_not_found(zone, zone))?;
        id_of(self.provider_name(), zone_entry, "id")
    }

    fn get_record_id(&self, zone_id: &str, target: &Target) -> Result<String> {
        let result = self.call(
            Request::get(format!("{}/zones/{}/dns_records", self.server, zone_id))
                .param("name", &target.domain)
                .param("type", "A"),
        )?;

        let entries = records(self.provider_name(), &result, "")?;
        let record = first_match(entries, &target.domain, &target.apex, |r| {
            field_is(r, "name", &target.domain) && field_is(r, "type", "A")
        })?;
        id_of(self.provider_name(), record, "id")
    }
}

impl DnsClient for CloudflareClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let zone_id = self.get_zone_id(&target.apex)?;
        log::info!("cloudflare domain={} to ip={} zone_id: {}", target.domain, ip, zone_id);

        let record_id = self.get_record_id(&zone_id, target)?;
        log::info!("cloudflare domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let body = json!({
            "type": "A",
            "ttl": 300,
            "proxied": false,
            "name": target.domain,
            "content": ip.to_string(),
        });
        self.call(
            Request::put(format!(
                "{}/zones/{}/dns_records/{}",
                self.server, zone_id, record_id
            ))
            .json(body),
        )?;

        log::info!("DNS Record for {} successfully updated to IP: {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "Cloudflare"
    }
}
