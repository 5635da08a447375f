use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{Client, Request};
use serde_json::{json, Value};
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.dnsimple.com";

/// DNSimple v2 client
///
/// The account is looked up through `/v2/whoami` unless `account_id` is given.
pub struct DnsimpleClient {
    http: Client,
    server: String,
    token: String,
    account_id: Option<String>,
}

impl DnsimpleClient {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.require("key", "DNSimple")?;

        Ok(DnsimpleClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            token,
            account_id: config.optional("account_id"),
        })
    }

    fn authed(&self, request: Request) -> Request {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
    }

    fn account_id(&self) -> Result<String> {
        if let Some(id) = &self.account_id {
            return Ok(id.clone());
        }

        let request = self.authed(Request::get(format!("{}/v2/whoami", self.server)));
        let body = self.http.execute(request)?.json()?;
        let data = &body["data"];
        match &data["account"] {
            Value::Null => id_of(self.provider_name(), data, "id"),
            account => id_of(self.provider_name(), account, "id"),
        }
    }

    fn get_record_id(&self, account_id: &str, target: &Target) -> Result<String> {
        let url = format!(
            "{}/v2/{}/zones/{}/records",
            self.server, account_id, target.apex
        );
        let body = self.http.execute(self.authed(Request::get(url)))?.json()?;

        // DNSimple names the apex record with an empty string
        let name = target.label_or("");
        let entries = records(self.provider_name(), &body, "/data")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "name", name) && field_is(r, "type", "A")
        })?;
        id_of(self.provider_name(), record, "id")
    }
}

impl DnsClient for DnsimpleClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let account_id = self.account_id()?;
        log::info!("dnsimple domain={} to ip={} account_id: {}", target.domain, ip, account_id);

        let record_id = self.get_record_id(&account_id, target)?;
        log::info!("dnsimple domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let url = format!(
            "{}/v2/{}/zones/{}/records/{}",
            self.server, account_id, target.apex, record_id
        );
        let body = json!({
            "content": ip.to_string(),
            "ttl": 600,
            "regions": ["global"],
        });
        let response = self.http.execute(self.authed(Request::patch(url).json(body)))?.json()?;
        if response["data"].is_null() {
            return Err(Error::missing_field(self.provider_name(), "data"));
        }

        log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "DNSimple"
    }
}
