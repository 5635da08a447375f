use crate::clients::DnsClient;
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.nsone.net";

/// NS1 client, authenticated with `X-NSONE-Key`
pub struct Ns1Client {
    http: Client,
    server: String,
    api_key: String,
}

impl Ns1Client {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require("key", "NS1")?;

        Ok(Ns1Client {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            api_key,
        })
    }
}

impl DnsClient for Ns1Client {
    /// NS1 replaces the whole answer set when the record is POSTed.
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let url = format!(
            "{}/v1/zones/{}/{}/A",
            self.server, target.apex, target.domain
        );

        log::info!("Updating {} with NS1", target.domain);

        let body = json!({
            "answers": [{ "answer": [ip.to_string()] }],
            "ttl": 600,
        });
        let request = Request::post(url)
            .header("X-NSONE-Key", self.api_key.as_str())
            .json(body);
        self.http.execute(request)?.json()?;

        log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "NS1"
    }
}
