use crate::clients::signing::cloudxns_hmac;
use crate::clients::DnsClient;
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://www.cloudxns.net";

/// RFC 1123 date as CloudXNS expects it in `API-REQUEST-DATE`
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// CloudXNS DNS client
/// Uses the one-shot DDNS endpoint with MD5 header signing
pub struct CloudXnsClient {
    http: Client,
    server: String,
    api_key: String,
    secret_key: String,
}

impl CloudXnsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require("key", "CloudXNS")?;
        let secret_key = config.require("secret", "CloudXNS")?;

        Ok(CloudXnsClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            api_key,
            secret_key,
        })
    }
}

impl DnsClient for CloudXnsClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let url = format!("{}/api2/ddns", self.server);
        let data = serde_json::to_string(&json!({
            "domain": target.domain,
            "ip": ip.to_string(),
            "line_id": "1",
        }))?;
        let date = chrono::Utc::now().format(DATE_FORMAT).to_string();
        let api_hmac = cloudxns_hmac(&self.api_key, &url, &data, &date, &self.secret_key);

        log::info!("Updating {} with CloudXNS", target.domain);

        let request = Request::post(url)
            .header("API-KEY", self.api_key.as_str())
            .header("API-REQUEST-DATE", date)
            .header("API-HMAC", api_hmac)
            .header("API-FORMAT", "json")
            .body(data);
        let body = self.http.execute(request)?.json()?;

        if body["code"].as_i64() != Some(1) {
            return Err(Error::provider(
                self.provider_name(),
                format!(
                    "code {}: {}",
                    body["code"],
                    body["message"].as_str().unwrap_or("no message")
                ),
            ));
        }

        log::info!("cloudxns domain={} to ip={} result: {}", target.domain, ip, body);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "CloudXNS"
    }
}
