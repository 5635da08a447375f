use crate::clients::DnsClient;
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.godaddy.com";

/// GoDaddy client
/// Replaces the A record set in one PUT, authenticated with an `sso-key` header
pub struct GoDaddyClient {
    http: Client,
    server: String,
    api_key: String,
    api_secret: String,
}

impl GoDaddyClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require("key", "GoDaddy")?;
        let api_secret = config.require("secret", "GoDaddy")?;

        Ok(GoDaddyClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            api_key,
            api_secret,
        })
    }
}

impl DnsClient for GoDaddyClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let url = format!(
            "{}/v1/domains/{}/records/A/{}",
            self.server, target.apex, target.record
        );

        log::info!("Updating {} with GoDaddy", target.domain);

        let body = json!([{
            "data": ip.to_string(),
            "ttl": 600,
        }]);
        let request = Request::put(url)
            .header(
                "Authorization",
                format!("sso-key {}:{}", self.api_key, self.api_secret),
            )
            .json(body);
        self.http.execute(request)?.ensure_success()?;

        log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "GoDaddy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use crate::error::Error;
    use mockito::Matcher;

    #[test]
    fn test_put_record_set() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/v1/domains/example.com/records/A/www")
            .match_header("authorization", "sso-key gdkey:gdsecret")
            .match_body(Matcher::Json(json!([{"data": "203.0.113.7", "ttl": 600}])))
            .with_status(200)
            .create();

        let config = mock_config("godaddy", &[("key", "gdkey"), ("secret", "gdsecret")], &server.url());
        GoDaddyClient::new(&config)
            .unwrap()
            .update_record(&target("www.example.com"), IP)
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_apex_uses_at() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/v1/domains/example.com/records/A/@")
            .with_status(200)
            .create();

        let config = mock_config("godaddy", &[("key", "gdkey"), ("secret", "gdsecret")], &server.url());
        GoDaddyClient::new(&config)
            .unwrap()
            .update_record(&target("example.com"), IP)
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_error_status_surfaces_body() {
        let mut server = mockito::Server::new();
        server
            .mock("PUT", "/v1/domains/example.com/records/A/www")
            .with_status(422)
            .with_body(r#"{"code":"INVALID_BODY","message":"Request body doesn't fulfill schema"}"#)
            .create();

        let config = mock_config("godaddy", &[("key", "gdkey"), ("secret", "gdsecret")], &server.url());
        let err = GoDaddyClient::new(&config)
            .unwrap()
            .update_record(&target("www.example.com"), IP)
            .unwrap_err();
        match err {
            Error::Http { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("INVALID_BODY"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
