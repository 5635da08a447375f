use crate::clients::DnsClient;
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{Client, Request};
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://dyn.dns.he.net/nic/update";

/// Hurricane Electric dynamic DNS client
pub struct HurricaneElectricClient {
    http: Client,
    password: String,
    server: String,
}

impl HurricaneElectricClient {
    /// The dynamic DNS key for the record is the `key` argument.
    pub fn new(config: &Config) -> Result<Self> {
        let password = config.require("key", "Hurricane Electric")?;

        Ok(HurricaneElectricClient {
            http: Client::from_config(config),
            password,
            server: config.server_or(DEFAULT_SERVER),
        })
    }
}

impl DnsClient for HurricaneElectricClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        log::info!("Updating {} with Hurricane Electric", target.domain);

        let request = Request::get(self.server.as_str())
            .param("hostname", &target.domain)
            .param("password", &self.password)
            .param("myip", ip);
        let response = self.http.execute(request)?.ensure_success()?;
        let text = response.text();
        let body = text.trim();

        // HE.net answers in dyndns2 style
        if body.starts_with("good") || body.starts_with("nochg") {
            log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
            Ok(())
        } else if body.starts_with("badauth") {
            Err(Error::provider(
                self.provider_name(),
                "bad authentication - check the key",
            ))
        } else if body.starts_with("notfqdn") {
            Err(Error::provider(
                self.provider_name(),
                "not a fully-qualified domain name",
            ))
        } else {
            Err(Error::provider(
                self.provider_name(),
                format!("unexpected response: {}", response.redact(body)),
            ))
        }
    }

    fn provider_name(&self) -> &str {
        "Hurricane Electric"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> HurricaneElectricClient {
        let url = format!("{}/nic/update", server.url());
        let config = mock_config("he", &[("key", "hekey")], &url);
        HurricaneElectricClient::new(&config).unwrap()
    }

    #[test]
    fn test_good_response() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/nic/update")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("hostname".into(), "dyn.example.com".into()),
                Matcher::UrlEncoded("password".into(), "hekey".into()),
                Matcher::UrlEncoded("myip".into(), "203.0.113.7".into()),
            ]))
            .with_body("good 203.0.113.7")
            .create();

        client(&server).update_record(&target("dyn.example.com"), IP).unwrap();
        mock.assert();
    }

    #[test]
    fn test_nochg_response() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/nic/update")
            .match_query(Matcher::Any)
            .with_body("nochg 203.0.113.7\n")
            .create();

        assert!(client(&server).update_record(&target("dyn.example.com"), IP).is_ok());
    }

    #[test]
    fn test_badauth_response() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/nic/update")
            .match_query(Matcher::Any)
            .with_body("badauth")
            .create();

        let err = client(&server)
            .update_record(&target("dyn.example.com"), IP)
            .unwrap_err();
        assert!(err.to_string().contains("bad authentication"));
        assert!(!err.to_string().contains("hekey"));
    }

    #[test]
    fn test_unexpected_response_masks_key() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/nic/update")
            .match_query(Matcher::Any)
            .with_body("abuse: hostname=dyn.example.com password=hekey")
            .create();

        let err = client(&server)
            .update_record(&target("dyn.example.com"), IP)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Hurricane Electric error: unexpected response: abuse: hostname=dyn.example.com password=***"
        );
    }
}
