use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.linode.com";

/// Linode v4 client
pub struct LinodeClient {
    http: Client,
    server: String,
    api_token: String,
}

impl LinodeClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_token = config.require("key", "Linode")?;

        Ok(LinodeClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            api_token,
        })
    }

    fn get(&self, path: &str) -> Result<serde_json::Value> {
        let request = Request::get(format!("{}{}", self.server, path))
            .header("Authorization", format!("Bearer {}", self.api_token));
        self.http.execute(request)?.json()
    }

    fn get_domain_id(&self, apex: &str) -> Result<String> {
        let body = self.get("/v4/domains")?;
        let domains = records(self.provider_name(), &body, "/data")?;
        let domain = first_match(domains, apex, apex, |d| field_is(d, "domain", apex))?;
        id_of(self.provider_name(), domain, "id")
    }

    fn get_record_id(&self, domain_id: &str, target: &Target) -> Result<String> {
        let body = self.get(&format!("/v4/domains/{}/records", domain_id))?;

        // Linode names the apex record with an empty string
        let name = target.label_or("");
        let entries = records(self.provider_name(), &body, "/data")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "name", name) && field_is(r, "type", "A")
        })?;
        id_of(self.provider_name(), record, "id")
    }
}

impl DnsClient for LinodeClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let domain_id = self.get_domain_id(&target.apex)?;
        log::info!("linode domain={} to ip={} domain_id: {}", target.domain, ip, domain_id);

        let record_id = self.get_record_id(&domain_id, target)?;
        log::info!("linode domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let url = format!(
            "{}/v4/domains/{}/records/{}",
            self.server, domain_id, record_id
        );
        let request = Request::put(url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(json!({ "target": ip.to_string() }));
        self.http.execute(request)?.json()?;

        log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "Linode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use mockito::Matcher;

    fn mock_domains(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", "/v4/domains")
            .match_header("authorization", "Bearer ltoken")
            .with_body(
                r#"{"data":[{"id":100,"domain":"example.net"},{"id":200,"domain":"example.com"}]}"#,
            )
            .create()
    }

    #[test]
    fn test_update_subdomain() {
        let mut server = mockito::Server::new();
        let domains = mock_domains(&mut server);
        let listing = server
            .mock("GET", "/v4/domains/200/records")
            .with_body(
                r#"{"data":[
                    {"id":1,"name":"","type":"A"},
                    {"id":2,"name":"home","type":"AAAA"},
                    {"id":3,"name":"home","type":"A"}
                ]}"#,
            )
            .create();
        let update = server
            .mock("PUT", "/v4/domains/200/records/3")
            .match_body(Matcher::Json(json!({"target": "203.0.113.7"})))
            .with_body(r#"{"id":3,"target":"203.0.113.7"}"#)
            .create();

        let config = mock_config("linode", &[("key", "ltoken")], &server.url());
        LinodeClient::new(&config)
            .unwrap()
            .update_record(&target("home.example.com"), IP)
            .unwrap();

        domains.assert();
        listing.assert();
        update.assert();
    }

    #[test]
    fn test_update_apex() {
        let mut server = mockito::Server::new();
        mock_domains(&mut server);
        server
            .mock("GET", "/v4/domains/200/records")
            .with_body(r#"{"data":[{"id":3,"name":"home","type":"A"},{"id":1,"name":"","type":"A"}]}"#)
            .create();
        let update = server
            .mock("PUT", "/v4/domains/200/records/1")
            .with_body("{}")
            .create();

        let config = mock_config("linode", &[("key", "ltoken")], &server.url());
        LinodeClient::new(&config)
            .unwrap()
            .update_record(&target("example.com"), IP)
            .unwrap();
        update.assert();
    }
}
