use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{Client, Request};
use serde_json::json;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://api.digitalocean.com";

/// DigitalOcean client - https://docs.digitalocean.com/reference/api/api-reference/#tag/Domain-Records
pub struct DigitalOceanClient {
    http: Client,
    token: String,
    server: String,
}

impl DigitalOceanClient {
    /// Creates a DigitalOceanClient from the given configuration.
    ///
    /// The API token is read from the `key` argument. The API server base URL
    /// is taken from `server` or defaults to "https://api.digitalocean.com".
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is missing.
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.require("key", "DigitalOcean")?;

        Ok(DigitalOceanClient {
            http: Client::from_config(config),
            token,
            server: config.server_or(DEFAULT_SERVER),
        })
    }

    /// Fetches the ID of the first A record named `target.record` in the apex zone.
    fn get_record_id(&self, target: &Target) -> Result<String> {
        let url = format!("{}/v2/domains/{}/records", self.server, target.apex);
        let request = Request::get(url).header("Authorization", format!("Bearer {}", self.token));
        let body = self.http.execute(request)?.json()?;

        let entries = records(self.provider_name(), &body, "/domain_records")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "name", &target.record) && field_is(r, "type", "A")
        })?;
        id_of(self.provider_name(), record, "id")
    }
}

impl DnsClient for DigitalOceanClient {
    /// Looks up the record ID for `target`, then replaces its data with `ip`.
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let record_id = self.get_record_id(target)?;
        log::info!("digitalocean domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let url = format!(
            "{}/v2/domains/{}/records/{}",
            self.server, target.apex, record_id
        );
        let body = json!({
            "type": "A",
            "name": target.record,
            "data": ip.to_string(),
            "ttl": 600,
        });
        let request = Request::put(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(body);
        self.http.execute(request)?.json()?;

        log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "DigitalOcean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use crate::error::Error;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> DigitalOceanClient {
        let config = mock_config("digitalocean", &[("key", "dotoken")], &server.url());
        DigitalOceanClient::new(&config).unwrap()
    }

    fn listing_mock(server: &mut mockito::Server, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/v2/domains/example.com/records")
            .match_header("authorization", "Bearer dotoken")
            .with_body(body)
            .create()
    }

    #[test]
    fn test_selects_record_by_name_not_position() {
        let mut server = mockito::Server::new();
        let listing = listing_mock(
            &mut server,
            r#"{"domain_records":[
                {"id":11,"name":"www","type":"A"},
                {"id":22,"name":"api","type":"A"}
            ]}"#,
        );
        let update = server
            .mock("PUT", "/v2/domains/example.com/records/22")
            .match_body(Matcher::Json(json!({
                "type": "A",
                "name": "api",
                "data": "203.0.113.7",
                "ttl": 600
            })))
            .with_body(r#"{"domain_record":{"id":22}}"#)
            .create();

        client(&server).update_record(&target("api.example.com"), IP).unwrap();

        listing.assert();
        update.assert();
    }

    #[test]
    fn test_record_name_matched_without_case() {
        let mut server = mockito::Server::new();
        listing_mock(
            &mut server,
            r#"{"domain_records":[
                {"id":11,"name":"www","type":"A"},
                {"id":22,"name":"api","type":"a"}
            ]}"#,
        );
        let update = server
            .mock("PUT", "/v2/domains/example.com/records/22")
            .with_body(r#"{"domain_record":{"id":22}}"#)
            .create();

        client(&server).update_record(&target("API.example.com"), IP).unwrap();
        update.assert();
    }

    #[test]
    fn test_selects_first_when_first_matches() {
        let mut server = mockito::Server::new();
        listing_mock(
            &mut server,
            r#"{"domain_records":[
                {"id":22,"name":"api","type":"A"},
                {"id":11,"name":"www","type":"A"}
            ]}"#,
        );
        let update = server
            .mock("PUT", "/v2/domains/example.com/records/22")
            .with_body("{}")
            .create();

        client(&server).update_record(&target("api.example.com"), IP).unwrap();
        update.assert();
    }

    #[test]
    fn test_skips_other_record_types() {
        let mut server = mockito::Server::new();
        listing_mock(
            &mut server,
            r#"{"domain_records":[
                {"id":5,"name":"@","type":"MX"},
                {"id":6,"name":"@","type":"A"}
            ]}"#,
        );
        let update = server
            .mock("PUT", "/v2/domains/example.com/records/6")
            .with_body("{}")
            .create();

        client(&server).update_record(&target("example.com"), IP).unwrap();
        update.assert();
    }

    #[test]
    fn test_absent_record() {
        let mut server = mockito::Server::new();
        listing_mock(&mut server, r#"{"domain_records":[]}"#);

        let err = client(&server)
            .update_record(&target("api.example.com"), IP)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "record not found for zone/domain: api in example.com"
        );
    }

    #[test]
    fn test_missing_token() {
        let config = mock_config("digitalocean", &[], "http://127.0.0.1:1");
        assert!(matches!(DigitalOceanClient::new(&config), Err(Error::Config(_))));
    }
}
