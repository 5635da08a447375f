use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{pair, Client, Params, Request};
use serde_json::Value;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://dnsapi.cn";

/// Line every record is published on
const DEFAULT_LINE: &str = "默认";

/// DNSPod client (dnsapi.cn), email/password login with form-encoded POSTs
pub struct DnspodClient {
    http: Client,
    server: String,
    email: String,
    password: String,
}

impl DnspodClient {
    pub fn new(config: &Config) -> Result<Self> {
        let email = config.require("email", "DNSPod")?;
        let password = config.require("password", "DNSPod")?;

        Ok(DnspodClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            email,
            password,
        })
    }

    fn login_params(&self) -> Params {
        vec![
            pair("login_email", &self.email),
            pair("login_password", &self.password),
            pair("format", "json"),
        ]
    }

    /// POST an API action; DNSPod reports failures in `status` with HTTP 200.
    fn call(&self, action: &str, extra: Params) -> Result<Value> {
        let request = Request::post(format!("{}/{}", self.server, action))
            .params(self.login_params())
            .params(extra);
        let body = self.http.execute(request)?.json()?;

        let status = &body["status"];
        if status["code"].as_str() != Some("1") {
            return Err(Error::provider(
                self.provider_name(),
                format!(
                    "{} failed with code {}: {}",
                    action,
                    status["code"],
                    status["message"].as_str().unwrap_or("no message")
                ),
            ));
        }
        Ok(body)
    }

    fn get_domain_id(&self, apex: &str) -> Result<String> {
        let body = self.call("Domain.List", Vec::new())?;
        let domains = records(self.provider_name(), &body, "/domains")?;
        let domain = first_match(domains, apex, apex, |d| field_is(d, "punycode", apex))?;
        id_of(self.provider_name(), domain, "id")
    }

    fn get_record_id(&self, domain_id: &str, target: &Target) -> Result<String> {
        let body = self.call("Record.List", vec![pair("domain_id", domain_id)])?;
        let entries = records(self.provider_name(), &body, "/records")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "name", &target.record)
                && field_is(r, "type", "A")
                && field_is(r, "line", DEFAULT_LINE)
        })?;
        id_of(self.provider_name(), record, "id")
    }
}

impl DnsClient for DnspodClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let domain_id = self.get_domain_id(&target.apex)?;
        log::info!("dnspod domain={} to ip={} domain_id: {}", target.domain, ip, domain_id);

        let record_id = self.get_record_id(&domain_id, target)?;
        log::info!("dnspod domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        self.call(
            "Record.Modify",
            vec![
                pair("domain_id", &domain_id),
                pair("record_id", &record_id),
                pair("record_type", "A"),
                pair("record_line", DEFAULT_LINE),
                pair("value", ip),
                pair("mx", 5),
                pair("sub_domain", &target.record),
            ],
        )?;

        log::info!("Successfully updated {} to {}", target.domain, ip);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "DNSPod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use mockito::Matcher;

    const OK: &str = r#""status":{"code":"1","message":"Action completed successful"}"#;

    fn client(server: &mockito::Server) -> DnspodClient {
        let config = mock_config(
            "dnspod",
            &[("email", "me@example.com"), ("password", "pw")],
            &server.url(),
        );
        DnspodClient::new(&config).unwrap()
    }

    #[test]
    fn test_update_flow() {
        let mut server = mockito::Server::new();
        let domains = server
            .mock("POST", "/Domain.List")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("login_email".into(), "me@example.com".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_body(format!(
                r#"{{{},"domains":[{{"id":1,"punycode":"other.com"}},{{"id":2,"punycode":"example.com"}}]}}"#,
                OK
            ))
            .create();
        let listing = server
            .mock("POST", "/Record.List")
            .match_body(Matcher::UrlEncoded("domain_id".into(), "2".into()))
            .with_body(format!(
                r#"{{{},"records":[
                    {{"id":"10","name":"www","type":"A","line":"电信"}},
                    {{"id":"11","name":"www","type":"A","line":"默认"}}
                ]}}"#,
                OK
            ))
            .create();
        let modify = server
            .mock("POST", "/Record.Modify")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("record_id".into(), "11".into()),
                Matcher::UrlEncoded("record_line".into(), "默认".into()),
                Matcher::UrlEncoded("value".into(), "203.0.113.7".into()),
                Matcher::UrlEncoded("sub_domain".into(), "www".into()),
                Matcher::UrlEncoded("mx".into(), "5".into()),
            ]))
            .with_body(format!("{{{}}}", OK))
            .create();

        client(&server).update_record(&target("www.example.com"), IP).unwrap();

        domains.assert();
        listing.assert();
        modify.assert();
    }

    #[test]
    fn test_status_code_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/Domain.List")
            .with_body(r#"{"status":{"code":"-1","message":"Login fail"}}"#)
            .create();

        let err = client(&server)
            .update_record(&target("www.example.com"), IP)
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(err.to_string().contains("Login fail"));
        assert!(!err.to_string().contains("pw"));
    }
}
