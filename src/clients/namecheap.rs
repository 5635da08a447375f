use crate::clients::DnsClient;
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{Client, Request};
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://dynamicdns.park-your-domain.com";

/// Namecheap Dynamic DNS client
pub struct NamecheapClient {
    http: Client,
    server: String,
    password: String,
}

impl NamecheapClient {
    /// The dynamic DNS password is set per domain in the Namecheap dashboard.
    pub fn new(config: &Config) -> Result<Self> {
        let password = config.require("password", "Namecheap")?;

        Ok(NamecheapClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            password,
        })
    }
}

/// Text of the first `<tag>...</tag>` element in `body`
fn element<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)?;
    Some(body[start..start + end].trim())
}

impl DnsClient for NamecheapClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        log::info!("Updating {} with Namecheap", target.domain);

        let request = Request::get(format!("{}/update", self.server))
            .param("host", &target.record)
            .param("domain", &target.apex)
            .param("password", &self.password)
            .param("ip", ip);
        let response = self.http.execute(request)?.ensure_success()?;
        let body = response.text();

        // Namecheap returns XML
        // Success: <ErrCount>0</ErrCount>
        // Failure: <ErrCount>1</ErrCount> with <Err1>message</Err1>
        if element(&body, "ErrCount") == Some("0") {
            log::info!("DNS record for {} successfully updated to {}", target.domain, ip);
            return Ok(());
        }

        let message = match element(&body, "Err1") {
            Some(error) => response.redact(error),
            None => format!("unexpected response: {}", response.excerpt()),
        };
        Err(Error::provider(self.provider_name(), message))
    }

    fn provider_name(&self) -> &str {
        "Namecheap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tests::{mock_config, target, IP};
    use mockito::Matcher;

    const SUCCESS: &str = r#"<?xml version="1.0"?><interface-response><Command>SETDNSHOST</Command><Language>eng</Language><IP>203.0.113.7</IP><ErrCount>0</ErrCount><Done>true</Done></interface-response>"#;
    const FAILURE: &str = r#"<?xml version="1.0"?><interface-response><Command>SETDNSHOST</Command><ErrCount>1</ErrCount><errors><Err1>Passwords do not match</Err1></errors><Done>true</Done></interface-response>"#;

    fn client(server: &mockito::Server) -> NamecheapClient {
        let config = mock_config("namecheap", &[("password", "ncpass")], &server.url());
        NamecheapClient::new(&config).unwrap()
    }

    #[test]
    fn test_successful_update() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/update")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("host".into(), "www".into()),
                Matcher::UrlEncoded("domain".into(), "example.com".into()),
                Matcher::UrlEncoded("password".into(), "ncpass".into()),
                Matcher::UrlEncoded("ip".into(), "203.0.113.7".into()),
            ]))
            .with_body(SUCCESS)
            .create();

        client(&server).update_record(&target("www.example.com"), IP).unwrap();
        mock.assert();
    }

    #[test]
    fn test_error_extracted() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/update")
            .match_query(Matcher::Any)
            .with_body(FAILURE)
            .create();

        let err = client(&server)
            .update_record(&target("www.example.com"), IP)
            .unwrap_err();
        assert_eq!(err.to_string(), "Namecheap error: Passwords do not match");
    }

    #[test]
    fn test_echoed_password_masked_in_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/update")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("<html>Cannot GET /update?domain=example.com&host=www&ip=203.0.113.7&password=ncpass</html>")
            .create();

        let err = client(&server)
            .update_record(&target("www.example.com"), IP)
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Http { status: 404, .. }));
        assert!(!message.contains("ncpass"));
        assert!(message.contains("password=***"));
    }

    #[test]
    fn test_element() {
        assert_eq!(element(SUCCESS, "ErrCount"), Some("0"));
        assert_eq!(element(SUCCESS, "Err1"), None);
        assert_eq!(element("<a>open", "a"), None);
    }
}
