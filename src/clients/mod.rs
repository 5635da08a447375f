use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use serde_json::Value;
use std::net::Ipv4Addr;

pub mod aliyun;
pub mod cloudflare;
pub mod cloudxns;
pub mod digitalocean;
pub mod dnsimple;
pub mod dnspod;
pub mod gandi;
pub mod godaddy;
pub mod he;
pub mod linode;
pub mod namecheap;
pub mod ns1;
pub mod qcloud;
pub mod signing;

/// Common trait that all DNS client implementations must implement
pub trait DnsClient {
    /// Point the A record of `target` at `ip`.
    /// Returns Ok(()) once the provider has accepted the change.
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()>;

    /// Get the provider name for logging purposes
    fn provider_name(&self) -> &str;
}

/// Factory function to create the appropriate DNS client based on provider type
pub fn create_client(provider: &str, config: &Config) -> Result<Box<dyn DnsClient>> {
    let normalized = provider.to_ascii_lowercase();
    match normalized.as_str() {
        "aliyun" | "alidns" => Ok(Box::new(aliyun::AliyunClient::new(config)?)),
        "cloudflare" => Ok(Box::new(cloudflare::CloudflareClient::new(config)?)),
        "cloudxns" => Ok(Box::new(cloudxns::CloudXnsClient::new(config)?)),
        "digitalocean" => Ok(Box::new(digitalocean::DigitalOceanClient::new(config)?)),
        "dnsimple" => Ok(Box::new(dnsimple::DnsimpleClient::new(config)?)),
        "dnspod" => Ok(Box::new(dnspod::DnspodClient::new(config)?)),
        "gandi" => Ok(Box::new(gandi::GandiClient::new(config)?)),
        "godaddy" => Ok(Box::new(godaddy::GoDaddyClient::new(config)?)),
        "he" | "hurricane" => Ok(Box::new(he::HurricaneElectricClient::new(config)?)),
        "linode" => Ok(Box::new(linode::LinodeClient::new(config)?)),
        "namecheap" => Ok(Box::new(namecheap::NamecheapClient::new(config)?)),
        "ns1" | "nsone" => Ok(Box::new(ns1::Ns1Client::new(config)?)),
        "qcloud" | "tencent" => Ok(Box::new(qcloud::QcloudClient::new(config)?)),
        _ => Err(Error::config(format!(
            "unsupported provider: {}. Supported providers: aliyun, cloudflare, cloudxns, \
             digitalocean, dnsimple, dnspod, gandi, godaddy, he, linode, namecheap, ns1, qcloud",
            provider
        ))),
    }
}

/// The JSON array at `pointer` (`""` for a top-level array).
pub(crate) fn records<'a>(provider: &str, body: &'a Value, pointer: &str) -> Result<&'a [Value]> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::missing_field(provider, pointer))
}

/// First entry satisfying `matches`; listing order decides ties.
pub(crate) fn first_match<'a, F>(
    entries: &'a [Value],
    record: &str,
    zone: &str,
    matches: F,
) -> Result<&'a Value>
where
    F: Fn(&Value) -> bool,
{
    entries
        .iter()
        .find(|entry| matches(entry))
        .ok_or_else(|| Error::record_not_found(record, zone))
}

/// An identifier that vendors return either as a string or a number.
pub(crate) fn id_of(provider: &str, entry: &Value, field: &str) -> Result<String> {
    match &entry[field] {
        Value::String(id) if !id.is_empty() => Ok(id.clone()),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(Error::missing_field(provider, field)),
    }
}

/// String field comparison; DNS names and record types ignore ASCII case.
pub(crate) fn field_is(entry: &Value, field: &str, expected: &str) -> bool {
    entry[field]
        .as_str()
        .is_some_and(|value| value.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::NamedArgs;
    use crate::domain::{split, TwoLabel};
    use serde_json::json;

    /// Config pointing a provider at a mock server.
    pub(crate) fn mock_config(provider: &str, pairs: &[(&str, &str)], server: &str) -> Config {
        let arguments: NamedArgs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::from_named(provider, arguments);
        config.server = Some(server.to_string());
        config.timeout = Some(5);
        config
    }

    pub(crate) fn target(domain: &str) -> Target {
        split(domain, &TwoLabel)
    }

    pub(crate) const IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);

    #[test]
    fn test_create_client_known_providers() {
        let cases: [(&str, &[(&str, &str)]); 13] = [
            ("aliyun", &[("key", "k"), ("secret", "s")]),
            ("cloudflare", &[("email", "e@example.com"), ("key", "k")]),
            ("cloudxns", &[("key", "k"), ("secret", "s")]),
            ("digitalocean", &[("key", "k")]),
            ("dnsimple", &[("key", "k")]),
            ("dnspod", &[("email", "e@example.com"), ("password", "p")]),
            ("gandi", &[("key", "k")]),
            ("godaddy", &[("key", "k"), ("secret", "s")]),
            ("he", &[("key", "k")]),
            ("linode", &[("key", "k")]),
            ("namecheap", &[("password", "p")]),
            ("ns1", &[("key", "k")]),
            ("qcloud", &[("secret_id", "i"), ("secret_key", "s")]),
        ];
        for (provider, pairs) in cases {
            let config = mock_config(provider, pairs, "http://127.0.0.1:1");
            let client = create_client(provider, &config)
                .unwrap_or_else(|e| panic!("{} failed: {}", provider, e));
            assert!(!client.provider_name().is_empty());
        }
    }

    #[test]
    fn test_create_client_is_case_insensitive() {
        let config = mock_config("he", &[("key", "k")], "http://127.0.0.1:1");
        assert_eq!(
            create_client("HE", &config).unwrap().provider_name(),
            "Hurricane Electric"
        );
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = Config::default();
        let err = create_client("route53", &config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("route53"));
    }

    #[test]
    fn test_missing_credential_fails_before_network() {
        let config = mock_config("godaddy", &[("key", "k")], "http://127.0.0.1:1");
        let err = create_client("godaddy", &config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "configuration error: --secret is required for GoDaddy"
        );
    }

    #[test]
    fn test_first_match_not_position_zero() {
        let listing = json!([
            {"id": 1, "name": "www", "type": "A"},
            {"id": 2, "name": "api", "type": "A"},
            {"id": 3, "name": "api", "type": "A"}
        ]);
        let entries = records("test", &listing, "").unwrap();
        let found = first_match(entries, "api", "example.com", |e| field_is(e, "name", "api")).unwrap();
        assert_eq!(id_of("test", found, "id").unwrap(), "2");
    }

    #[test]
    fn test_field_is_ignores_ascii_case() {
        let entry = json!({"name": "www.example.com", "type": "A", "line": "默认", "id": 7});
        assert!(field_is(&entry, "name", "WWW.Example.com"));
        assert!(field_is(&entry, "type", "a"));
        assert!(field_is(&entry, "line", "默认"));
        assert!(!field_is(&entry, "name", "api.example.com"));
        assert!(!field_is(&entry, "id", "7"));
        assert!(!field_is(&entry, "missing", ""));
    }

    #[test]
    fn test_first_match_none_is_record_not_found() {
        let listing = json!({"data": [{"id": "a", "name": "www"}]});
        let entries = records("test", &listing, "/data").unwrap();
        let err = first_match(entries, "mail", "example.com", |e| field_is(e, "name", "mail"))
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[test]
    fn test_records_missing_array() {
        let listing = json!({"data": null});
        assert!(matches!(
            records("test", &listing, "/data"),
            Err(Error::Provider { .. })
        ));
    }

    #[test]
    fn test_id_of_accepts_strings_and_numbers() {
        let entry = json!({"a": "abc", "b": 42, "c": null});
        assert_eq!(id_of("test", &entry, "a").unwrap(), "abc");
        assert_eq!(id_of("test", &entry, "b").unwrap(), "42");
        assert!(id_of("test", &entry, "c").is_err());
    }
}
