use crate::clients::signing::{hmac_sha1_base64, qcloud_string_to_sign};
use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::{Error, Result};
use crate::http::{pair, Client, Method, Params, Request};
use rand::Rng;
use serde_json::Value;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://cns.api.qcloud.com";

const API_PATH: &str = "/v2/index.php";

const DEFAULT_LINE: &str = "默认";

/// Tencent Cloud (QCloud) CNS client
pub struct QcloudClient {
    http: Client,
    server: String,
    secret_id: String,
    secret_key: String,
}

impl QcloudClient {
    pub fn new(config: &Config) -> Result<Self> {
        let secret_id = config.require("secret_id", "QCloud")?;
        let secret_key = config.require("secret_key", "QCloud")?;

        Ok(QcloudClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            secret_id,
            secret_key,
        })
    }

    /// Host and path as they appear in the string to sign.
    fn host_path(&self) -> String {
        let host = self
            .server
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.server);
        format!("{}{}", host, API_PATH)
    }

    fn common_params(&self) -> Params {
        vec![
            pair("Region", "sh"),
            pair("Timestamp", chrono::Utc::now().timestamp()),
            pair("Nonce", rand::thread_rng().gen_range(1..=65536)),
            pair("SecretId", &self.secret_id),
            pair("SignatureMethod", "HmacSHA1"),
        ]
    }

    /// Sign and send `action`; a non-zero `code` is a failure even with HTTP 200.
    fn call(&self, action: &str, extra: Params) -> Result<Value> {
        let mut params = self.common_params();
        params.push(pair("Action", action));
        params.extend(extra);

        let string_to_sign = qcloud_string_to_sign(&self.host_path(), &params);
        let signature = hmac_sha1_base64(self.secret_key.as_bytes(), &string_to_sign)?;

        let request = Request::get(format!("{}{}", self.server, API_PATH))
            .params(params)
            .param("Signature", signature);
        let body = self
            .http
            .execute(request)?
            .signed_json(Method::Get, string_to_sign.len())?;

        if body["code"].as_i64() != Some(0) {
            return Err(Error::provider(
                self.provider_name(),
                format!(
                    "{} failed with code {} ({} byte canonical string): {}",
                    action,
                    body["code"],
                    string_to_sign.len(),
                    body["message"].as_str().unwrap_or("no message")
                ),
            ));
        }
        Ok(body)
    }
}

impl DnsClient for QcloudClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let body = self.call(
            "RecordList",
            vec![
                pair("domain", &target.apex),
                pair("subDomain", &target.record),
            ],
        )?;
        let entries = records(self.provider_name(), &body, "/data/records")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "name", &target.record)
                && field_is(r, "type", "A")
                && field_is(r, "line", DEFAULT_LINE)
        })?;
        let record_id = id_of(self.provider_name(), record, "id")?;
        log::info!("qcloud domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let info = self.call(
            "RecordModify",
            vec![
                pair("domain", &target.apex),
                pair("subDomain", &target.record),
                pair("recordId", &record_id),
                pair("recordType", "A"),
                pair("recordLine", DEFAULT_LINE),
                pair("value", ip),
                pair("ttl", 600),
            ],
        )?;

        log::info!("qcloud domain={} to ip={} info: {}", target.domain, ip, info["data"]);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "QCloud"
    }
}
