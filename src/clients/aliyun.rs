use crate::clients::signing::{aliyun_signature, aliyun_string_to_sign, uuid_nonce};
use crate::clients::{field_is, first_match, id_of, records, DnsClient};
use crate::config::Config;
use crate::domain::Target;
use crate::error::Result;
use crate::http::{pair, Client, Params, Request};
use serde_json::Value;
use std::net::Ipv4Addr;

const DEFAULT_SERVER: &str = "https://alidns.aliyuncs.com";

const API_VERSION: &str = "2015-01-09";

/// Alibaba Cloud DNS client
///
/// Every call is a GET whose query string carries an HMAC-SHA1 `Signature`
/// over the sorted, form-encoded parameters.
pub struct AliyunClient {
    http: Client,
    server: String,
    access_key_id: String,
    access_secret: String,
}

impl AliyunClient {
    pub fn new(config: &Config) -> Result<Self> {
        let access_key_id = config.require("key", "Aliyun")?;
        let access_secret = config.require("secret", "Aliyun")?;

        Ok(AliyunClient {
            http: Client::from_config(config),
            server: config.server_or(DEFAULT_SERVER),
            access_key_id,
            access_secret,
        })
    }

    fn common_params(&self) -> Params {
        vec![
            pair("Format", "json"),
            pair("Version", API_VERSION),
            pair("AccessKeyId", &self.access_key_id),
            pair(
                "Timestamp",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            ),
            pair("SignatureMethod", "HMAC-SHA1"),
            pair("SignatureNonce", uuid_nonce()),
            pair("SignatureVersion", "1.0"),
        ]
    }

    /// Sign `action` with its parameters and send it.
    fn call(&self, action: &str, extra: Params) -> Result<Value> {
        let mut params = self.common_params();
        params.push(pair("Action", action));
        params.extend(extra);

        let string_to_sign = aliyun_string_to_sign(&params);
        let signature = aliyun_signature(&self.access_secret, &string_to_sign)?;
        log::debug!("Signed {} ({} byte canonical string)", action, string_to_sign.len());

        let request = Request::get(format!("{}/", self.server))
            .params(params)
            .param("Signature", signature);
        let method = request.method();
        self.http
            .execute(request)?
            .signed_json(method, string_to_sign.len())
    }
}

impl DnsClient for AliyunClient {
    fn update_record(&self, target: &Target, ip: Ipv4Addr) -> Result<()> {
        let body = self.call(
            "DescribeDomainRecords",
            vec![pair("DomainName", &target.apex)],
        )?;
        let entries = records(self.provider_name(), &body, "/DomainRecords/Record")?;
        let record = first_match(entries, &target.record, &target.apex, |r| {
            field_is(r, "RR", &target.record) && field_is(r, "Type", "A")
        })?;
        let record_id = id_of(self.provider_name(), record, "RecordId")?;
        log::info!("aliyun domain={} to ip={} record_id: {}", target.domain, ip, record_id);

        let info = self.call(
            "UpdateDomainRecord",
            vec![
                pair("RecordId", &record_id),
                pair("RR", &target.record),
                pair("Type", "A"),
                pair("Value", ip),
                pair("TTL", 600),
            ],
        )?;

        log::info!("aliyun domain={} to ip={} info: {}", target.domain, ip, info);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "Aliyun"
    }
}
