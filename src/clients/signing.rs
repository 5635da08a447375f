//! Request signing schemes used by Aliyun, QCloud and CloudXNS.
//!
//! Each signature covers exactly the parameter set sent on the wire, so the
//! canonical strings are built with [`encode_params`], the same encoder the
//! HTTP layer uses for the outgoing query.

use crate::error::{Error, Result};
use crate::http::{encode_params, form_encode};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// `base64(HMAC-SHA1(key, message))`
pub fn hmac_sha1_base64(key: &[u8], message: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| Error::config(format!("unusable signing key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Aliyun string-to-sign: `GET&%2F&` followed by the form-encoded canonical query.
pub fn aliyun_string_to_sign(params: &[(String, String)]) -> String {
    format!("GET&%2F&{}", form_encode(&encode_params(params)))
}

/// Aliyun signature; the key is the access secret followed by `&`.
pub fn aliyun_signature(secret: &str, string_to_sign: &str) -> Result<String> {
    hmac_sha1_base64(format!("{}&", secret).as_bytes(), string_to_sign)
}

/// QCloud string-to-sign: `GET` + host and path + `?` + canonical query.
pub fn qcloud_string_to_sign(host_path: &str, params: &[(String, String)]) -> String {
    format!("GET{}?{}", host_path, encode_params(params))
}

/// CloudXNS `API-HMAC` header: hex MD5 over key, URL, body, date and secret.
pub fn cloudxns_hmac(key: &str, url: &str, body: &str, date: &str, secret: &str) -> String {
    let mut ctx = md5::Context::new();
    ctx.consume(key.as_bytes());
    ctx.consume(url.as_bytes());
    ctx.consume(body.as_bytes());
    ctx.consume(date.as_bytes());
    ctx.consume(secret.as_bytes());
    hex::encode(ctx.compute().0)
}

/// Random nonce in UUID v4 layout.
pub fn uuid_nonce() -> String {
    let mut bytes: [u8; 16] = rand::thread_rng().gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
