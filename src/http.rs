/// Authenticated HTTP request layer shared by every provider
///
/// Requests are plain values built with a small builder; the [`Client`] turns
/// them into wire form (sorted form-encoded parameters, default headers,
/// timeout) and sends them with `minreq`. Error statuses are returned as
/// ordinary responses so callers can read the vendor's failure payload.
use crate::error::{redact, Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Timeout applied when a request does not set its own (seconds)
pub const DEFAULT_TIMEOUT: u64 = 8;

/// Ordered list of query or form parameters
pub type Params = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

impl From<Method> for minreq::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => minreq::Method::Get,
            Method::Post => minreq::Method::Post,
            Method::Put => minreq::Method::Put,
            Method::Patch => minreq::Method::Patch,
        }
    }
}

/// Build a parameter pair from anything printable.
pub fn pair(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// Percent-encode one component the way HTML forms do: unreserved characters
/// stay, space becomes `+`, everything else is `%XX` over its UTF-8 bytes.
pub fn form_encode(input: &str) -> String {
    urlencoding::encode(input).replace("%20", "+")
}

/// Canonical `k=v&k=v` string: pairs sorted by key, then value.
///
/// Providers that sign their query string depend on this ordering being the
/// same on both ends.
pub fn encode_params(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    params: Params,
    json: Option<Value>,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    timeout: Option<u64>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            params: Vec::new(),
            json: None,
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push(pair(key, value));
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

/// A request in the exact form it is sent on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: i32,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Credentials of the client that sent the request, masked in errors
    pub secrets: Vec<String>,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body excerpt safe to put in an error message.
    pub fn excerpt(&self) -> String {
        self.redact(&self.text())
    }

    /// Excerpt of any text taken from this response, credentials masked.
    pub fn redact(&self, text: &str) -> String {
        redact(text, &self.secrets)
    }

    fn http_error(&self) -> Error {
        Error::Http {
            status: self.status,
            body: self.excerpt(),
        }
    }

    /// Accept any 2xx status.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.http_error())
        }
    }

    /// Parse the body as JSON when the status is 200.
    pub fn json(&self) -> Result<Value> {
        if self.status != 200 {
            return Err(self.http_error());
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Like [`Response::json`], but a 4xx from a signed request is reported
    /// with the method and the length of the string that was signed.
    pub fn signed_json(&self, method: Method, canonical_len: usize) -> Result<Value> {
        if (400..500).contains(&self.status) {
            return Err(Error::Rejected {
                status: self.status,
                method: method.as_str().to_string(),
                canonical_len,
                body: self.excerpt(),
            });
        }
        self.json()
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    user_agent: String,
    timeout: u64,
    secrets: Vec<String>,
}

impl Default for Client {
    fn default() -> Self {
        Client::new(crate::USER_AGENT, DEFAULT_TIMEOUT)
    }
}

impl Client {
    pub fn new(user_agent: impl Into<String>, timeout: u64) -> Self {
        Client {
            user_agent: user_agent.into(),
            timeout,
            secrets: Vec::new(),
        }
    }

    /// Values to mask wherever a response body ends up in an error.
    pub fn with_secrets(mut self, mut secrets: Vec<String>) -> Self {
        secrets.retain(|s| !s.is_empty());
        // Longest first so a secret containing another is masked whole
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        self.secrets = secrets;
        self
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Client::new(config.user_agent(), config.request_timeout()).with_secrets(config.secrets())
    }

    /// Resolve body precedence, query encoding and default headers.
    ///
    /// For non-GET methods exactly one body applies: JSON, then form
    /// parameters, then a raw body. GET requests carry their parameters in
    /// the query string and may not have a JSON body.
    pub fn prepare(&self, request: &Request) -> Result<Prepared> {
        let mut url = request.url.clone();
        let mut headers = request.headers.clone();
        let mut body = None;

        if !request.params.is_empty() {
            let encoded = encode_params(&request.params);
            if request.method == Method::Get {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encoded);
            } else {
                if !request.has_header("Content-Type") {
                    headers.push((
                        "Content-Type".to_string(),
                        "application/x-www-form-urlencoded".to_string(),
                    ));
                }
                body = Some(encoded.into_bytes());
            }
        } else if request.method != Method::Get {
            body = request.body.clone();
        }

        if let Some(json) = &request.json {
            if request.method == Method::Get {
                return Err(Error::config("a GET request cannot carry a JSON body"));
            }
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case("Content-Type"));
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            body = Some(serde_json::to_vec(json)?);
        }

        if !request.has_header("User-Agent") {
            headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        }

        Ok(Prepared {
            method: request.method,
            url,
            headers,
            body,
            timeout: request.timeout.unwrap_or(self.timeout),
        })
    }

    pub fn execute(&self, request: Request) -> Result<Response> {
        let prepared = self.prepare(&request)?;

        // Query strings can hold credentials, only the path is logged.
        let shown = prepared.url.split('?').next().unwrap_or_default();
        log::info!("{} \"{}\"", prepared.method.as_str(), shown);

        let mut outgoing = minreq::Request::new(prepared.method.into(), prepared.url.as_str())
            .with_timeout(prepared.timeout);
        for (name, value) in &prepared.headers {
            outgoing = outgoing.with_header(name.as_str(), value.as_str());
        }
        if let Some(body) = prepared.body {
            outgoing = outgoing.with_body(body);
        }

        let response = outgoing.send()?;
        let status = response.status_code;
        let headers = response.headers.clone();
        let body = response.into_bytes();

        log::debug!(
            "Response status: {}, {} bytes of {}",
            status,
            body.len(),
            headers.get("content-type").map(String::as_str).unwrap_or("unknown type")
        );

        Ok(Response {
            status,
            headers,
            body,
            secrets: self.secrets.clone(),
        })
    }
}
