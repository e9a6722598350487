//! Login message construction, validation and the EIP-4361 text codec
//!
//! A [`Message`] only exists after [`build_message`] accepted its
//! parameters. Its canonical text is derived once at that point and is the
//! exact byte string a wallet signs and the verifier checks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::address::{parse_address, Address};
use crate::crypto::nonce::is_valid_nonce;
use crate::error::{AuthError, MessageError, Result};

/// Literal every login statement has to contain
pub const FARCASTER_STATEMENT: &str = "Log in With Farcaster";

/// Chain the identity registry lives on (OP Mainnet)
pub const REQUIRED_CHAIN_ID: u64 = 10;

/// Resource URI prefix carrying the claimed fid
pub const FID_RESOURCE_PREFIX: &str = "farcaster://fids/";

const SIWE_VERSION: &str = "1";
const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// Caller-supplied fields of a login message
///
/// Field names follow the camelCase convention of SIWE JSON payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    pub domain: String,
    pub statement: String,
    pub address: String,
    pub uri: String,
    pub version: String,
    pub nonce: String,
    pub issued_at: String,
    pub chain_id: u64,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A validated login message
///
/// Fields are private; a `Message` cannot be altered after
/// [`build_message`] produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    params: LoginParams,
    address: Address,
    fid: u64,
    text: String,
    #[serde(skip)]
    expiration_time: Option<DateTime<Utc>>,
    #[serde(skip)]
    not_before: Option<DateTime<Utc>>,
}

impl Message {
    pub fn params(&self) -> &LoginParams {
        &self.params
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Fid embedded when the message was built
    pub fn fid(&self) -> u64 {
        self.fid
    }

    pub fn chain_id(&self) -> u64 {
        self.params.chain_id
    }

    pub fn resources(&self) -> &[String] {
        &self.params.resources
    }

    /// Canonical EIP-4361 text, the exact input to `personal_sign`
    pub fn prepare(&self) -> &str {
        &self.text
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|exp| exp <= now)
    }

    pub fn is_not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|nbf| nbf > now)
    }

    /// Stand-in for a message that reached the verifier by another path
    #[cfg(test)]
    pub(crate) fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.params.resources = resources;
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Message {
    type Err = AuthError;

    /// Parse EIP-4361 text and validate it exactly like [`build_message`]
    fn from_str(s: &str) -> Result<Self> {
        build_message(parse_text(s)?)
    }
}

/// Build and validate a login message
///
/// Checks run in a fixed order so the reported failure is deterministic:
/// address, statement, chain id, fid resource, then the remaining SIWE
/// fields.
///
/// # Errors
/// Every failure is a `ValidationFailure`:
/// - `"invalid address"`
/// - `"Invalid statement"`
/// - `"Chain ID must be 10"`
/// - `"No fid resource found"` / `"Multiple fid resources"`
/// - `"Invalid <field>: <reason>"` for domain, nonce, version and timestamps
///
/// # Example
/// ```rust
/// use farcaster_siwe::{build_message, LoginParams};
///
/// let params = LoginParams {
///     domain: "example.com".to_string(),
///     statement: "Log in With Farcaster".to_string(),
///     address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
///     uri: "https://example.com/login".to_string(),
///     version: "1".to_string(),
///     nonce: "abcdefgh1234".to_string(),
///     issued_at: "2023-10-01T00:00:00.000Z".to_string(),
///     chain_id: 10,
///     resources: vec!["farcaster://fids/1234".to_string()],
///     expiration_time: None,
///     not_before: None,
///     request_id: None,
/// };
/// let message = build_message(params).unwrap();
/// assert_eq!(message.fid(), 1234);
/// ```
pub fn build_message(params: LoginParams) -> Result<Message> {
    Ok(validate(params)?)
}

/// Re-derive the fid from a message's resources
///
/// Uses the same matching rule as [`build_message`] and ignores whatever
/// fid was recorded at build time.
pub fn parse_fid(message: &Message) -> Result<u64> {
    message
        .resources()
        .iter()
        .find_map(|resource| fid_from_resource(resource))
        .ok_or_else(|| MessageError::MissingFidResource.into())
}

/// Match a single resource URI against `farcaster://fids/<digits>`
///
/// Digits must be non-empty, have no leading zero and fit in a `u64`.
/// Anything else, including trailing characters, is not a fid resource.
pub fn fid_from_resource(resource: &str) -> Option<u64> {
    let digits = resource.strip_prefix(FID_RESOURCE_PREFIX)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

fn validate(params: LoginParams) -> std::result::Result<Message, MessageError> {
    let address = parse_address(&params.address)?;

    if !params.statement.contains(FARCASTER_STATEMENT) {
        return Err(MessageError::InvalidStatement);
    }

    if params.chain_id != REQUIRED_CHAIN_ID {
        return Err(MessageError::InvalidChainId(REQUIRED_CHAIN_ID));
    }

    let mut fids = params
        .resources
        .iter()
        .filter_map(|resource| fid_from_resource(resource));
    let fid = fids.next().ok_or(MessageError::MissingFidResource)?;
    if fids.next().is_some() {
        return Err(MessageError::MultipleFidResources);
    }

    if params.domain.trim().is_empty() || params.domain.chars().any(char::is_whitespace) {
        return Err(MessageError::InvalidField {
            field: "domain",
            reason: format!("{:?}", params.domain),
        });
    }
    let multi_line = [
        ("statement", Some(params.statement.as_str())),
        ("uri", Some(params.uri.as_str())),
        ("request id", params.request_id.as_deref()),
    ]
    .into_iter()
    .chain(params.resources.iter().map(|r| ("resources", Some(r.as_str()))))
    .find(|(_, value)| value.is_some_and(|v| v.contains(['\n', '\r'])));
    if let Some((field, _)) = multi_line {
        return Err(MessageError::InvalidField {
            field,
            reason: "must be a single line".to_string(),
        });
    }
    if !is_valid_nonce(&params.nonce) {
        return Err(MessageError::InvalidField {
            field: "nonce",
            reason: "expected at least 8 alphanumeric characters".to_string(),
        });
    }
    if params.version != SIWE_VERSION {
        return Err(MessageError::InvalidField {
            field: "version",
            reason: format!("expected {SIWE_VERSION}, got {}", params.version),
        });
    }
    parse_timestamp("issued at", &params.issued_at)?;
    let expiration_time = params
        .expiration_time
        .as_deref()
        .map(|raw| parse_timestamp("expiration time", raw))
        .transpose()?;
    let not_before = params
        .not_before
        .as_deref()
        .map(|raw| parse_timestamp("not before", raw))
        .transpose()?;

    let text = render(&params, &address);

    Ok(Message {
        params,
        address,
        fid,
        text,
        expiration_time,
        not_before,
    })
}

fn parse_timestamp(
    field: &'static str,
    raw: &str,
) -> std::result::Result<DateTime<Utc>, MessageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MessageError::InvalidField {
            field,
            reason: e.to_string(),
        })
}

fn render(params: &LoginParams, address: &Address) -> String {
    let mut text = format!(
        "{domain}{HEADER_SUFFIX}\n\
         {address}\n\
         \n\
         {statement}\n\
         \n\
         URI: {uri}\n\
         Version: {version}\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued_at}",
        domain = params.domain,
        address = address.to_checksum(None),
        statement = params.statement,
        uri = params.uri,
        version = params.version,
        chain_id = params.chain_id,
        nonce = params.nonce,
        issued_at = params.issued_at,
    );

    if let Some(exp) = &params.expiration_time {
        text.push_str(&format!("\nExpiration Time: {exp}"));
    }
    if let Some(nbf) = &params.not_before {
        text.push_str(&format!("\nNot Before: {nbf}"));
    }
    if let Some(request_id) = &params.request_id {
        text.push_str(&format!("\nRequest ID: {request_id}"));
    }
    if !params.resources.is_empty() {
        text.push_str("\nResources:");
        for resource in &params.resources {
            text.push_str(&format!("\n- {resource}"));
        }
    }

    text
}

fn parse_text(text: &str) -> std::result::Result<LoginParams, MessageError> {
    let mut lines = text.lines();

    let domain = lines
        .next()
        .and_then(|line| line.strip_suffix(HEADER_SUFFIX))
        .ok_or(MessageError::InvalidHeader)?
        .to_string();
    let address = lines
        .next()
        .ok_or(MessageError::MissingField("address"))?
        .to_string();

    if lines.next() != Some("") {
        return Err(MessageError::MissingField("statement"));
    }
    let statement = lines
        .next()
        .ok_or(MessageError::MissingField("statement"))?
        .to_string();
    if lines.next() != Some("") {
        return Err(MessageError::MissingField("URI"));
    }

    let mut uri = None;
    let mut version = None;
    let mut chain_id = None;
    let mut nonce = None;
    let mut issued_at = None;
    let mut expiration_time = None;
    let mut not_before = None;
    let mut request_id = None;
    let mut resources = Vec::new();
    let mut in_resources = false;

    for line in lines {
        if in_resources {
            let resource = line.strip_prefix("- ").ok_or(MessageError::InvalidField {
                field: "resources",
                reason: format!("unexpected line {line:?}"),
            })?;
            resources.push(resource.to_string());
        } else if let Some(value) = line.strip_prefix("URI: ") {
            uri = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Version: ") {
            version = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Chain ID: ") {
            let parsed = value.parse().map_err(|_| MessageError::InvalidField {
                field: "chain id",
                reason: format!("{value:?} is not an integer"),
            })?;
            chain_id = Some(parsed);
        } else if let Some(value) = line.strip_prefix("Nonce: ") {
            nonce = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Issued At: ") {
            issued_at = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Expiration Time: ") {
            expiration_time = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Not Before: ") {
            not_before = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Request ID: ") {
            request_id = Some(value.to_string());
        } else if line == "Resources:" {
            in_resources = true;
        } else {
            return Err(MessageError::InvalidField {
                field: "message",
                reason: format!("unexpected line {line:?}"),
            });
        }
    }

    Ok(LoginParams {
        domain,
        statement,
        address,
        uri: uri.ok_or(MessageError::MissingField("URI"))?,
        version: version.ok_or(MessageError::MissingField("version"))?,
        nonce: nonce.ok_or(MessageError::MissingField("nonce"))?,
        issued_at: issued_at.ok_or(MessageError::MissingField("issued at"))?,
        chain_id: chain_id.ok_or(MessageError::MissingField("chain id"))?,
        resources,
        expiration_time,
        not_before,
        request_id,
    })
}
