//! BER encoding of NMAS credential requests and responses.
//!
//! Request values:
//!
//! | Operation | Value |
//! |---|---|
//! | Set, PolicyCheck | `SEQUENCE { version INTEGER, dn OCTET STRING, password OCTET STRING }` |
//! | Get | `SEQUENCE { version INTEGER, dn OCTET STRING }` |
//! | Change | `SEQUENCE { version INTEGER, dn OCTET STRING, old OCTET STRING, new OCTET STRING }` |
//!
//! Response values are `SEQUENCE { version INTEGER, code INTEGER [, password OCTET STRING] }`.
//!
//! Passwords travel NUL-terminated; the terminator is added on encode and stripped on
//! decode. Distinguished names are sent without one.

use bytes::BytesMut;
use ldap3::asn1::{PL, StructureTag, TagClass, Types, parse_tag, write};

use super::{CredentialOperation, CredentialRequest, CredentialResponse};
use crate::error::{DirectoryError, DirectoryResult};
use crate::session::{ExtendedRequest, ExtendedResponse};

/// Protocol version sent in every request and expected in every response.
pub const PROTOCOL_VERSION: i64 = 1;

/// Encode a credential request as a raw extended request.
pub fn encode(request: &CredentialRequest) -> DirectoryResult<ExtendedRequest> {
    let mut fields = vec![integer(PROTOCOL_VERSION), octets(request.dn().as_bytes())];
    match request {
        CredentialRequest::PolicyCheck { password, .. }
        | CredentialRequest::Set { password, .. } => {
            fields.push(secret(password));
        }
        CredentialRequest::Get { .. } => {}
        CredentialRequest::Change {
            old_password,
            new_password,
            ..
        } => {
            fields.push(secret(old_password));
            fields.push(secret(new_password));
        }
    }

    Ok(ExtendedRequest {
        oid: request.operation().request_oid(),
        value: Some(to_ber(sequence(fields))?),
    })
}

/// Decode the response to an `operation` request.
///
/// A response without a value is a null response and decodes to `None`.
pub fn decode(
    operation: CredentialOperation,
    response: &ExtendedResponse,
) -> DirectoryResult<Option<CredentialResponse>> {
    if let Some(oid) = &response.oid {
        if *oid != operation.response_oid() {
            return Err(DirectoryError::operation(format!(
                "Unexpected response OID {} to {} request",
                oid, operation
            )));
        }
    }

    let Some(value) = &response.value else {
        return Ok(None);
    };

    let mut fields = Fields::parse(value, "response")?;
    let version = fields.integer()?;
    if version != PROTOCOL_VERSION {
        return Err(DirectoryError::operation(format!(
            "Unsupported {} protocol version {}",
            operation, version
        )));
    }
    let code = i32::try_from(fields.integer()?)
        .map_err(|_| DirectoryError::operation("Return code out of range"))?;
    let password = match operation {
        CredentialOperation::Get => fields.optional_secret()?,
        _ => None,
    };

    Ok(Some(CredentialResponse { code, password }))
}

/// Decode a raw request. This is the server side of [`encode`].
pub fn decode_request(request: &ExtendedRequest) -> DirectoryResult<CredentialRequest> {
    let operation = CredentialOperation::from_request_oid(&request.oid).ok_or_else(|| {
        DirectoryError::operation(format!("Unknown extended operation {}", request.oid))
    })?;
    let value = request
        .value
        .as_deref()
        .ok_or_else(|| DirectoryError::operation(format!("Empty {} request", operation)))?;

    let mut fields = Fields::parse(value, "request")?;
    let version = fields.integer()?;
    if version != PROTOCOL_VERSION {
        return Err(DirectoryError::operation(format!(
            "Unsupported {} protocol version {}",
            operation, version
        )));
    }
    let dn = fields.string()?;

    let request = match operation {
        CredentialOperation::PolicyCheck => CredentialRequest::PolicyCheck {
            dn,
            password: fields.secret()?,
        },
        CredentialOperation::Get => CredentialRequest::Get { dn },
        CredentialOperation::Set => CredentialRequest::Set {
            dn,
            password: fields.secret()?,
        },
        CredentialOperation::Change => CredentialRequest::Change {
            dn,
            old_password: fields.secret()?,
            new_password: fields.secret()?,
        },
    };
    Ok(request)
}

/// Encode a response. This is the server side of [`decode`].
pub fn encode_response(
    operation: CredentialOperation,
    response: &CredentialResponse,
) -> DirectoryResult<ExtendedResponse> {
    let mut fields = vec![integer(PROTOCOL_VERSION), integer(i64::from(response.code))];
    if let (CredentialOperation::Get, Some(password)) = (operation, &response.password) {
        fields.push(secret(password));
    }

    Ok(ExtendedResponse {
        oid: Some(operation.response_oid()),
        value: Some(to_ber(sequence(fields))?),
    })
}

fn to_ber(tag: StructureTag) -> DirectoryResult<Vec<u8>> {
    let mut buf = BytesMut::new();
    write::encode_into(&mut buf, tag)
        .map_err(|e| DirectoryError::operation(format!("BER encoding failed: {}", e)))?;
    Ok(buf.to_vec())
}

fn sequence(fields: Vec<StructureTag>) -> StructureTag {
    StructureTag {
        class: TagClass::Universal,
        id: Types::Sequence as u64,
        payload: PL::C(fields),
    }
}

fn integer(value: i64) -> StructureTag {
    StructureTag {
        class: TagClass::Universal,
        id: Types::Integer as u64,
        payload: PL::P(encode_integer(value)),
    }
}

fn octets(value: &[u8]) -> StructureTag {
    StructureTag {
        class: TagClass::Universal,
        id: Types::OctetString as u64,
        payload: PL::P(value.to_vec()),
    }
}

fn secret(value: &str) -> StructureTag {
    let mut bytes = Vec::with_capacity(value.len() + 1);
    bytes.extend_from_slice(value.as_bytes());
    bytes.push(0);
    octets(&bytes)
}

/// Minimal two's-complement big-endian encoding.
pub(crate) fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

pub(crate) fn decode_integer(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 8];
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    Some(i64::from_be_bytes(buf))
}

/// Sequential reader over the fields of a decoded SEQUENCE.
struct Fields {
    inner: std::vec::IntoIter<StructureTag>,
    what: &'static str,
}

impl Fields {
    fn parse(bytes: &[u8], what: &'static str) -> DirectoryResult<Self> {
        let (rest, tag) = match parse_tag(bytes) {
            Ok(parsed) => parsed,
            Err(_) => return Err(malformed(what, "not a BER element")),
        };
        if !rest.is_empty() {
            return Err(malformed(what, "trailing bytes after SEQUENCE"));
        }
        if !matches!(tag.class, TagClass::Universal) || tag.id != Types::Sequence as u64 {
            return Err(malformed(what, "expected a SEQUENCE"));
        }
        match tag.payload {
            PL::C(fields) => Ok(Self {
                inner: fields.into_iter(),
                what,
            }),
            PL::P(_) => Err(malformed(what, "SEQUENCE is not constructed")),
        }
    }

    fn primitive(&mut self, id: Types, name: &str) -> DirectoryResult<Option<Vec<u8>>> {
        let Some(tag) = self.inner.next() else {
            return Ok(None);
        };
        if !matches!(tag.class, TagClass::Universal) || tag.id != id as u64 {
            return Err(malformed(self.what, &format!("expected {}", name)));
        }
        match tag.payload {
            PL::P(bytes) => Ok(Some(bytes)),
            PL::C(_) => Err(malformed(self.what, &format!("{} is constructed", name))),
        }
    }

    fn integer(&mut self) -> DirectoryResult<i64> {
        let bytes = self
            .primitive(Types::Integer, "INTEGER")?
            .ok_or_else(|| malformed(self.what, "missing INTEGER"))?;
        decode_integer(&bytes).ok_or_else(|| malformed(self.what, "INTEGER out of range"))
    }

    fn string(&mut self) -> DirectoryResult<String> {
        let bytes = self
            .primitive(Types::OctetString, "OCTET STRING")?
            .ok_or_else(|| malformed(self.what, "missing OCTET STRING"))?;
        String::from_utf8(bytes).map_err(|_| malformed(self.what, "OCTET STRING is not UTF-8"))
    }

    fn optional_secret(&mut self) -> DirectoryResult<Option<String>> {
        let Some(mut bytes) = self.primitive(Types::OctetString, "OCTET STRING")? else {
            return Ok(None);
        };
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| malformed(self.what, "password is not UTF-8"))
    }

    fn secret(&mut self) -> DirectoryResult<String> {
        self.optional_secret()?
            .ok_or_else(|| malformed(self.what, "missing password"))
    }
}

fn malformed(what: &str, detail: &str) -> DirectoryError {
    DirectoryError::operation(format!("Malformed credential {}: {}", what, detail))
}
