//! Minimal SNMP v1/v2c message codec (BER).
//!
//! Covers what a GET sweep needs: encoding GetRequest PDUs, decoding
//! Response PDUs, and rendering varbind values as strings. Responses can
//! also be encoded so a loopback agent can answer probes in tests.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// Universal tags.
const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

// SNMP application tags (RFC 2578).
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_COUNTER32: u8 = 0x41;
const TAG_GAUGE32: u8 = 0x42;
const TAG_TIMETICKS: u8 = 0x43;
const TAG_OPAQUE: u8 = 0x44;
const TAG_COUNTER64: u8 = 0x46;

// Varbind exceptions (RFC 3416).
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

/// `version` field value for SNMPv2c.
pub const VERSION_2C: i64 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnmpError {
    #[error("message truncated")]
    Truncated,

    #[error("unexpected tag 0x{found:02x}, expected 0x{expected:02x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("unsupported length encoding")]
    BadLength,

    #[error("integer out of range")]
    IntegerRange,

    #[error("malformed object identifier")]
    BadOid,

    #[error("unexpected PDU type 0x{0:02x}")]
    UnexpectedPdu(u8),

    #[error("trailing bytes after message")]
    TrailingBytes,
}

type Result<T> = std::result::Result<T, SnmpError>;

// ── Object identifiers ────────────────────────────────────────────

/// A dotted-numeric object identifier, e.g. `1.3.6.1.2.1.1.5.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(Vec<u32>);

impl Oid {
    fn encode_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let first = self.0[0] * 40 + self.0[1];
        push_base128(&mut out, first);
        for &arc in &self.0[2..] {
            push_base128(&mut out, arc);
        }
        out
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        if body.is_empty() {
            return Err(SnmpError::BadOid);
        }

        let mut subids = Vec::new();
        let mut cur: u32 = 0;
        let mut pending = false;
        for &b in body {
            if cur > (u32::MAX >> 7) {
                return Err(SnmpError::BadOid);
            }
            cur = (cur << 7) | u32::from(b & 0x7f);
            pending = b & 0x80 != 0;
            if !pending {
                subids.push(cur);
                cur = 0;
            }
        }
        if pending {
            return Err(SnmpError::BadOid);
        }

        let first = subids[0];
        let (a, b) = match first {
            0..=39 => (0, first),
            40..=79 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut arcs = vec![a, b];
        arcs.extend_from_slice(&subids[1..]);
        Ok(Self(arcs))
    }
}

impl FromStr for Oid {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self> {
        let arcs = s
            .trim()
            .trim_start_matches('.')
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| SnmpError::BadOid))
            .collect::<Result<Vec<_>>>()?;

        if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(SnmpError::BadOid);
        }
        if arcs[1] > u32::MAX - 80 {
            return Err(SnmpError::BadOid);
        }
        Ok(Self(arcs))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

// ── Values ────────────────────────────────────────────────────────

/// A varbind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectId(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// `noSuchObject`, `noSuchInstance` and `endOfMibView` carry no data.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }

    /// Human-readable rendering used in scan reports.
    ///
    /// Printable octet strings are returned as text; anything else is hex.
    pub fn render(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::OctetString(bytes) => render_octets(bytes),
            Self::Null => String::new(),
            Self::ObjectId(oid) => oid.to_string(),
            Self::IpAddress([a, b, c, d]) => format!("{a}.{b}.{c}.{d}"),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => v.to_string(),
            Self::Opaque(bytes) => hex(bytes),
            Self::Counter64(v) => v.to_string(),
            Self::NoSuchObject => "noSuchObject".to_string(),
            Self::NoSuchInstance => "noSuchInstance".to_string(),
            Self::EndOfMibView => "endOfMibView".to_string(),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Integer(v) => push_tlv(out, TAG_INTEGER, &signed_bytes(*v)),
            Self::OctetString(b) => push_tlv(out, TAG_OCTET_STRING, b),
            Self::Null => push_tlv(out, TAG_NULL, &[]),
            Self::ObjectId(oid) => push_tlv(out, TAG_OID, &oid.encode_body()),
            Self::IpAddress(ip) => push_tlv(out, TAG_IP_ADDRESS, ip),
            Self::Counter32(v) => push_tlv(out, TAG_COUNTER32, &unsigned_bytes(u64::from(*v))),
            Self::Gauge32(v) => push_tlv(out, TAG_GAUGE32, &unsigned_bytes(u64::from(*v))),
            Self::TimeTicks(v) => push_tlv(out, TAG_TIMETICKS, &unsigned_bytes(u64::from(*v))),
            Self::Opaque(b) => push_tlv(out, TAG_OPAQUE, b),
            Self::Counter64(v) => push_tlv(out, TAG_COUNTER64, &unsigned_bytes(*v)),
            Self::NoSuchObject => push_tlv(out, TAG_NO_SUCH_OBJECT, &[]),
            Self::NoSuchInstance => push_tlv(out, TAG_NO_SUCH_INSTANCE, &[]),
            Self::EndOfMibView => push_tlv(out, TAG_END_OF_MIB_VIEW, &[]),
        }
    }

    fn decode(tag: u8, body: &[u8]) -> Result<Self> {
        Ok(match tag {
            TAG_INTEGER => Self::Integer(decode_signed(body)?),
            TAG_OCTET_STRING => Self::OctetString(body.to_vec()),
            TAG_NULL => Self::Null,
            TAG_OID => Self::ObjectId(Oid::decode_body(body)?),
            TAG_IP_ADDRESS => {
                let ip: [u8; 4] = body.try_into().map_err(|_| SnmpError::BadLength)?;
                Self::IpAddress(ip)
            }
            TAG_COUNTER32 => Self::Counter32(decode_u32(body)?),
            TAG_GAUGE32 => Self::Gauge32(decode_u32(body)?),
            TAG_TIMETICKS => Self::TimeTicks(decode_u32(body)?),
            TAG_OPAQUE => Self::Opaque(body.to_vec()),
            TAG_COUNTER64 => Self::Counter64(decode_unsigned(body)?),
            TAG_NO_SUCH_OBJECT => Self::NoSuchObject,
            TAG_NO_SUCH_INSTANCE => Self::NoSuchInstance,
            TAG_END_OF_MIB_VIEW => Self::EndOfMibView,
            // Unknown application types are kept as raw bytes.
            _ => Self::Opaque(body.to_vec()),
        })
    }
}

fn render_octets(bytes: &[u8]) -> String {
    // Some agents NUL-terminate their strings.
    let text = match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => bytes,
    };
    match std::str::from_utf8(text) {
        Ok(s) if s.chars().all(|c| !c.is_control() || matches!(c, '\r' | '\n' | '\t')) => {
            s.to_string()
        }
        _ => hex(bytes),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

// ── PDUs and messages ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    Response,
}

impl PduType {
    fn tag(self) -> u8 {
        match self {
            Self::GetRequest => 0xa0,
            Self::Response => 0xa2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0xa0 => Ok(Self::GetRequest),
            0xa2 => Ok(Self::Response),
            other => Err(SnmpError::UnexpectedPdu(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<(Oid, SnmpValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: i64,
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        let mut varbinds = Vec::new();
        for (oid, value) in &self.pdu.varbinds {
            let mut vb = Vec::new();
            push_tlv(&mut vb, TAG_OID, &oid.encode_body());
            value.encode(&mut vb);
            push_tlv(&mut varbinds, TAG_SEQUENCE, &vb);
        }

        let mut pdu = Vec::new();
        push_tlv(&mut pdu, TAG_INTEGER, &signed_bytes(i64::from(self.pdu.request_id)));
        push_tlv(&mut pdu, TAG_INTEGER, &signed_bytes(self.pdu.error_status));
        push_tlv(&mut pdu, TAG_INTEGER, &signed_bytes(self.pdu.error_index));
        push_tlv(&mut pdu, TAG_SEQUENCE, &varbinds);

        let mut body = Vec::new();
        push_tlv(&mut body, TAG_INTEGER, &signed_bytes(self.version));
        push_tlv(&mut body, TAG_OCTET_STRING, &self.community);
        push_tlv(&mut body, self.pdu.pdu_type.tag(), &pdu);

        let mut out = Vec::with_capacity(body.len() + 4);
        push_tlv(&mut out, TAG_SEQUENCE, &body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut outer = Reader::new(bytes);
        let mut msg = Reader::new(outer.expect(TAG_SEQUENCE)?);
        if !outer.is_empty() {
            return Err(SnmpError::TrailingBytes);
        }

        let version = decode_signed(msg.expect(TAG_INTEGER)?)?;
        let community = msg.expect(TAG_OCTET_STRING)?.to_vec();
        let (pdu_tag, pdu_body) = msg.read_tlv()?;
        let pdu_type = PduType::from_tag(pdu_tag)?;

        let mut pdu = Reader::new(pdu_body);
        let request_id = i32::try_from(decode_signed(pdu.expect(TAG_INTEGER)?)?)
            .map_err(|_| SnmpError::IntegerRange)?;
        let error_status = decode_signed(pdu.expect(TAG_INTEGER)?)?;
        let error_index = decode_signed(pdu.expect(TAG_INTEGER)?)?;

        let mut list = Reader::new(pdu.expect(TAG_SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut vb = Reader::new(list.expect(TAG_SEQUENCE)?);
            let oid = Oid::decode_body(vb.expect(TAG_OID)?)?;
            let (tag, body) = vb.read_tlv()?;
            varbinds.push((oid, SnmpValue::decode(tag, body)?));
        }

        Ok(Self {
            version,
            community,
            pdu: Pdu {
                pdu_type,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        })
    }
}

/// Encode a v2c GetRequest for the given OIDs.
pub fn encode_get_request(community: &str, request_id: i32, oids: &[Oid]) -> Vec<u8> {
    Message {
        version: VERSION_2C,
        community: community.as_bytes().to_vec(),
        pdu: Pdu {
            pdu_type: PduType::GetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|o| (o.clone(), SnmpValue::Null)).collect(),
        },
    }
    .encode()
}

// ── BER primitives ────────────────────────────────────────────────

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self.buf.get(self.pos).ok_or(SnmpError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_len(&mut self) -> Result<usize> {
        let first = self.byte()?;
        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }
        let n = usize::from(first & 0x7f);
        // 0x80 is the indefinite form, which SNMP forbids.
        if n == 0 || n > 4 {
            return Err(SnmpError::BadLength);
        }
        let mut len = 0usize;
        for _ in 0..n {
            len = (len << 8) | usize::from(self.byte()?);
        }
        Ok(len)
    }

    fn read_tlv(&mut self) -> Result<(u8, &'a [u8])> {
        let tag = self.byte()?;
        let len = self.read_len()?;
        let end = self.pos.checked_add(len).ok_or(SnmpError::Truncated)?;
        let body = self.buf.get(self.pos..end).ok_or(SnmpError::Truncated)?;
        self.pos = end;
        Ok((tag, body))
    }

    fn expect(&mut self, expected: u8) -> Result<&'a [u8]> {
        let (found, body) = self.read_tlv()?;
        if found != expected {
            return Err(SnmpError::UnexpectedTag { expected, found });
        }
        Ok(body)
    }
}

fn push_len(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn push_tlv(out: &mut Vec<u8>, tag: u8, body: &[u8]) {
    out.push(tag);
    push_len(out, body.len());
    out.extend_from_slice(body);
}

fn push_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | cont);
    }
}

/// Minimal two's-complement encoding.
fn signed_bytes(v: i64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let (b, next) = (bytes[start], bytes[start + 1]);
        if (b == 0x00 && next & 0x80 == 0) || (b == 0xff && next & 0x80 != 0) {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

fn unsigned_bytes(v: u64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|&&b| b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut out = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn decode_signed(body: &[u8]) -> Result<i64> {
    if body.is_empty() || body.len() > 8 {
        return Err(SnmpError::IntegerRange);
    }
    let mut v: i64 = if body[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in body {
        v = (v << 8) | i64::from(b);
    }
    Ok(v)
}

fn decode_unsigned(body: &[u8]) -> Result<u64> {
    let digits = match body {
        [] => return Err(SnmpError::IntegerRange),
        [0, rest @ ..] if !rest.is_empty() => rest,
        _ => body,
    };
    if digits.len() > 8 {
        return Err(SnmpError::IntegerRange);
    }
    Ok(digits.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn decode_u32(body: &[u8]) -> Result<u32> {
    u32::try_from(decode_unsigned(body)?).map_err(|_| SnmpError::IntegerRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    #[test]
    fn get_request_matches_reference_bytes() {
        // sysDescr.0, community "public", request-id 1
        let bytes = encode_get_request("public", 1, &[oid("1.3.6.1.2.1.1.1.0")]);
        let expected: &[u8] = &[
            0x30, 0x26, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xa0,
            0x19, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30, 0x0c,
            0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn decodes_response_with_mixed_types() {
        let msg = Message {
            version: VERSION_2C,
            community: b"public".to_vec(),
            pdu: Pdu {
                pdu_type: PduType::Response,
                request_id: 0x1234_5678,
                error_status: 0,
                error_index: 0,
                varbinds: vec![
                    (oid("1.3.6.1.2.1.1.5.0"), SnmpValue::OctetString(b"sw1".to_vec())),
                    (oid("1.3.6.1.2.1.1.3.0"), SnmpValue::TimeTicks(4_000_000_000)),
                    (oid("1.3.6.1.2.1.1.2.0"), SnmpValue::ObjectId(oid("1.3.6.1.4.1.9.1.1"))),
                    (oid("1.3.6.1.2.1.4.20.1.1.10.0.0.1"), SnmpValue::IpAddress([10, 0, 0, 1])),
                    (oid("1.3.6.1.2.1.1.7.0"), SnmpValue::Integer(-72)),
                    (oid("1.3.6.1.2.1.1.9.0"), SnmpValue::NoSuchInstance),
                ],
            },
        };

        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);

        let rendered: Vec<String> = decoded.pdu.varbinds.iter().map(|(_, v)| v.render()).collect();
        assert_eq!(
            rendered,
            vec!["sw1", "4000000000", "1.3.6.1.4.1.9.1.1", "10.0.0.1", "-72", "noSuchInstance"]
        );
    }

    #[test]
    fn long_form_lengths() {
        let descr = "x".repeat(300);
        let msg = Message {
            version: VERSION_2C,
            community: b"c".to_vec(),
            pdu: Pdu {
                pdu_type: PduType::Response,
                request_id: 7,
                error_status: 0,
                error_index: 0,
                varbinds: vec![(oid("1.3.6.1.2.1.1.1.0"), SnmpValue::OctetString(descr.clone().into_bytes()))],
            },
        };
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.pdu.varbinds[0].1.render(), descr);
    }

    #[test]
    fn oid_parsing() {
        assert_eq!(oid(".1.3.6.1").to_string(), "1.3.6.1");
        assert_eq!(oid("2.999.3").encode_body(), vec![0x88, 0x37, 0x03]);
        assert!("1".parse::<Oid>().is_err());
        assert!("1.40".parse::<Oid>().is_err());
        assert!("3.1".parse::<Oid>().is_err());
        assert!("1.3.six".parse::<Oid>().is_err());
        assert!("".parse::<Oid>().is_err());
    }

    #[test]
    fn only_get_and_response_pdus_decode() {
        let mut bytes = encode_get_request("public", 7, &[oid("1.3.6.1.2.1.1.5.0")]);
        assert_eq!(Message::decode(&bytes).unwrap().pdu.pdu_type, PduType::GetRequest);

        let pdu_at = bytes.iter().position(|&b| b == 0xa0).unwrap();
        bytes[pdu_at] = 0xa1;
        assert_eq!(Message::decode(&bytes), Err(SnmpError::UnexpectedPdu(0xa1)));
    }

    #[test]
    fn large_arcs_use_multiple_bytes() {
        let o = oid("1.3.6.1.4.1.311.21.20");
        assert_eq!(Oid::decode_body(&o.encode_body()).unwrap(), o);
        assert_eq!(&o.encode_body()[5..7], &[0x82, 0x37]);
    }

    #[test]
    fn integer_encoding_is_minimal() {
        assert_eq!(signed_bytes(0), vec![0x00]);
        assert_eq!(signed_bytes(127), vec![0x7f]);
        assert_eq!(signed_bytes(128), vec![0x00, 0x80]);
        assert_eq!(signed_bytes(-1), vec![0xff]);
        assert_eq!(signed_bytes(-129), vec![0xff, 0x7f]);
        assert_eq!(unsigned_bytes(0xffff_ffff), vec![0x00, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decode_signed(&[0xff, 0x7f]).unwrap(), -129);
        assert_eq!(decode_unsigned(&[0x00, 0xff, 0xff, 0xff, 0xff]).unwrap(), 0xffff_ffff);
    }

    #[test]
    fn rejects_malformed_input() {
        let good = encode_get_request("public", 42, &[oid("1.3.6.1.2.1.1.5.0")]);

        assert_eq!(Message::decode(&[]), Err(SnmpError::Truncated));
        assert_eq!(Message::decode(&good[..good.len() - 3]), Err(SnmpError::Truncated));
        assert!(matches!(
            Message::decode(&[0x02, 0x01, 0x00]),
            Err(SnmpError::UnexpectedTag { .. })
        ));
        assert_eq!(Message::decode(&[0x30, 0x80, 0x00, 0x00]), Err(SnmpError::BadLength));

        let mut trailing = good.clone();
        trailing.push(0);
        assert_eq!(Message::decode(&trailing), Err(SnmpError::TrailingBytes));
    }

    #[test]
    fn binary_octets_render_as_hex() {
        assert_eq!(SnmpValue::OctetString(vec![0x00, 0x1b, 0x21]).render(), "0x001b21");
        assert_eq!(SnmpValue::OctetString(b"Linux 6.1\r\n".to_vec()).render(), "Linux 6.1\r\n");
        assert_eq!(SnmpValue::OctetString(b"edge-rtr\0".to_vec()).render(), "edge-rtr");
    }
}
