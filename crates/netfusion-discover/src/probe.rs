//! Single-host SNMP GET probe.
//!
//! Each probe owns a transient UDP socket connected to the target, sends one
//! GetRequest and waits for the matching Response until its deadline. Every
//! failure mode is reported as a [`ProbeOutcome`] variant, never as an error.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

use crate::snmp::{self, Message, Oid, PduType};

/// Largest datagram we accept back from an agent.
const MAX_DATAGRAM: usize = 65_507;

/// Settings shared by every probe of one scan.
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    pub port: u16,
    pub community: String,
    pub oids: Vec<Oid>,
    pub timeout: Duration,
}

/// What happened when one host was probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The agent answered; OID → rendered value. Exception varbinds are omitted.
    Responded(BTreeMap<String, String>),
    /// No matching reply before the deadline.
    Timeout,
    /// The socket could not be opened, or send/receive failed (e.g. ICMP unreachable).
    Transport(String),
    /// A reply arrived but could not be decoded.
    Malformed(String),
    /// The agent answered with a non-zero error-status.
    AgentError(i64),
}

impl ProbeOutcome {
    pub fn responded(&self) -> bool {
        matches!(self, Self::Responded(_))
    }
}

/// Probe one host. Never fails; see [`ProbeOutcome`].
pub async fn probe_host(ip: IpAddr, spec: &ProbeSpec) -> ProbeOutcome {
    let deadline = Instant::now() + spec.timeout;

    let bind: SocketAddr = match ip {
        IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = match UdpSocket::bind(bind).await {
        Ok(s) => s,
        Err(e) => return ProbeOutcome::Transport(e.to_string()),
    };
    if let Err(e) = socket.connect((ip, spec.port)).await {
        return ProbeOutcome::Transport(e.to_string());
    }

    let request_id = (rand::random::<u32>() >> 1) as i32;
    let request = snmp::encode_get_request(&spec.community, request_id, &spec.oids);
    if let Err(e) = socket.send(&request).await {
        return ProbeOutcome::Transport(e.to_string());
    }

    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let n = match timeout_at(deadline, socket.recv(&mut buf)).await {
            Err(_) => return ProbeOutcome::Timeout,
            Ok(Err(e)) => return ProbeOutcome::Transport(e.to_string()),
            Ok(Ok(n)) => n,
        };

        let message = match Message::decode(&buf[..n]) {
            Ok(m) => m,
            Err(e) => return ProbeOutcome::Malformed(e.to_string()),
        };

        // Late replies to an earlier request on a reused port are skipped.
        if message.pdu.pdu_type != PduType::Response || message.pdu.request_id != request_id {
            tracing::debug!(
                %ip,
                request_id = message.pdu.request_id,
                "Ignoring unrelated SNMP datagram"
            );
            continue;
        }

        if message.pdu.error_status != 0 {
            return ProbeOutcome::AgentError(message.pdu.error_status);
        }

        let values = message
            .pdu
            .varbinds
            .into_iter()
            .filter(|(_, value)| !value.is_exception())
            .map(|(oid, value)| (oid.to_string(), value.render()))
            .collect();
        return ProbeOutcome::Responded(values);
    }
}
