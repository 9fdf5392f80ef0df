//! Notification decoder
//!
//! Turns one received datagram into an [`EventBatch`]. Pure and total:
//! malformed input ends decoding early instead of failing.

use std::net::IpAddr;

use ifwatch_core::{ChangeEvent, EventBatch};
use netlink_packet_core::NetlinkBuffer;
use netlink_packet_route::address::AddressMessageBuffer;
use netlink_packet_route::link::{LinkFlags, LinkMessageBuffer};

use crate::wire::{AF_INET, AF_INET6, IFA_LABEL, IFA_LOCAL, IFLA_IFNAME, MessageKind, align};

/// Decode every complete message in `buf`, in order
///
/// Decoding stops at the first header whose declared length is zero or
/// shorter than a header, or which runs past the end of the buffer. Events
/// from the messages before it are kept. Message types other than address
/// and link notifications are skipped.
pub fn decode(buf: &[u8]) -> EventBatch {
    let mut batch = EventBatch::new();
    let mut offset = 0usize;

    while let Some(rest) = buf.get(offset..).filter(|rest| !rest.is_empty()) {
        // Rejects short buffers, short length fields, and overruns
        let Ok(message) = NetlinkBuffer::new_checked(rest) else {
            break;
        };

        let kind = MessageKind::from(message.message_type());
        if let Some(event) = decode_message(kind, message.payload()) {
            batch.push(event);
        }

        offset = offset.saturating_add(align(message.length() as usize));
    }

    batch
}

/// Decode one message body by type; `None` for ignored or truncated messages
pub fn decode_message(kind: MessageKind, body: &[u8]) -> Option<ChangeEvent> {
    match kind {
        MessageKind::NewAddress => {
            let (name, address) = parse_address_message(body)?;
            Some(ChangeEvent::AddressAdded { name, address })
        }
        MessageKind::DelAddress => {
            let (name, address) = parse_address_message(body)?;
            Some(ChangeEvent::AddressRemoved { name, address })
        }
        MessageKind::NewLink => {
            let (name, up) = parse_link_message(body)?;
            if up {
                Some(ChangeEvent::LinkUp { name })
            } else {
                Some(ChangeEvent::LinkDown { name })
            }
        }
        MessageKind::DelLink => {
            let (name, _) = parse_link_message(body)?;
            Some(ChangeEvent::LinkRemoved { name })
        }
        MessageKind::Other(_) => None,
    }
}

/// Interface name and local address of an `ifaddrmsg` body
///
/// Attributes are read up to the first malformed one. The address is `None`
/// when no `IFA_LOCAL` attribute is present or its payload does not match
/// the family.
fn parse_address_message(body: &[u8]) -> Option<(String, Option<IpAddr>)> {
    let message = AddressMessageBuffer::new_checked(body).ok()?;
    let family = message.family();
    let mut name = String::new();
    let mut address = None;

    for attr in message.attributes().map_while(Result::ok) {
        match attr.kind() {
            IFA_LABEL => name = parse_name(attr.value()),
            IFA_LOCAL => address = parse_address(family, attr.value()),
            _ => {}
        }
    }

    Some((name, address))
}

/// Interface name and up flag of an `ifinfomsg` body
fn parse_link_message(body: &[u8]) -> Option<(String, bool)> {
    let message = LinkMessageBuffer::new_checked(body).ok()?;
    let up = LinkFlags::from_bits_retain(message.flags()).contains(LinkFlags::Up);
    let name = message
        .attributes()
        .map_while(Result::ok)
        .filter(|attr| attr.kind() == IFLA_IFNAME)
        .last()
        .map(|attr| parse_name(attr.value()))
        .unwrap_or_default();

    Some((name, up))
}

/// Interface names are NUL-terminated on the wire
fn parse_name(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end]).into_owned()
}

fn parse_address(family: u8, payload: &[u8]) -> Option<IpAddr> {
    match family {
        AF_INET => <[u8; 4]>::try_from(payload).ok().map(IpAddr::from),
        AF_INET6 => <[u8; 16]>::try_from(payload).ok().map(IpAddr::from),
        _ => None,
    }
}
