//! Contract Test: Notification Decoding
//!
//! Constraints verified:
//! - Address notifications decode to address events that apply to the table
//! - Messages in one datagram decode in order
//! - Decoding stops at a malformed header and keeps earlier events
//! - Unknown attributes and message types are skipped
//! - Link notifications carry the up flag; deletions decode to removals
//! - Payloads that do not match the family decode to no address

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ifwatch_core::{ChangeEvent, InterfaceTable, apply_batch};
use ifwatch_netlink::decode;
use ifwatch_netlink::wire::{
    AF_INET, AF_INET6, IFA_LABEL, IFA_LOCAL, IFF_UP, IFLA_IFNAME, NLMSG_HDRLEN, RTA_HDRLEN,
    RTM_DELADDR, RTM_DELLINK, RTM_NEWADDR, RTM_NEWLINK, align,
};

/// IFA_ADDRESS; present in real messages but not read by the decoder
const IFA_ADDRESS: u16 = 1;
/// IFLA_MTU
const IFLA_MTU: u16 = 4;
/// RTM_NEWROUTE
const RTM_NEWROUTE: u16 = 24;

fn rtattr(kind: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((RTA_HDRLEN + payload.len()) as u16).to_ne_bytes());
    out.extend_from_slice(&kind.to_ne_bytes());
    out.extend_from_slice(payload);
    out.resize(align(out.len()), 0);
    out
}

fn message(kind: u16, body: &[u8]) -> Vec<u8> {
    let len = (NLMSG_HDRLEN + body.len()) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(&len.to_ne_bytes());
    out.extend_from_slice(&kind.to_ne_bytes());
    out.extend_from_slice(&0u16.to_ne_bytes());
    out.extend_from_slice(&1u32.to_ne_bytes());
    out.extend_from_slice(&0u32.to_ne_bytes());
    out.extend_from_slice(body);
    out.resize(align(out.len()), 0);
    out
}

fn ifaddrmsg(family: u8, attrs: &[Vec<u8>]) -> Vec<u8> {
    let prefix = if family == AF_INET { 24 } else { 64 };
    let mut body = vec![family, prefix, 0, 0];
    body.extend_from_slice(&2u32.to_ne_bytes());
    for attr in attrs {
        body.extend_from_slice(attr);
    }
    body
}

fn ifinfomsg(flags: u32, attrs: &[Vec<u8>]) -> Vec<u8> {
    let mut body = vec![0u8, 0];
    body.extend_from_slice(&1u16.to_ne_bytes());
    body.extend_from_slice(&2i32.to_ne_bytes());
    body.extend_from_slice(&flags.to_ne_bytes());
    body.extend_from_slice(&0xffff_ffffu32.to_ne_bytes());
    for attr in attrs {
        body.extend_from_slice(attr);
    }
    body
}

fn new_addr_v4(name: &str, addr: [u8; 4]) -> Vec<u8> {
    message(
        RTM_NEWADDR,
        &ifaddrmsg(
            AF_INET,
            &[
                rtattr(IFA_ADDRESS, &addr),
                rtattr(IFA_LOCAL, &addr),
                rtattr(IFA_LABEL, &[name.as_bytes(), b"\0"].concat()),
            ],
        ),
    )
}

fn del_addr_v4(name: &str, addr: [u8; 4]) -> Vec<u8> {
    message(
        RTM_DELADDR,
        &ifaddrmsg(
            AF_INET,
            &[
                rtattr(IFA_LOCAL, &addr),
                rtattr(IFA_LABEL, &[name.as_bytes(), b"\0"].concat()),
            ],
        ),
    )
}

fn link(kind: u16, name: &str, flags: u32) -> Vec<u8> {
    message(
        kind,
        &ifinfomsg(
            flags,
            &[
                rtattr(IFLA_IFNAME, &[name.as_bytes(), b"\0"].concat()),
                rtattr(IFLA_MTU, &1500u32.to_ne_bytes()),
            ],
        ),
    )
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[test]
fn new_address_decodes_and_applies() {
    let batch = decode(&new_addr_v4("eth0", [10, 0, 0, 5]));

    assert_eq!(
        batch.events(),
        &[ChangeEvent::AddressAdded {
            name: "eth0".to_string(),
            address: Some(ip("10.0.0.5")),
        }]
    );

    let table = InterfaceTable::new();
    let outcome = apply_batch(&table, &batch);
    assert_eq!(outcome.applied, 1);

    let record = table.get("eth0").expect("eth0 recorded");
    assert_eq!(record.ipv4, vec![Ipv4Addr::new(10, 0, 0, 5)]);
    assert!(!record.up, "address-created records start down");
}

#[test]
fn add_then_remove_in_one_datagram_leaves_no_address() {
    let mut buf = new_addr_v4("eth0", [10, 0, 0, 5]);
    buf.extend(del_addr_v4("eth0", [10, 0, 0, 5]));

    let batch = decode(&buf);
    assert_eq!(batch.len(), 2);
    assert!(matches!(batch.events()[0], ChangeEvent::AddressAdded { .. }));
    assert!(matches!(batch.events()[1], ChangeEvent::AddressRemoved { .. }));

    let table = InterfaceTable::new();
    apply_batch(&table, &batch);
    assert!(table.get("eth0").unwrap().ipv4.is_empty());
}

#[test]
fn truncated_trailing_message_keeps_earlier_events() {
    let mut buf = new_addr_v4("eth0", [10, 0, 0, 5]);
    let second = new_addr_v4("eth1", [10, 0, 0, 6]);
    buf.extend_from_slice(&second[..second.len() - 8]);

    let batch = decode(&buf);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.events()[0].name(), "eth0");
}

#[test]
fn zero_length_header_stops_decoding() {
    let mut buf = new_addr_v4("eth0", [10, 0, 0, 5]);
    let mut bogus = new_addr_v4("eth1", [10, 0, 0, 6]);
    bogus[..4].copy_from_slice(&0u32.to_ne_bytes());
    buf.extend(bogus);
    buf.extend(new_addr_v4("eth2", [10, 0, 0, 7]));

    let batch = decode(&buf);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.events()[0].name(), "eth0");
}

#[test]
fn unknown_attributes_are_skipped() {
    let buf = message(
        RTM_NEWADDR,
        &ifaddrmsg(
            AF_INET,
            &[
                rtattr(99, &[1, 2, 3]),
                rtattr(IFA_LOCAL, &[192, 168, 1, 10]),
                rtattr(8, &[0; 12]),
                rtattr(IFA_LABEL, b"wlan0\0"),
            ],
        ),
    );

    assert_eq!(
        decode(&buf).events(),
        &[ChangeEvent::AddressAdded {
            name: "wlan0".to_string(),
            address: Some(ip("192.168.1.10")),
        }]
    );
}

#[test]
fn other_message_types_are_ignored() {
    let mut buf = message(RTM_NEWROUTE, &[0u8; 12]);
    buf.extend(new_addr_v4("eth0", [10, 0, 0, 5]));

    let batch = decode(&buf);
    assert_eq!(batch.len(), 1);
}

#[test]
fn link_messages_carry_up_flag() {
    let mut buf = link(RTM_NEWLINK, "eth0", IFF_UP | 0x40);
    buf.extend(link(RTM_NEWLINK, "eth0", 0x1000));
    buf.extend(link(RTM_DELLINK, "eth0", 0));

    assert_eq!(
        decode(&buf).into_events(),
        vec![
            ChangeEvent::LinkUp {
                name: "eth0".to_string()
            },
            ChangeEvent::LinkDown {
                name: "eth0".to_string()
            },
            ChangeEvent::LinkRemoved {
                name: "eth0".to_string()
            },
        ]
    );
}

#[test]
fn link_events_toggle_registered_links_only() {
    let table = InterfaceTable::new();
    table.add_link("eth0", false);

    let mut buf = link(RTM_NEWLINK, "eth0", IFF_UP);
    buf.extend(link(RTM_NEWLINK, "eth9", IFF_UP));
    apply_batch(&table, &decode(&buf));

    assert!(table.get("eth0").unwrap().up);
    assert!(!table.contains("eth9"), "link events must not create records");

    apply_batch(&table, &decode(&link(RTM_DELLINK, "eth0", 0)));
    assert!(table.is_empty());
}

#[test]
fn ipv6_address_decodes() {
    let addr = "fe80::1".parse::<Ipv6Addr>().unwrap().octets();
    let buf = message(
        RTM_NEWADDR,
        &ifaddrmsg(
            AF_INET6,
            &[rtattr(IFA_LOCAL, &addr), rtattr(IFA_LABEL, b"eth0\0")],
        ),
    );

    assert_eq!(decode(&buf).events()[0].address(), Some(ip("fe80::1")));
}

#[test]
fn mismatched_payload_yields_no_address_and_is_discarded() {
    let buf = message(
        RTM_NEWADDR,
        &ifaddrmsg(
            AF_INET,
            &[rtattr(IFA_LOCAL, &[0u8; 16]), rtattr(IFA_LABEL, b"eth0\0")],
        ),
    );

    let batch = decode(&buf);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.events()[0].address(), None);

    let table = InterfaceTable::new();
    let outcome = apply_batch(&table, &batch);
    assert_eq!(outcome.discarded, 1);
    assert!(table.is_empty());
}
