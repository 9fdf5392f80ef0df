//! Startup interface enumeration over netlink
//!
//! Dumps links (`RTM_GETLINK`) and addresses (`RTM_GETADDR`) and joins them
//! by interface index into [`InterfaceSnapshot`]s.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;

use async_trait::async_trait;
use ifwatch_core::traits::{InterfaceEnumerator, InterfaceSnapshot};
use ifwatch_core::{Error, Result};
use netlink_packet_core::{
    NLM_F_DUMP, NLM_F_REQUEST, NetlinkDeserializable, NetlinkMessage, NetlinkPayload,
    NetlinkSerializable,
};
use netlink_packet_route::{
    RouteNetlinkMessage,
    address::{AddressAttribute, AddressMessage},
    link::{LinkAttribute, LinkFlags, LinkMessage},
};
use netlink_sys::constants::NETLINK_ROUTE;
use netlink_sys::{Socket, SocketAddr};
use tracing::debug;

/// Netlink-backed startup enumerator (Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct NetlinkEnumerator;

impl NetlinkEnumerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InterfaceEnumerator for NetlinkEnumerator {
    async fn snapshot(&self) -> Result<Vec<InterfaceSnapshot>> {
        tokio::task::spawn_blocking(list_interfaces)
            .await
            .map_err(|e| Error::enumeration(format!("Enumeration task failed: {}", e)))?
    }
}

/// Snapshot every interface with its up flag and addresses
///
/// Blocking; use [`NetlinkEnumerator`] from async code.
pub fn list_interfaces() -> Result<Vec<InterfaceSnapshot>> {
    let links = dump(
        NetlinkMessage::from(RouteNetlinkMessage::GetLink(LinkMessage::default())),
        |msg| match msg {
            RouteNetlinkMessage::NewLink(link) => link_entry(&link),
            _ => None,
        },
    )
    .map_err(|e| Error::enumeration(format!("Link dump failed: {}", e)))?;

    let addresses = dump(
        NetlinkMessage::from(RouteNetlinkMessage::GetAddress(AddressMessage::default())),
        |msg| match msg {
            RouteNetlinkMessage::NewAddress(addr) => address_entry(&addr),
            _ => None,
        },
    )
    .map_err(|e| Error::enumeration(format!("Address dump failed: {}", e)))?;

    let mut by_index: HashMap<u32, Vec<IpAddr>> = HashMap::new();
    for (index, addr) in addresses {
        by_index.entry(index).or_default().push(addr);
    }

    let snapshot: Vec<InterfaceSnapshot> = links
        .into_iter()
        .map(|(index, mut iface)| {
            iface.addresses = by_index.remove(&index).unwrap_or_default();
            iface
        })
        .collect();

    debug!("Enumerated {} interface(s)", snapshot.len());
    Ok(snapshot)
}

fn link_entry(link: &LinkMessage) -> Option<(u32, InterfaceSnapshot)> {
    let name = link.attributes.iter().find_map(|attr| match attr {
        LinkAttribute::IfName(name) => Some(name.clone()),
        _ => None,
    })?;
    let up = link.header.flags.contains(LinkFlags::Up);
    Some((link.header.index, InterfaceSnapshot::new(name, up)))
}

/// Prefer the local address; point-to-point links report the peer in `Address`
fn address_entry(addr: &AddressMessage) -> Option<(u32, IpAddr)> {
    let mut local = None;
    let mut address = None;
    for attr in &addr.attributes {
        match attr {
            AddressAttribute::Local(ip) => local = Some(*ip),
            AddressAttribute::Address(ip) => address = Some(*ip),
            _ => {}
        }
    }
    Some((addr.header.index, local.or(address)?))
}

/// Send a dump request and collect the replies until `NLMSG_DONE`
///
/// Large dumps span several datagrams, so reading continues past the first.
fn dump<T, F, R>(mut req: NetlinkMessage<T>, f: F) -> io::Result<Vec<R>>
where
    T: NetlinkSerializable + NetlinkDeserializable,
    F: Fn(T) -> Option<R>,
{
    let mut socket = Socket::new(NETLINK_ROUTE)?;
    socket.bind(&SocketAddr::new(0, 0))?;

    req.header.flags = NLM_F_REQUEST | NLM_F_DUMP;
    req.finalize();
    let mut send_buf = vec![0u8; req.buffer_len()];
    req.serialize(&mut send_buf);
    if socket.send(&send_buf, 0)? != send_buf.len() {
        return Err(io::Error::other("Short write of netlink dump request"));
    }

    let mut results = Vec::new();
    loop {
        let (recv_buf, _) = socket.recv_from_full()?;
        if recv_buf.is_empty() {
            return Err(io::Error::other("Netlink socket closed during dump"));
        }

        let mut view = &recv_buf[..];
        while !view.is_empty() {
            let msg = NetlinkMessage::<T>::deserialize(view)
                .map_err(io::Error::other)?;
            let len = msg.header.length as usize;

            match msg.payload {
                NetlinkPayload::Done(_) => return Ok(results),
                NetlinkPayload::Error(err) => {
                    return Err(io::Error::other(format!("Netlink error reply: {:?}", err)));
                }
                NetlinkPayload::InnerMessage(inner) => {
                    if let Some(item) = f(inner) {
                        results.push(item);
                    }
                }
                _ => {}
            }

            if len == 0 || len > view.len() {
                return Err(io::Error::other(
                    "Received a malformed netlink message (invalid length)",
                ));
            }
            view = &view[len..];
        }
    }
}
