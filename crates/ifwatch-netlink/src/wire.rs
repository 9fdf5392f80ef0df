//! Kernel rtnetlink wire constants
//!
//! Tag values and sizes of the `NETLINK_ROUTE` structures the decoder
//! dispatches on. Buffer access goes through `netlink-packet-core` and
//! `netlink-packet-route`.

/// `sizeof(struct nlmsghdr)`
pub const NLMSG_HDRLEN: usize = netlink_packet_core::NETLINK_HEADER_LEN;

/// `sizeof(struct rtattr)`
pub const RTA_HDRLEN: usize = 4;

/// Netlink message and attribute alignment
pub const NLA_ALIGNTO: usize = 4;

pub const RTM_NEWLINK: u16 = 16;
pub const RTM_DELLINK: u16 = 17;
pub const RTM_NEWADDR: u16 = 20;
pub const RTM_DELADDR: u16 = 21;

/// `IFA_LOCAL`: the address configured on the interface
pub const IFA_LOCAL: u16 = 2;
/// `IFA_LABEL`: interface name carried by address messages
pub const IFA_LABEL: u16 = 3;
/// `IFLA_IFNAME`: interface name carried by link messages
pub const IFLA_IFNAME: u16 = 3;

pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 10;

/// `IFF_UP` in `ifi_flags`
pub const IFF_UP: u32 = 0x1;

pub const RTNLGRP_LINK: u32 = 1;
pub const RTNLGRP_IPV4_IFADDR: u32 = 5;
pub const RTNLGRP_IPV6_IFADDR: u32 = 9;

/// Multicast bitmask for link, IPv4 address, and IPv6 address notifications
pub const MULTICAST_GROUPS: u32 = group_bit(RTNLGRP_LINK)
    | group_bit(RTNLGRP_IPV4_IFADDR)
    | group_bit(RTNLGRP_IPV6_IFADDR);

const fn group_bit(group: u32) -> u32 {
    1 << (group - 1)
}

/// Round a length up to the netlink alignment
pub const fn align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Message types the decoder distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NewAddress,
    DelAddress,
    NewLink,
    DelLink,
    Other(u16),
}

impl From<u16> for MessageKind {
    fn from(code: u16) -> Self {
        match code {
            RTM_NEWADDR => MessageKind::NewAddress,
            RTM_DELADDR => MessageKind::DelAddress,
            RTM_NEWLINK => MessageKind::NewLink,
            RTM_DELLINK => MessageKind::DelLink,
            other => MessageKind::Other(other),
        }
    }
}
