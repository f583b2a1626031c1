//! Minimal blocking netlink transport.
//!
//! Only what the socket diagnostics client needs: a bound netlink socket with
//! sequence numbering, the `nlmsghdr` layout, and a length-checked iterator
//! over the messages in a received datagram.

pub mod message;
mod socket;

pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, Protocol};
