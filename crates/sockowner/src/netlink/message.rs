//! Netlink message header and framing.

use std::io;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header for a payload of `payload_len` bytes.
    pub fn new(msg_type: u16, flags: u16, payload_len: usize) -> Self {
        Self {
            nlmsg_len: (NLMSG_HDRLEN + payload_len) as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse header from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| malformed(format!("truncated header: {} bytes", data.len())))
    }
}

/// Standard netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;
    /// Data lost, request resend.
    pub const OVERRUN: u16 = 4;

    /// Socket lookup by address family (NETLINK_SOCK_DIAG).
    pub const SOCK_DIAG_BY_FAMILY: u16 = 20;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;

/// Build an `InvalidData` netlink error for a malformed reply.
pub(crate) fn malformed(msg: impl Into<String>) -> Error {
    Error::Netlink(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
}

/// Iterator over netlink messages in a received datagram.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(&'a NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLMSG_HDRLEN {
            return None;
        }

        let header = match NlMsgHdr::from_bytes(self.data) {
            Ok(h) => h,
            Err(e) => return Some(Err(e)),
        };

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > self.data.len() {
            self.data = &[];
            return Some(Err(malformed(format!(
                "invalid message length: {}",
                msg_len
            ))));
        }

        let payload = &self.data[NLMSG_HDRLEN..msg_len];
        let aligned_len = nlmsg_align(msg_len);

        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some(Ok((header, payload)))
    }
}

/// Netlink error message payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse error message from payload.
    ///
    /// Only the leading errno is required; kernels may cap the echoed header.
    pub fn errno_from_bytes(data: &[u8]) -> Result<i32> {
        if let Ok((err, _)) = Self::ref_from_prefix(data) {
            return Ok(err.error);
        }
        match data.get(..4) {
            Some(raw) => Ok(i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]])),
            None => Err(malformed(format!("truncated error message: {} bytes", data.len()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut hdr = NlMsgHdr::new(msg_type, 0, payload.len());
        hdr.nlmsg_seq = seq;
        let mut buf = hdr.as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nlmsg_align(buf.len()), 0);
        buf
    }

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(NLMSG_HDRLEN, 16);
    }

    #[test]
    fn iterates_aligned_messages() {
        let mut data = message(NlMsgType::SOCK_DIAG_BY_FAMILY, 7, &[1, 2, 3]);
        data.extend(message(NlMsgType::DONE, 7, &0i32.to_ne_bytes()));

        let msgs: Vec<_> = MessageIter::new(&data).collect::<Result<_>>().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].0.nlmsg_type, NlMsgType::SOCK_DIAG_BY_FAMILY);
        assert_eq!(msgs[0].1, &[1, 2, 3]);
        assert!(msgs[1].0.is_done());
    }

    #[test]
    fn rejects_overlong_length() {
        let mut data = message(NlMsgType::SOCK_DIAG_BY_FAMILY, 1, &[0; 8]);
        data[0..4].copy_from_slice(&1000u32.to_ne_bytes());

        let mut iter = MessageIter::new(&data);
        let err = iter.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::Netlink(ref e) if e.kind() == io::ErrorKind::InvalidData));
        assert!(iter.next().is_none());
    }

    #[test]
    fn ignores_trailing_garbage_shorter_than_header() {
        let mut data = message(NlMsgType::NOOP, 1, &[]);
        data.extend_from_slice(&[0xff; 5]);
        assert_eq!(MessageIter::new(&data).count(), 1);
    }

    #[test]
    fn error_payload_with_short_echo() {
        let errno = NlMsgError::errno_from_bytes(&(-libc::ENOENT).to_ne_bytes()).unwrap();
        assert_eq!(errno, -libc::ENOENT);

        let mut full = (-libc::EINVAL).to_ne_bytes().to_vec();
        full.extend_from_slice(NlMsgHdr::default().as_bytes());
        assert_eq!(NlMsgError::errno_from_bytes(&full).unwrap(), -libc::EINVAL);

        assert!(NlMsgError::errno_from_bytes(&[0, 1]).is_err());
    }
}
