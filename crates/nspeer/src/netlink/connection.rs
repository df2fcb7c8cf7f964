//! rtnetlink connection with request/response and dump handling.

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{MessageIter, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError, NlMsgType};
use super::messages::{AddressMessage, LinkMessage};
use super::parse::FromNetlink;
use super::socket::NetlinkSocket;
use super::types::addr::IfAddrMsg;
use super::types::link::{IfInfoMsg, IflaAttr, RTEXT_FILTER_SKIP_STATS};

/// rtnetlink connection bound to the namespace it was created in.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Open a connection in the calling thread's current network namespace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Send a non-dump request and collect the payloads of its reply.
    ///
    /// Returns once a datagram carrying at least one message with the
    /// request's sequence number has been processed.
    pub async fn request(
        &self,
        mut builder: MessageBuilder,
        operation: &str,
    ) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        loop {
            let data = self.socket.recv_msg().await?;
            let mut replies = Vec::new();
            let mut answered = false;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;
                if header.nlmsg_seq != seq {
                    continue;
                }
                answered = true;

                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno_with_context(err.error, operation));
                    }
                    continue;
                }
                replies.push(payload.to_vec());
            }

            if answered {
                return Ok(replies);
            }
        }
    }

    /// Send a dump request and collect the payloads of every reply part.
    pub async fn dump(
        &self,
        mut builder: MessageBuilder,
        operation: &str,
    ) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        let mut state = DumpState::new(seq);
        loop {
            let data = self.socket.recv_msg().await?;
            if state.feed(&data, operation)? {
                break;
            }
        }
        tracing::debug!(operation, records = state.responses.len(), "dump complete");
        state.finish(operation)
    }

    /// Send a dump request and strictly decode every reply.
    async fn dump_typed<T: FromNetlink>(
        &self,
        builder: MessageBuilder,
        operation: &str,
    ) -> Result<Vec<T>> {
        self.dump(builder, operation)
            .await?
            .iter()
            .map(|payload| T::from_bytes(payload))
            .collect()
    }

    /// Dump every network interface.
    pub async fn get_links(&self) -> Result<Vec<LinkMessage>> {
        let mut builder = dump_request(NlMsgType::RTM_GETLINK);
        builder.append(&IfInfoMsg::new());
        builder.append_attr_u32(IflaAttr::ExtMask as u16, RTEXT_FILTER_SKIP_STATS);
        self.dump_typed(builder, "link dump").await
    }

    /// Fetch a single interface by index.
    ///
    /// Returns `None` if the interface doesn't exist.
    pub async fn get_link(&self, index: i32) -> Result<Option<LinkMessage>> {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST);
        builder.append(&IfInfoMsg::new().with_index(index));
        builder.append_attr_u32(IflaAttr::ExtMask as u16, RTEXT_FILTER_SKIP_STATS);

        let replies = match self.request(builder, &format!("getting link {}", index)).await {
            Ok(replies) => replies,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        replies
            .first()
            .map(|payload| LinkMessage::from_bytes(payload))
            .transpose()
    }

    /// Dump addresses of one family (0 for all), optionally for one interface.
    ///
    /// The index is only a hint to the kernel; callers still filter on it.
    pub async fn get_addresses(
        &self,
        family: u8,
        index: Option<u32>,
    ) -> Result<Vec<AddressMessage>> {
        let mut builder = dump_request(NlMsgType::RTM_GETADDR);
        builder.append(
            &IfAddrMsg::new()
                .with_family(family)
                .with_index(index.unwrap_or(0)),
        );
        self.dump_typed(builder, "address dump").await
    }
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Accumulates the parts of one dump across datagrams.
struct DumpState {
    seq: u32,
    responses: Vec<Vec<u8>>,
    interrupted: bool,
}

impl DumpState {
    fn new(seq: u32) -> Self {
        Self {
            seq,
            responses: Vec::new(),
            interrupted: false,
        }
    }

    /// Consume one datagram. Returns true once NLMSG_DONE was seen.
    fn feed(&mut self, data: &[u8], operation: &str) -> Result<bool> {
        for result in MessageIter::new(data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != self.seq {
                continue;
            }
            if header.is_dump_interrupted() {
                self.interrupted = true;
            }

            match header.nlmsg_type {
                NlMsgType::ERROR => {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno_with_context(err.error, operation));
                    }
                }
                NlMsgType::DONE => return Ok(true),
                NlMsgType::NOOP => {}
                NlMsgType::OVERRUN => {
                    return Err(Error::InvalidMessage(format!("{}: data lost", operation)));
                }
                _ => self.responses.push(payload.to_vec()),
            }
        }
        Ok(false)
    }

    fn finish(self, operation: &str) -> Result<Vec<Vec<u8>>> {
        if self.interrupted {
            return Err(Error::DumpInterrupted {
                operation: operation.to_string(),
            });
        }
        Ok(self.responses)
    }
}
