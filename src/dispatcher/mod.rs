
use log::info;
use thiserror::Error;

use crate::grouper::Group;
use crate::message::{build_mime, MessageError, MessageTemplate, OutgoingMessage};
use crate::smtp::{SmtpError, Transport};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Transport(#[from] SmtpError),
}

/// Lazy producer of the messages for a group list.
///
/// Yields one message per group, reading attachment payloads from disk as
/// each message is built. Finite; restart only by constructing a new
/// stream.
pub struct MessageStream<'a> {
    template: &'a MessageTemplate,
    groups: &'a [Group],
    index: usize,
}

impl<'a> MessageStream<'a> {
    pub fn new(template: &'a MessageTemplate, groups: &'a [Group]) -> Self {
        Self {
            template,
            groups,
            index: 0,
        }
    }
}

impl Iterator for MessageStream<'_> {
    type Item = Result<OutgoingMessage, MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let group = self.groups.get(self.index)?;
        let msg =
            OutgoingMessage::from_group(self.template, group, self.index, self.groups.len());
        self.index += 1;
        Some(msg)
    }
}

/// Send one message per group over an already-authenticated session.
///
/// Strictly sequential: message k+1 is not built until message k's
/// transmission call returned. The first failure (attachment read or
/// transport) aborts the run; messages already transmitted stay sent,
/// since mail cannot be recalled. Returns the number of messages sent.
pub fn dispatch<T: Transport>(
    transport: &mut T,
    template: &MessageTemplate,
    groups: &[Group],
) -> Result<usize, DispatchError> {
    let total = groups.len();
    let mut sent = 0;

    for (i, result) in MessageStream::new(template, groups).enumerate() {
        info!("sending message {}/{}", i + 1, total);
        let msg = result?;
        for att in &msg.attachments {
            info!("    {}", att.filename);
        }

        let raw = build_mime(&msg);
        transport.send(&msg.from, &msg.to, &raw)?;
        sent += 1;
    }

    Ok(sent)
}
