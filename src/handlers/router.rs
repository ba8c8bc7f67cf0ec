//! Command dispatch for Active sessions.
//!
//! Each inbound line is classified with [`ClientLine::parse`] and routed to
//! one of four paths: status update, file relay, direct message, or plain
//! broadcast. Every outbound line is rendered once and shared by all
//! recipients.

use super::Fanout;
use crate::state::{Line, Recipient, Registry};
use relay_proto::{ClientLine, PresenceEvent, ServerLine};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Routes lines from Active sessions through the shared [`Registry`].
#[derive(Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle one line from `sender`.
    ///
    /// Lines from one sender are dispatched in arrival order because the
    /// sender's read loop awaits nothing between lines except this call.
    #[instrument(skip_all, fields(username = %sender))]
    pub fn dispatch(&self, sender: &str, line: &str) -> Fanout {
        let command = ClientLine::parse(line);
        debug!(kind = command.kind(), len = line.len(), "Dispatching line");

        match command {
            ClientLine::Status(status) => {
                self.registry.set_status(sender, status);
                self.broadcast_presence()
            }
            ClientLine::File { body } => self.broadcast(&ServerLine::FileFrom {
                from: sender.to_string(),
                body: body.to_string(),
            }),
            ClientLine::Direct { recipient, text } => self.direct(sender, recipient, text),
            ClientLine::Chat(text) => self.broadcast(&ServerLine::Chat {
                from: sender.to_string(),
                text: text.to_string(),
            }),
            ClientLine::Malformed(raw) => {
                debug!(line = %raw, "Dropping malformed direct message");
                Fanout::default()
            }
            ClientLine::Blank => Fanout::default(),
        }
    }

    /// Deliver a private message.
    ///
    /// One scan finds both the recipient and the sender. The recipient gets
    /// the line straight away; the sender's copy is held until the scan
    /// ends and goes out only if the recipient was found. Otherwise the
    /// sender alone gets the not-found notice and no private line is sent.
    /// With `sender == recipient` the sender receives exactly one copy.
    fn direct(&self, sender: &str, recipient: &str, text: &str) -> Fanout {
        let mut fanout = Fanout::default();
        let mut found = false;
        let mut sender_session: Option<Recipient> = None;
        let line = render(&ServerLine::Private {
            from: sender.to_string(),
            text: text.to_string(),
        });

        for target in self.registry.recipients() {
            if target.name == recipient {
                found = true;
                fanout.record(&target, target.handle.deliver(&line));
            } else if target.name == sender {
                sender_session = Some(target);
            }
        }

        if found {
            if let Some(target) = sender_session {
                fanout.record(&target, target.handle.deliver(&line));
            }
            return fanout;
        }

        debug!(recipient = %recipient, "Direct message recipient not found");
        if let Some(target) = sender_session {
            let notice = render(&ServerLine::NotFound {
                name: recipient.to_string(),
            });
            fanout.record(&target, target.handle.deliver(&notice));
        }
        fanout
    }

    /// Announce that `name` became Active, then send the new snapshot.
    pub fn announce_join(&self, name: &str) -> Fanout {
        self.announce(PresenceEvent::Joined, name)
    }

    /// Announce that `name` left, then send the new snapshot.
    ///
    /// Call after the name has been retired (or released) so the snapshot
    /// excludes it.
    pub fn announce_leave(&self, name: &str) -> Fanout {
        self.announce(PresenceEvent::Left, name)
    }

    fn announce(&self, event: PresenceEvent, name: &str) -> Fanout {
        let mut fanout = self.broadcast(&ServerLine::UserEvent {
            event,
            name: name.to_string(),
        });
        fanout.merge(self.broadcast_presence());
        fanout
    }

    /// Send the current presence snapshot to every Active session.
    pub fn broadcast_presence(&self) -> Fanout {
        let snapshot = self.registry.snapshot();
        let line = render(&ServerLine::Presence(snapshot.presence));
        deliver_all(&snapshot.recipients, &line)
    }

    /// Send `message` to every Active session, the originator included.
    pub fn broadcast(&self, message: &ServerLine) -> Fanout {
        let line = render(message);
        deliver_all(&self.registry.recipients(), &line)
    }
}

fn render(message: &ServerLine) -> Line {
    Arc::from(message.to_string())
}

fn deliver_all(recipients: &[Recipient], line: &Line) -> Fanout {
    let mut fanout = Fanout::default();
    for target in recipients {
        fanout.record(target, target.handle.deliver(line));
    }
    fanout
}
