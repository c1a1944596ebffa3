//! Decode a `GetUserAvailabilityRequest` SOAP envelope.
//!
//! Elements are matched by namespace URI and local name so it doesn't
//! matter which prefixes the sender picked. Anything we don't know
//! about is skipped.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use super::{MESSAGES_NS, SOAP_ENVELOPE_NS, SOAP12_ENVELOPE_NS, TYPES_NS};
use crate::core::RelayError;
use crate::core::models::{AvailabilityQuery, TimeWindow};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Node {
    Envelope,
    Body,
    Request,
    ViewOptions,
    TimeWindow,
    StartTime,
    EndTime,
    MergedInterval,
    MailboxArray,
    Mailbox,
    Email,
    Address,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Field {
    Start,
    End,
    MergeInterval,
    Address,
}

fn classify(ns: &ResolveResult, local: &[u8]) -> Option<Node> {
    let ns = match ns {
        ResolveResult::Bound(Namespace(ns)) => *ns,
        _ => return None,
    };

    if ns == SOAP_ENVELOPE_NS.as_bytes() || ns == SOAP12_ENVELOPE_NS.as_bytes() {
        match local {
            b"Envelope" => Some(Node::Envelope),
            b"Body" => Some(Node::Body),
            _ => None,
        }
    } else if ns == MESSAGES_NS.as_bytes() {
        match local {
            b"GetUserAvailabilityRequest" => Some(Node::Request),
            b"MailboxDataArray" => Some(Node::MailboxArray),
            _ => None,
        }
    } else if ns == TYPES_NS.as_bytes() {
        match local {
            b"FreeBusyViewOptions" => Some(Node::ViewOptions),
            b"TimeWindow" => Some(Node::TimeWindow),
            b"StartTime" => Some(Node::StartTime),
            b"EndTime" => Some(Node::EndTime),
            b"MergedFreeBusyIntervalInMinutes" => Some(Node::MergedInterval),
            b"MailboxData" => Some(Node::Mailbox),
            b"Email" => Some(Node::Email),
            b"Address" => Some(Node::Address),
            _ => None,
        }
    } else {
        None
    }
}

/// Path below the envelope's `GetUserAvailabilityRequest`, if we're in it
fn request_path(path: &[Option<Node>]) -> Option<&[Option<Node>]> {
    match path {
        [Some(Node::Envelope), Some(Node::Body), Some(Node::Request), rest @ ..] => Some(rest),
        _ => None,
    }
}

fn field_at(path: &[Option<Node>]) -> Option<Field> {
    match request_path(path)? {
        [Some(Node::ViewOptions), Some(Node::TimeWindow), Some(Node::StartTime)] => {
            Some(Field::Start)
        }
        [Some(Node::ViewOptions), Some(Node::TimeWindow), Some(Node::EndTime)] => {
            Some(Field::End)
        }
        [Some(Node::ViewOptions), Some(Node::MergedInterval)] => Some(Field::MergeInterval),
        [
            Some(Node::MailboxArray),
            Some(Node::Mailbox),
            Some(Node::Email),
            Some(Node::Address),
        ] => Some(Field::Address),
        _ => None,
    }
}

fn is_request(path: &[Option<Node>]) -> bool {
    matches!(request_path(path), Some([]))
}

fn is_mailbox(path: &[Option<Node>]) -> bool {
    matches!(
        request_path(path),
        Some([Some(Node::MailboxArray), Some(Node::Mailbox)])
    )
}

fn malformed(err: impl std::fmt::Display) -> RelayError {
    RelayError::MalformedRequest(err.to_string())
}

/// Values collected while walking the document
#[derive(Default)]
struct Parts {
    found_request: bool,
    start: Option<String>,
    end: Option<String>,
    merge_interval: Option<String>,
    accounts: Vec<String>,
    mailbox_address: Option<String>,
    capture: Option<(Field, String)>,
}

impl Parts {
    fn open(&mut self, path: &[Option<Node>]) {
        if is_request(path) {
            self.found_request = true;
        }
        if is_mailbox(path) {
            self.mailbox_address = None;
        }
        if let Some(field) = field_at(path) {
            self.capture = Some((field, String::new()));
        }
    }

    fn push_text(&mut self, path: &[Option<Node>], text: &str) {
        if let Some((field, buf)) = self.capture.as_mut()
            && field_at(path) == Some(*field)
        {
            buf.push_str(text);
        }
    }

    fn close(&mut self, path: &[Option<Node>]) -> Result<(), RelayError> {
        if field_at(path).is_some()
            && let Some((field, buf)) = self.capture.take()
        {
            let value = Some(buf.trim().to_string()).filter(|v| !v.is_empty());
            match field {
                Field::Start => self.start = value,
                Field::End => self.end = value,
                Field::MergeInterval => self.merge_interval = value,
                Field::Address => self.mailbox_address = value,
            }
        }

        if is_mailbox(path) {
            let address = self
                .mailbox_address
                .take()
                .ok_or_else(|| malformed("MailboxData without an email address"))?;
            self.accounts.push(address);
        }

        Ok(())
    }

    fn finish(self) -> Result<AvailabilityQuery, RelayError> {
        if !self.found_request {
            return Err(malformed("no GetUserAvailabilityRequest in SOAP body"));
        }
        let start = self
            .start
            .ok_or_else(|| malformed("missing FreeBusyViewOptions/TimeWindow/StartTime"))?;
        let end = self
            .end
            .ok_or_else(|| malformed("missing FreeBusyViewOptions/TimeWindow/EndTime"))?;
        let merge_interval = self.merge_interval.ok_or_else(|| {
            malformed("missing FreeBusyViewOptions/MergedFreeBusyIntervalInMinutes")
        })?;

        AvailabilityQuery::new(self.accounts, TimeWindow { start, end }, merge_interval)
    }
}

/// Parse the raw SOAP request body into an `AvailabilityQuery`.
///
/// A single `MailboxData` and a run of sibling `MailboxData` elements
/// both come out as a list of addresses in document order.
pub fn decode(raw: &[u8]) -> Result<AvailabilityQuery, RelayError> {
    let mut reader = NsReader::from_reader(raw);
    let mut path: Vec<Option<Node>> = Vec::new();
    let mut parts = Parts::default();

    loop {
        match reader.read_resolved_event().map_err(malformed)? {
            (ns, Event::Start(e)) => {
                path.push(classify(&ns, e.local_name().as_ref()));
                parts.open(&path);
            }
            (ns, Event::Empty(e)) => {
                path.push(classify(&ns, e.local_name().as_ref()));
                parts.open(&path);
                parts.close(&path)?;
                path.pop();
            }
            (_, Event::End(_)) => {
                parts.close(&path)?;
                path.pop();
            }
            (_, Event::Text(text)) => {
                let text = text.unescape().map_err(malformed)?;
                parts.push_text(&path, &text);
            }
            (_, Event::CData(data)) => {
                parts.push_text(&path, &String::from_utf8_lossy(&data));
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(malformed("unexpected end of document"));
    }

    parts.finish()
}
