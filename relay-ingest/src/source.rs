//! Where export bytes come from.
//!
//! Mail automation lives outside this workspace; the pipeline only sees it
//! through [`ExportSource`], so tests and hosts can inject whatever holds the
//! attachments.

use chrono::NaiveDate;
use relay_core::{RelayError, Result};
use serde::{Deserialize, Serialize};

/// Lightweight listing entry for one message carrying an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub message_id: String,
    pub subject: String,
    pub date: Option<NaiveDate>,
    pub attachments: Vec<String>,
}

/// Raw export bytes plus what the source knows about them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Message id the bytes were taken from
    pub source_id: String,
    /// Attachment file name
    pub name: String,
    pub received: Option<NaiveDate>,
    pub bytes: Vec<u8>,
}

/// Capability to enumerate and fetch expense exports
pub trait ExportSource {
    /// Newest-first descriptors, at most `limit` of them.
    fn list(&self, limit: usize) -> Result<Vec<MessageDescriptor>>;

    /// Export for `message_id`, or the most recent one when `None`.
    fn fetch(&self, message_id: Option<&str>) -> Result<Attachment>;
}

impl<S: ExportSource + ?Sized> ExportSource for &S {
    fn list(&self, limit: usize) -> Result<Vec<MessageDescriptor>> {
        (**self).list(limit)
    }

    fn fetch(&self, message_id: Option<&str>) -> Result<Attachment> {
        (**self).fetch(message_id)
    }
}

/// In-memory source holding messages newest first
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    messages: Vec<(MessageDescriptor, Attachment)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message; later calls are treated as older messages.
    pub fn with_export(
        mut self,
        message_id: impl Into<String>,
        name: impl Into<String>,
        received: Option<NaiveDate>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let message_id = message_id.into();
        let name = name.into();
        let descriptor = MessageDescriptor {
            message_id: message_id.clone(),
            subject: name.clone(),
            date: received,
            attachments: vec![name.clone()],
        };
        let attachment = Attachment {
            source_id: message_id,
            name,
            received,
            bytes: bytes.into(),
        };
        self.messages.push((descriptor, attachment));
        self
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl ExportSource for MemorySource {
    fn list(&self, limit: usize) -> Result<Vec<MessageDescriptor>> {
        Ok(self
            .messages
            .iter()
            .take(limit)
            .map(|(d, _)| d.clone())
            .collect())
    }

    fn fetch(&self, message_id: Option<&str>) -> Result<Attachment> {
        let found = match message_id {
            None => self.messages.first(),
            Some(id) => self.messages.iter().find(|(d, _)| d.message_id == id),
        };
        found.map(|(_, a)| a.clone()).ok_or_else(|| match message_id {
            Some(id) => RelayError::NotFound(format!("no export attached to message '{id}'")),
            None => RelayError::NotFound("no expense export found".to_string()),
        })
    }
}
