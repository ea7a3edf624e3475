//! Shared test doubles.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::bytes::Regex;

use crate::error::TransportError;
use crate::transport::Transport;

/// Transport fake replaying a scripted menu dialogue.
///
/// Each `send_line` records the keystroke and appends the next scripted
/// reply to the pending stream; `wait_for` only matches text the script
/// has already produced, so a missing prompt surfaces as an immediate
/// timeout instead of a real wait. Seeding a banner models the text a
/// device emits before the first keystroke.
pub struct ScriptedTransport {
    pending: Vec<u8>,
    replies: VecDeque<String>,
    pub sent: Vec<String>,
    pub closed: Arc<AtomicBool>,
}

impl ScriptedTransport {
    pub fn new(banner: &str, replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            pending: banner.as_bytes().to_vec(),
            replies: replies.into_iter().map(Into::into).collect(),
            sent: Vec::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn close_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl Transport for ScriptedTransport {
    async fn send_line(&mut self, keystroke: &str) -> Result<(), TransportError> {
        self.sent.push(keystroke.to_string());
        if let Some(reply) = self.replies.pop_front() {
            self.pending.extend_from_slice(reply.as_bytes());
        }
        Ok(())
    }

    async fn wait_for(&mut self, prompt: &Regex, wait: Duration) -> Result<String, TransportError> {
        let end = prompt.find(&self.pending).map(|found| found.end());
        match end {
            Some(end) => {
                let consumed: Vec<u8> = self.pending.drain(..end).collect();
                Ok(String::from_utf8_lossy(&consumed).into_owned())
            }
            None => Err(TransportError::PromptTimeout {
                pattern: prompt.as_str().to_string(),
                timeout: wait,
            }),
        }
    }

    async fn close(self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
