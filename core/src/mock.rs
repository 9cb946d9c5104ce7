//! Scripted transport for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::nfc::{Transport, TransportError};

#[derive(Default)]
struct Inner {
    replies: VecDeque<Result<Vec<u8>, TransportError>>,
    endless: Option<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    invalidations: Vec<Option<String>>,
}

/// Replies with canned responses in order, recording every command.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    inner: Rc<RefCell<Inner>>,
}

impl MockTransport {
    pub(crate) fn new(replies: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        let mock = Self::default();
        mock.inner.borrow_mut().replies = replies.into();
        mock
    }

    /// Replies with the same response forever.
    pub(crate) fn endless(reply: Vec<u8>) -> Self {
        Self::new(vec![]).then_forever(reply)
    }

    /// Once the canned responses run out, replies with the response forever.
    pub(crate) fn then_forever(self, reply: Vec<u8>) -> Self {
        self.inner.borrow_mut().endless = Some(reply);
        self
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().sent.clone()
    }

    pub(crate) fn invalidations(&self) -> Vec<Option<String>> {
        self.inner.borrow().invalidations.clone()
    }
}

impl Transport<()> for MockTransport {
    fn send(&self, _: (), command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.sent.push(command.to_vec());

        match inner.replies.pop_front() {
            Some(reply) => reply,
            None => inner
                .endless
                .clone()
                .ok_or_else(|| TransportError::link("no more replies")),
        }
    }

    fn invalidate(&self, _: (), reason: Option<&str>) {
        self.inner
            .borrow_mut()
            .invalidations
            .push(reason.map(str::to_owned));
    }
}
