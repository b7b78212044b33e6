//! Session notifications
//!
//! Subscribers get an unbounded receiver; senders whose receiver was dropped
//! are pruned on the next emit.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use crate::session::{ActiveWallet, SessionSnapshot, WalletKind};

/// Payload of the `walletSwitched` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSwitched {
    pub previous_wallet: ActiveWallet,
    pub new_wallet: WalletKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session changed; carries the new snapshot.
    Updated(SessionSnapshot),
    Switched(WalletSwitched),
}

#[derive(Clone, Default)]
pub struct EventBus {
    watchers: Rc<RefCell<Vec<mpsc::UnboundedSender<SessionEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.watchers.borrow_mut().push(tx);
        rx
    }

    pub fn emit(&self, event: SessionEvent) {
        self.watchers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.watchers.borrow().len()
    }
}
