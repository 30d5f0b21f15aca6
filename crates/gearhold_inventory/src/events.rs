//! # Notification Events
//!
//! Everything the client needs to hear about, queued in the order it
//! happened. The network collaborator drains the outbox after each
//! operation.

use gearhold_shared::{ItemGuid, Position};

use crate::error::InventoryError;
use crate::item::Item;
use crate::money::Money;

/// One client notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// Units arrived in the inventory.
    ItemPushed {
        /// Where they landed.
        position: Position,
        /// Stack that received them.
        item: ItemGuid,
        /// Units added.
        count: u32,
        /// True if newly created rather than moved.
        created: bool,
        /// True if they came from a loot window.
        from_loot: bool,
    },
    /// An equip or move request failed.
    EquipError {
        /// Result code.
        error: InventoryError,
        /// First item involved.
        item: Option<ItemGuid>,
        /// Second item involved.
        other: Option<ItemGuid>,
    },
    /// A loot slot was emptied.
    LootRemoved {
        /// Loot window slot.
        slot: u8,
    },
    /// A buyback slot changed.
    BuybackSlotChanged {
        /// Buyback index.
        index: u8,
    },
    /// A stack shrank in place.
    ItemCountChanged {
        /// Stack.
        item: ItemGuid,
        /// Units left.
        count: u32,
    },
    /// An item left the inventory for good.
    ItemRemoved {
        /// Item.
        item: ItemGuid,
    },
    /// Durability changed.
    DurabilityChanged {
        /// Item.
        item: ItemGuid,
        /// New durability.
        durability: u32,
    },
    /// Money changed.
    MoneyChanged {
        /// New balance.
        balance: Money,
    },
    /// An item had nowhere to go and is handed to the mail collaborator.
    ItemMailed {
        /// The item, already detached from the inventory.
        item: Box<Item>,
    },
}

/// Ordered event queue.
#[derive(Debug, Default, Clone)]
pub struct EventOutbox {
    events: Vec<InventoryEvent>,
}

impl EventOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event.
    pub fn push(&mut self, event: InventoryEvent) {
        self.events.push(event);
    }

    /// Queues an equip error.
    pub fn equip_error(&mut self, error: InventoryError, item: Option<ItemGuid>, other: Option<ItemGuid>) {
        self.push(InventoryEvent::EquipError { error, item, other });
    }

    /// Pending events.
    #[must_use]
    pub fn pending(&self) -> &[InventoryEvent] {
        &self.events
    }

    /// Takes every pending event.
    pub fn drain(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
