//! SoftAP event plumbing shared between the radio event callbacks and the
//! dispatch loop.
//!
//! Radio events arrive on the driver's context; the dispatch future drains
//! them at its own cadence. The queue is bounded and guarded by a critical
//! section, with an overflow counter instead of blocking.

use core::{cell::RefCell, fmt};
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;
use heapless::Deque;
use timekeeper_core::state::Mac;

/// Access-point parameters, fixed at compile time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SoftApConfig {
    pub ssid: &'static str,
    /// WPA2 requires at least 8 characters; shorter would silently fall
    /// back to an open network, so the binary asserts the length.
    pub psk: &'static str,
    pub channel: u8,
    pub max_connections: u16,
}

impl SoftApConfig {
    pub const fn new(
        ssid: &'static str,
        psk: &'static str,
        channel: u8,
        max_connections: u16,
    ) -> Self {
        Self {
            ssid,
            psk,
            channel,
            max_connections,
        }
    }
}

/// Station association lifecycle, as delivered by the access point. Events
/// for a single station are ordered: connect always precedes disconnect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApEvent {
    StaConnected { mac: Mac, aid: u16 },
    StaDisconnected { mac: Mac, aid: u16 },
}

const AP_EVENT_QUEUE_DEPTH: usize = 8;

/// Bounded SPSC-ish queue between radio callbacks and the dispatcher.
pub struct ApEventQueue {
    events: Mutex<RefCell<Deque<ApEvent, AP_EVENT_QUEUE_DEPTH>>>,
    dropped: AtomicU32,
}

impl ApEventQueue {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(RefCell::new(Deque::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueues from the radio callback context. On overflow the newest
    /// event is dropped and counted.
    pub fn push(&self, event: ApEvent) {
        let overflowed = critical_section::with(|cs| {
            self.events.borrow_ref_mut(cs).push_back(event).is_err()
        });
        if overflowed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn pop(&self) -> Option<ApEvent> {
        critical_section::with(|cs| self.events.borrow_ref_mut(cs).pop_front())
    }

    /// Returns and clears the overflow count.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl Default for ApEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// `aa:bb:cc:dd:ee:ff` formatting for log lines.
pub struct MacDisplay(pub Mac);

impl fmt::Display for MacDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}
