//! Operator Messages (STATUSTEXT)
//!
//! The mission protocol tells the operator about things the ACK codes cannot
//! express: a MAVLink 1 peer trying to move fences, a GCS still using the
//! deprecated float item messages, a finished or abandoned flight plan.
//! Those texts are queued here and flushed to every link on the next tick.
//!
//! # Architecture
//!
//! - **Global static**: one queue shared by all sessions, guarded by a
//!   critical section
//! - **Heapless queue**: 16 messages, oldest dropped on overflow
//! - **MAVLink 2 chunking**: texts up to 200 characters are split into
//!   50-byte STATUSTEXT chunks sharing one id

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::{Deque, String, Vec};
use mavlink::common::{MavSeverity, STATUSTEXT_DATA};

/// Maximum message length (characters)
const MAX_MESSAGE_LEN: usize = 200;

/// Queue capacity (messages)
const QUEUE_CAPACITY: usize = 16;

/// Text bytes per STATUSTEXT message
const CHUNK_SIZE: usize = 50;

/// Chunks per message (200 / 50)
const MAX_CHUNKS: usize = 4;

/// Chunks handed out per flush
pub const MAX_PENDING_CHUNKS: usize = 32;

#[derive(Debug)]
struct QueuedMessage {
    severity: MavSeverity,
    text: String<MAX_MESSAGE_LEN>,
}

struct StatusNotifier {
    queue: Deque<QueuedMessage, QUEUE_CAPACITY>,
    next_chunk_id: u16,
    dropped_count: u32,
}

impl StatusNotifier {
    const fn new() -> Self {
        Self {
            queue: Deque::new(),
            next_chunk_id: 1, // 0 is reserved for unchunked messages
            dropped_count: 0,
        }
    }

    fn enqueue(&mut self, severity: MavSeverity, text: &str) {
        let mut end = text.len().min(MAX_MESSAGE_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut stored = String::new();
        let _ = stored.push_str(&text[..end]);

        if self.queue.is_full() {
            self.queue.pop_front();
            self.dropped_count += 1;
            crate::log_warn!("STATUSTEXT queue full, dropped {} messages", self.dropped_count);
        }
        let _ = self.queue.push_back(QueuedMessage {
            severity,
            text: stored,
        });
    }

    fn take_chunk_id(&mut self) -> u16 {
        let id = self.next_chunk_id;
        self.next_chunk_id = self.next_chunk_id.wrapping_add(1).max(1);
        id
    }
}

static NOTIFIER: Mutex<RefCell<StatusNotifier>> = Mutex::new(RefCell::new(StatusNotifier::new()));

/// Queue a WARNING severity message
pub fn send_warning(text: &str) {
    send_statustext(MavSeverity::MAV_SEVERITY_WARNING, text);
}

/// Queue an INFO severity message
pub fn send_info(text: &str) {
    send_statustext(MavSeverity::MAV_SEVERITY_INFO, text);
}

fn send_statustext(severity: MavSeverity, text: &str) {
    critical_section::with(|cs| NOTIFIER.borrow(cs).borrow_mut().enqueue(severity, text));
}

/// Number of queued (unchunked) messages
pub fn pending_count() -> usize {
    critical_section::with(|cs| NOTIFIER.borrow(cs).borrow().queue.len())
}

/// Messages lost to queue overflow since start
pub fn dropped_count() -> u32 {
    critical_section::with(|cs| NOTIFIER.borrow(cs).borrow().dropped_count)
}

/// Drain queued messages as ready-to-send STATUSTEXT chunks.
///
/// Messages that do not fit in this call's output stay queued for the next.
pub fn take_pending_statustext_messages() -> Vec<STATUSTEXT_DATA, MAX_PENDING_CHUNKS> {
    critical_section::with(|cs| {
        let mut notifier = NOTIFIER.borrow(cs).borrow_mut();
        let mut result = Vec::new();

        while let Some(front) = notifier.queue.front() {
            let chunks_needed = chunk_count(front.text.len());
            if result.len() + chunks_needed > MAX_PENDING_CHUNKS {
                break;
            }
            let Some(message) = notifier.queue.pop_front() else {
                break;
            };
            let id = if chunks_needed > 1 {
                notifier.take_chunk_id()
            } else {
                0
            };
            for chunk in chunk_message(message.severity, message.text.as_str(), id) {
                let _ = result.push(chunk);
            }
        }

        result
    })
}

/// Forget every queued message and reset counters.
pub fn reset() {
    critical_section::with(|cs| *NOTIFIER.borrow(cs).borrow_mut() = StatusNotifier::new());
}

fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_SIZE).clamp(1, MAX_CHUNKS)
}

/// Split `text` into STATUSTEXT chunks tagged with `id` (0 when it fits in one).
fn chunk_message(severity: MavSeverity, text: &str, id: u16) -> Vec<STATUSTEXT_DATA, MAX_CHUNKS> {
    let bytes = text.as_bytes();
    let len = bytes.len().min(MAX_MESSAGE_LEN);
    let mut chunks = Vec::new();

    for chunk_seq in 0..chunk_count(len) {
        let start = chunk_seq * CHUNK_SIZE;
        let end = (start + CHUNK_SIZE).min(len);
        let mut text_bytes = [0u8; CHUNK_SIZE];
        text_bytes[..end - start].copy_from_slice(&bytes[start..end]);

        let _ = chunks.push(STATUSTEXT_DATA {
            severity,
            text: text_bytes.into(),
            id,
            chunk_seq: chunk_seq as u8,
        });
    }

    chunks
}
