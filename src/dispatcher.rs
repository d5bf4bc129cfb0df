//! Periodic capture → assemble → deliver loop.
//!
//! The dispatcher owns the tick schedule. Deliveries run on their own threads
//! so a slow webhook never delays the next tick. A failed primary POST is
//! handed to the relay exactly once over the bus.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::sync::broadcast::Sender;

use crate::config::DispatchConfig;
use crate::now_playing::{NowPlayingAssembler, NowPlayingPayload};
use crate::page_source::PageSource;
use crate::protocol::{Message, RelayRequest};
use crate::transport::WebhookTransport;

/// Posts `payload`, falling back to one relay request on failure.
/// Returns whether the primary delivery succeeded.
pub fn deliver(
    transport: &dyn WebhookTransport,
    bus_producer: &Sender<Message>,
    payload: NowPlayingPayload,
) -> bool {
    match transport.post_json(&payload) {
        Ok(()) => true,
        Err(error) => {
            debug!("Dispatcher: primary delivery failed, relaying: {}", error);
            let request = RelayRequest::PostNowPlaying { payload };
            if bus_producer.send(Message::Relay(request)).is_err() {
                warn!("Dispatcher: relay unavailable, dropping payload");
            }
            false
        }
    }
}

/// Fixed-rate tick loop feeding the webhook.
pub struct Dispatcher {
    page_source: Box<dyn PageSource>,
    assembler: NowPlayingAssembler,
    transport: Arc<dyn WebhookTransport>,
    bus_producer: Sender<Message>,
    warmup: Duration,
    interval: Duration,
}

impl Dispatcher {
    pub fn new(
        page_source: Box<dyn PageSource>,
        assembler: NowPlayingAssembler,
        transport: Arc<dyn WebhookTransport>,
        bus_producer: Sender<Message>,
        dispatch: &DispatchConfig,
    ) -> Self {
        Self {
            page_source,
            assembler,
            transport,
            bus_producer,
            warmup: Duration::from_millis(dispatch.warmup_ms),
            interval: Duration::from_millis(dispatch.interval_ms),
        }
    }

    /// Runs one capture/assemble pass and starts its delivery.
    ///
    /// Returns the delivery thread, or `None` when the page could not be
    /// captured.
    pub fn tick(&mut self) -> Option<JoinHandle<bool>> {
        let page = match self.page_source.capture() {
            Ok(page) => page,
            Err(error) => {
                debug!("Dispatcher: skipping tick: {}", error);
                return None;
            }
        };
        let snapshot = self.assembler.assemble(&page);
        debug!(
            "Dispatcher: {} by {} at {}/{} ({:.1}%)",
            snapshot.song_name,
            snapshot.artist,
            snapshot.current_timestamp,
            snapshot.end_timestamp,
            snapshot.progress_pct
        );

        let payload = NowPlayingPayload::from(&snapshot);
        let transport = Arc::clone(&self.transport);
        let bus_producer = self.bus_producer.clone();
        Some(thread::spawn(move || {
            deliver(transport.as_ref(), &bus_producer, payload)
        }))
    }

    fn guarded_tick(&mut self) {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.tick();
        }));
        if let Err(payload) = result {
            error!(
                "Dispatcher: tick panicked: {}",
                crate::panic_payload_to_string(payload.as_ref())
            );
        }
    }

    /// Starts the unbounded tick loop. Never returns.
    pub fn run(&mut self) {
        info!(
            "Dispatcher: started (warmup={}ms, interval={}ms)",
            self.warmup.as_millis(),
            self.interval.as_millis()
        );
        thread::sleep(self.warmup);
        let mut next_tick = Instant::now();
        loop {
            self.guarded_tick();
            next_tick += self.interval;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                // Fell behind; restart the schedule instead of bursting.
                next_tick = now;
            }
        }
    }
}
