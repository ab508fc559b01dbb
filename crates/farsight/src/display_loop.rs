//! # Display Loop
//!
//! One tick:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. RECEIVE                                                          │
//! │    └─ Drain every queued frame into the session                     │
//! │       (a malformed frame closes the connection)                     │
//! │                                                                     │
//! │ 2. LAYOUT                                                           │
//! │    ├─ Re-resolve bindings and repeaters from the root object        │
//! │    └─ Wanted sizes bottom-up, bounds top-down                       │
//! │                                                                     │
//! │ 3. PAINT                                                            │
//! │    └─ Record the frame's paint commands                             │
//! │                                                                     │
//! │ 4. SEND                                                             │
//! │    └─ Flush event callbacks and property changes to the provider    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reader thread never touches the session. Everything above runs on
//! the thread that owns the loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use farsight_net::{DisplayClient, HandshakeOutcome, NetError, NetResult, ResourceCache};
use farsight_shared::protocol::ConnectHeader;
use farsight_ui::{FixedMetrics, PointerEvent, RecordingPainter};
use tracing::{info, warn};

use crate::session::Session;

/// Target tick time for 60 ticks per second.
pub const TARGET_TICK_TIME: Duration = Duration::from_micros(16_666);

/// Configuration for the display loop.
#[derive(Clone, Debug)]
pub struct DisplayLoopConfig {
    /// Log ticks that exceed the budget.
    pub enable_timing_logs: bool,
    /// Target ticks per second for [`DisplayLoop::run`].
    pub target_tps: u32,
}

impl Default for DisplayLoopConfig {
    fn default() -> Self {
        Self {
            enable_timing_logs: false,
            target_tps: 60,
        }
    }
}

impl DisplayLoopConfig {
    fn tick_budget(&self) -> Duration {
        if self.target_tps == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(1) / self.target_tps
    }
}

/// Timing of one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    /// Total tick time in microseconds.
    pub total_us: u64,
    /// Frame draining and dispatch time in microseconds.
    pub receive_us: u64,
    /// Binding and layout time in microseconds.
    pub layout_us: u64,
    /// Paint time in microseconds.
    pub paint_us: u64,
    /// Tick number.
    pub tick: u64,
    /// Provider frames applied.
    pub frames_received: u32,
    /// Display messages sent.
    pub messages_sent: u32,
    /// Paint commands recorded.
    pub paint_commands: usize,
}

/// A connected display driving one session.
pub struct DisplayLoop {
    client: DisplayClient,
    session: Session,
    painter: RecordingPainter,
    metrics: FixedMetrics,
    config: DisplayLoopConfig,
    tick_count: u64,
    stats: TickStatsAccumulator,
}

impl DisplayLoop {
    /// Connects to a provider and prepares `session` with the synced resources.
    ///
    /// `cache` outlives the connection: on reconnect only resources whose
    /// content hash changed are transferred again.
    ///
    /// # Errors
    ///
    /// Fails on connect or handshake errors.
    pub fn connect(
        addr: SocketAddr,
        header: &ConnectHeader,
        cache: &mut ResourceCache,
        mut session: Session,
        config: DisplayLoopConfig,
    ) -> NetResult<(Self, HandshakeOutcome)> {
        let (client, outcome) = DisplayClient::connect(addr, header, cache)?;
        session.load_cache(cache);
        Ok((Self::new(client, session, config), outcome))
    }

    /// Wraps a client whose handshake is already done.
    #[must_use]
    pub fn new(client: DisplayClient, session: Session, config: DisplayLoopConfig) -> Self {
        Self {
            client,
            painter: RecordingPainter::new(session.screen()),
            session,
            metrics: FixedMetrics::default(),
            config,
            tick_count: 0,
            stats: TickStatsAccumulator::new(),
        }
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] once the provider has gone away, and the
    /// decode error of a malformed frame after closing the connection.
    pub fn tick(&mut self) -> NetResult<TickStats> {
        let start = Instant::now();
        let mut stats = TickStats {
            tick: self.tick_count,
            ..TickStats::default()
        };

        while let Some(frame) = self.client.try_recv()? {
            stats.frames_received += 1;
            if let Err(e) = self.session.handle_frame(&frame) {
                self.client.shutdown();
                return Err(NetError::Protocol(e));
            }
        }
        let received = Instant::now();

        self.session.update_layout(&self.metrics);
        let laid_out = Instant::now();

        self.painter.begin_frame();
        self.session.paint(&mut self.painter);
        stats.paint_commands = self.painter.command_count();
        let painted = Instant::now();

        stats.messages_sent = self.flush()?;

        stats.receive_us = micros(received - start);
        stats.layout_us = micros(laid_out - received);
        stats.paint_us = micros(painted - laid_out);
        stats.total_us = micros(start.elapsed());
        self.end_tick(stats);
        Ok(stats)
    }

    fn end_tick(&mut self, stats: TickStats) {
        self.tick_count += 1;
        self.stats.record(stats);
        if self.config.enable_timing_logs && stats.total_us > micros(self.config.tick_budget()) {
            warn!(
                "Tick {} exceeded budget: {:.2}ms",
                stats.tick,
                stats.total_us as f64 / 1000.0
            );
        }
    }

    /// Sends everything the session queued. Returns the number of messages.
    ///
    /// # Errors
    ///
    /// Fails if the connection is closed.
    pub fn flush(&mut self) -> NetResult<u32> {
        let mut sent = 0;
        for message in self.session.take_outbox() {
            self.client.send(&message)?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Routes a pointer event into the session. Resulting messages go out
    /// with the next tick or [`DisplayLoop::flush`].
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        self.session.pointer(event)
    }

    /// Ticks until `running` is cleared or the provider disconnects.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and malformed frames. A clean disconnect is `Ok`.
    pub fn run(&mut self, running: &AtomicBool) -> NetResult<()> {
        let budget = self.config.tick_budget();
        while running.load(Ordering::Relaxed) {
            let start = Instant::now();
            match self.tick() {
                Ok(_) => {}
                Err(NetError::Closed) => {
                    info!("Provider {} closed the session", self.client.peer_addr());
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            if let Some(rest) = budget.checked_sub(start.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        self.client.shutdown();
        Ok(())
    }

    /// Closes the connection.
    pub fn shutdown(&mut self) {
        self.client.shutdown();
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The session, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The painter holding the last tick's commands.
    #[must_use]
    pub const fn painter(&self) -> &RecordingPainter {
        &self.painter
    }

    /// Returns the number of completed ticks.
    #[inline]
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStatsAccumulator {
        &self.stats
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for tick statistics.
#[derive(Clone, Debug)]
pub struct TickStatsAccumulator {
    /// Total ticks recorded.
    pub ticks_recorded: u64,
    /// Sum of total tick times.
    pub total_us_sum: u64,
    /// Min tick time.
    pub min_tick_us: u64,
    /// Max tick time.
    pub max_tick_us: u64,
    /// Ticks that exceeded [`TARGET_TICK_TIME`].
    pub ticks_over_budget: u64,
    /// Provider frames applied.
    pub frames_received: u64,
    /// Display messages sent.
    pub messages_sent: u64,
}

impl TickStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks_recorded: 0,
            total_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            ticks_over_budget: 0,
            frames_received: 0,
            messages_sent: 0,
        }
    }

    /// Records a tick's statistics.
    pub fn record(&mut self, stats: TickStats) {
        self.ticks_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.min_tick_us = self.min_tick_us.min(stats.total_us);
        self.max_tick_us = self.max_tick_us.max(stats.total_us);
        self.frames_received += u64::from(stats.frames_received);
        self.messages_sent += u64::from(stats.messages_sent);
        if stats.total_us > micros(TARGET_TICK_TIME) {
            self.ticks_over_budget += 1;
        }
    }

    /// Returns average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.ticks_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.ticks_recorded as f64) / 1000.0
    }

    /// Returns the fraction of ticks over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.ticks_recorded == 0 {
            return 0.0;
        }
        self.ticks_over_budget as f64 / self.ticks_recorded as f64
    }

    /// Logs a one-line summary.
    pub fn log_summary(&self) {
        info!(
            "{} ticks, avg {:.3}ms, max {:.3}ms, {:.1}% over budget, {} frames in, {} messages out",
            self.ticks_recorded,
            self.avg_tick_ms(),
            self.max_tick_us as f64 / 1000.0,
            self.over_budget_ratio() * 100.0,
            self.frames_received,
            self.messages_sent
        );
    }
}

impl Default for TickStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
