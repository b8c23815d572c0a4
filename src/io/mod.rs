//! # Event loop
//!
//! A single-threaded, non-preemptive scheduler for bare-metal targets. One
//! [`EventLoop`] owns every handle and polls its subsystems in a fixed order
//! on each tick:
//!
//! ```text
//! ┌────────────┐   ┌─────────┐   ┌────────────┐   ┌─────────┐   ┌──────────────┐   ┌────────┐   ┌──────────────┐
//! │ clock.now()│──▶│ timers  │──▶│ line input │──▶│ watches │──▶│ buffered read│──▶│ idle   │──▶│ close sweep  │
//! └────────────┘   └─────────┘   └────────────┘   └─────────┘   └──────────────┘   └────────┘   └──────────────┘
//! ```
//!
//! Callbacks run synchronously on the loop thread during the pass that
//! triggers them. They receive the loop itself and may start, stop or close
//! any handle, including handles of the list currently being walked.
//!
//! # Handle lifecycle
//!
//! Handles are created inert by a `*_init` call, which hands back a
//! [`HandleId`]. `*_start` marks the handle active and registers it with its
//! subsystem; `*_stop` reverses that. [`EventLoop::close`] queues the handle
//! for the sweep at the end of the tick, which frees the record and then
//! invokes the close callback.
//!
//! `close` does not unregister the handle from its subsystem. Owners stop a
//! handle before closing it. A handle closed while still registered keeps
//! being polled until the sweep frees it, and the sweep then drops it from
//! its list.
//!
//! # Examples
//!
//! ```rust
//! use ioloop::port::{ByteSource, Clock, DigitalIo, Instant, Level, Pin, PinMode};
//! use ioloop::{EventLoop, HandleId};
//!
//! #[derive(Default)]
//! struct Board {
//!     ticks: Instant,
//!     blinks: u32,
//! }
//!
//! impl Clock for Board {
//!     fn now(&mut self) -> Instant { self.ticks }
//! }
//! impl DigitalIo for Board {
//!     fn configure(&mut self, _pin: Pin, _mode: PinMode) {}
//!     fn read(&mut self, _pin: Pin) -> Level { Level::Low }
//! }
//! impl ByteSource for Board {
//!     fn has_data(&mut self) -> bool { false }
//!     fn pending_count(&mut self) -> usize { 0 }
//!     fn read_one(&mut self) -> u8 { 0 }
//! }
//!
//! fn blink(lp: &mut EventLoop<Board>, _id: HandleId) {
//!     lp.platform_mut().blinks += 1;
//! }
//!
//! let mut lp: EventLoop<Board> = EventLoop::new(Board::default());
//! let timer = lp.timer_init().unwrap();
//! lp.timer_start(timer, Some(blink), 500, true).unwrap();
//!
//! for ticks in [250, 501, 1001] {
//!     lp.platform_mut().ticks = ticks;
//!     lp.tick();
//! }
//! assert_eq!(lp.platform().blinks, 2);
//! ```

use core::fmt;

use heapless::FnvIndexMap;

use crate::error::Error;
use crate::port::{Instant, Platform};

mod handle;
mod idle;
mod list;
mod poll;
mod timer;
mod tty;
mod watch;

#[cfg(test)]
mod tests;

pub use handle::{Flags, Handle, HandleId, Kind};
pub use idle::Idle;
pub use list::List;
pub use poll::BufferedRead;
pub use timer::Timer;
pub use tty::LineInput;
pub use watch::{TriggerMode, Watch};

/// Default number of handles a loop can hold. Must be a power of two.
pub const DEFAULT_CAPACITY: usize = 16;

/// Callback of a [`Timer`].
pub type TimerFn<P, const N: usize> = fn(&mut EventLoop<P, N>, HandleId);
/// Callback of a [`Watch`].
pub type WatchFn<P, const N: usize> = fn(&mut EventLoop<P, N>, HandleId);
/// Callback of a [`LineInput`], invoked once per received byte.
pub type TtyFn<P, const N: usize> = fn(&mut EventLoop<P, N>, HandleId, u8);
/// Callback of a [`BufferedRead`].
pub type PollFn<P, const N: usize> = fn(&mut EventLoop<P, N>, HandleId);
/// Callback of an [`Idle`] handle.
pub type IdleFn<P, const N: usize> = fn(&mut EventLoop<P, N>, HandleId);
/// Callback invoked by the close sweep with the freed handle record.
pub type CloseFn<P, const N: usize> = fn(&mut EventLoop<P, N>, Handle<P, N>);

/// Handle record stored in the loop's table.
pub(crate) enum Entry<P, const N: usize> {
    Timer(Timer<P, N>),
    LineInput(LineInput<P, N>),
    Watch(Watch<P, N>),
    BufferedRead(BufferedRead<P, N>),
    Idle(Idle<P, N>),
}

impl<P, const N: usize> Entry<P, N> {
    pub(crate) fn base(&self) -> &Handle<P, N> {
        match self {
            Entry::Timer(timer) => &timer.base,
            Entry::LineInput(tty) => &tty.base,
            Entry::Watch(watch) => &watch.base,
            Entry::BufferedRead(poll) => &poll.base,
            Entry::Idle(idle) => &idle.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut Handle<P, N> {
        match self {
            Entry::Timer(timer) => &mut timer.base,
            Entry::LineInput(tty) => &mut tty.base,
            Entry::Watch(watch) => &mut watch.base,
            Entry::BufferedRead(poll) => &mut poll.base,
            Entry::Idle(idle) => &mut idle.base,
        }
    }
}

pub(crate) type Table<P, const N: usize> = FnvIndexMap<HandleId, Entry<P, N>, N>;

/// The event loop context.
///
/// Owns the platform collaborators, the cached tick time, every handle
/// record and the per-kind membership lists. `N` bounds the number of live
/// handles across all kinds and must be a power of two.
pub struct EventLoop<P, const N: usize = DEFAULT_CAPACITY> {
    platform: P,
    time: Instant,
    stop_flag: bool,
    next_id: u64,
    handles: Table<P, N>,
    timers: List<N>,
    ttys: List<N>,
    watches: List<N>,
    polls: List<N>,
    idles: List<N>,
    closing: List<N>,
}

impl<P: Platform, const N: usize> EventLoop<P, N> {
    /// Creates an empty loop around `platform`.
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            time: 0,
            stop_flag: false,
            next_id: 0,
            handles: FnvIndexMap::new(),
            timers: List::new(),
            ttys: List::new(),
            watches: List::new(),
            polls: List::new(),
            idles: List::new(),
            closing: List::new(),
        }
    }

    /// Resets every list, drops every handle record and clears the stop flag.
    ///
    /// The identity counter keeps counting so ids handed out before the
    /// reset are never reissued.
    pub fn init(&mut self) {
        self.stop_flag = false;
        self.handles.clear();
        self.timers.clear();
        self.ttys.clear();
        self.watches.clear();
        self.polls.clear();
        self.idles.clear();
        self.closing.clear();
        debug!("loop initialised");
    }

    /// Runs ticks forever.
    ///
    /// Never returns. [`Clock::relax`](crate::port::Clock::relax) is called
    /// after each tick; the stop flag is not consulted.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
            self.platform.relax();
        }
    }

    /// Performs one tick: refresh the cached time, run every subsystem pass
    /// in order, then sweep closing handles.
    pub fn tick(&mut self) {
        self.update_time();
        self.run_timers();
        self.run_ttys();
        self.run_watches();
        self.run_polls();
        self.run_idles();
        self.run_closing();
    }

    /// Time cached at the start of the current tick.
    pub fn now(&self) -> Instant {
        self.time
    }

    /// Shared access to the platform collaborators.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Exclusive access to the platform collaborators.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Sets the stop flag. [`run`](Self::run) does not observe it.
    pub fn request_stop(&mut self) {
        self.stop_flag = true;
    }

    /// Returns `true` once [`request_stop`](Self::request_stop) was called
    /// since the last [`init`](Self::init).
    pub fn stop_requested(&self) -> bool {
        self.stop_flag
    }

    /// Queues `id` for the close sweep and stores its close callback.
    ///
    /// The callback is never invoked from inside this call. The handle stays
    /// registered with its subsystem; stop it first. Closing a handle that
    /// is already closing is ignored.
    pub fn close(&mut self, id: HandleId, close_cb: Option<CloseFn<P, N>>) -> Result<(), Error> {
        let base = self
            .handles
            .get_mut(&id)
            .ok_or(Error::InvalidHandle)?
            .base_mut();
        if base.is_closing() {
            warn!("handle {} closed twice", id);
            return Ok(());
        }
        if base.is_active() {
            warn!("handle {} closed while still active", id);
        }
        self.closing.append(id)?;
        base.flags.set(Flags::CLOSING);
        base.close_cb = close_cb;
        trace!("handle {} closing", id);
        Ok(())
    }

    /// Looks `id` up by scanning the active list of `kind`.
    pub fn get_by_identity(&self, id: HandleId, kind: Kind) -> Option<&Handle<P, N>> {
        self.list(kind)
            .iter()
            .find(|&member| member == id)
            .and_then(|member| self.handles.get(&member))
            .map(Entry::base)
    }

    /// Base record of any live handle, registered or not.
    pub fn handle(&self, id: HandleId) -> Option<&Handle<P, N>> {
        self.handles.get(&id).map(Entry::base)
    }

    /// Number of live handle records, including those pending close.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Membership list of `kind`.
    pub fn list(&self, kind: Kind) -> &List<N> {
        match kind {
            Kind::Timer => &self.timers,
            Kind::LineInput => &self.ttys,
            Kind::Watch => &self.watches,
            Kind::BufferedRead => &self.polls,
            Kind::Idle => &self.idles,
        }
    }

    /// Handles queued for the next close sweep.
    pub fn closing(&self) -> &List<N> {
        &self.closing
    }

    /// Stops and closes every handle of `kind` without close callbacks.
    ///
    /// Used when tearing down a script runtime while keeping other kinds
    /// (typically the console input) alive.
    pub fn cleanup(&mut self, kind: Kind) {
        while let Some(id) = self.list_mut(kind).pop_front() {
            if let Some(entry) = self.handles.get_mut(&id) {
                entry.base_mut().flags.clear(Flags::ACTIVE);
            }
            match self.close(id, None) {
                // Already swept.
                Ok(()) | Err(Error::InvalidHandle) => {}
                Err(err) => debug!("cleanup could not close {}: {}", id, err),
            }
        }
        debug!("cleaned up {:?} handles", kind);
    }

    fn list_mut(&mut self, kind: Kind) -> &mut List<N> {
        match kind {
            Kind::Timer => &mut self.timers,
            Kind::LineInput => &mut self.ttys,
            Kind::Watch => &mut self.watches,
            Kind::BufferedRead => &mut self.polls,
            Kind::Idle => &mut self.idles,
        }
    }

    /// Inserts a fresh record built by `make` under the next identity.
    pub(crate) fn register(
        &mut self,
        kind: Kind,
        make: impl FnOnce(Handle<P, N>) -> Entry<P, N>,
    ) -> Result<HandleId, Error> {
        if self.handles.len() >= N {
            return Err(Error::Full);
        }
        let id = HandleId(self.next_id);
        self.handles
            .insert(id, make(Handle::new(id, kind)))
            .map_err(|_| Error::Full)?;
        self.next_id += 1;
        trace!("handle {} init as {:?}", id, kind);
        Ok(id)
    }

    /// Marks `id` active and appends it to the list of `kind`.
    pub(crate) fn activate(&mut self, id: HandleId, kind: Kind) -> Result<(), Error> {
        self.list_mut(kind).append(id)?;
        if let Some(entry) = self.handles.get_mut(&id) {
            entry.base_mut().flags.set(Flags::ACTIVE);
        }
        Ok(())
    }

    /// Clears the active flag of `id` and removes it from the list of `kind`.
    pub(crate) fn deactivate(&mut self, id: HandleId, kind: Kind) {
        if let Some(entry) = self.handles.get_mut(&id) {
            entry.base_mut().flags.clear(Flags::ACTIVE);
        }
        self.list_mut(kind).remove(id);
    }

    /// Returns `true` while `id` is a member of `kind`'s list and active.
    ///
    /// Passes re-check this before each dispatch so a handle stopped by an
    /// earlier callback in the same pass is skipped.
    pub(crate) fn is_armed(&self, id: HandleId, kind: Kind) -> bool {
        self.list(kind).contains(id)
            && self
                .handles
                .get(&id)
                .is_some_and(|entry| entry.base().is_active())
    }

    fn update_time(&mut self) {
        self.time = self.platform.now();
    }

    fn run_closing(&mut self) {
        while let Some(id) = self.closing.pop_front() {
            let Some(entry) = self.handles.remove(&id) else {
                continue;
            };
            let handle = *entry.base();
            // Covers handles closed while registered, including fired one-shots.
            self.list_mut(handle.kind).remove(id);
            trace!("handle {} closed", id);
            if let Some(close_cb) = handle.close_cb {
                close_cb(self, handle);
            }
        }
    }
}

impl<P: fmt::Debug, const N: usize> fmt::Debug for EventLoop<P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("platform", &self.platform)
            .field("time", &self.time)
            .field("stop_flag", &self.stop_flag)
            .field("handles", &self.handles.len())
            .field("timers", &self.timers)
            .field("ttys", &self.ttys)
            .field("watches", &self.watches)
            .field("polls", &self.polls)
            .field("idles", &self.idles)
            .field("closing", &self.closing)
            .finish()
    }
}
