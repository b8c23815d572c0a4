//! Scripted board shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use ioloop::port::{ByteSource, Clock, DigitalIo, Instant, Level, Pin, PinMode};
use ioloop::{EventLoop, HandleId};

/// What a callback observed, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Timer(HandleId, Instant),
    Watch(HandleId, Level, Instant),
    Byte(HandleId, u8),
}

#[derive(Debug, Default)]
pub struct MockBoard {
    pub now: Instant,
    pub pins: [Option<Level>; 16],
    pub configured: Vec<(Pin, PinMode)>,
    pub rx: VecDeque<u8>,
    pub fired: Vec<Fired>,
}

impl MockBoard {
    pub fn set_pin(&mut self, pin: Pin, level: Level) {
        self.pins[pin as usize] = Some(level);
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl Clock for MockBoard {
    fn now(&mut self) -> Instant {
        self.now
    }
}

impl DigitalIo for MockBoard {
    fn configure(&mut self, pin: Pin, mode: PinMode) {
        self.configured.push((pin, mode));
    }

    fn read(&mut self, pin: Pin) -> Level {
        self.pins[pin as usize].unwrap_or(Level::Low)
    }
}

impl ByteSource for MockBoard {
    fn has_data(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn pending_count(&mut self) -> usize {
        self.rx.len()
    }

    fn read_one(&mut self) -> u8 {
        self.rx.pop_front().expect("read_one called on empty source")
    }
}

pub type Loop = EventLoop<MockBoard>;

pub fn new_loop() -> Loop {
    EventLoop::new(MockBoard::default())
}

/// Advances the scripted clock to `now` and runs one tick.
pub fn tick_at(lp: &mut Loop, now: Instant) {
    lp.platform_mut().now = now;
    lp.tick();
}

pub fn record_timer(lp: &mut Loop, id: HandleId) {
    let now = lp.now();
    lp.platform_mut().fired.push(Fired::Timer(id, now));
}

pub fn record_watch(lp: &mut Loop, id: HandleId) {
    let now = lp.now();
    let level = lp.watch(id).map(|w| w.stable).expect("watch record");
    lp.platform_mut().fired.push(Fired::Watch(id, level, now));
}

pub fn record_byte(lp: &mut Loop, id: HandleId, byte: u8) {
    lp.platform_mut().fired.push(Fired::Byte(id, byte));
}

pub fn fired(lp: &Loop) -> &[Fired] {
    &lp.platform().fired
}
