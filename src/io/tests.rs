use heapless::{Deque, Vec};

use super::*;
use crate::port::{ByteSource, Clock, DigitalIo, Level, Pin, PinMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Timer(HandleId),
    Idle(HandleId),
    Closed(HandleId, Kind),
}

struct MockBoard {
    now: Instant,
    pins: [Level; 8],
    rx: Deque<u8, 16>,
    events: Vec<Event, 32>,
    victim: Option<HandleId>,
}

impl MockBoard {
    fn new() -> Self {
        Self {
            now: 0,
            pins: [Level::Low; 8],
            rx: Deque::new(),
            events: Vec::new(),
            victim: None,
        }
    }
}

impl Clock for MockBoard {
    fn now(&mut self) -> Instant {
        self.now
    }
}

impl DigitalIo for MockBoard {
    fn configure(&mut self, _pin: Pin, _mode: PinMode) {}

    fn read(&mut self, pin: Pin) -> Level {
        self.pins[pin as usize]
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
        self.rx.pop_front().unwrap_or(0)
    }
}

type Loop = EventLoop<MockBoard, 8>;

fn new_loop() -> Loop {
    EventLoop::new(MockBoard::new())
}

fn tick_at(lp: &mut Loop, now: Instant) {
    lp.platform_mut().now = now;
    lp.tick();
}

fn record_timer(lp: &mut Loop, id: HandleId) {
    lp.platform_mut().events.push(Event::Timer(id)).unwrap();
}

fn record_idle(lp: &mut Loop, id: HandleId) {
    lp.platform_mut().events.push(Event::Idle(id)).unwrap();
}

fn record_close(lp: &mut Loop, handle: Handle<MockBoard, 8>) {
    lp.platform_mut()
        .events
        .push(Event::Closed(handle.id, handle.kind))
        .unwrap();
}

fn stop_victim(lp: &mut Loop, id: HandleId) {
    record_timer(lp, id);
    if let Some(victim) = lp.platform_mut().victim.take() {
        lp.timer_stop(victim).unwrap();
    }
}

fn close_victim(lp: &mut Loop, handle: Handle<MockBoard, 8>) {
    record_close(lp, handle);
    if let Some(victim) = lp.platform_mut().victim.take() {
        lp.close(victim, Some(record_close)).unwrap();
    }
}

fn close_self(lp: &mut EventLoop<MockBoard, 4>, id: HandleId) {
    lp.close(id, None).unwrap();
}

fn spawn_timer(lp: &mut Loop, id: HandleId) {
    record_timer(lp, id);
    let spawned = lp.timer_init().unwrap();
    lp.timer_start(spawned, Some(record_timer), 0, false).unwrap();
    lp.platform_mut().victim = Some(spawned);
}

fn spawn_idle(lp: &mut Loop, id: HandleId) {
    record_idle(lp, id);
    if lp.platform().victim.is_none() {
        let spawned = lp.idle_init().unwrap();
        lp.idle_start(spawned, Some(record_idle)).unwrap();
        lp.platform_mut().victim = Some(spawned);
    }
}

#[test]
fn close_defers_callback_to_sweep() {
    let mut lp = new_loop();
    let id = lp.timer_init().unwrap();

    lp.close(id, Some(record_close)).unwrap();
    assert!(lp.platform().events.is_empty());
    assert!(lp.handle(id).unwrap().is_closing());
    assert!(lp.closing().contains(id));

    tick_at(&mut lp, 1);
    assert_eq!(lp.platform().events.as_slice(), &[Event::Closed(id, Kind::Timer)]);
    assert!(lp.handle(id).is_none());
    assert!(lp.closing().is_empty());
    assert_eq!(lp.handle_count(), 0);
}

#[test]
fn close_twice_is_ignored() {
    let mut lp = new_loop();
    let id = lp.idle_init().unwrap();

    lp.close(id, Some(record_close)).unwrap();
    lp.close(id, None).unwrap();
    assert_eq!(lp.closing().len(), 1);

    tick_at(&mut lp, 1);
    assert_eq!(lp.platform().events.as_slice(), &[Event::Closed(id, Kind::Idle)]);
}

#[test]
fn close_unknown_handle() {
    let mut lp = new_loop();
    assert_eq!(lp.close(HandleId(99), None), Err(Error::InvalidHandle));
}

#[test]
fn sweep_drains_handles_closed_by_close_callbacks() {
    let mut lp = new_loop();
    let first = lp.timer_init().unwrap();
    let second = lp.watch_init().unwrap();
    lp.platform_mut().victim = Some(second);

    lp.close(first, Some(close_victim)).unwrap();
    tick_at(&mut lp, 1);

    assert_eq!(
        lp.platform().events.as_slice(),
        &[
            Event::Closed(first, Kind::Timer),
            Event::Closed(second, Kind::Watch)
        ]
    );
    assert_eq!(lp.handle_count(), 0);
}

#[test]
fn callback_stopping_later_timer_skips_it_in_same_pass() {
    let mut lp = new_loop();
    let first = lp.timer_init().unwrap();
    let second = lp.timer_init().unwrap();
    lp.timer_start(first, Some(stop_victim), 10, false).unwrap();
    lp.timer_start(second, Some(record_timer), 10, false).unwrap();
    lp.platform_mut().victim = Some(second);

    tick_at(&mut lp, 11);

    assert_eq!(lp.platform().events.as_slice(), &[Event::Timer(first)]);
    assert!(!lp.list(Kind::Timer).contains(second));
    assert!(!lp.handle(second).unwrap().is_active());
}

#[test]
fn closed_while_registered_is_polled_until_sweep() {
    let mut lp = new_loop();
    let id = lp.timer_init().unwrap();
    lp.timer_start(id, Some(record_timer), 0, true).unwrap();

    lp.close(id, None).unwrap();
    assert!(lp.list(Kind::Timer).contains(id));

    tick_at(&mut lp, 1);
    assert_eq!(lp.platform().events.as_slice(), &[Event::Timer(id)]);
    assert!(lp.handle(id).is_none());
    assert!(lp.list(Kind::Timer).is_empty());

    tick_at(&mut lp, 2);
    assert_eq!(lp.platform().events.len(), 1);
}

#[test]
fn closing_fired_one_shot_frees_its_list_slot() {
    let mut lp: EventLoop<MockBoard, 4> = EventLoop::new(MockBoard::new());
    let id = lp.timer_init().unwrap();
    lp.timer_start(id, Some(close_self), 5, false).unwrap();

    lp.platform_mut().now = 6;
    lp.tick();
    assert!(lp.handle(id).is_none());
    assert!(lp.list(Kind::Timer).is_empty());

    for _ in 0..4 {
        let timer = lp.timer_init().unwrap();
        lp.timer_start(timer, None, 100, false).unwrap();
    }
    assert_eq!(lp.handle_count(), 4);
    assert_eq!(lp.list(Kind::Timer).len(), 4);
}

#[test]
fn timer_started_from_callback_waits_for_next_tick() {
    let mut lp = new_loop();
    let first = lp.timer_init().unwrap();
    lp.timer_start(first, Some(spawn_timer), 10, false).unwrap();

    tick_at(&mut lp, 11);
    let spawned = lp.platform().victim.unwrap();
    assert_eq!(lp.platform().events.as_slice(), &[Event::Timer(first)]);
    assert!(lp.list(Kind::Timer).contains(spawned));
    assert_eq!(lp.timer(spawned).unwrap().deadline, 11);

    tick_at(&mut lp, 12);
    assert_eq!(
        lp.platform().events.as_slice(),
        &[Event::Timer(first), Event::Timer(spawned)]
    );
}

#[test]
fn idle_started_from_idle_callback_waits_for_next_tick() {
    let mut lp = new_loop();
    let first = lp.idle_init().unwrap();
    lp.idle_start(first, Some(spawn_idle)).unwrap();

    tick_at(&mut lp, 1);
    let spawned = lp.platform().victim.unwrap();
    assert_eq!(lp.platform().events.as_slice(), &[Event::Idle(first)]);
    assert!(lp.list(Kind::Idle).contains(spawned));

    tick_at(&mut lp, 2);
    assert_eq!(
        lp.platform().events.as_slice(),
        &[Event::Idle(first), Event::Idle(first), Event::Idle(spawned)]
    );
}

#[test]
fn identities_survive_init() {
    let mut lp = new_loop();
    assert_eq!(lp.timer_init().unwrap().get(), 0);
    assert_eq!(lp.tty_init().unwrap().get(), 1);

    lp.request_stop();
    lp.init();
    assert_eq!(lp.handle_count(), 0);
    assert!(!lp.stop_requested());
    assert_eq!(lp.watch_init().unwrap().get(), 2);
}

#[test]
fn table_full() {
    let mut lp: EventLoop<MockBoard, 4> = EventLoop::new(MockBoard::new());
    for _ in 0..4 {
        lp.timer_init().unwrap();
    }
    assert_eq!(lp.idle_init(), Err(Error::Full));

    // Identities are only consumed by successful inits.
    let freed = HandleId(0);
    lp.close(freed, None).unwrap();
    lp.tick();
    assert_eq!(lp.idle_init().unwrap().get(), 4);
}

#[test]
fn wrong_kind_and_unknown_ids() {
    let mut lp = new_loop();
    let timer = lp.timer_init().unwrap();

    assert_eq!(
        lp.watch_start(timer, None, 0, TriggerMode::OnChange, 0),
        Err(Error::WrongKind)
    );
    assert_eq!(lp.tty_start(timer, None), Err(Error::WrongKind));
    assert_eq!(lp.timer_stop(HandleId(42)), Err(Error::InvalidHandle));
    assert!(lp.watch(timer).is_none());
    assert!(lp.timer(timer).is_some());
}

#[test]
fn get_by_identity_scans_kind_list() {
    let mut lp = new_loop();
    let id = lp.timer_init().unwrap();
    assert!(lp.get_by_identity(id, Kind::Timer).is_none());

    lp.timer_start(id, None, 5, false).unwrap();
    assert_eq!(lp.get_by_identity(id, Kind::Timer).map(|h| h.id), Some(id));
    assert!(lp.get_by_identity(id, Kind::Watch).is_none());
    assert!(lp.timer_get_by_id(id).is_some());

    lp.timer_stop(id).unwrap();
    assert!(lp.timer_get_by_id(id).is_none());
}

#[test]
fn cleanup_closes_every_handle_of_kind() {
    let mut lp = new_loop();
    let a = lp.timer_init().unwrap();
    let b = lp.timer_init().unwrap();
    let idle = lp.idle_init().unwrap();
    lp.timer_start(a, Some(record_timer), 1, true).unwrap();
    lp.timer_start(b, Some(record_timer), 1, true).unwrap();
    lp.idle_start(idle, None).unwrap();

    lp.timer_cleanup();
    assert!(lp.list(Kind::Timer).is_empty());
    assert_eq!(lp.closing().len(), 2);

    tick_at(&mut lp, 100);
    assert!(lp.platform().events.is_empty());
    assert_eq!(lp.handle_count(), 1);
    assert!(lp.list(Kind::Idle).contains(idle));
}

#[test]
fn idle_runs_every_tick_after_timers() {
    let mut lp = new_loop();
    let timer = lp.timer_init().unwrap();
    let idle = lp.idle_init().unwrap();
    lp.idle_start(idle, Some(record_idle)).unwrap();
    lp.timer_start(timer, Some(record_timer), 5, false).unwrap();

    tick_at(&mut lp, 1);
    tick_at(&mut lp, 6);

    assert_eq!(
        lp.platform().events.as_slice(),
        &[Event::Idle(idle), Event::Timer(timer), Event::Idle(idle)]
    );

    lp.idle_stop(idle).unwrap();
    tick_at(&mut lp, 7);
    assert_eq!(lp.platform().events.len(), 3);
}

#[test]
fn poll_pass_never_dispatches() {
    let mut lp = new_loop();
    let id = lp.poll_init().unwrap();
    lp.poll_start(id, Some(record_timer)).unwrap();
    lp.platform_mut().rx.push_back(b'x').unwrap();

    tick_at(&mut lp, 1);
    assert!(lp.platform().events.is_empty());
    assert!(lp.list(Kind::BufferedRead).contains(id));

    lp.poll_stop(id).unwrap();
    assert!(lp.list(Kind::BufferedRead).is_empty());
}
