use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ioloop::port::{ByteSource, Clock, DigitalIo, Instant, Level, Pin, PinMode};
use ioloop::{EventLoop, HandleId, TriggerMode};

struct BenchBoard {
    now: Instant,
    level: Level,
    pending: usize,
}

impl Clock for BenchBoard {
    fn now(&mut self) -> Instant {
        self.now += 1;
        self.now
    }
}

impl DigitalIo for BenchBoard {
    fn configure(&mut self, _pin: Pin, _mode: PinMode) {}

    fn read(&mut self, _pin: Pin) -> Level {
        self.level
    }
}

impl ByteSource for BenchBoard {
    fn has_data(&mut self) -> bool {
        self.pending > 0
    }

    fn pending_count(&mut self) -> usize {
        self.pending
    }

    fn read_one(&mut self) -> u8 {
        self.pending -= 1;
        b'.'
    }
}

type Loop = EventLoop<BenchBoard, 32>;

fn on_timer(lp: &mut Loop, _id: HandleId) {
    let board = lp.platform_mut();
    board.level = if board.level.is_high() { Level::Low } else { Level::High };
}

fn on_watch(_lp: &mut Loop, id: HandleId) {
    black_box(id);
}

fn on_byte(_lp: &mut Loop, _id: HandleId, byte: u8) {
    black_box(byte);
}

fn populated_loop() -> Loop {
    let mut lp = EventLoop::new(BenchBoard {
        now: 0,
        level: Level::Low,
        pending: 0,
    });
    for pin in 0..8 {
        let timer = lp.timer_init().unwrap();
        lp.timer_start(timer, Some(on_timer), 3 + pin as u64, true)
            .unwrap();
        let watch = lp.watch_init().unwrap();
        lp.watch_start(watch, Some(on_watch), pin, TriggerMode::OnChange, 2)
            .unwrap();
    }
    let tty = lp.tty_init().unwrap();
    lp.tty_start(tty, Some(on_byte)).unwrap();
    lp
}

pub fn bench_tick(c: &mut Criterion) {
    let mut lp = populated_loop();
    c.bench_function("tick_8_timers_8_watches", |b| b.iter(|| lp.tick()));
}

pub fn bench_tick_with_input(c: &mut Criterion) {
    let mut lp = populated_loop();
    c.bench_function("tick_drain_64_bytes", |b| {
        b.iter(|| {
            lp.platform_mut().pending = 64;
            lp.tick();
        })
    });
}

pub fn bench_handle_churn(c: &mut Criterion) {
    let mut lp = populated_loop();
    c.bench_function("timer_init_start_close", |b| {
        b.iter(|| {
            let id = lp.timer_init().unwrap();
            lp.timer_start(id, None, 10, false).unwrap();
            lp.timer_stop(id).unwrap();
            lp.close(id, None).unwrap();
            lp.tick();
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_tick_with_input,
    bench_handle_churn
);
criterion_main!(benches);
