use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct Ping(u32);
struct Pong;

#[derive(Default)]
struct Recorder {
    pings: Mutex<Vec<u32>>,
    pongs: AtomicUsize,
}

impl Handler<Ping> for Recorder {
    fn handle(&self, event: &Ping) {
        self.pings.lock().unwrap().push(event.0);
    }
}

impl Handler<Pong> for Recorder {
    fn handle(&self, _event: &Pong) {
        self.pongs.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn publish_without_subscribers_reaches_nobody() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(&Ping(1)), 0);
}

#[test]
fn subscribers_only_receive_registered_kinds() {
    let bus = EventBus::new();
    let recorder = Arc::new(Recorder::default());
    bus.subscribe::<Ping, _>(&recorder);

    assert_eq!(bus.publish(&Ping(7)), 1);
    assert_eq!(bus.publish(&Pong), 0);
    assert_eq!(*recorder.pings.lock().unwrap(), vec![7]);
    assert_eq!(recorder.pongs.load(Ordering::SeqCst), 0);
}

#[test]
fn one_component_can_hold_several_capabilities() {
    let bus = EventBus::new();
    let recorder = Arc::new(Recorder::default());
    bus.subscribe::<Ping, _>(&recorder);
    bus.subscribe::<Pong, _>(&recorder);

    bus.publish(&Ping(1));
    bus.publish(&Pong);
    bus.publish(&Pong);
    assert_eq!(recorder.pings.lock().unwrap().len(), 1);
    assert_eq!(recorder.pongs.load(Ordering::SeqCst), 2);
}

#[test]
fn dispatch_follows_registration_order() {
    struct Tagged {
        tag: u32,
        log: Arc<Mutex<Vec<u32>>>,
    }
    impl Handler<Pong> for Tagged {
        fn handle(&self, _event: &Pong) {
            self.log.lock().unwrap().push(self.tag);
        }
    }

    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::new(Tagged { tag: 1, log: log.clone() });
    let second = Arc::new(Tagged { tag: 2, log: log.clone() });
    bus.subscribe::<Pong, _>(&first);
    bus.subscribe::<Pong, _>(&second);

    bus.publish(&Pong);
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let bus = EventBus::new();
    let recorder = Arc::new(Recorder::default());
    bus.subscribe::<Ping, _>(&recorder);
    assert_eq!(bus.subscriber_count::<Ping>(), 1);

    drop(recorder);
    assert_eq!(bus.subscriber_count::<Ping>(), 0);
    assert_eq!(bus.publish(&Ping(1)), 0);
}

#[test]
fn handlers_may_publish_reentrantly() {
    struct Relay {
        bus: EventBus,
    }
    impl Handler<Ping> for Relay {
        fn handle(&self, _event: &Ping) {
            self.bus.publish(&Pong);
        }
    }

    let bus = EventBus::new();
    let relay = Arc::new(Relay { bus: bus.clone() });
    let recorder = Arc::new(Recorder::default());
    bus.subscribe::<Ping, _>(&relay);
    bus.subscribe::<Pong, _>(&recorder);

    bus.publish(&Ping(3));
    assert_eq!(recorder.pongs.load(Ordering::SeqCst), 1);
}

#[test]
fn clones_share_one_registry() {
    let bus = EventBus::new();
    let other = bus.clone();
    let recorder = Arc::new(Recorder::default());
    other.subscribe::<Pong, _>(&recorder);
    assert_eq!(bus.publish(&Pong), 1);
}
