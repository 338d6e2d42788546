use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn recorder() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&str) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (log, move |v: &str| sink.borrow_mut().push(v.to_owned()))
}

#[test]
fn emit_reaches_every_subscriber_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut signal: Signal<u32> = Signal::new();
    for tag in ["a", "b"] {
        let log = Rc::clone(&log);
        signal.subscribe(move |v| log.borrow_mut().push(format!("{tag}{v}")));
    }

    signal.emit(&1);
    signal.emit(&2);
    assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn unsized_payloads() {
    let (log, callback) = recorder();
    let mut signal: Signal<str> = Signal::new();
    signal.subscribe(callback);
    signal.emit("hello");
    assert_eq!(*log.borrow(), vec!["hello"]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let (log, callback) = recorder();
    let mut signal: Signal<str> = Signal::new();
    let id = signal.subscribe(callback);

    assert!(signal.unsubscribe(id));
    assert!(!signal.unsubscribe(id));
    signal.emit("ignored");
    assert!(log.borrow().is_empty());
    assert!(signal.is_empty());
}

#[test]
fn subscription_ids_are_distinct() {
    let mut signal: Signal<u32> = Signal::new();
    let a = signal.subscribe(|_| {});
    let b = signal.subscribe(|_| {});
    assert_ne!(a, b);
    assert_eq!(signal.len(), 2);
}

#[test]
fn emit_without_subscribers_is_noop() {
    let mut signal: Signal<[u8]> = Signal::default();
    signal.emit(&[1, 2, 3]);
    assert!(signal.is_empty());
}

#[test]
fn debug_reports_subscriber_count() {
    let mut signal: Signal<u32> = Signal::new();
    signal.subscribe(|_| {});
    assert!(format!("{signal:?}").contains("subscribers: 1"));
}
