//! Integration tests for event dispatch and subscription handles.

use signalbox::events::{handler, EventDispatcher, Handler, Priority, Subscription};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Hit(u32);

#[derive(Debug, Clone, PartialEq)]
struct Heal(u32);

type Log = Rc<RefCell<Vec<String>>>;

fn named(log: &Log, name: &'static str) -> Handler<Hit> {
    let log = Rc::clone(log);
    handler(move |_: &Hit| log.borrow_mut().push(name.to_string()))
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn subscribing_twice_keeps_one_registration() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let h = named(&log, "h");

    let first = dispatcher.subscribe(&h);
    let second = dispatcher.subscribe(&h);

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(dispatcher.handler_count::<Hit>(), 1);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["h"]);
}

#[test]
fn same_handler_may_listen_to_distinct_types() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let sink = Rc::clone(&log);
    let on_hit = handler(move |hit: &Hit| sink.borrow_mut().push(format!("hit {}", hit.0)));
    let sink = Rc::clone(&log);
    let on_heal = handler(move |heal: &Heal| sink.borrow_mut().push(format!("heal {}", heal.0)));

    let _hit = dispatcher.subscribe(&on_hit);
    let _heal = dispatcher.subscribe(&on_heal);

    dispatcher.publish(&Heal(4));
    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["heal 4", "hit 2"]);
}

#[test]
fn high_priority_is_delivered_before_normal() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let h1 = named(&log, "h1");
    let h2 = named(&log, "h2");

    let _h1 = dispatcher.subscribe(&h1);
    let _h2 = dispatcher.subscribe_with_priority(&h2, Priority::High);

    dispatcher.publish(&Hit(0));
    assert_eq!(take(&log), vec!["h2", "h1"]);
}

#[test]
fn unsubscribing_a_later_handler_skips_it_in_the_same_pass() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let b = named(&log, "B");
    let c = named(&log, "C");

    let weak = dispatcher.downgrade();
    let victim = Rc::clone(&b);
    let sink = Rc::clone(&log);
    let a = handler(move |_: &Hit| {
        sink.borrow_mut().push("A".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.unsubscribe(&victim);
        }
    });

    let _a = dispatcher.subscribe(&a);
    let _b = dispatcher.subscribe(&b);
    let _c = dispatcher.subscribe(&c);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["A", "C"]);

    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["A", "C"]);
    assert_eq!(dispatcher.handler_count::<Hit>(), 2);
}

#[test]
fn unsubscribing_an_earlier_handler_does_not_affect_the_pass() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");

    let weak = dispatcher.downgrade();
    let victim = Rc::clone(&a);
    let sink = Rc::clone(&log);
    let b = handler(move |_: &Hit| {
        sink.borrow_mut().push("B".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.unsubscribe(&victim);
        }
    });
    let c = named(&log, "C");

    let _a = dispatcher.subscribe(&a);
    let _b = dispatcher.subscribe(&b);
    let _c = dispatcher.subscribe(&c);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["A", "B", "C"]);

    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["B", "C"]);
}

#[test]
fn handler_can_dispose_its_own_subscription() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();

    let sink = Rc::clone(&log);
    let own = Rc::clone(&slot);
    let once = handler(move |hit: &Hit| {
        sink.borrow_mut().push(format!("once {}", hit.0));
        if let Some(subscription) = own.borrow_mut().as_mut() {
            subscription.dispose();
        }
    });
    let after = named(&log, "after");

    *slot.borrow_mut() = dispatcher.subscribe(&once);
    let _after = dispatcher.subscribe(&after);

    dispatcher.publish(&Hit(1));
    dispatcher.publish(&Hit(2));

    assert_eq!(take(&log), vec!["once 1", "after", "after"]);
    assert!(slot.borrow().as_ref().is_some_and(Subscription::is_disposed));
}

#[test]
fn last_handler_removing_itself_ends_the_pass() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");
    let slot: Rc<RefCell<Option<Handler<Hit>>>> = Rc::default();

    let weak = dispatcher.downgrade();
    let sink = Rc::clone(&log);
    let me = Rc::clone(&slot);
    let last = handler(move |_: &Hit| {
        sink.borrow_mut().push("last".to_string());
        let own = me.borrow().clone();
        if let (Some(dispatcher), Some(own)) = (weak.upgrade(), own) {
            dispatcher.unsubscribe(&own);
        }
    });
    *slot.borrow_mut() = Some(Rc::clone(&last));

    let _a = dispatcher.subscribe(&a);
    let _last = dispatcher.subscribe(&last);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["A", "last"]);

    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["A"]);
}

#[test]
fn removed_pass_end_lets_the_pass_run_to_the_end_of_the_list() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let c = named(&log, "C");

    let weak = dispatcher.downgrade();
    let victim = Rc::clone(&c);
    let sink = Rc::clone(&log);
    let a = handler(move |_: &Hit| {
        sink.borrow_mut().push("A".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            if dispatcher.unsubscribe(&victim) {
                let sink = Rc::clone(&sink);
                let _late = dispatcher
                    .subscribe_fn(move |_: &Hit| sink.borrow_mut().push("late".to_string()));
            }
        }
    });
    let b = named(&log, "B");

    let _a = dispatcher.subscribe(&a);
    let _b = dispatcher.subscribe(&b);
    let _c = dispatcher.subscribe(&c);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["A", "B", "late"]);

    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["A", "B", "late"]);
}

#[test]
fn removed_pass_end_directly_after_cursor_reaches_late_handler() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let c = named(&log, "C");

    let weak = dispatcher.downgrade();
    let victim = Rc::clone(&c);
    let sink = Rc::clone(&log);
    let a = handler(move |_: &Hit| {
        sink.borrow_mut().push("A".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            if dispatcher.unsubscribe(&victim) {
                let sink = Rc::clone(&sink);
                let _late = dispatcher
                    .subscribe_fn(move |_: &Hit| sink.borrow_mut().push("late".to_string()));
            }
        }
    });

    let _a = dispatcher.subscribe(&a);
    let _c = dispatcher.subscribe(&c);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["A", "late"]);
    assert_eq!(dispatcher.handler_count::<Hit>(), 2);
}

#[test]
fn handlers_added_during_a_pass_wait_for_the_next_publish() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let late = named(&log, "late");
    let urgent = named(&log, "urgent");

    let weak = dispatcher.downgrade();
    let sink = Rc::clone(&log);
    let (late_h, urgent_h) = (Rc::clone(&late), Rc::clone(&urgent));
    let adder = handler(move |_: &Hit| {
        sink.borrow_mut().push("adder".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            let _ = dispatcher.subscribe(&late_h);
            let _ = dispatcher.subscribe_with_priority(&urgent_h, Priority::High);
        }
    });

    let _adder = dispatcher.subscribe(&adder);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["adder"]);

    dispatcher.publish(&Hit(2));
    assert_eq!(take(&log), vec!["urgent", "adder", "late"]);
}

#[test]
fn nested_publish_delivers_inner_event_first() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();

    let weak = dispatcher.downgrade();
    let sink = Rc::clone(&log);
    let on_hit = handler(move |hit: &Hit| {
        sink.borrow_mut().push(format!("hit {}", hit.0));
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.publish(&Heal(hit.0 * 2));
        }
    });
    let sink = Rc::clone(&log);
    let on_heal = handler(move |heal: &Heal| sink.borrow_mut().push(format!("heal {}", heal.0)));
    let trailing = named(&log, "trailing");

    let _hit = dispatcher.subscribe(&on_hit);
    let _trailing = dispatcher.subscribe(&trailing);
    let _heal = dispatcher.subscribe(&on_heal);

    dispatcher.publish(&Hit(3));
    assert_eq!(take(&log), vec!["hit 3", "heal 6", "trailing"]);
}

#[test]
fn recursive_publish_of_the_same_type_is_bounded_by_the_handler() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();

    let weak = dispatcher.downgrade();
    let sink = Rc::clone(&log);
    let countdown = handler(move |hit: &Hit| {
        sink.borrow_mut().push(hit.0.to_string());
        if hit.0 > 0 {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.publish(&Hit(hit.0 - 1));
            }
        }
    });
    let tail = named(&log, "tail");

    let _countdown = dispatcher.subscribe(&countdown);
    let _tail = dispatcher.subscribe(&tail);

    dispatcher.publish(&Hit(2));
    assert_eq!(
        take(&log),
        vec!["2", "1", "0", "tail", "tail", "tail"]
    );
}

#[test]
fn unsubscribe_in_nested_pass_is_honoured_by_outer_pass() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let victim = named(&log, "victim");

    let weak = dispatcher.downgrade();
    let target = Rc::clone(&victim);
    let sink = Rc::clone(&log);
    let on_heal = handler(move |_: &Heal| {
        sink.borrow_mut().push("heal".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.unsubscribe(&target);
        }
    });

    let weak = dispatcher.downgrade();
    let sink = Rc::clone(&log);
    let on_hit = handler(move |_: &Hit| {
        sink.borrow_mut().push("first".to_string());
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.publish(&Heal(1));
        }
    });

    let _first = dispatcher.subscribe(&on_hit);
    let _victim = dispatcher.subscribe(&victim);
    let _heal = dispatcher.subscribe(&on_heal);

    dispatcher.publish(&Hit(1));
    assert_eq!(take(&log), vec!["first", "heal"]);
    assert_eq!(dispatcher.handler_count::<Hit>(), 1);
}

#[test]
fn dispose_is_idempotent() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");
    let b = named(&log, "B");

    let mut sub_a = dispatcher.subscribe(&a).expect("fresh handler");
    let _b = dispatcher.subscribe(&b);

    sub_a.dispose();
    sub_a.dispose();

    assert!(sub_a.is_disposed());
    assert!(!dispatcher.contains(&a));
    assert!(dispatcher.contains(&b));

    dispatcher.publish(&Hit(0));
    assert_eq!(take(&log), vec!["B"]);
}

#[test]
fn stale_handle_does_not_remove_a_resubscription() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");

    let mut first = dispatcher.subscribe(&a).expect("fresh handler");
    first.dispose();
    let _second = dispatcher.subscribe(&a).expect("handler was released");

    first.dispose();
    assert!(dispatcher.contains(&a));
}

#[test]
fn dropping_a_subscription_keeps_the_handler() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");

    drop(dispatcher.subscribe(&a));

    dispatcher.publish(&Hit(0));
    assert_eq!(take(&log), vec!["A"]);
}

#[test]
fn guard_unsubscribes_on_scope_exit() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let a = named(&log, "A");

    {
        let _guard = dispatcher.subscribe(&a).map(Subscription::into_guard);
        dispatcher.publish(&Hit(0));
    }
    dispatcher.publish(&Hit(1));

    assert_eq!(take(&log), vec!["A"]);
    assert_eq!(dispatcher.handler_count::<Hit>(), 0);
}

#[test]
fn dispose_after_dispatcher_is_gone_is_noop() {
    let dispatcher = EventDispatcher::new();
    let mut subscription = dispatcher.subscribe_fn(|_: &Hit| {});
    drop(dispatcher);

    subscription.dispose();
    assert!(subscription.is_disposed());
}

#[test]
fn clones_share_one_registry() {
    let dispatcher = EventDispatcher::new();
    let clone = dispatcher.clone();
    let log = Log::default();
    let a = named(&log, "A");

    let _a = clone.subscribe(&a);
    dispatcher.publish(&Hit(0));

    assert_eq!(take(&log), vec!["A"]);
    assert!(dispatcher.subscribe(&a).is_none());
}
