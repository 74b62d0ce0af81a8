//! HUD Event Wiring
//!
//! This demo routes gameplay events to HUD widgets and a game-flow machine.
//!
//! Key concepts:
//! - Subscribing handlers per event type
//! - High-priority handlers that observe an event first
//! - Handlers that unsubscribe themselves after one delivery
//! - Scope-bound subscriptions with `SubscriptionGuard`
//! - Driving state transitions from event handlers
//!
//! Run with: RUST_LOG=signalbox=trace cargo run --example hud

use signalbox::events::{handler, EventDispatcher, Priority, Subscription};
use signalbox::{simple_state, states, StateMachine, StateMachineError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Damaged {
    amount: u32,
}

#[derive(Debug, Default)]
struct ScoreChanged {
    score: u32,
}

#[derive(Debug)]
struct Paused(bool);

simple_state! {
    struct Playing;
    struct GameOver;
}

fn main() -> Result<(), StateMachineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== HUD Event Wiring ===\n");

    let events = EventDispatcher::new();
    let flow = StateMachine::new();
    flow.configure(states![Playing::default(), GameOver::default()], true)?;
    flow.transition_to::<Playing>()?;

    let health = Rc::new(Cell::new(100_u32));
    let shield = Rc::new(Cell::new(30_u32));

    // The shield soaks damage before the health bar sees it.
    let absorb = {
        let shield = Rc::clone(&shield);
        handler(move |hit: &Damaged| {
            let soaked = hit.amount.min(shield.get());
            shield.set(shield.get() - soaked);
            println!("  shield absorbs {soaked}, {} left", shield.get());
        })
    };
    let health_bar = {
        let health = Rc::clone(&health);
        let shield = Rc::clone(&shield);
        let driver = flow.downgrade();
        let previous_shield = Cell::new(shield.get());
        handler(move |hit: &Damaged| {
            let absorbed = previous_shield.get() - shield.get();
            previous_shield.set(shield.get());
            let taken = hit.amount - absorbed;
            health.set(health.get().saturating_sub(taken));
            println!("  health bar: {}", health.get());
            if health.get() == 0 {
                if let Err(err) = driver.transition_to::<GameOver>() {
                    tracing::warn!(%err, "could not end the game");
                }
            }
        })
    };

    let _health = events.subscribe(&health_bar);
    let _shield = events.subscribe_with_priority(&absorb, Priority::High);
    if events.subscribe(&health_bar).is_none() {
        println!("health bar already subscribed, second subscribe ignored\n");
    }

    // A banner that shows on the first score change only.
    let banner: Rc<RefCell<Option<Subscription>>> = Rc::default();
    let own = Rc::clone(&banner);
    let first_points = handler(move |s: &ScoreChanged| {
        println!("  banner: first points! ({})", s.score);
        if let Some(subscription) = own.borrow_mut().as_mut() {
            subscription.dispose();
        }
    });
    *banner.borrow_mut() = events.subscribe(&first_points);

    let score_label = events.subscribe_fn(|s: &ScoreChanged| println!("  score label: {}", s.score));

    println!("Score updates:");
    events.publish_default::<ScoreChanged>();
    events.publish(&ScoreChanged { score: 150 });
    events.publish(&ScoreChanged { score: 300 });

    println!("\nPause overlay is only listening inside its scope:");
    {
        let _overlay = events
            .subscribe_fn(|p: &Paused| println!("  overlay visible: {}", p.0))
            .into_guard();
        events.publish(&Paused(true));
    }
    events.publish(&Paused(false));
    println!("  (no overlay output after the scope ended)");

    println!("\nDamage:");
    for amount in [20, 40, 60, 50] {
        println!("hit for {amount}");
        events.publish(&Damaged { amount });
        if flow.is_current::<GameOver>() {
            println!("  game over");
            break;
        }
    }

    let mut score_label = score_label;
    score_label.dispose();
    score_label.dispose();
    println!(
        "\nScore handlers left: {} (label disposed: {})",
        events.handler_count::<ScoreChanged>(),
        score_label.is_disposed()
    );

    println!("Final state: {:?}", flow.current_name());
    println!("\n=== Demo Complete ===");
    Ok(())
}
