//! Traffic Light State Machine
//!
//! This example walks a traffic light through its cycle with callbacks.
//!
//! Key concepts:
//! - Declaring events with multiple transitions
//! - Lifecycle callbacks (`before`, `leave`, `enter`, `changestate`, `after`)
//! - Cancelling an event from `before`
//! - Holding a transition in `leave` and resuming it later
//!
//! Run with: cargo run --example traffic_light

use serde_json::json;
use turnstile::builder::MachineBuilder;
use turnstile::engine::{into_extras, FireResult, Slot, Verdict};

fn main() {
    println!("=== Traffic Light State Machine ===\n");

    let mut fsm = MachineBuilder::new()
        .initial("green")
        .event("warn", "green", "yellow")
        .event("panic", vec!["green", "yellow"], "red")
        .event("calm", "red", "yellow")
        .event("clear", "yellow", "green")
        .observe(Slot::ChangeState, |ctx| {
            println!("  [changestate] {} : {} -> {}", ctx.event, ctx.src, ctx.dst);
        })
        .on(Slot::before("panic"), |ctx| {
            // Drills never turn the light red
            if ctx.get("drill").and_then(|v| v.as_bool()).unwrap_or(false) {
                println!("  [before:panic] drill, cancelling");
                return Ok(Verdict::Cancel);
            }
            Ok(Verdict::Continue)
        })
        .on(Slot::leave("red"), |_| {
            println!("  [leave:red] waiting for the intersection to clear");
            Ok(Verdict::Defer)
        })
        .observe(Slot::after("warn"), |ctx| {
            if let Some(msg) = ctx.get("msg") {
                println!("  [after:warn] message: {}", msg);
            }
        })
        .build()
        .unwrap();

    println!("Initial state: {}\n", fsm.current());

    println!("Firing warn:");
    fsm.fire_with("warn", into_extras(json!({"msg": "killer bees"})))
        .unwrap();

    println!("\nFiring panic as a drill:");
    let outcome = fsm
        .fire_with("panic", into_extras(json!({"drill": true})))
        .unwrap();
    println!("  outcome: {:?}, state: {}", outcome, fsm.current());

    println!("\nFiring panic:");
    fsm.fire("panic").unwrap();

    println!("\nFiring calm:");
    if let FireResult::Pending(ticket) = fsm.fire("calm").unwrap() {
        println!("  held: {} -> {} (state still {})", ticket.src, ticket.dst, fsm.current());
        println!("  can clear while held? {}", fsm.can("clear"));
        fsm.resume_transition(&ticket).unwrap();
    }

    println!("\nFiring clear:");
    fsm.fire("clear").unwrap();

    let path: Vec<&str> = fsm.history().get_path().iter().map(|s| s.as_str()).collect();
    println!("\nPath: {}", path.join(" -> "));

    println!("\n=== Example Complete ===");
}
