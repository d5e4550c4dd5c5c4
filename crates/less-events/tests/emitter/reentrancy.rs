//! Listeners that call back into the emitter during emission.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use less_events::{EventEmitter, Listener};
use serde_json::{json, Value};

use super::support::{failing, make_log, tagged, Spy};

// ============================================================================
// Nested emission
// ============================================================================

#[test]
fn listener_can_emit_a_different_event() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let inner = Spy::new();
    emitter.on("inner", &inner.listener);

    let emitter_clone = Arc::clone(&emitter);
    emitter.on(
        "outer",
        Listener::new(move |args: &[Value]| {
            emitter_clone.emit("inner", args)?;
            Ok(())
        }),
    );

    emitter.emit("outer", &[json!("x")]).unwrap();

    assert_eq!(inner.count(), 1);
    assert_eq!(inner.last_args(), Some(vec![json!("x")]));
}

#[test]
fn nested_failures_surface_through_the_outer_emission() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    emitter.on("inner", failing("boom"));

    let emitter_clone = Arc::clone(&emitter);
    emitter.on(
        "outer",
        Listener::new(move |_: &[Value]| {
            emitter_clone.emit("inner", &[])?;
            Ok(())
        }),
    );

    let err = emitter.emit("outer", &[]).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Event outer threw the following errors: \
         Event inner threw the following errors: boom"
    );
}

#[test]
fn nested_emit_of_the_same_event_does_not_refire_a_once_listener() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let once = Spy::new();
    let reentered = Arc::new(AtomicBool::new(false));
    let depth_calls = Arc::new(AtomicUsize::new(0));

    {
        let emitter_clone = Arc::clone(&emitter);
        let reentered = Arc::clone(&reentered);
        let depth_calls = Arc::clone(&depth_calls);
        emitter.on(
            "tick",
            Listener::new(move |_: &[Value]| {
                depth_calls.fetch_add(1, Ordering::SeqCst);
                if !reentered.swap(true, Ordering::SeqCst) {
                    emitter_clone.emit("tick", &[])?;
                }
                Ok(())
            }),
        );
    }
    emitter.once("tick", &once.listener);

    emitter.emit("tick", &[]).unwrap();

    assert_eq!(depth_calls.load(Ordering::SeqCst), 2);
    assert_eq!(once.count(), 1, "once listener fires in the outer emission only");
    assert_eq!(emitter.listener_count("tick"), 1);
}

#[test]
fn inner_emission_pruning_is_not_undone_by_the_outer_one() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let log = make_log();

    {
        let emitter_clone = Arc::clone(&emitter);
        let log = Arc::clone(&log);
        emitter.on(
            "outer",
            Listener::new(move |_: &[Value]| {
                log.lock().unwrap().push("outer".to_string());
                emitter_clone.emit("inner", &[])?;
                Ok(())
            }),
        );
    }
    emitter.once("inner", tagged(&log, "inner-once"));
    emitter.on("inner", tagged(&log, "inner-on"));

    emitter.emit("outer", &[]).unwrap();
    emitter.emit("outer", &[]).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["outer", "inner-once", "inner-on", "outer", "inner-on"]
    );
}

// ============================================================================
// Mutation during emission
// ============================================================================

#[test]
fn listener_added_during_emit_is_not_called_in_current_emission() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let log = make_log();

    {
        let emitter_clone = Arc::clone(&emitter);
        let log_clone = Arc::clone(&log);
        let added = AtomicBool::new(false);
        emitter.on(
            "e",
            Listener::infallible(move |_: &[Value]| {
                log_clone.lock().unwrap().push("first".to_string());
                if !added.swap(true, Ordering::SeqCst) {
                    emitter_clone.on("e", tagged(&log_clone, "second"));
                }
            }),
        );
    }

    emitter.emit("e", &[]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["first"]);

    emitter.emit("e", &[]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["first", "first", "second"]);
}

#[test]
fn once_listener_added_during_emit_survives_that_emission() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let late = Spy::new();

    {
        let emitter_clone = Arc::clone(&emitter);
        let late_listener = late.listener.clone();
        emitter.once(
            "e",
            Listener::infallible(move |_: &[Value]| {
                emitter_clone.once("e", &late_listener);
            }),
        );
    }

    emitter.emit("e", &[]).unwrap();
    assert_eq!(late.count(), 0);
    assert_eq!(emitter.listeners("e"), vec![late.listener.clone()]);

    emitter.emit("e", &[]).unwrap();
    assert_eq!(late.count(), 1);
    assert_eq!(emitter.listener_count("e"), 0);
}

#[test]
fn listener_removed_during_emit_is_still_called_snapshot_semantics() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let first = Spy::new();

    emitter.on("e", &first.listener);
    {
        let emitter_clone = Arc::clone(&emitter);
        let first_listener = first.listener.clone();
        emitter.on(
            "e",
            Listener::infallible(move |_: &[Value]| {
                emitter_clone.remove("e", &first_listener);
            }),
        );
    }
    // Registered after the remover so removal happens before it is reached.
    let third = Spy::new();
    let third_id = emitter.on("e", &third.listener);
    {
        let emitter_clone = Arc::clone(&emitter);
        emitter.on(
            "e",
            Listener::infallible(move |_: &[Value]| emitter_clone.off(third_id)),
        );
    }

    emitter.emit("e", &[]).unwrap();
    assert_eq!(first.count(), 1);
    assert_eq!(third.count(), 1);

    emitter.emit("e", &[]).unwrap();
    assert_eq!(first.count(), 1, "first should not fire after removal");
    assert_eq!(third.count(), 1, "third should not fire after off()");
}

#[test]
fn listener_can_clear_the_emitter_mid_emission() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let after = Spy::new();

    {
        let emitter_clone = Arc::clone(&emitter);
        emitter.on(
            "e",
            Listener::infallible(move |_: &[Value]| emitter_clone.remove_all()),
        );
    }
    emitter.on("e", &after.listener);
    emitter.on("other", &after.listener);

    emitter.emit("e", &[]).unwrap();

    assert_eq!(after.count(), 1, "snapshot still runs the rest of this round");
    assert!(emitter.event_names().is_empty());
}

#[test]
fn listener_can_remove_itself() {
    let emitter: Arc<EventEmitter> = Arc::new(EventEmitter::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));

    let listener = {
        let emitter_clone = Arc::clone(&emitter);
        let calls = Arc::clone(&calls);
        let slot = Arc::clone(&slot);
        Listener::infallible(move |_: &[Value]| {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot.lock().unwrap().take() {
                emitter_clone.remove("e", &me);
            }
        })
    };
    *slot.lock().unwrap() = Some(listener.clone());
    emitter.on("e", &listener);

    emitter.emit("e", &[]).unwrap();
    emitter.emit("e", &[]).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(emitter.listener_count("e"), 0);
}
