//! Integration tests for subscription, dispatch and lifecycle of the untyped
//! emitter.

use tidings_events::{Emitter, EmitterConfig, EmitterError, Handler, Payload};
use tidings_test::{CallRecorder, init_test_tracing};

#[derive(Debug, Clone, PartialEq, Eq)]
struct User {
    id: String,
}

impl User {
    fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Handler recording the `User` it receives.
fn user_recorder(recorder: &CallRecorder<User>) -> Handler {
    let recorder = recorder.clone();
    Handler::infallible(move |payload| {
        if let Some(user) = payload.downcast_ref::<User>() {
            recorder.record(user.clone());
        }
    })
}

/// Handler recording `tag` on every call.
fn tagged(recorder: &CallRecorder<&'static str>, tag: &'static str) -> Handler {
    let recorder = recorder.clone();
    Handler::infallible(move |_| recorder.record(tag))
}

#[test]
fn test_duplicate_names_are_listed() {
    let err = Emitter::new(["a", "b", "a", "c", "b"]).unwrap_err();

    match &err {
        EmitterError::DuplicateEventNames { names } => assert_eq!(names, &["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "event names must be unique: a, b");
}

#[test]
fn test_unique_names_bind_a_trigger_each() {
    let emitter = Emitter::new(["a", "b", "c"]).unwrap();
    let triggers = emitter.triggers();

    assert_eq!(triggers.len(), 3);
    for name in ["a", "b", "c"] {
        assert_eq!(triggers.get(name).unwrap().name(), name);
    }
    assert!(triggers.get("d").is_none());
}

#[test]
fn test_login_logout_scenario() {
    init_test_tracing();
    let emitter = Emitter::new(["login", "logout"]).unwrap();
    let recorder = CallRecorder::new();
    let handler = user_recorder(&recorder);

    emitter.on("login", handler.clone()).unwrap();
    emitter.trigger("login", Payload::new(User::new("u1"))).unwrap();
    assert_eq!(recorder.calls(), vec![User::new("u1")]);

    assert!(emitter.off("login", &handler).unwrap());
    emitter.trigger("login", Payload::new(User::new("u2"))).unwrap();
    assert_eq!(recorder.calls(), vec![User::new("u1")]);
}

#[test]
fn test_handlers_run_in_registration_order_with_same_payload() {
    let emitter = Emitter::new(["tick"]).unwrap();
    let recorder: CallRecorder<(usize, u32)> = CallRecorder::new();

    for index in 0..3 {
        let recorder = recorder.clone();
        emitter
            .on(
                "tick",
                Handler::infallible(move |payload| {
                    recorder.record((index, *payload.downcast_ref::<u32>().unwrap()));
                }),
            )
            .unwrap();
    }

    emitter.trigger("tick", Payload::new(7_u32)).unwrap();
    emitter.emit("tick", Payload::new(8_u32)).unwrap();

    assert_eq!(
        recorder.calls(),
        vec![(0, 7), (1, 7), (2, 7), (0, 8), (1, 8), (2, 8)]
    );
}

#[test]
fn test_same_handler_registered_twice_runs_twice() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    let handler = tagged(&recorder, "h");

    emitter.on("a", handler.clone()).unwrap();
    emitter.on("a", handler.clone()).unwrap();
    emitter.trigger_empty("a").unwrap();
    assert_eq!(recorder.count(), 2);

    // `off` removes one registration at a time.
    assert!(emitter.off("a", &handler).unwrap());
    assert_eq!(emitter.listener_count("a").unwrap(), 1);
}

#[test]
fn test_once_fires_only_on_first_trigger() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();

    emitter.once("a", tagged(&recorder, "once")).unwrap();
    for _ in 0..3 {
        emitter.trigger_empty("a").unwrap();
    }

    assert_eq!(recorder.calls(), vec!["once"]);
    assert!(!emitter.has_handlers("a").unwrap());
}

#[test]
fn test_once_unsubscribed_before_firing_never_runs() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();

    let subscription = emitter.once("a", tagged(&recorder, "once")).unwrap();
    subscription.unsubscribe();
    subscription.unsubscribe();
    emitter.trigger_empty("a").unwrap();

    assert!(recorder.is_empty());
    assert!(!subscription.is_subscribed());
}

#[test]
fn test_off_removes_only_given_handler() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    let first = tagged(&recorder, "first");
    let second = tagged(&recorder, "second");
    let lookalike = tagged(&recorder, "first");

    emitter.on("a", first.clone()).unwrap();
    emitter.on("a", second).unwrap();

    assert!(!emitter.off("a", &lookalike).unwrap());
    assert!(emitter.off("a", &first).unwrap());
    assert!(!emitter.off("a", &first).unwrap());

    emitter.trigger_empty("a").unwrap();
    assert_eq!(recorder.calls(), vec!["second"]);
}

#[test]
fn test_unsubscribe_removes_only_its_registration() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    let handler = tagged(&recorder, "h");

    let first = emitter.on("a", handler.clone()).unwrap();
    let second = emitter.on("a", handler).unwrap();
    first.unsubscribe();

    assert!(!first.is_subscribed());
    assert!(second.is_subscribed());
    assert_eq!(emitter.listener_count("a").unwrap(), 1);
}

#[test]
fn test_unknown_event_is_rejected_everywhere() {
    let emitter = Emitter::new(["a"]).unwrap();
    let handler = Handler::infallible(|_| {});
    let is_unknown = |err: EmitterError| {
        matches!(err, EmitterError::UnknownEvent { ref event } if event == "zzz")
    };

    assert!(is_unknown(emitter.on("zzz", handler.clone()).unwrap_err()));
    assert!(is_unknown(emitter.once("zzz", handler.clone()).unwrap_err()));
    assert!(is_unknown(emitter.off("zzz", &handler).unwrap_err()));
    assert!(is_unknown(emitter.off_all(Some("zzz")).unwrap_err()));
    assert!(is_unknown(emitter.has_handlers("zzz").unwrap_err()));
    assert!(is_unknown(emitter.trigger_empty("zzz").unwrap_err()));
    assert!(is_unknown(emitter.wait("zzz").unwrap_err()));
    assert_eq!(
        emitter.trigger_empty("zzz").unwrap_err().to_string(),
        "event zzz not supported"
    );
}

#[test]
fn test_max_listeners_scenario() {
    let config = EmitterConfig::new().with_max_listeners(1);
    let emitter = Emitter::with_config(["x"], config).unwrap();
    let recorder = CallRecorder::new();

    emitter.on("x", tagged(&recorder, "h1")).unwrap();
    let err = emitter.on("x", tagged(&recorder, "h2")).unwrap_err();

    match &err {
        EmitterError::ListenerLimitExceeded { event, limit } => {
            assert_eq!(event, "x");
            assert_eq!(*limit, 1);
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "max listeners (1) for event x exceeded");

    emitter.trigger_empty("x").unwrap();
    assert_eq!(recorder.calls(), vec!["h1"]);
}

#[test]
fn test_max_listeners_frees_slot_after_off() {
    let config = EmitterConfig::new().with_max_listeners(1);
    let emitter = Emitter::with_config(["x"], config).unwrap();

    let subscription = emitter.on("x", Handler::infallible(|_| {})).unwrap();
    subscription.unsubscribe();

    assert!(emitter.on("x", Handler::infallible(|_| {})).is_ok());
}

#[test]
fn test_max_listeners_from_toml() {
    let config = EmitterConfig::from_toml_str("max_listeners = 2").unwrap();
    let emitter = Emitter::with_config(["x"], config).unwrap();

    emitter.on("x", Handler::infallible(|_| {})).unwrap();
    emitter.on("x", Handler::infallible(|_| {})).unwrap();
    assert!(emitter.on("x", Handler::infallible(|_| {})).is_err());
}

#[test]
fn test_deactivate_then_activate() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    emitter.on("a", tagged(&recorder, "before")).unwrap();

    emitter.deactivate();
    assert!(!emitter.is_active());
    emitter.trigger_empty("a").unwrap();
    emitter.on("a", tagged(&recorder, "during")).unwrap();
    emitter.trigger_empty("a").unwrap();
    assert!(recorder.is_empty());

    emitter.activate();
    emitter.trigger_empty("a").unwrap();
    assert_eq!(recorder.calls(), vec!["before", "during"]);
}

#[test]
fn test_destroy_is_silent_for_declared_events() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    emitter.on("a", tagged(&recorder, "h")).unwrap();

    emitter.destroy();

    assert!(emitter.is_destroyed());
    assert!(!emitter.is_active());
    assert!(emitter.triggers().is_empty());
    assert!(!emitter.has_handlers("a").unwrap());
    assert!(emitter.trigger_empty("a").is_ok());
    assert!(matches!(
        emitter.trigger_empty("b"),
        Err(EmitterError::UnknownEvent { .. })
    ));
    assert!(recorder.is_empty());

    // Activation alone does not bring back the triggers.
    emitter.activate();
    emitter.on("a", tagged(&recorder, "late")).unwrap();
    emitter.trigger_empty("a").unwrap();
    assert!(recorder.is_empty());
}

#[test]
fn test_remove_event_handlers_rebinds_after_destroy() {
    let emitter = Emitter::new(["a", "b"]).unwrap();
    let recorder = CallRecorder::new();
    emitter.on("a", tagged(&recorder, "old")).unwrap();

    emitter.destroy();
    emitter.remove_event_handlers();
    assert!(!emitter.is_destroyed());
    assert_eq!(emitter.triggers().len(), 2);

    emitter.activate();
    emitter.on("a", tagged(&recorder, "new")).unwrap();
    emitter.trigger_empty("a").unwrap();
    assert_eq!(recorder.calls(), vec!["new"]);
}

#[test]
fn test_remove_event_handlers_keeps_activity() {
    let emitter = Emitter::new(["a"]).unwrap();
    emitter.on("a", Handler::infallible(|_| {})).unwrap();

    emitter.remove_event_handlers();

    assert!(emitter.is_active());
    assert_eq!(emitter.listener_count("a").unwrap(), 0);
}

#[test]
fn test_off_all_single_and_every_event() {
    let emitter = Emitter::new(["a", "b"]).unwrap();
    for name in ["a", "a", "b"] {
        emitter.on(name, Handler::infallible(|_| {})).unwrap();
    }

    emitter.off_all(Some("a")).unwrap();
    assert!(!emitter.has_handlers("a").unwrap());
    assert!(emitter.has_handlers("b").unwrap());

    emitter.off_all(None).unwrap();
    assert!(!emitter.has_handlers("b").unwrap());
    assert_eq!(emitter.triggers().len(), 2);
}

#[test]
fn test_each_triggers_in_declaration_order() {
    let emitter = Emitter::new(["c", "a", "b"]).unwrap();
    let mut seen = Vec::new();

    emitter.each_triggers(|trigger, name| {
        assert_eq!(trigger.name(), name);
        seen.push(name.to_string());
    });

    assert_eq!(seen, vec!["c", "a", "b"]);
    let names: Vec<&str> = emitter.event_names().collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn test_each_triggers_forwards_into_another_emitter() {
    let source = Emitter::new(["ping", "pong"]).unwrap();
    let sink = Emitter::new(["ping", "pong"]).unwrap();
    let recorder = CallRecorder::new();
    sink.on("pong", tagged(&recorder, "pong")).unwrap();

    sink.each_triggers(|trigger, name| {
        let trigger = trigger.clone();
        let forward = Handler::new(move |payload| Ok(trigger.call(payload.clone())?));
        source.on(name, forward).unwrap();
    });

    source.trigger_empty("pong").unwrap();
    assert_eq!(recorder.calls(), vec!["pong"]);
}

#[test]
fn test_stale_trigger_survives_reset() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    let stale = emitter.triggers().get("a").cloned().unwrap();

    emitter.remove_event_handlers();
    emitter.on("a", tagged(&recorder, "h")).unwrap();

    // A trigger taken before the reset still reaches the shared handler sets.
    stale.call_empty().unwrap();
    assert_eq!(recorder.calls(), vec!["h"]);
}

#[test]
fn test_clones_share_state() {
    let emitter = Emitter::new(["a"]).unwrap();
    let clone = emitter.clone();
    let recorder = CallRecorder::new();

    clone.on("a", tagged(&recorder, "h")).unwrap();
    emitter.trigger_empty("a").unwrap();
    clone.deactivate();

    assert_eq!(recorder.count(), 1);
    assert!(!emitter.is_active());
}

#[test]
fn test_emitter_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Emitter>();
    assert_send_sync::<Payload>();
    assert_send_sync::<Handler>();
}

#[test]
fn test_trigger_from_other_threads() {
    let emitter = Emitter::new(["a"]).unwrap();
    let recorder = CallRecorder::new();
    emitter.on("a", tagged(&recorder, "h")).unwrap();

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let emitter = emitter.clone();
            std::thread::spawn(move || emitter.trigger_empty("a").unwrap())
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(recorder.count(), 4);
}
