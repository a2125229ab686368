use draftwise_core::host::TabId;
use draftwise_core::request::{user_cancellation_reason, RequestStatusRegistry};

#[test]
fn status_is_created_lazily_and_idle() {
    let registry = RequestStatusRegistry::new();
    assert!(registry.active_tabs().is_empty());

    let status = registry.get_request_status(TabId(4));
    assert_eq!(status.tab_id, TabId(4));
    assert!(!status.is_running);
    assert!(!status.cancellation.is_cancelled());
    assert_eq!(registry.active_tabs(), vec![TabId(4)]);
}

#[test]
fn begin_rejects_a_second_run() {
    let registry = RequestStatusRegistry::new();
    let signal = registry.begin(TabId(1));
    assert!(signal.is_some());
    assert!(registry.is_running(TabId(1)));
    assert!(registry.begin(TabId(1)).is_none());

    // Other tabs are unaffected.
    assert!(registry.begin(TabId(2)).is_some());
}

#[tokio::test]
async fn abort_cancels_the_running_signal_with_reason() {
    let registry = RequestStatusRegistry::new();
    let signal = registry.begin(TabId(9)).unwrap();

    assert!(registry.abort(TabId(9)));
    signal.cancelled().await;
    assert_eq!(signal.reason(), Some(user_cancellation_reason(TabId(9))));
    assert_eq!(signal.reason().as_deref(), Some("User cancelled request in tab 9"));

    // Entry stays until the action unwinds.
    assert!(registry.is_running(TabId(9)));
    assert!(registry.abort_signal(TabId(9)).is_cancelled());
}

#[test]
fn abort_and_delete_are_idempotent() {
    let registry = RequestStatusRegistry::new();
    assert!(!registry.abort(TabId(5)));
    assert!(!registry.delete_request_status(TabId(5)));
    // An abort on an idle tab must not leave a poisoned entry behind.
    assert!(registry.active_tabs().is_empty());

    registry.begin(TabId(5));
    assert!(registry.abort(TabId(5)));
    assert!(!registry.abort(TabId(5)));
    assert!(registry.delete_request_status(TabId(5)));
    assert!(!registry.delete_request_status(TabId(5)));

    // A fresh run gets a fresh handle.
    let signal = registry.begin(TabId(5)).unwrap();
    assert!(!signal.is_cancelled());
}

#[test]
fn abort_on_an_idle_entry_does_not_poison_the_next_run() {
    let registry = RequestStatusRegistry::new();
    let idle = registry.abort_signal(TabId(7));
    assert!(!registry.abort(TabId(7)));
    assert!(!idle.is_cancelled());

    let signal = registry.begin(TabId(7)).unwrap();
    assert!(!signal.is_cancelled());
}

#[test]
fn begin_replaces_a_cancelled_handle() {
    let registry = RequestStatusRegistry::new();
    registry.get_request_status(TabId(8)).cancellation.cancel("stale");

    let signal = registry.begin(TabId(8)).unwrap();
    assert!(!signal.is_cancelled());
}
