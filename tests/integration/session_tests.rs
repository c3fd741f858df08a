//! Session manager integration tests: retry budget, handle replacement,
//! stale events and the async event pump.

use std::rc::Rc;

use edge_executor::LocalExecutor;
use iotblocks::config::SessionConfig;
use iotblocks::error::SessionError;
use iotblocks::session::events::EVENT_QUEUE_DEPTH;
use iotblocks::session::{HAT_OPCODE, LinkEvent, SessionState, pump_events};

use crate::mock_session::{ClientCall, new_session};

#[test]
fn retry_budget_rejects_once_after_sixth_reconnect() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let outcome = session.borrow_mut().connect("kittenblock", "robot01", None, None);
    let events = record.borrow().sender(0);

    for n in 1..=5 {
        events.post(LinkEvent::Reconnect);
        session.borrow_mut().process_pending();
        assert_eq!(session.borrow().retry_count(), n);
        assert!(!outcome.is_settled(), "settled early at reconnect {n}");
    }

    events.post(LinkEvent::Reconnect);
    session.borrow_mut().process_pending();
    assert_eq!(outcome.try_take(), Some(Err(SessionError::RetryBudgetExceeded)));
    assert_eq!(session.borrow().state(), SessionState::Failed { attempts: 6 });
    assert_eq!(record.borrow().ended(), 1);

    // A seventh reconnect neither re-rejects nor ends the client again.
    events.post(LinkEvent::Reconnect);
    session.borrow_mut().process_pending();
    assert_eq!(outcome.try_take(), None);
    assert_eq!(record.borrow().ended(), 1);
}

#[test]
fn retry_threshold_is_configurable() {
    let config = SessionConfig {
        max_reconnect_attempts: 1,
        ..SessionConfig::default()
    };
    let (session, record, _queue) = new_session(config);
    let outcome = session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);

    events.post(LinkEvent::Reconnect);
    events.post(LinkEvent::Reconnect);
    session.borrow_mut().process_pending();
    assert_eq!(outcome.try_take(), Some(Err(SessionError::RetryBudgetExceeded)));
}

#[test]
fn timeout_message_is_fixed() {
    assert_eq!(SessionError::RetryBudgetExceeded.to_string(), "error: time out");
}

#[test]
fn ack_after_reconnects_resolves_and_resets() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let outcome = session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);

    for _ in 0..3 {
        events.post(LinkEvent::Reconnect);
    }
    events.post(LinkEvent::Connected);
    session.borrow_mut().process_pending();

    assert_eq!(outcome.try_take(), Some(Ok(())));
    assert_eq!(session.borrow().retry_count(), 0);
    assert_eq!(session.borrow().state(), SessionState::Connected);

    // A second ack does not settle again.
    events.post(LinkEvent::Connected);
    session.borrow_mut().process_pending();
    assert_eq!(outcome.try_take(), None);
}

#[test]
fn at_most_one_live_client() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    for server in ["a", "b", "c"] {
        session.borrow_mut().connect(server, "robot01", None, None);
        assert_eq!(record.borrow().live_clients(), 1);
    }

    // Each old handle is ended before its replacement is opened.
    assert_eq!(
        record.borrow().calls,
        vec![
            ClientCall::Open {
                generation: 1,
                url: "ws://a:9234".into()
            },
            ClientCall::End { generation: 1 },
            ClientCall::Open {
                generation: 2,
                url: "ws://b:9234".into()
            },
            ClientCall::End { generation: 2 },
            ClientCall::Open {
                generation: 3,
                url: "ws://c:9234".into()
            },
        ]
    );
}

#[test]
fn stale_events_do_not_touch_new_session() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let first = session.borrow_mut().connect("a", "c", None, None);
    let old_events = record.borrow().sender(0);
    let second = session.borrow_mut().connect("b", "c", None, None);

    assert_eq!(first.try_take(), Some(Err(SessionError::Superseded)));

    for _ in 0..10 {
        old_events.post(LinkEvent::Reconnect);
    }
    old_events.post(LinkEvent::Message {
        topic: "/old".into(),
        payload: "x".into(),
    });
    session.borrow_mut().process_pending();

    assert_eq!(session.borrow().retry_count(), 0);
    assert!(!second.is_settled());
    assert!(record.borrow().hats.is_empty());
    assert_eq!(session.borrow().message(), None);
}

#[test]
fn inbound_message_fires_hat_and_overwrites_slot() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);

    events.post(LinkEvent::Connected);
    events.post(LinkEvent::Message {
        topic: "/sensor".into(),
        payload: "41".into(),
    });
    events.post(LinkEvent::Message {
        topic: "/sensor".into(),
        payload: "42".into(),
    });
    session.borrow_mut().process_pending();

    assert_eq!(session.borrow().message(), Some("42"));
    assert_eq!(
        record.borrow().hats,
        vec![
            (HAT_OPCODE.to_string(), "/sensor".to_string()),
            (HAT_OPCODE.to_string(), "/sensor".to_string()),
        ]
    );
}

#[test]
fn errors_and_close_do_not_settle() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let outcome = session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);

    events.post(LinkEvent::Error("ECONNREFUSED".into()));
    events.post(LinkEvent::Closed);
    session.borrow_mut().process_pending();

    assert!(!outcome.is_settled());
    assert_eq!(session.borrow().state(), SessionState::Connecting);
}

#[test]
fn ack_behind_message_backlog_still_resolves() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let outcome = session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);

    for n in 0..EVENT_QUEUE_DEPTH {
        assert!(events.post(LinkEvent::Message {
            topic: "/flood".into(),
            payload: n.to_string(),
        }));
    }
    assert!(events.post(LinkEvent::Connected));
    for _ in 0..20 {
        assert!(events.post(LinkEvent::Reconnect));
    }
    session.borrow_mut().process_pending();

    assert_eq!(outcome.try_take(), Some(Ok(())));
    assert_eq!(record.borrow().hats.len(), EVENT_QUEUE_DEPTH);
    let last = (EVENT_QUEUE_DEPTH - 1).to_string();
    assert_eq!(session.borrow().message(), Some(last.as_str()));
    assert_eq!(session.borrow().state(), SessionState::Failed { attempts: 6 });
}

#[test]
fn publish_and_subscribe_pass_through_live_client() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    session.borrow_mut().subscribe("/ignored");
    session.borrow_mut().connect("h", "c", None, None);
    session.borrow_mut().subscribe("/t");
    session.borrow_mut().publish("/t", "1");

    assert_eq!(
        record.borrow().calls,
        vec![
            ClientCall::Open {
                generation: 1,
                url: "ws://h:9234".into()
            },
            ClientCall::Subscribe {
                generation: 1,
                topic: "/t".into()
            },
            ClientCall::Publish {
                generation: 1,
                topic: "/t".into(),
                payload: "1".into()
            },
        ]
    );
}

#[test]
fn credentials_require_username() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    session.borrow_mut().connect("h", "c", Some(""), Some("key"));
    session.borrow_mut().connect("h", "c", Some("id"), Some("key"));

    let r = record.borrow();
    assert_eq!(r.opened[0].1.username, None);
    assert_eq!(r.opened[0].1.password, None);
    assert_eq!(r.opened[1].1.username.as_deref(), Some("id"));
    assert_eq!(r.opened[1].1.password.as_deref(), Some("key"));
}

#[test]
fn pump_resolves_outcome_on_executor() {
    let (session, record, queue) = new_session(SessionConfig::default());
    let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
    executor.spawn(pump_events(Rc::clone(&session), queue)).detach();

    let outcome = session.borrow_mut().connect("h", "c", None, None);
    record.borrow().sender(0).post(LinkEvent::Connected);

    let result = futures_lite::future::block_on(executor.run(outcome.wait()));
    assert_eq!(result, Ok(()));
    assert_eq!(session.borrow().state(), SessionState::Connected);
}

#[test]
fn pump_rejects_after_retry_budget() {
    let (session, record, queue) = new_session(SessionConfig::default());
    let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
    executor.spawn(pump_events(Rc::clone(&session), queue)).detach();

    let outcome = session.borrow_mut().connect("h", "c", None, None);
    let events = record.borrow().sender(0);
    for _ in 0..6 {
        events.post(LinkEvent::Reconnect);
    }

    let result = futures_lite::future::block_on(executor.run(outcome.wait()));
    assert_eq!(result, Err(SessionError::RetryBudgetExceeded));
    assert!(!session.borrow().has_client());
}
