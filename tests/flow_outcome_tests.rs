mod common;

use common::{
    ManualGateway, ReferenceScript, ScriptedReferences, ScriptedStatus, StatusScript, booking,
    names, orchestrator,
};
use opd_payflow::domain::flow::{FlowState, TerminalRoute};
use opd_payflow::domain::payment::{PaymentOutcome, SettlementStatus};

#[tokio::test]
async fn test_happy_path_emits_stages_in_order() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::settled("42", "2025-01-10");
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    assert!(gateway.fire(PaymentOutcome::Success));

    let states = events.collect().await;
    assert_eq!(
        names(&states),
        vec![
            "requesting_reference",
            "awaiting_gateway_result",
            "verifying_settlement",
            "success"
        ]
    );

    match states.last().unwrap() {
        FlowState::Success(details) => {
            assert_eq!(details.merchant_transaction_id.as_deref(), Some("T1"));
            assert_eq!(details.token_number(), Some("42"));
            let confirmation = details.confirmation.as_ref().unwrap();
            assert_eq!(confirmation.scheduled_date, "2025-01-10");
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(
        states[1],
        FlowState::AwaitingGatewayResult {
            merchant_transaction_id: "T1".to_string()
        }
    );
}

#[tokio::test]
async fn test_reference_failure_skips_gateway() {
    let references = ScriptedReferences::new(ReferenceScript::Fail("timeout"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::settled("42", "2025-01-10");
    let orchestrator = orchestrator(references, gateway.clone(), status.clone());

    let states = orchestrator.start(booking("ORD1")).unwrap().collect().await;

    assert_eq!(
        states,
        vec![
            FlowState::RequestingReference,
            FlowState::Error("timeout".to_string())
        ]
    );
    assert_eq!(gateway.invocations(), 0);
    assert_eq!(status.calls(), 0);
}

#[tokio::test]
async fn test_gateway_cancel_skips_settlement_check() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::settled("42", "2025-01-10");
    let orchestrator = orchestrator(references, gateway.clone(), status.clone());

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Cancelled);

    let states = events.collect().await;
    assert_eq!(
        names(&states),
        vec!["requesting_reference", "awaiting_gateway_result", "cancelled"]
    );
    assert_eq!(status.calls(), 0);
    assert_eq!(orchestrator.state().route(), Some(TerminalRoute::Dismissible));
}

#[tokio::test]
async fn test_gateway_failure_is_error() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::settled("42", "2025-01-10");
    let orchestrator = orchestrator(references, gateway.clone(), status.clone());

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Failure("PAYMENT_DECLINED".to_string()));

    assert_eq!(
        events.terminal().await,
        Some(FlowState::Error("PAYMENT_DECLINED".to_string()))
    );
    assert_eq!(status.calls(), 0);
}

#[tokio::test]
async fn test_pending_carries_message_unchanged() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::new(StatusScript::Respond(SettlementStatus {
        is_pending: true,
        message_code: "PAYMENT_PENDING".to_string(),
        message: "awaiting bank confirmation".to_string(),
        transaction_id: "PG-T1".to_string(),
        ..Default::default()
    }));
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Success);

    match events.terminal().await {
        Some(FlowState::Pending { details, reason }) => {
            assert_eq!(reason, "awaiting bank confirmation");
            assert_eq!(details.transaction_id.as_deref(), Some("PG-T1"));
            assert!(details.confirmation.is_none());
        }
        other => panic!("expected pending, got {other:?}"),
    }
}

#[tokio::test]
async fn test_neither_success_nor_pending_is_failed() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::new(StatusScript::Respond(SettlementStatus {
        message_code: "PAYMENT_ERROR".to_string(),
        message: "Payment failed at bank".to_string(),
        ..Default::default()
    }));
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Success);

    let terminal = events.terminal().await.unwrap();
    assert_eq!(terminal.name(), "failed");
    assert_eq!(terminal.reason(), Some("Payment failed at bank"));
    assert_eq!(terminal.route(), Some(TerminalRoute::FailedRetry));
}

#[tokio::test]
async fn test_success_without_token_is_error() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::new(StatusScript::Respond(SettlementStatus {
        is_success: true,
        message: "Your payment is successful.".to_string(),
        booking_id: Some("OPD-5012".to_string()),
        token_number: None,
        scheduled_date: Some("2025-01-10".to_string()),
        estimated_time: Some("10:45".to_string()),
        ..Default::default()
    }));
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Success);

    let terminal = events.terminal().await.unwrap();
    assert!(matches!(terminal, FlowState::Error(ref reason) if reason.contains("tokenNumber")));
}

#[tokio::test]
async fn test_status_call_failure_is_error_not_failed() {
    let references = ScriptedReferences::new(ReferenceScript::Issue("T1"));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::new(StatusScript::Fail("connection reset"));
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let events = orchestrator.start(booking("ORD1")).unwrap();
    gateway.wait_opened().await;
    gateway.fire(PaymentOutcome::Success);

    let states = events.collect().await;
    assert_eq!(
        names(&states),
        vec![
            "requesting_reference",
            "awaiting_gateway_result",
            "verifying_settlement",
            "error"
        ]
    );
    assert_eq!(
        states.last(),
        Some(&FlowState::Error("connection reset".to_string()))
    );
}

#[tokio::test]
async fn test_empty_reference_is_error() {
    let references = ScriptedReferences::new(ReferenceScript::Issue(""));
    let gateway = ManualGateway::new();
    let status = ScriptedStatus::settled("42", "2025-01-10");
    let orchestrator = orchestrator(references, gateway.clone(), status);

    let terminal = orchestrator.start(booking("ORD1")).unwrap().terminal().await;
    assert_eq!(
        terminal,
        Some(FlowState::Error("empty payment reference".to_string()))
    );
    assert_eq!(gateway.invocations(), 0);
}
