#![allow(dead_code)]

use async_trait::async_trait;
use opd_payflow::application::orchestrator::PaymentFlowOrchestrator;
use opd_payflow::config::FlowConfig;
use opd_payflow::domain::booking::{Amount, BookingParams};
use opd_payflow::domain::flow::FlowState;
use opd_payflow::domain::payment::{PaymentOutcome, PaymentReference, SettlementStatus};
use opd_payflow::domain::ports::{
    PaymentGateway, PaymentReferenceService, PaymentResultCallback, PaymentStatusService,
};
use opd_payflow::error::{PaymentError, Result};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn booking(order_id: &str) -> BookingParams {
    BookingParams {
        mobile: "9876543210".to_string(),
        amount: Amount::new(dec!(300.00)).unwrap(),
        patient_id: "P-17".to_string(),
        patient_name: "Asha Rao".to_string(),
        doctor_name: "Dr. Mehta".to_string(),
        doctor_id: "D-4".to_string(),
        slot_start: "2025-01-10 10:30".to_string(),
        duration: 15,
        opd_type: "general".to_string(),
        order_id: order_id.to_string(),
    }
}

pub fn names(states: &[FlowState]) -> Vec<&'static str> {
    states.iter().map(FlowState::name).collect()
}

pub enum ReferenceScript {
    Issue(&'static str),
    Fail(&'static str),
    Hang,
}

pub struct ScriptedReferences {
    script: ReferenceScript,
    calls: AtomicUsize,
}

impl ScriptedReferences {
    pub fn new(script: ReferenceScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentReferenceService for ScriptedReferences {
    async fn get_reference(&self, _booking: &BookingParams) -> Result<PaymentReference> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ReferenceScript::Issue(id) => Ok(PaymentReference {
                merchant_transaction_id: id.to_string(),
                payload_base64: "eyJtZXJjaGFudElkIjoiSE9TUCJ9".to_string(),
                checksum: "d41d8cd9###1".to_string(),
                api_endpoint: "/pg/v1/pay".to_string(),
            }),
            ReferenceScript::Fail(reason) => Err(PaymentError::ServerError(reason.to_string())),
            ReferenceScript::Hang => std::future::pending().await,
        }
    }
}

/// A gateway the test drives by hand.
#[derive(Default)]
pub struct ManualGateway {
    callbacks: Mutex<Vec<PaymentResultCallback>>,
    opened: Notify,
    dismissable: bool,
    dismissals: AtomicUsize,
}

impl ManualGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn dismissable() -> Arc<Self> {
        Arc::new(Self {
            dismissable: true,
            ..Self::default()
        })
    }

    /// Waits until the orchestrator has opened a payment page.
    pub async fn wait_opened(&self) {
        self.opened.notified().await;
    }

    /// Fires the callback of the most recent payment page.
    pub fn fire(&self, outcome: PaymentOutcome) -> bool {
        let callback = self
            .callbacks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no payment page opened");
        callback.complete(outcome)
    }

    pub fn invocations(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for ManualGateway {
    fn start_payment(&self, _: &str, _: &str, _: &str, on_result: PaymentResultCallback) {
        self.callbacks.lock().unwrap().push(on_result);
        self.opened.notify_one();
    }

    fn dismiss(&self) -> bool {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
        self.dismissable
    }
}

pub enum StatusScript {
    Respond(SettlementStatus),
    Fail(&'static str),
    Hang,
}

pub struct ScriptedStatus {
    script: StatusScript,
    calls: AtomicUsize,
}

impl ScriptedStatus {
    pub fn new(script: StatusScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn settled(token_number: &str, scheduled_date: &str) -> Arc<Self> {
        Self::new(StatusScript::Respond(SettlementStatus {
            is_success: true,
            is_pending: false,
            message_code: "PAYMENT_SUCCESS".to_string(),
            message: "Your payment is successful.".to_string(),
            transaction_id: "PG-T1".to_string(),
            booking_id: Some("OPD-5012".to_string()),
            token_number: Some(token_number.to_string()),
            scheduled_date: Some(scheduled_date.to_string()),
            estimated_time: Some("10:45".to_string()),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStatusService for ScriptedStatus {
    async fn get_status(&self, _: &str, _: &BookingParams) -> Result<SettlementStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            StatusScript::Respond(status) => Ok(status.clone()),
            StatusScript::Fail(reason) => Err(PaymentError::ServerError(reason.to_string())),
            StatusScript::Hang => std::future::pending().await,
        }
    }
}

pub fn orchestrator(
    references: Arc<ScriptedReferences>,
    gateway: Arc<ManualGateway>,
    status: Arc<ScriptedStatus>,
) -> PaymentFlowOrchestrator {
    orchestrator_with(references, gateway, status, FlowConfig::default())
}

pub fn orchestrator_with(
    references: Arc<ScriptedReferences>,
    gateway: Arc<ManualGateway>,
    status: Arc<ScriptedStatus>,
    config: FlowConfig,
) -> PaymentFlowOrchestrator {
    PaymentFlowOrchestrator::new(references, gateway, status, config)
}
