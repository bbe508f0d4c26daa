use crate::config::FlowConfig;
use crate::domain::booking::BookingParams;
use crate::domain::flow::FlowState;
use crate::domain::payment::{PaymentOutcome, Settlement, SettlementStatus, TransactionDetails};
use crate::domain::ports::{
    PaymentResultCallback, SharedGateway, SharedReferenceService, SharedStatusService,
};
use crate::error::{PaymentError, Result};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info_span, Instrument};

const REFERENCE_REQUEST: &str = "payment reference request";
const STATUS_REQUEST: &str = "payment status request";
const GATEWAY_WAIT: &str = "payment gateway";

enum Phase {
    Idle,
    Running {
        state: FlowState,
        cancel: watch::Sender<bool>,
    },
    Finished(FlowState),
}

/// Drives one payment attempt at a time from booking to terminal outcome.
///
/// Each accepted `start` spawns the flow on the current tokio runtime and
/// hands back a [`FlowEvents`] stream. States arrive in the order they are
/// generated; the stream ends after the terminal state, or silently after a
/// cancellation that returned the orchestrator to `Idle`.
pub struct PaymentFlowOrchestrator {
    reference_service: SharedReferenceService,
    gateway: SharedGateway,
    status_service: SharedStatusService,
    config: FlowConfig,
    phase: Arc<Mutex<Phase>>,
}

impl PaymentFlowOrchestrator {
    pub fn new(
        reference_service: SharedReferenceService,
        gateway: SharedGateway,
        status_service: SharedStatusService,
        config: FlowConfig,
    ) -> Self {
        Self {
            reference_service,
            gateway,
            status_service,
            config,
            phase: Arc::new(Mutex::new(Phase::Idle)),
        }
    }

    /// Starts a payment flow for `booking`.
    ///
    /// Only accepted from `Idle`, and only from within a tokio runtime.
    pub fn start(&self, booking: BookingParams) -> Result<FlowEvents> {
        let runtime = Handle::try_current().map_err(|_| PaymentError::NoRuntimeError)?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut phase = lock(&self.phase);
            match &*phase {
                Phase::Idle => {}
                Phase::Running { .. } => return Err(PaymentError::FlowAlreadyActiveError),
                Phase::Finished(_) => return Err(PaymentError::FlowNotResetError),
            }
            *phase = Phase::Running {
                state: FlowState::RequestingReference,
                cancel: cancel_tx,
            };
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let span = info_span!("payment_flow", order_id = %booking.order_id);
        let run = FlowRun {
            reference_service: Arc::clone(&self.reference_service),
            gateway: Arc::clone(&self.gateway),
            status_service: Arc::clone(&self.status_service),
            config: self.config.clone(),
            phase: Arc::clone(&self.phase),
            events: events_tx,
            cancel: cancel_rx,
        };
        runtime.spawn(run.drive(booking).instrument(span));

        Ok(FlowEvents { rx: events_rx })
    }

    /// Requests cancellation of the in-flight flow.
    ///
    /// Returns `false` when no flow is in flight.
    pub fn cancel(&self) -> bool {
        match &*lock(&self.phase) {
            Phase::Running { cancel, .. } => {
                cancel.send_replace(true);
                true
            }
            _ => false,
        }
    }

    /// Returns to `Idle` from a terminal state. A no-op otherwise.
    pub fn reset(&self) -> bool {
        let mut phase = lock(&self.phase);
        if matches!(*phase, Phase::Finished(_)) {
            *phase = Phase::Idle;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> FlowState {
        match &*lock(&self.phase) {
            Phase::Idle => FlowState::Idle,
            Phase::Running { state, .. } => state.clone(),
            Phase::Finished(state) => state.clone(),
        }
    }
}

/// The ordered stream of states emitted by one flow.
#[derive(Debug)]
pub struct FlowEvents {
    rx: mpsc::UnboundedReceiver<FlowState>,
}

impl FlowEvents {
    pub async fn recv(&mut self) -> Option<FlowState> {
        self.rx.recv().await
    }

    /// Drains the stream, returning every state in emission order.
    pub async fn collect(mut self) -> Vec<FlowState> {
        let mut states = Vec::new();
        while let Some(state) = self.rx.recv().await {
            states.push(state);
        }
        states
    }

    /// Drains the stream and returns the terminal state, if one was emitted.
    pub async fn terminal(self) -> Option<FlowState> {
        self.collect()
            .await
            .into_iter()
            .last()
            .filter(FlowState::is_terminal)
    }
}

enum GatewayWait {
    Outcome(PaymentOutcome),
    Dismissed,
    Abandoned,
    Lost,
    TimedOut(Duration),
}

struct FlowRun {
    reference_service: SharedReferenceService,
    gateway: SharedGateway,
    status_service: SharedStatusService,
    config: FlowConfig,
    phase: Arc<Mutex<Phase>>,
    events: mpsc::UnboundedSender<FlowState>,
    cancel: watch::Receiver<bool>,
}

impl FlowRun {
    async fn drive(mut self, booking: BookingParams) {
        match self.run(booking).await {
            Some(terminal) => {
                debug!(state = terminal.name(), "payment flow finished");
                *lock(&self.phase) = Phase::Finished(terminal.clone());
                let _ = self.events.send(terminal);
            }
            None => {
                debug!("payment flow cancelled");
                *lock(&self.phase) = Phase::Idle;
            }
        }
    }

    /// Runs the three stages. `None` means the flow was abandoned.
    async fn run(&mut self, booking: BookingParams) -> Option<FlowState> {
        let mut details = TransactionDetails::new(booking);

        self.emit(FlowState::RequestingReference);
        let reference = match guarded(
            &mut self.cancel,
            REFERENCE_REQUEST,
            self.config.reference_timeout(),
            self.reference_service.get_reference(&details.booking),
        )
        .await?
        {
            Ok(reference) if reference.merchant_transaction_id.trim().is_empty() => {
                return Some(FlowState::Error("empty payment reference".to_string()));
            }
            Ok(reference) => reference,
            Err(e) => return Some(FlowState::Error(e.to_string())),
        };
        details.record_reference(&reference);
        let merchant_transaction_id = reference.merchant_transaction_id.clone();

        self.emit(FlowState::AwaitingGatewayResult {
            merchant_transaction_id: merchant_transaction_id.clone(),
        });
        let (callback, outcome_rx) = PaymentResultCallback::new(&merchant_transaction_id);
        self.gateway.start_payment(
            &reference.payload_base64,
            &reference.checksum,
            &reference.api_endpoint,
            callback,
        );
        match self.await_gateway(outcome_rx).await {
            GatewayWait::Outcome(PaymentOutcome::Success) => {}
            GatewayWait::Outcome(PaymentOutcome::Failure(message)) => {
                return Some(FlowState::Error(message));
            }
            GatewayWait::Outcome(PaymentOutcome::Cancelled) | GatewayWait::Dismissed => {
                return Some(FlowState::Cancelled);
            }
            GatewayWait::Abandoned => return None,
            GatewayWait::Lost => {
                return Some(FlowState::Error(
                    "payment gateway closed without reporting a result".to_string(),
                ));
            }
            GatewayWait::TimedOut(after) => {
                let err = PaymentError::TimeoutError {
                    operation: GATEWAY_WAIT,
                    after,
                };
                return Some(FlowState::Error(err.to_string()));
            }
        }

        self.emit(FlowState::VerifyingSettlement {
            merchant_transaction_id: merchant_transaction_id.clone(),
        });
        let status = match guarded(
            &mut self.cancel,
            STATUS_REQUEST,
            self.config.status_timeout(),
            self.status_service
                .get_status(&merchant_transaction_id, &details.booking),
        )
        .await?
        {
            Ok(status) => status,
            Err(e) => return Some(FlowState::Error(e.to_string())),
        };

        Some(settle(details, status))
    }

    async fn await_gateway(
        &mut self,
        mut outcome_rx: oneshot::Receiver<PaymentOutcome>,
    ) -> GatewayWait {
        let limit = self.config.gateway_timeout();
        let expiry = async move {
            match limit {
                Some(limit) => tokio::time::sleep_until(Instant::now() + limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);

        tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel) => {}
            outcome = &mut outcome_rx => {
                return match outcome {
                    Ok(outcome) => GatewayWait::Outcome(outcome),
                    Err(_) => GatewayWait::Lost,
                };
            }
            _ = &mut expiry => {
                return GatewayWait::TimedOut(limit.unwrap_or_default());
            }
        }

        if self.gateway.dismiss() {
            debug!("payment gateway dismissed");
            return GatewayWait::Dismissed;
        }

        // The gateway cannot be closed from outside; its eventual result is discarded.
        debug!("waiting for undismissable gateway before abandoning the flow");
        tokio::select! {
            _ = &mut outcome_rx => {}
            _ = &mut expiry => {}
        }
        GatewayWait::Abandoned
    }

    fn emit(&self, state: FlowState) {
        debug!(state = state.name(), "payment flow transition");
        if let Phase::Running { state: current, .. } = &mut *lock(&self.phase) {
            *current = state.clone();
        }
        let _ = self.events.send(state);
    }
}

/// Maps the authoritative settlement status onto a terminal state.
fn settle(mut details: TransactionDetails, status: SettlementStatus) -> FlowState {
    let verdict = match status.verdict() {
        Ok(verdict) => verdict,
        Err(e) => return FlowState::Error(e.to_string()),
    };
    details.record_settlement(&status);

    match verdict {
        Settlement::Confirmed(confirmation) => {
            details.confirm(confirmation);
            FlowState::Success(details)
        }
        Settlement::Pending => FlowState::Pending {
            details,
            reason: status.message,
        },
        Settlement::Failed => FlowState::Failed {
            details,
            reason: status.message,
        },
    }
}

/// Awaits a network stage under a timeout, racing it against cancellation.
///
/// `None` means cancellation won and the request was dropped.
async fn guarded<T, F>(
    cancel: &mut watch::Receiver<bool>,
    operation: &'static str,
    limit: Duration,
    request: F,
) -> Option<Result<T>>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        result = tokio::time::timeout(limit, request) => Some(match result {
            Ok(result) => result,
            Err(_) => Err(PaymentError::TimeoutError { operation, after: limit }),
        }),
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let requested = cancel.wait_for(|requested| *requested).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

fn lock(phase: &Mutex<Phase>) -> MutexGuard<'_, Phase> {
    phase.lock().unwrap_or_else(PoisonError::into_inner)
}
