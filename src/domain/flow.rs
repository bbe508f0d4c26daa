use super::payment::TransactionDetails;

/// The observable state of a payment flow.
///
/// A flow moves `Idle -> RequestingReference -> AwaitingGatewayResult ->
/// VerifyingSettlement` and stops in one of five terminal states. Only an
/// explicit reset leaves a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    RequestingReference,
    AwaitingGatewayResult {
        merchant_transaction_id: String,
    },
    VerifyingSettlement {
        merchant_transaction_id: String,
    },
    Success(TransactionDetails),
    Pending {
        details: TransactionDetails,
        reason: String,
    },
    Failed {
        details: TransactionDetails,
        reason: String,
    },
    Error(String),
    Cancelled,
}

/// Where a consumer should send the user once a flow has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalRoute {
    Confirmation,
    PendingRetry,
    FailedRetry,
    Dismissible,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        self.route().is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            FlowState::RequestingReference
                | FlowState::AwaitingGatewayResult { .. }
                | FlowState::VerifyingSettlement { .. }
        )
    }

    pub fn route(&self) -> Option<TerminalRoute> {
        match self {
            FlowState::Success(_) => Some(TerminalRoute::Confirmation),
            FlowState::Pending { .. } => Some(TerminalRoute::PendingRetry),
            FlowState::Failed { .. } => Some(TerminalRoute::FailedRetry),
            FlowState::Error(_) | FlowState::Cancelled => Some(TerminalRoute::Dismissible),
            _ => None,
        }
    }

    /// Stable snake_case label, used in logs and batch output.
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::RequestingReference => "requesting_reference",
            FlowState::AwaitingGatewayResult { .. } => "awaiting_gateway_result",
            FlowState::VerifyingSettlement { .. } => "verifying_settlement",
            FlowState::Success(_) => "success",
            FlowState::Pending { .. } => "pending",
            FlowState::Failed { .. } => "failed",
            FlowState::Error(_) => "error",
            FlowState::Cancelled => "cancelled",
        }
    }

    pub fn details(&self) -> Option<&TransactionDetails> {
        match self {
            FlowState::Success(details)
            | FlowState::Pending { details, .. }
            | FlowState::Failed { details, .. } => Some(details),
            _ => None,
        }
    }

    /// The human-readable reason a terminal state carries, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            FlowState::Success(details) => details.message.as_deref(),
            FlowState::Pending { reason, .. }
            | FlowState::Failed { reason, .. }
            | FlowState::Error(reason) => Some(reason),
            _ => None,
        }
    }
}
