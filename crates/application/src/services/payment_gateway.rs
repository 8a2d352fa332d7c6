//! Payment gateway trait and mock implementation.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{OrderId, PaymentId, PaymentMethod};
use shared_kernel::Money;
use thiserror::Error;
use tokio::sync::Mutex;

/// A charge sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
}

/// What the gateway decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// The gateway could not decide.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Trait for charging payments.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}

#[derive(Debug)]
struct MockGatewayState {
    approval_limit: Money,
    next_id: u32,
    force_decline: bool,
    unavailable: bool,
    history_limit: usize,
    charges: VecDeque<ChargeRequest>,
}

/// In-process gateway.
///
/// Approves charges up to the approval limit with sequential `TXN-0001`
/// style transaction ids. Can be told to decline everything or to fail as
/// if the gateway were down. Charges are only remembered when built with
/// [`with_history`](Self::with_history), and then only the most recent ones.
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
    state: Arc<Mutex<MockGatewayState>>,
}

impl MockPaymentGateway {
    /// Default approval limit in cents.
    pub const DEFAULT_APPROVAL_LIMIT_CENTS: i64 = 1_000_000;

    pub fn new(approval_limit: Money) -> Self {
        Self::with_history(approval_limit, 0)
    }

    /// Creates a gateway that keeps the last `history_limit` charges.
    pub fn with_history(approval_limit: Money, history_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockGatewayState {
                approval_limit,
                next_id: 0,
                force_decline: false,
                unavailable: false,
                history_limit,
                charges: VecDeque::with_capacity(history_limit),
            })),
        }
    }

    pub async fn set_force_decline(&self, decline: bool) {
        self.state.lock().await.force_decline = decline;
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Recent charges the gateway has seen, approved or not, oldest first.
    pub async fn charges(&self) -> Vec<ChargeRequest> {
        self.state.lock().await.charges.iter().cloned().collect()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new(Money::from_cents(Self::DEFAULT_APPROVAL_LIMIT_CENTS))
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(payment_id = %request.payment_id, amount = %request.amount))]
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let mut state = self.state.lock().await;

        if state.unavailable {
            metrics::counter!("payments_processed_total", "outcome" => "error").increment(1);
            return Err(GatewayError::Unavailable("connection refused".to_string()));
        }

        let outcome = if state.force_decline {
            ChargeOutcome::Declined {
                reason: "Card declined".to_string(),
            }
        } else if request.amount > state.approval_limit {
            ChargeOutcome::Declined {
                reason: format!("Amount exceeds approval limit of {}", state.approval_limit),
            }
        } else {
            state.next_id += 1;
            ChargeOutcome::Approved {
                transaction_id: format!("TXN-{:04}", state.next_id),
            }
        };
        if state.history_limit > 0 {
            if state.charges.len() == state.history_limit {
                state.charges.pop_front();
            }
            state.charges.push_back(request);
        }

        let label = match outcome {
            ChargeOutcome::Approved { .. } => "approved",
            ChargeOutcome::Declined { .. } => "declined",
        };
        metrics::counter!("payments_processed_total", "outcome" => label).increment(1);
        tracing::info!(outcome = label, "charge processed");

        Ok(outcome)
    }
}
