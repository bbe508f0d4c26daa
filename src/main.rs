use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use opd_payflow::application::orchestrator::PaymentFlowOrchestrator;
use opd_payflow::application::projection::BookingUiState;
use opd_payflow::config::FlowConfig;
use opd_payflow::domain::ports::{SharedGateway, SharedReferenceService, SharedStatusService};
use opd_payflow::error::PaymentError;
use opd_payflow::infrastructure::http::HttpPaymentBackend;
use opd_payflow::infrastructure::in_memory::{InMemoryPaymentBackend, SettlementScript};
use opd_payflow::infrastructure::simulated_gateway::{GatewayScript, SimulatedGateway};
use opd_payflow::interfaces::csv::booking_reader::BookingReader;
use opd_payflow::interfaces::csv::outcome_writer::OutcomeWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GatewayOutcome {
    Success,
    Failure,
    Cancelled,
}

impl From<GatewayOutcome> for GatewayScript {
    fn from(outcome: GatewayOutcome) -> Self {
        match outcome {
            GatewayOutcome::Success => GatewayScript::Success,
            GatewayOutcome::Failure => GatewayScript::Failure("Payment declined by gateway".into()),
            GatewayOutcome::Cancelled => GatewayScript::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SettlementOutcome {
    Success,
    Pending,
    Failed,
}

impl From<SettlementOutcome> for SettlementScript {
    fn from(outcome: SettlementOutcome) -> Self {
        match outcome {
            SettlementOutcome::Success => SettlementScript::Success,
            SettlementOutcome::Pending => SettlementScript::Pending,
            SettlementOutcome::Failed => SettlementScript::Failed,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input bookings CSV file
    input: PathBuf,

    /// Hospital backend endpoint. Without it an in-memory backend is used.
    #[arg(long, env = "OPD_PAYFLOW_BASE_URL")]
    base_url: Option<String>,

    /// JSON file with flow timeouts
    #[arg(long)]
    config: Option<PathBuf>,

    /// Outcome the simulated payment gateway reports
    #[arg(long, value_enum, default_value_t = GatewayOutcome::Success)]
    gateway_outcome: GatewayOutcome,

    /// Settlement the in-memory backend reports
    #[arg(long, value_enum, default_value_t = SettlementOutcome::Success)]
    settlement: SettlementOutcome,

    #[arg(long, env = "OPD_PAYFLOW_REFERENCE_TIMEOUT_SECS")]
    reference_timeout_secs: Option<u64>,

    #[arg(long, env = "OPD_PAYFLOW_STATUS_TIMEOUT_SECS")]
    status_timeout_secs: Option<u64>,
}

impl Cli {
    fn flow_config(&self) -> Result<FlowConfig, PaymentError> {
        let mut config = match &self.config {
            Some(path) => FlowConfig::from_file(path)?,
            None => FlowConfig::default(),
        };
        if let Some(secs) = self.reference_timeout_secs {
            config.reference_timeout_secs = secs;
        }
        if let Some(secs) = self.status_timeout_secs {
            config.status_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("OPD_PAYFLOW_LOG")
        .from_env()
        .into_diagnostic()?;

    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = cli.flow_config().into_diagnostic()?;

    let (references, statuses): (SharedReferenceService, SharedStatusService) =
        if let Some(base_url) = &cli.base_url {
            info!(%base_url, "using HTTP payment backend");
            let backend = Arc::new(HttpPaymentBackend::new(base_url.clone()));
            let references: SharedReferenceService = backend.clone();
            let statuses: SharedStatusService = backend;
            (references, statuses)
        } else {
            info!(settlement = ?cli.settlement, "using in-memory payment backend");
            let backend = Arc::new(InMemoryPaymentBackend::new(cli.settlement.into()));
            let references: SharedReferenceService = backend.clone();
            let statuses: SharedStatusService = backend;
            (references, statuses)
        };
    let gateway: SharedGateway = Arc::new(SimulatedGateway::new(cli.gateway_outcome.into()));

    let orchestrator = PaymentFlowOrchestrator::new(references, gateway, statuses, config);

    let file = File::open(&cli.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for booking in BookingReader::new(file).bookings() {
        let booking = match booking {
            Ok(booking) => booking,
            Err(e) => {
                error!("Error reading booking: {}", e);
                continue;
            }
        };

        let order_id = booking.order_id.clone();
        let events = orchestrator.start(booking).into_diagnostic()?;
        let mut ui = BookingUiState::new();
        let terminal = ui.follow(events).await.clone();
        info!(
            %order_id,
            outcome = terminal.name(),
            route = ?ui.route(),
            "payment flow finished"
        );

        writer.write_outcome(&order_id, &terminal).into_diagnostic()?;
        orchestrator.reset();
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
