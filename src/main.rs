use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hms_client::{ClientConfig, RestBackend};
use hms_core::constants::{API_URL_ENV, ROLE_ENV, TIMEOUT_ENV, TOKEN_ENV, USER_ID_ENV};
use hms_core::lifecycle;
use hms_core::models::{
    Appointment, Diagnosis, Doctor, InsuranceClaim, InsuranceContract, LabRequest, LabResult,
    LabResultDraft, Medicine, Patient, Prescription,
};
use hms_core::services::{LabWorkflow, Pharmacy, StatusTransitions};
use hms_core::views::RoleView;
use hms_core::{
    AuthContext, Backend, HmsError, HmsResult, Resource, ResourceKind, ResourceManager,
};
use hms_types::{NonEmptyText, RecordId, Role};

mod render;

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital management client")]
struct Cli {
    /// Backend API base URL
    #[arg(long, env = API_URL_ENV, global = true)]
    api_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, env = TIMEOUT_ENV, global = true)]
    timeout_secs: Option<String>,
    /// Bearer token issued by the login flow
    #[arg(long, env = TOKEN_ENV, hide_env_values = true, global = true)]
    token: Option<String>,
    /// Role of the signed-in user
    #[arg(long, env = ROLE_ENV, default_value = "patient", global = true)]
    role: Role,
    /// User account id of the signed-in user
    #[arg(long, env = USER_ID_ENV, global = true)]
    user_id: Option<RecordId>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the page for the current role
    View,
    /// Move a record to a new status
    Transition {
        /// Resource type, e.g. appointment or lab_requests
        resource: ResourceKind,
        id: RecordId,
        /// Target status, e.g. confirmed
        status: String,
    },
    /// Complete a lab request with its result
    CompleteLab {
        id: RecordId,
        /// Result details
        #[arg(long)]
        details: Option<String>,
    },
    /// Buy units of one medicine
    Purchase { medicine: RecordId, quantity: u32 },
    /// Buy several medicines at once
    Cart {
        /// Items as MEDICINE_ID=QUANTITY
        #[arg(required = true, num_args(1..), value_parser = parse_key_val::<RecordId, u32>)]
        items: Vec<(RecordId, u32)>,
    },
    /// Print every record of a resource type as JSON
    List { resource: ResourceKind },
    /// Create a record from a JSON draft
    Create {
        resource: ResourceKind,
        /// Draft fields, e.g. '{"name": "Paracetamol", "quantity": 20, "price": "2.50"}'
        #[arg(long)]
        json: String,
    },
    /// Change fields of a record; status changes go through `transition`
    Update {
        resource: ResourceKind,
        id: RecordId,
        /// Fields to change as a JSON object
        #[arg(long)]
        json: String,
    },
    /// Delete a record
    Delete { resource: ResourceKind, id: RecordId },
    /// Check a status transition without contacting the backend
    Check {
        resource: ResourceKind,
        from: String,
        to: String,
    },
}

/// Runs `$body` with `$R` bound to the record type for `$kind`.
macro_rules! with_resource {
    ($kind:expr, $R:ident => $body:expr) => {
        match $kind {
            ResourceKind::Patient => {
                type $R = Patient;
                $body
            }
            ResourceKind::Doctor => {
                type $R = Doctor;
                $body
            }
            ResourceKind::Appointment => {
                type $R = Appointment;
                $body
            }
            ResourceKind::Diagnosis => {
                type $R = Diagnosis;
                $body
            }
            ResourceKind::Prescription => {
                type $R = Prescription;
                $body
            }
            ResourceKind::LabRequest => {
                type $R = LabRequest;
                $body
            }
            ResourceKind::LabResult => {
                type $R = LabResult;
                $body
            }
            ResourceKind::Medicine => {
                type $R = Medicine;
                $body
            }
            ResourceKind::InsuranceContract => {
                type $R = InsuranceContract;
                $body
            }
            ResourceKind::InsuranceClaim => {
                type $R = InsuranceClaim;
                $body
            }
        }
    };
}

/// Main entry point for the HMS client
///
/// Loads `.env`, initialises logging, resolves the client configuration once and runs one
/// subcommand against the backend.
///
/// # Environment Variables
/// - `HMS_API_URL`: backend base URL (default: "http://localhost:8080/api/")
/// - `HMS_TIMEOUT_SECS`: per-request timeout (default: 5)
/// - `HMS_TOKEN`, `HMS_ROLE`, `HMS_USER_ID`: the session
///
/// # Errors
/// Returns an error (and the process exits non-zero) if configuration is invalid or the
/// command fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hms=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::Check { resource, from, to } = &cli.command {
        return check(*resource, from, to);
    }

    let Some(user_id) = cli.user_id else {
        anyhow::bail!("--user-id (or {USER_ID_ENV}) is required");
    };
    let auth = AuthContext::new(cli.token, cli.role, user_id);
    let config = ClientConfig::from_env_values(cli.api_url, cli.timeout_secs)?;
    tracing::debug!("using backend at {}", config.base_url());
    let backend = RestBackend::new(config)?;

    run(&backend, &auth, cli.command).await
}

async fn run<B: Backend>(
    backend: &B,
    auth: &AuthContext,
    command: Commands,
) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    match command {
        Commands::View => {
            let view = RoleView::load(backend, auth).await?;
            render::view(&mut out, &view)?;
        }
        Commands::Transition {
            resource,
            id,
            status,
        } => {
            let outcome = StatusTransitions::new(backend, auth)
                .transition_named(resource, id, &status)
                .await?;
            render::transition(&mut out, &outcome)?;
        }
        Commands::CompleteLab { id, details } => {
            let draft = details
                .map(|d| NonEmptyText::new(d).map(|d| LabResultDraft::now(id, d)))
                .transpose()?;
            let done = LabWorkflow::new(backend, auth).complete(id, draft).await?;
            render::completed_lab(&mut out, &done)?;
        }
        Commands::Purchase { medicine, quantity } => {
            let updated = Pharmacy::new(backend, auth).purchase(medicine, quantity).await?;
            render::stock(&mut out, &updated)?;
        }
        Commands::Cart { items } => {
            let cart = merge_cart(items)?;
            let receipt = Pharmacy::new(backend, auth).purchase_cart(&cart).await?;
            render::receipt(&mut out, &receipt)?;
        }
        Commands::List { resource } => {
            let json = with_resource!(resource, R => {
                let records = ResourceManager::<R, B>::new(backend, auth).list().await?;
                serde_json::to_string_pretty(&records)?
            });
            render::line(&mut out, &json)?;
        }
        Commands::Create { resource, json } => {
            let json = with_resource!(resource, R => {
                let draft: <R as Resource>::Draft = serde_json::from_str(&json).map_err(|e| {
                    HmsError::Validation(format!("invalid {resource} draft: {e}"))
                })?;
                let created = ResourceManager::<R, B>::new(backend, auth).create(&draft).await?;
                serde_json::to_string_pretty(&created)?
            });
            render::line(&mut out, &json)?;
        }
        Commands::Update { resource, id, json } => {
            let fields: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| HmsError::Validation(format!("invalid {resource} update: {e}")))?;
            let json = with_resource!(resource, R => {
                let updated = ResourceManager::<R, B>::new(backend, auth)
                    .update(id, &fields)
                    .await?;
                serde_json::to_string_pretty(&updated)?
            });
            render::line(&mut out, &json)?;
        }
        Commands::Delete { resource, id } => {
            with_resource!(resource, R => {
                ResourceManager::<R, B>::new(backend, auth).delete(id).await?
            });
            render::line(&mut out, &format!("deleted {resource} {id}"))?;
        }
        Commands::Check { resource, from, to } => check(resource, &from, &to)?,
    }
    Ok(())
}

/// Validates a transition offline and prints the allowed targets from `from`.
fn check(resource: ResourceKind, from: &str, to: &str) -> anyhow::Result<()> {
    let allowed = lifecycle::allowed_targets(resource, from)?;
    let mut out = std::io::stdout().lock();
    render::allowed(&mut out, resource, from, &allowed)?;
    lifecycle::validate(resource, from, to)?;
    render::line(&mut out, &format!("ok: {resource} {from} -> {to}"))?;
    Ok(())
}

/// Folds repeated cart lines for the same medicine into one quantity.
fn merge_cart(items: Vec<(RecordId, u32)>) -> HmsResult<BTreeMap<RecordId, u32>> {
    let mut cart = BTreeMap::new();
    for (medicine, quantity) in items {
        let line = cart.entry(medicine).or_insert(0u32);
        *line = line.checked_add(quantity).ok_or_else(|| {
            HmsError::Validation(format!("quantity for medicine {medicine} is too large"))
        })?;
    }
    Ok(cart)
}

/// Parse a single key-value pair
fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn StdError + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: StdError + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: StdError + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid MEDICINE_ID=QUANTITY: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}
