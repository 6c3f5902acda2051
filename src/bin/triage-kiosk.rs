//! Triage Kiosk CLI Tool
//!
//! Command-line client for a running triage-desk service. Covers the patient
//! kiosk (check in, check my wait) and the staff view (queue, add, treat).
//!
//! Usage:
//!   cargo run --bin triage-kiosk -- --help
//!   cargo run --bin triage-kiosk check-in --name "Ada" --injury "sprained ankle" --pain 5
//!   cargo run --bin triage-kiosk status --name "Ada" --code 4821
//!   cargo run --bin triage-kiosk queue
//!   cargo run --bin triage-kiosk treat --id 3

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use triage_desk::http::dto::{
    AdmitResponse, CheckInResponse, MessageResponse, PatientListResponse, QueueResponse,
    StatusResponse,
};
use triage_desk::http::ApiError;

#[derive(Parser)]
#[command(name = "triage-kiosk")]
#[command(about = "Check-in kiosk and staff console for the triage-desk service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the triage-desk service
    #[arg(long, env = "TRIAGE_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Check in as a patient
    CheckIn {
        /// Patient name
        #[arg(short, long)]
        name: String,
        /// What happened
        #[arg(short, long)]
        injury: String,
        /// Pain level, usually 0 to 10
        #[arg(short, long)]
        pain: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// Reuse an existing card number
        #[arg(long)]
        code: Option<String>,
    },
    /// Check position and projected wait
    Status {
        #[arg(short, long)]
        name: String,
        /// Card number from check-in
        #[arg(short, long)]
        code: String,
    },
    /// Show the ranked waiting room
    Queue,
    /// Add a patient as staff
    Admit {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        code: String,
        #[arg(short, long)]
        pain: String,
        #[arg(short, long)]
        injury: Option<String>,
        /// Tier override (critical, urgent, non-urgent)
        #[arg(long)]
        priority: Option<String>,
    },
    /// Mark a patient treated
    Treat {
        #[arg(short, long)]
        id: i64,
    },
    /// List every patient record
    Patients,
    /// Show service statistics
    Stats,
}

/// Thin typed client over the triage API
struct KioskClient {
    client: Client,
    base_url: String,
}

impl KioskClient {
    fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        decode(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, path))?;
        decode(response).await
    }

    async fn status(&self, name: &str, code: &str) -> Result<StatusResponse> {
        let response = self
            .client
            .get(self.url("/status"))
            .query(&[("name", name), ("code", code)])
            .send()
            .await
            .context("GET /status failed")?;
        decode(response).await
    }
}

/// Decode a success body, or surface the service's error message
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(anyhow!("{} ({})", message, status));
    }

    serde_json::from_str(&body).with_context(|| format!("Unexpected response: {}", body))
}

/// Send numeric pain levels as numbers and anything else as typed
fn pain_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(n) => json!(n),
        Err(_) => json!(raw),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let kiosk = KioskClient::new(&cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::CheckIn {
            name,
            injury,
            pain,
            dob,
            gender,
            code,
        } => {
            let body = json!({
                "name": name,
                "injuryType": injury,
                "painLevel": pain_value(&pain),
                "dateOfBirth": dob,
                "gender": gender,
                "code": code,
            });

            match kiosk
                .send_json::<CheckInResponse>(reqwest::Method::POST, "/checkin", &body)
                .await
            {
                Ok(receipt) => {
                    println!("✅ {}", receipt.message);
                    println!("   Patient ID: {}", receipt.patient_id);
                    println!("   Card number: {}", receipt.code);
                    println!("💡 Keep your card number to check your wait time");
                }
                Err(e) => {
                    eprintln!("❌ Check-in failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Status { name, code } => {
            let status = kiosk.status(&name, &code).await?;
            match (status.success, status.treated) {
                (true, Some(true)) => println!(
                    "✅ {}",
                    status.message.unwrap_or_else(|| "Treated".to_string())
                ),
                (true, _) => {
                    println!("🕐 {} is waiting", status.name.unwrap_or(name));
                    if let Some(priority) = status.priority {
                        println!("   Priority: {}", priority);
                    }
                    if let Some(position) = status.position {
                        println!("   Position: {}", position);
                    }
                    if let Some(wait) = status.estimated_wait_minutes {
                        println!("   Estimated wait: {} min", wait);
                    }
                }
                (false, _) => {
                    println!(
                        "❌ {}",
                        status.message.unwrap_or_else(|| "Not found".to_string())
                    );
                    std::process::exit(1);
                }
            }
        }

        Commands::Queue => {
            let queue: QueueResponse = kiosk.get("/admin/patients").await?;
            if queue.patients.is_empty() {
                println!("The waiting room is empty.");
            } else {
                println!("📋 Waiting room ({} patients):", queue.patients.len());
                for entry in &queue.patients {
                    println!(
                        "  {:>3}. [{}] {} (id {}, card {}) - wait {} min",
                        entry.position,
                        entry.patient.priority_tier,
                        entry.patient.name,
                        entry.patient.id,
                        entry.patient.code,
                        entry.estimated_wait_minutes
                    );
                }
            }
        }

        Commands::Admit {
            name,
            code,
            pain,
            injury,
            priority,
        } => {
            let body = json!({
                "name": name,
                "code": code,
                "painLevel": pain_value(&pain),
                "injuryType": injury,
                "priority": priority,
            });

            match kiosk
                .send_json::<AdmitResponse>(reqwest::Method::POST, "/admin/patients", &body)
                .await
            {
                Ok(response) => println!("✅ {} (id {})", response.message, response.patient_id),
                Err(e) => {
                    eprintln!("❌ Failed to add patient '{}': {}", name, e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Treat { id } => {
            let response: MessageResponse = kiosk
                .send_json(
                    reqwest::Method::PATCH,
                    &format!("/admin/patients/{}/treated", id),
                    &json!({}),
                )
                .await?;

            if response.success {
                println!("✅ {}", response.message);
            } else {
                eprintln!("❌ {}", response.message);
                std::process::exit(1);
            }
        }

        Commands::Patients => {
            let list: PatientListResponse = kiosk.get("/patients").await?;
            println!("📇 {} patient records:", list.patients.len());
            for patient in &list.patients {
                println!(
                    "  #{} {} - {} ({}), arrived {}",
                    patient.id,
                    patient.name,
                    patient.priority_tier,
                    patient.status,
                    patient.arrival_time.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::Stats => {
            let stats: Value = kiosk.get("/stats").await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
