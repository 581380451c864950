use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use clinicdesk_lib::api::{ApiClient, ClinicApi, MedicineQuery, MedicineSort, SortOrder};
use clinicdesk_lib::composer::{PrescriptionComposer, PrescriptionDraft};
use clinicdesk_lib::config::{self, ClientConfig};
use clinicdesk_lib::dashboard::export_inventory;
use clinicdesk_lib::modals::StatsNotice;
use clinicdesk_lib::models::{Doctor, Patient};
use clinicdesk_lib::pdf::{render_prescription_pdf, render_registration_pdf, save_download, PdfArtifact, PdfOptions};
use clinicdesk_lib::session::{spawn_queue_poller, PatientQueueSession};
use clinicdesk_lib::storage::LocalStore;
use clinicdesk_lib::upload::{upload_profile_photo, ProfilePhoto};
use clinicdesk_lib::AppError;

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
enum SortColumn {
    Name,
    Stock,
    Expiry,
}

impl From<SortColumn> for MedicineSort {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Name => Self::Name,
            SortColumn::Stock => Self::Stock,
            SortColumn::Expiry => Self::Expiry,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "clinicdesk")]
#[command(about = "Clinicdesk - doctor and medical-records desk client")]
#[command(version)]
struct Args {
    /// Bearer token; defaults to the stored session
    #[arg(long, env = "CLINICDESK_TOKEN", global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a prescription PDF from a JSON file with `patient`, `doctor` and `draft`
    Prescription {
        #[arg(short, long)]
        input: PathBuf,
        /// Directory the PDF is written to [default: Downloads]
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print the base64 data URI instead of a summary
        #[arg(long)]
        data_uri: bool,
        /// Also save the prescription to the backend
        #[arg(long)]
        submit: bool,
    },
    /// Render a registration slip from a JSON file with `patient` and `doctor`
    Registration {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        data_uri: bool,
    },
    /// Watch today's queue for a doctor
    Queue {
        #[arg(long)]
        doctor_id: String,
        /// Stop after this many seconds
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
    /// Show the doctor's capacity for today
    Stats {
        #[arg(long)]
        doctor_id: String,
    },
    /// Search the medicine inventory
    Inventory {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortColumn,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Download the inventory spreadsheet
    ExportInventory {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Upload a profile photo for the signed-in doctor
    UploadPhoto {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Forget the stored session
    Logout,
}

#[derive(Deserialize)]
struct PrescriptionInput {
    patient: Patient,
    doctor: Doctor,
    draft: PrescriptionDraft,
}

#[derive(Deserialize)]
struct RegistrationInput {
    patient: Patient,
    doctor: Doctor,
}

fn main() -> ExitCode {
    clinicdesk_lib::init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config = ClientConfig::from_env();
    let store = LocalStore::default();

    match args.command {
        Command::Prescription {
            input,
            out,
            data_uri,
            submit,
        } => {
            let input: PrescriptionInput = read_json(&input)?;
            let dir = out.unwrap_or_else(config::default_download_dir);
            let options = PdfOptions::from_config(&config);
            let artifact = if submit {
                let api = client(&config, args.token, &store)?;
                PrescriptionComposer::new(options, dir.clone())
                    .submit(&input.draft, &input.patient, &input.doctor, &api, Utc::now())?
                    .artifact
            } else {
                let prescription = input.draft.build(Utc::now())?;
                let artifact = render_prescription_pdf(&input.patient, &input.doctor, &prescription, &options)?;
                save_download(&artifact.bytes, &artifact.file_name, &dir)?;
                artifact
            };
            report(&artifact, &dir, data_uri);
        }
        Command::Registration {
            input,
            out,
            data_uri,
        } => {
            let input: RegistrationInput = read_json(&input)?;
            let dir = out.unwrap_or_else(config::default_download_dir);
            let artifact = render_registration_pdf(&input.patient, &input.doctor, &PdfOptions::from_config(&config))?;
            save_download(&artifact.bytes, &artifact.file_name, &dir)?;
            report(&artifact, &dir, data_uri);
        }
        Command::Queue { doctor_id, seconds } => {
            let api = Arc::new(client(&config, args.token, &store)?);
            let session = Arc::new(Mutex::new(PatientQueueSession::new()));
            let poller = spawn_queue_poller(api, doctor_id, Arc::clone(&session), config::POLL_INTERVAL);
            std::thread::sleep(Duration::from_secs(seconds));
            drop(poller);

            let patients = match session.lock() {
                Ok(s) => s.patients(),
                Err(poisoned) => poisoned.into_inner().patients(),
            };
            for p in patients.iter() {
                println!("{:>4}  {}  {}", p.token_label(), p.full_name, p.fee_status.label());
            }
        }
        Command::Stats { doctor_id } => {
            let api = client(&config, args.token, &store)?;
            let stats = api.doctor_stats(&doctor_id)?;
            println!(
                "{} of {} patients today, {} slots left",
                stats.today_count, stats.daily_limit, stats.remaining_slots
            );
            if let Some(notice) = StatsNotice::from_stats(&stats) {
                println!("{}", notice.message());
            }
        }
        Command::Inventory {
            search,
            sort,
            desc,
            page,
        } => {
            let api = client(&config, args.token, &store)?;
            let query = MedicineQuery {
                page,
                sort_by: sort.into(),
                sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                search,
                ..MedicineQuery::default()
            };
            let result = api.search_medicines(&query)?;
            let today = Local::now().date_naive();
            for m in &result.medicines {
                let flag = if m.is_expired(today) { "  EXPIRED" } else { "" };
                println!("{:<30} {:>6}{flag}", m.name, m.stock_quantity);
            }
            println!("page {} of {} ({} medicines)", result.page, result.total_pages.max(1), result.total);
        }
        Command::ExportInventory { out } => {
            let api = client(&config, args.token, &store)?;
            let dir = out.unwrap_or_else(config::default_download_dir);
            let path = export_inventory(&api, &dir, Local::now().date_naive())?;
            println!("{}", path.display());
        }
        Command::UploadPhoto { file } => {
            let session = store.load()?.ok_or(clinicdesk_lib::storage::StorageError::NoSession)?;
            let api = ApiClient::new(&config)?.with_token(args.token.unwrap_or(session.token));
            let photo = ProfilePhoto::from_path(&file)?;
            let mut doctor = session.profile;
            let url = upload_profile_photo(&api, &mut doctor, &photo)?;
            store.save_profile(&doctor)?;
            println!("{url}");
        }
        Command::Logout => store.clear()?,
    }
    Ok(())
}

fn client(config: &ClientConfig, token: Option<String>, store: &LocalStore) -> Result<ApiClient, AppError> {
    let token = match token {
        Some(t) => Some(t),
        None => store.load()?.map(|s| s.token),
    };
    let mut api = ApiClient::new(config)?;
    api.set_token(token);
    Ok(api)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn report(artifact: &PdfArtifact, dir: &Path, data_uri: bool) {
    if data_uri {
        println!("{}", artifact.data_uri);
    } else {
        println!("{} ({} bytes)", dir.join(&artifact.file_name).display(), artifact.bytes.len());
    }
}
