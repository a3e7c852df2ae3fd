//! naam - command-line client for the NAAM coconut cooperative

mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use libnaam::api::profile::KycDocument;
use libnaam::logging::LoggingConfig;
use libnaam::service::land::LandForm;
use libnaam::service::market::{PriceStats, DEFAULT_COMMODITY, DEFAULT_DAYS};
use libnaam::service::payments::PaymentSummary;
use libnaam::service::profile::{missing_fields, profile_completion};
use libnaam::types::{BankDetails, LocationLevel, PaymentMode, UserProfile, UserRole};
use libnaam::{ApiError, Config, NaamError, NaamService, Navigation};
use serde_json::json;

use output::Format;

#[derive(Parser)]
#[command(name = "naam")]
#[command(version, about = "Command-line client for the NAAM coconut cooperative")]
#[command(long_about = r#"Command-line client for the NAAM coconut cooperative.

EXAMPLES:
    # Log in as a farmer (prompts for the OTP)
    naam login --mobile 9876543210

    # Register a parcel of land described in a TOML file
    naam land submit parcel.toml

    # Walk the location cascade
    naam locations --state 32 --district 7

    # How would Rs 2,50,000 be settled?
    naam payment-mode 250000

    # Machine-readable output
    naam --format json collections list

ENVIRONMENT:
    NAAM_CONFIG        Config file path
    NAAM_LOG_FORMAT    text, json or pretty (logs go to stderr)
    NAAM_LOG_LEVEL     Log level when --verbose and RUST_LOG are not set

EXIT CODES:
    0 - Success
    1 - Error (network, server, configuration)
    2 - Not logged in, or the session expired
    3 - Invalid input
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Config file (default: $NAAM_CONFIG or ~/.config/naam/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a one-time password sent by SMS
    Login {
        /// 10-digit mobile number
        #[arg(long)]
        mobile: String,

        /// farmer, investor or serviceProvider
        #[arg(long, default_value = "farmer")]
        role: String,

        /// OTP, if already known (otherwise prompted for)
        #[arg(long)]
        otp: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Registered land
    Land {
        #[command(subcommand)]
        command: LandCommand,
    },

    /// Bank account used for payments
    Bank {
        #[command(subcommand)]
        command: BankCommand,
    },

    /// List states, or the districts, taluks or villages under one
    Locations {
        /// State id; lists its districts
        #[arg(long)]
        state: Option<String>,

        /// District id; lists its taluks
        #[arg(long, requires = "state")]
        district: Option<String>,

        /// Taluk id; lists its villages
        #[arg(long, requires = "district")]
        taluk: Option<String>,
    },

    /// Coconut deliveries
    Collections {
        #[command(subcommand)]
        command: CollectionsCommand,
    },

    /// Payments received
    Payments {
        #[command(subcommand)]
        command: PaymentsCommand,
    },

    /// Farmers in your portfolio (investors only)
    Farmers,

    /// Show whether an amount is settled by NEFT or RTGS
    PaymentMode {
        /// Amount in rupees
        amount: f64,
    },

    /// Market price history
    Prices {
        #[arg(long, default_value = DEFAULT_COMMODITY)]
        commodity: String,

        #[arg(long, default_value_t = DEFAULT_DAYS)]
        days: u32,
    },

    /// Latest news
    News,

    /// Community polls
    Polls {
        #[command(subcommand)]
        command: PollsCommand,
    },

    /// Everything on the home screen at once
    Dashboard,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the profile
    Show,

    /// Show how complete the profile is
    Completion,

    /// Change profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        village: Option<String>,
        #[arg(long)]
        pincode: Option<String>,
    },

    /// Upload a profile photo
    Photo { path: PathBuf },

    /// Upload KYC documents (aadhaar or pan)
    Kyc {
        document: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LandCommand {
    /// List registered land
    List,

    /// Submit land details from a TOML file
    Submit { file: PathBuf },
}

#[derive(Subcommand)]
enum BankCommand {
    /// Show bank details
    Show,

    /// Replace bank details
    Update {
        #[arg(long)]
        holder: String,
        #[arg(long)]
        account: String,
        /// Account number again
        #[arg(long)]
        confirm_account: String,
        #[arg(long)]
        ifsc: String,
        #[arg(long)]
        bank: String,
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand)]
enum CollectionsCommand {
    /// List deliveries
    List {
        /// Another farmer's deliveries (default: your own)
        #[arg(long)]
        farmer: Option<String>,
    },

    /// Show one delivery
    Show { id: String },
}

#[derive(Subcommand)]
enum PaymentsCommand {
    /// List payments
    List {
        #[arg(long)]
        farmer: Option<String>,
    },
}

#[derive(Subcommand)]
enum PollsCommand {
    /// List active polls
    List,

    /// Vote in a poll
    Vote { poll: String, option: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("warn", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Map an error to the documented exit status
///
/// Bare `ApiError`s reach here from `into_result()?`; they are classified
/// the same way as when wrapped in `NaamError`.
fn exit_code(e: &anyhow::Error) -> i32 {
    if let Some(e) = e.downcast_ref::<NaamError>() {
        return e.exit_code();
    }
    match e.downcast_ref::<ApiError>() {
        Some(e) => NaamError::Api(e.clone()).exit_code(),
        None => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = Format::parse(&cli.format);
    let config = Config::load_at(cli.config.as_deref())?;
    tracing::debug!("Using API at {}", config.api_root());

    // Needs no session and no network
    if let Commands::PaymentMode { amount } = cli.command {
        return payment_mode(&config, amount, format);
    }

    let service = NaamService::from_config(config)?;
    match cli.command {
        Commands::Login { mobile, role, otp } => login(&service, &mobile, &role, otp, format).await,
        Commands::Logout => {
            service.auth().logout().await?;
            if format == Format::Json {
                output::print_json(&json!({ "loggedOut": true }))
            } else {
                println!("Logged out");
                Ok(())
            }
        }
        Commands::Whoami => {
            let info = service
                .session()
                .current()
                .ok_or(NaamError::Api(ApiError::NotAuthenticated))?;
            match format {
                Format::Json => output::print_json(&info),
                Format::Text => {
                    output::session(&info);
                    Ok(())
                }
            }
        }
        Commands::Profile { command } => profile(&service, command, format).await,
        Commands::Land { command } => land(&service, command, format).await,
        Commands::Bank { command } => bank(&service, command, format).await,
        Commands::Locations {
            state,
            district,
            taluk,
        } => locations(&service, state, district, taluk, format).await,
        Commands::Collections { command } => collections(&service, command, format).await,
        Commands::Payments {
            command: PaymentsCommand::List { farmer },
        } => {
            let payments = service
                .collections()
                .payments(farmer.as_deref())
                .await?
                .into_result()?;
            match format {
                Format::Json => output::print_json(&payments),
                Format::Text => {
                    output::payments(&payments);
                    Ok(())
                }
            }
        }
        Commands::Farmers => {
            let farmers = service.collections().investor_farmers().await?;
            match format {
                Format::Json => output::print_json(&farmers),
                Format::Text => {
                    output::farmers(&farmers);
                    Ok(())
                }
            }
        }
        Commands::PaymentMode { .. } => Ok(()),
        Commands::Prices { commodity, days } => {
            let points = service
                .market()
                .history(&commodity, days)
                .await?
                .into_result()?;
            let stats = PriceStats::from_points(&points);
            match format {
                Format::Json => output::print_json(&json!({
                    "commodity": commodity,
                    "days": days,
                    "points": points,
                    "stats": stats,
                })),
                Format::Text => {
                    output::prices(&commodity, &points, stats.as_ref());
                    Ok(())
                }
            }
        }
        Commands::News => {
            let items = service.feed().news().await.into_result()?;
            match format {
                Format::Json => output::print_json(&items),
                Format::Text => {
                    output::news(&items);
                    Ok(())
                }
            }
        }
        Commands::Polls { command } => polls(&service, command, format).await,
        Commands::Dashboard => {
            let dashboard = service.dashboard().load().await;
            match format {
                Format::Json => output::print_json(&output::dashboard_json(&dashboard)),
                Format::Text => {
                    output::dashboard(&dashboard);
                    Ok(())
                }
            }
        }
    }
}

fn payment_mode(config: &Config, amount: f64, format: Format) -> anyhow::Result<()> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(NaamError::InvalidInput("Amount must be greater than zero".to_string()).into());
    }
    let mode = PaymentMode::for_amount(amount, config.payments.rtgs_threshold);
    match format {
        Format::Json => output::print_json(&json!({
            "amount": amount,
            "mode": mode,
            "rtgsThreshold": config.payments.rtgs_threshold,
        })),
        Format::Text => {
            println!("{}", mode);
            Ok(())
        }
    }
}

async fn login(
    service: &NaamService,
    mobile: &str,
    role: &str,
    otp: Option<String>,
    format: Format,
) -> anyhow::Result<()> {
    let role: UserRole = role.parse().map_err(NaamError::InvalidInput)?;
    let mut flow = service.auth().start_login(role);

    let message = flow.send_otp(mobile).await?;
    if format == Format::Text {
        eprintln!("{}", message.as_deref().unwrap_or("OTP sent"));
    }

    let otp = match otp {
        Some(otp) => otp,
        None if atty::is(atty::Stream::Stdin) => {
            rpassword::prompt_password("Enter OTP: ").context("Failed to read OTP")?
        }
        None => {
            return Err(NaamError::InvalidInput(
                "stdin is not a terminal; pass the code with --otp".to_string(),
            )
            .into())
        }
    };

    let Navigation::Dashboard(role) = flow.verify_otp(&otp).await? else {
        return Ok(());
    };
    let info = service
        .session()
        .current()
        .ok_or(NaamError::Api(ApiError::NotAuthenticated))?;
    match format {
        Format::Json => output::print_json(&info),
        Format::Text => {
            println!("Logged in as {} ({})", info.user_id, role);
            Ok(())
        }
    }
}

async fn profile(service: &NaamService, command: ProfileCommand, format: Format) -> anyhow::Result<()> {
    match command {
        ProfileCommand::Show => {
            let profile = service.profile().refresh().await?;
            let completion = profile_completion(&profile);
            match format {
                Format::Json => output::print_json(&json!({
                    "profile": profile,
                    "completion": completion,
                })),
                Format::Text => {
                    output::profile(&profile, completion);
                    Ok(())
                }
            }
        }
        ProfileCommand::Completion => {
            let profile = service.profile().refresh().await?;
            let percent = profile_completion(&profile);
            let missing = missing_fields(&profile);
            match format {
                Format::Json => output::print_json(&json!({
                    "completion": percent,
                    "missing": missing,
                })),
                Format::Text => {
                    output::completion(percent, &missing);
                    Ok(())
                }
            }
        }
        ProfileCommand::Update {
            name,
            email,
            gender,
            date_of_birth,
            address,
            village,
            pincode,
        } => {
            // Start from the cached profile so required fields stay filled
            let mut patch = service.profile().cached().unwrap_or_default();
            patch.merge(&UserProfile {
                name,
                email,
                gender,
                date_of_birth,
                address,
                village,
                pincode,
                ..Default::default()
            });
            let updated = service.profile().update(&patch).await?;
            match format {
                Format::Json => output::print_json(&updated),
                Format::Text => {
                    println!("Profile updated ({}% complete)", profile_completion(&updated));
                    Ok(())
                }
            }
        }
        ProfileCommand::Photo { path } => {
            let urls = service.profile().upload_image(&path).await?;
            match format {
                Format::Json => output::print_json(&urls),
                Format::Text => {
                    println!("Uploaded {}", path.display());
                    for url in urls {
                        println!("  {}", url);
                    }
                    Ok(())
                }
            }
        }
        ProfileCommand::Kyc { document, files } => {
            let document: KycDocument = document.parse().map_err(NaamError::InvalidInput)?;
            let paths: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
            let outcome = service.profile().upload_kyc(document, &paths).await?;
            report_outcome(&outcome, "Documents uploaded", format)
        }
    }
}

/// Resolve attachment paths relative to the form file's directory
fn load_land_form(file: &Path) -> anyhow::Result<LandForm> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| NaamError::InvalidInput(format!("Cannot read '{}': {}", file.display(), e)))?;
    let mut form = LandForm::from_toml(&content)?;

    let base = file.parent().unwrap_or_else(|| Path::new("."));
    for path in form
        .land_documents
        .iter_mut()
        .chain(form.geo_tagged_photos.iter_mut())
    {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
    Ok(form)
}

async fn land(service: &NaamService, command: LandCommand, format: Format) -> anyhow::Result<()> {
    match command {
        LandCommand::List => {
            let lands = service.land().list().await?.into_result()?;
            match format {
                Format::Json => output::print_json(&lands),
                Format::Text => {
                    output::lands(&lands);
                    Ok(())
                }
            }
        }
        LandCommand::Submit { file } => {
            let form = load_land_form(&file)?;
            service.land().submit(&form).await?;
            match format {
                Format::Json => output::print_json(&json!({ "submitted": true })),
                Format::Text => {
                    println!("Land details submitted");
                    Ok(())
                }
            }
        }
    }
}

async fn bank(service: &NaamService, command: BankCommand, format: Format) -> anyhow::Result<()> {
    match command {
        BankCommand::Show => {
            let mut details = service.profile().bank_details().await.into_result()?;
            details.account_number = details.account_number.as_deref().map(output::mask_account);
            match format {
                Format::Json => output::print_json(&details),
                Format::Text => {
                    output::bank(&details);
                    Ok(())
                }
            }
        }
        BankCommand::Update {
            holder,
            account,
            confirm_account,
            ifsc,
            bank,
            branch,
        } => {
            let details = BankDetails {
                account_holder_name: Some(holder),
                account_number: Some(account),
                ifsc_code: Some(ifsc),
                bank_name: Some(bank),
                branch_name: branch,
            };
            let outcome = service
                .profile()
                .update_bank_details(&details, &confirm_account)
                .await?;
            report_outcome(&outcome, "Bank details saved", format)
        }
    }
}

async fn locations(
    service: &NaamService,
    state: Option<String>,
    district: Option<String>,
    taluk: Option<String>,
    format: Format,
) -> anyhow::Result<()> {
    let mut selector = service.locations();
    selector.load_states().await;
    let mut level = LocationLevel::State;
    if let Some(id) = &state {
        selector.select_state(id).await;
        level = LocationLevel::District;
    }
    if let Some(id) = &district {
        selector.select_district(id).await;
        level = LocationLevel::Taluk;
    }
    if let Some(id) = &taluk {
        selector.select_taluk(id).await;
        level = LocationLevel::Village;
    }

    if let Some(e) = selector.error(level) {
        return Err(NaamError::Api(e.clone()).into());
    }
    let options = selector.options(level);
    match format {
        Format::Json => output::print_json(options),
        Format::Text => {
            if options.is_empty() {
                println!("No {}s found", level);
            }
            output::locations(options);
            Ok(())
        }
    }
}

async fn collections(
    service: &NaamService,
    command: CollectionsCommand,
    format: Format,
) -> anyhow::Result<()> {
    match command {
        CollectionsCommand::List { farmer } => {
            let entries = service
                .collections()
                .list(farmer.as_deref())
                .await?
                .into_result()?;
            let summary = PaymentSummary::from_collections(&entries);
            match format {
                Format::Json => output::print_json(&json!({
                    "collections": entries,
                    "summary": summary,
                })),
                Format::Text => {
                    output::collections(&entries, &summary);
                    Ok(())
                }
            }
        }
        CollectionsCommand::Show { id } => {
            let entry = service.collections().details(&id).await?;
            let mode = service.collections().payment_mode(entry.amount);
            match format {
                Format::Json => output::print_json(&json!({
                    "collection": entry,
                    "paymentMode": mode,
                })),
                Format::Text => {
                    output::collection(&entry);
                    println!("  Paid by:  {}", mode);
                    Ok(())
                }
            }
        }
    }
}

async fn polls(service: &NaamService, command: PollsCommand, format: Format) -> anyhow::Result<()> {
    match command {
        PollsCommand::List => {
            let polls = service.feed().polls().await.into_result()?;
            match format {
                Format::Json => output::print_json(&polls),
                Format::Text => {
                    output::polls(&polls);
                    Ok(())
                }
            }
        }
        PollsCommand::Vote { poll, option } => {
            let outcome = service.feed().vote(&poll, &option).await?;
            report_outcome(&outcome, "Vote recorded", format)
        }
    }
}

/// Print an action's outcome; a failed action is an error
fn report_outcome(
    outcome: &libnaam::ActionOutcome,
    success_text: &str,
    format: Format,
) -> anyhow::Result<()> {
    if !outcome.success {
        let error = outcome.error.clone().unwrap_or_else(|| {
            ApiError::Rejected(
                outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "Request failed".to_string()),
            )
        });
        return Err(NaamError::Api(error).into());
    }
    match format {
        Format::Json => output::print_json(outcome),
        Format::Text => {
            output::outcome(outcome, success_text);
            Ok(())
        }
    }
}
