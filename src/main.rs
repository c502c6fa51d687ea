use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;

use entrypass::api::{AssetFiles, CardApi, UpdateFieldMode, VerificationView};
use entrypass::card::{format_display_date, AssetPreviews, CardDraft, CardView};
use entrypass::export::{Exporter, PageLayout, ScenePreview};
use entrypass::rendering::paint::compose_sheet;
use entrypass::session::Session;
use entrypass::ExportConfig;

#[derive(Parser)]
#[command(name = "entrypass", version, about = "Contractor entry-pass card toolkit")]
struct Cli {
    /// Base URL of the card service
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Base URL embedded in verification QR codes
    #[arg(long, global = true)]
    verify_base: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Log in and store the bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the stored bearer token
    Logout,
    /// Create a card from field flags and optional asset files
    Create {
        #[command(flatten)]
        fields: CardFieldArgs,
        #[command(flatten)]
        files: AssetFileArgs,
    },
    /// List every card
    List,
    /// Fetch one card by id
    Get { id: String },
    /// Search cards by query string
    Search { query: String },
    /// Update a card; unspecified flags keep the stored values
    Update {
        id: String,
        #[command(flatten)]
        fields: CardFieldArgs,
        #[command(flatten)]
        files: AssetFileArgs,
        /// Send every field, making an empty value an explicit clear
        #[arg(long)]
        send_all_fields: bool,
    },
    /// Delete a card by id
    Delete { id: String },
    /// Export a card as PNG or PDF
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Png)]
        format: ExportFormat,
        /// Output scale over the card's reference pixels (1-4)
        #[arg(long, default_value_t = 3.0)]
        pixel_ratio: f32,
        /// PDF page width in millimetres
        #[arg(long, default_value_t = 54.0)]
        page_width_mm: f32,
        /// Uniform PDF page margin in millimetres
        #[arg(long, default_value_t = 0.0)]
        margin_mm: f32,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Resolve a card id through the public verification surface
    Verify { id: String },
    /// Request a password-reset OTP
    SendOtp {
        #[arg(long)]
        email: String,
    },
    /// Verify a password-reset OTP
    VerifyOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
    },
    /// Reset the password using a verified OTP
    ResetPasswordOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Reset the password while logged in
    ResetPassword {
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Png,
    Pdf,
}

#[derive(Args)]
struct CardFieldArgs {
    #[arg(long)]
    employee_name: Option<String>,
    #[arg(long)]
    father_name: Option<String>,
    #[arg(long)]
    designation: Option<String>,
    #[arg(long)]
    adhar_card_number: Option<String>,
    /// Issuing authority
    #[arg(long)]
    hirer: Option<String>,
    #[arg(long)]
    blood_group: Option<String>,
    #[arg(long)]
    police_verification: Option<String>,
    #[arg(long, value_parser = parse_date)]
    date_of_issue: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    valid_till: Option<NaiveDate>,
    #[arg(long)]
    mobile_number: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    card_no: Option<String>,
    #[arg(long)]
    division_name: Option<String>,
    /// Contracting agency / company name
    #[arg(long)]
    profile_name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_date)]
    contract_validity_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    contract_expiry_date: Option<NaiveDate>,
}

#[derive(Args)]
struct AssetFileArgs {
    #[arg(long)]
    photo: Option<PathBuf>,
    #[arg(long)]
    sign: Option<PathBuf>,
    #[arg(long)]
    seal: Option<PathBuf>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD, got {:?}", raw))
}

impl CardFieldArgs {
    // Overlay the provided flags onto a base draft; an explicitly empty flag
    // value still lands in the draft (the update field mode decides whether
    // it reaches the wire).
    fn apply(self, draft: &mut CardDraft) {
        let set = |target: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *target = v;
            }
        };
        set(&mut draft.employee_name, self.employee_name);
        set(&mut draft.father_name, self.father_name);
        set(&mut draft.designation, self.designation);
        set(&mut draft.adhar_card_number, self.adhar_card_number);
        set(&mut draft.hirer, self.hirer);
        set(&mut draft.blood_group, self.blood_group);
        set(&mut draft.police_verification, self.police_verification);
        set(&mut draft.mobile_number, self.mobile_number);
        set(&mut draft.address, self.address);
        set(&mut draft.card_no, self.card_no);
        set(&mut draft.division_name, self.division_name);
        set(&mut draft.profile_name, self.profile_name);
        if self.description.is_some() {
            draft.description = self.description;
        }
        if self.date_of_issue.is_some() {
            draft.date_of_issue = self.date_of_issue;
        }
        if self.valid_till.is_some() {
            draft.valid_till = self.valid_till;
        }
        if self.contract_validity_date.is_some() {
            draft.contract_validity_date = self.contract_validity_date;
        }
        if self.contract_expiry_date.is_some() {
            draft.contract_expiry_date = self.contract_expiry_date;
        }
    }
}

impl AssetFileArgs {
    fn into_files(self) -> AssetFiles {
        AssetFiles {
            photo: self.photo,
            sign: self.sign,
            seal: self.seal,
        }
    }
}

fn print_summary(record: &entrypass::card::CardRecord) {
    let today = chrono::Local::now().date_naive();
    println!(
        "{}  {}  {}  valid till {}  [{}]",
        record.id.as_deref().unwrap_or("-"),
        record.employee_name,
        record.card_no,
        format_display_date(record.valid_till),
        record.validity(today).label()
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let mut config = ExportConfig::default();
    if let Some(base) = cli.api_base {
        config.api_base_url = base;
    }
    if let Some(base) = cli.verify_base {
        config.verify_base_url = base;
    }

    let session = Arc::new(Session::open(config.token_path.clone()));

    match cli.command {
        CliCommand::Login { email, password } => {
            let api = CardApi::new(&config, session)?;
            api.login(&email, &password)?;
            println!("Logged in");
        }
        CliCommand::Logout => {
            session.clear()?;
            println!("Logged out");
        }
        CliCommand::Create { fields, files } => {
            let api = CardApi::new(&config, session)?;
            let mut draft = CardDraft::default();
            fields.apply(&mut draft);
            let record = api.create(&draft, &files.into_files())?;
            println!("Created card {}", record.id.as_deref().unwrap_or("-"));
            print_summary(&record);
        }
        CliCommand::List => {
            let api = CardApi::new(&config, session)?;
            let records = api.get_all()?;
            for record in &records {
                print_summary(record);
            }
            println!("{} card(s)", records.len());
        }
        CliCommand::Get { id } => {
            let api = CardApi::new(&config, session)?;
            let record = api.get_by_id(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        CliCommand::Search { query } => {
            let api = CardApi::new(&config, session)?;
            let records = api.search(&query)?;
            for record in &records {
                print_summary(record);
            }
            println!("{} match(es)", records.len());
        }
        CliCommand::Update { id, fields, files, send_all_fields } => {
            if send_all_fields {
                config.update_field_mode = UpdateFieldMode::SendAll;
            }
            let api = CardApi::new(&config, session)?;
            let current = api.get_by_id(&id)?;
            let mut draft = CardDraft::from_record(&current);
            fields.apply(&mut draft);
            let record = api.update(&id, &draft, &files.into_files())?;
            println!("Updated card {}", id);
            print_summary(&record);
        }
        CliCommand::Delete { id } => {
            let api = CardApi::new(&config, session)?;
            println!("{}", api.delete(&id)?);
        }
        CliCommand::Export { id, format, pixel_ratio, page_width_mm, margin_mm, out_dir } => {
            config.pixel_ratio = pixel_ratio;
            let api = CardApi::new(&config, session)?;
            let record = api.get_by_id(&id)?;

            let view = CardView::new(&record, &AssetPreviews::default());
            let scene = compose_sheet(&view, &config)?;
            let mut preview = ScenePreview::new();
            preview.attach(scene);

            let exporter = Exporter::new(config)?;
            let path = match format {
                ExportFormat::Png => exporter
                    .export_png(&preview, record.file_base(), &out_dir)
                    .context("PNG export failed")?,
                ExportFormat::Pdf => exporter
                    .export_pdf(
                        &preview,
                        record.file_base(),
                        PageLayout { page_width_mm, margin_mm },
                        &out_dir,
                    )
                    .context("PDF export failed")?,
            };
            println!("Wrote {}", path.display());
        }
        CliCommand::Verify { id } => {
            let api = CardApi::new(&config, session)?;
            let record = api.view(&id)?;
            let today = chrono::Local::now().date_naive();
            let view = VerificationView::project(&record, today);
            println!("Name:                {}", view.employee_name);
            println!("Aadhaar:             {}", view.adhar_card_number);
            println!("Address:             {}", view.address);
            println!("Agency:              {}", view.profile_name);
            println!("Issuing authority:   {}", view.hirer);
            println!("Police verification: {}", view.police_verification);
            println!("Date of issue:       {}", format_display_date(view.date_of_issue));
            println!("Valid till:          {}", format_display_date(view.valid_till));
            println!("Status:              {}", view.status);
        }
        CliCommand::SendOtp { email } => {
            let api = CardApi::new(&config, session)?;
            println!("{}", api.send_otp(&email)?);
        }
        CliCommand::VerifyOtp { email, otp } => {
            let api = CardApi::new(&config, session)?;
            println!("{}", api.verify_otp(&email, &otp)?);
        }
        CliCommand::ResetPasswordOtp { email, otp, password, confirm_password } => {
            let api = CardApi::new(&config, session)?;
            println!("{}", api.reset_password_otp(&email, &otp, &password, &confirm_password)?);
        }
        CliCommand::ResetPassword { password, confirm_password } => {
            let api = CardApi::new(&config, session)?;
            println!("{}", api.reset_password(&password, &confirm_password)?);
        }
    }

    Ok(())
}
