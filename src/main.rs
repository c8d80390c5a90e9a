use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use sigec::api::{
    AuthApi, HttpClient, QuoteApi, RegistrationDraft, RestAuthApi, RestQuoteApi,
};
use sigec::app::App;
use sigec::config::Config;
use sigec::logging;
use sigec::quoter::validation::check_dni;
use sigec::quoter::{document_file_name, ClientResolution};
use sigec::session::{LogoutReason, Session};
use sigec::types::{format_date, QuoteStatus};

#[derive(Parser)]
#[command(name = "sigec")]
#[command(version)]
#[command(about = "Terminal client for the SIGEC quoting backend")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in; the password is read from SIGEC_PASSWORD or stdin
    Login {
        #[arg(short, long)]
        legajo: u64,

        /// Keep the session for later commands and the TUI
        #[arg(short, long)]
        remember: bool,
    },

    /// Request a new account (an administrator activates it)
    Register,

    /// Send a password reset link
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with the token from the reset email
    ResetPassword {
        #[arg(long)]
        token: String,
    },

    /// Confirm an email address with the token from the confirmation email
    ConfirmEmail {
        #[arg(long)]
        token: String,
    },

    /// Update contact details of the signed-in operator
    Profile {
        #[arg(long)]
        email: String,

        #[arg(long)]
        telefono: String,

        /// Also change the password (read from SIGEC_PASSWORD or stdin)
        #[arg(long)]
        password: bool,
    },

    /// Forget the remembered session
    Logout,

    /// Show the signed-in operator
    Whoami,

    /// List the active plans
    Plans,

    /// Work with the operator's quotes
    Quotes {
        #[command(subcommand)]
        command: QuoteCommands,
    },

    /// Check whether a client may be quoted
    Verify { dni: String },

    /// Write the effective configuration to ./sigec.toml
    Init,
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// List quotes created by the signed-in operator
    List,

    /// Show one stored quote
    Show { id: u64 },

    /// Download the quote document
    Pdf {
        id: u64,

        /// Directory to save into (defaults to ui.download_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Void a quote
    Void {
        id: u64,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // Determine if we're running in TUI mode (no subcommand)
    let is_tui_mode = cli.command.is_none();

    // Initialize logging (file-based for TUI, stderr for CLI)
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Login { legajo, remember }) => cmd_login(&config, legajo, remember).await?,
        Some(Commands::Register) => cmd_register(&config).await?,
        Some(Commands::ForgotPassword { email }) => cmd_forgot_password(&config, &email).await?,
        Some(Commands::ResetPassword { token }) => cmd_reset_password(&config, &token).await?,
        Some(Commands::ConfirmEmail { token }) => cmd_confirm_email(&config, &token).await?,
        Some(Commands::Profile {
            email,
            telefono,
            password,
        }) => cmd_profile(&config, &email, &telefono, password).await?,
        Some(Commands::Logout) => cmd_logout(&config)?,
        Some(Commands::Whoami) => cmd_whoami(&config)?,
        Some(Commands::Plans) => cmd_plans(&config).await?,
        Some(Commands::Quotes { command }) => match command {
            QuoteCommands::List => cmd_quotes_list(&config).await?,
            QuoteCommands::Show { id } => cmd_quotes_show(&config, id).await?,
            QuoteCommands::Pdf { id, out } => cmd_quotes_pdf(&config, id, out).await?,
            QuoteCommands::Void { id, yes } => cmd_quotes_void(&config, id, yes).await?,
        },
        Some(Commands::Verify { dni }) => cmd_verify(&config, &dni).await?,
        Some(Commands::Init) => {
            config.save()?;
            println!("Wrote {}", Config::local_config_path().display());
        }
        None => {
            // No subcommand = launch the TUI
            run_tui(config, logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    let mut app = App::new(config)?;
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Remembered session plus the HTTP adapter bound to it
fn connect(config: &Config) -> Result<(Session, HttpClient)> {
    let session = Session::restore(&config.session_file_path())?;
    let http = HttpClient::new(config, session.clone())?;
    Ok((session, http))
}

fn signed_in(config: &Config) -> Result<HttpClient> {
    let (session, http) = connect(config)?;
    if !session.is_authenticated() {
        bail!("Not signed in. Run `sigec login --legajo <N> --remember` first.");
    }
    Ok(http)
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("SIGEC_PASSWORD") {
        return Ok(password);
    }
    prompt("Password")
}

// ─── Account ────────────────────────────────────────────────────────────

async fn cmd_login(config: &Config, legajo: u64, remember: bool) -> Result<()> {
    let (session, http) = connect(config)?;
    let auth = RestAuthApi::new(http);
    let password = read_password()?;

    let identity = auth
        .login(legajo, &password, &CancellationToken::new())
        .await
        .context("Login failed")?;
    let name = identity.display_name();
    let rol = identity.rol;
    session.login(identity, remember)?;

    println!("Signed in as {} ({})", name, rol);
    if !remember {
        println!("Session not remembered; pass --remember to keep it for later commands.");
    }
    Ok(())
}

async fn cmd_register(config: &Config) -> Result<()> {
    let (_, http) = connect(config)?;
    let auth = RestAuthApi::new(http);

    let draft = RegistrationDraft {
        legajo: prompt("Legajo")?.trim().parse().unwrap_or(0),
        nombre: prompt("Nombre")?,
        apellido: prompt("Apellido")?,
        email: prompt("Email")?,
        telefono: prompt("Teléfono")?,
        direccion: prompt("Dirección")?,
        password: read_password()?,
    };
    if let Some(field) = draft.missing_field() {
        bail!("Missing or invalid {}", field);
    }

    let message = auth
        .register(&draft, &CancellationToken::new())
        .await
        .context("Registration failed")?;
    println!("{}", message);
    Ok(())
}

async fn cmd_forgot_password(config: &Config, email: &str) -> Result<()> {
    let (_, http) = connect(config)?;
    let message = RestAuthApi::new(http)
        .forgot_password(email, &CancellationToken::new())
        .await
        .context("Password reset request failed")?;
    println!("{}", message);
    Ok(())
}

async fn cmd_reset_password(config: &Config, token: &str) -> Result<()> {
    let (_, http) = connect(config)?;
    let password = read_password()?;
    let message = RestAuthApi::new(http)
        .reset_password(token, &password, &CancellationToken::new())
        .await
        .context("Password reset failed")?;
    println!("{}", message);
    Ok(())
}

async fn cmd_confirm_email(config: &Config, token: &str) -> Result<()> {
    let (_, http) = connect(config)?;
    let message = RestAuthApi::new(http)
        .confirm_email(token, &CancellationToken::new())
        .await
        .context("Email confirmation failed")?;
    println!("{}", message);
    Ok(())
}

async fn cmd_profile(config: &Config, email: &str, telefono: &str, password: bool) -> Result<()> {
    let http = signed_in(config)?;
    let new_password = if password { Some(read_password()?) } else { None };
    let message = RestAuthApi::new(http)
        .update_profile(email, telefono, new_password.as_deref(), &CancellationToken::new())
        .await
        .context("Profile update failed")?;
    println!("{}", message);
    Ok(())
}

fn cmd_logout(config: &Config) -> Result<()> {
    let session = Session::restore(&config.session_file_path())?;
    if session.is_authenticated() {
        session.logout(LogoutReason::UserRequested);
        println!("Signed out");
    } else {
        println!("No remembered session");
    }
    Ok(())
}

fn cmd_whoami(config: &Config) -> Result<()> {
    let session = Session::restore(&config.session_file_path())?;
    match session.identity() {
        Some(identity) => {
            println!("Legajo: {}", identity.legajo);
            println!("Nombre: {}", identity.display_name());
            println!("Email:  {}", identity.email);
            println!("Rol:    {}", identity.rol);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

// ─── Quotes ─────────────────────────────────────────────────────────────

async fn cmd_plans(config: &Config) -> Result<()> {
    let api = RestQuoteApi::new(signed_in(config)?);
    let plans = api
        .active_plans(&CancellationToken::new())
        .await
        .context("Failed to load plans")?;

    if plans.is_empty() {
        println!("No active plans");
        return Ok(());
    }
    println!("{:<6} {:<24} DESCRIPCIÓN", "ID", "NOMBRE");
    println!("{}", "─".repeat(60));
    for plan in plans {
        println!("{:<6} {:<24} {}", plan.id, plan.nombre, plan.descripcion);
    }
    Ok(())
}

async fn cmd_quotes_list(config: &Config) -> Result<()> {
    let api = RestQuoteApi::new(signed_in(config)?);
    let quotes = api
        .my_quotes(&CancellationToken::new())
        .await
        .context("Failed to load quotes")?;

    if quotes.is_empty() {
        println!("No quotes");
        return Ok(());
    }
    println!("Quotes ({})", quotes.len());
    println!("{}", "─".repeat(80));
    for q in quotes {
        println!(
            "{:<6} {:<11} {:<28} {:<10} {:>14} {}",
            q.id,
            q.created_on(),
            format!("{}, {}", q.cliente_apellido, q.cliente_nombre),
            q.cliente_dni,
            q.valor_total.map(|v| format!("$ {:.2}", v)).unwrap_or_default(),
            q.estado
        );
    }
    Ok(())
}

async fn cmd_quotes_show(config: &Config, id: u64) -> Result<()> {
    let api = RestQuoteApi::new(signed_in(config)?);
    let quote = api
        .fetch_quote(id, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to load quote {}", id))?;

    println!("Cotización #{}", quote.id.unwrap_or(id));
    if let Some(estado) = quote.estado {
        println!("Estado:  {}", estado);
    }
    let client = &quote.cliente;
    println!("Cliente: {} {} (DNI {})", client.nombres, client.apellidos, client.dni);
    if let Some(plan) = &quote.plan_nombre {
        println!("Plan:    {}", plan);
    }
    if let Some(channel) = quote.tipo_ingreso {
        println!("Ingreso: {}", channel);
    }
    println!("Fecha:   {}", format_date(quote.fecha_creacion.as_ref()));
    println!("Grupo:");
    for member in &quote.miembros {
        let value = member
            .valor_individual
            .map(|v| format!("$ {:.2}", v))
            .unwrap_or_default();
        println!(
            "  {:<20} {:>3} años  {}",
            member.parentesco.to_string(),
            member.edad,
            value
        );
    }
    if let Some(total) = quote.valor_total {
        println!("Total:   $ {:.2}", total);
    }
    Ok(())
}

async fn cmd_quotes_pdf(config: &Config, id: u64, out: Option<PathBuf>) -> Result<()> {
    let api = RestQuoteApi::new(signed_in(config)?);
    let bytes = api
        .download_pdf(id, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to download quote {}", id))?;

    let dir = out.unwrap_or_else(|| config.download_path());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(document_file_name(id));
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {}", path.display());
    Ok(())
}

async fn cmd_quotes_void(config: &Config, id: u64, yes: bool) -> Result<()> {
    if !yes {
        bail!("Voiding cannot be undone; pass --yes to confirm");
    }
    let api = RestQuoteApi::new(signed_in(config)?);
    let cancel = CancellationToken::new();

    let quote = api
        .fetch_quote(id, &cancel)
        .await
        .with_context(|| format!("Failed to load quote {}", id))?;
    if quote.estado == Some(QuoteStatus::Voided) {
        bail!("Quote {} is already voided", id);
    }

    api.void_quote(id, &cancel)
        .await
        .with_context(|| format!("Failed to void quote {}", id))?;
    println!("Quote {} voided", id);
    Ok(())
}

async fn cmd_verify(config: &Config, dni: &str) -> Result<()> {
    let dni = dni.trim();
    check_dni(dni)?;
    let api = RestQuoteApi::new(signed_in(config)?);
    let response = api
        .verify_client(dni, &CancellationToken::new())
        .await
        .context("Client lookup failed")?;

    let notice = ClientResolution::from_response(dni, response).notice();
    println!("{}: {}", notice.title, notice.message);
    Ok(())
}
