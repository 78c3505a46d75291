use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

use clientkit::{validate, ApiClient, InvalidationBus, QueryCache, TokenStore};
use marketplace::api::{
    HttpCommissionsApi, HttpEstimatesApi, HttpMembersApi, HttpPartnersApi, MembersApi, PartnersApi,
};
use marketplace::form::{
    self, CommissionField, CommissionForm, FieldErrors, PartnerField, PartnerProfileForm,
    PasswordChangeForm, PasswordField,
};
use marketplace::model::{
    CleanType, Commission, CommissionPatch, Estimate, EstimatePatch, HouseType, LoginRequest,
    MemberPatch, NewEstimate, PartnerProfile, PartnerType,
};
use marketplace::{CommissionQueries, EstimateQueries, Session};
use runtime::{AppConfig, CliArgs, EndpointConfig};

/// Spotless - command line client for the cleaning marketplace
#[derive(Parser)]
#[command(name = "spotless")]
#[command(about = "Spotless - command line client for the cleaning marketplace")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Member API base URL (overrides config)
    #[arg(long)]
    member_url: Option<String>,

    /// Partner API base URL (overrides config)
    #[arg(long)]
    partner_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the token pair
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Log in against the partner host instead of the member host
        #[arg(long)]
        partner: bool,
    },
    /// Drop stored credentials
    Logout,
    /// Show session state and, for members, the profile
    Whoami,
    /// Update the member profile
    ProfileUpdate {
        #[arg(long)]
        nick: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
    },
    /// Change the member password
    Password {
        /// New password
        #[arg(long)]
        new: String,
        /// New password again
        #[arg(long)]
        confirm: String,
    },
    /// Permanently delete the member account
    Withdraw,
    /// Cleaning requests of the logged-in member
    #[command(subcommand)]
    Commission(CommissionCmd),
    /// Quotes submitted by the logged-in partner
    #[command(subcommand)]
    Estimate(EstimateCmd),
    /// Commissions open for quoting (partner view)
    Feed,
    /// Partner account
    #[command(subcommand)]
    Partner(PartnerCmd),
}

#[derive(Subcommand)]
enum CommissionCmd {
    /// Post a new cleaning request
    Create {
        /// Floor area in pyeong
        #[arg(long)]
        size: Option<String>,
        /// APARTMENT, VILLA, HOUSE, or OFFICETEL
        #[arg(long)]
        house_type: Option<String>,
        /// MOVE_IN, RESIDENCE, or INTERIOR
        #[arg(long)]
        clean_type: Option<String>,
        /// Address book id of the place to clean
        #[arg(long)]
        address_id: Option<String>,
        /// Attachment reference
        #[arg(long)]
        image: Option<String>,
        /// Desired date (2024-03-14 or RFC 3339)
        #[arg(long)]
        desired_date: Option<String>,
        /// Notes for the cleaner
        #[arg(long)]
        significant: Option<String>,
    },
    /// List my commissions
    List,
    /// Show one commission
    Get { id: i64 },
    /// Change fields of a commission
    Update {
        id: i64,
        #[arg(long)]
        size: Option<f64>,
        #[arg(long)]
        house_type: Option<String>,
        #[arg(long)]
        clean_type: Option<String>,
        #[arg(long)]
        address_id: Option<i64>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        desired_date: Option<String>,
        #[arg(long)]
        significant: Option<String>,
    },
    /// Withdraw a commission
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum EstimateCmd {
    /// Submit a quote against an open commission
    Create {
        #[arg(long)]
        commission_id: i64,
        /// Provisional price in KRW
        #[arg(long)]
        price: i64,
        /// What the quote covers
        #[arg(long)]
        statement: String,
        /// Visit date (2024-03-14 or RFC 3339)
        #[arg(long)]
        fixed_date: String,
    },
    /// List my estimates
    List,
    /// Change fields of an estimate
    Update {
        id: i64,
        #[arg(long)]
        price: Option<i64>,
        #[arg(long)]
        statement: Option<String>,
        #[arg(long)]
        fixed_date: Option<String>,
    },
    /// Retract an estimate
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum PartnerCmd {
    /// Show the partner profile
    Profile,
    /// Update the partner profile
    Update {
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        manager_name: Option<String>,
        #[arg(long)]
        company_name: Option<String>,
        #[arg(long)]
        business_type: Option<String>,
        /// INDIVIDUAL, CORPORATION, or PUBLIC_INSTITUTION
        #[arg(long)]
        partner_type: Option<String>,
    },
    /// Permanently delete the partner account
    Withdraw,
}

/// Everything a command needs, wired once per invocation.
struct App {
    session: Session,
    members: Arc<HttpMembersApi>,
    partners: Arc<HttpPartnersApi>,
    commissions: CommissionQueries,
    estimates: EstimateQueries,
    assume_yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        member_url: cli.member_url.clone(),
        partner_url: cli.partner_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
        assume_yes: cli.yes,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config
        .logging
        .as_ref()
        .cloned()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.client.home_dir));
    tracing::debug!(
        member = %config.member_api.base_url,
        partner = %config.partner_api.base_url,
        "configuration loaded"
    );

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let app = build_app(&config, cli.yes)?;

    match cli.command.unwrap_or(Commands::Whoami) {
        Commands::Login {
            email,
            password,
            partner,
        } => login(&app, email, password, partner).await,
        Commands::Logout => {
            app.session.logout();
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami(&app).await,
        Commands::ProfileUpdate {
            nick,
            email,
            phone_number,
        } => profile_update(&app, nick, email, phone_number).await,
        Commands::Password { new, confirm } => password(&app, new, confirm).await,
        Commands::Withdraw => member_withdraw(&app).await,
        Commands::Commission(cmd) => commission(&app, cmd).await,
        Commands::Estimate(cmd) => estimate(&app, cmd).await,
        Commands::Feed => feed(&app).await,
        Commands::Partner(cmd) => partner(&app, cmd).await,
    }
}

/// Wire both host clients, the shared credential store, and the query
/// stack against one cache.
fn build_app(config: &AppConfig, assume_yes: bool) -> Result<App> {
    let store = TokenStore::load(&config.client.credentials_file);
    let member_client = Arc::new(
        api_client(&config.member_api, store.clone()).context("member API client")?,
    );
    let partner_client = Arc::new(
        api_client(&config.partner_api, store.clone()).context("partner API client")?,
    );

    let cache = Arc::new(QueryCache::new());
    let bus = Arc::new(InvalidationBus::new());
    bus.subscribe(&cache);

    Ok(App {
        session: Session::restore(store),
        members: Arc::new(HttpMembersApi::new(member_client.clone())),
        partners: Arc::new(HttpPartnersApi::new(partner_client.clone())),
        commissions: CommissionQueries::new(
            Arc::new(HttpCommissionsApi::new(member_client)),
            cache.clone(),
            bus.clone(),
        ),
        estimates: EstimateQueries::new(
            Arc::new(HttpEstimatesApi::new(partner_client)),
            cache,
            bus,
        ),
        assume_yes,
    })
}

fn api_client(endpoint: &EndpointConfig, store: TokenStore) -> Result<ApiClient> {
    let url = Url::parse(&endpoint.base_url)
        .with_context(|| format!("invalid base URL '{}'", endpoint.base_url))?;
    ApiClient::new(url, endpoint.timeout, store).context("failed to build HTTP client")
}

async fn login(app: &App, email: String, password: String, partner: bool) -> Result<()> {
    let credentials = LoginRequest { email, password };
    let pair = if partner {
        app.partners.login(credentials).await?
    } else {
        app.members.login(credentials).await?
    };
    app.session
        .login(pair)
        .context("failed to persist credentials")?;

    if partner {
        println!("Logged in (partner).");
    } else {
        let profile = app.session.fetch_profile(app.members.as_ref()).await?;
        println!("Logged in as {}.", profile.member_nick);
    }
    Ok(())
}

async fn whoami(app: &App) -> Result<()> {
    if !app.session.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    match app.session.fetch_profile(app.members.as_ref()).await {
        Ok(profile) => {
            println!("Logged in as {} <{}>", profile.member_nick, profile.email);
            println!("Phone: {}", profile.phone_number);
        }
        Err(e) => {
            // fetch_profile already dropped the stale credentials.
            println!("Session check failed ({e}); credentials cleared, log in again.");
        }
    }
    Ok(())
}

async fn profile_update(
    app: &App,
    nick: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
) -> Result<()> {
    if let Some(phone) = &phone_number {
        if let Some(problem) = validate::phone(phone) {
            return Err(anyhow!(problem));
        }
    }
    let patch = MemberPatch {
        member_nick: nick,
        email,
        phone_number,
    };
    if patch == MemberPatch::default() {
        println!("Nothing to update.");
        return Ok(());
    }
    let updated = app.members.update_profile(patch).await?;
    println!("Profile updated: {} <{}>", updated.member_nick, updated.email);
    Ok(())
}

async fn password(app: &App, new: String, confirm_value: String) -> Result<()> {
    let mut form = PasswordChangeForm::new();
    form.set(PasswordField::Password, new);
    form.set(PasswordField::Confirm, confirm_value);
    let change = form.validate_and_build().map_err(invalid_input)?;
    app.members.change_password(change).await?;
    println!("Password changed.");
    Ok(())
}

async fn member_withdraw(app: &App) -> Result<()> {
    if !confirm(
        "Permanently delete the member account? This cannot be undone.",
        app.assume_yes,
    )? {
        println!("Aborted.");
        return Ok(());
    }
    app.members.withdraw().await?;
    app.session.logout();
    println!("Account deleted.");
    Ok(())
}

async fn commission(app: &App, cmd: CommissionCmd) -> Result<()> {
    match cmd {
        CommissionCmd::Create {
            size,
            house_type,
            clean_type,
            address_id,
            image,
            desired_date,
            significant,
        } => {
            let mut form = CommissionForm::new();
            if let Some(raw) = size {
                form.set(CommissionField::Size, raw);
            }
            if let Some(raw) = address_id {
                form.set(CommissionField::AddressId, raw);
            }
            if let Some(raw) = image {
                form.set(CommissionField::Image, raw);
            }
            if let Some(raw) = desired_date {
                form.set(CommissionField::DesiredDate, raw);
            }
            if let Some(raw) = significant {
                form.set(CommissionField::Significant, raw);
            }
            if let Some(raw) = house_type {
                form.set_house_type(parse_arg::<HouseType>(&raw)?);
            }
            if let Some(raw) = clean_type {
                form.set_clean_type(parse_arg::<CleanType>(&raw)?);
            }

            let new = form.validate_and_build().map_err(invalid_input)?;
            let created = app.commissions.create(new).await?;
            println!("Created commission {}.", created.commission_id);
            Ok(())
        }
        CommissionCmd::List => {
            tracing::debug!("loading commissions");
            let commissions = app.commissions.list().await?;
            if commissions.is_empty() {
                println!("No commissions.");
                return Ok(());
            }
            for commission in commissions.iter() {
                print_commission(commission);
            }
            Ok(())
        }
        CommissionCmd::Get { id } => {
            print_commission(&*app.commissions.get(id).await?);
            Ok(())
        }
        CommissionCmd::Update {
            id,
            size,
            house_type,
            clean_type,
            address_id,
            image,
            desired_date,
            significant,
        } => {
            let patch = CommissionPatch {
                size,
                house_type: house_type
                    .map(|raw| parse_arg::<HouseType>(&raw))
                    .transpose()?,
                clean_type: clean_type
                    .map(|raw| parse_arg::<CleanType>(&raw))
                    .transpose()?,
                address_id,
                image,
                desired_date: desired_date.map(|raw| parse_date_arg(&raw)).transpose()?,
                significant,
            };
            let updated = app.commissions.update(id, patch).await?;
            println!("Updated commission {}.", updated.commission_id);
            Ok(())
        }
        CommissionCmd::Delete { id } => {
            if !confirm(&format!("Delete commission {id}?"), app.assume_yes)? {
                println!("Aborted.");
                return Ok(());
            }
            app.commissions.remove(id).await?;
            println!("Deleted commission {id}.");
            Ok(())
        }
    }
}

async fn estimate(app: &App, cmd: EstimateCmd) -> Result<()> {
    match cmd {
        EstimateCmd::Create {
            commission_id,
            price,
            statement,
            fixed_date,
        } => {
            let fixed_date = parse_date_arg(&fixed_date)?;
            let created = app
                .estimates
                .create(NewEstimate {
                    commission_id,
                    tmp_price: price,
                    statement,
                    fixed_date,
                })
                .await?;
            println!(
                "Submitted estimate {} for commission {}.",
                created.id, created.commission_id
            );
            Ok(())
        }
        EstimateCmd::List => {
            tracing::debug!("loading estimates");
            let estimates = app.estimates.list().await?;
            if estimates.is_empty() {
                println!("No estimates.");
                return Ok(());
            }
            for estimate in estimates.iter() {
                print_estimate(estimate);
            }
            Ok(())
        }
        EstimateCmd::Update {
            id,
            price,
            statement,
            fixed_date,
        } => {
            let patch = EstimatePatch {
                tmp_price: price,
                statement,
                fixed_date: fixed_date.map(|raw| parse_date_arg(&raw)).transpose()?,
            };
            let updated = app.estimates.update(id, patch).await?;
            println!("Updated estimate {}.", updated.id);
            Ok(())
        }
        EstimateCmd::Delete { id } => {
            if !confirm(&format!("Retract estimate {id}?"), app.assume_yes)? {
                println!("Aborted.");
                return Ok(());
            }
            app.estimates.remove(id).await?;
            println!("Retracted estimate {id}.");
            Ok(())
        }
    }
}

async fn feed(app: &App) -> Result<()> {
    tracing::debug!("loading open commissions");
    let commissions = app.estimates.open_commissions().await?;
    if commissions.is_empty() {
        println!("No open commissions.");
        return Ok(());
    }
    for commission in commissions.iter() {
        print_commission(commission);
    }
    Ok(())
}

async fn partner(app: &App, cmd: PartnerCmd) -> Result<()> {
    match cmd {
        PartnerCmd::Profile => {
            print_partner_profile(&app.partners.profile().await?);
            Ok(())
        }
        PartnerCmd::Update {
            phone_number,
            manager_name,
            company_name,
            business_type,
            partner_type,
        } => {
            let mut form = PartnerProfileForm::new();
            if let Some(raw) = phone_number {
                form.set(PartnerField::PhoneNumber, raw);
            }
            if let Some(raw) = manager_name {
                form.set(PartnerField::ManagerName, raw);
            }
            if let Some(raw) = company_name {
                form.set(PartnerField::CompanyName, raw);
            }
            if let Some(raw) = business_type {
                form.set(PartnerField::BusinessType, raw);
            }
            if let Some(raw) = partner_type {
                form.set_partner_type(parse_arg::<PartnerType>(&raw)?);
            }
            let patch = form.validate_and_build().map_err(invalid_input)?;
            let updated = app.partners.update_profile(patch).await?;
            print_partner_profile(&updated);
            Ok(())
        }
        PartnerCmd::Withdraw => {
            if !confirm(
                "Permanently delete the partner account? This cannot be undone.",
                app.assume_yes,
            )? {
                println!("Aborted.");
                return Ok(());
            }
            app.partners.withdraw().await?;
            app.session.logout();
            println!("Account deleted.");
            Ok(())
        }
    }
}

fn parse_arg<T: FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|e| anyhow!(e))
}

fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>> {
    form::parse_desired_date(raw)
        .ok_or_else(|| anyhow!("'{raw}' is not a date (2024-03-14) or an RFC 3339 timestamp"))
}

fn invalid_input(errors: FieldErrors) -> anyhow::Error {
    let mut message = String::from("invalid input:");
    for (_, problem) in errors.iter() {
        message.push_str("\n  - ");
        message.push_str(problem);
    }
    anyhow!(message)
}

/// Ask for confirmation on stdin unless --yes was passed.
fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

fn print_commission(commission: &Commission) {
    let size = commission
        .size
        .map(|s| format!("{s} pyeong"))
        .unwrap_or_else(|| "size unspecified".to_string());
    println!(
        "#{} {} | {} {} | {} | address {} | by {}",
        commission.commission_id,
        commission.desired_date.format("%Y-%m-%d"),
        commission.house_type,
        commission.clean_type,
        size,
        commission.address_id,
        commission.member_nick
    );
    if let Some(note) = &commission.significant {
        println!("    note: {note}");
    }
}

fn print_estimate(estimate: &Estimate) {
    println!(
        "#{} commission {} | {} KRW | visit {}",
        estimate.id,
        estimate.commission_id,
        estimate.tmp_price,
        estimate.fixed_date.format("%Y-%m-%d")
    );
    println!("    {}", estimate.statement);
}

fn print_partner_profile(profile: &PartnerProfile) {
    println!("{} ({})", profile.company_name, profile.partner_type);
    println!("Manager: {}", profile.manager_name);
    println!("Business: {}", profile.business_type);
    println!("Contact: {} / {}", profile.email, profile.phone_number);
}
