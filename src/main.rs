mod api;
mod model;
mod session;

use chrono::{Days, Local, NaiveDate, Timelike};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, Color, Table};
use inquire::{Confirm, DateSelect, InquireError, Password, Select, Text};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use strum::IntoEnumIterator;

use crate::api::{ApiClient, ApiResult};
use crate::model::{
    BadgeStyle, Client, ClientForm, ClientKind, CompleteVisitPayload, FieldError, Quote,
    QuoteDraft, QuoteLine, QuoteStatus, RegisterForm, Visit, VisitCategory, VisitForm,
    VisitStatus, DEFAULT_TAX_RATE,
};
use crate::session::{config_dir, SessionStore};

// ==========================================
// Constants
// ==========================================

const NEW_CLIENT_OPT: &str = "➕ Add new client";
const DEFAULT_API_URL: &str = "http://localhost:8000/api";

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Debug, Serialize, Deserialize)]
struct AppSettings {
    api_url: String,
}

#[derive(Parser)]
#[command(name = "tecnigestion", about = "Field-service management for technicians")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login,
    /// Create an account (signs you in)
    Register,
    /// Clear the stored session
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// Today's numbers at a glance
    Dashboard,
    /// Configure the API endpoint
    Config,
    /// Manage customer records
    #[command(subcommand)]
    Clients(ClientCommands),
    /// Manage scheduled visits
    #[command(subcommand)]
    Visits(VisitCommands),
    /// Manage quotes
    #[command(subcommand)]
    Quotes(QuoteCommands),
}

#[derive(Subcommand)]
enum ClientCommands {
    /// List all clients
    List,
    /// Show one client and their quotes
    Show { id: i64 },
    /// Create a client
    Add,
    /// Edit a client
    Edit { id: i64 },
    /// Delete a client (their visits and quotes go with them)
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum VisitCommands {
    /// List visits
    List {
        /// Narrow the list down (applied locally)
        #[arg(long, value_enum)]
        filter: Option<VisitFilter>,
        /// Only visits on this date (YYYY-MM-DD, asked of the server)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Today's visits
    Today,
    /// Show one visit in full
    Show { id: i64 },
    /// Schedule a visit
    Add,
    /// Edit a visit
    Edit { id: i64 },
    /// Change a visit's status
    Status { id: i64 },
    /// Mark a visit completed, with sign-off details
    Complete { id: i64 },
    /// Delete a visit
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// List quotes
    List {
        /// Only quotes in this status (asked of the server)
        #[arg(long, value_enum)]
        status: Option<QuoteStatusArg>,
    },
    /// Show one quote in full
    Show { id: i64 },
    /// Create a quote
    Add,
    /// Change a quote's status
    Status { id: i64 },
    /// Acceptance statistics
    Stats,
    /// Delete a quote
    Delete { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VisitFilter {
    All,
    Today,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QuoteStatusArg {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl From<QuoteStatusArg> for QuoteStatus {
    fn from(arg: QuoteStatusArg) -> Self {
        match arg {
            QuoteStatusArg::Draft => QuoteStatus::Draft,
            QuoteStatusArg::Sent => QuoteStatus::Sent,
            QuoteStatusArg::Accepted => QuoteStatus::Accepted,
            QuoteStatusArg::Rejected => QuoteStatus::Rejected,
        }
    }
}

enum ClientChoice {
    New,
    Existing(Client),
}

impl fmt::Display for ClientChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientChoice::New => write!(f, "{NEW_CLIENT_OPT}"),
            ClientChoice::Existing(c) => write!(f, "{} · {}", c.full_name(), c.phone),
        }
    }
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    let cli = Cli::parse();

    // 1. Initialize configuration (wizard on first run)
    let settings = load_settings().unwrap_or_else(setup_config_wizard);
    let api = ApiClient::new(settings.api_url, SessionStore::open());

    if cli.command.is_none() {
        use clap::CommandFactory;
        Cli::command().print_help().unwrap();
        return;
    }

    let result = match cli.command.unwrap() {
        Commands::Login => cmd_login(&api),
        Commands::Register => cmd_register(&api),
        Commands::Logout => cmd_logout(&api),
        Commands::Whoami => cmd_whoami(&api),
        Commands::Dashboard => cmd_dashboard(&api),
        Commands::Config => {
            setup_config_wizard();
            Ok(())
        }
        Commands::Clients(command) => match command {
            ClientCommands::List => cmd_clients_list(&api),
            ClientCommands::Show { id } => cmd_clients_show(&api, id),
            ClientCommands::Add => cmd_clients_add(&api),
            ClientCommands::Edit { id } => cmd_clients_edit(&api, id),
            ClientCommands::Delete { id } => cmd_clients_delete(&api, id),
        },
        Commands::Visits(command) => match command {
            VisitCommands::List { filter, date } => cmd_visits_list(&api, filter, date),
            VisitCommands::Today => cmd_visits_today(&api),
            VisitCommands::Show { id } => cmd_visits_show(&api, id),
            VisitCommands::Add => cmd_visits_add(&api),
            VisitCommands::Edit { id } => cmd_visits_edit(&api, id),
            VisitCommands::Status { id } => cmd_visits_status(&api, id),
            VisitCommands::Complete { id } => cmd_visits_complete(&api, id),
            VisitCommands::Delete { id } => cmd_visits_delete(&api, id),
        },
        Commands::Quotes(command) => match command {
            QuoteCommands::List { status } => cmd_quotes_list(&api, status.map(Into::into)),
            QuoteCommands::Show { id } => cmd_quotes_show(&api, id),
            QuoteCommands::Add => cmd_quotes_add(&api),
            QuoteCommands::Status { id } => cmd_quotes_status(&api, id),
            QuoteCommands::Stats => cmd_quotes_stats(&api),
            QuoteCommands::Delete { id } => cmd_quotes_delete(&api, id),
        },
    };

    if let Err(error) = result {
        eprintln!("❌ {error}");
        std::process::exit(1);
    }
}

// ==========================================
// 1. Auth & Session
// ==========================================

fn cmd_login(api: &ApiClient) -> ApiResult<()> {
    println!("\n--- Sign in ---");
    let email = prompt(Text::new("Email:").prompt());
    let password = prompt(Password::new("Password:").without_confirmation().prompt());

    if email.trim().is_empty() || password.is_empty() {
        println!("❌ Fill in both email and password.");
        return Ok(());
    }

    let auth = api.login(email.trim(), &password)?;
    println!("✅ Signed in as {} ({})", auth.user.name, auth.user.email);
    Ok(())
}

fn cmd_register(api: &ApiClient) -> ApiResult<()> {
    let mut form = RegisterForm::default();

    println!("\n--- Create account (step 1 of 2) ---");
    form.name = prompt(Text::new("Name:").prompt());
    form.surname = prompt(Text::new("Surname (optional):").prompt());
    form.email = prompt(Text::new("Email:").prompt());
    form.phone = prompt(Text::new("Phone:").prompt());
    form.company = prompt(Text::new("Company (optional):").prompt());

    let errors = form.validate_details();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }

    println!("\n--- Create account (step 2 of 2) ---");
    form.password = prompt(Password::new("Password:").without_confirmation().prompt());
    form.confirm_password = prompt(
        Password::new("Repeat password:")
            .without_confirmation()
            .prompt(),
    );

    let errors = form.validate_credentials();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }

    let auth = api.register(&form.into_request())?;
    println!("✅ Account created. Signed in as {}.", auth.user.email);
    Ok(())
}

fn cmd_logout(api: &ApiClient) -> ApiResult<()> {
    api.session().clear();
    println!("👋 Session cleared.");
    Ok(())
}

fn cmd_whoami(api: &ApiClient) -> ApiResult<()> {
    let user = api.profile()?;
    println!("\n👤 {}", user.name);
    if let Some(surname) = user.surname.filter(|s| !s.is_empty()) {
        println!("   Surname: {surname}");
    }
    println!("   Email:   {}", user.email);
    if let Some(phone) = user.phone.filter(|p| !p.is_empty()) {
        println!("   Phone:   {phone}");
    }
    if let Some(company) = user.company.filter(|c| !c.is_empty()) {
        println!("   Company: {company}");
    }
    Ok(())
}

// ==========================================
// 2. Dashboard
// ==========================================

fn cmd_dashboard(api: &ApiClient) -> ApiResult<()> {
    let name = api
        .session()
        .load()
        .map(|s| s.user.name)
        .unwrap_or_else(|| "there".to_string());
    let data = api.dashboard()?;

    println!("\n{}, {} 👋", greeting(Local::now().hour()), name);

    let mut table = Table::new();
    table.set_header(vec![Cell::new("Metric"), Cell::new("Value")]);
    table.add_row(vec![
        Cell::new("Visits today"),
        Cell::new(data.visits_today).fg(Color::Rgb { r: 52, g: 152, b: 219 }),
    ]);
    table.add_row(vec![
        Cell::new("Pending visits"),
        Cell::new(data.pending_visits).fg(Color::Rgb { r: 243, g: 156, b: 18 }),
    ]);
    table.add_row(vec![Cell::new("Clients"), Cell::new(data.total_clients)]);
    table.add_row(vec![
        Cell::new("Open quotes"),
        Cell::new(data.pending_quotes).fg(Color::Rgb { r: 155, g: 89, b: 182 }),
    ]);
    table.add_row(vec![
        Cell::new("Revenue this month").add_attribute(Attribute::Bold),
        Cell::new(eur(data.month_revenue))
            .add_attribute(Attribute::Bold)
            .fg(Color::Rgb { r: 39, g: 174, b: 96 }),
    ]);
    println!("{table}");
    Ok(())
}

// ==========================================
// 3. Clients
// ==========================================

fn cmd_clients_list(api: &ApiClient) -> ApiResult<()> {
    let clients = api.list_clients()?;
    if clients.is_empty() {
        println!("No clients yet. Add one with `tecnigestion clients add`.");
        return Ok(());
    }

    println!("\n--- Clients ({}) ---", clients.len());
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new("Kind"),
        Cell::new("Phone"),
        Cell::new("City"),
    ]);
    for client in &clients {
        table.add_row(vec![
            Cell::new(client.id),
            Cell::new(client.full_name()),
            Cell::new(client.kind.label()),
            Cell::new(&client.phone),
            Cell::new(client.city.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn cmd_clients_show(api: &ApiClient, id: i64) -> ApiResult<()> {
    let client = api.get_client(id)?;

    println!("\n👤 {} ({})", client.full_name(), client.kind.label());
    println!("   Phone: {}", client.phone);
    if let Some(phone) = client.secondary_phone.as_deref().filter(|p| !p.is_empty()) {
        println!("   Secondary phone: {phone}");
    }
    if let Some(email) = client.email.as_deref().filter(|e| !e.is_empty()) {
        println!("   Email: {email}");
    }
    let address = [
        client.address.as_deref().unwrap_or(""),
        client.city.as_deref().unwrap_or(""),
        client.postal_code.as_deref().unwrap_or(""),
        client.province.as_deref().unwrap_or(""),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .cloned()
    .collect::<Vec<_>>()
    .join(", ");
    if !address.is_empty() {
        println!("   Address: {address}");
    }
    if let Some(tax_id) = client.tax_id.as_deref().filter(|t| !t.is_empty()) {
        println!("   Tax id: {tax_id}");
    }
    if let Some(notes) = client.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("   Notes: {notes}");
    }

    let quotes = api.quotes_for_client(id)?;
    if quotes.is_empty() {
        println!("\n(No quotes for this client)");
    } else {
        println!("\n--- Quotes ({}) ---", quotes.len());
        print_quote_table(&quotes);
    }
    Ok(())
}

fn cmd_clients_add(api: &ApiClient) -> ApiResult<()> {
    println!("\n--- New client ---");
    let form = client_form_wizard(None);

    let errors = form.validate();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }

    let client = api.create_client(&form)?;
    println!("✅ Client created: {} (#{})", client.full_name(), client.id);
    Ok(())
}

fn cmd_clients_edit(api: &ApiClient, id: i64) -> ApiResult<()> {
    let existing = api.get_client(id)?;
    println!("\n--- Edit client: {} ---", existing.full_name());
    let form = client_form_wizard(Some(&existing));

    let errors = form.validate();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }

    let client = api.update_client(id, &form)?;
    println!("✅ Client updated: {}", client.full_name());
    Ok(())
}

fn cmd_clients_delete(api: &ApiClient, id: i64) -> ApiResult<()> {
    let client = api.get_client(id)?;
    let confirmed = prompt(
        Confirm::new(&format!(
            "Delete {}? Their visits and quotes will be deleted as well.",
            client.full_name()
        ))
        .with_default(false)
        .prompt(),
    );
    if !confirmed {
        println!("Cancelled");
        return Ok(());
    }

    api.delete_client(id)?;
    println!("✅ Client deleted.");
    Ok(())
}

// Full client form; defaults come from the record being edited.
fn client_form_wizard(existing: Option<&Client>) -> ClientForm {
    let kinds: Vec<ClientKind> = ClientKind::iter().collect();
    let starting = existing
        .map(|c| if c.kind == ClientKind::Company { 1 } else { 0 })
        .unwrap_or(0);
    let kind = prompt(
        Select::new("Client kind:", kinds)
            .with_starting_cursor(starting)
            .prompt(),
    );

    let default_name = existing.map(|c| c.name.clone()).unwrap_or_default();
    let name = prompt(Text::new("Name:").with_default(&default_name).prompt());

    let surname_label = match kind {
        ClientKind::Company => "Company name:",
        ClientKind::Individual => "Surname:",
    };
    let default_surname = opt_field(existing, |c| c.surname.as_deref());
    let surname = prompt(Text::new(surname_label).with_default(&default_surname).prompt());

    let tax_id = if kind == ClientKind::Company {
        let default_tax_id = opt_field(existing, |c| c.tax_id.as_deref());
        prompt(Text::new("Tax id (NIF/CIF):").with_default(&default_tax_id).prompt())
    } else {
        opt_field(existing, |c| c.tax_id.as_deref())
    };

    let default_phone = existing.map(|c| c.phone.clone()).unwrap_or_default();
    let phone = prompt(Text::new("Phone:").with_default(&default_phone).prompt());

    let default_secondary = opt_field(existing, |c| c.secondary_phone.as_deref());
    let secondary_phone = prompt(
        Text::new("Secondary phone (optional):")
            .with_default(&default_secondary)
            .prompt(),
    );

    let default_email = opt_field(existing, |c| c.email.as_deref());
    let email = prompt(Text::new("Email (optional):").with_default(&default_email).prompt());

    let default_address = opt_field(existing, |c| c.address.as_deref());
    let address = prompt(
        Text::new("Address (optional):")
            .with_default(&default_address)
            .prompt(),
    );

    let default_city = opt_field(existing, |c| c.city.as_deref());
    let city = prompt(Text::new("City (optional):").with_default(&default_city).prompt());

    let default_postal = opt_field(existing, |c| c.postal_code.as_deref());
    let postal_code = prompt(
        Text::new("Postal code (optional):")
            .with_default(&default_postal)
            .prompt(),
    );

    let default_province = opt_field(existing, |c| c.province.as_deref());
    let province = prompt(
        Text::new("Province (optional):")
            .with_default(&default_province)
            .prompt(),
    );

    let default_notes = opt_field(existing, |c| c.notes.as_deref());
    let notes = prompt(
        Text::new("Internal notes (optional):")
            .with_default(&default_notes)
            .prompt(),
    );

    ClientForm {
        name,
        surname,
        email,
        phone,
        secondary_phone,
        address,
        city,
        postal_code,
        province,
        kind,
        tax_id,
        notes,
    }
}

// Minimal record created from inside the visit wizard.
fn quick_client_wizard() -> ClientForm {
    println!("\n--- New client (minimal record, edit it later if needed) ---");
    let name = prompt(Text::new("Name:").prompt());
    let surname = prompt(Text::new("Surname (optional):").prompt());
    let phone = prompt(Text::new("Phone:").prompt());
    let city = prompt(Text::new("City (optional):").prompt());

    ClientForm {
        name,
        surname,
        phone,
        city,
        kind: ClientKind::Individual,
        ..ClientForm::default()
    }
}

fn select_or_create_client(api: &ApiClient, allow_new: bool) -> ApiResult<Option<i64>> {
    let clients = api.list_clients()?;

    let mut options = Vec::new();
    if allow_new {
        options.push(ClientChoice::New);
    }
    options.extend(clients.into_iter().map(ClientChoice::Existing));

    if options.is_empty() {
        println!("❌ No clients yet. Add one with `tecnigestion clients add`.");
        return Ok(None);
    }

    match prompt(Select::new("Client:", options).prompt()) {
        ClientChoice::New => {
            let form = quick_client_wizard();
            let errors = form.validate();
            if !errors.is_empty() {
                print_field_errors(&errors);
                return Ok(None);
            }
            let created = api.create_client(&form)?;
            println!("✅ Client created: {} (#{})", created.full_name(), created.id);
            Ok(Some(created.id))
        }
        ClientChoice::Existing(client) => Ok(Some(client.id)),
    }
}

// ==========================================
// 4. Visits
// ==========================================

fn cmd_visits_list(
    api: &ApiClient,
    filter: Option<VisitFilter>,
    date: Option<NaiveDate>,
) -> ApiResult<()> {
    let visits = api.list_visits(date, None)?;
    let filter = filter.unwrap_or(VisitFilter::All);
    let today = Local::now().date_naive();

    let filtered: Vec<&Visit> = visits
        .iter()
        .filter(|v| match filter {
            VisitFilter::All => true,
            VisitFilter::Today => v.date == today,
            VisitFilter::Pending => v.status.is_open(),
            VisitFilter::Completed => v.status == VisitStatus::Completed,
        })
        .collect();

    println!("\n--- Visits ({} of {}) ---", filtered.len(), visits.len());
    if filtered.is_empty() {
        println!("No visits here. Try another filter, or `tecnigestion visits add`.");
        return Ok(());
    }
    print_visit_table(&filtered, today);
    Ok(())
}

fn cmd_visits_today(api: &ApiClient) -> ApiResult<()> {
    let visits = api.visits_today()?;
    let today = Local::now().date_naive();

    println!("\n--- Today's visits ({}) ---", visits.len());
    if visits.is_empty() {
        println!("Nothing scheduled for today.");
        return Ok(());
    }
    print_visit_table(&visits.iter().collect::<Vec<_>>(), today);
    Ok(())
}

fn cmd_visits_show(api: &ApiClient, id: i64) -> ApiResult<()> {
    let visit = api.get_visit(id)?;
    let today = Local::now().date_naive();

    println!("\n🔧 {}", visit.title);
    println!(
        "   {} {}  [{}]",
        format_visit_date(visit.date, today),
        visit.time.as_deref().unwrap_or(""),
        visit.status.style().label
    );
    println!("   Category: {}", visit.category.label());
    if visit.category == VisitCategory::Urgent {
        println!("   ⚠ Urgent");
    }
    if let Some(description) = visit.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n   What needs doing:\n   {description}");
    }
    if let Some(name) = visit.client_name.as_deref() {
        println!("\n   Client: {name}");
    }
    if let Some(phone) = visit.client_phone.as_deref().filter(|p| !p.is_empty()) {
        println!("   Phone: {phone}");
    }
    if let Some(address) = visit.client_address.as_deref().filter(|a| !a.is_empty()) {
        println!("   Address: {address}");
    }
    if let Some(notes) = visit.internal_notes.as_deref().filter(|n| !n.is_empty()) {
        println!("\n   Internal notes: {notes}");
    }
    if let Some(completed_at) = visit.completed_at.as_deref() {
        println!("\n   Completed at: {completed_at}");
        if let Some(signer) = visit.signer_name.as_deref().filter(|s| !s.is_empty()) {
            println!("   Signed by: {signer}");
        }
    }
    Ok(())
}

fn cmd_visits_add(api: &ApiClient) -> ApiResult<()> {
    println!("\n--- New visit ---");

    let category = prompt(
        Select::new("Visit type:", VisitCategory::iter().collect::<Vec<_>>()).prompt(),
    );
    let title = prompt(Text::new("Title:").prompt());
    let date = prompt(
        DateSelect::new("Date:")
            .with_default(Local::now().date_naive())
            .prompt(),
    );
    let time = prompt(Text::new("Time:").with_default("09:00").prompt());
    let description = prompt(Text::new("What needs doing (optional):").prompt());
    let client_id = select_or_create_client(api, true)?;

    let form = VisitForm {
        client_id,
        title,
        description,
        date: Some(date),
        time,
        category,
        ..VisitForm::default()
    };

    let errors = form.validate();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }
    let Some(payload) = form.payload() else {
        return Ok(());
    };

    let visit = api.create_visit(&payload)?;
    println!(
        "✅ Visit #{} scheduled for {} {}",
        visit.id,
        visit.date,
        visit.time.as_deref().unwrap_or("")
    );
    Ok(())
}

fn cmd_visits_edit(api: &ApiClient, id: i64) -> ApiResult<()> {
    let existing = api.get_visit(id)?;
    println!("\n--- Edit visit: {} ---", existing.title);

    let categories: Vec<VisitCategory> = VisitCategory::iter().collect();
    let starting = categories
        .iter()
        .position(|c| *c == existing.category)
        .unwrap_or(0);
    let category = prompt(
        Select::new("Visit type:", categories)
            .with_starting_cursor(starting)
            .prompt(),
    );
    let title = prompt(Text::new("Title:").with_default(&existing.title).prompt());
    let date = prompt(DateSelect::new("Date:").with_default(existing.date).prompt());
    let default_time = existing.time.clone().unwrap_or_else(|| "09:00".to_string());
    let time = prompt(Text::new("Time:").with_default(&default_time).prompt());
    let default_description = existing.description.clone().unwrap_or_default();
    let description = prompt(
        Text::new("What needs doing (optional):")
            .with_default(&default_description)
            .prompt(),
    );

    let change_client = prompt(
        Confirm::new("Change the client?")
            .with_default(false)
            .prompt(),
    );
    let client_id = if change_client {
        select_or_create_client(api, true)?
    } else {
        Some(existing.client_id)
    };

    let form = VisitForm {
        client_id,
        title,
        description,
        date: Some(date),
        time,
        category,
        status: existing.status,
        priority: existing.priority.clone(),
        internal_notes: existing.internal_notes.clone().unwrap_or_default(),
    };

    let errors = form.validate();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }
    let Some(payload) = form.payload() else {
        return Ok(());
    };

    api.update_visit(id, &payload)?;
    println!("✅ Visit updated.");
    Ok(())
}

fn cmd_visits_status(api: &ApiClient, id: i64) -> ApiResult<()> {
    let visit = api.get_visit(id)?;
    print!("Current status: ");
    print_badge(visit.status.style());

    let statuses: Vec<VisitStatus> = VisitStatus::iter().collect();
    let starting = statuses.iter().position(|s| *s == visit.status).unwrap_or(0);
    let status = prompt(
        Select::new("New status:", statuses)
            .with_starting_cursor(starting)
            .prompt(),
    );

    api.set_visit_status(id, status)?;
    // The PATCH succeeded, so show the new badge without refetching.
    print!("✅ Status updated: ");
    print_badge(status.style());
    Ok(())
}

fn cmd_visits_complete(api: &ApiClient, id: i64) -> ApiResult<()> {
    let visit = api.get_visit(id)?;
    println!("\n--- Complete visit: {} ---", visit.title);

    let signer_name = prompt(Text::new("Signed off by (optional):").prompt());
    let internal_notes = prompt(Text::new("Internal notes (optional):").prompt());

    api.complete_visit(
        id,
        &CompleteVisitPayload {
            signature: String::new(),
            signer_name,
            internal_notes,
        },
    )?;
    print!("✅ Visit completed: ");
    print_badge(VisitStatus::Completed.style());
    Ok(())
}

fn cmd_visits_delete(api: &ApiClient, id: i64) -> ApiResult<()> {
    let visit = api.get_visit(id)?;
    let confirmed = prompt(
        Confirm::new(&format!("Delete visit \"{}\"?", visit.title))
            .with_default(false)
            .prompt(),
    );
    if !confirmed {
        println!("Cancelled");
        return Ok(());
    }

    api.delete_visit(id)?;
    println!("✅ Visit deleted.");
    Ok(())
}

fn print_visit_table(visits: &[&Visit], today: NaiveDate) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Date"),
        Cell::new("Time"),
        Cell::new("Title"),
        Cell::new("Client"),
        Cell::new("Type"),
        Cell::new("Status"),
    ]);
    for visit in visits {
        let type_cell = if visit.category == VisitCategory::Urgent {
            Cell::new("⚠ Urgent").fg(Color::Rgb { r: 231, g: 76, b: 60 })
        } else {
            Cell::new(visit.category.label())
        };
        table.add_row(vec![
            Cell::new(visit.id),
            Cell::new(format_visit_date(visit.date, today)),
            Cell::new(visit.time.as_deref().unwrap_or("")),
            Cell::new(&visit.title),
            Cell::new(visit.client_name.as_deref().unwrap_or("")),
            type_cell,
            badge_cell(visit.status.style()),
        ]);
    }
    println!("{table}");
}

// ==========================================
// 5. Quotes
// ==========================================

fn cmd_quotes_list(api: &ApiClient, status: Option<QuoteStatus>) -> ApiResult<()> {
    let quotes = api.list_quotes(status)?;

    let accepted = quotes
        .iter()
        .filter(|q| q.status == QuoteStatus::Accepted)
        .count();
    let open = quotes.iter().filter(|q| q.status.is_open()).count();
    println!(
        "\n--- Quotes: {} total · {} accepted · {} open ---",
        quotes.len(),
        accepted,
        open
    );

    if quotes.is_empty() {
        println!("No quotes yet. Create one with `tecnigestion quotes add`.");
        return Ok(());
    }
    print_quote_table(&quotes);

    for quote in &quotes {
        if quote.status == QuoteStatus::Rejected {
            if let Some(days) = quote.days_until_deletion {
                println!("⏳ {} will be deleted in {} days", quote.number, days);
            }
        }
    }
    Ok(())
}

fn cmd_quotes_show(api: &ApiClient, id: i64) -> ApiResult<()> {
    let quote = api.get_quote(id)?;
    print_quote_detail(&quote);
    Ok(())
}

fn cmd_quotes_add(api: &ApiClient) -> ApiResult<()> {
    println!("\n--- New quote ---");

    let mut draft = QuoteDraft::default();
    draft.title = prompt(Text::new("Title:").prompt());
    draft.client_id = select_or_create_client(api, false)?;
    draft.description = prompt(Text::new("Description (optional):").prompt());

    println!("\n--- Line items ---");
    println!("(Leave the concept empty to finish)");
    loop {
        let concept = prompt(Text::new("Concept:").prompt());
        if concept.trim().is_empty() {
            break;
        }

        let quantity_str = prompt(Text::new("Quantity:").with_default("1").prompt());
        let quantity: f64 = quantity_str.parse().unwrap_or(0.0);

        let price_str = prompt(Text::new("Unit price (€):").prompt());
        let unit_price: f64 = price_str.parse().unwrap_or(0.0);

        let description = prompt(Text::new("Line notes (optional):").prompt());
        let description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };

        draft.push_line(QuoteLine {
            concept,
            description,
            quantity,
            unit_price,
        });
        println!("   ({} line(s) so far)", draft.lines().len());
    }

    draft.apply_tax = prompt(Confirm::new("Apply VAT?").with_default(true).prompt());
    if draft.apply_tax {
        let rate_str = prompt(Text::new("VAT rate %:").with_default("21").prompt());
        draft.tax_rate = rate_str.parse().unwrap_or(DEFAULT_TAX_RATE);
    }

    let valid_until = prompt(Text::new("Valid until (YYYY-MM-DD, optional):").prompt());
    draft.valid_until = if valid_until.trim().is_empty() {
        None
    } else {
        Some(valid_until.trim().to_string())
    };
    draft.notes = prompt(Text::new("Notes shown on the quote (optional):").prompt());

    let errors = draft.validate();
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(());
    }

    let totals = draft.totals();
    println!("\n   Subtotal: {}", eur(totals.subtotal));
    if draft.apply_tax {
        println!("   VAT ({}%): {}", draft.tax_rate, eur(totals.tax));
    } else {
        println!("   VAT: not applied");
    }
    println!("   TOTAL: {}", eur(totals.total));

    let confirmed = prompt(Confirm::new("Save this quote?").with_default(true).prompt());
    if !confirmed {
        println!("Cancelled");
        return Ok(());
    }
    let Some(payload) = draft.payload() else {
        return Ok(());
    };

    let quote = api.create_quote(&payload)?;
    println!("✅ Quote {} created, total {}", quote.number, eur(quote.total));
    Ok(())
}

fn cmd_quotes_status(api: &ApiClient, id: i64) -> ApiResult<()> {
    let quote = api.get_quote(id)?;
    print!("Current status: ");
    print_badge(quote.status.style());

    let statuses: Vec<QuoteStatus> = QuoteStatus::iter().collect();
    let starting = statuses.iter().position(|s| *s == quote.status).unwrap_or(0);
    let status = prompt(
        Select::new("New status:", statuses)
            .with_starting_cursor(starting)
            .prompt(),
    );

    api.set_quote_status(id, status)?;

    // Refetch: the deletion countdown is recomputed server-side.
    let updated = api.get_quote(id)?;
    print!("✅ Status updated: ");
    print_badge(updated.status.style());
    if updated.status == QuoteStatus::Rejected {
        if let Some(days) = updated.days_until_deletion {
            println!("⏳ This quote will be deleted in {days} days");
        }
    }
    Ok(())
}

fn cmd_quotes_stats(api: &ApiClient) -> ApiResult<()> {
    let stats = api.quote_stats()?;

    println!("\n--- Quote statistics ---");
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Metric"), Cell::new("Value")]);
    table.add_row(vec![Cell::new("Total"), Cell::new(stats.total)]);
    table.add_row(vec![
        Cell::new("Accepted"),
        Cell::new(stats.accepted).fg(Color::Rgb { r: 39, g: 174, b: 96 }),
    ]);
    table.add_row(vec![
        Cell::new("Pending"),
        Cell::new(stats.pending).fg(Color::Rgb { r: 243, g: 156, b: 18 }),
    ]);
    table.add_row(vec![
        Cell::new("Rejected"),
        Cell::new(stats.rejected).fg(Color::Rgb { r: 231, g: 76, b: 60 }),
    ]);
    table.add_row(vec![
        Cell::new("Conversion").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.1} %", stats.conversion_rate)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    Ok(())
}

fn cmd_quotes_delete(api: &ApiClient, id: i64) -> ApiResult<()> {
    let quote = api.get_quote(id)?;
    let confirmed = prompt(
        Confirm::new(&format!("Delete quote {} ({})?", quote.number, quote.title))
            .with_default(false)
            .prompt(),
    );
    if !confirmed {
        println!("Cancelled");
        return Ok(());
    }

    api.delete_quote(id)?;
    println!("✅ Quote deleted.");
    Ok(())
}

fn print_quote_table(quotes: &[Quote]) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Number"),
        Cell::new("Issued"),
        Cell::new("Title"),
        Cell::new("Client"),
        Cell::new("VAT"),
        Cell::new("Total"),
        Cell::new("Status"),
    ]);
    for quote in quotes {
        let vat_cell = if quote.apply_tax {
            Cell::new(format!("{:.0}%", quote.tax_rate))
        } else {
            Cell::new("no VAT").fg(Color::Rgb { r: 243, g: 156, b: 18 })
        };
        table.add_row(vec![
            Cell::new(quote.id),
            Cell::new(&quote.number),
            Cell::new(quote.issued_on.as_deref().unwrap_or("")),
            Cell::new(&quote.title),
            Cell::new(quote.client_name.as_deref().unwrap_or("")),
            vat_cell,
            Cell::new(eur(quote.total)).add_attribute(Attribute::Bold),
            badge_cell(quote.status.style()),
        ]);
    }
    println!("{table}");
}

fn print_quote_detail(quote: &Quote) {
    println!("\n📄 {} · {}", quote.number, quote.title);
    print!("   Status: ");
    print_badge(quote.status.style());
    if let Some(name) = quote.client_name.as_deref() {
        println!("   Client: {name}");
    }
    if let Some(issued) = quote.issued_on.as_deref().filter(|d| !d.is_empty()) {
        println!("   Issued: {issued}");
    }
    if let Some(valid) = quote.valid_until.as_deref().filter(|d| !d.is_empty()) {
        println!("   Valid until: {valid}");
    }
    if quote.status == QuoteStatus::Rejected {
        if let Some(days) = quote.days_until_deletion {
            println!("   ⏳ Will be deleted in {days} days");
        }
    }
    if let Some(description) = quote.description.as_deref().filter(|d| !d.is_empty()) {
        println!("   {description}");
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Concept"),
        Cell::new("Notes"),
        Cell::new("Qty"),
        Cell::new("Unit"),
        Cell::new("Total"),
    ]);
    for line in &quote.lines {
        table.add_row(vec![
            Cell::new(&line.concept),
            Cell::new(line.description.as_deref().unwrap_or("")),
            Cell::new(line.quantity),
            Cell::new(eur(line.unit_price)),
            Cell::new(eur(line.total())),
        ]);
    }
    println!("{table}");

    println!("   Subtotal: {}", eur(quote.subtotal));
    if quote.apply_tax {
        println!("   VAT ({}%): {}", quote.tax_rate, eur(quote.tax_amount));
    } else {
        println!("   VAT: not applied");
    }
    println!("   TOTAL: {}", eur(quote.total));
    if let Some(notes) = quote.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("\n   Notes: {notes}");
    }
}

// ==========================================
// 6. Config & Utilities
// ==========================================

fn settings_path() -> std::path::PathBuf {
    config_dir().join("settings.toml")
}

fn load_settings() -> Option<AppSettings> {
    let path = settings_path();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

fn setup_config_wizard() -> AppSettings {
    println!("\n⚙️  --- Configuration ---");
    let current = load_settings();
    let default_val = current
        .map(|s| s.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let api_url = prompt(Text::new("API base URL:").with_default(&default_val).prompt());

    let settings = AppSettings { api_url };
    fs::create_dir_all(config_dir()).expect("Creating config directory failed");
    let toml_str = toml::to_string_pretty(&settings).expect("Settings must serialize");
    fs::write(settings_path(), toml_str).expect("Failed to save settings");
    println!("✅ Settings saved.");
    settings
}

// Default text for a prompt backed by an optional field of the record
// being edited.
fn opt_field(existing: Option<&Client>, get: impl Fn(&Client) -> Option<&str>) -> String {
    existing.and_then(get).unwrap_or("").to_string()
}

// Cancelled prompts (Esc / Ctrl-C) end the run quietly.
fn prompt<T>(result: Result<T, InquireError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => std::process::exit(0),
    }
}

fn print_field_errors(errors: &[FieldError]) {
    println!("❌ Fix the following and try again:");
    for error in errors {
        println!("   • {error}");
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

fn badge_cell(style: BadgeStyle) -> Cell {
    Cell::new(format!(" {} ", style.label))
        .fg(rgb(style.fg))
        .bg(rgb(style.bg))
}

// Inline badge for single-record output, colored like the table cells.
fn print_badge(style: BadgeStyle) {
    let (r, g, b) = style.fg;
    println!("\u{1b}[38;2;{r};{g};{b}m{}\u{1b}[0m", style.label);
}

fn eur(amount: f64) -> String {
    format!("{amount:.2} €")
}

fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 20 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

fn format_visit_date(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.checked_add_days(Days::new(1)) {
        "Tomorrow".to_string()
    } else {
        date.format("%a %d %b").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_by_hour() {
        assert_eq!(greeting(0), "Good morning");
        assert_eq!(greeting(11), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(19), "Good afternoon");
        assert_eq!(greeting(20), "Good evening");
        assert_eq!(greeting(23), "Good evening");
    }

    #[test]
    fn visit_dates_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(format_visit_date(today, today), "Today");
        assert_eq!(
            format_visit_date(today.succ_opt().unwrap(), today),
            "Tomorrow"
        );
        let later = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert_eq!(format_visit_date(later, today), "Thu 20 Mar");
    }

    #[test]
    fn eur_formatting() {
        assert_eq!(eur(157.3), "157.30 €");
        assert_eq!(eur(0.0), "0.00 €");
    }
}
