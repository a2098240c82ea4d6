mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shortlink::config::{ClientConfig, ConfigError};
use shortlink::guard::{self, GuardOutcome, Route, RouteGuard};
use shortlink::net::types::ProfileUpdate;
use shortlink::session::SessionError;
use shortlink::state::account::{PASSWORD_CHANGE_FAILED, PROFILE_LOAD_FAILED, PROFILE_UPDATE_FAILED};
use shortlink::state::{
    AdminState, BlockAction, ExploreState, MyUrlsState, ProfileState, SortField, admin, registration_error_message,
    urls,
};
use shortlink::util::validation::{FieldErrors, PasswordChangeForm, RegistrationForm, validate_url_input};
use shortlink::{ApiError, ShortlinkApi};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `shortlink login` first")]
    NotLoggedIn,
    #[error("session expired; run `shortlink login` again")]
    SessionExpired,
    #[error("already logged in; run `shortlink logout` first")]
    AlreadyLoggedIn,
    #[error("this command requires an admin account")]
    AdminOnly,
    #[error("this command is not available to admin accounts")]
    RegularOnly,
    #[error("{0}")]
    Invalid(#[from] FieldErrors),
    #[error("{0}")]
    Failed(String),
    #[error("admin accounts cannot be blocked")]
    CannotBlockAdmin,
    #[error("no URL with id {0}")]
    UnknownUrl(i64),
    #[error("no user with id {0}")]
    UnknownUser(i64),
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", render::coded(.0))]
    Api(#[from] ApiError),
    #[error("{}", render::coded(.0))]
    Session(#[from] SessionError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "shortlink", about = "Shortlink URL shortener client")]
struct Cli {
    #[arg(long, env = "SHORTLINK_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "SHORTLINK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in with it.
    Register(RegisterArgs),
    Login(LoginArgs),
    Logout,
    /// Show the identity stored in the current session.
    Whoami,
    Urls(UrlsCommand),
    /// Browse public links.
    Explore(ExploreArgs),
    Profile(ProfileCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "SHORTLINK_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to --password.
    #[arg(long)]
    confirm_password: Option<String>,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "SHORTLINK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct UrlsCommand {
    #[command(subcommand)]
    command: UrlsSubcommand,
}

#[derive(Subcommand, Debug)]
enum UrlsSubcommand {
    List,
    Create {
        original_url: String,
    },
    Edit {
        url_id: i64,
        original_url: String,
    },
    Delete {
        url_id: i64,
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// Resolve a link (counts as a visit) and print where it redirects.
    Visit {
        url_id: i64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Visits,
    Date,
}

impl SortArg {
    fn field(self) -> SortField {
        match self {
            Self::Visits => SortField::VisitCount,
            Self::Date => SortField::CreatedAt,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Visits => "popularity",
            Self::Date => "date",
        }
    }
}

#[derive(Args, Debug)]
struct ExploreArgs {
    /// Case-insensitive match on original URL or short code.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Date)]
    sort: SortArg,
    /// Ascending instead of descending.
    #[arg(long, default_value_t = false)]
    asc: bool,
    /// Print the short link for this URL id and count the visit in the listing.
    #[arg(long)]
    visit: Option<i64>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Users,
    /// Show one user and their links.
    View {
        user_id: i64,
    },
    /// Block an active user, or unblock a blocked one.
    Block {
        user_id: i64,
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
}

struct CliContext {
    api: ShortlinkApi,
    json: bool,
    /// Whether a session was present before this command ran.
    signed_in: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(path) = cli.session_file {
        config = config.with_session_file(path);
    }
    tracing::debug!(base_url = %config.base_url, session_file = %config.session_file.display(), "configured");

    let ctx = CliContext::new(ShortlinkApi::from_config(&config)?, cli.json);

    match cli.command {
        Command::Register(args) => run_register(&ctx, args).await,
        Command::Login(args) => run_login(&ctx, args).await,
        Command::Logout => {
            ctx.api.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx),
        Command::Urls(urls) => run_urls(&ctx, urls).await,
        Command::Explore(args) => run_explore(&ctx, args).await,
        Command::Profile(profile) => run_profile(&ctx, profile).await,
        Command::Admin(admin) => run_admin(&ctx, admin).await,
    }
}

// =============================================================================
// AUTH
// =============================================================================

async fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<(), CliError> {
    ctx.enter("/register")?;

    let form = RegistrationForm {
        confirm_password: args.confirm_password.unwrap_or_else(|| args.password.clone()),
        username: args.username,
        email: args.email,
        password: args.password,
    };
    form.validate()?;

    let claims = ctx
        .api
        .register_and_login(&form.to_request())
        .await
        .map_err(|e| CliError::Failed(registration_error_message(&e)))?;
    println!("Registered and logged in as {}", render::identity(&claims));
    Ok(())
}

async fn run_login(ctx: &CliContext, args: LoginArgs) -> Result<(), CliError> {
    ctx.enter("/login")?;
    let claims = ctx.api.login(&args.email, &args.password).await.map_err(|e| ctx.failed(e, "Login failed"))?;
    println!("Logged in as {}", render::identity(&claims));
    Ok(())
}

fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let Some(claims) = ctx.api.session().claims() else {
        return Err(CliError::NotLoggedIn);
    };
    if ctx.json {
        return print_json(&claims);
    }
    println!("{}", render::identity(&claims));
    println!("{}", render::token_status(&claims, OffsetDateTime::now_utc().unix_timestamp()));
    Ok(())
}

// =============================================================================
// URLS
// =============================================================================

async fn run_urls(ctx: &CliContext, command: UrlsCommand) -> Result<(), CliError> {
    ctx.enter("/my-urls")?;

    match command.command {
        UrlsSubcommand::List => {
            let mut state = MyUrlsState::default();
            match ctx.api.my_urls().await {
                Ok(list) => state.loaded(list),
                Err(e) => return Err(ctx.failed(e, urls::LOAD_FAILED)),
            }
            if ctx.json {
                return print_json(&state.urls);
            }
            print!("{}", render::url_table(&state.urls.iter().collect::<Vec<_>>(), &ctx.api));
            Ok(())
        }
        UrlsSubcommand::Create { original_url } => {
            let target = validate_url_input(&original_url)?;
            let created = ctx.api.create_url(target).await.map_err(|e| ctx.failed(e, urls::CREATE_FAILED))?;
            if ctx.json {
                return print_json(&created);
            }
            print!("{}", render::url_detail(&created, &ctx.api));
            Ok(())
        }
        UrlsSubcommand::Edit { url_id, original_url } => {
            let target = validate_url_input(&original_url)?;
            let updated =
                ctx.api.update_url(url_id, target).await.map_err(|e| ctx.failed(e, urls::UPDATE_FAILED))?;
            if ctx.json {
                return print_json(&updated);
            }
            print!("{}", render::url_detail(&updated, &ctx.api));
            Ok(())
        }
        UrlsSubcommand::Delete { url_id, yes } => {
            let mut state = MyUrlsState::default();
            state.loaded(ctx.api.my_urls().await.map_err(|e| ctx.failed(e, urls::LOAD_FAILED))?);
            let Some(url) = state.get(url_id) else {
                return Err(CliError::UnknownUrl(url_id));
            };
            let prompt = format!("Are you sure you want to delete {}?", url.original_url);
            if !confirm(&prompt, yes)? {
                return Err(CliError::Cancelled);
            }
            ctx.api.delete_url(url_id).await.map_err(|e| ctx.failed(e, urls::DELETE_FAILED))?;
            state.remove(url_id);
            println!("Deleted. {} URL(s) remaining.", state.urls.len());
            Ok(())
        }
        UrlsSubcommand::Visit { url_id } => {
            let target = ctx.api.visit_url(url_id).await.map_err(|e| ctx.failed(e, "Failed to visit URL"))?;
            println!("{target}");
            Ok(())
        }
    }
}

async fn run_explore(ctx: &CliContext, args: ExploreArgs) -> Result<(), CliError> {
    ctx.enter("/explore-urls")?;

    let mut state = ExploreState::default();
    match ctx.api.public_urls().await {
        Ok(list) => state.loaded(list),
        Err(e) => {
            state.failed(&e);
            return Err(ctx.failed(e, shortlink::state::explore::LOAD_FAILED));
        }
    }

    let field = args.sort.field();
    if state.sort_field() != field {
        state.sort_by(field);
    }
    if args.asc {
        state.sort_by(field);
    }
    if let Some(term) = args.search {
        state.set_search(term);
    }
    if let Some(url_id) = args.visit {
        let link = explore_visit(&mut state, &ctx.api, url_id)?;
        if ctx.json {
            eprintln!("{link}");
        } else {
            println!("Open {link}");
        }
    }

    let visible = state.visible();
    if ctx.json {
        return print_json(&visible);
    }
    println!("{}", render::sort_caption(args.sort.label(), state.sort_direction()));
    print!("{}", render::url_table(&visible, &ctx.api));
    Ok(())
}

/// Short link for a listed URL, counting the visit locally once it is handed out.
fn explore_visit(state: &mut ExploreState, api: &ShortlinkApi, url_id: i64) -> Result<String, CliError> {
    let url = state.urls.iter().find(|u| u.id == url_id).ok_or(CliError::UnknownUrl(url_id))?;
    let link = api.short_link(&url.short_code);
    state.record_visit(url_id);
    Ok(link)
}

// =============================================================================
// PROFILE
// =============================================================================

async fn run_profile(ctx: &CliContext, command: ProfileCommand) -> Result<(), CliError> {
    ctx.enter("/profile")?;

    let mut state = ProfileState::default();
    match ctx.api.my_profile().await {
        Ok(profile) => state.loaded(profile),
        Err(e) => return Err(ctx.failed(e, PROFILE_LOAD_FAILED)),
    }

    match command.command {
        ProfileSubcommand::Show => {}
        ProfileSubcommand::Update { username, last_name, email } => {
            let mut update = state.edit_form().unwrap_or_default();
            apply_profile_overrides(&mut update, username, last_name, email);
            let user_id = ctx.api.current_user_id()?;
            let updated =
                ctx.api.update_user(user_id, &update).await.map_err(|e| ctx.failed(e, PROFILE_UPDATE_FAILED))?;
            state.updated(updated);
        }
        ProfileSubcommand::ChangePassword { current, new, confirm } => {
            let form = PasswordChangeForm { current_password: current, new_password: new, confirm_password: confirm };
            form.validate()?;
            ctx.api
                .change_password(&form.current_password, &form.new_password)
                .await
                .map_err(|e| ctx.failed(e, PASSWORD_CHANGE_FAILED))?;
            state.password_changed();
        }
    }

    if let Some(notice) = &state.notice {
        eprintln!("{notice}");
    }
    let Some(profile) = &state.profile else {
        return Ok(());
    };
    if ctx.json {
        return print_json(profile);
    }
    print!("{}", render::profile(profile));
    Ok(())
}

fn apply_profile_overrides(
    update: &mut ProfileUpdate,
    username: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
) {
    if let Some(username) = username {
        update.username = username;
    }
    if let Some(last_name) = last_name {
        update.last_name = last_name;
    }
    if let Some(email) = email {
        update.email = email;
    }
}

// =============================================================================
// ADMIN
// =============================================================================

async fn run_admin(ctx: &CliContext, command: AdminCommand) -> Result<(), CliError> {
    ctx.enter("/admin")?;

    let mut state = AdminState::default();
    match ctx.api.list_users().await {
        Ok(users) => state.loaded(users),
        Err(e) => {
            state.failed(&e);
            return Err(ctx.failed(e, admin::LOAD_FAILED));
        }
    }

    match command.command {
        AdminSubcommand::Users => {
            if ctx.json {
                return print_json(&state.users);
            }
            print!("{}", render::user_table(&state.users));
        }
        AdminSubcommand::View { user_id } => {
            let user = ctx.api.get_user(user_id).await.map_err(|e| ctx.failed(e, admin::DETAIL_FAILED))?;
            let links = ctx.api.user_urls(user_id).await.map_err(|e| ctx.failed(e, admin::DETAIL_FAILED))?;
            state.open_detail(user, links);
            let Some(detail) = &state.selected else {
                return Ok(());
            };
            if ctx.json {
                return print_json(&serde_json::json!({ "user": detail.user, "urls": detail.urls }));
            }
            print!("{}", render::profile(&detail.user));
            println!();
            print!("{}", render::url_table(&detail.urls.iter().collect::<Vec<_>>(), &ctx.api));
        }
        AdminSubcommand::Block { user_id, yes } => {
            let user = state.user(user_id).ok_or(CliError::UnknownUser(user_id))?;
            let action = BlockAction::for_user(user).ok_or(CliError::CannotBlockAdmin)?;
            let prompt = format!("Are you sure you want to {} {}?", action.as_str(), user.display_name());
            if !confirm(&prompt, yes)? {
                return Err(CliError::Cancelled);
            }
            ctx.api.block_user(user_id).await.map_err(|e| ctx.failed(e, &action.failure_fallback()))?;
            state.apply_block(user_id, action);
            println!("{}", action.success_message());
        }
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

impl CliContext {
    fn new(api: ShortlinkApi, json: bool) -> Self {
        let signed_in = api.session().state().session.is_authenticated();
        Self { api, json, signed_in }
    }

    /// Apply the page's access policy to the current session.
    fn enter(&self, path: &str) -> Result<(), CliError> {
        match guard::navigate(path, &self.api.session().state()) {
            GuardOutcome::Render => Ok(()),
            GuardOutcome::Loading => Err(CliError::Failed("session is still loading".to_owned())),
            GuardOutcome::Redirect(to) => Err(redirect_error(RouteGuard::for_path(path), to)),
        }
    }

    /// Turn a failed request into the message a person should see.
    ///
    /// A 401 only means an expired session when there was a session to lose;
    /// a rejected login keeps the backend's detail.
    fn failed(&self, err: ApiError, fallback: &str) -> CliError {
        tracing::debug!(error = %err, "request failed");
        let session_lost = self.signed_in && !self.api.session().state().session.is_authenticated();
        if err.status() == Some(401) && session_lost {
            return CliError::SessionExpired;
        }
        match err {
            ApiError::Status { .. } => CliError::Failed(err.user_message(fallback)),
            other => CliError::Api(other),
        }
    }
}

fn redirect_error(guard: Option<RouteGuard>, to: Route) -> CliError {
    match (guard, to) {
        (_, Route::Landing) => CliError::NotLoggedIn,
        (Some(RouteGuard::PublicOnly), _) => CliError::AlreadyLoggedIn,
        (Some(RouteGuard::AdminOnly), _) => CliError::AdminOnly,
        _ => CliError::RegularOnly,
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
