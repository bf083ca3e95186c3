// websheet - drive the spreadsheet client from a terminal
//
// Every command takes a URL fragment (`#/1f/Budget/cell/A1/formula`) the
// same way the browser client does, runs it against the server and prints
// what the client would show.

mod exit_codes;
mod report;
mod session;

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use websheet_api_client::{
    CurrencyFetcher, FetchError, FetcherWatcher, HttpTransport, LocaleFetcher, ReqwestTransport,
};
use websheet_config::Settings;
use websheet_history::HistoryToken;
use websheet_protocol::{Currency, Locale};

use exit_codes::{
    fetch_exit_code, EXIT_ERROR, EXIT_INVALID_TOKEN, EXIT_SERVER_STATUS, EXIT_SETTINGS, EXIT_SUCCESS,
};
use session::Session;

#[derive(Parser)]
#[command(name = "websheet")]
#[command(about = "Spreadsheet web client, headless")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// settings.json to read instead of the default location
    #[arg(long, global = true, env = "WEBSHEET_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Server base URL (overrides api.baseUrl)
    #[arg(long, global = true, env = "WEBSHEET_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse history-token fragments and print their canonical form
    #[command(after_help = "\
Examples:
  websheet parse '#/1f/Budget/cell/A1:B2'
  websheet parse /1f/Budget/column/B/freeze --json")]
    Parse {
        /// Fragments, with or without the leading #
        #[arg(required = true)]
        fragments: Vec<String>,

        /// One JSON object per fragment, as an array
        #[arg(long)]
        json: bool,
    },

    /// Open a fragment against the server and print the client state
    #[command(after_help = "\
Examples:
  websheet open '#/1f'
  websheet open /1f/Budget/cell/A1/formula --base-url http://localhost:12345
  websheet open /1f/Budget --then /1f/Budget/cell/B2/formula/save/=SUM(A1:A9)")]
    Open {
        /// Initial fragment
        fragment: String,

        /// Navigate to each fragment in turn once the previous one settled
        #[arg(long = "then", value_name = "FRAGMENT")]
        then: Vec<String>,
    },

    /// Look up a locale by tag
    Locale {
        /// BCP 47 tag, e.g. en-AU
        tag: String,
    },

    /// Look up a currency by ISO 4217 code
    Currency {
        /// e.g. AUD
        code: String,
    },

    /// Print the settings in effect as JSON
    Settings,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: websheet <command> [options]");
            eprintln!("       websheet --help for more information");
            Ok(())
        }
        Some(Commands::Parse { fragments, json }) => cmd_parse(&fragments, json),
        Some(Commands::Open { fragment, then }) => {
            load_settings(cli.settings, cli.base_url).and_then(|settings| cmd_open(settings, &fragment, &then))
        }
        Some(Commands::Locale { tag }) => {
            load_settings(cli.settings, cli.base_url).and_then(|settings| cmd_locale(settings, &tag))
        }
        Some(Commands::Currency { code }) => {
            load_settings(cli.settings, cli.base_url).and_then(|settings| cmd_currency(settings, &code))
        }
        Some(Commands::Settings) => load_settings(cli.settings, cli.base_url).and_then(|settings| cmd_settings(&settings)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn fetch(err: &FetchError) -> Self {
        let error = Self::new(fetch_exit_code(err), err.to_string());
        match err {
            FetchError::Network(_) => error.with_hint("is the server running? check api.baseUrl or --base-url"),
            FetchError::InvalidUrl(_) => error.with_hint("base URLs look like http://localhost:12345"),
            FetchError::Parse(_) => error,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn load_settings(path: Option<PathBuf>, base_url: Option<String>) -> Result<Settings, CliError> {
    let mut settings = match path {
        Some(path) => Settings::load_from(&path).map_err(|e| {
            CliError::new(EXIT_SETTINGS, format!("{}: {}", path.display(), e))
        })?,
        None => Settings::load(),
    };
    if let Some(base_url) = base_url {
        settings.api_base_url = base_url;
    }
    Ok(settings)
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io(format!("cannot start runtime: {}", e)))
}

/// The token for `fragment`, or an error naming it.
fn parse_fragment(fragment: &str) -> Result<HistoryToken, CliError> {
    let token = HistoryToken::parse(fragment);
    if token.is_unknown() {
        return Err(CliError::new(
            EXIT_INVALID_TOKEN,
            format!("invalid history token: {}", fragment),
        ));
    }
    Ok(token)
}

// ============================================================================
// parse
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedFragment<'a> {
    input: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spreadsheet_id: Option<String>,
    one_shot: bool,
}

fn cmd_parse(fragments: &[String], json: bool) -> Result<(), CliError> {
    let parsed: Vec<ParsedFragment<'_>> = fragments
        .iter()
        .map(|input| {
            let token = HistoryToken::parse(input);
            let valid = !token.is_unknown();
            ParsedFragment {
                input,
                valid,
                fragment: valid.then(|| format!("#{}", token.url_fragment())),
                spreadsheet_id: token.spreadsheet_id().map(|id| id.to_string()),
                one_shot: token.should_ignore(),
            }
        })
        .collect();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&parsed).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(handle, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        for entry in &parsed {
            match &entry.fragment {
                Some(fragment) => writeln!(handle, "{}", fragment).map_err(|e| CliError::io(e.to_string()))?,
                None => eprintln!("invalid: {}", entry.input),
            }
        }
    }

    let invalid = parsed.iter().filter(|entry| !entry.valid).count();
    if invalid > 0 {
        return Err(CliError::new(
            EXIT_INVALID_TOKEN,
            format!("{} of {} fragment(s) invalid", invalid, parsed.len()),
        ));
    }
    Ok(())
}

// ============================================================================
// open
// ============================================================================

fn cmd_open(settings: Settings, fragment: &str, then: &[String]) -> Result<(), CliError> {
    parse_fragment(fragment)?;
    for next in then {
        parse_fragment(next)?;
    }

    let rt = runtime()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, async {
        let session = Session::connect(settings, fragment).map_err(|e| CliError::fetch(&e))?;
        session.start().await;
        for next in then {
            log::info!("navigating to {}", next);
            session.navigate(next).await;
        }

        print!("{}", report::render(&session));
        for (level, message) in session.messages() {
            eprintln!("{}: {}", level.as_str().to_lowercase(), message);
        }

        match session.exit_code() {
            EXIT_SUCCESS => Ok(()),
            code => Err(CliError::new(code, "")),
        }
    })
}

// ============================================================================
// locale / currency
// ============================================================================

/// Holds the outcome of a single lookup.
struct Lookup<T> {
    result: RefCell<Option<Result<T, CliError>>>,
}

impl<T> Lookup<T> {
    fn new() -> Self {
        Self { result: RefCell::new(None) }
    }

    fn take(&self) -> Result<T, CliError> {
        self.result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(CliError::new(EXIT_ERROR, "no response")))
    }
}

impl<T: Clone> FetcherWatcher<T> for Lookup<T> {
    fn on_success(&self, value: &T) {
        *self.result.borrow_mut() = Some(Ok(value.clone()));
    }

    fn on_failure(&self, status: u16, _headers: &[(String, String)], body: &str) {
        let error = CliError::new(EXIT_SERVER_STATUS, format!("server answered {}: {}", status, body));
        *self.result.borrow_mut() = Some(Err(error));
    }

    fn on_error(&self, error: &FetchError) {
        *self.result.borrow_mut() = Some(Err(CliError::fetch(error)));
    }
}

fn transport(settings: &Settings) -> Result<Rc<dyn HttpTransport>, CliError> {
    let transport = ReqwestTransport::new(Duration::from_secs(settings.fetch_timeout_seconds))
        .map_err(|e| CliError::fetch(&e))?;
    Ok(Rc::new(transport))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn cmd_locale(settings: Settings, tag: &str) -> Result<(), CliError> {
    let fetcher = LocaleFetcher::new(&settings.api_base_url, transport(&settings)?)
        .map_err(|e| CliError::fetch(&e))?;
    let lookup: Rc<Lookup<Locale>> = Rc::new(Lookup::new());
    let remover = fetcher.add_watcher(lookup.clone());
    runtime()?.block_on(fetcher.get(tag));
    remover.remove();
    print_json(&lookup.take()?)
}

fn cmd_currency(settings: Settings, code: &str) -> Result<(), CliError> {
    let fetcher = CurrencyFetcher::new(&settings.api_base_url, transport(&settings)?)
        .map_err(|e| CliError::fetch(&e))?;
    let lookup: Rc<Lookup<Currency>> = Rc::new(Lookup::new());
    let remover = fetcher.add_watcher(lookup.clone());
    runtime()?.block_on(fetcher.get(code));
    remover.remove();
    print_json(&lookup.take()?)
}

// ============================================================================
// settings
// ============================================================================

fn cmd_settings(settings: &Settings) -> Result<(), CliError> {
    print_json(settings)
}
