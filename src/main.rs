//!
//! docask CLI binary
//! ------------------
//! Command-line client and interactive interpreter for a document-based GPT
//! service. Signs in against the service's auth endpoint, keeps the issued
//! credential under a local state directory so the session survives
//! restarts, and exposes corpus questions plus (for admin accounts)
//! document upload.

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docask::api::RegisterRequest;
use docask::cli::{print_answer, run_repl, run_upload};
use docask::client::ApiClient;
use docask::session::SessionStore;
use docask::token::Role;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--url <api_url>] [--state-dir <dir>] [--user <u> --password <p>]\n  {program} --ask \"<question>\" [--user <u> --password <p>]   # one-shot question, then exit\n  {program} --upload <path> [--user <u> --password <p>]       # one-shot upload, then exit\n  {program} --register --user <u> --password <p> [--role user|admin] [--admin-key <key>]\n  {program} --logout                                          # drop the persisted session\n\nFlags:\n  --url <api_url>          Service base URL (default: $DOCASK_API_URL or http://127.0.0.1:8000)\n  --state-dir <dir>        Where the credential is persisted (default: $DOCASK_STATE_DIR or .docask)\n  --user <u>               Username for sign-in or registration\n  --password <p>           Password for sign-in or registration\n  --role <user|admin>      Account role for --register (default: user)\n  --admin-key <key>        Admin key, required when registering an admin account\n  -q, --ask <question>     Ask one question and exit\n  --upload <path>          Upload one document and exit\n  --register               Register an account and exit\n  --logout                 Sign out and exit\n  -h, --help               Show this help\n\nWithout a one-shot flag the interactive interpreter starts. If a persisted\ncredential is still valid you are signed in immediately; otherwise the\nlogin form is shown. Type 'help' inside the interpreter for commands.\n\nExamples:\n  {program} --register --user alice --password hunter2\n  {program} --user alice --password hunter2 --ask \"What is the refund policy?\"\n  {program} --user root --password s3cr3t --upload notes.txt\n  {program}"
    );
}

fn require_value(args: &[String], i: usize, flag: &str, program: &str) -> String {
    if i + 1 >= args.len() {
        eprintln!("{flag} requires a value");
        print_usage(program);
        std::process::exit(2);
    }
    args[i + 1].clone()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut api_url: Option<String> = None;
    let mut state_dir: Option<String> = None;
    let mut user: Option<String> = None;
    let mut password: Option<String> = None;
    let mut ask: Option<String> = None;
    let mut upload: Option<String> = None;
    let mut register = false;
    let mut role: String = "user".to_string();
    let mut admin_key: Option<String> = None;
    let mut logout = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                api_url = Some(require_value(&args, i, "--url", &program));
                i += 2;
            }
            "--state-dir" => {
                state_dir = Some(require_value(&args, i, "--state-dir", &program));
                i += 2;
            }
            "--user" => {
                user = Some(require_value(&args, i, "--user", &program));
                i += 2;
            }
            "--password" => {
                password = Some(require_value(&args, i, "--password", &program));
                i += 2;
            }
            "--ask" | "-q" => {
                ask = Some(require_value(&args, i, "--ask", &program));
                i += 2;
            }
            "--upload" => {
                upload = Some(require_value(&args, i, "--upload", &program));
                i += 2;
            }
            "--role" => {
                role = require_value(&args, i, "--role", &program);
                i += 2;
            }
            "--admin-key" => {
                admin_key = Some(require_value(&args, i, "--admin-key", &program));
                i += 2;
            }
            "--register" => {
                register = true;
                i += 1;
            }
            "--logout" => {
                logout = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            unk => {
                eprintln!("Unrecognized argument: {unk}");
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let api_url = api_url
        .or_else(|| env::var("DOCASK_API_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let state_dir = state_dir
        .or_else(|| env::var("DOCASK_STATE_DIR").ok())
        .unwrap_or_else(|| ".docask".to_string());

    info!(
        target: "docask",
        "docask starting: api_url='{}', state_dir='{}'",
        api_url, state_dir
    );

    let session = Arc::new(SessionStore::new(Path::new(&state_dir)));
    let client = ApiClient::new(&api_url, session).context("failed to build API client")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    if logout {
        client.logout();
        println!("signed out");
        return Ok(());
    }

    if register {
        let (Some(u), Some(p)) = (user.clone(), password.clone()) else {
            eprintln!("--register requires --user and --password");
            std::process::exit(2);
        };
        let role: Role = match role.parse() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(2);
            }
        };
        let req = RegisterRequest { username: u, password: p, role, admin_key };
        match rt.block_on(client.register(&req)) {
            Ok(message) => println!("{message}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Auto sign-in when credentials are given on the command line.
    if let (Some(u), Some(p)) = (user.as_deref(), password.as_deref()) {
        match rt.block_on(client.login(u, p)) {
            Ok(session) => println!("signed in as {} ({})", session.username(), session.role()),
            Err(e) => {
                eprintln!("error: {e}");
                if ask.is_some() || upload.is_some() {
                    std::process::exit(1);
                }
            }
        }
    }

    if let Some(question) = ask {
        match rt.block_on(client.ask(&question)) {
            Ok(result) => print_answer(&result),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let Some(path) = upload {
        match run_upload(&rt, &client, &path) {
            Ok(message) => println!("{message}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    run_repl(&rt, &client)
}
