//! Interactive front end: the screen state machine, REPL command dispatch
//! and result rendering for the docask interpreter.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use crate::api::{QueryResult, RegisterRequest};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::token::Role;

/// Which form the signed-out screen is showing. Toggling between them is a
/// purely local action; no network call is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Top-level screen. Modeled as one enum so illegal combinations (signed in
/// while also showing a login form) cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignedOut { mode: AuthMode },
    SignedIn { role: Role },
}

impl Screen {
    /// Fresh signed-out screen; logout always lands here, on the login form.
    pub fn signed_out() -> Self {
        Screen::SignedOut { mode: AuthMode::Login }
    }

    pub fn on_login(&mut self, role: Role) {
        *self = Screen::SignedIn { role };
    }

    pub fn on_logout(&mut self) {
        *self = Screen::signed_out();
    }

    /// Switch between the login and register forms. Returns the new mode, or
    /// None when already signed in (there is nothing to toggle).
    pub fn toggle_mode(&mut self) -> Option<AuthMode> {
        match self {
            Screen::SignedOut { mode } => {
                *mode = match mode {
                    AuthMode::Login => AuthMode::Register,
                    AuthMode::Register => AuthMode::Login,
                };
                Some(*mode)
            }
            Screen::SignedIn { .. } => None,
        }
    }

    /// Chat is visible for any signed-in role.
    pub fn can_ask(&self) -> bool {
        matches!(self, Screen::SignedIn { .. })
    }

    /// Upload is rendered for admins only. Advisory: the service still makes
    /// the authoritative call if the command is invoked anyway.
    pub fn shows_upload(&self) -> bool {
        matches!(self, Screen::SignedIn { role: Role::Admin })
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Screen::SignedOut { mode: AuthMode::Login } => "login> ",
            Screen::SignedOut { mode: AuthMode::Register } => "register> ",
            Screen::SignedIn { role: Role::User } => "docask> ",
            Screen::SignedIn { role: Role::Admin } => "docask(admin)> ",
        }
    }
}

/// Print an answer followed by its cited sources, in the order the service
/// returned them.
pub fn print_answer(result: &QueryResult) {
    println!("answer:");
    println!("  {}", result.answer);
    if result.sources.is_empty() {
        return;
    }
    println!("sources:");
    for (i, s) in result.sources.iter().enumerate() {
        println!("  [{}] {} (chunk {})", i + 1, s.file_path, s.chunk_index);
        for line in s.text.lines() {
            println!("      {line}");
        }
    }
}

fn print_help(screen: &Screen) {
    match screen {
        Screen::SignedOut { mode } => {
            println!("commands:");
            match mode {
                AuthMode::Login => {
                    println!("  login <user> <password>                      sign in");
                    println!("  register                                     switch to the register form");
                }
                AuthMode::Register => {
                    println!("  register <user> <password> [role] [admin_key]   create an account (role: user|admin)");
                    println!("  login                                        switch to the login form");
                }
            }
            println!("  status                                       show connection info");
            println!("  help                                         this help");
            println!("  quit | exit                                  leave the interpreter");
        }
        Screen::SignedIn { .. } => {
            println!("commands:");
            println!("  ask <question>          query the document corpus (bare text also works)");
            if screen.shows_upload() {
                println!("  upload <path>           upload a document for indexing");
            }
            println!("  status                  show session info");
            println!("  logout                  sign out");
            println!("  help                    this help");
            println!("  quit | exit             leave the interpreter");
        }
    }
}

fn print_status(client: &ApiClient, screen: &Screen) {
    println!("api: {}", client.base());
    match client.session().current() {
        Some(s) => {
            let expires = chrono::DateTime::from_timestamp(s.claims.exp, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!("signed in as {} ({}), credential expires {}", s.username(), s.role(), expires);
        }
        None => {
            let mode = match screen {
                Screen::SignedOut { mode: AuthMode::Register } => "register",
                _ => "login",
            };
            println!("signed out (showing {mode} form)");
        }
    }
}

fn report(err: &ApiError) {
    if err.is_local() {
        println!("{}", err.message());
    } else {
        eprintln!("error: {err}");
    }
}

/// Run the interactive loop until quit or EOF. Remote calls are driven on
/// the provided runtime from this synchronous loop; the session store is the
/// only state shared with the client.
pub fn run_repl(rt: &tokio::runtime::Runtime, client: &ApiClient) -> Result<()> {
    let mut screen = match client.session().current() {
        Some(s) => {
            println!("signed in as {} ({})", s.username(), s.role());
            Screen::SignedIn { role: s.role() }
        }
        None => Screen::signed_out(),
    };
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("docask interpreter. Type 'help' for commands.");
    loop {
        input.clear();
        print!("{}", screen.prompt());
        let _ = stdout.flush();
        match stdin.read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w.to_ascii_lowercase(), r.trim()),
            None => (line.to_ascii_lowercase(), ""),
        };
        match word.as_str() {
            "quit" | "exit" => break,
            "help" => print_help(&screen),
            "status" => print_status(client, &screen),
            "login" => {
                if screen.can_ask() {
                    println!("already signed in; 'logout' first");
                    continue;
                }
                if rest.is_empty() {
                    if matches!(screen, Screen::SignedOut { mode: AuthMode::Register }) {
                        screen.toggle_mode();
                    }
                    println!("showing the login form; usage: login <user> <password>");
                    continue;
                }
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 2 {
                    println!("usage: login <user> <password>");
                    continue;
                }
                match rt.block_on(client.login(parts[0], parts[1])) {
                    Ok(session) => {
                        println!("signed in as {} ({})", session.username(), session.role());
                        screen.on_login(session.role());
                    }
                    Err(e) => report(&e),
                }
            }
            "register" => {
                if screen.can_ask() {
                    println!("already signed in; 'logout' first");
                    continue;
                }
                if rest.is_empty() {
                    if matches!(screen, Screen::SignedOut { mode: AuthMode::Login }) {
                        screen.toggle_mode();
                    }
                    println!("showing the register form; usage: register <user> <password> [role] [admin_key]");
                    continue;
                }
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() < 2 || parts.len() > 4 {
                    println!("usage: register <user> <password> [role] [admin_key]");
                    continue;
                }
                let role = match parts.get(2).map(|s| s.parse::<Role>()).transpose() {
                    Ok(r) => r.unwrap_or(Role::User),
                    Err(e) => {
                        report(&e);
                        continue;
                    }
                };
                let req = RegisterRequest {
                    username: parts[0].to_string(),
                    password: parts[1].to_string(),
                    role,
                    admin_key: parts.get(3).map(|s| s.to_string()),
                };
                match rt.block_on(client.register(&req)) {
                    Ok(message) => {
                        println!("{message}");
                        println!("you can now sign in: login {} <password>", req.username);
                        screen = Screen::signed_out();
                    }
                    Err(e) => report(&e),
                }
            }
            "logout" => {
                if !screen.can_ask() {
                    println!("not signed in");
                    continue;
                }
                client.logout();
                screen.on_logout();
                println!("signed out");
            }
            "ask" => {
                if !screen.can_ask() {
                    println!("sign in first ('help' for commands)");
                    continue;
                }
                match rt.block_on(client.ask(rest)) {
                    Ok(result) => print_answer(&result),
                    Err(e) => report(&e),
                }
            }
            "upload" => {
                if !screen.can_ask() {
                    println!("sign in first ('help' for commands)");
                    continue;
                }
                if rest.is_empty() {
                    println!("usage: upload <path>");
                    continue;
                }
                match run_upload(rt, client, rest) {
                    Ok(message) => println!("{message}"),
                    Err(e) => report(&e),
                }
            }
            _ => {
                // bare text while signed in reads as a question
                if screen.can_ask() {
                    match rt.block_on(client.ask(line)) {
                        Ok(result) => print_answer(&result),
                        Err(e) => report(&e),
                    }
                } else {
                    println!("sign in first ('help' for commands)");
                }
            }
        }
    }
    Ok(())
}

/// Read a local file and push it to the service. Kept out of the loop so the
/// one-shot `--upload` path in the binary shares it.
pub fn run_upload(rt: &tokio::runtime::Runtime, client: &ApiClient, path: &str) -> Result<String, ApiError> {
    let path = Path::new(path);
    if !looks_plain_text(path) {
        println!("note: the service indexes plain-text (.txt) documents");
    }
    let bytes = std::fs::read(path)
        .map_err(|e| ApiError::io(format!("cannot read '{}': {e}", path.display())))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.txt");
    rt.block_on(client.upload(name, bytes))
}

fn looks_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}
