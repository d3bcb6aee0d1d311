//! Entry point for the agentdash TUI. Parses args, resolves the profile and
//! either runs a one-shot query or the dashboard.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use agentdash::api::{base_from_ws_url, ApiClient};
use agentdash::app::App;
use agentdash::commands::SEED_HISTORY_LIMIT;
use agentdash::logging::{self, LogTarget};
use agentdash::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile,
};
use tracing::{info, warn};
use url::Url;

const DEFAULT_URL: &str = "ws://localhost:8000/ws";
const ONE_SHOT_LIMIT: usize = 50;

#[derive(Debug, Default)]
struct ParsedArgs {
    url: Option<String>,
    api: Option<String>,
    profile: Option<String>,
    save: bool,
    dry_run: bool,
    history_limit: Option<usize>,
    info: bool,
    processes: Option<usize>,
    search: Option<String>,
    dir: Option<String>,
    help: bool,
}

impl ParsedArgs {
    fn one_shot(&self) -> bool {
        self.info || self.processes.is_some() || self.search.is_some()
    }
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--api URL|-a URL] [--profile NAME|-P NAME] [--save] [--history-limit N] \
         [--info] [--processes N] [--search PATTERN [--dir DIR]] [--dry-run] [ws://HOST:PORT/ws]"
    )
}

fn number(flag: &str, v: Option<String>) -> Result<usize, String> {
    let v = v.ok_or_else(|| format!("{flag} needs a value"))?;
    v.parse::<usize>()
        .map_err(|_| format!("{flag} expects a number, got '{v}'"))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "agentdash".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                out.help = true;
            }
            "--api" | "-a" => {
                out.api = it.next();
            }
            "--profile" | "-P" => {
                out.profile = it.next();
            }
            "--save" => {
                out.save = true;
            }
            "--dry-run" => {
                out.dry_run = true;
            }
            "--info" => {
                out.info = true;
            }
            "--history-limit" => {
                out.history_limit = Some(number("--history-limit", it.next())?);
            }
            "--processes" => {
                out.processes = Some(number("--processes", it.next())?);
            }
            "--search" => {
                out.search = Some(it.next().ok_or("--search needs a pattern")?);
            }
            "--dir" => {
                out.dir = it.next();
            }
            _ if arg.starts_with("--api=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.api = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        out.profile = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option '{arg}'. {}", usage(&prog)));
            }
            _ => {
                if out.url.is_none() {
                    out.url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {}", usage(&prog)));
                }
            }
        }
    }
    if out.dir.is_some() && out.search.is_none() {
        return Err(format!("--dir only applies to --search. {}", usage(&prog)));
    }
    Ok(out)
}

fn validate_ws_url(raw: &str) -> Result<String, String> {
    let u = Url::parse(raw).map_err(|e| format!("invalid url '{raw}': {e}"))?;
    match u.scheme() {
        "ws" | "wss" => Ok(raw.to_string()),
        other => Err(format!(
            "unsupported scheme '{other}' in '{raw}' (expected ws:// or wss://)"
        )),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };
    if parsed.help {
        println!("{}", usage("agentdash"));
        return ExitCode::SUCCESS;
    }

    let target = if parsed.one_shot() || parsed.dry_run {
        LogTarget::Stderr
    } else {
        LogTarget::File
    };
    if let Err(e) = logging::init(target) {
        eprintln!("logging disabled: {e}");
    }

    let Some(entry) = resolve_entry(&parsed) else {
        return ExitCode::SUCCESS;
    };

    let url = match validate_ws_url(entry.url.trim()) {
        Ok(u) => u,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };
    let api = match entry.api.as_deref() {
        Some(a) => ApiClient::new(a),
        None => base_from_ws_url(&url).and_then(|b| ApiClient::new(b.as_str())),
    };
    let api = match api {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    if parsed.dry_run {
        info!(%url, api = %api.base(), "dry run");
        println!("ws:  {url}");
        println!("api: {}", api.base());
        return ExitCode::SUCCESS;
    }

    if parsed.one_shot() {
        return run_one_shot(&parsed, &api).await;
    }

    let history_limit = parsed.history_limit.unwrap_or(SEED_HISTORY_LIMIT);
    let mut app = App::new(api, history_limit);
    match app.run(&url).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            warn!("dashboard exited with error: {e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve the connection entry from args and saved profiles, persisting
/// new or changed profiles. `None` means the user aborted a prompt.
fn resolve_entry(parsed: &ParsedArgs) -> Option<ProfileEntry> {
    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        api: parsed.api.clone(),
    };
    let mut profiles_mut = profiles_file.clone();

    match req.resolve(&profiles_file) {
        ResolveProfile::Direct(entry) => {
            // Possibly save if profile specified and --save or new entry
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name) {
                    None => {
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        persist(&profiles_mut);
                    }
                    Some(existing) if *existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            persist(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            Some(entry)
        }
        ResolveProfile::Loaded(entry) => Some(entry),
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ").ok()?;
            let idx = line.trim().parse::<usize>().ok()?;
            let name = names.get(idx.checked_sub(1)?)?;
            let entry = profiles_mut.profiles.get(name)?.clone();
            Some(ProfileEntry {
                api: parsed.api.clone().or(entry.api),
                url: entry.url,
            })
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (ws://HOST:PORT/ws or wss://...): ").ok()?;
            if url.trim().is_empty() {
                return None;
            }
            let api = match parsed.api.clone() {
                Some(a) => Some(a),
                None => {
                    let a = prompt_string("Enter API base URL (or leave blank to derive): ")
                        .ok()?;
                    Some(a.trim().to_string()).filter(|a| !a.is_empty())
                }
            };
            let entry = ProfileEntry {
                url: url.trim().to_string(),
                api,
            };
            profiles_mut.profiles.insert(name, entry.clone());
            persist(&profiles_mut);
            Some(entry)
        }
        ResolveProfile::None => Some(ProfileEntry {
            url: DEFAULT_URL.to_string(),
            api: parsed.api.clone(),
        }),
    }
}

fn persist(pf: &agentdash::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(pf) {
        warn!("failed to save profiles: {e}");
        eprintln!("failed to save profiles: {e}");
    }
}

async fn run_one_shot(parsed: &ParsedArgs, api: &ApiClient) -> ExitCode {
    let res = if parsed.info {
        api.system_info().await
    } else if let Some(limit) = parsed.processes {
        api.processes(limit)
            .await
            .map(|p| serde_json::to_value(p).unwrap_or_default())
    } else if let Some(pattern) = parsed.search.as_deref() {
        api.search_files(pattern, parsed.dir.as_deref(), ONE_SHOT_LIMIT)
            .await
            .map(|hits| serde_json::to_value(hits).unwrap_or_default())
    } else {
        return ExitCode::SUCCESS;
    };

    match res {
        Ok(v) => match serde_json::to_string_pretty(&v) {
            Ok(s) => {
                println!("{s}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("request failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
