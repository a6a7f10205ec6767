use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pfwatch_core::config::{default_root, CoreConfig};
use pfwatch_core::services::ledger::FilteredListingEntry;
use pfwatch_core::services::report::matches_search;
use pfwatch_core::services::{Listing, Notice, NotificationSink, Screen};
use pfwatch_core::utils::duration::{format_duration, parse_disable_duration};
use pfwatch_core::utils::logbook::export_entries;
use pfwatch_core::utils::state::{load_state, save_state};
use rules::{Rule, RuleMode};

const COMMAND_PREFIX: &str = "/pfwatch";

#[derive(Parser, Debug)]
#[command(name = "pfwatch-agent", about = "Party Finder listing screener")]
struct Cli {
    /// Data root holding config.toml and rules.json (default: $PFWATCH_ROOT or .pfwatch)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Screen JSON-lines listings from a file or stdin. Lines starting with `/pfwatch` are commands.
    Scan {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Append the ledger to the logbook when the scan ends
        #[arg(long)]
        export: bool,
        /// Start with no active play session
        #[arg(long)]
        logged_out: bool,
        /// Print ledger entries matching this text when the scan ends
        #[arg(long)]
        search: Option<String>,
    },
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
    /// Try text against the enabled rules, or against a single ad-hoc pattern.
    Test {
        text: String,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long, requires = "pattern")]
        regex: bool,
    },
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand, Debug)]
enum RulesAction {
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        pattern: String,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        disabled: bool,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    Enable {
        #[arg(long)]
        id: Uuid,
    },
    Disable {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    Show,
    /// Store a new template; an empty value restores the default
    Set { template: String },
    /// Render the stored template for a sample listing
    Render {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        world: String,
        description: String,
    },
}

struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn announce(&mut self, notice: Notice) {
        println!(
            "Reportable PF: {} ({}) [{}]",
            notice.name, notice.world, notice.matched_pattern
        );
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(default_root);
    let cfg = CoreConfig::load(&root).with_context(|| format!("load config under {}", root.display()))?;
    let state = load_state(&cfg.state.path)?;
    let mut screen = Screen::from_config(&cfg, state);
    tracing::info!(system = %cfg.system.name, root = %root.display(), "pfwatch ready");

    match cli.command {
        Command::Scan {
            input,
            export,
            logged_out,
            search,
        } => {
            run_scan(&mut screen, input.as_deref(), !logged_out)?;
            if let Some(query) = search {
                print_search(&screen, &query);
            }
            if export {
                let written = export_entries(
                    &cfg.logbook.path,
                    screen.ledger().entries(),
                    &Utc::now().to_rfc3339(),
                )?;
                println!("Exported {} entries to {}", written, cfg.logbook.path.display());
            }
        }
        Command::Rules { action } => run_rules(&mut screen, action)?,
        Command::Test {
            text,
            pattern,
            regex,
        } => {
            let single = pattern.map(|p| {
                if regex {
                    Rule::regex(p)
                } else {
                    Rule::literal(p)
                }
            });
            let (_, line) = screen.test_match(&text, single.as_ref());
            println!("{}", line);
        }
        Command::Template { action } => run_template(&mut screen, action),
    }

    // migration repairs are persisted even when nothing else changed
    save_state(&cfg.state.path, screen.store().state())?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_scan(screen: &mut Screen, input: Option<&Path>, session_active: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open listings {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut session = session_active;
    let mut sink = StdoutSink;
    let (mut seen, mut flagged) = (0usize, 0usize);

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("read listing line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(COMMAND_PREFIX) {
            handle_command(screen, &mut session, rest.trim());
            continue;
        }
        let listing: Listing = match serde_json::from_str(line) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = lineno + 1, "skipping malformed listing: {e}");
                continue;
            }
        };
        seen += 1;
        if screen.process(&listing, &session, &mut sink).is_some() {
            flagged += 1;
        }
    }

    tracing::info!(
        seen,
        flagged,
        stored = screen.ledger().len(),
        notified = screen.ledger().announcements_used(),
        "scan finished"
    );
    Ok(())
}

fn handle_command(screen: &mut Screen, session: &mut bool, args: &str) {
    let mut parts = args.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();

    match verb.as_str() {
        "" | "status" => println!("Reporting: {}", screen.clock().status_text()),
        "enable" | "on" => {
            screen.clock_mut().enable();
            println!("Reporting enabled.");
        }
        "disable" | "off" => match rest.to_lowercase().as_str() {
            "" | "restart" => {
                screen.clock_mut().disable_until_restart();
                println!("Reporting disabled until restart.");
            }
            "logout" => {
                screen.clock_mut().disable_until_session_end();
                println!("Reporting disabled until logout.");
            }
            other => match parse_disable_duration(other) {
                Some(d) => {
                    screen.clock_mut().disable_for(d);
                    println!("Reporting disabled for {}.", format_duration(d));
                }
                None => println!(
                    "Usage: {} disable [restart|logout|<duration>], e.g. 30m or 2 hours",
                    COMMAND_PREFIX
                ),
            },
        },
        "session" => match rest {
            "on" => *session = true,
            "off" => *session = false,
            _ => println!("Usage: {} session on|off", COMMAND_PREFIX),
        },
        "clear" => {
            screen.clear_ledger();
            println!("Filtered listings cleared.");
        }
        unknown => println!("Unknown command: {}", unknown),
    }
}

fn print_search(screen: &Screen, query: &str) {
    let hits: Vec<&FilteredListingEntry> = screen
        .ledger()
        .newest_first()
        .into_iter()
        .filter(|e| matches_search(e, query))
        .collect();
    if hits.is_empty() {
        println!("No filtered listings match \"{}\".", query);
        return;
    }
    for e in hits {
        println!(
            "{}  {} ({})  [{}]  {}",
            e.seen_at.format("%H:%M:%S"),
            e.name,
            e.world,
            e.matched_rule_pattern,
            e.description
        );
    }
}

fn run_rules(screen: &mut Screen, action: RulesAction) -> Result<()> {
    match action {
        RulesAction::List { json } => {
            let rules = screen.store().all_rules();
            if json {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                for r in rules {
                    println!(
                        "{}  {:<7}  {:<8}  {}",
                        r.id,
                        r.mode.as_str(),
                        if r.enabled { "enabled" } else { "disabled" },
                        r.pattern
                    );
                }
            }
        }
        RulesAction::Add {
            pattern,
            regex,
            disabled,
        } => {
            let mode = if regex { RuleMode::Regex } else { RuleMode::Literal };
            let mut rule = Rule::new(pattern, mode);
            rule.enabled = !disabled;
            match screen.upsert_rule(rule) {
                Some(id) => println!("Saved rule {}", id),
                None => println!("Rule not added (blank or duplicate)."),
            }
        }
        RulesAction::Delete { id } => report_found(screen.delete_rule(id), "Deleted", id),
        RulesAction::Enable { id } => report_found(screen.set_rule_enabled(id, true), "Enabled", id),
        RulesAction::Disable { id } => report_found(screen.set_rule_enabled(id, false), "Disabled", id),
    }
    Ok(())
}

fn report_found(found: bool, verb: &str, id: Uuid) {
    if found {
        println!("{} rule {}", verb, id);
    } else {
        println!("No rule with id {}", id);
    }
}

fn run_template(screen: &mut Screen, action: TemplateAction) {
    match action {
        TemplateAction::Show => println!("{}", screen.store().report_template()),
        TemplateAction::Set { template } => {
            screen.set_report_template(&template);
            println!("Report template saved.");
        }
        TemplateAction::Render {
            name,
            world,
            description,
        } => {
            let (matched, _) = screen.test_match(&description, None);
            let entry = FilteredListingEntry {
                listing_id: 0,
                name,
                world,
                description,
                matched_rule_id: matched.as_ref().map(|m| m.rule_id).unwrap_or_default(),
                matched_rule_pattern: matched.as_ref().map(|m| m.rule_pattern.clone()).unwrap_or_default(),
                matched_value: matched.map(|m| m.matched_value).unwrap_or_default(),
                seen_at: Utc::now(),
            };
            print!("{}", pfwatch_core::services::report::render(screen.store().report_template(), &entry));
        }
    }
}
