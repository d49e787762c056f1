use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, ValueEnum};
use hydrate_core::{
    AppConfig, LogNotifier, Notification, Notifier, Permission, ReminderEngine, TimeOfDay,
    TokioTimerHost,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Args)]
pub struct RunArgs {
    /// Seconds between clock ticks (overrides runtime.tick_secs)
    #[arg(long)]
    tick_secs: Option<u64>,
    /// Where reminders are delivered
    #[arg(long, value_enum, default_value_t = Sink::Stdout)]
    notifier: Sink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Sink {
    /// Print reminders on stdout
    Stdout,
    /// Emit reminders as log records on stderr
    Log,
}

/// Prints reminders to stdout.
///
/// Permission is `notifications.enabled` from the config file; `notify on`
/// cannot override a config that turns notifications off.
struct TerminalNotifier {
    permission: Permission,
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission
    }

    fn notify(&mut self, notification: &Notification) {
        println!("[{}] {}", notification.title, notification.body);
    }
}

/// One line of session input.
#[derive(Debug, Clone, PartialEq)]
enum SessionCommand {
    Show,
    /// 1-based glass number, as printed in reminders.
    Toggle(usize),
    Select(NaiveDate),
    Today,
    Notify(bool),
    Set(Setting),
    Snapshot,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
enum Setting {
    SleepStart(TimeOfDay),
    SleepEnd(TimeOfDay),
    Goal(u32),
    Interval(u32),
}

const HELP: &str = "commands: show | toggle N | select YYYY-MM-DD | today | \
notify on|off | set sleep-start|sleep-end|goal|interval VALUE | snapshot | quit";

fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(SessionCommand::Show);
    };
    let rest: Vec<&str> = words.collect();

    match (head, rest.as_slice()) {
        ("show", []) => Ok(SessionCommand::Show),
        ("toggle", [n]) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(SessionCommand::Toggle(n)),
            _ => Err(format!("not a glass number: {n}")),
        },
        ("select", [date]) => date
            .parse::<NaiveDate>()
            .map(SessionCommand::Select)
            .map_err(|e| format!("bad date '{date}': {e}")),
        ("today", []) => Ok(SessionCommand::Today),
        ("notify", ["on"]) => Ok(SessionCommand::Notify(true)),
        ("notify", ["off"]) => Ok(SessionCommand::Notify(false)),
        ("set", [field, value @ ..]) if !value.is_empty() => {
            parse_setting(field, &value.join(" ")).map(SessionCommand::Set)
        }
        ("snapshot", []) => Ok(SessionCommand::Snapshot),
        ("help", []) => Ok(SessionCommand::Help),
        ("quit" | "exit", []) => Ok(SessionCommand::Quit),
        _ => Err(format!("unrecognized command: {}", line.trim())),
    }
}

fn parse_setting(field: &str, value: &str) -> Result<Setting, String> {
    let number = |v: &str| v.parse::<u32>().map_err(|e| format!("bad number '{v}': {e}"));
    match field {
        "sleep-start" => TimeOfDay::parse(value)
            .map(Setting::SleepStart)
            .map_err(|e| e.to_string()),
        "sleep-end" => TimeOfDay::parse(value)
            .map(Setting::SleepEnd)
            .map_err(|e| e.to_string()),
        "goal" => number(value).map(Setting::Goal),
        "interval" => number(value).map(Setting::Interval),
        other => Err(format!("unknown setting: {other}")),
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = AppConfig::load()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(app, args));
    // The stdin reader blocks on a worker thread until the next line.
    runtime.shutdown_background();
    result
}

async fn session(app: AppConfig, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let permission = if app.notifications.enabled {
        Permission::Granted
    } else {
        Permission::Denied
    };
    let notifier: Box<dyn Notifier> = match args.notifier {
        Sink::Stdout => Box::new(TerminalNotifier { permission }),
        Sink::Log => Box::new(LogNotifier::new(permission)),
    };
    let (host, mut fires) = TokioTimerHost::new();
    let mut engine = ReminderEngine::new(
        app.hydration_config()?,
        Box::new(host),
        notifier,
        local_now(),
    )?
    .with_title(app.notifications.title.clone());

    let tick_secs = args.tick_secs.unwrap_or(app.runtime.tick_secs).max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(tick_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!(tick_secs, "Session started");
    print_json(&engine.day_view())?;
    emit_events(&mut engine)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick(local_now());
            }
            Some(fire) = fires.recv() => {
                engine.tick(local_now());
                engine.handle_fire(fire);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                engine.tick(local_now());
                match parse_command(&line) {
                    Ok(SessionCommand::Quit) => break,
                    Ok(command) => execute(&mut engine, command)?,
                    Err(message) => eprintln!("error: {message}"),
                }
            }
        }
        emit_events(&mut engine)?;
    }

    info!("Session ended");
    Ok(())
}

/// Run one command. Engine errors are reported and the session goes on.
fn execute(
    engine: &mut ReminderEngine,
    command: SessionCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = match command {
        SessionCommand::Show => return print_json(&engine.day_view()),
        SessionCommand::Snapshot => return print_json(&engine.snapshot()),
        SessionCommand::Help => {
            println!("{HELP}");
            return Ok(());
        }
        SessionCommand::Quit => return Ok(()),
        // The progress message goes out through the notifier.
        SessionCommand::Toggle(glass) => engine.toggle_event(glass - 1).map(|_| ()),
        SessionCommand::Select(date) => engine.select_date(date),
        SessionCommand::Today => {
            let today = engine.now().date();
            engine.select_date(today)
        }
        SessionCommand::Notify(enabled) => engine.set_notifications_enabled(enabled),
        SessionCommand::Set(setting) => {
            let current = *engine.config();
            let updated = match setting {
                Setting::SleepStart(v) => current.with_sleep_start(v),
                Setting::SleepEnd(v) => current.with_sleep_end(v),
                Setting::Goal(v) => current.with_daily_goal_ml(v),
                Setting::Interval(v) => current.with_interval_min(v),
            };
            updated.and_then(|config| engine.set_config(config))
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_silent() => {
            debug!(error = %e, "Ignored command");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(())
        }
    }
}

fn emit_events(engine: &mut ReminderEngine) -> Result<(), Box<dyn std::error::Error>> {
    for event in engine.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
