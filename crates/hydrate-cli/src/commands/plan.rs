use chrono::{Local, NaiveDate};
use clap::Args;
use hydrate_core::{compute_schedule, AppConfig, HydrationConfig, TimeOfDay};

#[derive(Args)]
pub struct PlanArgs {
    /// Day to plan (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Time sleep starts, e.g. "10:00 PM" or "22:00"
    #[arg(long)]
    sleep_start: Option<TimeOfDay>,
    /// Time sleep ends, e.g. "06:00 AM" or "06:00"
    #[arg(long)]
    sleep_end: Option<TimeOfDay>,
    /// Daily goal in milliliters
    #[arg(long)]
    goal: Option<u32>,
    /// Minutes between reminders
    #[arg(long)]
    interval: Option<u32>,
}

/// Print the schedule as JSON. Flags override the config file.
pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = AppConfig::load_or_default().hydration;
    if let Some(v) = args.sleep_start {
        settings.sleep_start = v;
    }
    if let Some(v) = args.sleep_end {
        settings.sleep_end = v;
    }
    if let Some(v) = args.goal {
        settings.daily_goal_ml = v;
    }
    if let Some(v) = args.interval {
        settings.interval_min = v;
    }

    let config = HydrationConfig::new(
        settings.sleep_start,
        settings.sleep_end,
        settings.daily_goal_ml,
        settings.interval_min,
    )?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let schedule = compute_schedule(&config, date)?;
    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}
