mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    BodyExtras, ExerciseUpdate, FoodUpdate, ServingArgs, ServingOverrides, cmd_body_delete,
    cmd_body_history, cmd_body_log, cmd_body_show, cmd_calendar, cmd_exercise_add,
    cmd_exercise_delete, cmd_exercise_update, cmd_export,
    cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_update, cmd_profile_custom,
    cmd_profile_cycle, cmd_profile_mode, cmd_profile_set, cmd_profile_show, cmd_summary,
    cmd_water_add, cmd_water_delete, cmd_water_show,
};
use crate::config::Config;
use nutritrack_core::period::BODY_TREND_LEN;
use nutritrack_core::service::Tracker;

#[derive(Parser)]
#[command(
    name = "nutritrack",
    version,
    about = "A local-first calorie and food-group tracker",
    long_about = "Track food, exercise, water and body measurements against a daily calorie \
                  target and six food-group serving goals derived from your profile."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or edit the profile and its targets
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Log and manage food entries
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log and manage exercise entries
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Log and review water intake
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
    /// Track body weight and measurements
    Body {
        #[command(subcommand)]
        command: BodyCommands,
    },
    /// Show daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a month calendar of budget results
    Calendar {
        /// Month to show (YYYY-MM, default: current month)
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export profile, logs and daily totals
    Export {
        /// Write the daily rows as CSV instead of the full JSON document
        #[arg(long)]
        csv: bool,
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Output status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile, metabolic metrics and active target
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a profile field (name, age, height, weight, body-fat, muscle-mass, waist,
    /// goal-weight, sex, activity, goal, strategy, water-goal)
    Set {
        /// Field name
        field: String,
        /// New value (`none` clears optional measurements)
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch between auto and custom targets
    Mode {
        /// auto or custom
        mode: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select today's carb-cycling day type
    Cycle {
        /// high-carb or low-carb
        day: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit one value of a custom target (custom mode only)
    Custom {
        /// calories or a food group (grains, proteins, vegetables, fruits, dairy, oils)
        field: String,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Cycle-day table to edit (default: the one the current strategy uses)
        #[arg(long)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Log a food entry
    Add {
        /// Food name
        name: String,
        /// Calories
        #[arg(long)]
        calories: f64,
        #[command(flatten)]
        servings: ServingArgs,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Dominant food group or free-form category
        #[arg(long)]
        category: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a food entry in place
    Update {
        /// Entry ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New calories
        #[arg(long)]
        calories: Option<f64>,
        #[command(flatten)]
        servings: ServingOverrides,
        /// New meal type
        #[arg(short, long)]
        meal: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food entry by ID
    Delete {
        /// Entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List food entries for a date
    List {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Log an exercise entry
    Add {
        /// Exercise name
        name: String,
        /// Calories burned
        #[arg(long)]
        calories: f64,
        /// Duration in minutes
        #[arg(long)]
        minutes: f64,
        /// Exercise type: cardio or strength
        #[arg(short = 't', long = "type", default_value = "cardio")]
        kind: String,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an exercise entry in place
    Update {
        /// Entry ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New calories burned
        #[arg(long)]
        calories: Option<f64>,
        /// New duration in minutes
        #[arg(long)]
        minutes: Option<f64>,
        /// New exercise type: cardio or strength
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an exercise entry by ID
    Delete {
        /// Entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WaterCommands {
    /// Log water intake
    Add {
        /// Amount in ml
        amount: f64,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a water entry by ID
    Delete {
        /// Entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show water entries and hydration for a date
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BodyCommands {
    /// Log weight and optional measurements (replaces the entry for that date)
    Log {
        /// Weight value (number)
        value: f64,
        /// Unit: kg or lbs (default: kg)
        #[arg(short, long, default_value = "kg")]
        unit: String,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Muscle mass in kg
        #[arg(long)]
        muscle_mass: Option<f64>,
        /// Waist circumference in cm
        #[arg(long)]
        waist: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the body entry for a date (default: today)
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent body entries, oldest first
    History {
        /// Number of entries to show
        #[arg(short, long, default_value_t = BODY_TREND_LEN)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a body entry by ID
    Delete {
        /// Entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(db = %config.db_path.display(), "opening database");
    let mut tracker = Tracker::open(&config.db_path)?;

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&tracker, json),
            ProfileCommands::Set { field, value, json } => {
                cmd_profile_set(&mut tracker, &field, &value, json)
            }
            ProfileCommands::Mode { mode, json } => cmd_profile_mode(&mut tracker, &mode, json),
            ProfileCommands::Cycle { day, json } => cmd_profile_cycle(&mut tracker, &day, json),
            ProfileCommands::Custom {
                field,
                value,
                day,
                json,
            } => cmd_profile_custom(&mut tracker, &field, value, day.as_deref(), json),
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                calories,
                servings,
                meal,
                category,
                notes,
                date,
                json,
            } => cmd_food_add(
                &mut tracker,
                &name,
                calories,
                servings,
                &meal,
                category,
                notes,
                date,
                json,
            ),
            FoodCommands::Update {
                id,
                name,
                calories,
                servings,
                meal,
                category,
                notes,
                json,
            } => {
                let update = FoodUpdate {
                    name,
                    calories,
                    meal,
                    category,
                    notes,
                    servings,
                };
                cmd_food_update(&mut tracker, &id, update, json)
            }
            FoodCommands::Delete { id, json } => cmd_food_delete(&mut tracker, &id, json),
            FoodCommands::List { date, json } => cmd_food_list(&tracker, date, json),
        },
        Commands::Exercise { command } => match command {
            ExerciseCommands::Add {
                name,
                calories,
                minutes,
                kind,
                notes,
                date,
                json,
            } => cmd_exercise_add(
                &mut tracker,
                &name,
                calories,
                minutes,
                &kind,
                notes,
                date,
                json,
            ),
            ExerciseCommands::Update {
                id,
                name,
                calories,
                minutes,
                kind,
                notes,
                json,
            } => {
                let update = ExerciseUpdate {
                    name,
                    calories_burned: calories,
                    duration_minutes: minutes,
                    kind,
                    notes,
                };
                cmd_exercise_update(&mut tracker, &id, update, json)
            }
            ExerciseCommands::Delete { id, json } => cmd_exercise_delete(&mut tracker, &id, json),
        },
        Commands::Water { command } => match command {
            WaterCommands::Add { amount, date, json } => {
                cmd_water_add(&mut tracker, amount, date, json)
            }
            WaterCommands::Delete { id, json } => cmd_water_delete(&mut tracker, &id, json),
            WaterCommands::Show { date, json } => cmd_water_show(&tracker, date, json),
        },
        Commands::Body { command } => match command {
            BodyCommands::Log {
                value,
                unit,
                body_fat,
                muscle_mass,
                waist,
                date,
                json,
            } => {
                let extras = BodyExtras {
                    body_fat_pct: body_fat,
                    muscle_mass_kg: muscle_mass,
                    waist_cm: waist,
                };
                cmd_body_log(&mut tracker, value, &unit, extras, date, json)
            }
            BodyCommands::Show { date, json } => cmd_body_show(&tracker, date, json),
            BodyCommands::History { limit, json } => cmd_body_history(&tracker, limit, json),
            BodyCommands::Delete { id, json } => cmd_body_delete(&mut tracker, &id, json),
        },
        Commands::Summary { date, json } => cmd_summary(&tracker, date, json),
        Commands::Calendar { month, json } => cmd_calendar(&tracker, month, json),
        Commands::Export { csv, output, json } => cmd_export(&mut tracker, csv, output, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let api_key = config.load_or_create_api_key()?;
                if api_key.created {
                    tracing::info!(path = %config.api_key_path().display(), "generated API key");
                    eprintln!("Generated new API key: {}", api_key.key);
                    eprintln!("Include in requests: Authorization: Bearer {}", api_key.key);
                }
                Some(api_key.key)
            };
            // Estimation needs a remote model; none ships with the CLI.
            server::start_server(tracker, None, port, &bind, api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_food_add_parses_serving_flags() {
        let cli = Cli::try_parse_from([
            "nutritrack",
            "food",
            "add",
            "Rice bowl",
            "--calories",
            "520",
            "--grains",
            "3",
            "--proteins",
            "1.5",
            "--meal",
            "lunch",
        ])
        .unwrap();
        let Commands::Food {
            command:
                FoodCommands::Add {
                    servings, meal, ..
                },
        } = cli.command
        else {
            panic!("expected food add");
        };
        assert!((servings.grains - 3.0).abs() < f64::EPSILON);
        assert!((servings.proteins - 1.5).abs() < f64::EPSILON);
        assert!(servings.oils.abs() < f64::EPSILON);
        assert_eq!(meal, "lunch");
    }

    #[test]
    fn test_custom_accepts_negative_value() {
        let cli = Cli::try_parse_from(["nutritrack", "profile", "custom", "calories", "-200"])
            .unwrap();
        let Commands::Profile {
            command: ProfileCommands::Custom { value, .. },
        } = cli.command
        else {
            panic!("expected profile custom");
        };
        assert!((value + 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exercise_update_parses_optional_fields() {
        let cli = Cli::try_parse_from([
            "nutritrack",
            "exercise",
            "update",
            "abc-123",
            "--minutes",
            "50",
            "--type",
            "strength",
        ])
        .unwrap();
        let Commands::Exercise {
            command:
                ExerciseCommands::Update {
                    id,
                    calories,
                    minutes,
                    kind,
                    ..
                },
        } = cli.command
        else {
            panic!("expected exercise update");
        };
        assert_eq!(id, "abc-123");
        assert_eq!(calories, None);
        assert_eq!(minutes, Some(50.0));
        assert_eq!(kind.as_deref(), Some("strength"));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["nutritrack", "summary", "today", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_body_history_default_limit() {
        let cli = Cli::try_parse_from(["nutritrack", "body", "history"]).unwrap();
        let Commands::Body {
            command: BodyCommands::History { limit, .. },
        } = cli.command
        else {
            panic!("expected body history");
        };
        assert_eq!(limit, BODY_TREND_LEN);
    }
}
