use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use domyn_core::validation::{
    parse_exercise_form, validate_custom_name, validate_day_selection, validate_email,
    validate_profile,
};
use domyn_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "domyn")]
#[command(about = "Weekly workout routine planner and log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Signed-in user id; enables syncing to the document store
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or update personal details
    Profile(ProfileArgs),

    /// Choose the weekdays to work out on
    Days {
        /// Day names, e.g. monday wed fri
        #[arg(required = true)]
        days: Vec<Weekday>,
    },

    /// Customize routine days
    #[command(subcommand)]
    Routine(RoutineCommand),

    /// Record what happened on a date
    #[command(subcommand)]
    Log(LogCommand),

    /// Show the status of each day this week
    Week {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Scheduled days before this date show as past instead of missed
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Push everything to the document store, or pull routines and logs
    Sync {
        /// Pull from the document store instead of pushing
        #[arg(long)]
        pull: bool,

        /// Email recorded with the profile
        #[arg(long)]
        email: Option<String>,
    },

    /// Append logged workouts to a CSV file
    Export {
        /// Output path (defaults to <data-dir>/logs.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Erase all local data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    weight: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// List routine days and their exercises
    Show {
        day: Option<Weekday>,
    },

    /// Set the workout name for a day
    Name {
        day: Weekday,
        name: String,
    },

    /// Add an exercise to a day
    Add {
        day: Weekday,
        #[arg(long)]
        name: String,
        #[arg(long)]
        weight: String,
        #[arg(long)]
        reps: String,
        #[arg(long)]
        sets: String,
        /// Rest between sets, in seconds
        #[arg(long)]
        rest: Option<String>,
    },

    /// Change fields of an existing exercise
    Edit {
        day: Weekday,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        reps: Option<u32>,
        #[arg(long)]
        sets: Option<u32>,
        #[arg(long)]
        rest: Option<u32>,
        /// Empty text clears the notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove an exercise from a day
    Remove {
        day: Weekday,
        id: String,
    },

    /// Unschedule a day, clearing its routine
    Unschedule {
        day: Weekday,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Mark a day's workout as completed
    Complete {
        /// Date of the workout (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// How long it took, in minutes
        #[arg(long, allow_negative_numbers = true)]
        minutes: Option<i64>,

        /// Perceived intensity, 1 to 10
        #[arg(long, allow_negative_numbers = true)]
        intensity: Option<i64>,
    },

    /// Skip a day's workout
    Skip {
        /// Date of the workout (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, default_value = "")]
        reason: String,
    },
}

type Remote = RemoteSync<DirDocumentStore, StaticIdentity>;

/// Everything a command needs
struct Session {
    data_dir: PathBuf,
    config: Config,
    store: UserStore<DirStore>,
    remote: Option<Remote>,
}

impl Session {
    fn open(data_dir: Option<PathBuf>, user: Option<String>) -> Result<Self> {
        let config = Config::load()?;
        let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());
        std::fs::create_dir_all(&data_dir)?;

        let store = UserStore::load(DirStore::new(data_dir.join("local")));

        let user = user.or_else(|| {
            config
                .remote
                .enabled
                .then(|| config.remote.user_id.clone())
                .flatten()
        });
        let remote = user.map(|uid| {
            let docs = DirDocumentStore::new(config.remote.documents_dir(&data_dir));
            RemoteSync::new(docs, StaticIdentity::signed_in(uid))
        });

        Ok(Self {
            data_dir,
            config,
            store,
            remote,
        })
    }

    fn remote_mut(&mut self) -> Result<&mut Remote> {
        self.remote.as_mut().ok_or(Error::NotAuthenticated)
    }
}

fn main() -> ExitCode {
    domyn_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut session = Session::open(cli.data_dir, cli.user)?;

    match cli.command {
        Commands::Profile(args) => cmd_profile(&mut session, args),
        Commands::Days { days } => cmd_days(&mut session, days),
        Commands::Routine(command) => cmd_routine(&mut session, command),
        Commands::Log(command) => cmd_log(&mut session, command),
        Commands::Week { date, since, json } => cmd_week(&session, date, since, json),
        Commands::Sync { pull, email } => cmd_sync(&mut session, pull, email),
        Commands::Export { output, from, to } => cmd_export(&session, output, from, to),
        Commands::Reset { yes } => cmd_reset(&mut session, yes),
    }
}

fn cmd_profile(session: &mut Session, args: ProfileArgs) -> Result<()> {
    let ProfileArgs {
        name,
        age,
        gender,
        weight,
        email,
    } = args;

    if let Some(email) = &email {
        validate_email(email)?;
    }

    let updating = name.is_some() || age.is_some() || gender.is_some() || weight.is_some();
    if !updating && email.is_some() {
        let profile = session.store.snapshot().profile.clone();
        let Some(remote) = session.remote.as_mut() else {
            return Err(Error::Validation(
                "An email is only stored with the synced profile. Pass --user.".into(),
            ));
        };
        remote.push_profile(&profile, email.as_deref())?;
        println!("✓ Email saved");
    }

    if updating {
        let current = &session.store.snapshot().profile;
        let profile = PersonalProfile {
            name: name.unwrap_or_else(|| current.name.clone()),
            age: age.unwrap_or_else(|| current.age.clone()),
            gender: gender.unwrap_or_else(|| current.gender.clone()),
            weight: weight.unwrap_or_else(|| current.weight.clone()),
        };
        validate_profile(&profile)?;
        session.store.set_profile(profile)?;

        let snapshot = session.store.snapshot().clone();
        if let Some(remote) = session.remote.as_mut() {
            remote.push_profile(&snapshot.profile, email.as_deref())?;
        }
        println!("✓ Profile saved");
    }

    let profile = &session.store.snapshot().profile;
    println!("Name:   {}", profile.name);
    println!("Age:    {}", profile.age);
    println!("Gender: {}", profile.gender);
    println!("Weight: {}", profile.weight);
    Ok(())
}

fn cmd_days(session: &mut Session, days: Vec<Weekday>) -> Result<()> {
    validate_day_selection(&days)?;

    for day in Weekday::ALL {
        let selected = days.contains(&day);
        if selected || session.store.get_workout(day).is_some() {
            session.store.add_workout(day, selected)?;
        }
    }
    session.store.set_selected_days(days)?;

    let snapshot = session.store.snapshot().clone();
    if let Some(remote) = session.remote.as_mut() {
        remote.push_schedule(&snapshot)?;
    }

    let names: Vec<&str> = snapshot.selected_days.iter().map(|d| d.name()).collect();
    println!("✓ Workout days: {}", names.join(", "));
    Ok(())
}

fn push_routine(session: &mut Session, day: Weekday) -> Result<()> {
    let Some(routine) = session.store.get_workout(day).cloned() else {
        return Ok(());
    };
    if let Some(remote) = session.remote.as_mut() {
        remote.push_routine(&routine)?;
    }
    Ok(())
}

fn cmd_routine(session: &mut Session, command: RoutineCommand) -> Result<()> {
    match command {
        RoutineCommand::Show { day } => {
            let snapshot = session.store.snapshot();
            let days: Vec<Weekday> = match day {
                Some(day) => vec![day],
                None => Weekday::ALL.to_vec(),
            };
            let mut shown = 0;
            for day in days {
                if let Some(routine) = snapshot.workouts.get(&day) {
                    display_routine(routine);
                    shown += 1;
                }
            }
            if shown == 0 {
                println!("No workout days set up. Run `domyn days` first.");
            }
            Ok(())
        }

        RoutineCommand::Name { day, name } => {
            let name = validate_custom_name(&name, session.config.validation.custom_name_max_len)?;
            session.store.set_custom_name(day, name)?;
            push_routine(session, day)?;
            println!("✓ Named {}", day);
            Ok(())
        }

        RoutineCommand::Add {
            day,
            name,
            weight,
            reps,
            sets,
            rest,
        } => {
            let draft = parse_exercise_form(&name, &weight, &reps, &sets, rest.as_deref())?;
            let id = session.store.add_exercise(day, draft)?;
            push_routine(session, day)?;
            println!("✓ Added {} to {}", id, day);
            Ok(())
        }

        RoutineCommand::Edit {
            day,
            id,
            name,
            weight,
            reps,
            sets,
            rest,
            notes,
        } => {
            let positive = weight.is_none_or(|w| w > 0.0)
                && reps.is_none_or(|r| r > 0)
                && sets.is_none_or(|s| s > 0);
            if !positive {
                return Err(Error::Validation(
                    "Weight, reps, and sets must be greater than zero.".into(),
                ));
            }
            let patch = ExercisePatch {
                name: name.map(|n| n.trim().to_string()),
                weight,
                reps,
                sets,
                rest_time: rest,
                notes: notes.map(|n| {
                    let n = n.trim().to_string();
                    (!n.is_empty()).then_some(n)
                }),
            };
            if patch.is_empty() {
                return Err(Error::Validation("Nothing to change.".into()));
            }
            if !session.store.update_exercise(day, &id, patch)? {
                return Err(Error::State(format!("No exercise {} on {}", id, day)));
            }
            push_routine(session, day)?;
            println!("✓ Updated {}", id);
            Ok(())
        }

        RoutineCommand::Remove { day, id } => {
            session.store.remove_exercise(day, &id)?;
            push_routine(session, day)?;
            println!("✓ Removed {}", id);
            Ok(())
        }

        RoutineCommand::Unschedule { day } => {
            session.store.set_scheduled(day, false)?;
            let snapshot = session.store.snapshot().clone();
            if let Some(remote) = session.remote.as_mut() {
                remote.push_schedule(&snapshot)?;
            }
            println!("✓ {} is now a rest day", day);
            Ok(())
        }
    }
}

fn display_routine(routine: &RoutineWorkout) {
    let core = routine.core();
    let flag = if routine.is_scheduled() {
        "scheduled"
    } else {
        "rest"
    };
    let name = if core.custom_name().is_empty() {
        "-"
    } else {
        core.custom_name()
    };

    println!("{} [{}] {} ({})", routine.day(), flag, name, routine.setup_hint());
    for exercise in core.exercises() {
        println!(
            "  {}  {}  {} x {} x {}  rest {}s",
            exercise.id,
            exercise.name,
            exercise.weight,
            exercise.reps,
            exercise.sets,
            exercise.rest_time
        );
    }
    if core.total_exercises() > 0 {
        println!("  ~{} min", core.estimated_duration());
    }
}

fn cmd_log(session: &mut Session, command: LogCommand) -> Result<()> {
    let date = match &command {
        LogCommand::Complete { date, .. } | LogCommand::Skip { date, .. } => {
            (*date).unwrap_or_else(today_local)
        }
    };

    match command {
        LogCommand::Complete {
            minutes, intensity, ..
        } => {
            let log = session.store.complete_day(date, minutes, intensity)?.clone();
            if let Some(remote) = session.remote.as_mut() {
                remote.push_log(&log)?;
            }
            println!("✓ Completed {} ({})", date, log.core().custom_name());
        }
        LogCommand::Skip { reason, .. } => {
            session.store.skip_day(date, reason)?;
            if let Some(log) = session.store.get_log(date).cloned() {
                if let Some(remote) = session.remote.as_mut() {
                    remote.push_log(&log)?;
                }
            }
            println!("✓ Skipped {}", date);
        }
    }
    Ok(())
}

fn cmd_week(
    session: &Session,
    date: Option<NaiveDate>,
    since: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let today = date.unwrap_or_else(today_local);

    let mut snapshot = session.store.snapshot().clone();
    if let Some(remote) = session.remote.as_ref() {
        let monday = week_start(today);
        let logs = remote.fetch_logs_between(monday, monday + chrono::Duration::days(6))?;
        let added = snapshot.merge_logs(logs);
        tracing::debug!("Merged {} remote logs into the week", added);
    }
    let week = week_overview(&snapshot, today, since);

    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }

    for day in &week {
        let marker = if day.is_today { ">" } else { " " };
        println!(
            "{} {} {:>2}  {}",
            marker, day.letter, day.day_of_month, day.status
        );
    }
    Ok(())
}

fn cmd_sync(session: &mut Session, pull: bool, email: Option<String>) -> Result<()> {
    if let Some(email) = &email {
        validate_email(email)?;
    }

    if pull {
        let (routines, logs) = {
            let remote = session.remote_mut()?;
            let routines = remote.fetch_routine()?;
            let logs = remote.fetch_logs_between(NaiveDate::MIN, NaiveDate::MAX)?;
            (routines, logs)
        };
        let routine_count = routines.len();
        let log_count = logs.len();

        if !routines.is_empty() {
            session.store.import_routines(routines)?;
        }
        for log in logs {
            session.store.record_log(log)?;
        }
        println!(
            "✓ Pulled {} routine days and {} logs",
            routine_count, log_count
        );
    } else {
        let snapshot = session.store.snapshot().clone();
        session.remote_mut()?.push_all(&snapshot, email.as_deref())?;
        println!("✓ Pushed profile, schedule and {} logs", snapshot.logs.len());
    }
    Ok(())
}

fn cmd_export(
    session: &Session,
    output: Option<PathBuf>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let csv_path = output.unwrap_or_else(|| session.data_dir.join("logs.csv"));
    let logs = session.store.logs_between(
        from.unwrap_or(NaiveDate::MIN),
        to.unwrap_or(NaiveDate::MAX),
    );

    let count = export_logs_csv(logs, &csv_path)?;
    println!("✓ Exported {} logs", count);
    println!("  CSV: {}", csv_path.display());
    Ok(())
}

fn cmd_reset(session: &mut Session, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Validation(
            "This erases all data and cannot be undone. Pass --yes to confirm.".into(),
        ));
    }

    session.store.reset_user()?;
    if let Some(remote) = session.remote.as_mut() {
        remote.delete_user_data()?;
    }
    println!("✓ All data erased");
    Ok(())
}
