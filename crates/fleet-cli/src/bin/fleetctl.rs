use anyhow::{bail, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::{interval, MissedTickBehavior};

use fleet_cli::table;
use fleet_core::{
    build_trail, classify_fleet, correlate, AircraftRef, EngineRules, FleetFilter, GroundFilter,
    PlaybackSpeed, ReplayController, ReplayRangeRequest, ReplayRequest, ResolveOutcome,
    TickOutcome, TrackRequest,
};
use fleet_sdk::FleetClient;

#[derive(Parser, Debug)]
#[command(name = "fleetctl", author, version, about, long_about = None)]
struct Cli {
    /// Telemetry backend URL
    #[arg(long, default_value = "http://localhost:5000")]
    backend: String,

    /// Minutes after landing before an aircraft is available again
    #[arg(long, default_value_t = 90)]
    turnaround_minutes: i64,

    /// Minutes without data before an airborne aircraft is stale
    #[arg(long, default_value_t = 20)]
    stale_minutes: i64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fleet availability table
    Status {
        /// Case-insensitive match on tail number or ICAO24
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = GroundArg::All)]
        filter: GroundArg,
    },
    /// Flights correlated from recent events
    Flights {
        /// Show the backend flight board instead
        #[arg(long)]
        board: bool,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Play back stored telemetry in the terminal
    Replay {
        /// Range start (RFC 3339); defaults to two hours before the end
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Range end (RFC 3339); defaults to now
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Seconds between steps (clamped to 30..=3600)
        #[arg(long)]
        step: Option<u32>,

        /// Restrict the range to one aircraft
        #[arg(long)]
        aircraft: Option<String>,

        /// Replay one flight's track from this takeoff time (needs --aircraft)
        #[arg(long)]
        takeoff: Option<DateTime<Utc>>,

        /// Landing time closing the track replay
        #[arg(long)]
        landing: Option<DateTime<Utc>>,

        /// Playback speed multiplier: 1, 2 or 4
        #[arg(long, default_value_t = 1)]
        speed: u32,

        /// Print the trail length of this aircraft with every step
        #[arg(long)]
        follow: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroundArg {
    All,
    InAir,
    OnGround,
}

impl From<GroundArg> for GroundFilter {
    fn from(arg: GroundArg) -> Self {
        match arg {
            GroundArg::All => GroundFilter::All,
            GroundArg::InAir => GroundFilter::InAir,
            GroundArg::OnGround => GroundFilter::OnGround,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = FleetClient::with_timeout(cli.backend.clone(), std::time::Duration::from_secs(cli.timeout))?;
    let rules = EngineRules {
        turnaround_minutes: cli.turnaround_minutes,
        stale_after_minutes: cli.stale_minutes,
        ..EngineRules::default()
    };

    match cli.command {
        Command::Status { search, filter } => {
            let filter = FleetFilter {
                search,
                status: filter.into(),
            };
            show_status(&client, &rules, &filter).await
        }
        Command::Flights { board, limit } => show_flights(&client, &rules, board, limit).await,
        Command::Replay {
            start,
            end,
            step,
            aircraft,
            takeoff,
            landing,
            speed,
            follow,
        } => {
            let request = match takeoff {
                Some(takeoff_ts) => {
                    let Some(icao24) = aircraft else {
                        bail!("--takeoff needs --aircraft");
                    };
                    ReplayRequest::Track(TrackRequest {
                        aircraft: AircraftRef::new(String::new(), icao24),
                        takeoff_ts,
                        landing_ts: landing,
                    })
                }
                None => {
                    let end = end.unwrap_or_else(Utc::now);
                    let start = start.unwrap_or(end - ChronoDuration::hours(2));
                    ReplayRequest::Range(ReplayRangeRequest::new(start, end, step, aircraft)?)
                }
            };
            let speed = PlaybackSpeed::try_from(speed)?;
            play(&client, request, speed, follow.as_deref()).await
        }
    }
}

async fn show_status(client: &FleetClient, rules: &EngineRules, filter: &FleetFilter) -> Result<()> {
    let snapshot = client.fetch_snapshot().await?;
    let now = Utc::now();

    let positions: Vec<_> = snapshot
        .positions
        .iter()
        .filter(|position| filter.matches(position))
        .cloned()
        .collect();
    let rows = classify_fleet(&positions, &snapshot.events, now, rules);

    println!(
        "In air {}  On ground {}  Seen 15m {}  Events 1h {}  (data {}s old)",
        snapshot.kpis.in_air,
        snapshot.kpis.on_ground,
        snapshot.kpis.seen_last_15m,
        snapshot.kpis.events_last_hour,
        snapshot.data_freshness_seconds
    );
    if rows.is_empty() {
        println!("No aircraft match.");
        return Ok(());
    }
    println!("{}", table::status_header());
    for row in &rows {
        println!("{}", table::status_line(row, now));
    }
    Ok(())
}

async fn show_flights(client: &FleetClient, rules: &EngineRules, board: bool, limit: usize) -> Result<()> {
    let flights = if board {
        client.fetch_flight_board(limit).await?
    } else {
        let snapshot = client.fetch_snapshot().await?;
        let mut flights = correlate(&snapshot.events, rules).flights;
        flights.truncate(limit);
        flights
    };

    if flights.is_empty() {
        println!("No flights.");
        return Ok(());
    }
    println!("{}", table::flight_header());
    for entry in &flights {
        println!("{}", table::flight_line(entry));
    }
    Ok(())
}

async fn play(
    client: &FleetClient,
    request: ReplayRequest,
    speed: PlaybackSpeed,
    follow: Option<&str>,
) -> Result<()> {
    let mut controller = ReplayController::new();
    controller.set_speed(speed);

    println!("Loading replay...");
    let ticket = controller.request(request.clone());
    let result = client.fetch_replay(&request).await.map_err(|e| e.to_string());
    match controller.resolve(ticket, result) {
        ResolveOutcome::Loaded { steps } => println!("{} steps at {}x", steps, speed.multiplier()),
        ResolveOutcome::Failed(failure) => bail!("replay failed: {:?}", failure),
        ResolveOutcome::Discarded => bail!("replay request superseded"),
    }

    let print_step = |controller: &ReplayController| {
        let Some(step) = controller.current_step() else {
            return;
        };
        let mut line = table::step_line(step, controller.index(), controller.steps().len());
        if let Some(icao24) = follow {
            let trail = build_trail(controller.steps(), icao24, controller.index());
            line.push_str(&format!("  trail {}", trail.len()));
        }
        println!("{line}");
    };

    print_step(&controller);
    controller.play()?;

    let mut ticker = interval(speed.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match controller.tick() {
            TickOutcome::Advanced { .. } => print_step(&controller),
            TickOutcome::Finished { .. } => {
                print_step(&controller);
                break;
            }
            TickOutcome::Idle => break,
        }
    }

    println!("Replay finished.");
    Ok(())
}
