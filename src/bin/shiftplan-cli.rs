#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shiftplan::{
    io,
    render::{ScheduleRenderer, TextTable},
    scheduler::{self, GenerateResponse, Scheduler, SolveBudget},
    storage::{JsonStorage, Storage},
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération de plannings mensuels par contraintes
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`, niveau via RUST_LOG)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer des plannings depuis une requête JSON
    Generate {
        /// Requête JSON (`schedule`, `option`, `numSolutions`)
        #[arg(long)]
        input: String,
        /// Remplace la grille de la requête par un CSV `name,1,2,...`
        #[arg(long)]
        grid_csv: Option<String>,
        /// Nombre de plannings (défaut: `numSolutions` de la requête)
        #[arg(long)]
        count: Option<usize>,
        /// Budget global du mode multi-plannings (secondes)
        #[arg(long, default_value_t = 10.0)]
        budget_secs: f64,
        /// Plafond par appel au solveur (secondes)
        #[arg(long, default_value_t = 5.0)]
        per_call_secs: f64,
        /// Limite du mode planning unique (secondes)
        #[arg(long, default_value_t = 60.0)]
        single_secs: f64,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
        /// N'imprime pas les tableaux
        #[arg(long)]
        quiet: bool,
    },

    /// Vérifier un résultat sauvegardé contre sa requête
    Check {
        #[arg(long)]
        input: String,
        /// Réponse JSON produite par `generate --out-json`
        #[arg(long)]
        result: String,
    },

    /// Servir l'endpoint HTTP (feature `server`)
    #[cfg(feature = "server")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        #[arg(long, default_value_t = 10.0)]
        budget_secs: f64,
        #[arg(long, default_value_t = 5.0)]
        per_call_secs: f64,
        #[arg(long, default_value_t = 60.0)]
        single_secs: f64,
    },
}

fn secs(raw: f64, flag: &str) -> Result<Duration> {
    if !raw.is_finite() || raw <= 0.0 {
        bail!("--{flag} must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(raw))
}

fn budget(total: f64, per_call: f64, single: f64) -> Result<SolveBudget> {
    Ok(SolveBudget {
        total: secs(total, "budget-secs")?,
        per_call: secs(per_call, "per-call-secs")?,
        single: secs(single, "single-secs")?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Generate {
            input,
            grid_csv,
            count,
            budget_secs,
            per_call_secs,
            single_secs,
            out_json,
            out_csv,
            quiet,
        } => {
            let mut request = io::load_request(&input)?;
            if let Some(path) = grid_csv {
                request.schedule = io::import_grid_csv(path)?;
            }
            if count.is_some() {
                request.num_solutions = count;
            }
            let budget = budget(budget_secs, per_call_secs, single_secs)?;

            let response = scheduler::generate(&request, budget);
            if let Some(path) = out_json {
                JsonStorage::open(path)?.save(&response)?;
            }

            match &response {
                GenerateResponse::Success {
                    schedules,
                    count,
                    elapsed_time,
                } => {
                    if let Some(path) = out_csv {
                        io::export_schedules_csv(path, schedules)?;
                    }
                    if !quiet {
                        print!("{}", TextTable::default().render_all(schedules));
                    }
                    println!("Generated {count} schedule(s) in {elapsed_time:.2}s");
                    0
                }
                GenerateResponse::Error { message } => {
                    eprintln!("error: {message}");
                    1
                }
            }
        }
        Commands::Check { input, result } => {
            let request = io::load_request(&input)?;
            let scheduler = Scheduler::from_request(&request)?;
            let schedules = match JsonStorage::open(&result)?.load()? {
                GenerateResponse::Success { schedules, .. } => schedules,
                GenerateResponse::Error { message } => {
                    bail!("{result} holds an error response: {message}")
                }
            };

            let mut total = 0;
            for (index, solution) in schedules.iter().enumerate() {
                let violations = scheduler.detect_violations(solution);
                total += violations.len();
                for v in &violations {
                    eprintln!("schedule {}: {v}", index + 1);
                }
            }
            if total == 0 {
                println!("OK: {} schedule(s), no violations", schedules.len());
                0
            } else {
                eprintln!("Found {total} violation(s)");
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        #[cfg(feature = "server")]
        Commands::Serve {
            addr,
            budget_secs,
            per_call_secs,
            single_secs,
        } => {
            let budget = budget(budget_secs, per_call_secs, single_secs)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(shiftplan::server::serve(addr, budget))?;
            0
        }
    };

    std::process::exit(code);
}
