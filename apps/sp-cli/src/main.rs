mod error;
mod service;

use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use sp_sim::{ProgressUpdate, ProtocolPreset, SolutionTrace, solve_many};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(about = "Single particle model battery cycling simulator", long_about = None)]
struct Cli {
    /// Log solver wall-clock time
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run configuration file
    Validate {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
    },
    /// Run a cycling simulation
    Run {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
        /// Write the solution trace as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Run configurations in parallel
    Sweep {
        /// Configuration files, one job each
        #[arg(required = true)]
        config_paths: Vec<PathBuf>,
        /// Discharge currents [A]; one job per value and configuration
        #[arg(long, value_delimiter = ',')]
        discharge_currents: Vec<f64>,
        /// Directory for one CSV per job
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// List cached runs for a configuration
    Runs {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
    },
    /// List built-in cell and protocol presets
    Presets,
}

fn main() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    if cli.timing {
        sp_core::timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Run {
            config_path,
            output,
            no_cache,
        } => cmd_run(&config_path, output.as_deref(), !no_cache),
        Commands::Sweep {
            config_paths,
            discharge_currents,
            csv_dir,
        } => cmd_sweep(&config_paths, &discharge_currents, csv_dir.as_deref()),
        Commands::Runs { config_path } => cmd_runs(&config_path),
        Commands::Presets => cmd_presets(),
    }
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = sp_project::load_config(config_path)?;
    config.build()?;
    println!("✓ Config is valid: {}", config.name);
    Ok(())
}

fn cmd_run(config_path: &Path, output: Option<&Path>, use_cache: bool) -> CliResult<()> {
    let config = sp_project::load_config(config_path)?;
    println!("Running: {}", config.name);

    let mut last_emit = Instant::now();
    let mut last_step = None;
    let response = service::ensure_run(
        config_path,
        &config,
        use_cache,
        Some(&mut |update: ProgressUpdate| {
            let key = (update.cycle_no, update.step_index);
            if last_step != Some(key) || last_emit.elapsed().as_millis() >= 100 {
                render_progress(&update);
                last_step = Some(key);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!(
            "✓ Simulation completed in {:.3}s: {}",
            response.solve_time_s, response.run_id
        );
    }
    print_summary(&response.trace);

    if let Some(path) = output {
        sp_results::write_csv_file(&response.trace, path)?;
        println!("✓ Exported {} samples to {}", response.trace.len(), path.display());
    }
    Ok(())
}

fn cmd_sweep(
    config_paths: &[PathBuf],
    discharge_currents: &[f64],
    csv_dir: Option<&Path>,
) -> CliResult<()> {
    let mut jobs = Vec::new();
    for path in config_paths {
        let config = sp_project::load_config(path)?;
        jobs.extend(service::sweep_jobs(&config, discharge_currents)?);
    }
    let total = jobs.len();
    println!("Running {} jobs", total);

    if let Some(dir) = csv_dir {
        std::fs::create_dir_all(dir).map_err(|source| CliError::OutputWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let started = Instant::now();
    let outcomes = solve_many(jobs);
    println!("Sweep finished in {:.3}s", started.elapsed().as_secs_f64());

    let mut failed = 0;
    for (index, outcome) in outcomes.iter().enumerate() {
        match &outcome.result {
            Ok(trace) => {
                let caps: Vec<String> = trace
                    .discharge_capacities()
                    .iter()
                    .map(|c| format!("{:.4}", c))
                    .collect();
                println!(
                    "  ✓ {}  samples={}  discharge_cap=[{}] Ah",
                    outcome.label,
                    trace.len(),
                    caps.join(", ")
                );
                if let Some(dir) = csv_dir {
                    let path = dir.join(format!("job_{:03}.csv", index));
                    sp_results::write_csv_file(trace, &path)?;
                }
            }
            Err(e) => {
                failed += 1;
                println!("  ✗ {}  {}", outcome.label, e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::SweepFailed { failed, total });
    }
    Ok(())
}

fn cmd_runs(config_path: &Path) -> CliResult<()> {
    let config = sp_project::load_config(config_path)?;
    let store = sp_results::RunStore::for_config(config_path)?;
    let runs = store.list_runs(&config.name)?;

    if runs.is_empty() {
        println!("No cached runs found for: {}", config.name);
    } else {
        println!("Cached runs for '{}':", config.name);
        for manifest in runs {
            println!(
                "  {} ({}, {} samples, v{})",
                manifest.run_id, manifest.timestamp, manifest.summary.samples, manifest.solver_version
            );
        }
    }
    Ok(())
}

fn cmd_presets() -> CliResult<()> {
    println!("Cell presets:");
    for name in sp_cell::PRESET_NAMES {
        let preset = sp_cell::preset(name)?;
        println!(
            "  {:<12} {} ({:.3} Ah, {:.2}-{:.2} V)",
            name,
            preset.description,
            preset.params.capacity_ah,
            preset.params.v_min,
            preset.params.v_max
        );
    }

    println!("\nProtocol presets:");
    for preset in ProtocolPreset::ALL {
        let steps: Vec<&str> = preset.steps().into_iter().map(|s| s.name()).collect();
        println!("  {:<28} {}", preset.name(), steps.join(", "));
    }
    Ok(())
}

fn print_summary(trace: &SolutionTrace) {
    println!("  Samples: {}", trace.len());
    if let Some(last) = trace.last() {
        println!("  End time: {:.1} s", last.t);
        println!("  Final voltage: {:.4} V", last.voltage);
        println!("  Final temperature: {:.2} K", last.temp_k);
        if let Some(thickness) = last.sei_thickness {
            println!("  SEI thickness: {:.3e} m", thickness);
        }
    }
    for (cycle, cap) in trace.cycle_numbers().into_iter().zip(trace.discharge_capacities()) {
        println!("  Cycle {}: discharge capacity {:.4} Ah", cycle, cap);
    }
    if !trace.events().is_empty() {
        println!("  Events: {}", trace.events().len());
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(update: &ProgressUpdate) {
    let width = 28usize;
    let fraction = if update.num_cycles == 0 {
        0.0
    } else {
        update.cycle_no as f64 / update.num_cycles as f64
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] cycle {}/{}  step={}  t={:.1}s  samples={}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        update.cycle_no + 1,
        update.num_cycles,
        update.step.name(),
        update.time_elapsed,
        update.samples
    );
    let _ = io::stdout().flush();
}
