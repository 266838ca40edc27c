// Copyright 2021 Siemens AG
// SPDX-License-Identifier: MIT

mod logging;

use aubellhop::compute::{compute, compute_from_file};
use aubellhop::demo::{demo, demo_environment, write_demo_config};
use aubellhop::env_writer::write_env_files;
use aubellhop::plot::{CsvBackend, PlotBackend, PlotlyBackend};
use aubellhop::results::{Arrivals, RayFan};
use aubellhop::types::{Dimension, Task};
use aubellhop::{Environment, Models, Simulator, TaskResult};

use anyhow::{anyhow, Context, Result};
use log::info;
use structopt::StructOpt;

use std::fs::File;
use std::path::{Path, PathBuf};


#[derive(Debug, StructOpt)]
#[structopt(name = "aubellhop", about = "Runs Bellhop underwater acoustic propagation models")]
struct Opt {
    /// error, warn, info, debug or trace; defaults to RUST_LOG
    #[structopt(long)]
    log_level: Option<String>,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Compute arrivals or rays for an environment
    Run {
        /// JSON configuration or Bellhop `.env` file
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        /// arrivals, eigenrays or rays; defaults to the run type of a `.env` input
        #[structopt(long)]
        task: Option<Task>,
        /// Registered model name; chosen automatically when omitted
        #[structopt(long)]
        model: Option<String>,
        /// Dimension of a `.env` input: 2D, 2.5D or 3D
        #[structopt(long, default_value = "2D")]
        dimension: Dimension,
        /// Write the result table to this CSV file
        #[structopt(long, parse(from_os_str))]
        csv: Option<PathBuf>,
        /// Write an HTML plot next to this path (without extension)
        #[structopt(long, parse(from_os_str))]
        plot: Option<PathBuf>,
        /// Option overrides as key=value
        parameters: Vec<String>,
    },
    /// List registered models and whether their executables are found
    Models,
    /// Run the demo scenario
    Demo {
        /// Write the demo configuration as JSON instead of running it
        #[structopt(long, parse(from_os_str))]
        write_config: Option<PathBuf>,
    },
    /// Validate a configuration and optionally write the Bellhop input files
    Check {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        #[structopt(long, default_value = "2D")]
        dimension: Dimension,
        /// Base name for the generated `.env` and companion files
        #[structopt(long, parse(from_os_str))]
        write_env: Option<PathBuf>,
        /// Also plot the environment (HTML) next to this path
        #[structopt(long, parse(from_os_str))]
        plot: Option<PathBuf>,
        parameters: Vec<String>,
    },
}


fn main() -> Result<()> {
    let opt = Opt::from_args();
    logging::init_logging(opt.log_level.as_deref());

    match opt.cmd {
        Cmd::Run { input, task, model, dimension, csv, plot, parameters } => {
            let overrides = parse_cmd_parameters(&parameters)?;
            let result = if is_env_file(&input) && task.is_none() && overrides.is_empty() {
                compute_from_file(model.as_deref(), &input, dimension)?
            } else {
                let env = load_environment(&input, dimension, &overrides)?;
                let task = task.or(env.config().task).unwrap_or_default();
                compute(&env, task, model.as_deref())?
            };
            report(&result, csv.as_deref(), plot.as_deref())?;
        },
        Cmd::Models => {
            let available = Models::supported_for(None, None, None);
            for name in Models::supported() {
                let model = Models::new(&name, None)?;
                let state = if available.contains(&name) { "available" } else { "executable not found" };
                println!("{:<12} {}-D  {}", name, model.dim(), state);
            }
        },
        Cmd::Demo { write_config } => match write_config {
            Some(path) => {
                write_demo_config(&path)?;
                println!("Demo configuration written to {}", path.display());
            },
            None => {
                info!("Demo environment: {}", demo_environment()?.name());
                print_arrivals(&demo()?);
            },
        },
        Cmd::Check { input, dimension, write_env, plot, parameters } => {
            let overrides = parse_cmd_parameters(&parameters)?;
            let env = load_environment(&input, dimension, &overrides)?;
            println!("{}", env.to_json_string()?);
            if let Some(base) = write_env {
                let task = env.config().task.unwrap_or_default();
                for file in write_env_files(&env, task, &base)? {
                    println!("Wrote {}", file.display());
                }
            }
            if let Some(stem) = plot {
                let path = PlotlyBackend::new().plot_environment(&env, &stem)?;
                println!("Wrote {}", path.display());
            }
        },
    }

    Ok(())
}

fn is_env_file(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("env"))
}

fn load_environment(input: &Path, dimension: Dimension, overrides: &[(String, String)]) -> Result<Environment> {
    let env = if is_env_file(input) {
        Environment::from_env_file(input, dimension)
    } else {
        Environment::from_json_file(input)
    }.with_context(|| format!("Could not load environment from {}", input.display()))?;

    if overrides.is_empty() {
        Ok(env)
    } else {
        Ok(env.with_options(overrides)?)
    }
}

fn parse_cmd_parameters(params: &[String]) -> Result<Vec<(String, String)>> {
    params.iter()
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
            _ => Err(anyhow!("Invalid parameter format: {} (expected key=value)", kv)),
        })
        .collect()
}

fn report(result: &TaskResult, csv_path: Option<&Path>, plot: Option<&Path>) -> Result<()> {
    match result {
        TaskResult::Arrivals(arr) => {
            print_arrivals(arr);
            if let Some(path) = csv_path {
                write_arrivals_csv(arr, &mut csv::Writer::from_path(path)?)?;
            }
            if let Some(stem) = plot {
                let path = PlotlyBackend::new().plot_arrivals(arr, stem)?;
                println!("Wrote {}", path.display());
            }
        },
        TaskResult::Rays(fan) => {
            println!("{}: {} rays at {} Hz", fan.title, fan.rays.len(), fan.frequency);
            if let Some(path) = csv_path {
                write_rays_csv(fan, &mut csv::Writer::from_path(path)?)?;
            }
            if let Some(stem) = plot {
                let path = PlotlyBackend::new().plot_rays(fan, stem)?;
                println!("Wrote {}", path.display());
                let data = CsvBackend::new().plot_rays(fan, stem)?;
                println!("Wrote {}", data.display());
            }
        },
    }
    Ok(())
}

fn print_arrivals(arr: &Arrivals) {
    println!("{} arrivals at {} Hz", arr.len(), arr.frequency);
    for a in &arr.arrivals {
        println!("  sd {:>8.2} m  rd {:>8.2} m  rr {:>10.2} m  t {:.6} s  |A| {:.4e}  bounces {}/{}",
            a.source_depth, a.receiver_depth, a.receiver_range, a.time_of_arrival,
            a.amplitude.norm(), a.surface_bounces, a.bottom_bounces);
    }
}

fn write_arrivals_csv(arr: &Arrivals, wtr: &mut csv::Writer<File>) -> Result<()> {
    wtr.write_record(&["source_depth", "receiver_depth", "receiver_range", "arrival_number",
        "amplitude_re", "amplitude_im", "time_of_arrival", "angle_of_departure", "angle_of_arrival",
        "surface_bounces", "bottom_bounces"])?;
    for a in &arr.arrivals {
        wtr.write_record(&[
            a.source_depth.to_string(),
            a.receiver_depth.to_string(),
            a.receiver_range.to_string(),
            a.arrival_number.to_string(),
            a.amplitude.re.to_string(),
            a.amplitude.im.to_string(),
            a.time_of_arrival.to_string(),
            a.angle_of_departure.to_string(),
            a.angle_of_arrival.to_string(),
            a.surface_bounces.to_string(),
            a.bottom_bounces.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_rays_csv(fan: &RayFan, wtr: &mut csv::Writer<File>) -> Result<()> {
    wtr.write_record(&["ray", "angle_of_departure", "surface_bounces", "bottom_bounces", "range", "depth"])?;
    for (i, ray) in fan.rays.iter().enumerate() {
        for (r, z) in ray.ranges().zip(ray.depths()) {
            wtr.write_record(&[
                i.to_string(),
                ray.angle_of_departure.to_string(),
                ray.surface_bounces.to_string(),
                ray.bottom_bounces.to_string(),
                r.to_string(),
                z.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
