#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use aubellhop::compute::{compute_all_with, compute_from_file_with, compute_with};
use aubellhop::env_writer::write_env_files;
use aubellhop::errors::AubellhopError;
use aubellhop::models::ModelRegistry;
use aubellhop::simulator::{BellhopSimulator, Simulator, SimulatorOptions, TaskResult};
use aubellhop::types::{Dimension, Task};
use aubellhop::{Environment, SoundSpeed};

use float_cmp::approx_eq;
use once_cell::sync::Lazy;
use rstest::{fixture, rstest};


/// Stand-in executables honouring Bellhop's file contract
struct Stubs {
    ok: PathBuf,
    fail: PathBuf,
    slow: PathBuf,
    calls: PathBuf,
}

/// Created once per test binary so no script is being written while another test spawns
static STUBS: Lazy<Stubs> = Lazy::new(|| {
    let mut dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    dir.push("aubellhop-compute-stubs");
    fs::create_dir_all(&dir).expect("Could not create stub directory");

    let mut assets = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    assets.push("tests");
    assets.push("assets");

    let calls = dir.join("calls.log");
    fs::write(&calls, "").expect("Could not reset call log");

    let ok = dir.join("bellhop-ok.sh");
    write_script(&ok, &format!(
        "test -f \"$1.env\" || exit 3\n\
         echo \"$(head -n 1 \"$1.env\" | cut -d \"'\" -f 2) $1\" >> \"{calls}\"\n\
         cp \"$1.env\" \"$(dirname \"{calls}\")/$(head -n 1 \"$1.env\" | cut -d \"'\" -f 2).env\"\n\
         cp \"{arr}\" \"$1.arr\"\n\
         cp \"{ray}\" \"$1.ray\"\n\
         echo \"BELLHOP stand-in\" > \"$1.prt\"\n",
        calls = calls.display(),
        arr = assets.join("arrivals_2d.arr").display(),
        ray = assets.join("rays_2d.ray").display()));

    let fail = dir.join("bellhop-fail.sh");
    write_script(&fail,
        "printf 'BELLHOP\\n\\n *** FATAL ERROR ***\\n Generated by program or module READIN\\n Unknown boundary condition type\\n' > \"$1.prt\"\n\
         printf '\\377\\376 garbled\\n' >&2\n\
         echo \"boom on stderr\" >&2\n\
         exit 1\n");

    let slow = dir.join("bellhop-slow.sh");
    write_script(&slow, "exec sleep 10\n");

    Stubs { ok, fail, slow, calls }
});

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}", body)).expect("Could not write stub");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Could not make stub executable");
}

/// Base names of the runs of the environment called `name`
fn runs_of(name: &str) -> Vec<PathBuf> {
    fs::read_to_string(&STUBS.calls).unwrap_or_default()
        .lines()
        .filter_map(|l| l.split_once(' '))
        .filter(|(n, _)| *n == name)
        .map(|(_, base)| PathBuf::from(base))
        .collect()
}

fn registry(exe_2d: &Path) -> ModelRegistry {
    ModelRegistry::with_default_models(exe_2d.to_str().unwrap(), "/nonexistent/bellhop3d.exe")
}

fn named_env(name: &str) -> Environment {
    Environment::default_env().unwrap().with(|c| c.name = name.to_string()).unwrap()
}

#[fixture]
fn stubs() -> &'static Stubs {
    &STUBS
}

#[rstest]
fn it_selects_bellhop_and_cleans_up(stubs: &'static Stubs) {
    let env = named_env("e2e-select");
    let result = compute_with(&registry(&stubs.ok), &env, Task::Arrivals, None).expect("Compute failed");

    let arrivals = result.as_arrivals().expect("Expected arrivals");
    assert!(!arrivals.is_empty());
    assert!(approx_eq!(f64, arrivals.frequency, 50.0, ulps = 2));

    let runs = runs_of("e2e-select");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].file_name().unwrap(), "bellhop");
    let workdir = runs[0].parent().unwrap();
    assert!(!workdir.exists(), "temporary directory {:?} was not removed", workdir);
}

#[rstest]
fn it_writes_an_env_file_bellhop_can_read(stubs: &'static Stubs) {
    let env = named_env("e2e-roundtrip").with(|c| {
        c.soundspeed = SoundSpeed::Profile(vec![[0.0, 1540.0], [10.0, 1530.0], [25.0, 1532.0]]);
        c.receiver_range = vec![500.0, 1000.0];
    }).unwrap();
    compute_with(&registry(&stubs.ok), &env, Task::Arrivals, None).expect("Compute failed");

    let copy = stubs.calls.with_file_name("e2e-roundtrip.env");
    let back = Environment::from_env_file(&copy, Dimension::TwoD).expect("Could not read back env file");
    assert_eq!(back.config().receiver_range, vec![500.0, 1000.0]);
    assert_eq!(back.soundspeed_profile(), env.soundspeed_profile());
    assert_eq!(back.config().task, Some(Task::Arrivals));
}

#[rstest]
fn it_returns_rays_for_ray_tasks(stubs: &'static Stubs) {
    let env = named_env("e2e-rays");
    let result = compute_with(&registry(&stubs.ok), &env, Task::Rays, Some("bellhop")).expect("Compute failed");

    match result {
        TaskResult::Rays(fan) => assert_eq!(fan.rays.len(), 2),
        other => panic!("expected rays, got {:?}", other),
    }
}

#[rstest]
fn it_rejects_unknown_models_without_side_effects(stubs: &'static Stubs) {
    let env = named_env("e2e-unknown");
    let err = compute_with(&registry(&stubs.ok), &env, Task::Arrivals, Some("kraken")).unwrap_err();

    assert!(matches!(err, AubellhopError::UnknownModelError(ref m) if m == "kraken"));
    assert!(runs_of("e2e-unknown").is_empty());
}

#[rstest]
fn it_reports_missing_executables() {
    let reg = ModelRegistry::with_default_models("/nonexistent/bellhop.exe", "/nonexistent/bellhop3d.exe");
    let err = compute_with(&reg, &named_env("e2e-missing"), Task::Arrivals, None).unwrap_err();

    assert!(matches!(err, AubellhopError::ExecutableNotFoundError(ref exe) if exe == "/nonexistent/bellhop.exe"));
}

#[rstest]
fn it_refuses_3d_environments_for_2d_models(stubs: &'static Stubs) {
    let env = named_env("e2e-3d").with(|c| c.dimension = Dimension::ThreeD).unwrap();
    let err = compute_with(&registry(&stubs.ok), &env, Task::Arrivals, Some("bellhop")).unwrap_err();

    assert!(matches!(err, AubellhopError::UnsupportedTaskError { .. }));
    assert!(runs_of("e2e-3d").is_empty());
}

#[rstest]
fn it_attaches_fatal_lines_to_tool_errors(stubs: &'static Stubs) {
    let err = compute_with(&registry(&stubs.fail), &named_env("e2e-fail"), Task::Arrivals, None).unwrap_err();

    match err {
        AubellhopError::ExternalToolError { output, prt, .. } => {
            assert!(output.contains("boom on stderr"));
            assert!(output.contains('\u{FFFD}'), "undecodable output bytes were dropped: {:?}", output);
            let prt = prt.expect("Expected a PRT extract");
            assert!(prt.contains("[FATAL] Unknown boundary condition type"));
        },
        other => panic!("expected an external tool error, got {:?}", other),
    }
}

#[rstest]
fn it_terminates_runs_exceeding_the_timeout(stubs: &'static Stubs) {
    let options = SimulatorOptions {
        exe: stubs.slow.to_str().unwrap().to_string(),
        timeout_secs: Some(0.2),
        ..SimulatorOptions::default()
    };
    let sim = BellhopSimulator::new("bellhop", options);
    let err = sim.run(&named_env("e2e-slow"), Task::Arrivals).unwrap_err();

    assert!(matches!(err, AubellhopError::TimeoutError { .. }));
}

#[rstest]
fn it_keeps_files_in_an_explicit_work_base(stubs: &'static Stubs) {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("kept");
    let options = SimulatorOptions {
        exe: stubs.ok.to_str().unwrap().to_string(),
        work_base: Some(base.clone()),
        keep_files: true,
        ..SimulatorOptions::default()
    };
    let sim = BellhopSimulator::new("bellhop", options.clone());
    sim.run(&named_env("e2e-kept"), Task::Arrivals).expect("Compute failed");
    assert!(dir.path().join("kept.env").exists());
    assert!(dir.path().join("kept.arr").exists());

    let sim = BellhopSimulator::new("bellhop", SimulatorOptions { keep_files: false, ..options });
    sim.run(&named_env("e2e-kept"), Task::Arrivals).expect("Compute failed");
    assert!(!dir.path().join("kept.env").exists());
    assert!(!dir.path().join("kept.arr").exists());
}

#[rstest]
fn it_runs_env_files_in_place(stubs: &'static Stubs) {
    let dir = tempfile::tempdir().unwrap();
    let env = named_env("e2e-file");
    write_env_files(&env, Task::Arrivals, &dir.path().join("scenario")).unwrap();

    let env_file = dir.path().join("scenario.env");
    let result = compute_from_file_with(&registry(&stubs.ok), None, &env_file, Dimension::TwoD)
        .expect("Compute from file failed");

    assert!(result.as_arrivals().is_some());
    assert!(env_file.exists());
    assert!(!dir.path().join("scenario.arr").exists());
    assert_eq!(runs_of("e2e-file").len(), 1);
}

#[rstest]
fn it_computes_batches_and_records_failures(stubs: &'static Stubs) {
    let envs = vec![named_env("e2e-batch-a"), named_env("e2e-batch-b")];
    let records = compute_all_with(&registry(&stubs.ok), &envs, &[Task::Arrivals, Task::Eigenrays], &["bellhop", "kraken"]);

    assert_eq!(records.len(), 8);
    assert_eq!(records.iter().filter(|r| r.result.is_ok()).count(), 4);
    assert!(records.iter().filter(|r| r.model == "kraken").all(|r| r.result.is_err()));
    assert_eq!(runs_of("e2e-batch-a").len(), 2);
    assert_eq!(runs_of("e2e-batch-b").len(), 2);
}
