use std::path::PathBuf;

use aubellhop_base::env_writer::write_env_files;
use aubellhop_base::errors::BellhopError;
use aubellhop_base::types::*;
use aubellhop_base::{Bathymetry, EnvConfig, Environment, SoundSpeed, SoundSpeedField};

use float_cmp::approx_eq;
use rstest::{fixture, rstest};
use serde_json::json;


#[fixture]
fn assets() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("assets");
    path
}

#[fixture]
fn env() -> Environment {
    Environment::default_env().expect("Default environment must be valid")
}

fn close(a: f64, b: f64) -> bool {
    approx_eq!(f64, a, b, epsilon = 1e-9, ulps = 4)
}

fn all_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| close(*x, *y))
}

#[rstest]
fn default_environment_is_finalised(env: Environment) {
    assert_eq!(env.dim(), 2);
    assert!(close(env.depth_max(), 25.0));
    assert_eq!(env.soundspeed(), &SoundSpeed::Profile(vec![[0.0, 1500.0], [25.0, 1500.0]]));
    assert_eq!(env.beam_angles(), (-90.0, 90.0));
    assert!(close(env.box_depth(), 25.25));
    assert!(close(env.box_range(), 1010.0));
    assert_eq!(env.bottom_boundary_condition(), BoundaryCondition::AcoustoElastic);
}

#[rstest]
#[case("frequency", "0")]
#[case("frequency", "-50.0")]
#[case("source_depth", "-1.0")]
#[case("source_depth", "30.0")]
#[case("receiver_depth", "[]")]
#[case("soundspeed", "[]")]
#[case("soundspeed_interp", "\"cubic\"")]
#[case("soundspeed_interp", "quadrilateral")]
#[case("beam_angle_min", "-200")]
#[case("volume_attenuation", "francois-garrison")]
#[case("depth", "[[0, 20], [500, 30]]")]
#[case("name", "\"Pekeris's waveguide\"")]
#[case("no_such_option", "1")]
fn invalid_options_are_configuration_errors(#[case] key: &str, #[case] value: &str) {
    let err = Environment::from_options(&[(key, value)]).unwrap_err();
    assert!(err.is_configuration_error(), "{} = {} gave {:?}", key, value, err);
}

#[rstest]
fn options_are_parsed_as_json_or_names() {
    let env = Environment::from_options(&[
        ("dimension", "3D"),
        ("frequency", "250"),
        ("receiver_bearing", "[0, 45, 90]"),
        ("beam_type", "gaussian-ray"),
    ]).expect("Valid options");

    assert_eq!(env.dimension(), Dimension::ThreeD);
    assert_eq!(env.dim(), 3);
    assert_eq!(env.config().receiver_bearing, vec![0.0, 45.0, 90.0]);
    assert_eq!(env.config().beam_type, BeamType::GaussianRay);
}

#[rstest]
fn deep_profile_is_trimmed_to_water_depth() {
    let env = Environment::from_json_str(r#"{ "soundspeed": [[0, 1500], [30, 1510]] }"#).unwrap();
    let profile = env.soundspeed_profile();

    assert_eq!(profile.len(), 2);
    assert!(close(profile[1][0], 25.0));
    assert!(close(profile[1][1], 1500.0 + 10.0 * 25.0 / 30.0));
}

#[rstest]
fn short_profile_is_rejected() {
    let err = Environment::from_json_str(r#"{ "soundspeed": [[0, 1500], [20, 1510]] }"#).unwrap_err();
    assert!(err.is_configuration_error());
}

#[rstest]
fn single_point_profile_spans_the_water_column() {
    let env = Environment::from_json_str(r#"{ "soundspeed": [[10, 1520]] }"#).unwrap();
    assert_eq!(env.soundspeed_profile(), vec![[0.0, 1520.0], [25.0, 1520.0]]);
}

#[rstest]
fn receivers_on_both_sides_get_full_space_fan() {
    let env = Environment::from_json_str(r#"{ "receiver_range": [-1000, 1000] }"#).unwrap();
    assert_eq!(env.beam_angles(), (-180.0, 180.0));
    assert!(close(env.box_range(), 2020.0));
}

#[rstest]
fn sound_speed_field_implies_quadrilateral() {
    let env = Environment::from_json_str(r#"{
        "soundspeed": { "ranges": [0, 500, 1000], "depths": [0, 25],
                        "speeds": [[1500, 1501, 1502], [1490, 1491, 1492]] }
    }"#).unwrap();
    assert_eq!(env.soundspeed_interp(), SoundSpeedInterp::Quadrilateral);
    assert_eq!(env.soundspeed_profile(), vec![[0.0, 1500.0], [25.0, 1490.0]]);
}

#[rstest]
fn functional_update_leaves_original_untouched(env: Environment) {
    let deeper = env.with(|c| {
        c.depth = Bathymetry::Flat(100.0);
        c.source_depth = vec![50.0];
    }).unwrap();

    assert!(close(deeper.depth_max(), 100.0));
    assert!(close(env.depth_max(), 25.0));
    assert_eq!(env.config().source_depth, vec![5.0]);

    let err = env.with(|c| c.source_depth = vec![50.0]).unwrap_err();
    assert!(err.is_configuration_error());
}

#[rstest]
fn option_overrides_keep_other_options(env: Environment) {
    let moved = env.with_options(&[("receiver_range", "[500, 1500]"), ("frequency", "3500")]).unwrap();

    assert_eq!(moved.config().receiver_range, vec![500.0, 1500.0]);
    assert!(close(moved.config().frequency, 3500.0));
    assert_eq!(moved.config().source_depth, env.config().source_depth);
    assert!(env.with_options(&[("receiver_ranges", "1000")]).unwrap_err().is_configuration_error());
}

#[rstest]
fn counts_below_the_listed_values_are_rejected(env: Environment) {
    let err = env.with(|c| {
        c.receiver_range = vec![1000.0, 2000.0, 3000.0];
        c.receiver_nrange = Some(2);
    }).unwrap_err();
    assert!(err.is_configuration_error());

    let filled = env.with(|c| {
        c.receiver_range = vec![1000.0, 3000.0];
        c.receiver_nrange = Some(3);
    }).expect("A count above the listed values fills the range");
    assert_eq!(filled.config().receiver_nrange, Some(3));
}

#[rstest]
fn unwrap_expands_array_options(env: Environment) {
    let env = env.with(|c| {
        c.source_depth = vec![5.0, 10.0];
        c.receiver_range = vec![500.0, 1000.0, 1500.0];
    }).unwrap();

    let envs = env.unwrap(&["source_depth", "receiver_range"]).unwrap();
    assert_eq!(envs.len(), 6);
    assert_eq!(envs[0].name(), "bellhop/rust default-source_depth5-receiver_range500");
    assert_eq!(envs[5].config().source_depth, vec![10.0]);
    assert_eq!(envs[5].config().receiver_range, vec![1500.0]);
}

#[rstest]
fn sweep_over_frequencies(env: Environment) {
    let envs = env.sweep(&[("frequency", vec![json!(1000.0), json!(2000.5)])]).unwrap();
    assert_eq!(envs.len(), 2);
    assert!(close(envs[1].config().frequency, 2000.5));
    assert_eq!(envs[1].name(), "bellhop/rust default-frequency2000.5");

    assert!(env.unwrap(&["not_an_option"]).unwrap_err().is_configuration_error());
}

#[rstest]
fn json_configuration_round_trips(env: Environment) {
    let json = env.to_json_string().unwrap();
    let back = Environment::from_json_str(&json).unwrap();
    assert_eq!(back, env);
}

#[rstest]
fn it_reads_env_file_with_bathymetry(assets: PathBuf) {
    let env = Environment::from_env_file(&assets.join("munk.env"), Dimension::TwoD).expect("Could not read munk.env");
    let cfg = env.config();

    assert_eq!(env.name(), "Munk profile");
    assert!(close(cfg.frequency, 50.0));
    assert_eq!(cfg.task, Some(Task::Arrivals));
    assert_eq!(cfg.mesh_npts, 51);

    let profile = env.soundspeed_profile();
    assert_eq!(profile.len(), 27);
    assert!(close(profile[26][0], 5000.0));
    assert!(close(profile[26][1], 1551.91));

    assert_eq!(cfg.receiver_ndepth, Some(501));
    assert!(all_close(&cfg.receiver_depth, &[0.0, 5000.0]));
    assert_eq!(cfg.receiver_nrange, Some(1001));
    assert!(all_close(&cfg.receiver_range, &[0.0, 100000.0]));
    assert_eq!(cfg.source_ndepth, None);

    match &cfg.depth {
        Bathymetry::Profile(points) => {
            assert_eq!(points.len(), 3);
            assert!(close(points[2][0], 101000.0));
        },
        other => panic!("expected a bathymetry profile, got {:?}", other),
    }
    assert!(close(cfg.bottom_density, 1800.0));
    assert_eq!(cfg.bottom_attenuation, Some(0.8));
    assert_eq!(env.beam_angles(), (-20.0, 20.0));
    assert_eq!(cfg.beam_num, 41);
    assert!(close(env.box_range(), 101000.0));
}

#[rstest]
fn transmission_loss_run_type_has_no_task(assets: PathBuf) {
    let env = Environment::from_env_file(&assets.join("tl_run.env"), Dimension::TwoD).unwrap();
    assert_eq!(env.config().task, None);
    assert_eq!(env.soundspeed_interp(), SoundSpeedInterp::Spline);
    assert_eq!(env.bottom_boundary_condition(), BoundaryCondition::Rigid);
}

fn rich_2d_config() -> EnvConfig {
    EnvConfig {
        name: "round trip".to_string(),
        frequency: 3500.0,
        soundspeed: SoundSpeed::Profile(vec![[0.0, 1540.0], [10.0, 1530.0], [20.0, 1532.0], [40.0, 1535.0]]),
        depth: Bathymetry::Profile(vec![[0.0, 40.0], [500.0, 35.0], [1500.0, 38.0]]),
        bottom_soundspeed: 1450.0,
        bottom_density: 1200.0,
        bottom_attenuation: Some(0.2),
        source_depth: vec![8.0],
        receiver_depth: vec![5.0, 15.0, 25.0],
        receiver_range: vec![250.0, 1250.0],
        source_directionality: Some(vec![[-90.0, -20.0], [0.0, 0.0], [90.0, -20.0]]),
        surface: Some(vec![[0.0, 0.0], [800.0, 1.0], [1600.0, 0.0]]),
        surface_interp: CurveInterp::Curvilinear,
        beam_type: BeamType::GaussianRay,
        beam_num: 200,
        beam_angle_min: Some(-80.0),
        beam_angle_max: Some(80.0),
        volume_attenuation: VolumeAttenuation::Thorp,
        ..EnvConfig::default()
    }
}

#[rstest]
fn env_file_round_trip_2d() {
    let original = Environment::new(rich_2d_config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("trip");

    let written = write_env_files(&original, Task::Rays, &base).unwrap();
    let names: Vec<String> = written.iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["trip.env", "trip.ati", "trip.bty", "trip.sbp"]);

    let back = Environment::from_env_file(&written[0], Dimension::TwoD).unwrap();
    let (a, b) = (original.config(), back.config());

    assert_eq!(b.task, Some(Task::Rays));
    assert_eq!(b.name, "round trip");
    assert!(close(b.frequency, 3500.0));
    assert!(close(back.depth_max(), original.depth_max()));
    assert_eq!(back.soundspeed_profile().len(), 4);
    for (p, q) in back.soundspeed_profile().iter().zip(original.soundspeed_profile()) {
        assert!(close(p[0], q[0]) && close(p[1], q[1]));
    }
    assert!(all_close(&b.source_depth, &a.source_depth));
    assert!(all_close(&b.receiver_depth, &a.receiver_depth));
    assert!(all_close(&b.receiver_range, &a.receiver_range));
    assert_eq!(b.source_directionality, a.source_directionality);
    assert_eq!(b.surface_interp, CurveInterp::Curvilinear);
    assert_eq!(b.volume_attenuation, VolumeAttenuation::Thorp);
    assert_eq!(b.beam_type, BeamType::GaussianRay);
    assert_eq!(b.beam_num, 200);
    assert!(close(b.bottom_density, 1200.0));
    assert_eq!(b.bottom_attenuation, Some(0.2));
    assert_eq!(back.beam_angles(), (-80.0, 80.0));
    assert!(close(back.box_range(), original.box_range()));

    match (&a.depth, &b.depth) {
        (Bathymetry::Profile(p), Bathymetry::Profile(q)) => {
            assert_eq!(p.len(), q.len());
            for (x, y) in p.iter().zip(q) {
                assert!(close(x[0], y[0]) && close(x[1], y[1]));
            }
        },
        other => panic!("bathymetry lost in round trip: {:?}", other),
    }
}

#[rstest]
fn env_file_round_trip_3d() {
    let original = Environment::from_options(&[
        ("dimension", "3D"),
        ("source_depth", "[10, 20]"),
        ("receiver_bearing", "[0, 30, 60]"),
        ("receiver_range", "[0, 2000]"),
        ("receiver_nrange", "41"),
        ("beam_bearing_num", "12"),
    ]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = write_env_files(&original, Task::Arrivals, &dir.path().join("three")).unwrap();
    assert_eq!(written.len(), 1);

    let back = Environment::from_env_file(&written[0], Dimension::ThreeD).unwrap();
    let cfg = back.config();
    assert_eq!(cfg.receiver_nrange, Some(41));
    assert!(all_close(&cfg.receiver_range, &[0.0, 2000.0]));
    assert!(all_close(&cfg.receiver_bearing, &[0.0, 30.0, 60.0]));
    assert!(all_close(&cfg.source_depth, &[10.0, 20.0]));
    assert_eq!(cfg.beam_bearing_num, 12);
    assert_eq!(back.beam_bearings(), original.beam_bearings());
    assert!(close(back.box_cross_range(), original.box_cross_range()));
}

#[rstest]
fn env_file_round_trip_quadrilateral() {
    let mut cfg = EnvConfig::default();
    cfg.soundspeed = SoundSpeed::Field(SoundSpeedField {
        ranges: vec![0.0, 600.0, 1200.0],
        depths: vec![0.0, 12.5, 25.0],
        speeds: vec![vec![1500.0, 1502.0, 1504.0], vec![1495.0, 1496.0, 1497.0], vec![1490.0, 1490.5, 1491.0]],
    });
    let original = Environment::new(cfg).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = write_env_files(&original, Task::Eigenrays, &dir.path().join("quad")).unwrap();
    assert!(written.iter().any(|p| p.extension().map_or(false, |e| e == "ssp")));

    let back = Environment::from_env_file(&written[0], Dimension::TwoD).unwrap();
    match back.soundspeed() {
        SoundSpeed::Field(field) => {
            assert!(all_close(&field.ranges, &[0.0, 600.0, 1200.0]));
            assert!(all_close(&field.speeds[2], &[1490.0, 1490.5, 1491.0]));
        },
        other => panic!("expected a sound speed field, got {:?}", other),
    }
}

#[rstest]
fn env_reader_reports_grammar_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.env");
    std::fs::write(&path, "'broken'\nfifty\n1\n").unwrap();

    match Environment::from_env_file(&path, Dimension::TwoD).unwrap_err() {
        BellhopError::OutputParseError { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[rstest]
#[case('~', true)]
#[case('*', true)]
#[case('_', false)]
#[case(' ', false)]
fn bathymetry_flag_variants(assets: PathBuf, #[case] flag: char, #[case] from_file: bool) {
    let dir = tempfile::tempdir().unwrap();
    let text = std::fs::read_to_string(assets.join("munk.env")).unwrap()
        .replace("'A*' 0.0", &format!("'A{}' 0.0", flag));
    std::fs::write(dir.path().join("munk.env"), text).unwrap();
    std::fs::copy(assets.join("munk.bty"), dir.path().join("munk.bty")).unwrap();

    let env = Environment::from_env_file(&dir.path().join("munk.env"), Dimension::TwoD).unwrap();
    assert_eq!(matches!(env.config().depth, Bathymetry::Profile(_)), from_file, "flag `{}`", flag);
}

#[rstest]
fn unknown_bathymetry_flag_is_rejected(assets: PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let text = std::fs::read_to_string(assets.join("munk.env")).unwrap().replace("'A*' 0.0", "'A?' 0.0");
    std::fs::write(dir.path().join("munk.env"), text).unwrap();

    match Environment::from_env_file(&dir.path().join("munk.env"), Dimension::TwoD).unwrap_err() {
        BellhopError::OutputParseError { line, .. } => assert_eq!(line, 33),
        other => panic!("expected a parse error, got {:?}", other),
    }
}
