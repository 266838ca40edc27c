use std::path::PathBuf;

use aubellhop_base::errors::BellhopError;
use aubellhop_base::readers::{read_arrivals, read_bty, read_rays};
use aubellhop_base::types::{CurveInterp, Dimension};

use float_cmp::approx_eq;
use rstest::{fixture, rstest};


#[fixture]
fn assets() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("assets");
    path
}

fn assert_parse_error(err: BellhopError, expected_line: usize) {
    match err {
        BellhopError::OutputParseError { line, .. } => assert_eq!(line, expected_line),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[rstest]
fn it_reads_2d_arrivals(assets: PathBuf) {
    let arr = read_arrivals(&assets.join("arrivals_2d.arr")).expect("Could not read arrivals");

    assert_eq!(arr.dimension, Dimension::TwoD);
    assert!(approx_eq!(f64, arr.frequency, 50.0, ulps = 2));
    assert_eq!(arr.source_depths, vec![25.0]);
    assert_eq!(arr.receiver_depths, vec![10.0, 50.0]);
    assert_eq!(arr.receiver_ranges, vec![1000.0, 2000.0]);
    assert_eq!(arr.len(), 6);

    let first = &arr.arrivals[0];
    assert!(approx_eq!(f64, first.amplitude.re, -1.2345e-3, epsilon = 1e-12));
    assert!(approx_eq!(f64, first.amplitude.im, 0.0, epsilon = 1e-12));
    assert!(approx_eq!(f64, first.time_of_arrival, 0.67068619, ulps = 2));
    assert!(approx_eq!(f64, first.angle_of_departure, -10.5, ulps = 2));
    assert_eq!(first.surface_bounces, 1);
    assert_eq!(first.bottom_bounces, 0);
    assert_eq!(first.bearing_of_departure, None);

    let second = &arr.arrivals[1];
    assert!(approx_eq!(f64, second.complex_time_of_arrival.im, 1.0e-5, ulps = 2));
    assert!(approx_eq!(f64, second.amplitude.norm(), 2.0e-4, epsilon = 1e-12));
    assert_eq!(second.arrival_number, 1);

    assert_eq!(arr.at_receiver(0, 1).count(), 1);
    assert_eq!(arr.at_receiver(1, 0).count(), 3);
    assert_eq!(arr.at_receiver(1, 1).count(), 0);

    let deep = arr.at_receiver(1, 0).last().unwrap();
    assert_eq!(deep.receiver_depth, 50.0);
    assert_eq!(deep.receiver_range, 1000.0);
    assert_eq!(deep.arrival_number, 2);
    assert_eq!(deep.surface_bounces, 2);
}

#[rstest]
fn it_reads_3d_arrivals(assets: PathBuf) {
    let arr = read_arrivals(&assets.join("arrivals_3d.arr")).expect("Could not read arrivals");

    assert_eq!(arr.dimension, Dimension::ThreeD);
    assert_eq!(arr.receiver_bearings, vec![0.0, 90.0]);
    assert_eq!(arr.len(), 1);

    let a = &arr.arrivals[0];
    assert_eq!(a.receiver_bearing_index, 0);
    assert_eq!(a.bearing_of_departure, Some(0.0));
    assert_eq!(a.bearing_of_arrival, Some(180.0));
    assert!(approx_eq!(f64, a.angle_of_arrival, 4.0, ulps = 2));
    assert_eq!(a.bottom_bounces, 1);
}

#[rstest]
fn it_rejects_truncated_arrivals(assets: PathBuf) {
    let err = read_arrivals(&assets.join("arrivals_truncated.arr")).unwrap_err();
    assert_parse_error(err, 13);
}

#[rstest]
fn it_rejects_arrival_counts_above_maximum(assets: PathBuf) {
    let err = read_arrivals(&assets.join("arrivals_too_many.arr")).unwrap_err();
    assert_parse_error(err, 7);
}

#[rstest]
fn it_reports_missing_files(assets: PathBuf) {
    let err = read_arrivals(&assets.join("does_not_exist.arr")).unwrap_err();
    assert_parse_error(err, 0);
}

#[rstest]
fn it_reads_2d_rays(assets: PathBuf) {
    let fan = read_rays(&assets.join("rays_2d.ray")).expect("Could not read rays");

    assert_eq!(fan.title, "Pekeris ray trace");
    assert_eq!(fan.dimension, Dimension::TwoD);
    assert_eq!(fan.source_counts, vec![1, 1, 1]);
    assert_eq!(fan.beam_counts, vec![11, 1]);
    assert!(approx_eq!(f64, fan.depth_bottom, 100.0, ulps = 2));
    assert_eq!(fan.rays.len(), 2);

    let first = &fan.rays[0];
    assert!(approx_eq!(f64, first.angle_of_departure, -10.0, ulps = 2));
    assert_eq!(first.bottom_bounces, 1);
    assert_eq!(first.points.len(), 3);
    assert_eq!(first.points[1], vec![500.0, 100.0]);
    assert_eq!(first.depths().collect::<Vec<_>>(), vec![25.0, 100.0, 25.0]);

    assert_eq!(fan.rays[1].surface_bounces, 1);
    assert_eq!(fan.rays[1].points.len(), 2);
}

#[rstest]
fn it_reads_3d_rays(assets: PathBuf) {
    let fan = read_rays(&assets.join("rays_3d.ray")).expect("Could not read rays");

    assert_eq!(fan.dimension, Dimension::ThreeD);
    let ranges: Vec<f64> = fan.rays[0].ranges().collect();
    assert!(approx_eq!(f64, ranges[1], 500.0, ulps = 2));
    assert_eq!(fan.rays[0].depths().last(), Some(31.0));
}

#[rstest]
fn it_rejects_truncated_rays(assets: PathBuf) {
    let err = read_rays(&assets.join("rays_truncated.ray")).unwrap_err();
    assert!(err.is_parse_error());
}

#[rstest]
fn it_rejects_non_numeric_ray_headers(assets: PathBuf) {
    let err = read_rays(&assets.join("rays_bad_header.ray")).unwrap_err();
    assert_parse_error(err, 4);
}

#[rstest]
fn it_rejects_more_rays_than_declared(assets: PathBuf) {
    let err = read_rays(&assets.join("rays_too_many.ray")).unwrap_err();
    assert_parse_error(err, 13);
}

#[rstest]
fn it_reads_bathymetry_in_metres(assets: PathBuf) {
    let bty = read_bty(&assets.join("munk.bty")).expect("Could not read bathymetry");

    assert_eq!(bty.interp, CurveInterp::Linear);
    assert_eq!(bty.points.len(), 3);
    assert!(approx_eq!(f64, bty.points[1][0], 50000.0, ulps = 2));
    assert!(approx_eq!(f64, bty.points[1][1], 4500.0, ulps = 2));
}
