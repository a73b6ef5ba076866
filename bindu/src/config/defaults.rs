//! Default value functions for serde deserialization.

pub fn database_path() -> String {
    "lidar_data.db".to_string()
}

pub fn busy_timeout_ms() -> u64 {
    5_000
}

pub fn altitude_rings() -> usize {
    32
}

pub fn encoder_angles() -> usize {
    512
}

pub fn num_objects() -> usize {
    5
}

pub fn max_distance() -> f64 {
    10.0
}

pub fn noise_stddev() -> f64 {
    0.1
}

pub fn scan_count() -> usize {
    3
}

pub fn fixture_dir() -> String {
    "synthetic_data".to_string()
}

pub fn analysis_output_dir() -> String {
    "analysis_output".to_string()
}

pub fn enabled() -> bool {
    true
}

pub fn builder_program() -> String {
    "./my_point_cloud_reader".to_string()
}

pub fn builder_args() -> Vec<String> {
    ["--xyz_csv", "{csv}", "--out", "{out}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn map_output() -> String {
    "test_output.bt".to_string()
}

pub fn work_dir() -> String {
    ".".to_string()
}

pub fn map_resolution() -> f64 {
    10.0
}

pub fn builder_timeout_secs() -> u64 {
    120
}

pub fn scan_limit() -> usize {
    3
}

pub fn log_level() -> String {
    "info".to_string()
}
