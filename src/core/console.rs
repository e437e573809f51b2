//! Operator-facing console messages
//!
//! Startup and per-cycle events are shown on stdout as well as logged, so
//! an operator watching the terminal sees them without `-d`.

pub fn success(message: &str) {
    log::info!("{}", message);
    println!("Success: {}", message);
}

pub fn warn(message: &str) {
    log::warn!("{}", message);
    println!("Warning: {}", message);
}

pub fn error(message: &str) {
    log::error!("{}", message);
    println!("Error: {}", message);
}

pub fn info(message: &str) {
    log::info!("{}", message);
    println!("{}", message);
}
