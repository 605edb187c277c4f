pub mod checkers;
pub mod scan;

use swarmsight_core::{TOOL_NAME, VERSION};

pub fn version() {
    println!(
        "{} {} ({}/{})",
        TOOL_NAME,
        VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
