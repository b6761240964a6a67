use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use time::macros::format_description;

use super::err::{Result, SchoolError};

/// Installs the terminal logger. Call once, before the first service call.
pub fn init_logger(level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("school_records")
        .build();

    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
        .map_err(|e| SchoolError::Config(format!("failed to install logger: {e}")))
}
