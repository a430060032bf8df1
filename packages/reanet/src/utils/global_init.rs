use log::LevelFilter;
use std::io::Write;

pub fn global_init() {
  // Repeated installation only fails when a hook is already in place; that is fine.
  color_eyre::config::HookBuilder::default()
    .panic_section("reanet encountered an unexpected error")
    .install()
    .ok();
}

pub fn setup_logger(filter_level: LevelFilter) {
  env_logger::Builder::new()
    .filter_level(filter_level)
    .format(|buf, record| writeln!(buf, "[{:<5}] {}", record.level(), record.args()))
    .try_init()
    .ok();
}
