use anyhow::Result;
use rec_cue::app::App;
use rec_cue::cli;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            // No engine exists yet, so no destructors are skipped.
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // Routes all log::info!() etc. to /tmp/rec_cue_debug.log.
    // When RUST_LOG is set, also mirrors to stderr.
    // CLI --log-level flag takes highest precedence, then RUST_LOG, then config (applied later).
    rec_cue::debug::init_log_bridge(runtime_options.log_level);

    log::info!("Starting rec-cue {}", rec_cue::VERSION);

    let result = App::new(runtime_options).and_then(App::run);

    match result {
        Ok(()) => Ok(()),
        Err(ref e) => {
            eprintln!("rec-cue: error: {e:#}");
            // Return the original error so main exits with code 1 (anyhow default)
            result
        }
    }
}
