use colored::*;
use std::process::ExitCode;

mod cli;

/// Exit status of any failure other than a quiet path miss.
const EXIT_ERROR: u8 = 127;

fn main() -> ExitCode {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    match cli::run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("{}: {}", "Error".bright_red(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
