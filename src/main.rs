use std::process::ExitCode;

use romidb::db::DbError;
use romidb::ui::output;

/// Exit status for a busy store (EX_TEMPFAIL): retrying may succeed.
const EXIT_BUSY: u8 = 75;

fn main() -> ExitCode {
    match romidb::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let busy = err
                .chain()
                .any(|cause| cause.downcast_ref::<DbError>().is_some_and(DbError::is_busy));
            if busy {
                output::error("store is busy: another writer holds the lock, try again");
                ExitCode::from(EXIT_BUSY)
            } else {
                output::error(format!("{:#}", err));
                ExitCode::FAILURE
            }
        }
    }
}
