mod io_pump;
mod run;
mod session;

pub use io_pump::{LineStream, LineTap};
pub use run::{run_session, RunOutput, RunRequest, Termination};
pub use session::{ProcessSession, RunnerSession};
