pub mod fs;
pub mod restore_flag;
pub mod time;

pub use restore_flag::FileSilentRestoreFlagRepository;
pub use time::SystemClock;
