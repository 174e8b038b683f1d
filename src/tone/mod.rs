pub mod session;

pub use session::{ToneSession, ToneSnapshot};
