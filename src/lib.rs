pub mod aligner;
pub mod debug;
pub mod errors;
pub mod io;
