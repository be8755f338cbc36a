mod options;
mod result;
mod run;
mod transcript;

pub use options::RunOptions;
pub use result::RunResult;
pub use run::run;
pub use transcript::RunTranscript;
