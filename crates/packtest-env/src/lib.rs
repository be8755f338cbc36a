mod fixtures;
mod layout;
mod provision;

pub use fixtures::FixtureData;
pub use layout::EnvLayout;
pub use provision::Environment;
