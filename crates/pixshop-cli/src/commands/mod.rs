pub mod generate;
pub mod session;
pub mod settings;
