pub mod fetch;
pub mod probe;
pub mod regions;

pub use fetch::fetch;
pub use probe::probe;
pub use regions::regions;
