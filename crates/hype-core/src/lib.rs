pub mod display;
pub mod error;
pub mod sentiment;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::*;
pub use sentiment::*;
pub use traits::*;
pub use types::*;
