pub mod enums;
pub mod prediction;
pub mod symptom;

pub use enums::*;
pub use prediction::*;
pub use symptom::*;
