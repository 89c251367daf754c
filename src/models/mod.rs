pub mod course;
pub mod feedback;
pub mod identity;
pub mod profile;
pub mod text;

pub use course::*;
pub use feedback::*;
pub use identity::*;
pub use profile::*;
