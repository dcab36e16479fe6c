pub mod appointment;
pub mod availability;
pub mod doctor;
pub mod enums;
pub mod medical_record;
pub mod page;
pub mod patient;

pub use appointment::*;
pub use availability::*;
pub use doctor::*;
pub use enums::*;
pub use medical_record::*;
pub use page::*;
pub use patient::*;
