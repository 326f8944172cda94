pub mod capacity;
pub mod ofo;
