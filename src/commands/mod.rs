pub mod doctor;
pub mod install;
