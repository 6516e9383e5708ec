pub mod booking;
pub mod desk;
