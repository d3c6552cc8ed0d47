pub mod device;
pub mod license;
