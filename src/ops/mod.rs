pub mod composite;
pub mod filters;
pub mod mask;
pub mod resample;
