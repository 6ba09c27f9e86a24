pub mod all;
pub mod dbcheck;
pub mod demography;
pub mod filters;
pub mod health;
pub mod kpi;
pub mod overview;
pub mod traffic;
