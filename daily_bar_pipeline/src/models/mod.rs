pub mod asset;
pub mod bar;
pub mod basket;
pub mod batch;
pub mod request_params;
pub mod series;
pub mod window;
