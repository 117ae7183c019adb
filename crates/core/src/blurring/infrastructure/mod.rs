pub mod blurrer_factory;
mod convolution;
pub mod cpu_blurrer;
