pub mod sar_modules;
