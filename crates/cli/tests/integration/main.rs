mod build_tests;
mod checksums_tests;
mod common;
