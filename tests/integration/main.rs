//! Integration tests for Sumi-Distill
//!
//! These tests use wiremock to serve pages and robots.txt, and a scripted
//! in-process browser in place of Chromium, to exercise the full extraction
//! path end-to-end.

mod common;
mod config_tests;
mod dynamic_tests;
mod robots_tests;
