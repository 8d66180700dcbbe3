//! Pod certification orchestrator.
//!
//! Drives the fixed set of hardware self-tests on a remote locker pod over a
//! publish/subscribe gateway, tracks each test's status in a per-pod
//! session, and gates certification on every test passing.  Pure logic
//! lives in [`app`], [`catalog`], [`record`] and [`session`]; network and
//! timer code is confined to [`adapters`] behind the `http` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod session;
