//! Server Module
//!
//! This module contains the remote-control server of the qpremote daemon.
//!
//! - protocol: the `KEY:VALUE;...` command grammar
//! - command_registry: key to handler table and batch dispatch
//! - commands: the FILE, AXES, SHOW, REFR and UPDA handlers
//! - response_handler: reply fragments and the tagged reply
//! - connection: lifecycle of one accepted socket
//! - server: the loopback TCP listener and accept loop

pub mod command_registry;
pub mod commands;
pub mod connection;
pub mod protocol;
pub mod response_handler;
#[allow(clippy::module_inception)]
pub mod server;
