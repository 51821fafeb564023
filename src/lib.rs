//! chatlayout
//!
//! Layout and sizing engine for chat-style message lists, plus a terminal
//! viewer that drives it.
//!
//! The library follows a Pure Core / Impure Shell split: `model` and
//! `view_state` are pure data and layout logic, while `view`, `source`,
//! `config` and `logging` deal with the terminal, files and the environment.

pub mod config;
pub mod logging;
pub mod model;
pub mod source;
pub mod view;
pub mod view_state;
