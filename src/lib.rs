//! arxiv-relay - Reformats daily arXiv digest emails into highlighted HTML
//!
//! This crate fetches the plain-text daily listing mailings arXiv sends,
//! highlights configured authors and title keywords, drops listings matching
//! skip-words, and relays the result as an HTML email to per-category
//! recipient lists.

pub mod config;
pub mod digest;
pub mod domain;
pub mod providers;
pub mod services;
