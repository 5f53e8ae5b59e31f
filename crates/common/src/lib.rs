//! Crate includes reusable utils shared by the valmon crates, such as
//! initializing the tracing framework.

pub mod logging;
