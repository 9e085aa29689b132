//! # Route Modules
//!
//! | Prefix                    | Module            |
//! |---------------------------|-------------------|
//! | `/v1/alerts`, `/v1/events`| [`alerts`]        |
//! | `/v1/jurisdiction/*`, `/v1/trips/*`, `/v1/routes/*`, `/v1/stations` | [`jurisdiction`] |

pub mod alerts;
pub mod jurisdiction;
