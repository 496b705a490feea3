//! Trimble TSIP decoding for both protocol generations.
//!
//! `tsip` holds the decoder and query state machine; `shared` holds the host
//! side pieces the binary needs around it.
pub mod shared;
pub mod tsip;
