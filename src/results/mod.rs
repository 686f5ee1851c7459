//! Normalized place records and the vendor response shapes they are mapped from
//!
//! Every backend decodes its own wire format and funnels each item through a
//! pure `From` conversion into [`Address`].

mod address;
mod mapper;

pub use address::Address;
pub use mapper::*;
