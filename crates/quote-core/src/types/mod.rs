//! 핵심 타입 정의.

pub mod quote;
pub mod symbol;

pub use quote::*;
pub use symbol::*;
