pub mod hash;
pub mod lint;
pub mod new;
