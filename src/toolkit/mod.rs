

pub mod concepts;
pub mod search;
