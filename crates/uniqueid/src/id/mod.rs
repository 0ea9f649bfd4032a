mod unique_id;

pub use unique_id::*;
