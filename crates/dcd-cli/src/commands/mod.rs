pub mod cat;
pub mod info;
