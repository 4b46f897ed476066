pub mod binding;
pub mod object;
