pub mod assemble;
pub mod check;
pub mod refine;
pub mod segment;
pub mod session;
