pub mod build_tasks;
pub mod compiler;
pub mod cross;
pub mod errmsg;
pub mod input;
pub mod reflection;
pub mod slang;
pub mod util;

#[cfg(test)]
mod testing;

pub use cross::{CrossResult, CrossSource};
