mod adapter;
mod map;
mod parallel;
mod serial;
mod task;
mod terminal;
pub mod validate;

pub use adapter::{make_async, AsyncFn};
pub use map::map;
pub use parallel::parallel;
pub use serial::serial;
pub use task::{step, task, Completion, Step, Task};
pub use terminal::{spawn_map, spawn_parallel, spawn_serial};
