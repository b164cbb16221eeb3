pub mod comment;
pub mod swagger_main;
pub mod task;
pub mod user;

#[cfg(test)]
pub mod test_util;
