pub mod assignment;
pub mod job_queue;
pub mod response_cache;

#[cfg(test)]
pub(crate) mod test_support;
