pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod executor;
pub mod generator;
pub mod logger;
pub mod output;
pub mod toolchain;
pub mod utility;

#[cfg(test)]
pub mod tests {
    lazy_static::lazy_static! {
        static ref ENV_LOCK_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    /// Serializes tests that touch process environment variables, since the
    /// default-toolchain election and host platform checks read them.
    pub struct EnvLock {
        _guard: std::sync::MutexGuard<'static, ()>,
    }

    impl EnvLock {
        pub fn new() -> Self {
            Self {
                _guard: ENV_LOCK_MUTEX.lock().unwrap_or_else(|e| e.into_inner()),
            }
        }
    }
}
