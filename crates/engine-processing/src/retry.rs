use connectors::error::StoreError;
use engine_core::retry::RetryDisposition;

/// Only destination writes retry: they overwrite by key, so repeating
/// one is safe. I/O and transport faults are transient; a missing or
/// malformed key is not going to heal itself.
pub fn classify_store_error(err: &StoreError) -> RetryDisposition {
    match err {
        StoreError::Io(_) => RetryDisposition::Retry,
        StoreError::Http(err) if err.is_connect() || err.is_timeout() => RetryDisposition::Retry,
        StoreError::Http(_) => RetryDisposition::Stop,
        StoreError::NotFound(_) | StoreError::InvalidKey(_) => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_faults_retry_but_bad_keys_do_not() {
        let io = StoreError::Io(std::io::Error::other("disk full"));
        assert_eq!(classify_store_error(&io), RetryDisposition::Retry);

        let key = StoreError::InvalidKey("../x".into());
        assert_eq!(classify_store_error(&key), RetryDisposition::Stop);
    }
}
