//! Wire-request validation (`SPEC_FULL.md` §2, component D): argument-shape
//! checks every public `Database` method runs before touching storage —
//! strides/batch sizes, blob/collection-name/path lengths, and txn-option
//! combinations.

use ukv_core::{Error, Limits, Options};

/// Reject batches larger than `limits.max_batch_tasks`
/// (`SPEC_FULL.md` §4.1 "Full scans (absent limit) are rejected" and the
/// general batch-shape contract in §6).
pub fn validate_batch_len(limits: &Limits, len: usize) -> Result<(), Error> {
    if len > limits.max_batch_tasks {
        return Err(Error::OutOfRange(format!(
            "batch of {len} tasks exceeds the configured limit of {}",
            limits.max_batch_tasks
        )));
    }
    Ok(())
}

/// Reject a blob larger than `limits.max_blob_bytes`.
pub fn validate_blob_len(limits: &Limits, len: usize) -> Result<(), Error> {
    if len > limits.max_blob_bytes {
        return Err(Error::OutOfRange(format!(
            "blob of {len} bytes exceeds the configured limit of {}",
            limits.max_blob_bytes
        )));
    }
    Ok(())
}

/// Validate a collection name against both syntactic rules
/// ([`ukv_core::validate_collection_name`]) and the configured length
/// limit.
pub fn validate_collection_name(limits: &Limits, name: &str) -> Result<(), Error> {
    if name.len() > limits.max_collection_name_bytes {
        return Err(Error::ArgumentWrong(format!(
            "collection name of {} bytes exceeds the configured limit of {}",
            name.len(),
            limits.max_collection_name_bytes
        )));
    }
    ukv_core::validate_collection_name(name).map_err(|e| Error::ArgumentWrong(e.to_string()))
}

/// Validate a paths-modality path string's length.
pub fn validate_path_len(limits: &Limits, path: &str) -> Result<(), Error> {
    if path.len() > limits.max_path_bytes {
        return Err(Error::ArgumentWrong(format!(
            "path of {} bytes exceeds the configured limit of {}",
            path.len(),
            limits.max_path_bytes
        )));
    }
    Ok(())
}

/// Reject a scan/sample call made with no limit at all — full
/// unbounded scans are explicitly rejected (`SPEC_FULL.md` §4.1).
pub fn validate_scan_limit(limit: Option<usize>) -> Result<usize, Error> {
    limit.filter(|&l| l > 0).ok_or_else(|| Error::ArgsCombo("scan/sample calls require a positive limit".into()))
}

/// Reject any option bits this crate family doesn't recognize
/// (`SPEC_FULL.md` §7 "unknown option bit" as an `ArgumentWrong` case).
pub fn validate_known_options(options: Options) -> Result<(), Error> {
    if !Options::ALL.contains(options) {
        return Err(Error::ArgumentWrong(format!("unknown option bits: {:#010b}", options.bits())));
    }
    Ok(())
}

/// Reject a `dont_watch` option requested outside of an active transaction
/// — the flag only has meaning relative to a watch set
/// (`SPEC_FULL.md` §4.2).
pub fn validate_dont_watch_has_transaction(options: Options, in_transaction: bool) -> Result<(), Error> {
    if options.contains(Options::TRANSACTION_DONT_WATCH) && !in_transaction {
        return Err(Error::ArgsCombo("TRANSACTION_DONT_WATCH requires an active transaction".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_len_over_limit_is_rejected() {
        let limits = Limits { max_batch_tasks: 2, ..Limits::default() };
        assert!(validate_batch_len(&limits, 3).is_err());
        assert!(validate_batch_len(&limits, 2).is_ok());
    }

    #[test]
    fn collection_name_over_configured_length_is_rejected() {
        let limits = Limits { max_collection_name_bytes: 4, ..Limits::default() };
        assert!(validate_collection_name(&limits, "toolong").is_err());
        assert!(validate_collection_name(&limits, "ok").is_ok());
    }

    #[test]
    fn empty_collection_name_is_rejected() {
        let limits = Limits::default();
        assert!(validate_collection_name(&limits, "").is_err());
    }

    #[test]
    fn scan_without_limit_is_rejected() {
        assert!(validate_scan_limit(None).is_err());
        assert!(validate_scan_limit(Some(0)).is_err());
        assert!(validate_scan_limit(Some(10)).is_ok());
    }

    #[test]
    fn unknown_option_bit_is_rejected() {
        assert!(validate_known_options(Options::from_bits(0b1000_0000)).is_err());
        assert!(validate_known_options(Options::WRITE_FLUSH).is_ok());
    }

    #[test]
    fn dont_watch_without_transaction_is_rejected() {
        assert!(validate_dont_watch_has_transaction(Options::TRANSACTION_DONT_WATCH, false).is_err());
        assert!(validate_dont_watch_has_transaction(Options::TRANSACTION_DONT_WATCH, true).is_ok());
        assert!(validate_dont_watch_has_transaction(Options::NONE, false).is_ok());
    }
}
