//! Process-wide registry of open media names.
//!
//! Two media may not be open under the same name at the same time.

use std::collections::HashSet;
use std::sync::LazyLock;

use medialink_core::{MediaError, Result};
use parking_lot::Mutex;

static OPEN_NAMES: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

/// Reserve `name` for an opening media.
pub(crate) fn claim(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MediaError::invalid("media name is empty"));
    }
    if !OPEN_NAMES.lock().insert(name.to_string()) {
        return Err(MediaError::invalid(format!("media '{name}' is already open")));
    }
    Ok(())
}

pub(crate) fn release(name: &str) {
    OPEN_NAMES.lock().remove(name);
}

/// Whether a media named `name` is currently open in this process.
pub fn is_open(name: &str) -> bool {
    OPEN_NAMES.lock().contains(name)
}

#[cfg(test)]
mod tests {
    use medialink_core::ErrorKind;

    use super::*;

    #[test]
    fn names_are_unique_while_claimed() {
        claim("registry-test-a").unwrap();
        assert!(is_open("registry-test-a"));
        assert_eq!(
            claim("registry-test-a").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        release("registry-test-a");
        assert!(!is_open("registry-test-a"));
        claim("registry-test-a").unwrap();
        release("registry-test-a");
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(claim("").unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
}
