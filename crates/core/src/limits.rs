//! Nesting limits
//!
//! Record and value codecs recurse into nested records, arrays and embedded
//! entities. Every recursive step carries a depth counter which is checked
//! against [`MAX_NESTING_DEPTH`]; exceeding it fails with
//! [`Error::RecursionLimitExceeded`] instead of exhausting the stack.

use crate::error::{Error, Result};

/// Maximum nesting depth for encode and decode (100 levels)
pub const MAX_NESTING_DEPTH: usize = 100;

/// Fail when `depth` is beyond [`MAX_NESTING_DEPTH`].
#[inline]
pub fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::RecursionLimitExceeded {
            depth,
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}
