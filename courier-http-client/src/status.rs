//! Status classification and body decoding after the last attempt.

use crate::flags::{LogFlag, LogFlags};
use crate::{HttpClientError, Response, Result};

/// Check if a status is in `[200, 300)`.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Check if failures should be logged at all.
pub fn should_log_error(flags: LogFlags) -> bool {
    !flags.contains(LogFlag::NoError)
}

/// Check if a bad `status` with no status-specific target should be logged.
pub fn should_log_bad_status(flags: LogFlags, status: u16) -> bool {
    if !should_log_error(flags) || flags.contains(LogFlag::NoBadStatus) {
        return false;
    }
    match status {
        401 => !flags.contains(LogFlag::NoUnauthorized),
        403 => !flags.contains(LogFlag::NoForbidden),
        _ => true,
    }
}

/// Classify the final status of `response`.
///
/// A bad status always yields [`HttpClientError::BadStatusCode`] unless the
/// body was meant for a status-specific target and failed to decode, in
/// which case the decode error is returned instead.
pub(crate) fn check_status(response: &Response) -> Result<()> {
    let status = response.status();
    if status == 0 || response.is_success() {
        return Ok(());
    }

    let options = response.options();
    let flags = options.log_flags();

    match options.status_target(status) {
        Some(target) => {
            if !response.body().is_empty()
                && let Err(e) = target.decode(response.body())
            {
                let err = HttpClientError::decode(e);
                if should_log_error(flags) {
                    response.log_error("Fail to unmarshal body", &err, &[]);
                }
                return Err(err);
            }
        }
        None => {
            if should_log_bad_status(flags, status) {
                response.log_error("Bad status code", &HttpClientError::BadStatusCode, &[]);
            }
        }
    }

    Err(HttpClientError::BadStatusCode)
}

/// Decode a successful, non-empty body into the success target.
pub(crate) fn decode_success(response: &Response) -> Result<()> {
    let options = response.options();
    let Some(target) = &options.rep_obj else {
        return Ok(());
    };
    if response.body().is_empty() {
        return Ok(());
    }

    target.decode(response.body()).map_err(|e| {
        let err = HttpClientError::decode(e);
        if should_log_error(options.log_flags()) {
            response.log_error("Fail to unmarshal body", &err, &[]);
        }
        err
    })
}
