//! Mapping serenity failures onto gateway errors.

use roletools_error::{GatewayError, GatewayErrorKind, RoletoolsError};
use serenity::http::HttpError;

/// Classify a serenity error.
///
/// HTTP 403 becomes [`GatewayErrorKind::Forbidden`] so the engine can report
/// it per role; 429 becomes [`GatewayErrorKind::RateLimited`]. Everything
/// else is a transient [`GatewayErrorKind::Http`] failure.
#[track_caller]
pub fn gateway_error(err: serenity::Error) -> RoletoolsError {
    let kind = match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            match response.status_code.as_u16() {
                403 => GatewayErrorKind::Forbidden(response.error.message.clone()),
                429 => GatewayErrorKind::RateLimited {
                    retry_after_secs: 1,
                },
                _ => GatewayErrorKind::Http(err.to_string()),
            }
        }
        _ => GatewayErrorKind::Http(err.to_string()),
    };
    GatewayError::new(kind).into()
}

/// Whether the error is Discord answering 404.
pub(crate) fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}
