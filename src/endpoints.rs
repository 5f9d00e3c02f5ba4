//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/students/{student_id}/details', use [format_endpoint].

/// The root route which returns a welcome message.
pub const ROOT: &str = "/";
/// The route for logging in a user and getting an access token.
pub const LOG_IN: &str = "/login";
/// The route for an administrator to create a new user.
pub const SIGN_UP: &str = "/signup";
/// The route for recording a fee payment.
pub const FEE_PAYMENT: &str = "/transactions/fee-payment";
/// The route for listing transactions within a date range.
pub const TRANSACTION_HISTORY: &str = "/transactions/history";
/// The route for getting a student's record.
pub const STUDENT_DETAILS: &str = "/students/{student_id}/details";
/// The route for getting a student's fee summary for an academic year.
pub const FEE_SUMMARY: &str = "/students/{student_id}/fee-summary/{year_id}";

/// Replace the parameters in `endpoint_path` with `ids`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/students/{student_id}/details',
/// '{student_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
///
/// Parameters without a matching ID are left as is, and extra IDs are ignored.
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, ids: &[i64]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut rest = endpoint_path;
    let mut ids = ids.iter();

    while let Some(param_start) = rest.find('{') {
        let Some(param_len) = rest[param_start..].find('}') else {
            break;
        };
        let Some(id) = ids.next() else {
            break;
        };

        formatted.push_str(&rest[..param_start]);
        formatted.push_str(&id.to_string());
        rest = &rest[param_start + param_len + 1..];
    }

    formatted.push_str(rest);
    formatted
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::SIGN_UP);
        assert_endpoint_is_valid_uri(endpoints::FEE_PAYMENT);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_HISTORY);
        assert_endpoint_is_valid_uri(endpoints::STUDENT_DETAILS);
        assert_endpoint_is_valid_uri(endpoints::FEE_SUMMARY);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", &[1]);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", &[1]);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &[1]);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", &[1]);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn replaces_parameters_in_order() {
        let formatted_path = format_endpoint(endpoints::FEE_SUMMARY, &[42, 2024]);

        assert_eq!(formatted_path, "/students/42/fee-summary/2024");
    }

    #[test]
    fn leaves_parameters_without_ids() {
        let formatted_path = format_endpoint(endpoints::FEE_SUMMARY, &[42]);

        assert_eq!(formatted_path, "/students/42/fee-summary/{year_id}");
    }
}
