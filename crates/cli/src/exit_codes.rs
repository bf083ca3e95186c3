//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, bad base URL)             |
//! | 3    | Fragment is not a valid history token            |
//! | 4    | settings.json could not be read or parsed        |
//! | 5    | Server answered with an error status             |
//! | 6    | Server unreachable or answer unreadable          |

use websheet_api_client::FetchError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unusable base URL.
pub const EXIT_USAGE: u8 = 2;

/// A fragment given on the command line did not parse.
pub const EXIT_INVALID_TOKEN: u8 = 3;

/// settings.json exists but is unreadable or invalid.
pub const EXIT_SETTINGS: u8 = 4;

/// The server answered a request with a non-2xx status.
pub const EXIT_SERVER_STATUS: u8 = 5;

/// The request never got an answer, or the answer was not understood.
pub const EXIT_SERVER_UNREACHABLE: u8 = 6;

/// Map a transport failure to its exit code.
pub fn fetch_exit_code(err: &FetchError) -> u8 {
    match err {
        FetchError::InvalidUrl(_) => EXIT_USAGE,
        FetchError::Network(_) | FetchError::Parse(_) => EXIT_SERVER_UNREACHABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INVALID_TOKEN,
            EXIT_SETTINGS,
            EXIT_SERVER_STATUS,
            EXIT_SERVER_UNREACHABLE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_fetch_exit_code() {
        assert_eq!(fetch_exit_code(&FetchError::InvalidUrl("x".into())), EXIT_USAGE);
        assert_eq!(fetch_exit_code(&FetchError::Network("refused".into())), EXIT_SERVER_UNREACHABLE);
    }
}
