mod error;
mod grammar;
mod keyfile;

pub use error::ParseError;
pub use keyfile::KeyFile;

/// Parse key-file input into a [`KeyFile`].
///
/// # Errors
///
/// Returns [`ParseError`] naming the offending line if the input is not a
/// well-formed key file.
pub fn parse(input: &str) -> Result<KeyFile, ParseError> {
    KeyFile::from_lines(input)
}
