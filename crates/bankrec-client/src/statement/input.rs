use std::fs;
use std::io::{IsTerminal, Read};
use std::path::Path;

use crate::{ClientError, ClientResult};

const STDIN_FILE_NAME: &str = "stdin";

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

impl ResolvedSource {
    /// Decoded text. Invalid UTF-8 sequences are replaced, the fingerprint
    /// always uses the raw bytes.
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

pub(crate) fn resolve_source(
    path: Option<String>,
    stdin_override: Option<Vec<u8>>,
    file_name_override: Option<String>,
) -> ClientResult<ResolvedSource> {
    match path.as_deref() {
        Some("-") | None => {
            let body = read_stdin(stdin_override)?;
            match body {
                Some(bytes) => Ok(ResolvedSource {
                    file_name: file_name_override.unwrap_or_else(|| STDIN_FILE_NAME.to_string()),
                    bytes,
                }),
                None if path.is_some() => Err(ClientError::import_error(
                    "Path `-` means stdin input, but stdin was empty. Pipe a statement file or pass a path.",
                )),
                None => Err(ClientError::import_error(
                    "No statement source provided. Pass a file path or pipe the file via stdin.",
                )),
            }
        }
        Some(path_value) => {
            let bytes = fs::read(path_value).map_err(|error| {
                ClientError::import_error(&format!(
                    "Could not read statement file `{path_value}`: {error}"
                ))
            })?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Err(ClientError::import_error(&format!(
                    "Statement file `{path_value}` is empty."
                )));
            }
            let file_name = file_name_override.unwrap_or_else(|| {
                Path::new(path_value)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path_value.to_string())
            });
            Ok(ResolvedSource { file_name, bytes })
        }
    }
}

fn read_stdin(stdin_override: Option<Vec<u8>>) -> ClientResult<Option<Vec<u8>>> {
    if let Some(value) = stdin_override {
        return Ok(non_blank(value));
    }

    if std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .map_err(|error| ClientError::import_error(&format!("Could not read stdin: {error}")))?;

    Ok(non_blank(buffer))
}

fn non_blank(bytes: Vec<u8>) -> Option<Vec<u8>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(bytes)
    }
}
