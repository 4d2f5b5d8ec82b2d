use thiserror::Error;

/// Longest filename (in bytes) accepted by the local store
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

/// Reduce a client-supplied filename to a single safe path component.
///
/// Directory parts are dropped, reserved and control characters become `_`,
/// leading dots are removed (no hidden files, no `..`), and the result is
/// truncated to [`MAX_FILENAME_LEN`] bytes on a char boundary.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    // Only the last component, whichever separator the client used
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized
        .trim()
        .trim_start_matches('.')
        .trim_end_matches(['.', ' '])
        .to_string();

    if sanitized.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Invalid filename".to_string(),
        });
    }

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("my file.doc").unwrap(), "my file.doc");
        assert_eq!(
            sanitize_filename("test<script>.pdf").unwrap(),
            "test_script_.pdf"
        );
        assert_eq!(sanitize_filename("测试.txt").unwrap(), "测试.txt");
        assert_eq!(sanitize_filename("a:b|c?.txt").unwrap(), "a_b_c_.txt");
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("..\\..\\windows\\system32").unwrap(),
            "system32"
        );
        assert_eq!(sanitize_filename("/abs/path/data.csv").unwrap(), "data.csv");
    }

    #[test]
    fn test_sanitize_hidden_and_dots() {
        assert_eq!(sanitize_filename(".htaccess").unwrap(), "htaccess");
        assert_eq!(sanitize_filename("...env").unwrap(), "env");
        assert_eq!(sanitize_filename("name. . ").unwrap(), "name");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("dir/").is_err());
        assert!(sanitize_filename("   ").is_err());
        assert_eq!(sanitize_filename("").unwrap_err().code, "INVALID_FILENAME");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(200); // 400 bytes
        let out = sanitize_filename(&long).unwrap();
        assert!(out.len() <= MAX_FILENAME_LEN);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_sanitize_control_chars() {
        assert_eq!(sanitize_filename("a\nb\tc.txt").unwrap(), "a_b_c.txt");
    }
}
